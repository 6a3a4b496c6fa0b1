use axum::{debug_handler, extract::{Query, State}, response::Response};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::db::{self, ProfileFilter, ProfileSort};
use crate::models::Gender;
use crate::res::{self, Shell};
use crate::{include_res, session, AppResult, AppState};

const PER_PAGE: i64 = 12;

#[derive(Debug, Deserialize, Default)]
pub(crate) struct BrowseQuery {
    #[serde(default)]
    search: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    age_min: String,
    #[serde(default)]
    age_max: String,
    #[serde(default)]
    looking_for: String,
    #[serde(default)]
    only_eats_zabihah: String,
    #[serde(default)]
    prayer_friendly: String,
    #[serde(default)]
    guests_allowed: String,
    #[serde(default)]
    sort: String,
    #[serde(default)]
    page: String,
}

/// Query string for page links, every non-empty filter carried over.
fn query_string(query: &BrowseQuery) -> String {
    let mut qs = String::new();
    for (key, value) in [
        ("search", query.search.as_str()),
        ("city", query.city.as_str()),
        ("state", query.state.as_str()),
        ("gender", query.gender.as_str()),
        ("age_min", query.age_min.as_str()),
        ("age_max", query.age_max.as_str()),
        ("looking_for", query.looking_for.as_str()),
        ("only_eats_zabihah", query.only_eats_zabihah.as_str()),
        ("prayer_friendly", query.prayer_friendly.as_str()),
        ("guests_allowed", query.guests_allowed.as_str()),
        ("sort", query.sort.as_str()),
    ] {
        if !value.is_empty() {
            qs += &format!("&{key}={}", res::urlencode(value));
        }
    }
    qs
}

fn pagination(query: &BrowseQuery, page: i64, total_pages: i64) -> String {
    if total_pages <= 1 {
        return String::new();
    }
    let qs = res::escape(&query_string(query));
    let mut html = String::new();
    if page > 1 {
        html += &format!(r#"<a href="/profiles?page={}{qs}">Previous</a> "#, page - 1);
    }
    html += &format!("<span>Page {page} of {total_pages}</span>");
    if page < total_pages {
        html += &format!(r#" <a href="/profiles?page={}{qs}">Next</a>"#, page + 1);
    }
    html
}

#[debug_handler(state = AppState)]
pub(crate) async fn browse(
    Query(query): Query<BrowseQuery>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let viewer = match session::current_user(&session).await? {
        Some(user_id) => db::profile_of(&db_pool, &user_id).await?,
        None => None,
    };

    let filter = ProfileFilter {
        search: query.search.clone(),
        city: query.city.clone(),
        state: query.state.clone(),
        gender: Gender::parse(&query.gender),
        age_min: query.age_min.trim().parse().ok(),
        age_max: query.age_max.trim().parse().ok(),
        looking_for_room: match query.looking_for.as_str() {
            "room" => Some(true),
            "roommate" => Some(false),
            _ => None,
        },
        only_eats_zabihah: !query.only_eats_zabihah.is_empty(),
        prayer_friendly: !query.prayer_friendly.is_empty(),
        guests_allowed: !query.guests_allowed.is_empty(),
        exclude_profile: viewer.as_ref().map(|p| p.id.clone()),
        sort: ProfileSort::parse(&query.sort),
    };

    let total = db::count_profiles(&db_pool, &filter).await?;
    let total_pages = ((total + PER_PAGE - 1) / PER_PAGE).max(1);
    let page = query
        .page
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|p| *p >= 1)
        .unwrap_or(1)
        .min(total_pages);

    let found = db::search_profiles(&db_pool, &filter, PER_PAGE, (page - 1) * PER_PAGE).await?;

    let mut cards = String::new();
    for profile in &found {
        cards += &super::profile_card(profile);
    }
    if found.is_empty() {
        cards = "<p>No profiles match these filters.</p>".to_owned();
    }

    let cities: Vec<(String, String)> = db::distinct_profile_cities(&db_pool)
        .await?
        .into_iter()
        .map(|c| (c.clone(), c))
        .collect();
    let states: Vec<(String, String)> = db::distinct_profile_states(&db_pool)
        .await?
        .into_iter()
        .map(|s| (s.clone(), s))
        .collect();
    let sorts = vec![
        ("newest".to_owned(), "Newest first".to_owned()),
        ("oldest".to_owned(), "Oldest first".to_owned()),
        ("name".to_owned(), "Name".to_owned()),
        ("age_youngest".to_owned(), "Age: youngest first".to_owned()),
        ("age_oldest".to_owned(), "Age: oldest first".to_owned()),
    ];
    let looking = vec![
        ("both".to_owned(), "Either".to_owned()),
        ("room".to_owned(), "Looking for a room".to_owned()),
        ("roommate".to_owned(), "Offering a room".to_owned()),
    ];
    let looking_current = if query.looking_for.is_empty() { "both" } else { &query.looking_for };

    let content = include_res!(str, "/pages/browse.html")
        .replace("{search}", &res::escape(&query.search))
        .replace("{city_options}", &res::options(&cities, &query.city))
        .replace("{state_options}", &res::options(&states, &query.state))
        .replace("{gender_male}", res::selected(query.gender == "male"))
        .replace("{gender_female}", res::selected(query.gender == "female"))
        .replace("{age_min}", &res::escape(&query.age_min))
        .replace("{age_max}", &res::escape(&query.age_max))
        .replace("{looking_options}", &res::options(&looking, looking_current))
        .replace("{zabihah_checked}", res::checked(!query.only_eats_zabihah.is_empty()))
        .replace("{prayer_checked}", res::checked(!query.prayer_friendly.is_empty()))
        .replace("{guests_checked}", res::checked(!query.guests_allowed.is_empty()))
        .replace("{sort_options}", &res::options(&sorts, &query.sort))
        .replace("{total}", &total.to_string())
        .replace("{cards}", &cards)
        .replace("{pagination}", &pagination(&query, page, total_pages));

    Ok(Shell::load(&session).await?.page("Browse profiles", &content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_keeps_only_set_filters() {
        let query = BrowseQuery {
            search: "quiet".into(),
            gender: "male".into(),
            ..Default::default()
        };
        assert_eq!(query_string(&query), "&search=quiet&gender=male");
        assert_eq!(query_string(&BrowseQuery::default()), "");

        let spaced = BrowseQuery {
            city: "New York".into(),
            ..Default::default()
        };
        assert_eq!(query_string(&spaced), "&city=New%20York");
    }

    #[test]
    fn pagination_renders_neighbour_links() {
        let query = BrowseQuery {
            city: "Chicago".into(),
            ..Default::default()
        };
        let html = pagination(&query, 2, 3);
        assert!(html.contains("page=1&amp;city=Chicago"));
        assert!(html.contains("page=3&amp;city=Chicago"));
        assert!(html.contains("Page 2 of 3"));

        assert!(!pagination(&query, 1, 3).contains("Previous"));
        assert!(!pagination(&query, 3, 3).contains("Next"));
        assert_eq!(pagination(&query, 1, 1), "");
    }
}
