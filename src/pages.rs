//! Top-level pages: the filtered home page, about, and the signed-in
//! dashboard views.

use axum::{debug_handler, extract::{Query, State}, response::{IntoResponse, Redirect, Response}};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::db::{self, ProfileFilter, RoomFilter};
use crate::models::Gender;
use crate::res::{self, Shell};
use crate::{include_res, profiles, rooms, session, AppResult, AppState};

#[derive(Debug, Deserialize, Default)]
pub struct HomeQuery {
    #[serde(default)]
    search: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    preference: String,
}

/// Landing page: room seekers and active listings side by side, narrowed by
/// the shared filter bar. Signed-in members only see candidates of their own
/// gender and never themselves.
#[debug_handler(state = AppState)]
pub async fn home(
    Query(query): Query<HomeQuery>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let viewer = match session::current_user(&session).await? {
        Some(user_id) => db::profile_of(&db_pool, &user_id).await?,
        None => None,
    };

    let mut filter = ProfileFilter {
        search: query.search.clone(),
        city: query.city.clone(),
        gender: Gender::parse(&query.gender),
        looking_for_room: Some(true),
        ..Default::default()
    };
    if let Some(viewer) = &viewer {
        filter.exclude_profile = Some(viewer.id.clone());
        filter.gender = Some(viewer.gender);
    }
    match query.preference.as_str() {
        "only_eats_zabihah" => filter.only_eats_zabihah = true,
        "prayer_friendly" => filter.prayer_friendly = true,
        "guests_allowed" => filter.guests_allowed = true,
        "looking_for_room" => filter.looking_for_room = Some(true),
        "offering_room" => filter.looking_for_room = Some(false),
        _ => {}
    }

    let mut room_filter = RoomFilter {
        search: query.search.clone(),
        city: query.city.clone(),
        ..Default::default()
    };
    match query.preference.as_str() {
        "only_eats_zabihah" => room_filter.only_eats_zabihah = true,
        "prayer_friendly" => room_filter.prayer_friendly = true,
        "guests_allowed" => room_filter.guests_allowed = true,
        _ => {}
    }

    let matches = db::search_profiles(&db_pool, &filter, -1, 0).await?;
    let available_rooms = db::search_rooms(&db_pool, &room_filter).await?;
    let cities = db::distinct_profile_cities(&db_pool).await?;

    let mut profile_cards = String::new();
    for profile in &matches {
        profile_cards += &profiles::profile_card(profile);
    }
    if matches.is_empty() {
        profile_cards = "<p>No roommates match these filters yet.</p>".to_owned();
    }

    let mut room_cards = String::new();
    for room in &available_rooms {
        room_cards += &rooms::room_card(room);
    }
    if available_rooms.is_empty() {
        room_cards = "<p>No rooms match these filters yet.</p>".to_owned();
    }

    let city_items: Vec<(String, String)> =
        cities.into_iter().map(|c| (c.clone(), c)).collect();

    let content = include_res!(str, "/pages/home.html")
        .replace("{search}", &res::escape(&query.search))
        .replace("{city_options}", &res::options(&city_items, &query.city))
        .replace("{gender_male}", res::selected(query.gender == "male"))
        .replace("{gender_female}", res::selected(query.gender == "female"))
        .replace("{pref_zabihah}", res::selected(query.preference == "only_eats_zabihah"))
        .replace("{pref_prayer}", res::selected(query.preference == "prayer_friendly"))
        .replace("{pref_guests}", res::selected(query.preference == "guests_allowed"))
        .replace("{pref_looking}", res::selected(query.preference == "looking_for_room"))
        .replace("{pref_offering}", res::selected(query.preference == "offering_room"))
        .replace("{profile_count}", &matches.len().to_string())
        .replace("{rooms_count}", &available_rooms.len().to_string())
        .replace("{profile_cards}", &profile_cards)
        .replace("{room_cards}", &room_cards);

    Ok(Shell::load(&session).await?.page("Find a Muslim roommate", &content))
}

#[debug_handler]
pub async fn about(session: Session) -> AppResult<Response> {
    let content = res::markdown_to_html(include_res!(str, "/pages/about.md"));
    Ok(Shell::load(&session).await?.page("About", &content))
}

/// Profile summary plus the five newest listings.
#[debug_handler(state = AppState)]
pub async fn dashboard(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect("/dashboard"));
    };
    let Some(profile) = db::profile_of(&db_pool, &user_id).await? else {
        return Ok(Redirect::to("/profiles/new").into_response());
    };

    let recent = db::rooms_of_profile(&db_pool, &profile.id, 5).await?;
    let mut room_cards = String::new();
    for room in &recent {
        room_cards += &rooms::room_card(room);
    }
    if recent.is_empty() {
        room_cards = r#"<p>No listings yet. <a href="/rooms/new">List a room</a>.</p>"#.to_owned();
    }

    let content = include_res!(str, "/pages/dashboard.html")
        .replace("{profile_id}", &profile.id)
        .replace("{profile_card}", &profiles::profile_card(&profile))
        .replace("{room_cards}", &room_cards);

    Ok(Shell::load(&session).await?.page("Dashboard", &content))
}

#[debug_handler(state = AppState)]
pub async fn my_listings(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect("/my-listings"));
    };
    let Some(profile) = db::profile_of(&db_pool, &user_id).await? else {
        return Ok(Redirect::to("/profiles/new").into_response());
    };

    let listings = db::rooms_of_profile(&db_pool, &profile.id, -1).await?;
    let mut room_cards = String::new();
    for room in &listings {
        room_cards += &rooms::room_card(room);
    }
    if listings.is_empty() {
        room_cards = r#"<p>No listings yet. <a href="/rooms/new">List a room</a>.</p>"#.to_owned();
    }

    let content = include_res!(str, "/pages/my_listings.html")
        .replace("{count}", &listings.len().to_string())
        .replace("{room_cards}", &room_cards);

    Ok(Shell::load(&session).await?.page("My listings", &content))
}
