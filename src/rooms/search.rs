use axum::{debug_handler, extract::State, response::Response};
use axum_extra::extract::Query;
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::db::{self, RoomFilter};
use crate::res::{self, Shell};
use crate::{include_res, AppResult, AppState};

use super::{form, room_card};

/// Quick rent brackets rendered as one-click links above the form.
const RENT_RANGES: [(&str, &str, &str); 4] = [
    ("", "500", "Under $500"),
    ("500", "1000", "$500 - $1000"),
    ("1000", "1500", "$1,000 - $1,500"),
    ("1500", "", "Over $1,500"),
];

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    search: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    min_rent: String,
    #[serde(default)]
    max_rent: String,
    #[serde(default)]
    available: String,
    #[serde(default)]
    room_type: String,
    #[serde(default)]
    amenities: Vec<String>,
    #[serde(default)]
    only_eats_zabihah: String,
    #[serde(default)]
    prayer_friendly: String,
    #[serde(default)]
    guests_allowed: String,
}

fn rent_links() -> String {
    let mut html = String::new();
    for (min, max, label) in RENT_RANGES {
        html += &format!(
            "<a href=\"/rooms/search?min_rent={min}&amp;max_rent={max}\">{label}</a>\n",
        );
    }
    html
}

#[debug_handler(state = AppState)]
pub(crate) async fn search(
    Query(query): Query<SearchQuery>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let filter = RoomFilter {
        search: query.search.trim().to_owned(),
        city: query.city.trim().to_owned(),
        min_price: query.min_rent.trim().parse().ok(),
        max_price: query.max_rent.trim().parse().ok(),
        available_by: query.available.trim().to_owned(),
        room_type: query.room_type.clone(),
        amenities: query.amenities.clone(),
        only_eats_zabihah: !query.only_eats_zabihah.is_empty(),
        prayer_friendly: !query.prayer_friendly.is_empty(),
        guests_allowed: !query.guests_allowed.is_empty(),
    };

    let rooms = db::search_rooms(&db_pool, &filter).await?;
    let room_types = db::room_types(&db_pool).await?;
    let amenities = db::amenities(&db_pool).await?;

    let mut cards = String::new();
    for room in &rooms {
        cards += &room_card(room);
    }
    if cards.is_empty() {
        cards = "<p>No rooms match these filters yet.</p>".to_owned();
    }

    let city_options: Vec<(String, String)> = db::distinct_room_cities(&db_pool)
        .await?
        .into_iter()
        .map(|city| (city.clone(), city))
        .collect();
    let type_options: Vec<(String, String)> = room_types
        .iter()
        .map(|t| (t.id.clone(), t.name.clone()))
        .collect();

    let content = include_res!(str, "/pages/room_search.html")
        .replace("{search}", &res::escape(&query.search))
        .replace("{city_options}", &res::options(&city_options, &query.city))
        .replace("{min_rent}", &res::escape(&query.min_rent))
        .replace("{max_rent}", &res::escape(&query.max_rent))
        .replace("{available}", &res::escape(&query.available))
        .replace("{room_type_options}", &res::options(&type_options, &query.room_type))
        .replace("{amenity_boxes}", &form::amenity_boxes(&amenities, &query.amenities))
        .replace("{zabihah_checked}", res::checked(!query.only_eats_zabihah.is_empty()))
        .replace("{prayer_checked}", res::checked(!query.prayer_friendly.is_empty()))
        .replace("{guests_checked}", res::checked(!query.guests_allowed.is_empty()))
        .replace("{rent_links}", &rent_links())
        .replace("{count}", &rooms.len().to_string())
        .replace("{cards}", &cards);

    let shell = Shell::load(&session).await?;
    Ok(shell.page("Find a room", &content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rent_links_cover_every_bracket() {
        let html = rent_links();
        assert!(html.contains("min_rent=&amp;max_rent=500"));
        assert!(html.contains("min_rent=500&amp;max_rent=1000"));
        assert!(html.contains("min_rent=1500&amp;max_rent="));
        assert!(html.contains("Over $1,500"));
    }
}
