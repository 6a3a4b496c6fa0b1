//! Room listings. Owners create and maintain listings, everyone else
//! searches them, and each listing carries its own message board.

mod board;
mod delete;
mod form;
mod room;
mod search;

use axum::{routing::get, Router};

use crate::models::RoomSummary;
use crate::res;
use crate::{include_res, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(form::new_page).post(form::create))
        .route("/search", get(search::search))
        .route("/{id}", get(room::detail))
        .route("/{id}/edit", get(form::edit_page).post(form::update))
        .route("/{id}/delete", get(delete::confirm).post(delete::delete))
        .route("/{id}/messages", get(board::board).post(board::post_message))
        .route(
            "/{id}/messages/{msg_id}",
            get(board::edit_page).post(board::edit_or_delete),
        )
}

/// Summary card shared by the home page, dashboard, and search results.
pub(crate) fn room_card(room: &RoomSummary) -> String {
    let image = match &room.image_url {
        Some(url) => format!(r#"<img class="thumb" src="{}" alt="">"#, res::escape(url)),
        None => String::new(),
    };

    let room_type = match &room.room_type_name {
        Some(name) => format!(" &middot; {}", res::escape(name)),
        None => String::new(),
    };

    let available = match &room.available_from {
        Some(date) => format!("Available from {}", res::escape(date)),
        None => "Available now".to_owned(),
    };

    let mut badges = String::new();
    if room.only_eats_zabihah {
        badges += r#"<span class="badge">Zabihah kitchen</span> "#;
    }
    if room.prayer_friendly {
        badges += r#"<span class="badge">Prayer friendly</span> "#;
    }
    if room.guests_allowed {
        badges += r#"<span class="badge">Guests welcome</span> "#;
    }

    let mut snippet: String = room.description.chars().take(140).collect();
    if room.description.chars().count() > 140 {
        snippet += "...";
    }

    include_res!(str, "/fragments/room_card.html")
        .replace("{id}", &room.id)
        .replace("{image}", &image)
        .replace("{title}", &res::escape(&room.title))
        .replace("{city}", &res::escape(&room.city))
        .replace("{price}", &room.price.to_string())
        .replace("{room_type}", &room_type)
        .replace("{profile_id}", &room.profile_id)
        .replace("{owner}", &res::escape(&room.owner_name))
        .replace("{available}", &available)
        .replace("{snippet}", &res::escape(&snippet))
        .replace("{badges}", &badges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RoomSummary {
        RoomSummary {
            id: "r1".to_owned(),
            profile_id: "p1".to_owned(),
            title: "Sunny room near the masjid".to_owned(),
            description: "Quiet street, five minutes from Jumu'ah.".to_owned(),
            city: "Chicago".to_owned(),
            price: 950,
            available_from: Some("2026-09-01".to_owned()),
            only_eats_zabihah: true,
            prayer_friendly: true,
            guests_allowed: false,
            room_type_name: Some("Private Room".to_owned()),
            owner_name: "Omar".to_owned(),
            image_url: None,
        }
    }

    #[test]
    fn card_links_to_the_room() {
        let html = room_card(&summary());
        assert!(html.contains("/rooms/r1"));
        assert!(html.contains("Sunny room near the masjid"));
        assert!(html.contains("$950"));
        assert!(html.contains("Available from 2026-09-01"));
        assert!(html.contains("Zabihah kitchen"));
        assert!(!html.contains("Guests welcome"));
    }

    #[test]
    fn card_escapes_owner_text() {
        let mut room = summary();
        room.title = "<b>cheap</b>".to_owned();
        let html = room_card(&room);
        assert!(!html.contains("<b>cheap</b>"));
        assert!(html.contains("&lt;b&gt;cheap&lt;/b&gt;"));
    }

    #[test]
    fn card_clips_long_descriptions() {
        let mut room = summary();
        room.description = "x".repeat(200);
        let html = room_card(&room);
        assert!(html.contains(&("x".repeat(140) + "...")));
        assert!(!html.contains(&"x".repeat(141)));
    }
}
