//! Roommate profiles: browse, detail with suggestions, the create/edit
//! form, deletion, and the contact flow.

mod browse;
mod contact;
mod delete;
mod form;
mod page;

use axum::{routing::get, Router};

use crate::models::Profile;
use crate::res;
use crate::{include_res, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(browse::browse))
        .route("/new", get(form::new_page).post(form::create))
        .route("/{id}", get(page::detail))
        .route("/{id}/edit", get(form::edit_page).post(form::update))
        .route("/{id}/delete", get(delete::confirm).post(delete::delete))
        .route("/{id}/contact", get(contact::contact_page).post(contact::contact))
}

/// Listing card shared by the home page, browse grid and suggestion strips.
pub(crate) fn profile_card(profile: &Profile) -> String {
    let photo = match &profile.photo_url {
        Some(url) => format!(r#"<img class="avatar" src="{}" alt="">"#, res::escape(url)),
        None => {
            let initial = profile.name.chars().next().unwrap_or('?');
            format!(r#"<div class="avatar">{}</div>"#, res::escape(&initial.to_string()))
        }
    };

    let location = if profile.state.is_empty() {
        profile.city.clone()
    } else {
        format!("{}, {}", profile.city, profile.state)
    };

    let looking = if profile.is_looking_for_room {
        "Looking for a room"
    } else {
        "Offering a room"
    };

    let mut badges = String::new();
    if profile.only_eats_zabihah {
        badges += r#"<span class="badge">Zabihah only</span> "#;
    }
    if profile.prayer_friendly {
        badges += r#"<span class="badge">Prayer friendly</span> "#;
    }
    if profile.guests_allowed {
        badges += r#"<span class="badge">Guests welcome</span> "#;
    }

    let mut bio: String = profile.bio.chars().take(140).collect();
    if profile.bio.chars().count() > 140 {
        bio += "...";
    }

    include_res!(str, "/fragments/profile_card.html")
        .replace("{id}", &profile.id)
        .replace("{photo}", &photo)
        .replace("{name}", &res::escape(&profile.name))
        .replace("{age}", &profile.age.to_string())
        .replace("{gender}", profile.gender.label())
        .replace("{location}", &res::escape(&location))
        .replace("{looking}", looking)
        .replace("{bio}", &res::escape(&bio))
        .replace("{badges}", &badges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    fn sample() -> Profile {
        Profile {
            id: "p1".into(),
            user_id: "u1".into(),
            name: "Ahmed Hassan".into(),
            age: 25,
            gender: Gender::Male,
            city: "New York".into(),
            state: "NY".into(),
            neighborhood: None,
            bio: "Graduate student".into(),
            photo_url: None,
            is_looking_for_room: true,
            only_eats_zabihah: true,
            prayer_friendly: false,
            guests_allowed: false,
            contact_email: "ahmed@example.com".into(),
            created_at: String::new(),
        }
    }

    #[test]
    fn card_shows_name_location_and_badges() {
        let html = profile_card(&sample());
        assert!(html.contains("Ahmed Hassan"));
        assert!(html.contains("New York, NY"));
        assert!(html.contains("Zabihah only"));
        assert!(!html.contains("Prayer friendly"));
        assert!(html.contains("Looking for a room"));
        assert!(html.contains(r#"href="/profiles/p1""#));
    }

    #[test]
    fn card_escapes_user_text() {
        let mut profile = sample();
        profile.name = "<script>x".into();
        let html = profile_card(&profile);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn long_bios_are_clipped() {
        let mut profile = sample();
        profile.bio = "x".repeat(300);
        let html = profile_card(&profile);
        assert!(html.contains(&("x".repeat(140) + "...")));
        assert!(!html.contains(&"x".repeat(141)));
    }
}
