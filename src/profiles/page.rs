use axum::{debug_handler, extract::{Path, State}, response::Response};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::res::{self, Shell};
use crate::{db, include_res, session, AppResult, AppState};

#[debug_handler(state = AppState)]
pub(crate) async fn detail(
    Path(profile_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = db::profile(&db_pool, &profile_id).await? else {
        return res::sorry("profile");
    };

    let viewer = match session::current_user(&session).await? {
        Some(user_id) => db::profile_of(&db_pool, &user_id).await?,
        None => None,
    };
    let is_owner = viewer.as_ref().is_some_and(|v| v.id == profile.id);

    let similar = db::similar_profiles(&db_pool, &profile).await?;
    let mut similar_cards = String::new();
    for candidate in &similar {
        similar_cards += &super::profile_card(candidate);
    }
    if similar.is_empty() {
        similar_cards = "<p>No similar profiles nearby yet.</p>".to_owned();
    }

    let photo = match &profile.photo_url {
        Some(url) => format!(r#"<img class="portrait" src="{}" alt="">"#, res::escape(url)),
        None => String::new(),
    };

    let location = if profile.state.is_empty() {
        profile.city.clone()
    } else {
        format!("{}, {}", profile.city, profile.state)
    };

    let neighborhood_row = match &profile.neighborhood {
        Some(hood) => format!(
            r#"<p class="meta">Neighborhood: {}</p>"#,
            res::escape(hood)
        ),
        None => String::new(),
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

    let looking = if profile.is_looking_for_room {
        "Looking for a room"
    } else {
        "Offering a room"
    };

    let actions = if is_owner {
        format!(
            r#"<a class="button" href="/profiles/{id}/edit">Edit profile</a>
<a class="button danger" href="/profiles/{id}/delete">Delete profile</a>"#,
            id = profile.id
        )
    } else {
        format!(
            r#"<a class="button" href="/profiles/{}/contact">Contact {}</a>"#,
            profile.id,
            res::escape(&profile.name)
        )
    };

    let content = include_res!(str, "/pages/profile_detail.html")
        .replace("{photo}", &photo)
        .replace("{name}", &res::escape(&profile.name))
        .replace("{age}", &profile.age.to_string())
        .replace("{gender}", profile.gender.label())
        .replace("{location}", &res::escape(&location))
        .replace("{neighborhood_row}", &neighborhood_row)
        .replace("{looking}", looking)
        .replace("{badges}", &badges)
        .replace("{bio}", &res::multiline(&profile.bio))
        .replace("{actions}", &actions)
        .replace("{similar_cards}", &similar_cards);

    Ok(Shell::load(&session).await?.page(&profile.name, &content))
}
