use axum::{debug_handler, extract::{Path, State}, response::Response};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::profiles;
use crate::res::{self, Shell};
use crate::{db, include_res, session, AppResult, AppState};

/// Full listing page. Contact details are only shown to signed-in members,
/// so the whole page sits behind the login redirect.
#[debug_handler(state = AppState)]
pub(crate) async fn detail(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect(&format!("/rooms/{room_id}")));
    };
    let Some(room) = db::room(&db_pool, &room_id).await? else {
        return res::sorry("room");
    };
    let Some(owner) = db::profile(&db_pool, &room.profile_id).await? else {
        return res::sorry("room");
    };

    let viewer = db::profile_of(&db_pool, &user_id).await?;
    let is_owner = viewer.as_ref().is_some_and(|v| v.id == room.profile_id);

    // Owners can still open a deactivated listing to fix it up.
    if !room.is_active && !is_owner {
        return res::sorry("room");
    }

    let mut gallery = String::new();
    for image in &db::room_images(&db_pool, &room.id).await? {
        gallery += &format!(
            "<img class=\"photo\" src=\"{}\" alt=\"\">\n",
            res::escape(&image.url),
        );
    }

    let mut amenities = String::new();
    for name in &db::room_amenity_names(&db_pool, &room.id).await? {
        amenities += &format!("<li>{}</li>\n", res::escape(name));
    }
    if amenities.is_empty() {
        amenities = "<li>None listed</li>".to_owned();
    }

    let room_type = match &room.room_type_id {
        Some(id) => db::room_type(&db_pool, id).await?,
        None => None,
    };
    let room_type_row = match room_type {
        Some(t) => format!("<p class=\"meta\">{}</p>", res::escape(&t.name)),
        None => String::new(),
    };

    let available = match &room.available_from {
        Some(date) => format!("Available from {}", res::escape(date)),
        None => "Available now".to_owned(),
    };

    let mut contact_rows = String::new();
    if let Some(phone) = &room.phone_number {
        contact_rows += &format!("<p>Phone: {}</p>\n", res::escape(phone));
    }
    if let Some(email) = &room.contact_email {
        contact_rows += &format!("<p>Email: {}</p>\n", res::escape(email));
    }
    if contact_rows.is_empty() {
        contact_rows = format!(
            "<p>Reach {} through the message board below.</p>",
            res::escape(&owner.name),
        );
    }

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
    if !room.is_active {
        badges += r#"<span class="badge muted">Inactive</span> "#;
    }

    let actions = if is_owner {
        format!(
            r#"<a class="button" href="/rooms/{id}/edit">Edit listing</a>
<a class="button danger" href="/rooms/{id}/delete">Delete listing</a>"#,
            id = room.id,
        )
    } else {
        format!(
            r#"<a class="button" href="/profiles/{owner_id}/contact">Contact {owner_name}</a>"#,
            owner_id = owner.id,
            owner_name = res::escape(&owner.name),
        )
    };

    let content = include_res!(str, "/pages/room_detail.html")
        .replace("{id}", &room.id)
        .replace("{title}", &res::escape(&room.title))
        .replace("{gallery}", &gallery)
        .replace("{city}", &res::escape(&room.city))
        .replace("{price}", &room.price.to_string())
        .replace("{room_type_row}", &room_type_row)
        .replace("{available}", &available)
        .replace("{badges}", &badges)
        .replace("{description}", &res::multiline(&room.description))
        .replace("{amenities}", &amenities)
        .replace("{contact_rows}", &contact_rows)
        .replace("{owner_card}", &profiles::profile_card(&owner))
        .replace("{actions}", &actions);

    let shell = Shell::load(&session).await?;
    Ok(shell.page(&room.title, &content))
}
