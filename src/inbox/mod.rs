//! Member-to-member messaging. The inbox splits received and sent mail;
//! a small JSON endpoint lets the page mark everything read in place.

mod compose;

use axum::{debug_handler, extract::State, response::Response, routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::models::MessageView;
use crate::res::{self, Shell};
use crate::{db, include_res, session, AppResult, AppState, GetField};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(inbox).post(mark_read))
        .route("/compose", get(compose::compose_page).post(compose::send))
        .route(
            "/compose/{profile_id}",
            get(compose::compose_page).post(compose::send),
        )
}

fn message_row(message: &MessageView, counterpart: &str, show_unread: bool) -> String {
    let subject_row = match &message.subject {
        Some(subject) => format!("<strong>{}</strong><br>", res::escape(subject)),
        None => String::new(),
    };
    let classes = if show_unread && !message.is_read {
        "message unread"
    } else {
        "message"
    };
    let room_row = match &message.room_title {
        Some(title) => format!(
            "<p class=\"meta\">About listing: {}</p>",
            res::escape(title),
        ),
        None => String::new(),
    };

    include_res!(str, "/fragments/inbox_row.html")
        .replace("{classes}", classes)
        .replace("{counterpart}", &res::escape(counterpart))
        .replace("{subject_row}", &subject_row)
        .replace("{content}", &res::multiline(&message.content))
        .replace("{room_row}", &room_row)
        .replace("{when}", &res::escape(&message.created_at))
}

#[debug_handler(state = AppState)]
async fn inbox(State(db_pool): State<SqlitePool>, session: Session) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect("/inbox"));
    };
    let Some(viewer) = db::profile_of(&db_pool, &user_id).await? else {
        return session::flash_redirect(
            &session,
            "/profiles/new",
            "You need to create a profile first.",
        )
        .await;
    };

    let unread = db::unread_count(&db_pool, &viewer.id).await?;

    let mut received = String::new();
    for message in &db::received_messages(&db_pool, &viewer.id).await? {
        received += &message_row(message, &message.sender_name, true);
    }
    if received.is_empty() {
        received = "<p>Nothing received yet.</p>".to_owned();
    }

    let mut sent = String::new();
    for message in &db::sent_messages(&db_pool, &viewer.id).await? {
        sent += &message_row(message, &message.recipient_name, false);
    }
    if sent.is_empty() {
        sent = "<p>Nothing sent yet.</p>".to_owned();
    }

    let content = include_res!(str, "/pages/inbox.html")
        .replace("{unread}", &unread.to_string())
        .replace("{received}", &received)
        .replace("{sent}", &sent);

    let shell = Shell::load(&session).await?;
    Ok(shell.page("Inbox", &content))
}

/// The inbox page posts `{"action": "mark_read"}` from a fetch call and
/// expects a status blob back, not a redirect.
#[debug_handler(state = AppState)]
async fn mark_read(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(payload): Json<Value>,
) -> AppResult<Json<Value>> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(Json(json!({ "status": "error" })));
    };
    let Some(viewer) = db::profile_of(&db_pool, &user_id).await? else {
        return Ok(Json(json!({ "status": "error" })));
    };

    match payload.get_str_field("action").as_deref() {
        Ok("mark_read") => {
            let marked = db::mark_all_read(&db_pool, &viewer.id).await?;
            tracing::debug!(profile_id = %viewer.id, marked, "inbox marked read");
            Ok(Json(json!({ "status": "success" })))
        }
        _ => Ok(Json(json!({ "status": "error" }))),
    }
}
