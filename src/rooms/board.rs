use axum::{debug_handler, extract::{Path, State}, response::Response, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::models::{Profile, Room};
use crate::res::{self, Shell};
use crate::{db, include_res, session, AppResult, AppState};

/// Open message board under each listing. Posts land in the owner's inbox
/// as well, so questions do not go unnoticed.
#[debug_handler(state = AppState)]
pub(crate) async fn board(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let (room, viewer) = match board_gate(&db_pool, &session, &room_id).await? {
        Ok(pair) => pair,
        Err(response) => return Ok(response),
    };

    let messages = db::room_messages(&db_pool, &room.id).await?;
    let mut thread = String::new();
    for message in &messages {
        let controls = if message.sender_id == viewer.id {
            format!(
                r#"<a class="small" href="/rooms/{}/messages/{}">Edit</a>"#,
                room.id, message.id,
            )
        } else {
            String::new()
        };
        thread += &include_res!(str, "/fragments/board_message.html")
            .replace("{sender}", &res::escape(&message.sender_name))
            .replace("{when}", &res::escape(&message.created_at))
            .replace("{content}", &res::multiline(&message.content))
            .replace("{controls}", &controls);
    }
    if thread.is_empty() {
        thread = "<p>No questions yet. Ask the first one.</p>".to_owned();
    }

    let content = include_res!(str, "/pages/room_board.html")
        .replace("{id}", &room.id)
        .replace("{title}", &res::escape(&room.title))
        .replace("{thread}", &thread);

    let shell = Shell::load(&session).await?;
    Ok(shell.page("Message board", &content))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PostInput {
    #[serde(default)]
    content: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn post_message(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(input): Form<PostInput>,
) -> AppResult<Response> {
    let (room, viewer) = match board_gate(&db_pool, &session, &room_id).await? {
        Ok(pair) => pair,
        Err(response) => return Ok(response),
    };

    let content = input.content.trim();
    if content.is_empty() {
        return session::flash_redirect(
            &session,
            &format!("/rooms/{room_id}/messages"),
            "Please write a message.",
        )
        .await;
    }

    // Board posts also address the listing's owner, so they surface in
    // the owner's inbox with the room title as the subject.
    db::insert_message(
        &db_pool,
        &viewer.id,
        &room.profile_id,
        Some(&room.id),
        Some(&room.title),
        content,
    )
    .await?;

    session::flash_redirect(
        &session,
        &format!("/rooms/{room_id}/messages"),
        "Message sent successfully!",
    )
    .await
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EditInput {
    #[serde(default)]
    content: String,
    delete: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_page(
    Path((room_id, message_id)): Path<(String, String)>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let (room, viewer) = match board_gate(&db_pool, &session, &room_id).await? {
        Ok(pair) => pair,
        Err(response) => return Ok(response),
    };
    let Some(message) = db::message_in_room(&db_pool, &room.id, &message_id).await? else {
        return res::sorry("message");
    };
    if message.sender_id != viewer.id {
        return session::flash_redirect(
            &session,
            &format!("/rooms/{room_id}/messages"),
            "You can only edit your own messages.",
        )
        .await;
    }

    let content = include_res!(str, "/pages/room_message_edit.html")
        .replace("{room_id}", &room.id)
        .replace("{message_id}", &message.id)
        .replace("{content}", &res::escape(&message.content));

    let shell = Shell::load(&session).await?;
    Ok(shell.page("Edit message", &content))
}

/// One form, two buttons: save rewrites the post, delete removes it.
#[debug_handler(state = AppState)]
pub(crate) async fn edit_or_delete(
    Path((room_id, message_id)): Path<(String, String)>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(input): Form<EditInput>,
) -> AppResult<Response> {
    let (room, viewer) = match board_gate(&db_pool, &session, &room_id).await? {
        Ok(pair) => pair,
        Err(response) => return Ok(response),
    };
    let Some(message) = db::message_in_room(&db_pool, &room.id, &message_id).await? else {
        return res::sorry("message");
    };
    if message.sender_id != viewer.id {
        return session::flash_redirect(
            &session,
            &format!("/rooms/{room_id}/messages"),
            "You can only edit your own messages.",
        )
        .await;
    }

    if input.delete.is_some() {
        db::delete_message(&db_pool, &message.id).await?;
        return session::flash_redirect(
            &session,
            &format!("/rooms/{room_id}/messages"),
            "Message deleted.",
        )
        .await;
    }

    let content = input.content.trim();
    if content.is_empty() {
        return session::flash_redirect(
            &session,
            &format!("/rooms/{room_id}/messages/{message_id}"),
            "Please write a message.",
        )
        .await;
    }

    db::update_message_content(&db_pool, &message.id, content).await?;
    session::flash_redirect(
        &session,
        &format!("/rooms/{room_id}/messages"),
        "Message updated.",
    )
    .await
}

/// Everyone on the board must be signed in with a profile; the listing
/// must exist and be visible.
async fn board_gate(
    db_pool: &SqlitePool,
    session: &Session,
    room_id: &str,
) -> AppResult<Result<(Room, Profile), Response>> {
    let Some(user_id) = session::current_user(session).await? else {
        return Ok(Err(session::login_redirect(&format!(
            "/rooms/{room_id}/messages"
        ))));
    };
    let Some(room) = db::room(db_pool, room_id).await? else {
        return Ok(Err(res::sorry("room")?));
    };
    let Some(viewer) = db::profile_of(db_pool, &user_id).await? else {
        return Ok(Err(session::flash_redirect(
            session,
            "/profiles/new",
            "You need to create a profile first.",
        )
        .await?));
    };
    Ok(Ok((room, viewer)))
}
