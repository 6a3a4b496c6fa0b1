use axum::{debug_handler, extract::{Path, State}, response::Response};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::models::Room;
use crate::res::{self, Shell};
use crate::{db, include_res, session, AppResult, AppState};

/// Only the listing's owner gets past this. Everyone else is bounced with
/// a flash explaining why.
async fn owner_gate(
    db_pool: &SqlitePool,
    session: &Session,
    room_id: &str,
) -> AppResult<Result<Room, Response>> {
    let Some(user_id) = session::current_user(session).await? else {
        return Ok(Err(session::login_redirect(&format!(
            "/rooms/{room_id}/delete"
        ))));
    };
    let Some(room) = db::room(db_pool, room_id).await? else {
        return Ok(Err(res::sorry("room")?));
    };
    let Some(profile) = db::profile_of(db_pool, &user_id).await? else {
        return Ok(Err(session::flash_redirect(
            session,
            "/profiles/new",
            "You need to create a profile first.",
        )
        .await?));
    };
    if room.profile_id != profile.id {
        return Ok(Err(session::flash_redirect(
            session,
            &format!("/rooms/{room_id}"),
            "You can only delete your own room listings.",
        )
        .await?));
    }
    Ok(Ok(room))
}

#[debug_handler(state = AppState)]
pub(crate) async fn confirm(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let room = match owner_gate(&db_pool, &session, &room_id).await? {
        Ok(room) => room,
        Err(response) => return Ok(response),
    };

    let content = include_res!(str, "/pages/room_delete.html")
        .replace("{id}", &room.id)
        .replace("{title}", &res::escape(&room.title));

    let shell = Shell::load(&session).await?;
    Ok(shell.page("Delete listing", &content))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let room = match owner_gate(&db_pool, &session, &room_id).await? {
        Ok(room) => room,
        Err(response) => return Ok(response),
    };

    db::delete_room(&db_pool, &room.id).await?;
    tracing::info!(room_id = %room.id, "room listing deleted");

    session::flash_redirect(
        &session,
        "/dashboard",
        &format!("Room listing \"{}\" has been deleted successfully.", room.title),
    )
    .await
}
