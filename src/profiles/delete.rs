use axum::{debug_handler, extract::{Path, State}, response::Response};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::res::{self, Shell};
use crate::{db, include_res, session, AppResult, AppState};

/// Confirmation page. Deleting a profile takes its listings and messages
/// with it, so the warning spells that out.
#[debug_handler(state = AppState)]
pub(crate) async fn confirm(
    Path(profile_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect(&format!("/profiles/{profile_id}/delete")));
    };
    let Some(profile) = db::profile(&db_pool, &profile_id).await? else {
        return res::sorry("profile");
    };
    if profile.user_id != user_id {
        return session::flash_redirect(
            &session,
            &format!("/profiles/{profile_id}"),
            "You can only delete your own profile.",
        )
        .await;
    }

    let content = include_res!(str, "/pages/profile_delete.html")
        .replace("{id}", &profile.id)
        .replace("{name}", &res::escape(&profile.name));

    Ok(Shell::load(&session).await?.page("Delete profile", &content))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete(
    Path(profile_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect(&format!("/profiles/{profile_id}/delete")));
    };
    let Some(profile) = db::profile(&db_pool, &profile_id).await? else {
        return res::sorry("profile");
    };
    if profile.user_id != user_id {
        return session::flash_redirect(
            &session,
            &format!("/profiles/{profile_id}"),
            "You can only delete your own profile.",
        )
        .await;
    }

    db::delete_profile(&db_pool, &profile.id).await?;
    tracing::info!(profile_id = %profile.id, "profile deleted");

    session::flash_redirect(
        &session,
        "/",
        &format!("Profile \"{}\" has been deleted successfully.", profile.name),
    )
    .await
}
