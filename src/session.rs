use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;

use crate::AppResult;

pub const USER_ID: &str = "user_id";
pub const CSRF_STATE: &str = "csrf_state";
pub const PKCE_VERIFIER: &str = "pkce_verifier";
pub const RETURN_URL: &str = "return_url";
pub const FLASH: &str = "flash";

/// Id of the signed-in user, if any.
pub async fn current_user(session: &Session) -> AppResult<Option<String>> {
    Ok(session.get::<String>(USER_ID).await?)
}

/// Store a one-shot notice shown on the next rendered page.
pub async fn flash(session: &Session, msg: &str) -> AppResult<()> {
    session.insert(FLASH, msg.to_owned()).await?;
    Ok(())
}

/// Pop the pending notice, if any.
pub async fn take_flash(session: &Session) -> AppResult<Option<String>> {
    Ok(session.remove::<String>(FLASH).await?)
}

/// Redirect with a flash message, the post/redirect/get staple.
pub async fn flash_redirect(session: &Session, to: &str, msg: &str) -> AppResult<Response> {
    flash(session, msg).await?;
    Ok(Redirect::to(to).into_response())
}

/// Redirect an anonymous visitor to the login page, returning here after.
pub fn login_redirect(return_to: &str) -> Response {
    Redirect::to(&format!("/login?return_url={return_to}")).into_response()
}
