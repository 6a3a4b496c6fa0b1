//! Delegated sign-in. Providers authenticate the visitor, the Firebase
//! identity toolkit resolves the token to a stable subject, and first
//! login doubles as signup.

mod clients;
mod login;
mod lockin;
mod logout;

use axum::{routing::get, Router};

pub use clients::{ClientProvider, Clients};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page))
        .route("/login/{provider}", get(login::login))
        .route("/lockin/{provider}", get(lockin::lockin))
        .route("/logout", get(logout::logout))
}
