use axum::{debug_handler, extract::{Path, Query, State}, response::{IntoResponse, Redirect, Response}};
use oauth2::{CsrfToken, PkceCodeChallenge, Scope};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{include_res, res::{self, Shell}, session::{CSRF_STATE, PKCE_VERIFIER, RETURN_URL}, AppResult};

use super::{clients::ClientProvider, Clients};

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

#[debug_handler]
pub(crate) async fn login_page(
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    State(clients): State<Clients>,
    session: Session,
) -> AppResult<Response> {
    let return_query = match &return_url {
        Some(url) => format!("?return_url={}", res::escape(url)),
        None => String::new(),
    };

    let mut links = String::new();
    for provider in clients.providers() {
        links += &include_res!(str, "/fragments/provider_link.html")
            .replace("{slug}", provider.slug())
            .replace("{name}", &provider.to_string())
            .replace("{return_query}", &return_query);
    }
    if links.is_empty() {
        links = "<p class=\"notice\">Sign-in is not configured on this server yet.</p>".to_owned();
    }

    let content = include_res!(str, "/pages/login.html").replace("{provider_links}", &links);
    Ok(Shell::load(&session).await?.page("Sign in", &content))
}

#[debug_handler]
pub(crate) async fn login(
    Path(provider): Path<ClientProvider>,
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    State(clients): State<Clients>,
    session: Session,
) -> AppResult<Response> {
    let client = clients.get_client(provider)?;

    let (pkce_code_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let mut request = client.authorize_url(CsrfToken::new_random);
    for scope in provider.scopes() {
        request = request.add_scope(Scope::new((*scope).to_owned()));
    }
    let (authorize_url, csrf_state) = request.set_pkce_challenge(pkce_code_challenge).url();

    session.insert(CSRF_STATE, csrf_state.secret()).await?;
    session.insert(PKCE_VERIFIER, pkce_verifier.secret()).await?;
    if let Some(return_url) = return_url {
        session.insert(RETURN_URL, return_url).await?;
    }

    Ok(Redirect::to(authorize_url.as_str()).into_response())
}
