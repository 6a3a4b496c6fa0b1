use axum::{
    debug_handler,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tower_sessions::Session;

use crate::{session, AppResult};

/// Load a file from the res/ tree at compile time.
#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Escape user data for interpolation into a page. Braces are escaped too so
/// user text can never smuggle a `{placeholder}` into a later substitution.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            c => out.push(c),
        }
    }
    out
}

/// Escaped text with newlines kept visible.
pub fn multiline(s: &str) -> String {
    escape(s).replace('\n', "<br>\n")
}

/// Percent-encode a query-string value.
pub fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out += &format!("%{byte:02X}"),
        }
    }
    out
}

pub fn checked(on: bool) -> &'static str {
    if on { "checked" } else { "" }
}

pub fn selected(on: bool) -> &'static str {
    if on { "selected" } else { "" }
}

/// `<option>` list for a select, keeping the submitted choice selected.
pub fn options(items: &[(String, String)], current: &str) -> String {
    let mut out = String::new();
    for (value, label) in items {
        out += &format!(
            "<option value=\"{}\" {}>{}</option>\n",
            escape(value),
            selected(value == current),
            escape(label),
        );
    }
    out
}

/// Validation failures as a list, empty string when there are none.
pub fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut items = String::new();
    for error in errors {
        items += &format!("<li>{}</li>", escape(error));
    }
    format!(r#"<ul class="errors">{items}</ul>"#)
}

pub fn markdown_to_html(md: &str) -> String {
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, pulldown_cmark::Parser::new(md));
    html
}

/// Per-request page chrome: pending flash notice and nav state.
pub struct Shell {
    pub flash: Option<String>,
    pub signed_in: bool,
}

const NAV_GUEST: &str = r#"<a href="/profiles">Browse</a> <a href="/rooms/search">Rooms</a> <a href="/login">Log in</a>"#;
const NAV_USER: &str = r#"<a href="/profiles">Browse</a> <a href="/rooms/search">Rooms</a> <a href="/dashboard">Dashboard</a> <a href="/inbox">Inbox</a> <a href="/logout">Log out</a>"#;

impl Shell {
    pub async fn load(session: &Session) -> AppResult<Shell> {
        Ok(Shell {
            flash: session::take_flash(session).await?,
            signed_in: session::current_user(session).await?.is_some(),
        })
    }

    /// Wrap page content in the shared layout.
    pub fn page(&self, title: &str, content: &str) -> Response {
        let flash = match &self.flash {
            Some(msg) => include_res!(str, "/fragments/flash.html").replace("{msg}", &escape(msg)),
            None => String::new(),
        };
        let body = include_res!(str, "/layout.html")
            .replace("{title}", &escape(title))
            .replace("{nav_links}", if self.signed_in { NAV_USER } else { NAV_GUEST })
            .replace("{flash}", &flash)
            .replace("{content}", content);
        Html(body).into_response()
    }
}

pub fn sorry_page(what: &str) -> String {
    include_res!(str, "/sorry.html").replace("{what}", &escape(what))
}

/// 404 response used when a record is missing or hidden from the viewer.
pub fn sorry(what: &'static str) -> AppResult<Response> {
    Ok((StatusCode::NOT_FOUND, Html(sorry_page(what))).into_response())
}

#[debug_handler]
pub async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css")],
        include_res!(str, "/style.css"),
    )
}
