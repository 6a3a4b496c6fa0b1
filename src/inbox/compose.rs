use axum::{debug_handler, extract::{Path, State}, response::Response, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::res::{self, Shell};
use crate::{db, include_res, session, AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ComposeInput {
    #[serde(default)]
    recipient_id: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    content: String,
}

fn form_page(
    shell: &Shell,
    choices: &[(String, String)],
    input: &ComposeInput,
    errors: &[String],
) -> Response {
    let content = include_res!(str, "/pages/compose.html")
        .replace("{errors}", &res::error_list(errors))
        .replace("{recipient_options}", &res::options(choices, &input.recipient_id))
        .replace("{subject}", &res::escape(&input.subject))
        .replace("{content}", &res::escape(&input.content));

    shell.page("New message", &content)
}

/// Compose form, optionally arriving with a recipient preselected from a
/// profile page.
#[debug_handler(state = AppState)]
pub(crate) async fn compose_page(
    recipient: Option<Path<String>>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect("/inbox/compose"));
    };
    let Some(viewer) = db::profile_of(&db_pool, &user_id).await? else {
        return session::flash_redirect(
            &session,
            "/profiles/new",
            "You need to create a profile before sending messages.",
        )
        .await;
    };

    let mut input = ComposeInput::default();
    if let Some(Path(profile_id)) = recipient {
        if profile_id == viewer.id {
            return session::flash_redirect(
                &session,
                "/inbox",
                "You cannot send a message to yourself.",
            )
            .await;
        }
        if db::profile(&db_pool, &profile_id).await?.is_none() {
            return res::sorry("profile");
        }
        input.recipient_id = profile_id;
    }

    let choices = db::profile_choices(&db_pool, &viewer.id).await?;
    let shell = Shell::load(&session).await?;
    Ok(form_page(&shell, &choices, &input, &[]))
}

#[debug_handler(state = AppState)]
pub(crate) async fn send(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(input): Form<ComposeInput>,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect("/inbox/compose"));
    };
    let Some(viewer) = db::profile_of(&db_pool, &user_id).await? else {
        return session::flash_redirect(
            &session,
            "/profiles/new",
            "You need to create a profile before sending messages.",
        )
        .await;
    };

    let mut errors = Vec::new();
    let recipient = match db::profile(&db_pool, &input.recipient_id).await? {
        Some(profile) if profile.id != viewer.id => Some(profile),
        _ => {
            errors.push("Please choose a recipient.".to_owned());
            None
        }
    };
    let content = input.content.trim();
    if content.is_empty() {
        errors.push("Please write a message.".to_owned());
    }

    let (Some(recipient), true) = (recipient, errors.is_empty()) else {
        session::flash(&session, "Please correct the errors below.").await?;
        let choices = db::profile_choices(&db_pool, &viewer.id).await?;
        let shell = Shell::load(&session).await?;
        return Ok(form_page(&shell, &choices, &input, &errors));
    };

    let subject = input.subject.trim();
    let subject = if subject.is_empty() { None } else { Some(subject) };
    db::insert_message(&db_pool, &viewer.id, &recipient.id, None, subject, content).await?;

    session::flash_redirect(
        &session,
        "/inbox",
        &format!("Your message has been sent to {}!", recipient.name),
    )
    .await
}
