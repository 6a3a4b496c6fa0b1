use axum::{debug_handler, extract::{Path, State}, response::Response, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::models::Profile;
use crate::res::{self, Shell};
use crate::{db, include_res, session, AppResult, AppState};

/// Fields from either contact form. Members submit `content`, guests
/// submit `name`/`email`/`message`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ContactInput {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    content: String,
}

pub(crate) fn validate_guest(input: &ContactInput) -> Vec<String> {
    let mut errors = Vec::new();

    let name = input.name.trim();
    let name_ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphabetic() || c == ' ' || c == '-' || c == '\'');
    if !name_ok {
        errors.push(
            "Please enter a valid name (letters, spaces, hyphens, and apostrophes only)."
                .to_owned(),
        );
    }

    if !input.email.trim().contains('@') {
        errors.push("Please enter a valid email address.".to_owned());
    }

    let message_len = input.message.trim().chars().count();
    if message_len < 10 {
        errors.push("Please write a more detailed message (at least 10 characters).".to_owned());
    } else if message_len > 1000 {
        errors.push("Message is too long. Please keep it under 1000 characters.".to_owned());
    }

    errors
}

fn member_form(shell: &Shell, target: &Profile, content: &str, errors: &[String]) -> Response {
    let page = include_res!(str, "/pages/contact_member.html")
        .replace("{id}", &target.id)
        .replace("{name}", &res::escape(&target.name))
        .replace("{errors}", &res::error_list(errors))
        .replace("{content}", &res::escape(content));
    shell.page(&format!("Contact {}", target.name), &page)
}

fn guest_form(shell: &Shell, target: &Profile, input: &ContactInput, errors: &[String]) -> Response {
    let page = include_res!(str, "/pages/contact_guest.html")
        .replace("{id}", &target.id)
        .replace("{name}", &res::escape(&target.name))
        .replace("{errors}", &res::error_list(errors))
        .replace("{sender_name}", &res::escape(&input.name))
        .replace("{sender_email}", &res::escape(&input.email))
        .replace("{message}", &res::escape(&input.message));
    shell.page(&format!("Contact {}", target.name), &page)
}

/// Members message through the inbox; visitors without an account leave a
/// contact note instead.
#[debug_handler(state = AppState)]
pub(crate) async fn contact_page(
    Path(profile_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(target) = db::profile(&db_pool, &profile_id).await? else {
        return res::sorry("profile");
    };

    match session::current_user(&session).await? {
        Some(user_id) => {
            let Some(sender) = db::profile_of(&db_pool, &user_id).await? else {
                return session::flash_redirect(
                    &session,
                    "/profiles/new",
                    "You need to create a profile before sending messages.",
                )
                .await;
            };
            if sender.id == target.id {
                return session::flash_redirect(
                    &session,
                    &format!("/profiles/{}", target.id),
                    "You cannot send a message to yourself.",
                )
                .await;
            }
            let shell = Shell::load(&session).await?;
            Ok(member_form(&shell, &target, "", &[]))
        }
        None => {
            let shell = Shell::load(&session).await?;
            Ok(guest_form(&shell, &target, &ContactInput::default(), &[]))
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn contact(
    Path(profile_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(input): Form<ContactInput>,
) -> AppResult<Response> {
    let Some(target) = db::profile(&db_pool, &profile_id).await? else {
        return res::sorry("profile");
    };

    match session::current_user(&session).await? {
        Some(user_id) => {
            let Some(sender) = db::profile_of(&db_pool, &user_id).await? else {
                return session::flash_redirect(
                    &session,
                    "/profiles/new",
                    "You need to create a profile before sending messages.",
                )
                .await;
            };
            if sender.id == target.id {
                return session::flash_redirect(
                    &session,
                    &format!("/profiles/{}", target.id),
                    "You cannot send a message to yourself.",
                )
                .await;
            }

            let content = input.content.trim();
            if content.is_empty() {
                session::flash(&session, "Please correct the errors below.").await?;
                let shell = Shell::load(&session).await?;
                return Ok(member_form(
                    &shell,
                    &target,
                    &input.content,
                    &["Please write a message.".to_owned()],
                ));
            }

            db::insert_message(&db_pool, &sender.id, &target.id, None, None, content).await?;
            session::flash_redirect(
                &session,
                &format!("/profiles/{}", target.id),
                &format!("Your message has been sent to {}!", target.name),
            )
            .await
        }
        None => {
            let errors = validate_guest(&input);
            if !errors.is_empty() {
                session::flash(&session, "Please correct the errors below.").await?;
                let shell = Shell::load(&session).await?;
                return Ok(guest_form(&shell, &target, &input, &errors));
            }

            db::insert_contact(
                &db_pool,
                &target.id,
                input.name.trim(),
                input.email.trim(),
                input.message.trim(),
            )
            .await?;
            session::flash_redirect(
                &session,
                &format!("/profiles/{}", target.id),
                &format!("Your message has been sent to {}!", target.name),
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest_input() -> ContactInput {
        ContactInput {
            name: "Sarah O'Neill-Khan".into(),
            email: "sarah@example.com".into(),
            message: "I am interested in being roommates, I also study at NYU.".into(),
            content: String::new(),
        }
    }

    #[test]
    fn well_formed_guest_input_passes() {
        assert!(validate_guest(&guest_input()).is_empty());
    }

    #[test]
    fn digits_in_name_are_rejected() {
        let mut input = guest_input();
        input.name = "Sarah123".into();
        let errors = validate_guest(&input);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("valid name"));
    }

    #[test]
    fn short_and_long_messages_are_rejected() {
        let mut input = guest_input();
        input.message = "hi".into();
        assert!(validate_guest(&input)[0].contains("more detailed"));

        input.message = "y".repeat(1001);
        assert!(validate_guest(&input)[0].contains("too long"));

        input.message = "y".repeat(1000);
        assert!(validate_guest(&input).is_empty());
    }

    #[test]
    fn email_needs_an_at_sign() {
        let mut input = guest_input();
        input.email = "not-an-email".into();
        assert!(validate_guest(&input)[0].contains("email"));
    }
}
