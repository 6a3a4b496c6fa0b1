use axum::{debug_handler, extract::{Path, State}, response::Response, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::models::{Gender, Profile, ProfileDraft};
use crate::res::{self, Shell};
use crate::{db, include_res, session, AppResult, AppState};

/// Raw form fields. Everything arrives as a string; checkboxes are absent
/// when unticked.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProfileInput {
    #[serde(default)]
    name: String,
    #[serde(default)]
    age: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    neighborhood: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    photo_url: String,
    #[serde(default)]
    is_looking_for_room: String,
    #[serde(default)]
    only_eats_zabihah: String,
    #[serde(default)]
    prayer_friendly: String,
    #[serde(default)]
    guests_allowed: String,
    #[serde(default)]
    contact_email: String,
}

fn none_if_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_owned()) }
}

pub(crate) fn validate(input: &ProfileInput) -> Result<ProfileDraft, Vec<String>> {
    let mut errors = Vec::new();

    let name = input.name.trim();
    if name.is_empty() {
        errors.push("Please enter your name.".to_owned());
    }

    let age = match input.age.trim().parse::<i64>() {
        Ok(age) if (18..=99).contains(&age) => age,
        Ok(_) => {
            errors.push("Age must be between 18 and 99.".to_owned());
            0
        }
        Err(_) => {
            errors.push("Please enter a valid age.".to_owned());
            0
        }
    };

    let gender = match Gender::parse(input.gender.trim()) {
        Some(gender) => gender,
        None => {
            errors.push("Please select a gender.".to_owned());
            Gender::Male
        }
    };

    let city = input.city.trim();
    if city.is_empty() {
        errors.push("Please enter your city.".to_owned());
    }

    let contact_email = input.contact_email.trim();
    if !contact_email.contains('@') {
        errors.push("Please enter a valid contact email.".to_owned());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ProfileDraft {
        name: name.to_owned(),
        age,
        gender,
        city: city.to_owned(),
        state: input.state.trim().to_owned(),
        neighborhood: none_if_empty(&input.neighborhood),
        bio: input.bio.trim().to_owned(),
        photo_url: none_if_empty(&input.photo_url),
        is_looking_for_room: !input.is_looking_for_room.is_empty(),
        only_eats_zabihah: !input.only_eats_zabihah.is_empty(),
        prayer_friendly: !input.prayer_friendly.is_empty(),
        guests_allowed: !input.guests_allowed.is_empty(),
        contact_email: contact_email.to_owned(),
    })
}

fn input_from(profile: &Profile) -> ProfileInput {
    let tick = |on: bool| if on { "on".to_owned() } else { String::new() };
    ProfileInput {
        name: profile.name.clone(),
        age: profile.age.to_string(),
        gender: profile.gender.as_str().to_owned(),
        city: profile.city.clone(),
        state: profile.state.clone(),
        neighborhood: profile.neighborhood.clone().unwrap_or_default(),
        bio: profile.bio.clone(),
        photo_url: profile.photo_url.clone().unwrap_or_default(),
        is_looking_for_room: tick(profile.is_looking_for_room),
        only_eats_zabihah: tick(profile.only_eats_zabihah),
        prayer_friendly: tick(profile.prayer_friendly),
        guests_allowed: tick(profile.guests_allowed),
        contact_email: profile.contact_email.clone(),
    }
}

fn form_page(shell: &Shell, title: &str, action: &str, input: &ProfileInput, errors: &[String]) -> Response {
    let content = include_res!(str, "/pages/profile_form.html")
        .replace("{action}", action)
        .replace("{errors}", &res::error_list(errors))
        .replace("{name}", &res::escape(&input.name))
        .replace("{age}", &res::escape(&input.age))
        .replace("{gender_male}", res::selected(input.gender == "male"))
        .replace("{gender_female}", res::selected(input.gender == "female"))
        .replace("{city}", &res::escape(&input.city))
        .replace("{state}", &res::escape(&input.state))
        .replace("{neighborhood}", &res::escape(&input.neighborhood))
        .replace("{bio}", &res::escape(&input.bio))
        .replace("{photo_url}", &res::escape(&input.photo_url))
        .replace("{looking_checked}", res::checked(!input.is_looking_for_room.is_empty()))
        .replace("{zabihah_checked}", res::checked(!input.only_eats_zabihah.is_empty()))
        .replace("{prayer_checked}", res::checked(!input.prayer_friendly.is_empty()))
        .replace("{guests_checked}", res::checked(!input.guests_allowed.is_empty()))
        .replace("{contact_email}", &res::escape(&input.contact_email));

    shell.page(title, &content)
}

/// One profile per account: coming back here with a profile pre-fills the
/// form and saving updates it in place.
#[debug_handler(state = AppState)]
pub(crate) async fn new_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect("/profiles/new"));
    };

    let input = match db::profile_of(&db_pool, &user_id).await? {
        Some(profile) => input_from(&profile),
        None => ProfileInput::default(),
    };

    let shell = Shell::load(&session).await?;
    Ok(form_page(&shell, "Create profile", "/profiles/new", &input, &[]))
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(input): Form<ProfileInput>,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect("/profiles/new"));
    };

    let draft = match validate(&input) {
        Ok(draft) => draft,
        Err(errors) => {
            session::flash(&session, "Please correct the errors below.").await?;
            let shell = Shell::load(&session).await?;
            return Ok(form_page(&shell, "Create profile", "/profiles/new", &input, &errors));
        }
    };

    let msg = match db::profile_of(&db_pool, &user_id).await? {
        Some(existing) => {
            db::update_profile(&db_pool, &existing.id, &draft).await?;
            "Profile updated successfully!"
        }
        None => {
            db::insert_profile(&db_pool, &user_id, &draft).await?;
            "Profile created successfully!"
        }
    };

    session::flash_redirect(&session, "/", msg).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_page(
    Path(profile_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect(&format!("/profiles/{profile_id}/edit")));
    };
    let Some(profile) = db::profile(&db_pool, &profile_id).await? else {
        return res::sorry("profile");
    };
    if profile.user_id != user_id {
        return session::flash_redirect(
            &session,
            &format!("/profiles/{profile_id}"),
            "You can only edit your own profile.",
        )
        .await;
    }

    let shell = Shell::load(&session).await?;
    let action = format!("/profiles/{profile_id}/edit");
    Ok(form_page(&shell, "Edit profile", &action, &input_from(&profile), &[]))
}

#[debug_handler(state = AppState)]
pub(crate) async fn update(
    Path(profile_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(input): Form<ProfileInput>,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect(&format!("/profiles/{profile_id}/edit")));
    };
    let Some(profile) = db::profile(&db_pool, &profile_id).await? else {
        return res::sorry("profile");
    };
    if profile.user_id != user_id {
        return session::flash_redirect(
            &session,
            &format!("/profiles/{profile_id}"),
            "You can only edit your own profile.",
        )
        .await;
    }

    let draft = match validate(&input) {
        Ok(draft) => draft,
        Err(errors) => {
            session::flash(&session, "Please correct the errors below.").await?;
            let shell = Shell::load(&session).await?;
            let action = format!("/profiles/{profile_id}/edit");
            return Ok(form_page(&shell, "Edit profile", &action, &input, &errors));
        }
    };

    db::update_profile(&db_pool, &profile.id, &draft).await?;
    session::flash_redirect(
        &session,
        &format!("/profiles/{profile_id}"),
        "Profile updated successfully!",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ProfileInput {
        ProfileInput {
            name: "Ahmed Hassan".into(),
            age: "25".into(),
            gender: "male".into(),
            city: "New York".into(),
            state: "NY".into(),
            bio: "Graduate student".into(),
            is_looking_for_room: "on".into(),
            contact_email: "ahmed@example.com".into(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_input_becomes_a_draft() {
        let draft = validate(&filled()).unwrap();
        assert_eq!(draft.name, "Ahmed Hassan");
        assert_eq!(draft.age, 25);
        assert_eq!(draft.gender, Gender::Male);
        assert!(draft.is_looking_for_room);
        assert!(!draft.only_eats_zabihah);
        assert_eq!(draft.neighborhood, None);
    }

    #[test]
    fn missing_fields_are_each_reported() {
        let errors = validate(&ProfileInput::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("name")));
        assert!(errors.iter().any(|e| e.contains("age")));
        assert!(errors.iter().any(|e| e.contains("gender")));
        assert!(errors.iter().any(|e| e.contains("city")));
        assert!(errors.iter().any(|e| e.contains("email")));
    }

    #[test]
    fn age_bounds_are_enforced() {
        let mut input = filled();
        input.age = "17".into();
        assert!(validate(&input).is_err());
        input.age = "100".into();
        assert!(validate(&input).is_err());
        input.age = "99".into();
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn whitespace_is_trimmed() {
        let mut input = filled();
        input.name = "  Ahmed  ".into();
        input.neighborhood = "   ".into();
        let draft = validate(&input).unwrap();
        assert_eq!(draft.name, "Ahmed");
        assert_eq!(draft.neighborhood, None);
    }

    #[test]
    fn prefill_round_trips_checkboxes() {
        let draft = validate(&filled()).unwrap();
        let profile = Profile {
            id: "p".into(),
            user_id: "u".into(),
            name: draft.name.clone(),
            age: draft.age,
            gender: draft.gender,
            city: draft.city.clone(),
            state: draft.state.clone(),
            neighborhood: None,
            bio: draft.bio.clone(),
            photo_url: None,
            is_looking_for_room: true,
            only_eats_zabihah: false,
            prayer_friendly: true,
            guests_allowed: false,
            contact_email: draft.contact_email.clone(),
            created_at: String::new(),
        };
        let input = input_from(&profile);
        assert_eq!(input.is_looking_for_room, "on");
        assert_eq!(input.only_eats_zabihah, "");
        assert_eq!(input.prayer_friendly, "on");
        assert_eq!(input.age, "25");
    }
}
