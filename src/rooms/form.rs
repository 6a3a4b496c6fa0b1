use axum::{debug_handler, extract::{Path, State}, response::Response};
use axum_extra::extract::Form;
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::models::{Amenity, Room, RoomDraft, RoomImage, RoomType, US_MAJOR_CITIES};
use crate::res::{self, Shell};
use crate::{db, include_res, session, AppResult, AppState};

/// Raw form fields. `amenities` repeats once per ticked checkbox, which is
/// why these handlers take the axum-extra form extractor.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RoomInput {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    room_type: String,
    #[serde(default)]
    amenities: Vec<String>,
    #[serde(default)]
    city: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    available_from: String,
    #[serde(default)]
    phone_number: String,
    #[serde(default)]
    contact_email: String,
    #[serde(default)]
    only_eats_zabihah: String,
    #[serde(default)]
    prayer_friendly: String,
    #[serde(default)]
    guests_allowed: String,
    #[serde(default)]
    image_urls: String,
}

/// A validated submission: the listing itself plus the relations that hang
/// off it.
#[derive(Debug)]
pub(crate) struct RoomSubmission {
    pub draft: RoomDraft,
    pub amenity_ids: Vec<String>,
    pub image_urls: Vec<String>,
}

fn none_if_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_owned()) }
}

fn is_iso_date(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 || parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
        return false;
    }
    let (Ok(_), Ok(month), Ok(day)) = (
        parts[0].parse::<u32>(),
        parts[1].parse::<u32>(),
        parts[2].parse::<u32>(),
    ) else {
        return false;
    };
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

pub(crate) fn validate(
    input: &RoomInput,
    room_types: &[RoomType],
    amenities: &[Amenity],
) -> Result<RoomSubmission, Vec<String>> {
    let mut errors = Vec::new();

    let title = input.title.trim();
    if title.is_empty() {
        errors.push("Please enter a title.".to_owned());
    }

    let description = input.description.trim();
    if description.chars().count() < 50 {
        errors.push("Description must be at least 50 characters long.".to_owned());
    }

    let room_type_id = none_if_empty(&input.room_type);
    if let Some(id) = &room_type_id {
        if !room_types.iter().any(|t| &t.id == id) {
            errors.push("Please select a valid room type.".to_owned());
        }
    }

    let mut amenity_ids = Vec::new();
    for id in &input.amenities {
        if !amenities.iter().any(|a| &a.id == id) {
            errors.push("Please pick amenities from the list.".to_owned());
            break;
        }
        if !amenity_ids.contains(id) {
            amenity_ids.push(id.clone());
        }
    }

    let city = input.city.trim();
    if !US_MAJOR_CITIES.contains(&city) {
        errors.push("Please select a city.".to_owned());
    }

    let price = match input.price.trim().parse::<i64>() {
        Ok(price) if price >= 0 && price % 25 == 0 => price,
        Ok(price) if price >= 0 => {
            errors.push("Price must be in increments of $25 (e.g., $800, $825, $850).".to_owned());
            0
        }
        _ => {
            errors.push("Please enter a valid price.".to_owned());
            0
        }
    };

    let available_from = none_if_empty(&input.available_from);
    if let Some(date) = &available_from {
        if !is_iso_date(date) {
            errors.push("Please enter the available date as YYYY-MM-DD.".to_owned());
        }
    }

    let phone_number = none_if_empty(&input.phone_number);
    if let Some(phone) = &phone_number {
        let ok = phone
            .chars()
            .all(|c| c.is_ascii_digit() || "()+-. ".contains(c));
        if !ok {
            errors.push("Please enter a valid phone number.".to_owned());
        }
    }

    let contact_email = none_if_empty(&input.contact_email);
    if let Some(email) = &contact_email {
        if !email.contains('@') {
            errors.push("Please enter a valid contact email.".to_owned());
        }
    }

    let mut image_urls = Vec::new();
    for line in input.image_urls.lines() {
        let url = line.trim();
        if url.is_empty() {
            continue;
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push("Image links must start with http:// or https://.".to_owned());
            break;
        }
        image_urls.push(url.to_owned());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(RoomSubmission {
        draft: RoomDraft {
            title: title.to_owned(),
            description: description.to_owned(),
            room_type_id,
            city: city.to_owned(),
            price,
            available_from,
            phone_number,
            contact_email,
            only_eats_zabihah: !input.only_eats_zabihah.is_empty(),
            prayer_friendly: !input.prayer_friendly.is_empty(),
            guests_allowed: !input.guests_allowed.is_empty(),
        },
        amenity_ids,
        image_urls,
    })
}

async fn input_from(pool: &SqlitePool, room: &Room) -> AppResult<RoomInput> {
    let tick = |on: bool| if on { "on".to_owned() } else { String::new() };
    let images: Vec<String> = db::room_images(pool, &room.id)
        .await?
        .iter()
        .map(|image: &RoomImage| image.url.clone())
        .collect();
    Ok(RoomInput {
        title: room.title.clone(),
        description: room.description.clone(),
        room_type: room.room_type_id.clone().unwrap_or_default(),
        amenities: db::room_amenity_ids(pool, &room.id).await?,
        city: room.city.clone(),
        price: room.price.to_string(),
        available_from: room.available_from.clone().unwrap_or_default(),
        phone_number: room.phone_number.clone().unwrap_or_default(),
        contact_email: room.contact_email.clone().unwrap_or_default(),
        only_eats_zabihah: tick(room.only_eats_zabihah),
        prayer_friendly: tick(room.prayer_friendly),
        guests_allowed: tick(room.guests_allowed),
        image_urls: images.join("\n"),
    })
}

pub(super) fn amenity_boxes(amenities: &[Amenity], ticked: &[String]) -> String {
    let mut html = String::new();
    for amenity in amenities {
        html += &include_res!(str, "/fragments/amenity_checkbox.html")
            .replace("{id}", &amenity.id)
            .replace("{name}", &res::escape(&amenity.name))
            .replace("{checked}", res::checked(ticked.contains(&amenity.id)));
    }
    html
}

fn form_page(
    shell: &Shell,
    title: &str,
    action: &str,
    input: &RoomInput,
    errors: &[String],
    room_types: &[RoomType],
    amenities: &[Amenity],
) -> Response {
    let type_options: Vec<(String, String)> = room_types
        .iter()
        .map(|t| (t.id.clone(), t.name.clone()))
        .collect();
    let city_options: Vec<(String, String)> = US_MAJOR_CITIES
        .iter()
        .map(|city| (city.to_string(), city.to_string()))
        .collect();

    let content = include_res!(str, "/pages/room_form.html")
        .replace("{action}", action)
        .replace("{errors}", &res::error_list(errors))
        .replace("{title}", &res::escape(&input.title))
        .replace("{description}", &res::escape(&input.description))
        .replace("{room_type_options}", &res::options(&type_options, &input.room_type))
        .replace("{amenity_boxes}", &amenity_boxes(amenities, &input.amenities))
        .replace("{city_options}", &res::options(&city_options, &input.city))
        .replace("{price}", &res::escape(&input.price))
        .replace("{available_from}", &res::escape(&input.available_from))
        .replace("{phone_number}", &res::escape(&input.phone_number))
        .replace("{contact_email}", &res::escape(&input.contact_email))
        .replace("{zabihah_checked}", res::checked(!input.only_eats_zabihah.is_empty()))
        .replace("{prayer_checked}", res::checked(!input.prayer_friendly.is_empty()))
        .replace("{guests_checked}", res::checked(!input.guests_allowed.is_empty()))
        .replace("{image_urls}", &res::escape(&input.image_urls));

    shell.page(title, &content)
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect("/rooms/new"));
    };
    if db::profile_of(&db_pool, &user_id).await?.is_none() {
        return session::flash_redirect(
            &session,
            "/profiles/new",
            "You need to create a profile before listing a room.",
        )
        .await;
    }

    let room_types = db::room_types(&db_pool).await?;
    let amenities = db::amenities(&db_pool).await?;

    let mut input = RoomInput::default();
    if let Some(private) = room_types
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case("private room"))
    {
        input.room_type = private.id.clone();
    }

    let shell = Shell::load(&session).await?;
    Ok(form_page(&shell, "List a room", "/rooms/new", &input, &[], &room_types, &amenities))
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(input): Form<RoomInput>,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect("/rooms/new"));
    };
    let Some(profile) = db::profile_of(&db_pool, &user_id).await? else {
        return session::flash_redirect(
            &session,
            "/profiles/new",
            "You need to create a profile before listing a room.",
        )
        .await;
    };

    let room_types = db::room_types(&db_pool).await?;
    let amenities = db::amenities(&db_pool).await?;

    let submission = match validate(&input, &room_types, &amenities) {
        Ok(submission) => submission,
        Err(errors) => {
            session::flash(&session, "Please correct the errors below.").await?;
            let shell = Shell::load(&session).await?;
            return Ok(form_page(&shell, "List a room", "/rooms/new", &input, &errors, &room_types, &amenities));
        }
    };

    let room_id = db::insert_room(&db_pool, &profile.id, &submission.draft).await?;
    db::set_room_amenities(&db_pool, &room_id, &submission.amenity_ids).await?;
    db::replace_room_images(&db_pool, &room_id, &submission.image_urls).await?;
    tracing::info!(room_id = %room_id, profile_id = %profile.id, "room listed");

    session::flash_redirect(
        &session,
        &format!("/rooms/{room_id}"),
        "Room listing created successfully!",
    )
    .await
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_page(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect(&format!("/rooms/{room_id}/edit")));
    };
    let Some(room) = db::room(&db_pool, &room_id).await? else {
        return res::sorry("room");
    };
    let Some(profile) = db::profile_of(&db_pool, &user_id).await? else {
        return session::flash_redirect(&session, "/profiles/new", "You need to create a profile first.")
            .await;
    };
    if room.profile_id != profile.id {
        return session::flash_redirect(
            &session,
            &format!("/rooms/{room_id}"),
            "You can only edit your own room listings.",
        )
        .await;
    }

    let room_types = db::room_types(&db_pool).await?;
    let amenities = db::amenities(&db_pool).await?;
    let input = input_from(&db_pool, &room).await?;

    let shell = Shell::load(&session).await?;
    let action = format!("/rooms/{room_id}/edit");
    Ok(form_page(&shell, "Edit listing", &action, &input, &[], &room_types, &amenities))
}

#[debug_handler(state = AppState)]
pub(crate) async fn update(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(input): Form<RoomInput>,
) -> AppResult<Response> {
    let Some(user_id) = session::current_user(&session).await? else {
        return Ok(session::login_redirect(&format!("/rooms/{room_id}/edit")));
    };
    let Some(room) = db::room(&db_pool, &room_id).await? else {
        return res::sorry("room");
    };
    let Some(profile) = db::profile_of(&db_pool, &user_id).await? else {
        return session::flash_redirect(&session, "/profiles/new", "You need to create a profile first.")
            .await;
    };
    if room.profile_id != profile.id {
        return session::flash_redirect(
            &session,
            &format!("/rooms/{room_id}"),
            "You can only edit your own room listings.",
        )
        .await;
    }

    let room_types = db::room_types(&db_pool).await?;
    let amenities = db::amenities(&db_pool).await?;

    let submission = match validate(&input, &room_types, &amenities) {
        Ok(submission) => submission,
        Err(errors) => {
            session::flash(&session, "Please correct the errors below.").await?;
            let shell = Shell::load(&session).await?;
            let action = format!("/rooms/{room_id}/edit");
            return Ok(form_page(&shell, "Edit listing", &action, &input, &errors, &room_types, &amenities));
        }
    };

    db::update_room(&db_pool, &room.id, &submission.draft).await?;
    db::set_room_amenities(&db_pool, &room.id, &submission.amenity_ids).await?;
    db::replace_room_images(&db_pool, &room.id, &submission.image_urls).await?;

    session::flash_redirect(
        &session,
        &format!("/rooms/{room_id}"),
        "Room listing updated successfully!",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookups() -> (Vec<RoomType>, Vec<Amenity>) {
        let types = vec![
            RoomType { id: "t1".into(), name: "Private Room".into(), description: String::new() },
            RoomType { id: "t2".into(), name: "Studio Apartment".into(), description: String::new() },
        ];
        let amenities = vec![
            Amenity { id: "a1".into(), name: "WiFi".into(), description: String::new() },
            Amenity { id: "a2".into(), name: "Parking".into(), description: String::new() },
        ];
        (types, amenities)
    }

    fn filled() -> RoomInput {
        RoomInput {
            title: "Room near campus".into(),
            description: "Bright private room two blocks from the mosque, \
                          utilities and fast internet included in the rent."
                .into(),
            room_type: "t1".into(),
            amenities: vec!["a1".into(), "a2".into()],
            city: "Chicago".into(),
            price: "950".into(),
            available_from: "2026-09-01".into(),
            phone_number: "+1 (555) 010-0199".into(),
            contact_email: "omar@example.com".into(),
            only_eats_zabihah: "on".into(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_input_becomes_a_submission() {
        let (types, amenities) = lookups();
        let submission = validate(&filled(), &types, &amenities).unwrap();
        assert_eq!(submission.draft.title, "Room near campus");
        assert_eq!(submission.draft.price, 950);
        assert_eq!(submission.draft.room_type_id.as_deref(), Some("t1"));
        assert_eq!(submission.amenity_ids, vec!["a1", "a2"]);
        assert!(submission.draft.only_eats_zabihah);
        assert!(!submission.draft.guests_allowed);
    }

    #[test]
    fn price_must_be_a_25_dollar_step() {
        let (types, amenities) = lookups();
        let mut input = filled();
        input.price = "949".into();
        let errors = validate(&input, &types, &amenities).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("$25")));

        input.price = "-25".into();
        assert!(validate(&input, &types, &amenities).is_err());

        input.price = "0".into();
        assert!(validate(&input, &types, &amenities).is_ok());
    }

    #[test]
    fn short_descriptions_are_rejected() {
        let (types, amenities) = lookups();
        let mut input = filled();
        input.description = "Too short".into();
        let errors = validate(&input, &types, &amenities).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("50 characters")));
    }

    #[test]
    fn unknown_choices_are_rejected() {
        let (types, amenities) = lookups();

        let mut input = filled();
        input.room_type = "bogus".into();
        assert!(validate(&input, &types, &amenities).is_err());

        let mut input = filled();
        input.amenities = vec!["a1".into(), "bogus".into()];
        assert!(validate(&input, &types, &amenities).is_err());

        let mut input = filled();
        input.city = "Springfield".into();
        assert!(validate(&input, &types, &amenities).is_err());
    }

    #[test]
    fn duplicate_amenities_collapse() {
        let (types, amenities) = lookups();
        let mut input = filled();
        input.amenities = vec!["a1".into(), "a1".into(), "a2".into()];
        let submission = validate(&input, &types, &amenities).unwrap();
        assert_eq!(submission.amenity_ids, vec!["a1", "a2"]);
    }

    #[test]
    fn dates_must_look_like_iso() {
        let (types, amenities) = lookups();
        let mut input = filled();
        input.available_from = "09/01/2026".into();
        assert!(validate(&input, &types, &amenities).is_err());
        input.available_from = "2026-13-01".into();
        assert!(validate(&input, &types, &amenities).is_err());
        input.available_from = String::new();
        let submission = validate(&input, &types, &amenities).unwrap();
        assert_eq!(submission.draft.available_from, None);
    }

    #[test]
    fn image_lines_become_urls() {
        let (types, amenities) = lookups();
        let mut input = filled();
        input.image_urls = "https://img.example.com/a.jpg\n\n  https://img.example.com/b.jpg  \n".into();
        let submission = validate(&input, &types, &amenities).unwrap();
        assert_eq!(
            submission.image_urls,
            vec!["https://img.example.com/a.jpg", "https://img.example.com/b.jpg"]
        );

        input.image_urls = "ftp://img.example.com/a.jpg".into();
        assert!(validate(&input, &types, &amenities).is_err());
    }

    #[test]
    fn phone_charset_is_checked() {
        let (types, amenities) = lookups();
        let mut input = filled();
        input.phone_number = "call me maybe".into();
        assert!(validate(&input, &types, &amenities).is_err());
        input.phone_number = "(555) 010-0199".into();
        assert!(validate(&input, &types, &amenities).is_ok());
    }
}
