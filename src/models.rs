use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Cities counted as the Charleston metro area for the similar-profiles
/// fallback on profile pages.
pub const CHARLESTON_METRO: [&str; 3] = ["charleston", "mount pleasant", "west ashley"];

/// City choices offered on the room listing form.
pub const US_MAJOR_CITIES: [&str; 30] = [
    "Atlanta",
    "Austin",
    "Baltimore",
    "Boston",
    "Charleston",
    "Charlotte",
    "Chicago",
    "Columbus",
    "Dallas",
    "Denver",
    "Detroit",
    "Fort Worth",
    "Houston",
    "Indianapolis",
    "Jacksonville",
    "Los Angeles",
    "Miami",
    "Minneapolis",
    "Mount Pleasant",
    "Nashville",
    "New York",
    "Philadelphia",
    "Phoenix",
    "Portland",
    "San Antonio",
    "San Diego",
    "San Francisco",
    "San Jose",
    "Seattle",
    "Washington",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Lenient parse for filter params; empty or unknown values mean "any".
    pub fn parse(s: &str) -> Option<Gender> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    /// Capitalized form for page text.
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub provider: String,
    pub subject: String,
    pub email: String,
    pub display_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub age: i64,
    pub gender: Gender,
    pub city: String,
    pub state: String,
    pub neighborhood: Option<String>,
    pub bio: String,
    pub photo_url: Option<String>,
    pub is_looking_for_room: bool,
    pub only_eats_zabihah: bool,
    pub prayer_friendly: bool,
    pub guests_allowed: bool,
    pub contact_email: String,
    pub created_at: String,
}

impl Profile {
    pub fn is_charleston_area(&self) -> bool {
        let city = self.city.to_lowercase();
        CHARLESTON_METRO.iter().any(|metro| city.contains(metro))
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Room {
    pub id: String,
    pub profile_id: String,
    pub title: String,
    pub description: String,
    pub room_type_id: Option<String>,
    pub city: String,
    pub price: i64,
    pub available_from: Option<String>,
    pub phone_number: Option<String>,
    pub contact_email: Option<String>,
    pub only_eats_zabihah: bool,
    pub prayer_friendly: bool,
    pub guests_allowed: bool,
    pub is_active: bool,
    pub created_at: String,
}

/// Room joined with the bits every listing card needs.
#[derive(Debug, Clone, FromRow)]
pub struct RoomSummary {
    pub id: String,
    pub profile_id: String,
    pub title: String,
    pub description: String,
    pub city: String,
    pub price: i64,
    pub available_from: Option<String>,
    pub only_eats_zabihah: bool,
    pub prayer_friendly: bool,
    pub guests_allowed: bool,
    pub room_type_name: Option<String>,
    pub owner_name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RoomImage {
    pub id: String,
    pub room_id: String,
    pub url: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct RoomType {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Amenity {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub room_id: Option<String>,
    pub subject: Option<String>,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

/// Message joined with names for inbox and board rendering.
#[derive(Debug, Clone, FromRow)]
pub struct MessageView {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub subject: Option<String>,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
    pub sender_name: String,
    pub recipient_name: String,
    pub room_title: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Contact {
    pub id: String,
    pub profile_id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: String,
}

/// Validated profile fields ready to insert or update. Form handlers build
/// one of these only after every check passed.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub name: String,
    pub age: i64,
    pub gender: Gender,
    pub city: String,
    pub state: String,
    pub neighborhood: Option<String>,
    pub bio: String,
    pub photo_url: Option<String>,
    pub is_looking_for_room: bool,
    pub only_eats_zabihah: bool,
    pub prayer_friendly: bool,
    pub guests_allowed: bool,
    pub contact_email: String,
}

/// Validated room fields ready to insert or update.
#[derive(Debug, Clone)]
pub struct RoomDraft {
    pub title: String,
    pub description: String,
    pub room_type_id: Option<String>,
    pub city: String,
    pub price: i64,
    pub available_from: Option<String>,
    pub phone_number: Option<String>,
    pub contact_email: Option<String>,
    pub only_eats_zabihah: bool,
    pub prayer_friendly: bool,
    pub guests_allowed: bool,
}
