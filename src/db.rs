//! Query layer: free functions over the pool, one section per entity.
//! The filtered search views compose their WHERE clauses condition by
//! condition with `sqlx::QueryBuilder`.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{
    Amenity, Gender, Message, MessageView, Profile, ProfileDraft, Room, RoomDraft, RoomImage,
    RoomSummary, RoomType,
};
use crate::AppResult;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

// ============================================================================
// Users
// ============================================================================

/// Create or refresh the account row for an identity-provider subject and
/// return its id. First login is auto-signup.
pub async fn upsert_user(
    pool: &SqlitePool,
    provider: &str,
    subject: &str,
    email: &str,
    display_name: &str,
) -> AppResult<String> {
    sqlx::query(
        r#"
        INSERT INTO users (id, provider, subject, email, display_name)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(provider, subject) DO UPDATE SET
            email = excluded.email,
            display_name = excluded.display_name
        "#,
    )
    .bind(Uuid::now_v7().to_string())
    .bind(provider)
    .bind(subject)
    .bind(email)
    .bind(display_name)
    .execute(pool)
    .await?;

    let id: String = sqlx::query_scalar("SELECT id FROM users WHERE provider = ? AND subject = ?")
        .bind(provider)
        .bind(subject)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

// ============================================================================
// Profiles
// ============================================================================

pub async fn profile(pool: &SqlitePool, id: &str) -> AppResult<Option<Profile>> {
    Ok(sqlx::query_as("SELECT * FROM profiles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// The one profile owned by a user, if they created one yet.
pub async fn profile_of(pool: &SqlitePool, user_id: &str) -> AppResult<Option<Profile>> {
    Ok(sqlx::query_as("SELECT * FROM profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?)
}

pub async fn insert_profile(
    pool: &SqlitePool,
    user_id: &str,
    draft: &ProfileDraft,
) -> AppResult<String> {
    let id = Uuid::now_v7().to_string();
    sqlx::query(
        r#"
        INSERT INTO profiles (id, user_id, name, age, gender, city, state, neighborhood, bio,
                              photo_url, is_looking_for_room, only_eats_zabihah, prayer_friendly,
                              guests_allowed, contact_email)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&draft.name)
    .bind(draft.age)
    .bind(draft.gender)
    .bind(&draft.city)
    .bind(&draft.state)
    .bind(&draft.neighborhood)
    .bind(&draft.bio)
    .bind(&draft.photo_url)
    .bind(draft.is_looking_for_room)
    .bind(draft.only_eats_zabihah)
    .bind(draft.prayer_friendly)
    .bind(draft.guests_allowed)
    .bind(&draft.contact_email)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    draft: &ProfileDraft,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE profiles SET name = ?, age = ?, gender = ?, city = ?, state = ?, neighborhood = ?,
                            bio = ?, photo_url = ?, is_looking_for_room = ?, only_eats_zabihah = ?,
                            prayer_friendly = ?, guests_allowed = ?, contact_email = ?
        WHERE id = ?
        "#,
    )
    .bind(&draft.name)
    .bind(draft.age)
    .bind(draft.gender)
    .bind(&draft.city)
    .bind(&draft.state)
    .bind(&draft.neighborhood)
    .bind(&draft.bio)
    .bind(&draft.photo_url)
    .bind(draft.is_looking_for_room)
    .bind(draft.only_eats_zabihah)
    .bind(draft.prayer_friendly)
    .bind(draft.guests_allowed)
    .bind(&draft.contact_email)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Rooms, images, messages and contacts follow via FK cascade.
pub async fn delete_profile(pool: &SqlitePool, id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM profiles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn distinct_profile_cities(pool: &SqlitePool) -> AppResult<Vec<String>> {
    Ok(
        sqlx::query_scalar("SELECT DISTINCT city FROM profiles ORDER BY city")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn distinct_profile_states(pool: &SqlitePool) -> AppResult<Vec<String>> {
    Ok(sqlx::query_scalar(
        "SELECT DISTINCT state FROM profiles WHERE state != '' ORDER BY state",
    )
    .fetch_all(pool)
    .await?)
}

/// Everyone except the given profile, for the compose recipient dropdown.
pub async fn profile_choices(
    pool: &SqlitePool,
    exclude_id: &str,
) -> AppResult<Vec<(String, String)>> {
    Ok(
        sqlx::query_as("SELECT id, name FROM profiles WHERE id != ? ORDER BY name")
            .bind(exclude_id)
            .fetch_all(pool)
            .await?,
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileSort {
    #[default]
    Newest,
    Oldest,
    Name,
    AgeYoungest,
    AgeOldest,
}

impl ProfileSort {
    /// Unknown sort keys fall back to newest, like the original dropdown.
    pub fn parse(s: &str) -> ProfileSort {
        match s {
            "oldest" => ProfileSort::Oldest,
            "name" => ProfileSort::Name,
            "age_youngest" => ProfileSort::AgeYoungest,
            "age_oldest" => ProfileSort::AgeOldest,
            _ => ProfileSort::Newest,
        }
    }

    fn order_clause(self) -> &'static str {
        match self {
            ProfileSort::Newest => "created_at DESC, id DESC",
            ProfileSort::Oldest => "created_at ASC, id ASC",
            ProfileSort::Name => "name COLLATE NOCASE ASC",
            ProfileSort::AgeYoungest => "age ASC, id ASC",
            ProfileSort::AgeOldest => "age DESC, id ASC",
        }
    }
}

/// Conditions shared by the home and browse views. Empty/None fields mean
/// "no constraint"; boolean flags only ever narrow.
#[derive(Debug, Clone, Default)]
pub struct ProfileFilter {
    pub search: String,
    pub city: String,
    pub state: String,
    pub gender: Option<Gender>,
    pub age_min: Option<i64>,
    pub age_max: Option<i64>,
    pub looking_for_room: Option<bool>,
    pub only_eats_zabihah: bool,
    pub prayer_friendly: bool,
    pub guests_allowed: bool,
    pub exclude_profile: Option<String>,
    pub sort: ProfileSort,
}

fn push_profile_conditions(qb: &mut QueryBuilder<'_, Sqlite>, f: &ProfileFilter) {
    if let Some(id) = &f.exclude_profile {
        qb.push(" AND id != ").push_bind(id.clone());
    }
    if !f.search.is_empty() {
        let pat = format!("%{}%", f.search);
        qb.push(" AND (name LIKE ").push_bind(pat.clone());
        qb.push(" OR city LIKE ").push_bind(pat.clone());
        qb.push(" OR state LIKE ").push_bind(pat.clone());
        qb.push(" OR bio LIKE ").push_bind(pat.clone());
        qb.push(" OR neighborhood LIKE ").push_bind(pat);
        qb.push(")");
    }
    if !f.city.is_empty() {
        qb.push(" AND city LIKE ").push_bind(format!("%{}%", f.city));
    }
    if !f.state.is_empty() {
        qb.push(" AND state LIKE ").push_bind(format!("%{}%", f.state));
    }
    if let Some(gender) = f.gender {
        qb.push(" AND gender = ").push_bind(gender.as_str());
    }
    if let Some(min) = f.age_min {
        qb.push(" AND age >= ").push_bind(min);
    }
    if let Some(max) = f.age_max {
        qb.push(" AND age <= ").push_bind(max);
    }
    if let Some(looking) = f.looking_for_room {
        qb.push(" AND is_looking_for_room = ").push_bind(looking);
    }
    if f.only_eats_zabihah {
        qb.push(" AND only_eats_zabihah = 1");
    }
    if f.prayer_friendly {
        qb.push(" AND prayer_friendly = 1");
    }
    if f.guests_allowed {
        qb.push(" AND guests_allowed = 1");
    }
}

pub async fn search_profiles(
    pool: &SqlitePool,
    filter: &ProfileFilter,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<Profile>> {
    let mut qb = QueryBuilder::new("SELECT * FROM profiles WHERE 1=1");
    push_profile_conditions(&mut qb, filter);
    qb.push(" ORDER BY ").push(filter.sort.order_clause());
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);
    Ok(qb.build_query_as::<Profile>().fetch_all(pool).await?)
}

pub async fn count_profiles(pool: &SqlitePool, filter: &ProfileFilter) -> AppResult<i64> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM profiles WHERE 1=1");
    push_profile_conditions(&mut qb, filter);
    Ok(qb.build_query_scalar::<i64>().fetch_one(pool).await?)
}

/// Up to three suggestions for a profile page: same city first, then other
/// Charleston-metro profiles when the subject lives there.
pub async fn similar_profiles(pool: &SqlitePool, subject: &Profile) -> AppResult<Vec<Profile>> {
    let mut similar: Vec<Profile> = sqlx::query_as(
        "SELECT * FROM profiles WHERE id != ? AND city = ? COLLATE NOCASE LIMIT 3",
    )
    .bind(&subject.id)
    .bind(&subject.city)
    .fetch_all(pool)
    .await?;

    if similar.len() < 3 && subject.is_charleston_area() {
        let metro: Vec<Profile> = sqlx::query_as(
            r#"
            SELECT * FROM profiles
            WHERE id != ?
              AND (lower(city) LIKE '%charleston%'
                   OR lower(city) LIKE '%mount pleasant%'
                   OR lower(city) LIKE '%west ashley%')
            LIMIT 6
            "#,
        )
        .bind(&subject.id)
        .fetch_all(pool)
        .await?;

        for candidate in metro {
            if similar.len() >= 3 {
                break;
            }
            if !similar.iter().any(|p| p.id == candidate.id) {
                similar.push(candidate);
            }
        }
    }

    Ok(similar)
}

// ============================================================================
// Rooms
// ============================================================================

pub async fn room(pool: &SqlitePool, id: &str) -> AppResult<Option<Room>> {
    Ok(sqlx::query_as("SELECT * FROM rooms WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

const ROOM_SUMMARY_SELECT: &str = r#"
SELECT r.id, r.profile_id, r.title, r.description, r.city, r.price, r.available_from,
       r.only_eats_zabihah, r.prayer_friendly, r.guests_allowed,
       t.name AS room_type_name, p.name AS owner_name,
       (SELECT url FROM room_images i
         WHERE i.room_id = r.id
         ORDER BY i.is_primary DESC, i.created_at ASC, i.id ASC
         LIMIT 1) AS image_url
FROM rooms r
JOIN profiles p ON p.id = r.profile_id
LEFT JOIN room_types t ON t.id = r.room_type_id
WHERE 1=1
"#;

/// Room-search conditions. Amenities match rooms carrying ANY of the
/// selected ids.
#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub search: String,
    pub city: String,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub available_by: String,
    pub room_type: String,
    pub amenities: Vec<String>,
    pub only_eats_zabihah: bool,
    pub prayer_friendly: bool,
    pub guests_allowed: bool,
}

pub async fn search_rooms(pool: &SqlitePool, filter: &RoomFilter) -> AppResult<Vec<RoomSummary>> {
    let mut qb = QueryBuilder::new(ROOM_SUMMARY_SELECT);
    qb.push(" AND r.is_active = 1");
    if !filter.search.is_empty() {
        let pat = format!("%{}%", filter.search);
        qb.push(" AND (r.title LIKE ").push_bind(pat.clone());
        qb.push(" OR r.description LIKE ").push_bind(pat.clone());
        qb.push(" OR r.city LIKE ").push_bind(pat);
        qb.push(")");
    }
    if !filter.city.is_empty() {
        qb.push(" AND r.city LIKE ")
            .push_bind(format!("%{}%", filter.city));
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND r.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND r.price <= ").push_bind(max);
    }
    if !filter.available_by.is_empty() {
        qb.push(" AND r.available_from <= ")
            .push_bind(filter.available_by.clone());
    }
    if !filter.room_type.is_empty() {
        qb.push(" AND r.room_type_id = ")
            .push_bind(filter.room_type.clone());
    }
    if !filter.amenities.is_empty() {
        qb.push(" AND r.id IN (SELECT room_id FROM room_amenities WHERE amenity_id IN (");
        {
            let mut sep = qb.separated(", ");
            for id in &filter.amenities {
                sep.push_bind(id.clone());
            }
        }
        qb.push("))");
    }
    if filter.only_eats_zabihah {
        qb.push(" AND r.only_eats_zabihah = 1");
    }
    if filter.prayer_friendly {
        qb.push(" AND r.prayer_friendly = 1");
    }
    if filter.guests_allowed {
        qb.push(" AND r.guests_allowed = 1");
    }
    qb.push(" ORDER BY r.created_at DESC, r.id DESC");
    Ok(qb.build_query_as::<RoomSummary>().fetch_all(pool).await?)
}

/// Listings owned by a profile, newest first. A negative limit means all of
/// them (SQLite treats it as no limit).
pub async fn rooms_of_profile(
    pool: &SqlitePool,
    profile_id: &str,
    limit: i64,
) -> AppResult<Vec<RoomSummary>> {
    let sql = format!(
        "{ROOM_SUMMARY_SELECT} AND r.profile_id = ? ORDER BY r.created_at DESC, r.id DESC LIMIT ?"
    );
    Ok(sqlx::query_as(&sql)
        .bind(profile_id)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}

pub async fn insert_room(
    pool: &SqlitePool,
    profile_id: &str,
    draft: &RoomDraft,
) -> AppResult<String> {
    let id = Uuid::now_v7().to_string();
    sqlx::query(
        r#"
        INSERT INTO rooms (id, profile_id, title, description, room_type_id, city, price,
                           available_from, phone_number, contact_email, only_eats_zabihah,
                           prayer_friendly, guests_allowed, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)
        "#,
    )
    .bind(&id)
    .bind(profile_id)
    .bind(&draft.title)
    .bind(&draft.description)
    .bind(&draft.room_type_id)
    .bind(&draft.city)
    .bind(draft.price)
    .bind(&draft.available_from)
    .bind(&draft.phone_number)
    .bind(&draft.contact_email)
    .bind(draft.only_eats_zabihah)
    .bind(draft.prayer_friendly)
    .bind(draft.guests_allowed)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn update_room(pool: &SqlitePool, id: &str, draft: &RoomDraft) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE rooms SET title = ?, description = ?, room_type_id = ?, city = ?, price = ?,
                         available_from = ?, phone_number = ?, contact_email = ?,
                         only_eats_zabihah = ?, prayer_friendly = ?, guests_allowed = ?
        WHERE id = ?
        "#,
    )
    .bind(&draft.title)
    .bind(&draft.description)
    .bind(&draft.room_type_id)
    .bind(&draft.city)
    .bind(draft.price)
    .bind(&draft.available_from)
    .bind(&draft.phone_number)
    .bind(&draft.contact_email)
    .bind(draft.only_eats_zabihah)
    .bind(draft.prayer_friendly)
    .bind(draft.guests_allowed)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Images, amenity links and board messages follow via FK cascade.
pub async fn delete_room(pool: &SqlitePool, id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn distinct_room_cities(pool: &SqlitePool) -> AppResult<Vec<String>> {
    Ok(sqlx::query_scalar(
        "SELECT DISTINCT city FROM rooms WHERE is_active = 1 ORDER BY city",
    )
    .fetch_all(pool)
    .await?)
}

// ============================================================================
// Room images & amenities
// ============================================================================

pub async fn room_images(pool: &SqlitePool, room_id: &str) -> AppResult<Vec<RoomImage>> {
    Ok(sqlx::query_as(
        r#"
        SELECT id, room_id, url, is_primary FROM room_images
        WHERE room_id = ?
        ORDER BY is_primary DESC, created_at ASC, id ASC
        "#,
    )
    .bind(room_id)
    .fetch_all(pool)
    .await?)
}

/// Replace a room's image set; the first URL becomes the primary image.
pub async fn replace_room_images(
    pool: &SqlitePool,
    room_id: &str,
    urls: &[String],
) -> AppResult<()> {
    sqlx::query("DELETE FROM room_images WHERE room_id = ?")
        .bind(room_id)
        .execute(pool)
        .await?;
    for (idx, url) in urls.iter().enumerate() {
        sqlx::query("INSERT INTO room_images (id, room_id, url, is_primary) VALUES (?, ?, ?, ?)")
            .bind(Uuid::now_v7().to_string())
            .bind(room_id)
            .bind(url)
            .bind(idx == 0)
            .execute(pool)
            .await?;
    }
    Ok(())
}

pub async fn room_amenity_ids(pool: &SqlitePool, room_id: &str) -> AppResult<Vec<String>> {
    Ok(
        sqlx::query_scalar("SELECT amenity_id FROM room_amenities WHERE room_id = ?")
            .bind(room_id)
            .fetch_all(pool)
            .await?,
    )
}

pub async fn room_amenity_names(pool: &SqlitePool, room_id: &str) -> AppResult<Vec<String>> {
    Ok(sqlx::query_scalar(
        r#"
        SELECT a.name FROM amenities a
        JOIN room_amenities ra ON ra.amenity_id = a.id
        WHERE ra.room_id = ?
        ORDER BY a.name
        "#,
    )
    .bind(room_id)
    .fetch_all(pool)
    .await?)
}

pub async fn set_room_amenities(
    pool: &SqlitePool,
    room_id: &str,
    amenity_ids: &[String],
) -> AppResult<()> {
    sqlx::query("DELETE FROM room_amenities WHERE room_id = ?")
        .bind(room_id)
        .execute(pool)
        .await?;
    for amenity_id in amenity_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO room_amenities (room_id, amenity_id) VALUES (?, ?)",
        )
        .bind(room_id)
        .bind(amenity_id)
        .execute(pool)
        .await?;
    }
    Ok(())
}

// ============================================================================
// Lookup tables
// ============================================================================

pub async fn room_types(pool: &SqlitePool) -> AppResult<Vec<RoomType>> {
    Ok(sqlx::query_as("SELECT * FROM room_types ORDER BY name")
        .fetch_all(pool)
        .await?)
}

pub async fn room_type(pool: &SqlitePool, id: &str) -> AppResult<Option<RoomType>> {
    Ok(sqlx::query_as("SELECT * FROM room_types WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn amenities(pool: &SqlitePool) -> AppResult<Vec<Amenity>> {
    Ok(sqlx::query_as("SELECT * FROM amenities ORDER BY name")
        .fetch_all(pool)
        .await?)
}

pub async fn get_or_create_room_type(
    pool: &SqlitePool,
    name: &str,
    description: &str,
) -> AppResult<String> {
    sqlx::query(
        "INSERT INTO room_types (id, name, description) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(name)
    .bind(description)
    .execute(pool)
    .await?;
    Ok(sqlx::query_scalar("SELECT id FROM room_types WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await?)
}

pub async fn get_or_create_amenity(
    pool: &SqlitePool,
    name: &str,
    description: &str,
) -> AppResult<String> {
    sqlx::query(
        "INSERT INTO amenities (id, name, description) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(name)
    .bind(description)
    .execute(pool)
    .await?;
    Ok(sqlx::query_scalar("SELECT id FROM amenities WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await?)
}

// ============================================================================
// Messages
// ============================================================================

pub async fn insert_message(
    pool: &SqlitePool,
    sender_id: &str,
    recipient_id: &str,
    room_id: Option<&str>,
    subject: Option<&str>,
    content: &str,
) -> AppResult<String> {
    let id = Uuid::now_v7().to_string();
    sqlx::query(
        r#"
        INSERT INTO messages (id, sender_id, recipient_id, room_id, subject, content)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(sender_id)
    .bind(recipient_id)
    .bind(room_id)
    .bind(subject)
    .bind(content)
    .execute(pool)
    .await?;
    Ok(id)
}

const MESSAGE_VIEW_SELECT: &str = r#"
SELECT m.id, m.sender_id, m.recipient_id, m.subject, m.content, m.is_read, m.created_at,
       s.name AS sender_name, r.name AS recipient_name, rm.title AS room_title
FROM messages m
JOIN profiles s ON s.id = m.sender_id
JOIN profiles r ON r.id = m.recipient_id
LEFT JOIN rooms rm ON rm.id = m.room_id
"#;

pub async fn received_messages(
    pool: &SqlitePool,
    profile_id: &str,
) -> AppResult<Vec<MessageView>> {
    let sql = format!(
        "{MESSAGE_VIEW_SELECT} WHERE m.recipient_id = ? ORDER BY m.created_at DESC, m.id DESC"
    );
    Ok(sqlx::query_as(&sql).bind(profile_id).fetch_all(pool).await?)
}

pub async fn sent_messages(pool: &SqlitePool, profile_id: &str) -> AppResult<Vec<MessageView>> {
    let sql = format!(
        "{MESSAGE_VIEW_SELECT} WHERE m.sender_id = ? ORDER BY m.created_at DESC, m.id DESC"
    );
    Ok(sqlx::query_as(&sql).bind(profile_id).fetch_all(pool).await?)
}

/// Board messages read oldest first.
pub async fn room_messages(pool: &SqlitePool, room_id: &str) -> AppResult<Vec<MessageView>> {
    let sql = format!(
        "{MESSAGE_VIEW_SELECT} WHERE m.room_id = ? ORDER BY m.created_at ASC, m.id ASC"
    );
    Ok(sqlx::query_as(&sql).bind(room_id).fetch_all(pool).await?)
}

pub async fn message_in_room(
    pool: &SqlitePool,
    room_id: &str,
    message_id: &str,
) -> AppResult<Option<Message>> {
    Ok(
        sqlx::query_as("SELECT * FROM messages WHERE id = ? AND room_id = ?")
            .bind(message_id)
            .bind(room_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn update_message_content(
    pool: &SqlitePool,
    message_id: &str,
    content: &str,
) -> AppResult<()> {
    sqlx::query("UPDATE messages SET content = ? WHERE id = ?")
        .bind(content)
        .bind(message_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_message(pool: &SqlitePool, message_id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(message_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn unread_count(pool: &SqlitePool, profile_id: &str) -> AppResult<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM messages WHERE recipient_id = ? AND is_read = 0",
    )
    .bind(profile_id)
    .fetch_one(pool)
    .await?)
}

/// Returns how many messages were flipped.
pub async fn mark_all_read(pool: &SqlitePool, profile_id: &str) -> AppResult<u64> {
    let result = sqlx::query("UPDATE messages SET is_read = 1 WHERE recipient_id = ? AND is_read = 0")
        .bind(profile_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// ============================================================================
// Contacts
// ============================================================================

pub async fn insert_contact(
    pool: &SqlitePool,
    profile_id: &str,
    name: &str,
    email: &str,
    message: &str,
) -> AppResult<String> {
    let id = Uuid::now_v7().to_string();
    sqlx::query(
        "INSERT INTO contacts (id, profile_id, name, email, message) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(profile_id)
    .bind(name)
    .bind(email)
    .bind(message)
    .execute(pool)
    .await?;
    Ok(id)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    use crate::models::{Gender, ProfileDraft, RoomDraft};

    /// In-memory database. One connection, so every query sees the same db.
    pub async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        super::MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    pub fn draft_profile(name: &str, city: &str, gender: Gender) -> ProfileDraft {
        ProfileDraft {
            name: name.to_owned(),
            age: 25,
            gender,
            city: city.to_owned(),
            state: "NY".to_owned(),
            neighborhood: None,
            bio: format!("{name} bio"),
            photo_url: None,
            is_looking_for_room: true,
            only_eats_zabihah: false,
            prayer_friendly: false,
            guests_allowed: false,
            contact_email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    pub fn draft_room(title: &str, city: &str, price: i64) -> RoomDraft {
        RoomDraft {
            title: title.to_owned(),
            description: "A".repeat(60),
            room_type_id: None,
            city: city.to_owned(),
            price,
            available_from: None,
            phone_number: None,
            contact_email: None,
            only_eats_zabihah: false,
            prayer_friendly: false,
            guests_allowed: false,
        }
    }

    pub async fn seed_account(pool: &SqlitePool, tag: &str) -> String {
        super::upsert_user(pool, "google", tag, &format!("{tag}@example.com"), tag)
            .await
            .unwrap()
    }

    pub async fn seed_profile(
        pool: &SqlitePool,
        tag: &str,
        city: &str,
        gender: Gender,
    ) -> String {
        let user_id = seed_account(pool, tag).await;
        super::insert_profile(pool, &user_id, &draft_profile(tag, city, gender))
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;

    #[tokio::test]
    async fn upsert_user_keeps_one_row_per_subject() {
        let pool = test_pool().await;
        let first = upsert_user(&pool, "google", "sub-1", "a@x.com", "A").await.unwrap();
        let second = upsert_user(&pool, "google", "sub-1", "b@x.com", "B").await.unwrap();
        assert_eq!(first, second);

        let email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = ?")
            .bind(&first)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(email, "b@x.com");
    }

    #[tokio::test]
    async fn second_profile_for_same_user_is_rejected_by_schema() {
        let pool = test_pool().await;
        let user_id = seed_account(&pool, "ahmed").await;
        insert_profile(&pool, &user_id, &draft_profile("Ahmed", "NYC", Gender::Male))
            .await
            .unwrap();
        let dup = insert_profile(&pool, &user_id, &draft_profile("Ahmed", "NYC", Gender::Male)).await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn profile_filters_compose() {
        let pool = test_pool().await;
        let ahmed = seed_profile(&pool, "Ahmed", "New York", Gender::Male).await;
        seed_profile(&pool, "Fatima", "Los Angeles", Gender::Female).await;
        seed_profile(&pool, "Omar", "New York", Gender::Male).await;

        let filter = ProfileFilter {
            city: "new york".into(),
            gender: Some(Gender::Male),
            ..Default::default()
        };
        let found = search_profiles(&pool, &filter, 50, 0).await.unwrap();
        assert_eq!(found.len(), 2);

        let filter = ProfileFilter {
            city: "new york".into(),
            gender: Some(Gender::Male),
            exclude_profile: Some(ahmed.clone()),
            ..Default::default()
        };
        let found = search_profiles(&pool, &filter, 50, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Omar");
        assert_eq!(count_profiles(&pool, &filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn profile_search_hits_bio_and_state() {
        let pool = test_pool().await;
        seed_profile(&pool, "Ahmed", "New York", Gender::Male).await;
        seed_profile(&pool, "Omar", "Chicago", Gender::Male).await;

        let filter = ProfileFilter {
            search: "ahmed bio".into(),
            ..Default::default()
        };
        let found = search_profiles(&pool, &filter, 50, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Ahmed");

        let by_state = ProfileFilter {
            search: "NY".into(),
            ..Default::default()
        };
        assert_eq!(count_profiles(&pool, &by_state).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn age_bounds_and_looking_flag_narrow() {
        let pool = test_pool().await;
        let user = seed_account(&pool, "elder").await;
        let mut draft = draft_profile("Elder", "NYC", Gender::Male);
        draft.age = 40;
        draft.is_looking_for_room = false;
        insert_profile(&pool, &user, &draft).await.unwrap();
        seed_profile(&pool, "Young", "NYC", Gender::Male).await;

        let older = ProfileFilter {
            age_min: Some(30),
            ..Default::default()
        };
        assert_eq!(count_profiles(&pool, &older).await.unwrap(), 1);

        let seekers = ProfileFilter {
            looking_for_room: Some(true),
            ..Default::default()
        };
        let found = search_profiles(&pool, &seekers, 50, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Young");
    }

    #[tokio::test]
    async fn sorts_and_pagination() {
        let pool = test_pool().await;
        for (idx, name) in ["Carol", "Alice", "Bob"].iter().enumerate() {
            let user = seed_account(&pool, name).await;
            let mut draft = draft_profile(name, "NYC", Gender::Female);
            draft.age = 20 + idx as i64;
            insert_profile(&pool, &user, &draft).await.unwrap();
        }

        let by_name = ProfileFilter {
            sort: ProfileSort::Name,
            ..Default::default()
        };
        let found = search_profiles(&pool, &by_name, 50, 0).await.unwrap();
        let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);

        let youngest = ProfileFilter {
            sort: ProfileSort::AgeYoungest,
            ..Default::default()
        };
        let page = search_profiles(&pool, &youngest, 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "Carol");
        let rest = search_profiles(&pool, &youngest, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);

        assert_eq!(ProfileSort::parse("garbage"), ProfileSort::Newest);
    }

    #[tokio::test]
    async fn similar_profiles_prefer_city_then_metro() {
        let pool = test_pool().await;
        let subject_id = seed_profile(&pool, "Subject", "Charleston", Gender::Male).await;
        seed_profile(&pool, "Neighbor", "Charleston", Gender::Male).await;
        seed_profile(&pool, "Metro", "Mount Pleasant", Gender::Male).await;
        seed_profile(&pool, "Far", "Phoenix", Gender::Male).await;

        let subject = profile(&pool, &subject_id).await.unwrap().unwrap();
        let similar = similar_profiles(&pool, &subject).await.unwrap();
        let names: Vec<&str> = similar.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Neighbor", "Metro"]);
        assert!(similar.iter().all(|p| p.id != subject.id));
    }

    #[tokio::test]
    async fn room_search_filters_and_amenity_dedupe() {
        let pool = test_pool().await;
        let owner = seed_profile(&pool, "Owner", "Chicago", Gender::Male).await;

        let wifi = get_or_create_amenity(&pool, "WiFi", "").await.unwrap();
        let parking = get_or_create_amenity(&pool, "Parking", "").await.unwrap();
        let private = get_or_create_room_type(&pool, "Private Room", "").await.unwrap();

        let mut draft = draft_room("Downtown room", "Chicago", 800);
        draft.room_type_id = Some(private.clone());
        draft.available_from = Some("2024-01-15".into());
        let both = insert_room(&pool, &owner, &draft).await.unwrap();
        set_room_amenities(&pool, &both, &[wifi.clone(), parking.clone()])
            .await
            .unwrap();

        let pricey = insert_room(&pool, &owner, &draft_room("Loft", "Chicago", 1600)).await.unwrap();
        set_room_amenities(&pool, &pricey, &[wifi.clone()]).await.unwrap();

        // Matching two amenities still returns the room once.
        let filter = RoomFilter {
            amenities: vec![wifi.clone(), parking.clone()],
            ..Default::default()
        };
        let found = search_rooms(&pool, &filter).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found.iter().filter(|r| r.id == both).count(), 1);

        let under_1000 = RoomFilter {
            max_price: Some(1000),
            ..Default::default()
        };
        let found = search_rooms(&pool, &under_1000).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Downtown room");
        assert_eq!(found[0].room_type_name.as_deref(), Some("Private Room"));
        assert_eq!(found[0].owner_name, "Owner");

        let available = RoomFilter {
            available_by: "2024-02-01".into(),
            ..Default::default()
        };
        // Only the room with a known availability date qualifies.
        assert_eq!(search_rooms(&pool, &available).await.unwrap().len(), 1);

        let typed = RoomFilter {
            room_type: private,
            ..Default::default()
        };
        assert_eq!(search_rooms(&pool, &typed).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn inactive_rooms_are_hidden() {
        let pool = test_pool().await;
        let owner = seed_profile(&pool, "Owner", "Chicago", Gender::Male).await;
        let room_id = insert_room(&pool, &owner, &draft_room("Hidden", "Chicago", 500))
            .await
            .unwrap();
        sqlx::query("UPDATE rooms SET is_active = 0 WHERE id = ?")
            .bind(&room_id)
            .execute(&pool)
            .await
            .unwrap();

        let found = search_rooms(&pool, &RoomFilter::default()).await.unwrap();
        assert!(found.is_empty());
        // Still listed on the owner's pages.
        assert_eq!(rooms_of_profile(&pool, &owner, -1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn primary_image_wins_the_card() {
        let pool = test_pool().await;
        let owner = seed_profile(&pool, "Owner", "Chicago", Gender::Male).await;
        let room_id = insert_room(&pool, &owner, &draft_room("Pics", "Chicago", 700))
            .await
            .unwrap();
        replace_room_images(
            &pool,
            &room_id,
            &["https://img/1.jpg".into(), "https://img/2.jpg".into()],
        )
        .await
        .unwrap();

        let found = search_rooms(&pool, &RoomFilter::default()).await.unwrap();
        assert_eq!(found[0].image_url.as_deref(), Some("https://img/1.jpg"));

        let images = room_images(&pool, &room_id).await.unwrap();
        assert_eq!(images.len(), 2);
        assert!(images[0].is_primary);
        assert!(!images[1].is_primary);
    }

    #[tokio::test]
    async fn deleting_a_room_cascades_its_attachments() {
        let pool = test_pool().await;
        let owner = seed_profile(&pool, "Owner", "Chicago", Gender::Male).await;
        let guest = seed_profile(&pool, "Guest", "Chicago", Gender::Male).await;
        let room_id = insert_room(&pool, &owner, &draft_room("Doomed", "Chicago", 700))
            .await
            .unwrap();
        let wifi = get_or_create_amenity(&pool, "WiFi", "").await.unwrap();
        set_room_amenities(&pool, &room_id, &[wifi]).await.unwrap();
        replace_room_images(&pool, &room_id, &["https://img/1.jpg".into()])
            .await
            .unwrap();
        insert_message(&pool, &guest, &owner, Some(&room_id), None, "still open?")
            .await
            .unwrap();

        delete_room(&pool, &room_id).await.unwrap();

        let images: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_images")
            .fetch_one(&pool)
            .await
            .unwrap();
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_amenities")
            .fetch_one(&pool)
            .await
            .unwrap();
        let board: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((images, links, board), (0, 0, 0));
    }

    #[tokio::test]
    async fn deleting_a_profile_cascades_rooms() {
        let pool = test_pool().await;
        let owner = seed_profile(&pool, "Owner", "Chicago", Gender::Male).await;
        insert_room(&pool, &owner, &draft_room("Mine", "Chicago", 700))
            .await
            .unwrap();

        delete_profile(&pool, &owner).await.unwrap();

        let rooms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rooms, 0);
    }

    #[tokio::test]
    async fn inbox_splits_and_marks_read() {
        let pool = test_pool().await;
        let ahmed = seed_profile(&pool, "Ahmed", "NYC", Gender::Male).await;
        let omar = seed_profile(&pool, "Omar", "Chicago", Gender::Male).await;

        insert_message(&pool, &omar, &ahmed, None, Some("salam"), "room still free?")
            .await
            .unwrap();
        insert_message(&pool, &ahmed, &omar, None, None, "yes, it is").await.unwrap();

        let received = received_messages(&pool, &ahmed).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].sender_name, "Omar");
        assert_eq!(received[0].subject.as_deref(), Some("salam"));

        let sent = sent_messages(&pool, &ahmed).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_name, "Omar");

        assert_eq!(unread_count(&pool, &ahmed).await.unwrap(), 1);
        assert_eq!(mark_all_read(&pool, &ahmed).await.unwrap(), 1);
        assert_eq!(unread_count(&pool, &ahmed).await.unwrap(), 0);
        // Second pass is a no-op.
        assert_eq!(mark_all_read(&pool, &ahmed).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn received_messages_come_newest_first() {
        let pool = test_pool().await;
        let ahmed = seed_profile(&pool, "Ahmed", "NYC", Gender::Male).await;
        let omar = seed_profile(&pool, "Omar", "Chicago", Gender::Male).await;

        insert_message(&pool, &omar, &ahmed, None, None, "first").await.unwrap();
        insert_message(&pool, &omar, &ahmed, None, None, "second").await.unwrap();

        let received = received_messages(&pool, &ahmed).await.unwrap();
        assert_eq!(received[0].content, "second");
        assert_eq!(received[1].content, "first");
    }

    #[tokio::test]
    async fn board_messages_read_oldest_first() {
        let pool = test_pool().await;
        let owner = seed_profile(&pool, "Owner", "Chicago", Gender::Male).await;
        let guest = seed_profile(&pool, "Guest", "NYC", Gender::Male).await;
        let room_id = insert_room(&pool, &owner, &draft_room("Board", "Chicago", 700))
            .await
            .unwrap();

        insert_message(&pool, &guest, &owner, Some(&room_id), None, "first").await.unwrap();
        let second = insert_message(&pool, &owner, &guest, Some(&room_id), None, "second")
            .await
            .unwrap();

        let board = room_messages(&pool, &room_id).await.unwrap();
        assert_eq!(board[0].content, "first");
        assert_eq!(board[1].content, "second");

        update_message_content(&pool, &second, "edited").await.unwrap();
        let found = message_in_room(&pool, &room_id, &second).await.unwrap().unwrap();
        assert_eq!(found.content, "edited");

        delete_message(&pool, &second).await.unwrap();
        assert_eq!(room_messages(&pool, &room_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lookup_seeding_is_idempotent() {
        let pool = test_pool().await;
        let a = get_or_create_room_type(&pool, "Private Room", "x").await.unwrap();
        let b = get_or_create_room_type(&pool, "Private Room", "y").await.unwrap();
        assert_eq!(a, b);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_types")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn room_type_lookup_finds_seeded_rows() {
        let pool = test_pool().await;
        let id = get_or_create_room_type(&pool, "Private Room", "x").await.unwrap();
        let found = room_type(&pool, &id).await.unwrap().unwrap();
        assert_eq!(found.name, "Private Room");
        assert!(room_type(&pool, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn contacts_record_guest_interest() {
        let pool = test_pool().await;
        let target = seed_profile(&pool, "Target", "NYC", Gender::Female).await;
        insert_contact(&pool, &target, "Visitor", "v@example.com", "interested in the room")
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE profile_id = ?")
            .bind(&target)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
