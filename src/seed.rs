//! Database seeding for fresh installs. `run` always fills the lookup
//! tables; with `demo` it also creates a handful of members and listings
//! so the site is browsable right away. Safe to run repeatedly.

use rand::seq::IndexedRandom;
use rand::Rng;
use sqlx::SqlitePool;

use crate::models::{Gender, ProfileDraft, RoomDraft};
use crate::{db, AppResult};

const ROOM_TYPES: [&str; 5] = [
    "Private Room",
    "Shared Room",
    "Master Bedroom",
    "Studio Apartment",
    "Entire Apartment",
];

const AMENITIES: [&str; 16] = [
    "WiFi",
    "Air Conditioning",
    "Heating",
    "Parking",
    "Laundry",
    "Kitchen Access",
    "Private Bathroom",
    "Shared Bathroom",
    "Furnished",
    "Unfurnished",
    "Pet Friendly",
    "No Smoking",
    "Gym Access",
    "Pool Access",
    "Balcony",
    "Garden Access",
];

struct DemoMember {
    subject: &'static str,
    email: &'static str,
    name: &'static str,
    age: i64,
    gender: Gender,
    city: &'static str,
    state: &'static str,
    bio: &'static str,
    is_looking_for_room: bool,
    only_eats_zabihah: bool,
    prayer_friendly: bool,
    guests_allowed: bool,
}

struct DemoRoom {
    owner_subject: &'static str,
    title: &'static str,
    description: &'static str,
    city: &'static str,
    price: i64,
    available_from: &'static str,
    phone_number: &'static str,
    contact_email: &'static str,
    only_eats_zabihah: bool,
    prayer_friendly: bool,
    guests_allowed: bool,
}

const DEMO_MEMBERS: [DemoMember; 5] = [
    DemoMember {
        subject: "seed-ahmed-hassan",
        email: "ahmed@example.com",
        name: "Ahmed Hassan",
        age: 25,
        gender: Gender::Male,
        city: "New York",
        state: "NY",
        bio: "Graduate student looking for a quiet place to study. I pray 5 times a day and prefer halal food.",
        is_looking_for_room: true,
        only_eats_zabihah: true,
        prayer_friendly: true,
        guests_allowed: false,
    },
    DemoMember {
        subject: "seed-fatima-ali",
        email: "fatima@example.com",
        name: "Fatima Ali",
        age: 23,
        gender: Gender::Female,
        city: "Los Angeles",
        state: "CA",
        bio: "Medical student seeking a peaceful environment. I value cleanliness and Islamic values.",
        is_looking_for_room: true,
        only_eats_zabihah: true,
        prayer_friendly: true,
        guests_allowed: true,
    },
    DemoMember {
        subject: "seed-omar-ibrahim",
        email: "omar@example.com",
        name: "Omar Ibrahim",
        age: 28,
        gender: Gender::Male,
        city: "Chicago",
        state: "IL",
        bio: "Software engineer with a room to rent. Looking for respectful Muslim roommate.",
        is_looking_for_room: false,
        only_eats_zabihah: true,
        prayer_friendly: true,
        guests_allowed: true,
    },
    DemoMember {
        subject: "seed-aisha-mohammed",
        email: "aisha@example.com",
        name: "Aisha Mohammed",
        age: 26,
        gender: Gender::Female,
        city: "Houston",
        state: "TX",
        bio: "Teacher looking for a sister to share apartment. I love cooking and reading Quran.",
        is_looking_for_room: false,
        only_eats_zabihah: true,
        prayer_friendly: true,
        guests_allowed: false,
    },
    DemoMember {
        subject: "seed-yusuf-ahmed",
        email: "yusuf@example.com",
        name: "Yusuf Ahmed",
        age: 24,
        gender: Gender::Male,
        city: "Phoenix",
        state: "AZ",
        bio: "Engineering student at ASU. Looking for affordable housing near campus.",
        is_looking_for_room: true,
        only_eats_zabihah: false,
        prayer_friendly: true,
        guests_allowed: true,
    },
];

const DEMO_ROOMS: [DemoRoom; 5] = [
    DemoRoom {
        owner_subject: "seed-omar-ibrahim",
        title: "Spacious Private Room in Manhattan",
        description: "Beautiful private room in a 3-bedroom apartment in Manhattan. Close to subway stations and Islamic centers. The apartment has a fully equipped kitchen where halal cooking is welcome. Looking for a respectful Muslim roommate who values cleanliness and Islamic principles.",
        city: "New York",
        price: 1200,
        available_from: "2024-01-15",
        phone_number: "+1-555-0101",
        contact_email: "omar@example.com",
        only_eats_zabihah: true,
        prayer_friendly: true,
        guests_allowed: true,
    },
    DemoRoom {
        owner_subject: "seed-fatima-ali",
        title: "Affordable Room Near UCLA",
        description: "Cozy room available near UCLA campus. Perfect for students. The house has a designated prayer area and halal-only kitchen. All utilities included in rent. Walking distance to masjid and halal restaurants. Ideal for serious students.",
        city: "Los Angeles",
        price: 800,
        available_from: "2024-02-01",
        phone_number: "+1-555-0102",
        contact_email: "fatima@example.com",
        only_eats_zabihah: true,
        prayer_friendly: true,
        guests_allowed: false,
    },
    DemoRoom {
        owner_subject: "seed-omar-ibrahim",
        title: "Master Bedroom in Chicago Townhouse",
        description: "Large master bedroom with private bathroom in a beautiful townhouse. The house has a spacious living area perfect for family gatherings. Halal kitchen and prayer-friendly environment. Looking for a mature Muslim professional or family.",
        city: "Chicago",
        price: 950,
        available_from: "2024-01-01",
        phone_number: "+1-555-0103",
        contact_email: "omar@example.com",
        only_eats_zabihah: true,
        prayer_friendly: true,
        guests_allowed: true,
    },
    DemoRoom {
        owner_subject: "seed-aisha-mohammed",
        title: "Room in Family-Friendly House",
        description: "Comfortable room in a family-oriented house in Houston. We maintain Islamic values and have regular Quran study sessions. The kitchen is halal-only and we have a small prayer room. Perfect for sisters looking for a supportive Islamic environment.",
        city: "Houston",
        price: 650,
        available_from: "2024-03-01",
        phone_number: "+1-555-0104",
        contact_email: "aisha@example.com",
        only_eats_zabihah: true,
        prayer_friendly: true,
        guests_allowed: false,
    },
    DemoRoom {
        owner_subject: "seed-yusuf-ahmed",
        title: "Student Housing Near ASU",
        description: "Budget-friendly room perfect for ASU students. The house is close to campus and has good study areas. We respect prayer times and maintain a quiet environment during study hours. Halal cooking is welcome in the shared kitchen.",
        city: "Phoenix",
        price: 575,
        available_from: "2024-02-15",
        phone_number: "+1-555-0105",
        contact_email: "yusuf@example.com",
        only_eats_zabihah: false,
        prayer_friendly: true,
        guests_allowed: true,
    },
];

pub async fn run(pool: &SqlitePool, demo: bool) -> AppResult<()> {
    lookups(pool).await?;
    if demo {
        demo_data(pool).await?;
    }
    Ok(())
}

async fn lookups(pool: &SqlitePool) -> AppResult<()> {
    for name in ROOM_TYPES {
        let description = format!("A {} for rent", name.to_lowercase());
        db::get_or_create_room_type(pool, name, &description).await?;
    }
    for name in AMENITIES {
        let description = format!("{name} available");
        db::get_or_create_amenity(pool, name, &description).await?;
    }
    tracing::info!(
        room_types = ROOM_TYPES.len(),
        amenities = AMENITIES.len(),
        "lookup tables seeded"
    );
    Ok(())
}

async fn demo_data(pool: &SqlitePool) -> AppResult<()> {
    for member in &DEMO_MEMBERS {
        let user_id = db::upsert_user(pool, "seed", member.subject, member.email, member.name).await?;
        if db::profile_of(pool, &user_id).await?.is_some() {
            continue;
        }
        let draft = ProfileDraft {
            name: member.name.to_owned(),
            age: member.age,
            gender: member.gender,
            city: member.city.to_owned(),
            state: member.state.to_owned(),
            neighborhood: None,
            bio: member.bio.to_owned(),
            photo_url: None,
            is_looking_for_room: member.is_looking_for_room,
            only_eats_zabihah: member.only_eats_zabihah,
            prayer_friendly: member.prayer_friendly,
            guests_allowed: member.guests_allowed,
            contact_email: member.email.to_owned(),
        };
        db::insert_profile(pool, &user_id, &draft).await?;
        tracing::info!(name = member.name, "demo profile created");
    }

    let amenity_ids: Vec<String> = {
        let mut ids = Vec::new();
        for name in AMENITIES {
            let description = format!("{name} available");
            ids.push(db::get_or_create_amenity(pool, name, &description).await?);
        }
        ids
    };

    for room in &DEMO_ROOMS {
        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM rooms WHERE title = ?")
            .bind(room.title)
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            continue;
        }

        let Some(member) = DEMO_MEMBERS.iter().find(|m| m.subject == room.owner_subject) else {
            continue;
        };
        let user_id = db::upsert_user(pool, "seed", member.subject, member.email, member.name).await?;
        let Some(owner) = db::profile_of(pool, &user_id).await? else {
            continue;
        };

        let type_name = if room.title.contains("Master") {
            "Master Bedroom"
        } else {
            "Private Room"
        };
        let type_description = format!("A {} for rent", type_name.to_lowercase());
        let room_type_id = db::get_or_create_room_type(pool, type_name, &type_description).await?;

        let draft = RoomDraft {
            title: room.title.to_owned(),
            description: room.description.to_owned(),
            room_type_id: Some(room_type_id),
            city: room.city.to_owned(),
            price: room.price,
            available_from: Some(room.available_from.to_owned()),
            phone_number: Some(room.phone_number.to_owned()),
            contact_email: Some(room.contact_email.to_owned()),
            only_eats_zabihah: room.only_eats_zabihah,
            prayer_friendly: room.prayer_friendly,
            guests_allowed: room.guests_allowed,
        };
        let room_id = db::insert_room(pool, &owner.id, &draft).await?;

        let picks: Vec<String> = {
            let mut rng = rand::rng();
            let count = rng.random_range(3..=6);
            amenity_ids
                .choose_multiple(&mut rng, count)
                .cloned()
                .collect()
        };
        db::set_room_amenities(pool, &room_id, &picks).await?;
        tracing::info!(title = room.title, "demo room created");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil::test_pool;

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate() {
        let pool = test_pool().await;
        run(&pool, true).await.unwrap();
        run(&pool, true).await.unwrap();

        let types: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_types")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(types, 5);

        let amenities: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM amenities")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(amenities, 16);

        let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(profiles, 5);

        let rooms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rooms, 5);
    }

    #[tokio::test]
    async fn demo_rooms_carry_amenities_and_types() {
        let pool = test_pool().await;
        run(&pool, true).await.unwrap();

        let untyped: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE room_type_id IS NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(untyped, 0);

        let linked: Vec<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM room_amenities GROUP BY room_id",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(linked.len(), 5);
        for count in linked {
            assert!((3..=6).contains(&count));
        }
    }

    #[tokio::test]
    async fn lookups_alone_leave_members_out() {
        let pool = test_pool().await;
        run(&pool, false).await.unwrap();

        let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(profiles, 0);

        let types: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_types")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(types, 5);
    }
}
