use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Privilege tier of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "experience_level", rename_all = "kebab-case")]
pub enum ExperienceLevel {
    SuperAdmin,
    Admin,
    Regular,
}

/// Self-reported skill tier, chosen during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
pub enum UserType {
    Beginner,
    Intermediate,
    Advanced,
}

impl UserType {
    pub const ALLOWED: &'static [&'static str] = &["beginner", "intermediate", "advanced"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "beginner" => Some(UserType::Beginner),
            "intermediate" => Some(UserType::Intermediate),
            "advanced" => Some(UserType::Advanced),
            _ => None,
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,                   // unique, stored lowercase
    pub password_hash: String,           // Argon2 hash, never exposed
    pub phone: String,
    pub about: String,
    pub image_id: Option<String>,        // object-store key of the avatar
    pub image_url: Option<String>,
    pub experience_level: ExperienceLevel,
    pub user_role: Vec<String>,
    pub user_goal: Vec<String>,
    pub user_preference: Vec<String>,
    pub user_type: UserType,
    pub is_verified: bool,
    pub is_archived: bool,               // soft delete; rows are never removed
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields required to insert a user; everything else takes its column default.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub image_id: Option<String>,
    pub image_url: Option<String>,
    pub experience_level: ExperienceLevel,
    pub is_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_level_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ExperienceLevel::SuperAdmin).unwrap(),
            "\"super-admin\""
        );
        assert_eq!(
            serde_json::to_string(&ExperienceLevel::Regular).unwrap(),
            "\"regular\""
        );
    }

    #[test]
    fn user_type_parse_matches_the_allowed_set() {
        for value in UserType::ALLOWED {
            assert!(UserType::parse(value).is_some());
        }
        assert_eq!(UserType::parse("expert"), None);
        assert_eq!(UserType::parse("Beginner"), None);
    }
}
