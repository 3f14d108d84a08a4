use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{ExperienceLevel, User, UserType};

/// Public-safe projection of a user record: what clients see and what the
/// session token snapshots. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub about: String,
    pub image: Option<String>,
    pub experience_level: ExperienceLevel,
    pub user_roles: Vec<String>,
    pub user_goals: Vec<String>,
    pub user_preferences: Vec<String>,
    pub user_type: UserType,
    pub is_verified: bool,
    pub is_onboarded: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserPayload {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            fullname: format!("{} {}", user.first_name, user.last_name),
            email: user.email.clone(),
            phone: user.phone.clone(),
            about: user.about.clone(),
            image: user.image_url.clone(),
            experience_level: user.experience_level,
            user_roles: user.user_role.clone(),
            user_goals: user.user_goal.clone(),
            user_preferences: user.user_preference.clone(),
            user_type: user.user_type,
            is_verified: user.is_verified,
            // Onboarded once all three tag lists have been filled in.
            is_onboarded: !user.user_role.is_empty()
                && !user.user_goal.is_empty()
                && !user.user_preference.is_empty(),
            created_at: user.created_at,
        }
    }
}

/// Response body for login-like endpoints: the projection plus its token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub user: UserPayload,
    pub token: String,
}

#[cfg(test)]
pub(crate) fn sample_user() -> User {
    User {
        id: Uuid::new_v4(),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        email: "jane@example.com".into(),
        password_hash: "$argon2id$fake".into(),
        phone: String::new(),
        about: String::new(),
        image_id: None,
        image_url: None,
        experience_level: ExperienceLevel::Regular,
        user_role: vec![],
        user_goal: vec![],
        user_preference: vec![],
        user_type: UserType::Beginner,
        is_verified: false,
        is_archived: false,
        created_at: OffsetDateTime::now_utc(),
        updated_at: OffsetDateTime::now_utc(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_never_contains_the_password_hash() {
        let payload = UserPayload::from_user(&sample_user());
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        assert!(json.contains("\"fullname\":\"Jane Doe\""));
    }

    #[test]
    fn onboarded_requires_all_three_tag_lists() {
        let mut user = sample_user();
        assert!(!UserPayload::from_user(&user).is_onboarded);

        user.user_role = vec!["designer".into()];
        user.user_goal = vec!["portfolio".into()];
        assert!(!UserPayload::from_user(&user).is_onboarded);

        user.user_preference = vec!["dark-mode".into()];
        assert!(UserPayload::from_user(&user).is_onboarded);
    }

    #[test]
    fn image_is_null_until_an_avatar_exists() {
        let mut user = sample_user();
        assert!(UserPayload::from_user(&user).image.is_none());

        user.image_url = Some("http://cdn.local/avatars/a.png".into());
        assert_eq!(
            UserPayload::from_user(&user).image.as_deref(),
            Some("http://cdn.local/avatars/a.png")
        );
    }
}
