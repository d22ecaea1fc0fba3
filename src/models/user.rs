use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the API returns for a user; never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$not-a-real-hash".into(),
            name: "Ana".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let profile: UserProfile = user.clone().into();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["email"], "ana@example.com");
        assert!(json.get("passwordHash").is_none());

        // Serializing the row directly must also skip the hash.
        let row_json = serde_json::to_value(&user).unwrap();
        assert!(row_json.get("passwordHash").is_none());
    }

    #[test]
    fn test_register_request_validation() {
        let bad_email = RegisterRequest {
            name: "Ana".into(),
            email: "not-an-email".into(),
            password: "longenough".into(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "short".into(),
        };
        assert!(short_password.validate().is_err());

        let ok = RegisterRequest {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "longenough".into(),
        };
        assert!(ok.validate().is_ok());
    }
}
