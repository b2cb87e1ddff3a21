use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Page size used when `lot` is absent or unusable.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Upper bound on `lot` to keep a single page from scanning the collection.
pub const MAX_PAGE_SIZE: i64 = 100;

/// User entity - represents a user stored in MongoDB.
///
/// `password` holds the Argon2 hash, never the plaintext. It is persisted
/// but stripped from API responses via [`UserResponse`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<Vec<String>>,
    /// Argon2 password hash
    pub password: String,
    /// Active flag; `false` means soft-deleted
    pub status: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// DTO for creating a new user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub number_document: Option<String>,
    pub type_document: Option<String>,
    pub role: Option<String>,
    pub phone_numbers: Option<Vec<String>>,
}

/// DTO for updating an existing user.
///
/// Every field is optional; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 128))]
    pub password: Option<String>,
    #[validate(length(max = 100))]
    pub username: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub number_document: Option<String>,
    pub type_document: Option<String>,
    pub role: Option<String>,
    pub phone_numbers: Option<Vec<String>>,
}

/// API projection of [`User`] without the password hash
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<Vec<String>>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            email: user.email,
            address: user.address,
            number_document: user.number_document,
            type_document: user.type_document,
            role: user.role,
            phone_numbers: user.phone_numbers,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Field-level patch applied by the repository as a `$set` document.
///
/// Built by the service layer; only `Some` fields are written, so a patch
/// never clears a field it does not mention.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub number_document: Option<String>,
    pub type_document: Option<String>,
    pub role: Option<String>,
    pub phone_numbers: Option<Vec<String>>,
    /// Already-hashed replacement password
    pub password: Option<String>,
    pub status: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserPatch {
    /// True when the patch would not change any field.
    ///
    /// `updated_at` alone does not count: a no-op update should not
    /// touch the document.
    pub fn is_noop(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.number_document.is_none()
            && self.type_document.is_none()
            && self.role.is_none()
            && self.phone_numbers.is_none()
            && self.password.is_none()
            && self.status.is_none()
    }
}

/// Pagination query parameters (`?from=3&lot=20`).
///
/// Both values arrive as raw strings so that non-numeric input degrades
/// to the defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based position of the first user to return
    pub from: Option<String>,
    /// Number of users per page (capped at 100)
    pub lot: Option<String>,
}

/// Normalized skip/limit window derived from [`PageQuery`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: u64,
    pub limit: i64,
}

impl PageQuery {
    /// Normalize `from`/`lot` into a skip/limit window.
    ///
    /// `from` is 1-based; zero, negative, or non-numeric values mean
    /// "start at the beginning". `lot` falls back to
    /// [`DEFAULT_PAGE_SIZE`] and is capped at [`MAX_PAGE_SIZE`].
    pub fn window(&self) -> PageWindow {
        let skip = self
            .from
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map(|n| (n - 1) as u64)
            .unwrap_or(0);

        let limit = self
            .lot
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map(|n| n.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        PageWindow { skip, limit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(from: Option<&str>, lot: Option<&str>) -> PageQuery {
        PageQuery {
            from: from.map(String::from),
            lot: lot.map(String::from),
        }
    }

    #[test]
    fn test_window_defaults() {
        let w = query(None, None).window();
        assert_eq!(w, PageWindow { skip: 0, limit: DEFAULT_PAGE_SIZE });
    }

    #[test]
    fn test_window_from_is_one_based() {
        let w = query(Some("3"), Some("5")).window();
        assert_eq!(w, PageWindow { skip: 2, limit: 5 });
    }

    #[test]
    fn test_window_non_numeric_falls_back() {
        let w = query(Some("abc"), Some("xyz")).window();
        assert_eq!(w, PageWindow { skip: 0, limit: DEFAULT_PAGE_SIZE });
    }

    #[test]
    fn test_window_zero_and_negative_fall_back() {
        let w = query(Some("0"), Some("-4")).window();
        assert_eq!(w, PageWindow { skip: 0, limit: DEFAULT_PAGE_SIZE });

        let w = query(Some("-2"), Some("0")).window();
        assert_eq!(w, PageWindow { skip: 0, limit: DEFAULT_PAGE_SIZE });
    }

    #[test]
    fn test_window_lot_is_capped() {
        let w = query(None, Some("500")).window();
        assert_eq!(w.limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_patch_noop_ignores_updated_at() {
        let patch = UserPatch {
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        assert!(patch.is_noop());

        let patch = UserPatch {
            first_name: Some("ada".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_noop());
    }

    #[test]
    fn test_user_response_drops_password() {
        let user = User {
            id: Uuid::now_v7(),
            first_name: "ada".to_string(),
            last_name: "lovelace".to_string(),
            username: None,
            email: None,
            address: None,
            number_document: None,
            type_document: None,
            role: None,
            phone_numbers: None,
            password: "$argon2id$...".to_string(),
            status: true,
            created_at: Utc::now(),
            updated_at: None,
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["firstName"], "ada");
        assert_eq!(json["status"], true);
    }
}
