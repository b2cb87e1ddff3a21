use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, PageWindow, UpdateUser, User, UserPatch, UserResponse};
use crate::repository::UserRepository;

/// Service layer for User business logic
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

/// Update semantics: an absent or empty string leaves the stored field
/// untouched, each field gated only on its own presence.
fn provided(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new user with password hashing.
    ///
    /// Names are stored lowercased; new users start active.
    pub async fn create_user(&self, input: CreateUser) -> UserResult<UserResponse> {
        let password = self.hash_password(&input.password)?;

        let user = User {
            id: Uuid::now_v7(),
            first_name: input.first_name.to_lowercase(),
            last_name: input.last_name.to_lowercase(),
            username: input.username,
            email: input.email,
            address: input.address,
            number_document: input.number_document,
            type_document: input.type_document,
            role: input.role,
            phone_numbers: input.phone_numbers,
            password,
            status: true,
            created_at: Utc::now(),
            updated_at: None,
        };

        let created = self.repository.insert(user).await?;
        Ok(created.into())
    }

    /// Get a user by ID, regardless of status
    pub async fn get_user(&self, id: Uuid) -> UserResult<UserResponse> {
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        Ok(user.into())
    }

    /// List active users within a window, with the total active count.
    ///
    /// Count and page are independent reads, fetched concurrently.
    pub async fn list_users(&self, window: PageWindow) -> UserResult<(u64, Vec<UserResponse>)> {
        let (total, users) = tokio::try_join!(
            self.repository.count_active(),
            self.repository.list_active(window)
        )?;

        let responses: Vec<UserResponse> = users.into_iter().map(|u| u.into()).collect();
        Ok((total, responses))
    }

    /// Update a user.
    ///
    /// Empty strings count as "not provided". A new password is re-hashed;
    /// an update that changes nothing does not stamp `updatedAt`.
    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> UserResult<UserResponse> {
        let password = match provided(input.password) {
            Some(ref plain) => Some(self.hash_password(plain)?),
            None => None,
        };

        let mut patch = UserPatch {
            first_name: provided(input.first_name).map(|s| s.to_lowercase()),
            last_name: provided(input.last_name).map(|s| s.to_lowercase()),
            username: provided(input.username),
            email: provided(input.email),
            address: provided(input.address),
            number_document: provided(input.number_document),
            type_document: provided(input.type_document),
            role: provided(input.role),
            phone_numbers: input.phone_numbers,
            password,
            status: None,
            updated_at: None,
        };

        if !patch.is_noop() {
            patch.updated_at = Some(Utc::now());
        }

        let updated = self
            .repository
            .update_returning(id, patch)
            .await?
            .ok_or(UserError::NotFound(id))?;

        Ok(updated.into())
    }

    /// Soft-delete a user by flipping its status flag.
    ///
    /// Returns the deactivated user as stored.
    pub async fn delete_user(&self, id: Uuid) -> UserResult<UserResponse> {
        let patch = UserPatch {
            status: Some(false),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };

        let deleted = self
            .repository
            .update_returning(id, patch)
            .await?
            .ok_or(UserError::NotFound(id))?;

        Ok(deleted.into())
    }

    /// Search active users by name or username, case-insensitively.
    ///
    /// The term is treated literally; regex metacharacters are escaped.
    pub async fn search_users(&self, term: &str) -> UserResult<Vec<UserResponse>> {
        let pattern = regex::escape(term);
        let users = self.repository.search_active(&pattern).await?;

        Ok(users.into_iter().map(|u| u.into()).collect())
    }

    // Password helpers

    fn hash_password(&self, password: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    #[allow(dead_code)]
    fn verify_password(&self, password: &str, hash: &str) -> UserResult<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
