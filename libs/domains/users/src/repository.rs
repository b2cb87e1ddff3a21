use async_trait::async_trait;
use uuid::Uuid;

use crate::error::UserResult;
use crate::models::{PageWindow, User, UserPatch};

/// Repository trait for User persistence
///
/// This trait defines the data access interface for users.
/// Implementations can use different storage backends (MongoDB, etc.)
///
/// "Active" means `status == true`; soft-deleted users are excluded from
/// listings, counts, and search, but remain reachable by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user
    async fn insert(&self, user: User) -> UserResult<User>;

    /// Fetch a user by ID, regardless of status
    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// List active users within a skip/limit window
    async fn list_active(&self, window: PageWindow) -> UserResult<Vec<User>>;

    /// Count all active users
    async fn count_active(&self) -> UserResult<u64>;

    /// Apply a patch and return the updated document, or `None` if absent
    async fn update_returning(&self, id: Uuid, patch: UserPatch) -> UserResult<Option<User>>;

    /// Find active users whose name or username matches the regex pattern
    async fn search_active(&self, pattern: &str) -> UserResult<Vec<User>>;
}
