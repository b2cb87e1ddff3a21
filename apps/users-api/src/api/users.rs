//! Users API routes
//!
//! This module wires up the users domain to HTTP routes.

use axum::Router;
use domain_users::{MongoUserRepository, UserResult, UserService, handlers};
use mongodb::Database;

use crate::state::AppState;

/// Create users router
pub fn router(state: &AppState) -> Router {
    // Create the MongoDB repository
    let repository = MongoUserRepository::new(state.db.clone());

    // Create the service
    let service = UserService::new(repository);

    // Return the domain's router
    handlers::router(service)
}

/// Ensure the users collection indexes exist
pub async fn init_indexes(db: &Database) -> UserResult<()> {
    MongoUserRepository::new(db.clone()).init_indexes().await
}
