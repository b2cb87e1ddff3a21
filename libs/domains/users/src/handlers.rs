use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{UuidPath, ValidatedJson};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::error::UserResult;
use crate::models::{CreateUser, PageQuery, UpdateUser, UserResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

/// Field names matched by the search endpoint, echoed in its response
const SEARCH_FIELDS: [&str; 3] = ["firstName", "lastName", "username"];

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        get_user,
        update_user,
        delete_user,
        search_users,
    ),
    components(
        schemas(
            CreateUser,
            UpdateUser,
            UserResponse,
            UserEnvelope,
            DeletedUserEnvelope,
            ListUsersResponse,
            SearchUsersResponse
        )
    ),
    tags(
        (name = "Users", description = "User management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Single-user response envelope
#[derive(Serialize, ToSchema)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

/// Soft-delete response envelope
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedUserEnvelope {
    pub deleted_user: UserResponse,
}

/// Echo of the normalized pagination window (1-based `from`)
#[derive(Serialize, ToSchema)]
pub struct Pagination {
    pub from: u64,
    pub lot: i64,
}

/// Paginated listing of active users
#[derive(Serialize, ToSchema)]
pub struct ListUsersResponse {
    /// Total number of active users
    pub total: u64,
    /// Number of users in this page
    pub quantity: usize,
    pub pagination: Pagination,
    pub users: Vec<UserResponse>,
}

/// Search results over active users
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsersResponse {
    pub queried_fields: Vec<&'static str>,
    pub quantity: usize,
    pub results: Vec<UserResponse>,
}

/// Create the users router with all HTTP endpoints
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/search/{term}", get(search_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .with_state(shared_service)
}

/// List active users with pagination
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of active users", body = ListUsersResponse),
        (status = 500, description = "Internal server error")
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Query(query): Query<PageQuery>,
) -> UserResult<Json<ListUsersResponse>> {
    let window = query.window();
    let (total, users) = service.list_users(window).await?;

    Ok(Json(ListUsersResponse {
        total,
        quantity: users.len(),
        pagination: Pagination {
            from: window.skip + 1,
            lot: window.limit,
        },
        users,
    }))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created successfully", body = UserEnvelope),
        (status = 400, description = "Validation failed"),
        (status = 500, description = "Internal server error")
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<impl IntoResponse> {
    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(UserEnvelope { user })))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserEnvelope),
        (status = 400, description = "Invalid UUID"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserEnvelope>> {
    let user = service.get_user(id).await?;
    Ok(Json(UserEnvelope { user }))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated successfully", body = UserEnvelope),
        (status = 400, description = "Validation failed or invalid UUID"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> UserResult<Json<UserEnvelope>> {
    let user = service.update_user(id, input).await?;
    Ok(Json(UserEnvelope { user }))
}

/// Soft-delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deactivated", body = DeletedUserEnvelope),
        (status = 400, description = "Invalid UUID"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<DeletedUserEnvelope>> {
    let deleted_user = service.delete_user(id).await?;
    Ok(Json(DeletedUserEnvelope { deleted_user }))
}

/// Search active users by first name, last name, or username
#[utoipa::path(
    get,
    path = "/search/{term}",
    tag = "Users",
    params(
        ("term" = String, Path, description = "Search term, matched case-insensitively")
    ),
    responses(
        (status = 200, description = "Matching active users", body = SearchUsersResponse),
        (status = 500, description = "Internal server error")
    )
)]
async fn search_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(term): Path<String>,
) -> UserResult<Json<SearchUsersResponse>> {
    let results = service.search_users(&term).await?;

    Ok(Json(SearchUsersResponse {
        queried_fields: SEARCH_FIELDS.to_vec(),
        quantity: results.len(),
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::repository::MockUserRepository;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn sample_user() -> User {
        User {
            id: Uuid::now_v7(),
            first_name: "ada".to_string(),
            last_name: "lovelace".to_string(),
            username: Some("ada".to_string()),
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
        }
    }

    fn test_app(mock: MockUserRepository) -> Router {
        router(UserService::new(mock))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_create_user_returns_201_without_password() {
        let mut mock = MockUserRepository::new();
        mock.expect_insert().returning(|user| Ok(user));

        let response = test_app(mock)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"firstName":"Ada","lastName":"Lovelace","password":"s3cret"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);

        let json = json_body(response).await;
        assert_eq!(json["user"]["firstName"], "ada");
        assert_eq!(json["user"]["lastName"], "lovelace");
        assert_eq!(json["user"]["status"], true);
        assert!(json["user"].get("password").is_none());
        assert!(json["user"]["id"].is_string());
    }

    #[tokio::test]
    async fn test_create_user_rejects_empty_first_name() {
        let response = test_app(MockUserRepository::new())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"firstName":"","lastName":"Lovelace","password":"s3cret"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["error"], "BadRequest");
        assert!(json["details"]["firstName"].is_array());
    }

    #[tokio::test]
    async fn test_get_user_missing_returns_404() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id().returning(|_| Ok(None));

        let response = test_app(mock)
            .oneshot(
                Request::builder()
                    .uri(format!("/{}", Uuid::now_v7()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "not_found");
    }

    #[tokio::test]
    async fn test_get_user_invalid_uuid_returns_400() {
        let response = test_app(MockUserRepository::new())
            .oneshot(
                Request::builder()
                    .uri("/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_users_echoes_normalized_pagination() {
        let mut mock = MockUserRepository::new();
        mock.expect_count_active().returning(|| Ok(12));
        mock.expect_list_active()
            .withf(|window| window.skip == 2 && window.limit == 5)
            .returning(|_| Ok(vec![sample_user(), sample_user()]));

        let response = test_app(mock)
            .oneshot(
                Request::builder()
                    .uri("/?from=3&lot=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["total"], 12);
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["pagination"]["from"], 3);
        assert_eq!(json["pagination"]["lot"], 5);
        assert_eq!(json["users"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_users_defaults_when_params_absent() {
        let mut mock = MockUserRepository::new();
        mock.expect_count_active().returning(|| Ok(0));
        mock.expect_list_active()
            .withf(|window| window.skip == 0 && window.limit == 10)
            .returning(|_| Ok(vec![]));

        let response = test_app(mock)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["pagination"]["from"], 1);
        assert_eq!(json["pagination"]["lot"], 10);
    }

    #[tokio::test]
    async fn test_update_user_returns_updated_document() {
        let mut mock = MockUserRepository::new();
        mock.expect_update_returning().returning(|_, _| {
            let mut user = sample_user();
            user.first_name = "grace".to_string();
            Ok(Some(user))
        });

        let response = test_app(mock)
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/{}", Uuid::now_v7()))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"firstName":"Grace"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["user"]["firstName"], "grace");
    }

    #[tokio::test]
    async fn test_delete_user_returns_deactivated_envelope() {
        let mut mock = MockUserRepository::new();
        mock.expect_update_returning()
            .withf(|_, patch| patch.status == Some(false))
            .returning(|_, _| {
                let mut user = sample_user();
                user.status = false;
                Ok(Some(user))
            });

        let response = test_app(mock)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/{}", Uuid::now_v7()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["deletedUser"]["status"], false);
        assert!(json["deletedUser"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_delete_user_missing_returns_404() {
        let mut mock = MockUserRepository::new();
        mock.expect_update_returning().returning(|_, _| Ok(None));

        let response = test_app(mock)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/{}", Uuid::now_v7()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_users_lists_queried_fields() {
        let mut mock = MockUserRepository::new();
        mock.expect_search_active()
            .returning(|_| Ok(vec![sample_user()]));

        let response = test_app(mock)
            .oneshot(
                Request::builder()
                    .uri("/search/ada")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(
            json["queriedFields"],
            serde_json::json!(["firstName", "lastName", "username"])
        );
        assert_eq!(json["quantity"], 1);
        assert_eq!(json["results"][0]["firstName"], "ada");
    }
}
