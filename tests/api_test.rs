//! API-level tests for error translation and response shapes.
//!
//! These verify the single error-to-HTTP translation point and the
//! response bodies clients actually see, without a database.

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;

use pharmacy_api::domain::RoleName;
use pharmacy_api::errors::AppError;

async fn response_body(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn not_found_translates_to_404_with_message() {
    let (status, body) = response_body(AppError::not_found("User not found with id: 9")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["message"], "User not found with id: 9");
    assert!(body["timestamp"].is_string());
    assert!(body.get("validation_errors").is_none());
}

#[tokio::test]
async fn business_rule_translates_to_400() {
    let (status, body) = response_body(AppError::business_rule("Username is already taken")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username is already taken");
}

#[tokio::test]
async fn validation_errors_carry_a_field_map() {
    let (status, body) =
        response_body(AppError::validation_field("email", "Invalid email format")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Validation errors");
    assert_eq!(body["validation_errors"]["email"], "Invalid email format");
}

#[tokio::test]
async fn invalid_credentials_translate_to_401_with_fixed_message() {
    let (status, body) = response_body(AppError::InvalidCredentials).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
async fn internal_faults_never_leak_details() {
    let (status, body) = response_body(AppError::internal("pool exhausted at node 3")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An unexpected error occurred");
    assert!(body["message"].as_str().unwrap().find("pool").is_none());
}

#[tokio::test]
async fn database_errors_keep_context_in_details_only() {
    let err = AppError::database(
        sea_orm::DbErr::Custom("connection reset".to_string()),
        "while retrieving all users",
    );
    let (status, body) = response_body(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An unexpected error occurred");
    assert_eq!(body["details"], "while retrieving all users");
}

#[test]
fn role_names_parse_exact_catalog_names_only() {
    assert_eq!(RoleName::parse("CUSTOMER"), Some(RoleName::Customer));
    assert_eq!(RoleName::parse("ADMIN"), Some(RoleName::Admin));
    assert_eq!(RoleName::parse("PHARMACIST"), Some(RoleName::Pharmacist));
    assert_eq!(RoleName::parse("customer"), None);
    assert_eq!(RoleName::parse("NOT_A_ROLE"), None);
}

#[test]
fn role_names_render_uppercase() {
    assert_eq!(RoleName::Customer.to_string(), "CUSTOMER");
    assert_eq!(RoleName::Admin.to_string(), "ADMIN");
    assert_eq!(RoleName::Pharmacist.to_string(), "PHARMACIST");
}
