use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::repos::RepoError;
use crate::application::subscription_repo::SubscriptionRepoError;
use crate::application::subscriptions::SubscriptionServiceError;

use super::error::{ApiError, codes};
use super::models::*;
use super::state::ApiState;

pub async fn create_subscription(
    State(state): State<ApiState>,
    payload: Result<Json<SubscriptionCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(json_rejection)?;

    let record = state
        .subscriptions
        .create(request.into())
        .await
        .map_err(service_to_api)?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_subscriptions(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.subscriptions.list().await.map_err(service_to_api)?;
    Ok(Json(records))
}

pub async fn get_subscription(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let record = state.subscriptions.get(id).await.map_err(service_to_api)?;
    Ok(Json(record))
}

pub async fn update_subscription(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<SubscriptionUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = payload.map_err(json_rejection)?;

    let record = state
        .subscriptions
        .update(id, request.into())
        .await
        .map_err(service_to_api)?;

    Ok(Json(record))
}

pub async fn delete_subscription(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    state
        .subscriptions
        .delete(id)
        .await
        .map_err(service_to_api)?;

    Ok(Json(DeleteResponse::success()))
}

pub async fn subscriptions_total(
    State(state): State<ApiState>,
    params: Result<Query<TotalQueryParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        ApiError::bad_request("invalid query", Some(rejection.body_text()))
    })?;

    let total = state
        .subscriptions
        .total(params.into())
        .await
        .map_err(service_to_api)?;

    Ok(Json(TotalResponse { total }))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ApiError::bad_request(
                "invalid id",
                Some(format!("`{raw}` is not a positive integer")),
            )
        })
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("invalid json", Some(rejection.body_text()))
}

fn service_to_api(err: SubscriptionServiceError) -> ApiError {
    match err {
        SubscriptionServiceError::Validation(message) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid subscription",
            Some(message),
        ),
        SubscriptionServiceError::NotFound { id } => {
            ApiError::not_found("subscription not found", Some(format!("id {id}")))
        }
        SubscriptionServiceError::Repo(SubscriptionRepoError::NotFound { id }) => {
            ApiError::not_found("subscription not found", Some(format!("id {id}")))
        }
        SubscriptionServiceError::Repo(SubscriptionRepoError::Store {
            operation, source, ..
        }) => repo_to_api(operation, source),
    }
}

fn repo_to_api(operation: &'static str, err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found", None),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Failed to access subscriptions",
            Some(format!("{operation}: {message}")),
        ),
    }
}
