//! Route handlers over [`IntakeService`]

use super::dto::{
    CreateProfileRequest, HealthUpdateRequest, HealthzResponse, HistoryResponse, MessageResponse,
    PostMessageRequest, ProfileResponse, StateResponse, StatusRequest, StatusResponse,
};
use super::error::ApiError;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use lattia_application::{IntakeService, ProfileId};
use lattia_domain::HealthData;
use std::sync::Arc;

pub type AppState = Arc<IntakeService>;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn healthz() -> Json<HealthzResponse> {
    Json(HealthzResponse { status: "ok" })
}

pub async fn list_profiles(State(service): State<AppState>) -> ApiResult<Vec<ProfileResponse>> {
    let profiles = service.list_profiles().await?;
    Ok(Json(profiles.into_iter().map(Into::into).collect()))
}

pub async fn create_profile(
    State(service): State<AppState>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    let profile = service.create_profile(&request.name).await?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}

pub async fn get_profile(
    State(service): State<AppState>,
    Path(id): Path<ProfileId>,
) -> ApiResult<ProfileResponse> {
    Ok(Json(service.get_profile(id).await?.into()))
}

pub async fn delete_profile(
    State(service): State<AppState>,
    Path(id): Path<ProfileId>,
) -> Result<StatusCode, ApiError> {
    service.delete_profile(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn history(
    State(service): State<AppState>,
    Path(id): Path<ProfileId>,
) -> ApiResult<HistoryResponse> {
    Ok(Json(service.history(id).await?.into()))
}

pub async fn start(
    State(service): State<AppState>,
    Path(id): Path<ProfileId>,
) -> ApiResult<MessageResponse> {
    Ok(Json(service.start(id).await?.into()))
}

pub async fn post_message(
    State(service): State<AppState>,
    Path(id): Path<ProfileId>,
    Json(request): Json<PostMessageRequest>,
) -> ApiResult<MessageResponse> {
    Ok(Json(service.post_message(id, &request.content).await?.into()))
}

pub async fn health_data(
    State(service): State<AppState>,
    Path(id): Path<ProfileId>,
) -> ApiResult<HealthData> {
    Ok(Json(service.health_data(id).await?))
}

pub async fn update_health_data(
    State(service): State<AppState>,
    Path(id): Path<ProfileId>,
    Json(request): Json<HealthUpdateRequest>,
) -> ApiResult<HealthData> {
    Ok(Json(service.update_health_data(id, &request.values).await?))
}

pub async fn state(
    State(service): State<AppState>,
    Path(id): Path<ProfileId>,
) -> ApiResult<StateResponse> {
    Ok(Json(service.state(id).await?.into()))
}

pub async fn set_status(
    State(service): State<AppState>,
    Path(id): Path<ProfileId>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<StatusResponse> {
    let is_done = service.set_status(id, request.is_done).await?;
    Ok(Json(StatusResponse { is_done }))
}
