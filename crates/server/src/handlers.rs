//! Request handlers for the `/api` surface.

use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use history_atlas_db::models::{
    MapConfig, Participant, ParticipantFilter, Poi, PoiFilter, Route, RouteFilter,
};
use serde::Deserialize;
use serde_json::{json, Value};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Query parameters accepted by the route listings.
///
/// `is_global` is decided by the endpoint, so it is not read from the query.
#[derive(Debug, Default, Deserialize)]
pub struct RouteParams {
    pub country: Option<String>,
    pub transport: Option<String>,
}

impl RouteParams {
    fn into_filter(self, is_global: bool) -> RouteFilter {
        RouteFilter {
            country: non_blank(self.country),
            transport: non_blank(self.transport),
            is_global: Some(is_global),
        }
    }
}

/// Query parameters accepted by the POI listing.
#[derive(Debug, Default, Deserialize)]
pub struct PoiParams {
    #[serde(rename = "type")]
    pub poi_type: Option<String>,
    pub is_living_place: Option<String>,
}

impl PoiParams {
    fn into_filter(self) -> Result<PoiFilter, ApiError> {
        let is_living_place = match non_blank(self.is_living_place) {
            None => None,
            Some(flag) => Some(
                flag.trim()
                    .parse::<bool>()
                    .map_err(|_| ApiError::BadRequest("Invalid query parameters".to_string()))?,
            ),
        };
        Ok(PoiFilter {
            poi_type: non_blank(self.poi_type),
            is_living_place,
        })
    }
}

// An empty value (`?country=`) places no constraint.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(params)| params)
        .map_err(|_| ApiError::BadRequest("Invalid query parameters".to_string()))
}

fn participant_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::BadRequest("Invalid participant ID".to_string()))
}

pub async fn world_routes(
    State(state): State<AppState>,
    params: Result<Query<RouteParams>, QueryRejection>,
) -> ApiResult<Vec<Route>> {
    let filter = query_params(params)?.into_filter(true);
    Ok(Json(state.service.fetch_routes(&filter).await?))
}

pub async fn local_routes(
    State(state): State<AppState>,
    params: Result<Query<RouteParams>, QueryRejection>,
) -> ApiResult<Vec<Route>> {
    let filter = query_params(params)?.into_filter(false);
    Ok(Json(state.service.fetch_routes(&filter).await?))
}

pub async fn pois(
    State(state): State<AppState>,
    params: Result<Query<PoiParams>, QueryRejection>,
) -> ApiResult<Vec<Poi>> {
    let filter = query_params(params)?.into_filter()?;
    Ok(Json(state.service.fetch_pois(&filter).await?))
}

pub async fn participants(
    State(state): State<AppState>,
    params: Result<Query<ParticipantFilter>, QueryRejection>,
) -> ApiResult<Vec<Participant>> {
    let filter = query_params(params)?;
    let filter = ParticipantFilter {
        country: non_blank(filter.country),
        role: non_blank(filter.role),
    };
    Ok(Json(state.service.fetch_participants(&filter).await?))
}

pub async fn map_config(State(state): State<AppState>) -> ApiResult<MapConfig> {
    Ok(Json(state.service.fetch_map_config().await?))
}

pub async fn participant_routes(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<Route>> {
    let id = participant_id(id)?;
    Ok(Json(state.service.fetch_routes_for_participant(id).await?))
}

pub async fn participant_pois(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<Poi>> {
    let id = participant_id(id)?;
    Ok(Json(state.service.fetch_pois_for_participant(id).await?))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn health_head() -> StatusCode {
    StatusCode::OK
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.gather() {
        Ok(body) => (StatusCode::OK, body),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}
