use axum::extract::State;
use axum::Json;
use chrono::Utc;
use common::{
    build_cost_filter, AccountInfo, AccountInfoRequest, CostDataRequest, CostDataResponse,
    CostQuery, CredentialValidation, CredentialValidationRequest, DimensionRequest,
    DimensionValuesResponse, GroupByClause, HealthResponse, SimpleCostDataRequest, TimePeriod,
};
use myerrors::ApiError;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::service::BillingService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn BillingService>,
    pub base_path: String,
}

fn resolve_date_range(start: Option<&str>, end: Option<&str>) -> (String, String) {
    match (start, end) {
        (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
            (start.to_string(), end.to_string())
        }
        _ => {
            let end = Utc::now().date_naive();
            let start = end - chrono::Duration::days(30);
            (
                start.format("%Y-%m-%d").to_string(),
                end.format("%Y-%m-%d").to_string(),
            )
        }
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "AWS Billing Dashboard API" }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

pub async fn cost_data(
    State(state): State<AppState>,
    Json(request): Json<CostDataRequest>,
) -> Result<Json<CostDataResponse>, ApiError> {
    request.credentials.validate().map_err(ApiError::Validation)?;
    request
        .query
        .time_period
        .validate()
        .map_err(ApiError::Validation)?;

    let response = state
        .service
        .get_cost_and_usage(&request.credentials, &request.query)
        .await?;
    Ok(Json(response))
}

pub async fn cost_data_simple(
    State(state): State<AppState>,
    Json(request): Json<SimpleCostDataRequest>,
) -> Result<Json<CostDataResponse>, ApiError> {
    request.credentials.validate().map_err(ApiError::Validation)?;

    let (start, end) = resolve_date_range(request.start_date.as_deref(), request.end_date.as_deref());

    let metrics = request
        .metrics
        .as_deref()
        .unwrap_or("BlendedCost")
        .split(',')
        .map(|metric| metric.trim().to_string())
        .collect();

    let group_by = request
        .group_by_dimension
        .as_ref()
        .map(|dimension| {
            vec![GroupByClause {
                r#type: "DIMENSION".to_string(),
                key: dimension.clone(),
            }]
        })
        .unwrap_or_default();

    let query = CostQuery {
        time_period: TimePeriod { start, end },
        granularity: request.granularity.unwrap_or_default(),
        group_by,
        metrics,
        filter: build_cost_filter(&request.filter_options()),
    };
    query.time_period.validate().map_err(ApiError::Validation)?;

    let response = state
        .service
        .get_cost_and_usage(&request.credentials, &query)
        .await?;
    Ok(Json(response))
}

pub async fn dimension_values(
    State(state): State<AppState>,
    Json(request): Json<DimensionRequest>,
) -> Result<Json<DimensionValuesResponse>, ApiError> {
    request.credentials.validate().map_err(ApiError::Validation)?;
    request.time_period.validate().map_err(ApiError::Validation)?;

    let values = state
        .service
        .get_dimension_values(&request.credentials, &request.dimension, &request.time_period)
        .await?;
    Ok(Json(DimensionValuesResponse {
        dimension: request.dimension,
        values,
    }))
}

pub async fn account_info(
    State(state): State<AppState>,
    Json(request): Json<AccountInfoRequest>,
) -> Result<Json<AccountInfo>, ApiError> {
    request.credentials.validate().map_err(ApiError::Validation)?;

    let info = state.service.get_account_info(&request.credentials).await?;
    Ok(Json(info))
}

pub async fn validate_credentials(
    State(state): State<AppState>,
    Json(request): Json<CredentialValidationRequest>,
) -> Result<Json<CredentialValidation>, ApiError> {
    request.credentials.validate().map_err(ApiError::Validation)?;

    // The gateway folds every AWS failure into a valid:false result, so this
    // endpoint only returns non-200 for shape violations above.
    let result = state.service.validate_credentials(&request.credentials).await;
    Ok(Json(result))
}
