use std::collections::HashMap;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_costexplorer::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_costexplorer::types::{
    DateInterval, Dimension, DimensionValues, Expression, Granularity as CeGranularity,
    GroupDefinition, GroupDefinitionType, MetricValue, ResultByTime as CeResultByTime,
};
use aws_sdk_costexplorer::Client as CeClient;
use aws_sdk_sts::Client as StsClient;

use common::{
    AccountInfo, AwsCredentials, CostDataResponse, CostQuery, CredentialValidation,
    FilterExpression, Granularity, Group, GroupMetrics, Metrics, ResultByTime, TimePeriod,
};
use myerrors::ApiError;

pub const INVALID_CREDENTIAL_MESSAGE: &str =
    "Invalid AWS credentials. Please check your Access Key ID and Secret Access Key.";

// STS error codes that mean "these credentials are wrong", as opposed to a
// permissions or availability problem.
const INVALID_CREDENTIAL_CODES: [&str; 3] = [
    "InvalidUserID.NotFound",
    "SignatureDoesNotMatch",
    "InvalidAccessKeyId",
];

const DEFAULT_AMOUNT: &str = "0";
const DEFAULT_UNIT: &str = "USD";

async fn sdk_config(credentials: &AwsCredentials) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .credentials_provider(Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            "billing-dashboard",
        ))
        .region(Region::new(credentials.region.clone()))
        .load()
        .await
}

async fn cost_explorer_client(credentials: &AwsCredentials) -> CeClient {
    CeClient::new(&sdk_config(credentials).await)
}

async fn sts_client(credentials: &AwsCredentials) -> StsClient {
    StsClient::new(&sdk_config(credentials).await)
}

pub async fn get_cost_and_usage(
    credentials: &AwsCredentials,
    query: &CostQuery,
) -> Result<CostDataResponse, ApiError> {
    let client = cost_explorer_client(credentials).await;

    let time_period = DateInterval::builder()
        .start(query.time_period.start.as_str())
        .end(query.time_period.end.as_str())
        .build()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut request = client
        .get_cost_and_usage()
        .time_period(time_period)
        .granularity(to_sdk_granularity(query.granularity))
        .set_metrics(Some(query.metrics.clone()));

    for clause in &query.group_by {
        request = request.group_by(
            GroupDefinition::builder()
                .r#type(GroupDefinitionType::from(clause.r#type.as_str()))
                .key(clause.key.as_str())
                .build(),
        );
    }

    if let Some(filter) = &query.filter {
        request = request.filter(to_expression(filter));
    }

    let response = request.send().await.map_err(map_sdk_error)?;

    Ok(CostDataResponse {
        time_period: query.time_period.clone(),
        granularity: query.granularity,
        group_by: query.group_by.clone(),
        results: normalize_results(response.results_by_time()),
        next_page_token: response.next_page_token().map(str::to_string),
    })
}

pub async fn get_dimension_values(
    credentials: &AwsCredentials,
    dimension: &str,
    time_period: &TimePeriod,
) -> Result<Vec<String>, ApiError> {
    let client = cost_explorer_client(credentials).await;

    let interval = DateInterval::builder()
        .start(time_period.start.as_str())
        .end(time_period.end.as_str())
        .build()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let response = client
        .get_dimension_values()
        .time_period(interval)
        .dimension(Dimension::from(dimension))
        .send()
        .await
        .map_err(map_sdk_error)?;

    // Vendor ordering and duplicates are kept as-is.
    Ok(response
        .dimension_values()
        .iter()
        .filter_map(|entry| entry.value())
        .map(str::to_string)
        .collect())
}

/// Checks the credentials against STS. Never fails: every failure path is
/// folded into a `valid: false` result.
pub async fn validate_credentials(credentials: &AwsCredentials) -> CredentialValidation {
    let client = sts_client(credentials).await;

    match client.get_caller_identity().send().await {
        Ok(identity) => CredentialValidation {
            valid: true,
            error: None,
            account_id: identity.account().map(str::to_string),
        },
        Err(err) => match err.as_service_error() {
            Some(service_err) => credential_failure(service_err.code(), service_err.message()),
            None => CredentialValidation {
                valid: false,
                error: Some("Failed to validate credentials".to_string()),
                account_id: None,
            },
        },
    }
}

pub async fn get_account_info(credentials: &AwsCredentials) -> Result<AccountInfo, ApiError> {
    let client = sts_client(credentials).await;

    let identity = client
        .get_caller_identity()
        .send()
        .await
        .map_err(map_sdk_error)?;

    Ok(AccountInfo {
        account_id: identity.account().unwrap_or_default().to_string(),
        user_id: identity.user_id().unwrap_or_default().to_string(),
        arn: identity.arn().unwrap_or_default().to_string(),
    })
}

fn to_sdk_granularity(granularity: Granularity) -> CeGranularity {
    match granularity {
        Granularity::Daily => CeGranularity::Daily,
        Granularity::Monthly => CeGranularity::Monthly,
        Granularity::Hourly => CeGranularity::Hourly,
    }
}

fn to_expression(filter: &FilterExpression) -> Expression {
    match filter {
        FilterExpression::Dimensions(dimension_filter) => Expression::builder()
            .dimensions(
                DimensionValues::builder()
                    .key(Dimension::from(dimension_filter.key.as_str()))
                    .set_values(Some(dimension_filter.values.clone()))
                    .build(),
            )
            .build(),
        FilterExpression::And(children) => {
            let mut builder = Expression::builder();
            for child in children {
                builder = builder.and(to_expression(child));
            }
            builder.build()
        }
        FilterExpression::Not(child) => Expression::builder().not(to_expression(child)).build(),
    }
}

fn normalize_results(results: &[CeResultByTime]) -> Vec<ResultByTime> {
    results.iter().map(normalize_result).collect()
}

fn normalize_result(entry: &CeResultByTime) -> ResultByTime {
    let time_period = entry
        .time_period()
        .map(|tp| TimePeriod {
            start: tp.start().to_string(),
            end: tp.end().to_string(),
        })
        .unwrap_or_default();

    let groups: Vec<Group> = entry
        .groups()
        .iter()
        .map(|group| Group {
            keys: group.keys().to_vec(),
            metrics: normalize_metric_map(group.metrics()),
        })
        .collect();

    // Totals only carry information for ungrouped queries; grouped replies
    // come back with an empty total map.
    let total = if groups.is_empty() {
        entry.total().map(|total| normalize_metric_map(Some(total)))
    } else {
        None
    };

    ResultByTime {
        time_period,
        total,
        groups,
        estimated: entry.estimated(),
    }
}

fn normalize_metric_map(metrics: Option<&HashMap<String, MetricValue>>) -> GroupMetrics {
    GroupMetrics {
        blended_cost: metric_value(metrics, "BlendedCost"),
        unblended_cost: metric_value(metrics, "UnblendedCost"),
        usage_quantity: metric_value(metrics, "UsageQuantity"),
    }
}

fn metric_value(metrics: Option<&HashMap<String, MetricValue>>, name: &str) -> Option<Metrics> {
    metrics.and_then(|m| m.get(name)).map(|value| Metrics {
        amount: value.amount().unwrap_or(DEFAULT_AMOUNT).to_string(),
        unit: value.unit().unwrap_or(DEFAULT_UNIT).to_string(),
    })
}

fn credential_failure(code: Option<&str>, message: Option<&str>) -> CredentialValidation {
    let error = match code {
        Some(code) if INVALID_CREDENTIAL_CODES.contains(&code) => {
            INVALID_CREDENTIAL_MESSAGE.to_string()
        }
        _ => message.unwrap_or("Failed to validate credentials").to_string(),
    };
    CredentialValidation {
        valid: false,
        error: Some(error),
        account_id: None,
    }
}

fn map_sdk_error<E>(err: SdkError<E>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err.as_service_error() {
        Some(service_err) => ApiError::Vendor(
            service_err
                .message()
                .or_else(|| service_err.code())
                .unwrap_or("unknown AWS error")
                .to_string(),
        ),
        None => ApiError::Internal(DisplayErrorContext(&err).to_string()),
    }
}
