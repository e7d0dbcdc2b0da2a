use async_trait::async_trait;
use common::{
    AccountInfo, AwsCredentials, CostDataResponse, CostQuery, CredentialValidation, TimePeriod,
};
use myerrors::ApiError;

/// Seam between the HTTP handlers and the AWS gateway; mocked in tests.
#[async_trait]
pub trait BillingService: Send + Sync {
    async fn get_cost_and_usage(
        &self,
        credentials: &AwsCredentials,
        query: &CostQuery,
    ) -> Result<CostDataResponse, ApiError>;

    async fn get_dimension_values(
        &self,
        credentials: &AwsCredentials,
        dimension: &str,
        time_period: &TimePeriod,
    ) -> Result<Vec<String>, ApiError>;

    async fn validate_credentials(&self, credentials: &AwsCredentials) -> CredentialValidation;

    async fn get_account_info(
        &self,
        credentials: &AwsCredentials,
    ) -> Result<AccountInfo, ApiError>;
}

pub struct AwsBillingService;

#[async_trait]
impl BillingService for AwsBillingService {
    async fn get_cost_and_usage(
        &self,
        credentials: &AwsCredentials,
        query: &CostQuery,
    ) -> Result<CostDataResponse, ApiError> {
        ce::get_cost_and_usage(credentials, query).await.map_err(|e| {
            log::error!("Failed to call CE API (get_cost_and_usage): {e}");
            e
        })
    }

    async fn get_dimension_values(
        &self,
        credentials: &AwsCredentials,
        dimension: &str,
        time_period: &TimePeriod,
    ) -> Result<Vec<String>, ApiError> {
        ce::get_dimension_values(credentials, dimension, time_period)
            .await
            .map_err(|e| {
                log::error!("Failed to call CE API (get_dimension_values): {e}");
                e
            })
    }

    async fn validate_credentials(&self, credentials: &AwsCredentials) -> CredentialValidation {
        let result = ce::validate_credentials(credentials).await;
        if !result.valid {
            log::warn!(
                "Credential validation failed: {}",
                result.error.as_deref().unwrap_or("unknown reason")
            );
        }
        result
    }

    async fn get_account_info(
        &self,
        credentials: &AwsCredentials,
    ) -> Result<AccountInfo, ApiError> {
        ce::get_account_info(credentials).await.map_err(|e| {
            log::error!("Failed to call STS API (get_caller_identity): {e}");
            e
        })
    }
}
