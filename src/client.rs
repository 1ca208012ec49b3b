//! Signed HTTP client for the remote API
//!
//! [`RecordFetcher`] is the narrow boundary the engine drives: three logical
//! verbs returning parsed record sets. [`ApiClient`] is the production
//! implementation: one `reqwest::Client` with a fixed timeout, MD5-signed
//! URLs, and bounded retry around every call. Tests substitute in-process
//! fakes for the trait.

use crate::config::{ApiConfig, CollectionSpec, RetryConfig};
use crate::error::{Error, Result};
use crate::response::{FieldSet, parse_records};
use crate::retry::request_with_retry;
use crate::signing::QueryParams;
use async_trait::async_trait;

/// The three logical verbs of the remote collection API
///
/// Implementations return parsed record sets; transport, signing, and retry
/// are behind this boundary. Errors are terminal for the unit of work that
/// issued the call; retries have already happened underneath.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// Fetch one listing page of parent records
    ///
    /// `cursor` is the key of the last record seen, or `""` for the first
    /// page.
    async fn list_page(&self, filters: &QueryParams, cursor: &str) -> Result<Vec<FieldSet>>;

    /// Fetch the child records of one parent
    async fn children(&self, parent_key: &str) -> Result<Vec<FieldSet>>;

    /// Fetch the grandchild records of one child line
    async fn grandchildren(&self, parent_key: &str, line_no: &str) -> Result<Vec<FieldSet>>;
}

/// Production [`RecordFetcher`] speaking the signed-URL protocol
pub struct ApiClient {
    http: reqwest::Client,
    api: ApiConfig,
    retry: RetryConfig,
    spec: CollectionSpec,
}

impl ApiClient {
    /// Build a client after validating the API configuration
    pub fn new(api: ApiConfig, retry: RetryConfig, spec: CollectionSpec) -> Result<Self> {
        api.validate()?;
        let http = reqwest::Client::builder()
            .timeout(api.request_timeout)
            .build()?;
        Ok(Self {
            http,
            api,
            retry,
            spec,
        })
    }

    fn base_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push("account", self.api.account.clone());
        params
    }

    /// One signed GET with retry; returns the raw body text
    async fn get_signed(&self, endpoint: &str, params: &QueryParams) -> Result<String> {
        let url = params.signed_url(endpoint, &self.api.auth_key);
        request_with_retry(&self.retry, || self.fetch_raw(endpoint, &url)).await
    }

    /// One outbound GET: success body text or a classified failure, no retry
    async fn fetch_raw(&self, endpoint: &str, url: &str) -> Result<String> {
        tracing::debug!(endpoint, "sending request");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(Error::Status {
                endpoint: endpoint.to_string(),
                code: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl RecordFetcher for ApiClient {
    async fn list_page(&self, filters: &QueryParams, cursor: &str) -> Result<Vec<FieldSet>> {
        let mut params = self.base_params();
        params.extend_from(filters);
        if !cursor.is_empty() {
            params.push(self.spec.key_field.clone(), cursor);
        }
        tracing::debug!(cursor, "requesting listing page");
        let body = self.get_signed(&self.api.endpoints.list, &params).await?;
        parse_records(&body)
    }

    async fn children(&self, parent_key: &str) -> Result<Vec<FieldSet>> {
        let mut params = self.base_params();
        params.push(self.spec.key_field.clone(), parent_key);
        tracing::debug!(key = parent_key, "requesting detail");
        let body = self.get_signed(&self.api.endpoints.detail, &params).await?;
        parse_records(&body)
    }

    async fn grandchildren(&self, parent_key: &str, line_no: &str) -> Result<Vec<FieldSet>> {
        let mut params = self.base_params();
        params.push(self.spec.key_field.clone(), parent_key);
        params.push(self.spec.line_field.clone(), line_no);
        tracing::debug!(key = parent_key, line = line_no, "requesting expansion");
        let body = self
            .get_signed(&self.api.endpoints.expansion, &params)
            .await?;
        parse_records(&body)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;

    fn api_config(base: &str) -> ApiConfig {
        ApiConfig {
            account: "acme".into(),
            auth_key: "secret".into(),
            endpoints: EndpointConfig {
                list: format!("{base}/get_order"),
                detail: format!("{base}/get_order_detail"),
                expansion: format!("{base}/get_order_component"),
            },
            request_timeout: std::time::Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn new_rejects_invalid_config() {
        let mut api = api_config("https://api.example.com");
        api.auth_key = String::new();
        let result = ApiClient::new(api, RetryConfig::default(), CollectionSpec::orders());
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn new_accepts_valid_config() {
        let api = api_config("https://api.example.com");
        assert!(ApiClient::new(api, RetryConfig::default(), CollectionSpec::orders()).is_ok());
    }
}
