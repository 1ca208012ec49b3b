//! Configuration types for treeharvest

use crate::error::{Error, Result};
use crate::response::FieldSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Main configuration for an [`crate::Exporter`]
///
/// Groups settings into logical sub-configs:
/// - [`api`](ApiConfig): credentials, endpoint URLs, request timeout
/// - [`retry`](RetryConfig): attempt budget and backoff ladder
/// - [`fetch`](FetchConfig): concurrency bound, page size, failed-parent policy
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API credentials and endpoints
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry behavior for transient request failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Fan-out and pagination behavior
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Remote API credentials, endpoints, and transport settings
///
/// All values are explicit; nothing is read from process-wide state. The
/// secret and URLs are fixed for the lifetime of a client, before any
/// concurrent work starts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Account identifier sent with every request
    #[serde(default)]
    pub account: String,

    /// Shared secret used to sign every request
    #[serde(default)]
    pub auth_key: String,

    /// Endpoint URLs for the three logical verbs
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Per-request timeout (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            auth_key: String::new(),
            endpoints: EndpointConfig::default(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Validate that credentials are present and endpoint URLs parse
    pub fn validate(&self) -> Result<()> {
        if self.account.is_empty() {
            return Err(Error::Config {
                message: "account must not be empty".into(),
                key: Some("api.account".into()),
            });
        }
        if self.auth_key.is_empty() {
            return Err(Error::Config {
                message: "auth_key must not be empty".into(),
                key: Some("api.auth_key".into()),
            });
        }
        for (key, value) in [
            ("api.endpoints.list", &self.endpoints.list),
            ("api.endpoints.detail", &self.endpoints.detail),
            ("api.endpoints.expansion", &self.endpoints.expansion),
        ] {
            if let Err(e) = Url::parse(value) {
                return Err(Error::Config {
                    message: format!("invalid endpoint URL '{value}': {e}"),
                    key: Some(key.into()),
                });
            }
        }
        Ok(())
    }
}

/// Endpoint URLs for the three logical API verbs
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Paginated parent listing endpoint
    #[serde(default)]
    pub list: String,

    /// Per-parent child listing endpoint
    #[serde(default)]
    pub detail: String,

    /// Per-child grandchild listing endpoint
    #[serde(default)]
    pub expansion: String,
}

/// Retry configuration for transient request failures
///
/// `max_attempts` counts total calls, not retries: with the default of 3 a
/// request is sent at most three times, sleeping `initial_delay` before the
/// second attempt and `initial_delay * backoff_multiplier` before the third.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 2 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between attempts (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false, keeping the ladder exact)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

/// Fan-out and pagination behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Job-wide cap on in-flight detail/expansion requests (default: 10)
    ///
    /// One shared limiter covers every parent being assembled; it is not a
    /// per-parent bound.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Full page size of the listing endpoint (default: 100)
    ///
    /// A page with fewer records signals the end of the collection.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// How parents whose detail fetch failed appear in the document
    #[serde(default)]
    pub failed_parents: FailedParentPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            page_size: default_page_size(),
            failed_parents: FailedParentPolicy::default(),
        }
    }
}

/// Rendering policy for parents whose detail fetch failed terminally
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedParentPolicy {
    /// Render a header-only node carrying just the parent key (default)
    #[default]
    Include,
    /// Leave the parent out of the document entirely
    Omit,
}

/// Predicate deciding which children get a grandchild fetch
///
/// The original export family has two flavors: expand a child when a
/// designated field is blank (component expansion for bundled lines), or
/// attach sub-records whenever a designated field is present (stock lookup
/// per SKU). `FieldBlank` also filters the fetched grandchildren down to
/// records that do carry the designated field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionTrigger {
    /// Expand when the named field is absent or blank on the child
    FieldBlank(String),
    /// Expand when the named field is present and non-blank on the child
    FieldPresent(String),
}

impl ExpansionTrigger {
    /// Whether a child with these fields needs a grandchild fetch
    pub fn fires(&self, fields: &FieldSet) -> bool {
        match self {
            Self::FieldBlank(name) => fields.get_non_empty(name).is_none(),
            Self::FieldPresent(name) => fields.get_non_empty(name).is_some(),
        }
    }

    /// Whether a fetched grandchild record should be kept
    pub fn keeps(&self, fields: &FieldSet) -> bool {
        match self {
            Self::FieldBlank(name) => fields.get_non_empty(name).is_some(),
            Self::FieldPresent(_) => true,
        }
    }
}

/// Designated field names and output element names for one collection
///
/// The engine reads responses only far enough to extract the key, the line
/// number, and the expansion-trigger field; everything else is carried
/// opaquely into the output document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Field holding the parent key; doubles as the cursor parameter name
    pub key_field: String,

    /// Field holding the child's line/sequence number within its parent
    pub line_field: String,

    /// Predicate selecting children for grandchild expansion
    pub expansion: ExpansionTrigger,

    /// Root element of the output document
    pub root_tag: String,

    /// Element wrapping one parent subtree
    pub parent_tag: String,

    /// Element wrapping one child record
    pub child_tag: String,

    /// Container element for a child's attached grandchildren
    pub expansion_list_tag: String,

    /// Element wrapping one grandchild record
    pub expansion_tag: String,
}

impl CollectionSpec {
    /// Preset for the order-export collection
    pub fn orders() -> Self {
        Self {
            key_field: "order_number".into(),
            line_field: "line_no".into(),
            expansion: ExpansionTrigger::FieldBlank("jan_cd".into()),
            root_tag: "Orders".into(),
            parent_tag: "Order".into(),
            child_tag: "OrderDetail".into(),
            expansion_list_tag: "Components".into(),
            expansion_tag: "Component".into(),
        }
    }
}

impl Default for CollectionSpec {
    fn default() -> Self {
        Self::orders()
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_concurrency() -> usize {
    10
}

fn default_page_size() -> usize {
    100
}

// Duration serialization helper (seconds as integers)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
