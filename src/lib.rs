//! # treeharvest
//!
//! Library for harvesting large, paginated collections from a signed-URL web
//! API into one hierarchical XML document per run.
//!
//! The engine walks a keyed pagination cursor to enumerate parent records,
//! fans out bounded-concurrency fetches for each parent's children and,
//! conditionally, grandchildren, retries transient failures with exponential
//! backoff, and assembles the partial, possibly-failed results into a single
//! ordered document, where one failure never aborts the whole job.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or scheduler, purely a Rust crate for embedding
//! - **Failure isolation** - Per-unit outcomes instead of propagated errors
//! - **One shared limiter** - Total in-flight requests are bounded job-wide
//! - **Deterministic output** - Document order is pagination discovery order
//!
//! ## Quick Start
//!
//! ```no_run
//! use treeharvest::{CollectionSpec, Config, Exporter, FsSink, QueryParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.api.account = "acme".into();
//!     config.api.auth_key = "secret".into();
//!     config.api.endpoints.list = "https://api.example.com/get_order".into();
//!     config.api.endpoints.detail = "https://api.example.com/get_order_detail".into();
//!     config.api.endpoints.expansion = "https://api.example.com/get_order_component".into();
//!
//!     let exporter = Exporter::new(config, CollectionSpec::orders())?;
//!
//!     let mut filters = QueryParams::new();
//!     filters.push("condition", "1");
//!     filters.push_date("order_date_fr", chrono::NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());
//!     filters.push_date("order_date_to", chrono::NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());
//!
//!     let sink = FsSink::new("./reports");
//!     let report = exporter.run_to_sink(&filters, "orders.xml", &sink).await?;
//!     println!(
//!         "harvested {} parents ({} complete, {} partial, {} failed)",
//!         report.summary.total(),
//!         report.summary.complete,
//!         report.summary.partial,
//!         report.summary.failed,
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Signed HTTP client and the record-fetching boundary trait
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Job facade tying pagination, fan-out, and rendering together
pub mod export;
/// Bounded-concurrency subtree assembly
pub mod fanout;
/// Cursor-driven parent enumeration
pub mod pagination;
/// Response body parsing
pub mod response;
/// Retry logic with exponential backoff
pub mod retry;
/// Request signing and canonical query construction
pub mod signing;
/// Output sink boundary
pub mod sink;
/// Typed record tree and document rendering
pub mod tree;

// Re-export commonly used types
pub use client::{ApiClient, RecordFetcher};
pub use config::{
    ApiConfig, CollectionSpec, Config, EndpointConfig, ExpansionTrigger, FailedParentPolicy,
    FetchConfig, RetryConfig,
};
pub use error::{Error, Result};
pub use export::{ExportReport, Exporter};
pub use fanout::assemble_forest;
pub use pagination::{ParentSet, list_parents};
pub use response::{Field, FieldSet, parse_records};
pub use signing::QueryParams;
pub use sink::{FsSink, MemorySink, OutputSink};
pub use tree::{ChildRecord, Outcome, OutputDocument, ParentNode, ParentRecord, Summary};
