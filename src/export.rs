//! Job facade: paginate, fan out, aggregate, hand off
//!
//! An [`Exporter`] runs one collection end to end. The job always completes
//! and reports a summary; per-unit failures are folded into outcomes along
//! the way. A job-level error is reserved for cases where the job cannot
//! even begin (invalid configuration) or the finished document cannot be
//! encoded or stored.

use crate::client::{ApiClient, RecordFetcher};
use crate::config::{CollectionSpec, Config};
use crate::error::Result;
use crate::fanout::assemble_forest;
use crate::pagination::list_parents;
use crate::signing::QueryParams;
use crate::sink::OutputSink;
use crate::tree::{OutputDocument, Summary};
use std::sync::Arc;

/// Result of one harvest run
#[derive(Clone, Debug)]
pub struct ExportReport {
    /// The assembled document, parents in pagination discovery order
    pub document: OutputDocument,
    /// Per-outcome counts over all processed parents
    pub summary: Summary,
    /// False when pagination stopped early on a terminal failure
    pub pagination_complete: bool,
}

/// Harvests one collection: listing, fan-out, and document assembly
pub struct Exporter {
    fetcher: Arc<dyn RecordFetcher>,
    spec: Arc<CollectionSpec>,
    config: Config,
}

impl Exporter {
    /// Build an exporter talking to the real API
    ///
    /// Fails when the API configuration is incomplete or an endpoint URL
    /// does not parse.
    pub fn new(config: Config, spec: CollectionSpec) -> Result<Self> {
        let client = ApiClient::new(config.api.clone(), config.retry.clone(), spec.clone())?;
        Ok(Self {
            fetcher: Arc::new(client),
            spec: Arc::new(spec),
            config,
        })
    }

    /// Build an exporter over a caller-supplied fetcher (tests, alternative transports)
    pub fn with_fetcher(
        fetcher: Arc<dyn RecordFetcher>,
        config: Config,
        spec: CollectionSpec,
    ) -> Self {
        Self {
            fetcher,
            spec: Arc::new(spec),
            config,
        }
    }

    /// Run the harvest and return the assembled document with its summary
    ///
    /// Never fails: pagination shortfalls and per-parent failures are
    /// reported through the returned [`ExportReport`].
    pub async fn run(&self, filters: &QueryParams) -> ExportReport {
        tracing::info!(collection = %self.spec.root_tag, "starting harvest");

        let scan = list_parents(
            self.fetcher.as_ref(),
            &self.spec,
            filters,
            self.config.fetch.page_size,
        )
        .await;
        tracing::info!(
            parents = scan.parents.len(),
            complete = scan.complete,
            "listing finished"
        );
        if scan.parents.is_empty() {
            tracing::info!("no parent records matched the given filters");
        }

        let nodes = assemble_forest(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.spec),
            scan.parents,
            self.config.fetch.concurrency,
        )
        .await;

        let document = OutputDocument { parents: nodes };
        let summary = document.summary();
        tracing::info!(
            complete = summary.complete,
            partial = summary.partial,
            failed = summary.failed,
            "harvest finished"
        );

        ExportReport {
            document,
            summary,
            pagination_complete: scan.complete,
        }
    }

    /// Serialize a report's document with the configured failed-parent policy
    pub fn render(&self, report: &ExportReport) -> Result<String> {
        report
            .document
            .to_xml(&self.spec, self.config.fetch.failed_parents)
    }

    /// Run the harvest, serialize the document, and hand it to a sink
    pub async fn run_to_sink(
        &self,
        filters: &QueryParams,
        name: &str,
        sink: &dyn OutputSink,
    ) -> Result<ExportReport> {
        let report = self.run(filters).await;
        let xml = self.render(&report)?;
        sink.store(name, xml.as_bytes()).await?;
        tracing::info!(name, bytes = xml.len(), "document handed to sink");
        Ok(report)
    }
}
