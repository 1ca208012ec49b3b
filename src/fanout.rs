//! Bounded-concurrency subtree assembly
//!
//! Each parent resolves its detail fetch first, then fans out grandchild
//! fetches for the children that need expansion. Different parents proceed
//! concurrently, all sharing one job-wide semaphore so total in-flight
//! requests never exceed the configured bound. Permits are held for the
//! duration of a single request (including its retries); a parent awaiting
//! its grandchildren holds no permit.
//!
//! Failures are captured per unit of work: a failed grandchild fetch leaves
//! one child unexpanded and marks the parent `Partial`; a failed detail
//! fetch marks the parent `Failed`; neither touches any sibling.

use crate::client::RecordFetcher;
use crate::config::CollectionSpec;
use crate::error::{Error, Result};
use crate::response::FieldSet;
use crate::tree::{ChildRecord, Outcome, ParentNode, ParentRecord};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Run a future under one permit of the shared limiter
async fn limited<T>(limiter: &Semaphore, fut: impl Future<Output = Result<T>>) -> Result<T> {
    let _permit = limiter
        .acquire()
        .await
        .map_err(|_| Error::Other("concurrency limiter closed".into()))?;
    fut.await
}

/// Assemble the subtree for one parent
///
/// Never fails: every fetch error is absorbed into the node's [`Outcome`].
pub(crate) async fn assemble_parent(
    fetcher: &dyn RecordFetcher,
    spec: &CollectionSpec,
    limiter: &Semaphore,
    parent: ParentRecord,
) -> ParentNode {
    let ParentRecord { key, fields } = parent;
    tracing::debug!(key = %key, "assembling parent subtree");

    let detail = limited(limiter, fetcher.children(&key)).await;
    let records = match detail {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(key = %key, error = %e, "detail fetch failed; parent recorded as failed");
            return ParentNode {
                key,
                fields,
                children: Vec::new(),
                outcome: Outcome::Failed,
            };
        }
    };

    let mut children: Vec<ChildRecord> = records
        .into_iter()
        .map(|fields| ChildRecord {
            line_no: fields.get_non_empty(&spec.line_field).map(str::to_string),
            fields,
            expansions: Vec::new(),
        })
        .collect();

    // (child slot, line number) pairs that need a grandchild fetch
    let mut jobs: Vec<(usize, String)> = Vec::new();
    for (slot, child) in children.iter().enumerate() {
        if !spec.expansion.fires(&child.fields) {
            continue;
        }
        match &child.line_no {
            Some(line) => jobs.push((slot, line.clone())),
            None => {
                tracing::debug!(key = %key, "child needs expansion but carries no line number; skipped");
            }
        }
    }

    let mut failed_fetches = 0usize;
    if !jobs.is_empty() {
        tracing::debug!(key = %key, expansions = jobs.len(), "fetching expansions");
        let results = futures::future::join_all(jobs.iter().map(|(_, line)| async {
            let sets = limited(limiter, fetcher.grandchildren(&key, line)).await?;
            Ok::<_, Error>(
                sets.into_iter()
                    .filter(|set| spec.expansion.keeps(set))
                    .collect::<Vec<FieldSet>>(),
            )
        }))
        .await;

        for ((slot, line), result) in jobs.into_iter().zip(results) {
            match result {
                Ok(sets) => children[slot].expansions = sets,
                Err(e) => {
                    failed_fetches += 1;
                    tracing::warn!(
                        key = %key,
                        line = %line,
                        error = %e,
                        "expansion fetch failed; child left unexpanded"
                    );
                }
            }
        }
    }

    let outcome = if failed_fetches > 0 {
        Outcome::Partial
    } else {
        Outcome::Complete
    };
    ParentNode {
        key,
        fields,
        children,
        outcome,
    }
}

/// Assemble all parent subtrees concurrently
///
/// Output order matches the input (pagination discovery) order regardless of
/// completion order. A panicked parent task degrades to a `Failed` node for
/// that parent only.
pub async fn assemble_forest(
    fetcher: Arc<dyn RecordFetcher>,
    spec: Arc<CollectionSpec>,
    parents: Vec<ParentRecord>,
    concurrency: usize,
) -> Vec<ParentNode> {
    let limiter = Arc::new(Semaphore::new(concurrency.max(1)));

    let mut handles = Vec::with_capacity(parents.len());
    for parent in parents {
        let fetcher = Arc::clone(&fetcher);
        let spec = Arc::clone(&spec);
        let limiter = Arc::clone(&limiter);
        let key = parent.key.clone();
        let handle = tokio::spawn(async move {
            assemble_parent(fetcher.as_ref(), &spec, &limiter, parent).await
        });
        handles.push((key, handle));
    }

    let mut nodes = Vec::with_capacity(handles.len());
    for (key, handle) in handles {
        match handle.await {
            Ok(node) => nodes.push(node),
            Err(e) => {
                tracing::error!(key = %key, error = %e, "parent task aborted; recorded as failed");
                nodes.push(ParentNode {
                    key,
                    fields: FieldSet::default(),
                    children: Vec::new(),
                    outcome: Outcome::Failed,
                });
            }
        }
    }
    nodes
}
