//! Cursor-driven parent enumeration
//!
//! Pagination is strictly sequential: each page request depends on the
//! previous page's last key. A short page (fewer records than the server's
//! full page size) or an empty page ends the walk. A terminal request
//! failure ends the walk early with whatever was already collected; the job
//! carries on with a partial parent set rather than failing outright.

use crate::client::RecordFetcher;
use crate::config::CollectionSpec;
use crate::signing::QueryParams;
use crate::tree::ParentRecord;
use std::collections::HashMap;

/// Result of one pagination walk
#[derive(Clone, Debug)]
pub struct ParentSet {
    /// Collected parents in first-seen order, deduplicated by key
    pub parents: Vec<ParentRecord>,
    /// False when the walk stopped early on a terminal request failure
    pub complete: bool,
}

/// Enumerate all parent records for the given filters
///
/// Duplicate keys across pages (concurrent writes on the server can shift
/// records between pages) resolve last-write-wins: the newer copy replaces
/// the older one in its original position.
pub async fn list_parents(
    fetcher: &dyn RecordFetcher,
    spec: &CollectionSpec,
    filters: &QueryParams,
    page_size: usize,
) -> ParentSet {
    let mut parents: Vec<ParentRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut cursor = String::new();

    loop {
        let records = match fetcher.list_page(filters, &cursor).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    collected = parents.len(),
                    "listing stopped early; continuing with a partial parent set"
                );
                return ParentSet {
                    parents,
                    complete: false,
                };
            }
        };

        if records.is_empty() {
            tracing::debug!("listing returned an empty page; end of data");
            break;
        }

        let page_len = records.len();
        let mut last_key: Option<String> = None;
        for fields in records {
            let Some(key) = fields.get_non_empty(&spec.key_field).map(str::to_string) else {
                tracing::debug!(key_field = %spec.key_field, "listing record without a key, skipped");
                continue;
            };
            last_key = Some(key.clone());
            let record = ParentRecord {
                key: key.clone(),
                fields,
            };
            if let Some(&slot) = index.get(&key) {
                tracing::debug!(key = %key, "duplicate listing key, keeping the newer copy");
                parents[slot] = record;
            } else {
                index.insert(key, parents.len());
                parents.push(record);
            }
        }
        tracing::debug!(page_len, total = parents.len(), "listing page absorbed");

        if page_len < page_size {
            tracing::debug!(page_len, page_size, "short page; end of data");
            break;
        }
        match last_key {
            Some(key) => cursor = key,
            None => {
                // A full page of keyless records cannot advance the cursor;
                // stopping avoids fetching the same page forever.
                tracing::warn!("full page without usable keys; stopping pagination");
                break;
            }
        }
    }

    ParentSet {
        parents,
        complete: true,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::response::FieldSet;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves scripted listing pages; other verbs are unused here.
    struct PageScript {
        pages: Mutex<Vec<Result<Vec<FieldSet>>>>,
        calls: AtomicUsize,
        cursors: Mutex<Vec<String>>,
    }

    impl PageScript {
        fn new(pages: Vec<Result<Vec<FieldSet>>>) -> Self {
            Self {
                pages: Mutex::new(pages),
                calls: AtomicUsize::new(0),
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RecordFetcher for PageScript {
        async fn list_page(&self, _filters: &QueryParams, cursor: &str) -> Result<Vec<FieldSet>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.cursors.lock().unwrap().push(cursor.to_string());
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                Ok(Vec::new())
            } else {
                pages.remove(0)
            }
        }

        async fn children(&self, _parent_key: &str) -> Result<Vec<FieldSet>> {
            unimplemented!("not used by pagination tests")
        }

        async fn grandchildren(&self, _parent_key: &str, _line_no: &str) -> Result<Vec<FieldSet>> {
            unimplemented!("not used by pagination tests")
        }
    }

    fn page(keys: &[&str]) -> Vec<FieldSet> {
        keys.iter()
            .map(|k| FieldSet::from_pairs([("order_number", *k)]))
            .collect()
    }

    fn keys(set: &ParentSet) -> Vec<&str> {
        set.parents.iter().map(|p| p.key.as_str()).collect()
    }

    #[tokio::test]
    async fn short_page_terminates_the_walk() {
        let script = PageScript::new(vec![Ok(page(&["A", "B", "C"]))]);
        let set = list_parents(&script, &CollectionSpec::orders(), &QueryParams::new(), 100).await;

        assert!(set.complete);
        assert_eq!(keys(&set), vec!["A", "B", "C"]);
        assert_eq!(script.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn full_pages_advance_the_cursor_to_the_last_key() {
        let script = PageScript::new(vec![
            Ok(page(&["A", "B", "C"])),
            Ok(page(&["D", "E", "F"])),
            Ok(page(&["G"])),
        ]);
        let set = list_parents(&script, &CollectionSpec::orders(), &QueryParams::new(), 3).await;

        assert!(set.complete);
        assert_eq!(keys(&set), vec!["A", "B", "C", "D", "E", "F", "G"]);
        assert_eq!(
            *script.cursors.lock().unwrap(),
            vec!["".to_string(), "C".to_string(), "F".to_string()]
        );
    }

    #[tokio::test]
    async fn empty_page_terminates_the_walk() {
        let script = PageScript::new(vec![Ok(page(&["A", "B"])), Ok(Vec::new())]);
        let set = list_parents(&script, &CollectionSpec::orders(), &QueryParams::new(), 2).await;

        assert!(set.complete);
        assert_eq!(keys(&set), vec!["A", "B"]);
        assert_eq!(script.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exact_multiple_of_page_size_costs_one_extra_empty_fetch() {
        // True last page holds exactly page_size records; the walk cannot
        // know that and pays one extra request that comes back empty.
        let script = PageScript::new(vec![Ok(page(&["A", "B", "C"])), Ok(Vec::new())]);
        let set = list_parents(&script, &CollectionSpec::orders(), &QueryParams::new(), 3).await;

        assert!(set.complete);
        assert_eq!(keys(&set), vec!["A", "B", "C"]);
        assert_eq!(
            script.calls.load(Ordering::SeqCst),
            2,
            "one data page plus one empty terminal page"
        );
    }

    #[tokio::test]
    async fn terminal_failure_returns_partial_set_with_complete_false() {
        let script = PageScript::new(vec![
            Ok(page(&["A", "B"])),
            Err(Error::Status {
                endpoint: "list".into(),
                code: 404,
                body: String::new(),
            }),
        ]);
        let set = list_parents(&script, &CollectionSpec::orders(), &QueryParams::new(), 2).await;

        assert!(!set.complete);
        assert_eq!(keys(&set), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn failure_on_the_first_page_yields_an_empty_incomplete_set() {
        let script = PageScript::new(vec![Err(Error::Parse("garbage".into()))]);
        let set = list_parents(&script, &CollectionSpec::orders(), &QueryParams::new(), 100).await;

        assert!(!set.complete);
        assert!(set.parents.is_empty());
    }

    #[tokio::test]
    async fn duplicate_keys_resolve_last_write_wins_in_place() {
        let first = vec![
            FieldSet::from_pairs([("order_number", "A"), ("status", "1")]),
            FieldSet::from_pairs([("order_number", "B"), ("status", "1")]),
        ];
        let second = vec![
            FieldSet::from_pairs([("order_number", "A"), ("status", "9")]),
            FieldSet::from_pairs([("order_number", "C"), ("status", "1")]),
        ];
        let script = PageScript::new(vec![Ok(first), Ok(second)]);
        let set = list_parents(&script, &CollectionSpec::orders(), &QueryParams::new(), 2).await;

        assert_eq!(keys(&set), vec!["A", "B", "C"]);
        assert_eq!(
            set.parents[0].fields.get("status"),
            Some("9"),
            "newer copy replaces the older one in its original slot"
        );
    }

    #[tokio::test]
    async fn keyless_records_are_skipped() {
        let records = vec![
            FieldSet::from_pairs([("order_number", "A")]),
            FieldSet::from_pairs([("status", "1")]),
            FieldSet::from_pairs([("order_number", "  ")]),
        ];
        let script = PageScript::new(vec![Ok(records)]);
        let set = list_parents(&script, &CollectionSpec::orders(), &QueryParams::new(), 100).await;

        assert_eq!(keys(&set), vec!["A"]);
    }
}
