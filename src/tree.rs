//! Typed record tree and document rendering
//!
//! Subtrees are built bottom-up during fan-out and attached exactly once;
//! nothing is mutated after attachment. The document's top-level order is
//! the pagination discovery order, independent of task completion order.

use crate::config::{CollectionSpec, FailedParentPolicy};
use crate::error::{Error, Result};
use crate::response::FieldSet;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Top-level record enumerated by the paginator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentRecord {
    /// Unique listing key (also the pagination cursor value)
    pub key: String,
    /// Opaque field values from the listing response
    pub fields: FieldSet,
}

/// One child record with its optionally attached grandchildren
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildRecord {
    /// Line/sequence number unique within the parent, when present
    pub line_no: Option<String>,
    /// Opaque field values from the detail response
    pub fields: FieldSet,
    /// Attached grandchild records; empty when not expanded
    pub expansions: Vec<FieldSet>,
}

/// Per-parent processing result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every fetch for this parent succeeded
    Complete,
    /// The parent and some children resolved, but at least one expansion fetch failed
    Partial,
    /// The parent-level detail fetch failed; the node carries no children
    Failed,
}

/// Fully assembled subtree for one parent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentNode {
    /// Unique listing key
    pub key: String,
    /// Listing fields, retained for callers that post-process the tree
    pub fields: FieldSet,
    /// Child records in detail-response order
    pub children: Vec<ChildRecord>,
    /// How processing of this parent ended
    pub outcome: Outcome,
}

/// Job-level outcome counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Parents whose every fetch succeeded
    pub complete: usize,
    /// Parents with at least one failed expansion fetch
    pub partial: usize,
    /// Parents whose detail fetch failed
    pub failed: usize,
}

impl Summary {
    /// Total number of parents processed
    pub fn total(&self) -> usize {
        self.complete + self.partial + self.failed
    }
}

/// Root container holding one subtree per processed parent
///
/// Built incrementally by the fan-out layer but only handed out once every
/// parent task has completed; there is no streaming partial document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputDocument {
    /// Parent subtrees in pagination discovery order
    pub parents: Vec<ParentNode>,
}

impl OutputDocument {
    /// Count per-parent outcomes
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for parent in &self.parents {
            match parent.outcome {
                Outcome::Complete => summary.complete += 1,
                Outcome::Partial => summary.partial += 1,
                Outcome::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Serialize the document to XML
    ///
    /// Parents render in stored order. A `Failed` parent renders as a
    /// header-only element or is skipped, per `policy`; the summary is not
    /// affected by rendering choices.
    pub fn to_xml(&self, spec: &CollectionSpec, policy: FailedParentPolicy) -> Result<String> {
        let mut writer = Writer::new(Vec::new());

        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        write_event(
            &mut writer,
            Event::Start(BytesStart::new(spec.root_tag.as_str())),
        )?;

        for parent in &self.parents {
            if parent.outcome == Outcome::Failed && policy == FailedParentPolicy::Omit {
                continue;
            }
            let mut element = BytesStart::new(spec.parent_tag.as_str());
            element.push_attribute((spec.key_field.as_str(), parent.key.as_str()));
            write_event(&mut writer, Event::Start(element))?;

            for child in &parent.children {
                write_event(
                    &mut writer,
                    Event::Start(BytesStart::new(spec.child_tag.as_str())),
                )?;
                write_fields(&mut writer, &child.fields)?;

                if !child.expansions.is_empty() {
                    write_event(
                        &mut writer,
                        Event::Start(BytesStart::new(spec.expansion_list_tag.as_str())),
                    )?;
                    for expansion in &child.expansions {
                        write_event(
                            &mut writer,
                            Event::Start(BytesStart::new(spec.expansion_tag.as_str())),
                        )?;
                        write_fields(&mut writer, expansion)?;
                        write_event(
                            &mut writer,
                            Event::End(BytesEnd::new(spec.expansion_tag.as_str())),
                        )?;
                    }
                    write_event(
                        &mut writer,
                        Event::End(BytesEnd::new(spec.expansion_list_tag.as_str())),
                    )?;
                }

                write_event(
                    &mut writer,
                    Event::End(BytesEnd::new(spec.child_tag.as_str())),
                )?;
            }

            write_event(
                &mut writer,
                Event::End(BytesEnd::new(spec.parent_tag.as_str())),
            )?;
        }

        write_event(
            &mut writer,
            Event::End(BytesEnd::new(spec.root_tag.as_str())),
        )?;

        String::from_utf8(writer.into_inner()).map_err(|e| Error::Render(e.to_string()))
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Render(e.to_string()))
}

fn write_fields(writer: &mut Writer<Vec<u8>>, fields: &FieldSet) -> Result<()> {
    for field in fields.fields() {
        write_event(writer, Event::Start(BytesStart::new(field.name.as_str())))?;
        write_event(writer, Event::Text(BytesText::new(field.value.as_str())))?;
        write_event(writer, Event::End(BytesEnd::new(field.name.as_str())))?;
    }
    Ok(())
}
