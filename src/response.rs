//! Response body parsing
//!
//! The remote API wraps every record in a `<Result>` element whose direct
//! children are flat `name → value` fields. This module pulls those records
//! out of a body and nothing more; designated-field interpretation happens in
//! the pagination and fan-out layers.

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Element name wrapping one record in an API response
const RECORD_TAG: &str = "Result";

/// One named field of a record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// Field element name
    pub name: String,
    /// Raw text content (untrimmed)
    pub value: String,
}

/// Ordered set of opaque field values belonging to one record
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<Field>,
}

impl FieldSet {
    /// Build a field set from name/value pairs (mainly for tests and fakes)
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut set = Self::default();
        for (name, value) in pairs {
            set.push(name, value);
        }
        set
    }

    /// Append a field, keeping insertion order
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
        });
    }

    /// First value for `name`, trimmed
    ///
    /// Blank values come back as `Some("")`; use [`FieldSet::get_non_empty`]
    /// to skip them.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.trim())
    }

    /// First non-blank value for `name`, trimmed
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// All fields in insertion order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record carries no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

/// Extract every `<Result>` record from a response body
///
/// Records may sit at any depth under the response root. Only the direct
/// children of a record become fields; text inside nested elements is
/// flattened into the enclosing field value. A body without any XML content
/// is a parse error, while a well-formed response with zero records yields an
/// empty vec (the paginator's end-of-data signal).
pub fn parse_records(body: &str) -> Result<Vec<FieldSet>> {
    let mut reader = Reader::from_str(body);
    let mut records: Vec<FieldSet> = Vec::new();
    let mut current: Option<FieldSet> = None;
    let mut field: Option<(String, String)> = None;
    let mut depth_in_record: u32 = 0;
    let mut saw_element = false;

    loop {
        match reader.read_event() {
            Err(e) => {
                return Err(Error::Parse(format!(
                    "XML error at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => {
                saw_element = true;
                if current.is_none() {
                    if element_name(&start) == RECORD_TAG {
                        current = Some(FieldSet::default());
                        depth_in_record = 0;
                    }
                } else {
                    depth_in_record += 1;
                    if depth_in_record == 1 {
                        field = Some((element_name(&start), String::new()));
                    }
                }
            }
            Ok(Event::Empty(start)) => {
                saw_element = true;
                if depth_in_record == 0
                    && let Some(record) = current.as_mut()
                {
                    record.push(element_name(&start), "");
                }
            }
            Ok(Event::Text(text)) => {
                if let Some((_, value)) = field.as_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| Error::Parse(format!("bad text content: {e}")))?;
                    value.push_str(&unescaped);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if current.is_some() {
                    if depth_in_record == 0 {
                        if let Some(record) = current.take() {
                            records.push(record);
                        }
                    } else {
                        if depth_in_record == 1
                            && let Some((name, value)) = field.take()
                            && let Some(record) = current.as_mut()
                        {
                            record.push(name, value);
                        }
                        depth_in_record -= 1;
                    }
                }
            }
            Ok(_) => {}
        }
    }

    if current.is_some() {
        return Err(Error::Parse("unterminated record element".into()));
    }
    if !saw_element {
        return Err(Error::Parse("response body contains no XML content".into()));
    }
    Ok(records)
}
