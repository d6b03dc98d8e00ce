//! Core document properties (`docProps/core.xml`).

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::CORE_PROPERTIES_PART;
use crate::error::{Error, Result};
use crate::model::Metadata;

/// Parse core properties into metadata.
pub(crate) fn parse_core_properties(xml: &str) -> Result<Metadata> {
    let mut metadata = Metadata::default();
    let mut reader = Reader::from_str(xml);
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| Error::xml(CORE_PROPERTIES_PART, e))?
        {
            Event::Start(e) => current = Some(e.local_name().as_ref().to_vec()),
            Event::End(_) => current = None,
            Event::Text(t) => {
                let Some(field) = current.as_deref() else {
                    continue;
                };
                let value = t
                    .unescape()
                    .map_err(|e| Error::xml(CORE_PROPERTIES_PART, e))?
                    .trim()
                    .to_string();
                if value.is_empty() {
                    continue;
                }
                match field {
                    b"title" => metadata.title = Some(value),
                    b"creator" => metadata.author = Some(value),
                    b"subject" => metadata.subject = Some(value),
                    b"keywords" => metadata.keywords = Some(value),
                    b"lastModifiedBy" => metadata.last_modified_by = Some(value),
                    b"created" => metadata.created = parse_w3c_date(&value),
                    b"modified" => metadata.modified = parse_w3c_date(&value),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(metadata)
}

/// Parse a W3CDTF timestamp (`2024-01-15T10:30:00Z`).
fn parse_w3c_date(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            log::debug!("Ignoring unparsable core property date '{}': {}", value, e);
            None
        }
    }
}
