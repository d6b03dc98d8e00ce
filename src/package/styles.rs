//! Style definitions (`word/styles.xml`).

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::STYLES_PART;
use crate::error::{Error, Result};
use crate::model::DEFAULT_PARAGRAPH_STYLE;

/// Maps style identifiers to style names.
#[derive(Debug, Clone, Default)]
pub(crate) struct StyleMap {
    names: HashMap<String, String>,
    default_paragraph: Option<String>,
}

impl StyleMap {
    /// Parse a styles part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut map = StyleMap::default();
        let mut reader = Reader::from_str(xml);

        // (id, is paragraph style, is default, name)
        let mut current: Option<(String, bool, bool, Option<String>)> = None;

        loop {
            match reader.read_event().map_err(|e| Error::xml(STYLES_PART, e))? {
                Event::Start(e) if e.local_name().as_ref() == b"style" => {
                    let id = attribute(&e, b"styleId")?.unwrap_or_default();
                    let paragraph = attribute(&e, b"type")?.as_deref() == Some("paragraph");
                    let default = matches!(
                        attribute(&e, b"default")?.as_deref(),
                        Some("1") | Some("true") | Some("on")
                    );
                    current = Some((id, paragraph, default, None));
                }
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"name" => {
                    if let Some(style) = current.as_mut() {
                        style.3 = attribute(&e, b"val")?;
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"style" => {
                    if let Some((id, paragraph, default, name)) = current.take() {
                        let name = ui_style_name(name.as_deref().unwrap_or(&id));
                        if paragraph && default {
                            map.default_paragraph = Some(name.clone());
                        }
                        map.names.insert(id, name);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        log::debug!("Parsed {} style definitions", map.names.len());
        Ok(map)
    }

    /// Style name for an identifier; unknown identifiers name themselves.
    pub fn name_for(&self, id: &str) -> String {
        self.names
            .get(id)
            .cloned()
            .unwrap_or_else(|| ui_style_name(id))
    }

    /// Name of the style used by paragraphs without an explicit style.
    pub fn default_paragraph(&self) -> String {
        self.default_paragraph
            .clone()
            .unwrap_or_else(|| DEFAULT_PARAGRAPH_STYLE.to_string())
    }
}

/// Built-in styles are stored with lowercase names ("heading 1") but shown
/// in title case ("Heading 1"); configured heading names use the latter.
fn ui_style_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let builtin = matches!(lower.as_str(), "normal" | "title" | "subtitle" | "caption")
        || lower
            .strip_prefix("heading ")
            .is_some_and(|n| n.len() == 1 && n.chars().all(|c| c.is_ascii_digit()));

    if builtin && name.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    } else {
        name.to_string()
    }
}

/// Read an attribute by local name, ignoring the namespace prefix.
pub(crate) fn attribute(element: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| Error::xml("attribute", e))?;
        if attr.key.local_name().as_ref() == local {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::xml("attribute", e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
