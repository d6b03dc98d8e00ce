//! DOCX package reader.

use std::io::{Cursor, Read};
use std::path::Path;

use zip::ZipArchive;

use super::body::parse_body;
use super::core_props::parse_core_properties;
use super::{
    Package, PackagePart, StyleMap, CORE_PROPERTIES_PART, DOCUMENT_PART, STYLES_PART,
};
use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, Result};
use crate::model::{Document, Metadata};

/// DOCX package reader.
pub struct DocxReader {
    parts: Vec<PackagePart>,
}

impl DocxReader {
    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        detect_format_from_path(path)?;

        log::info!("Loading document: {}", path.display());
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Read a package from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        detect_format_from_bytes(data)?;

        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push(PackagePart {
                name: file.name().to_string(),
                is_dir: file.is_dir(),
                data,
            });
        }

        if !parts.iter().any(|p| p.name == DOCUMENT_PART) {
            return Err(Error::MissingPart(DOCUMENT_PART.to_string()));
        }

        Ok(Self { parts })
    }

    /// Read a package from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Names of all parts in the package.
    pub fn part_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Parse the package and return a structured Document.
    pub fn parse(&self) -> Result<Document> {
        let styles = match self.part_text(STYLES_PART)? {
            Some(xml) => StyleMap::parse(&xml)?,
            None => {
                log::debug!("Package has no styles part, using default style names");
                StyleMap::default()
            }
        };

        let metadata = match self.part_text(CORE_PROPERTIES_PART)? {
            Some(xml) => parse_core_properties(&xml).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable core properties: {}", e);
                Metadata::default()
            }),
            None => Metadata::default(),
        };

        let xml = self
            .part_text(DOCUMENT_PART)?
            .ok_or_else(|| Error::MissingPart(DOCUMENT_PART.to_string()))?;
        let body = parse_body(&xml, &styles)?;

        let package = Package {
            parts: self.parts.clone(),
            document_head: body.head,
            document_tail: body.tail,
            section_properties: body.section_properties,
        };
        let document = Document::from_parts(metadata, body.blocks, package);

        log::info!(
            "Document loaded successfully: {} paragraphs, {} tables",
            document.paragraph_count(),
            document.table_count()
        );
        Ok(document)
    }

    /// Part content decoded as UTF-8, without a byte order mark.
    fn part_text(&self, name: &str) -> Result<Option<String>> {
        let Some(part) = self.parts.iter().find(|p| p.name == name) else {
            return Ok(None);
        };
        let text = String::from_utf8(part.data.clone())
            .map_err(|e| Error::xml(name, format!("part is not UTF-8: {}", e)))?;
        Ok(Some(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        }))
    }
}
