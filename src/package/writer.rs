//! DOCX package writer.

use std::io::{Cursor, Write};
use std::path::Path;

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{Package, PackagePart, DOCUMENT_PART};
use crate::error::Result;
use crate::model::{Block, Document, Paragraph, Table, TableCell, DEFAULT_PARAGRAPH_STYLE};

const DOCUMENT_HEAD: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>"#
);

const DOCUMENT_TAIL: &str = "</w:body></w:document>";

const SECTION_PROPERTIES: &str = concat!(
    r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/>"#,
    r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" "#,
    r#"w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#
);

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    r#"</Types>"#
);

const ROOT_RELATIONSHIPS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#
);

const DOCUMENT_RELATIONSHIPS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    r#"</Relationships>"#
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>"#,
    r#"<w:pPr><w:keepNext/><w:spacing w:before="480" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>"#,
    r#"<w:pPr><w:keepNext/><w:spacing w:before="360" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>"#,
    r#"<w:pPr><w:keepNext/><w:spacing w:before="280" w:after="80"/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style>"#,
    r#"</w:styles>"#
);

/// Serialize a document into DOCX bytes.
///
/// Documents read from a package reuse every original part; documents built
/// in memory get a minimal package skeleton.
pub fn to_bytes(doc: &Document) -> Result<Vec<u8>> {
    let skeleton;
    let package = match &doc.package {
        Some(package) => package,
        None => {
            skeleton = skeleton_package();
            &skeleton
        }
    };

    let document_xml = render_document_xml(doc, package);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for part in &package.parts {
        if part.is_dir {
            zip.add_directory(part.name.as_str(), options)?;
            continue;
        }
        zip.start_file(part.name.as_str(), options)?;
        if part.name == DOCUMENT_PART {
            zip.write_all(document_xml.as_bytes())?;
        } else {
            zip.write_all(&part.data)?;
        }
    }

    Ok(zip.finish()?.into_inner())
}

/// Write a document to a DOCX file, creating parent directories.
pub fn save<P: AsRef<Path>>(doc: &Document, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    log::info!("Saving document to: {}", path.display());
    let bytes = to_bytes(doc)?;
    std::fs::write(path, bytes)?;
    log::info!("Document saved successfully");
    Ok(())
}

/// Write a document to a DOCX file, reporting failure as `false`.
pub fn save_document<P: AsRef<Path>>(doc: &Document, path: P) -> bool {
    match save(doc, path.as_ref()) {
        Ok(()) => true,
        Err(e) => {
            log::error!("Failed to save document {}: {}", path.as_ref().display(), e);
            false
        }
    }
}

fn skeleton_package() -> Package {
    let part = |name: &str, data: &str| PackagePart {
        name: name.to_string(),
        data: data.as_bytes().to_vec(),
        is_dir: false,
    };

    Package {
        parts: vec![
            part("[Content_Types].xml", CONTENT_TYPES),
            part("_rels/.rels", ROOT_RELATIONSHIPS),
            part(DOCUMENT_PART, ""),
            part("word/_rels/document.xml.rels", DOCUMENT_RELATIONSHIPS),
            part("word/styles.xml", STYLES),
        ],
        document_head: DOCUMENT_HEAD.to_string(),
        document_tail: DOCUMENT_TAIL.to_string(),
        section_properties: Some(SECTION_PROPERTIES.to_string()),
    }
}

fn render_document_xml(doc: &Document, package: &Package) -> String {
    let mut out = String::with_capacity(package.document_head.len() + doc.block_count() * 128);
    out.push_str(&package.document_head);

    for block in doc.blocks() {
        match block {
            Block::Paragraph(p) => write_paragraph(&mut out, p),
            Block::Table(t) => write_table(&mut out, t),
            Block::Opaque(o) => out.push_str(&o.xml),
        }
    }

    if let Some(ref sect) = package.section_properties {
        out.push_str(sect);
    }
    out.push_str(&package.document_tail);
    out
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph) {
    if let Some(source) = paragraph
        .format
        .source
        .as_ref()
        .filter(|s| s.matches(&paragraph.text))
    {
        out.push_str(&source.xml);
        return;
    }

    let properties = match paragraph.format.properties {
        Some(ref props) => props.clone(),
        None => {
            let id = paragraph.style_id();
            if id.is_empty() || id == DEFAULT_PARAGRAPH_STYLE {
                String::new()
            } else {
                format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, escape(id.as_str()))
            }
        }
    };

    write_paragraph_markup(
        out,
        &paragraph.text,
        &properties,
        paragraph.format.run_properties.as_deref(),
    );
}

/// Emit a `w:p` carrying `text` in a single run; tabs and line breaks become
/// their run-level elements.
fn write_paragraph_markup(out: &mut String, text: &str, properties: &str, run_properties: Option<&str>) {
    out.push_str("<w:p>");
    out.push_str(properties);

    if !text.is_empty() {
        out.push_str("<w:r>");
        if let Some(rpr) = run_properties {
            out.push_str(rpr);
        }
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                out.push_str("<w:br/>");
            }
            for (j, piece) in line.split('\t').enumerate() {
                if j > 0 {
                    out.push_str("<w:tab/>");
                }
                if !piece.is_empty() {
                    out.push_str(r#"<w:t xml:space="preserve">"#);
                    out.push_str(&escape(piece));
                    out.push_str("</w:t>");
                }
            }
        }
        out.push_str("</w:r>");
    }

    out.push_str("</w:p>");
}

fn write_table(out: &mut String, table: &Table) {
    if let Some(source) = table.source.as_ref() {
        if !table.is_modified() {
            out.push_str(&source.xml);
            return;
        }
    }

    out.push_str("<w:tbl>");
    match table.properties {
        Some(ref props) => out.push_str(props),
        None => {
            out.push_str(r#"<w:tblPr><w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid>"#);
            for _ in 0..table.column_count() {
                out.push_str(r#"<w:gridCol w:w="2000"/>"#);
            }
            out.push_str("</w:tblGrid>");
        }
    }

    for row in &table.rows {
        out.push_str("<w:tr>");
        if let Some(ref props) = row.properties {
            out.push_str(props);
        }
        for cell in &row.cells {
            write_cell(out, cell);
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

fn write_cell(out: &mut String, cell: &TableCell) {
    if let Some(source) = cell.format.source.as_ref().filter(|s| s.matches(&cell.text)) {
        out.push_str(&source.xml);
        return;
    }

    out.push_str("<w:tc>");
    out.push_str(
        cell.format
            .properties
            .as_deref()
            .unwrap_or(r#"<w:tcPr><w:tcW w:w="0" w:type="auto"/></w:tcPr>"#),
    );
    let properties = cell.format.paragraph_properties.as_deref().unwrap_or("");
    for line in cell.text.split('\n') {
        write_paragraph_markup(out, line, properties, cell.format.run_properties.as_deref());
    }
    out.push_str("</w:tc>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Table};
    use crate::package::DocxReader;

    #[test]
    fn test_write_paragraph_markup_escapes() {
        let mut out = String::new();
        write_paragraph_markup(&mut out, "a < b\tc\nd", "", None);
        assert_eq!(
            out,
            concat!(
                r#"<w:p><w:r><w:t xml:space="preserve">a &lt; b</w:t><w:tab/>"#,
                r#"<w:t xml:space="preserve">c</w:t><w:br/><w:t xml:space="preserve">d</w:t></w:r></w:p>"#
            )
        );
    }

    #[test]
    fn test_heading_gets_style_reference() {
        let mut out = String::new();
        write_paragraph(&mut out, &Paragraph::heading("Intro", 1));
        assert!(out.starts_with(r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>"#));

        let mut out = String::new();
        write_paragraph(&mut out, &Paragraph::with_text("plain"));
        assert!(out.starts_with("<w:p><w:r>"));
    }

    #[test]
    fn test_restyled_paragraph_survives_save() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("Hello"));
        let mut loaded = DocxReader::from_bytes(&to_bytes(&doc).unwrap())
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(loaded.paragraph(0).map(|p| p.style()), Some("Normal"));

        if let Some(p) = loaded.paragraph_mut(0) {
            p.set_style("Quote");
        }
        let reloaded = DocxReader::from_bytes(&to_bytes(&loaded).unwrap())
            .unwrap()
            .parse()
            .unwrap();

        let paragraph = reloaded.paragraph(0).unwrap();
        assert_eq!(paragraph.text, "Hello");
        assert_eq!(paragraph.style(), "Quote");
    }

    #[test]
    fn test_in_memory_document_round_trip() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::heading("Budget", 1));
        doc.add_paragraph(Paragraph::with_text("{{SECTION_CONTENT}}"));
        doc.add_table(Table::from_rows(vec![vec!["Total", "1", "2", ""]]));

        let bytes = to_bytes(&doc).unwrap();
        let parsed = DocxReader::from_bytes(&bytes).unwrap().parse().unwrap();

        assert_eq!(parsed.paragraph_count(), 2);
        assert_eq!(parsed.paragraph(0).map(|p| p.style()), Some("Heading 1"));
        assert_eq!(parsed.paragraph(1).map(|p| p.style()), Some("Normal"));
        let table = parsed.tables().next().unwrap();
        assert_eq!(table.cell_text(0, 2), Some("2"));
        assert_eq!(table.cell_text(0, 3), Some(""));
    }
}
