//! Parsing of the main document part into blocks.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::styles::attribute;
use super::{StyleMap, DOCUMENT_PART};
use crate::error::{Error, Result};
use crate::model::{
    Block, CellFormat, OpaqueBlock, Paragraph, ParagraphFormat, SourceXml, Table, TableCell,
    TableRow,
};

/// Result of parsing `word/document.xml`.
#[derive(Debug)]
pub(crate) struct ParsedBody {
    pub head: String,
    pub blocks: Vec<Block>,
    pub section_properties: Option<String>,
    pub tail: String,
}

type XmlReader<'a> = Reader<&'a [u8]>;

fn position(reader: &XmlReader<'_>) -> usize {
    reader.buffer_position() as usize
}

/// Offset of the `<` opening the next element, given the reader position
/// before the event was read.
fn element_start(reader: &XmlReader<'_>, xml: &str) -> usize {
    let pos = position(reader);
    let bytes = xml.as_bytes();
    if bytes.get(pos) != Some(&b'<') && pos > 0 && bytes.get(pos - 1) == Some(&b'<') {
        pos - 1
    } else {
        pos
    }
}

fn slice(xml: &str, start: usize, end: usize) -> Result<&str> {
    xml.get(start..end).ok_or_else(|| {
        Error::Corrupted(format!("invalid element span {}..{} in {}", start, end, DOCUMENT_PART))
    })
}

fn next_event<'a>(reader: &mut XmlReader<'a>) -> Result<Event<'a>> {
    reader.read_event().map_err(|e| Error::xml(DOCUMENT_PART, e))
}

/// Skip to the end of `element`, returning its raw markup.
fn capture<'x>(
    reader: &mut XmlReader<'_>,
    xml: &'x str,
    start: usize,
    element: &BytesStart<'_>,
) -> Result<&'x str> {
    reader
        .read_to_end(element.name())
        .map_err(|e| Error::xml(DOCUMENT_PART, e))?;
    slice(xml, start, position(reader))
}

/// Parse the main document part.
pub(crate) fn parse_body(xml: &str, styles: &StyleMap) -> Result<ParsedBody> {
    let mut reader = Reader::from_str(xml);

    let head_end = loop {
        match next_event(&mut reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"body" => break position(&reader),
            Event::Empty(e) if e.local_name().as_ref() == b"body" => {
                let head_end = position(&reader);
                return Ok(ParsedBody {
                    head: format!("{}>", slice(xml, 0, head_end - 2)?),
                    blocks: Vec::new(),
                    section_properties: None,
                    tail: format!("</w:body>{}", slice(xml, head_end, xml.len())?),
                });
            }
            Event::Eof => return Err(Error::MissingPart("w:body".to_string())),
            _ => {}
        }
    };

    let mut blocks = Vec::new();
    let mut section_properties = None;

    let tail_start = loop {
        let start = element_start(&reader, xml);
        match next_event(&mut reader)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => blocks.push(Block::Paragraph(read_paragraph(
                    &mut reader,
                    xml,
                    start,
                    styles,
                )?)),
                b"tbl" => blocks.push(Block::Table(read_table(&mut reader, xml, start, styles)?)),
                b"sectPr" => {
                    section_properties = Some(capture(&mut reader, xml, start, &e)?.to_string());
                }
                other => {
                    let element = String::from_utf8_lossy(other).into_owned();
                    let raw = capture(&mut reader, xml, start, &e)?;
                    log::debug!("Keeping unmodelled body element <{}>", element);
                    blocks.push(Block::Opaque(OpaqueBlock::new(element, raw)));
                }
            },
            Event::Empty(e) => {
                let raw = slice(xml, start, position(&reader))?;
                match e.local_name().as_ref() {
                    b"p" => blocks.push(Block::Paragraph(Paragraph::from_parts(
                        String::new(),
                        styles.default_paragraph(),
                        None,
                        ParagraphFormat {
                            source: Some(SourceXml::new(raw, "")),
                            ..ParagraphFormat::default()
                        },
                    ))),
                    b"sectPr" => section_properties = Some(raw.to_string()),
                    other => blocks.push(Block::Opaque(OpaqueBlock::new(
                        String::from_utf8_lossy(other),
                        raw,
                    ))),
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"body" => break start,
            Event::Eof => return Err(Error::xml(DOCUMENT_PART, "unterminated w:body")),
            _ => {}
        }
    };

    Ok(ParsedBody {
        head: slice(xml, 0, head_end)?.to_string(),
        blocks,
        section_properties,
        tail: slice(xml, tail_start, xml.len())?.to_string(),
    })
}

/// Read a paragraph whose start tag began at `start`.
fn read_paragraph(
    reader: &mut XmlReader<'_>,
    xml: &str,
    start: usize,
    styles: &StyleMap,
) -> Result<Paragraph> {
    let mut text = String::new();
    let mut style_id = None;
    let mut properties = None;
    let mut run_properties = None;
    let mut in_text = false;
    let mut depth = 1usize;

    loop {
        let event_start = element_start(reader, xml);
        match next_event(reader)? {
            Event::Start(e) => {
                match e.local_name().as_ref() {
                    b"pPr" if depth == 1 => {
                        let raw = capture(reader, xml, event_start, &e)?;
                        style_id = paragraph_style(raw)?;
                        properties = Some(raw.to_string());
                        continue;
                    }
                    b"rPr" if depth == 2 => {
                        let raw = capture(reader, xml, event_start, &e)?;
                        run_properties.get_or_insert_with(|| raw.to_string());
                        continue;
                    }
                    b"t" => in_text = true,
                    _ => {}
                }
                depth += 1;
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                b"pPr" if depth == 1 => {
                    properties = Some(slice(xml, event_start, position(reader))?.to_string());
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                let value = t.unescape().map_err(|e| Error::xml(DOCUMENT_PART, e))?;
                text.push_str(&value);
            }
            Event::CData(c) if in_text => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = false;
                }
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => return Err(Error::xml(DOCUMENT_PART, "unterminated w:p")),
            _ => {}
        }
    }

    let raw = slice(xml, start, position(reader))?;
    let style = match style_id.as_deref() {
        Some(id) => styles.name_for(id),
        None => styles.default_paragraph(),
    };
    let format = ParagraphFormat {
        source: Some(SourceXml::new(raw, text.as_str())),
        properties,
        run_properties,
    };

    Ok(Paragraph::from_parts(text, style, style_id, format))
}

/// Style identifier named by a raw `w:pPr` element.
fn paragraph_style(properties: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(properties);
    loop {
        match next_event(&mut reader)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"pStyle" => {
                return attribute(&e, b"val");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Read a table whose start tag began at `start`.
fn read_table(
    reader: &mut XmlReader<'_>,
    xml: &str,
    start: usize,
    styles: &StyleMap,
) -> Result<Table> {
    let mut table = Table::new();
    let mut properties = String::new();

    loop {
        let event_start = element_start(reader, xml);
        match next_event(reader)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tblPr" | b"tblGrid" => {
                    properties.push_str(capture(reader, xml, event_start, &e)?);
                }
                b"tr" => table.add_row(read_row(reader, xml, styles)?),
                _ => {
                    capture(reader, xml, event_start, &e)?;
                }
            },
            Event::Empty(e) if matches!(e.local_name().as_ref(), b"tblPr" | b"tblGrid") => {
                properties.push_str(slice(xml, event_start, position(reader))?);
            }
            Event::End(e) if e.local_name().as_ref() == b"tbl" => break,
            Event::Eof => return Err(Error::xml(DOCUMENT_PART, "unterminated w:tbl")),
            _ => {}
        }
    }

    if !properties.is_empty() {
        table.properties = Some(properties);
    }
    let raw = slice(xml, start, position(reader))?;
    table.source = Some(SourceXml::new(raw, table.fingerprint()));
    Ok(table)
}

fn read_row(reader: &mut XmlReader<'_>, xml: &str, styles: &StyleMap) -> Result<TableRow> {
    let mut row = TableRow::default();

    loop {
        let event_start = element_start(reader, xml);
        match next_event(reader)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"trPr" => row.properties = Some(capture(reader, xml, event_start, &e)?.to_string()),
                b"tc" => row.cells.push(read_cell(reader, xml, event_start, styles)?),
                _ => {
                    capture(reader, xml, event_start, &e)?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"trPr" => row.properties = Some(slice(xml, event_start, position(reader))?.to_string()),
                b"tc" => {
                    let mut cell = TableCell::empty();
                    cell.format.source = Some(SourceXml::new(
                        slice(xml, event_start, position(reader))?,
                        "",
                    ));
                    row.cells.push(cell);
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"tr" => break,
            Event::Eof => return Err(Error::xml(DOCUMENT_PART, "unterminated w:tr")),
            _ => {}
        }
    }

    Ok(row)
}

fn read_cell(
    reader: &mut XmlReader<'_>,
    xml: &str,
    start: usize,
    styles: &StyleMap,
) -> Result<TableCell> {
    let mut lines: Vec<String> = Vec::new();
    let mut format = CellFormat::default();

    loop {
        let event_start = element_start(reader, xml);
        match next_event(reader)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tcPr" => format.properties = Some(capture(reader, xml, event_start, &e)?.to_string()),
                b"p" => {
                    let paragraph = read_paragraph(reader, xml, event_start, styles)?;
                    if lines.is_empty() {
                        format.paragraph_properties = paragraph.format.properties.clone();
                        format.run_properties = paragraph.format.run_properties.clone();
                    }
                    lines.push(paragraph.text);
                }
                b"tbl" => {
                    log::debug!("Nested table inside a cell is not modelled");
                    capture(reader, xml, event_start, &e)?;
                }
                _ => {
                    capture(reader, xml, event_start, &e)?;
                }
            },
            Event::Empty(e) if e.local_name().as_ref() == b"p" => lines.push(String::new()),
            Event::Empty(e) if e.local_name().as_ref() == b"tcPr" => {
                format.properties = Some(slice(xml, event_start, position(reader))?.to_string());
            }
            Event::End(e) if e.local_name().as_ref() == b"tc" => break,
            Event::Eof => return Err(Error::xml(DOCUMENT_PART, "unterminated w:tc")),
            _ => {}
        }
    }

    let text = lines.join("\n");
    format.source = Some(SourceXml::new(slice(xml, start, position(reader))?, text.as_str()));
    Ok(TableCell { text, format })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Overview</w:t></w:r></w:p><w:p><w:pPr><w:pStyle w:val="BodyText"/><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Fish &amp; </w:t></w:r><w:r><w:tab/><w:t>chips</w:t></w:r></w:p><w:p/><w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid><w:gridCol w:w="100"/></w:tblGrid><w:tr><w:tc><w:tcPr><w:tcW w:w="100"/></w:tcPr><w:p><w:r><w:t>Total</w:t></w:r></w:p><w:p><w:r><w:t>line two</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr></w:tbl><w:bookmarkStart w:id="0" w:name="x"/><w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#;

    #[test]
    fn test_parse_body_blocks() {
        let styles = StyleMap::default();
        let body = parse_body(DOCUMENT, &styles).unwrap();

        assert_eq!(body.blocks.len(), 5);
        assert!(body.head.ends_with("<w:body>"));
        assert!(body.tail.starts_with("</w:body>"));
        assert!(body
            .section_properties
            .as_deref()
            .is_some_and(|s| s.starts_with("<w:sectPr>")));

        let heading = body.blocks[0].as_paragraph().unwrap();
        assert_eq!(heading.text, "Overview");
        assert_eq!(heading.style(), "Heading1");
        assert!(!heading.is_modified());

        let body_text = body.blocks[1].as_paragraph().unwrap();
        assert_eq!(body_text.text, "Fish & \tchips");
        assert_eq!(body_text.format.run_properties.as_deref(), Some("<w:rPr><w:b/></w:rPr>"));

        let empty = body.blocks[2].as_paragraph().unwrap();
        assert_eq!(empty.text, "");
        assert_eq!(empty.style(), "Normal");

        let table = body.blocks[3].as_table().unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell_text(0, 0), Some("Total\nline two"));
        assert_eq!(table.cell_text(0, 1), Some(""));
        assert!(!table.is_modified());

        assert!(matches!(&body.blocks[4], Block::Opaque(o) if o.element == "bookmarkStart"));
    }

    #[test]
    fn test_paragraph_source_is_exact() {
        let body = parse_body(DOCUMENT, &StyleMap::default()).unwrap();
        let heading = body.blocks[0].as_paragraph().unwrap();
        let source = heading.format.source.as_ref().unwrap();
        assert_eq!(
            source.xml,
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Overview</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_missing_body() {
        let result = parse_body("<w:document></w:document>", &StyleMap::default());
        assert!(matches!(result, Err(Error::MissingPart(_))));
    }
}
