//! End-to-end filling of in-memory documents.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::time::Duration;

use docfill::calculator::{extract_number, format_value};
use docfill::generate::generate_with_retry;
use docfill::inserter::split_into_paragraphs;
use docfill::sections::{section_context, sections_needing_content};
use docfill::{
    Docfill, Document, Error, GeneratedContent, GenerationRequest, Paragraph, RetryPolicy,
    SectionPromptBuilder, Table, TableCalculator, TableOptions,
};

const MARKER: &str = "{{SECTION_CONTENT}}";

fn proposal() -> Document {
    let mut doc = Document::new();
    doc.add_paragraph(Paragraph::new("Project Proposal", "Title"));
    doc.add_paragraph(Paragraph::heading("Introduction", 1));
    doc.add_paragraph(Paragraph::with_text("Why this project exists."));
    doc.add_paragraph(Paragraph::new(MARKER, "Body Text"));
    doc.add_paragraph(Paragraph::with_text("Reviewed by the board."));
    doc.add_paragraph(Paragraph::heading("Scope", 2));
    doc.add_paragraph(Paragraph::with_text("   "));
    doc.add_paragraph(Paragraph::with_text("What is included."));
    doc.add_paragraph(Paragraph::heading("Timeline", 2));
    doc.add_paragraph(Paragraph::new(MARKER, "Quote"));
    doc.add_table(Table::from_rows([
        ["Quarter", "Spend", "Share"],
        ["Q1", "1,000", "12.5%"],
        ["Q2", "3,000", "37.5%"],
        ["", "Total", "Total"],
    ]));
    doc.add_paragraph(Paragraph::heading("Risks", 3));
    doc
}

#[test]
fn test_one_section_per_heading() {
    let doc = proposal();
    let headings = doc
        .paragraphs()
        .filter(|(_, p)| p.style().starts_with("Heading"))
        .count();
    let sections = docfill::extract_sections(&doc);

    assert_eq!(sections.len(), headings);
    let outline: Vec<(&str, u32)> = sections.iter().map(|s| (s.title.as_str(), s.level)).collect();
    assert_eq!(
        outline,
        vec![("Introduction", 1), ("Scope", 2), ("Timeline", 2), ("Risks", 3)]
    );
    assert_eq!(sections[1].content, vec!["What is included."]);
    assert!(sections[3].content.is_empty());
}

#[test]
fn test_no_headings_no_sections() {
    let mut doc = Document::new();
    doc.add_paragraph(Paragraph::with_text(MARKER));
    assert!(docfill::extract_sections(&doc).is_empty());
}

#[test]
fn test_sections_needing_content_keeps_order() {
    let sections = docfill::extract_sections(&proposal());
    let pending: Vec<&str> = sections_needing_content(&sections)
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(pending, vec!["Introduction", "Timeline"]);
    assert_eq!(sections[0].placeholder_index, Some(1));
}

#[test]
fn test_section_context_window() {
    let sections = docfill::extract_sections(&proposal());
    let context = section_context(&sections, &sections[2], 2);
    let lines: Vec<&str> = context.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Previous section 'Introduction': Why this project exists. {{SECTION_CONTENT}}...",
            "Previous section 'Scope': What is included....",
        ]
    );
    assert_eq!(section_context(&sections, &sections[0], 2), "");
}

#[test]
fn test_split_rules() {
    assert_eq!(split_into_paragraphs("A\n\nB\n\nC"), vec!["A", "B", "C"]);
    assert_eq!(split_into_paragraphs("A\nB"), vec!["A", "B"]);
}

#[test]
fn test_inserted_paragraphs_are_contiguous_and_styled() {
    let mut doc = Document::new();
    doc.add_paragraph(Paragraph::heading("Only", 1));
    doc.add_paragraph(Paragraph::with_text("Before"));
    doc.add_paragraph(Paragraph::new(MARKER, "X"));
    doc.add_paragraph(Paragraph::with_text("After"));

    let sections = docfill::extract_sections(&doc);
    assert!(docfill::insert_content(&mut doc, &sections[0], "one\n\ntwo\n\nthree", false));

    let paragraphs: Vec<(&str, &str)> = doc
        .paragraphs()
        .map(|(_, p)| (p.text.as_str(), p.style()))
        .collect();
    assert_eq!(
        paragraphs,
        vec![
            ("Only", "Heading 1"),
            ("Before", "Normal"),
            ("one", "X"),
            ("two", "X"),
            ("three", "X"),
            ("After", "Normal"),
        ]
    );
}

#[test]
fn test_placeholder_search_is_document_wide() {
    let mut session = Docfill::new().session(proposal()).unwrap();

    // The second pending section still resolves to the first marker in the
    // document, which belongs to "Introduction".
    assert!(session.insert_content(2, "Q1 kickoff", false));
    let texts: Vec<&str> = session.document().paragraphs().map(|(_, p)| p.text.as_str()).collect();
    assert_eq!(texts[3], "Q1 kickoff");
    assert_eq!(texts[9], MARKER);

    // Sections without a marker are refused.
    assert!(!session.insert_content(1, "ignored", false));
}

#[test]
fn test_fill_whole_document() {
    let mut session = Docfill::new().session(proposal()).unwrap();
    let content = GeneratedContent::by_title(
        session.sections(),
        [
            ("Introduction", "We propose a rewrite.\n\nIt pays for itself."),
            ("Timeline", "Two quarters."),
        ],
    );

    assert_eq!(session.apply_generated(&content, false), 2);
    assert_eq!(session.process_all_tables(), 2);

    let doc = session.document();
    let introduction: Vec<(&str, &str)> = doc
        .paragraphs()
        .skip(3)
        .take(3)
        .map(|(_, p)| (p.text.as_str(), p.style()))
        .collect();
    assert_eq!(
        introduction,
        vec![
            ("We propose a rewrite.", "Body Text"),
            ("It pays for itself.", "Body Text"),
            ("Reviewed by the board.", "Normal"),
        ]
    );
    let timeline = doc
        .paragraphs()
        .find(|(_, p)| p.text == "Two quarters.")
        .map(|(_, p)| p.style());
    assert_eq!(timeline, Some("Quote"));

    let table = doc.tables().next().unwrap();
    assert_eq!(table.cell_text(3, 1), Some("4,000"));
    assert_eq!(table.cell_text(3, 2), Some("50.0%"));
    assert!(!doc.plain_text().contains(MARKER));
}

#[test]
fn test_row_calculations() {
    let calculator = TableCalculator::new(&TableOptions::default());

    let mut total = Table::from_rows([["Total", "10", "20", "30", ""]]);
    assert_eq!(calculator.process_table(&mut total), 1);
    assert_eq!(total.cell_text(0, 4), Some("60"));

    let mut diff = Table::from_rows([["Diff", "100", "30", "20"]]);
    assert_eq!(calculator.process_table(&mut diff), 1);
    assert_eq!(diff.cell_text(0, 3), Some("50"));
}

#[test]
fn test_number_round_trips() {
    assert_eq!(extract_number("12.5%"), Some(0.125));
    assert_eq!(format_value(0.125, "12.5%"), "12.5%");

    assert_eq!(extract_number("$1,234.56"), Some(1234.56));
    assert_eq!(format_value(1234.56, "$1,234.56"), "$1,234.56");
}

#[test]
fn test_recalculation_is_deterministic() {
    let mut doc = Document::new();
    doc.add_table(Table::from_rows([["Average", "2", "4", "9", ""]]));
    let calculator = TableCalculator::new(&TableOptions::default());

    assert_eq!(calculator.process_all_tables(&mut doc), 1);
    let first = doc.tables().next().and_then(|t| t.cell_text(0, 4)).map(String::from);
    assert_eq!(first.as_deref(), Some("5"));

    // Restore the inputs, then run again.
    if let Some(cell) = doc.tables_mut().next().and_then(|t| t.cell_mut(0, 4)) {
        cell.set_text("");
    }
    assert_eq!(calculator.process_all_tables(&mut doc), 1);
    let table = doc.tables().next().unwrap();
    assert_eq!(table.cell_text(0, 4).map(String::from), first);
    assert_eq!(table.cell_text(0, 0), Some("Average"));
}

#[test]
fn test_replace_all_placeholders() {
    let mut session = Docfill::new().session(proposal()).unwrap();
    let replacements = BTreeMap::from([(MARKER.to_string(), "TBD".to_string())]);
    assert_eq!(session.replace_all_placeholders(&replacements), 2);
    assert!(!session.document().plain_text().contains(MARKER));
}

#[test]
fn test_generate_and_insert() {
    let mut session = Docfill::new().session(proposal()).unwrap();
    let attempts = Cell::new(0);
    let generator = |prompt: &str, _system: Option<&str>, _temperature: f32, _max_tokens: u32| {
        attempts.set(attempts.get() + 1);
        assert!(prompt.contains("SECTION TO WRITE:\nTitle: Introduction\n"));
        Ok::<_, Error>("Generated introduction.".to_string())
    };

    let request = GenerationRequest::new("Mention the budget");
    let text = session
        .generate_for(0, &generator, &SectionPromptBuilder::new(), &request)
        .unwrap();
    assert_eq!(attempts.get(), 1);
    assert!(session.insert_content(0, &text, false));
    assert!(session
        .document()
        .paragraphs()
        .any(|(_, p)| p.text == "Generated introduction."));
}

#[test]
fn test_generation_retry_gives_up() {
    let attempts = Cell::new(0);
    let failing = |_: &str, _: Option<&str>, _: f32, _: u32| {
        attempts.set(attempts.get() + 1);
        Err::<String, _>(Error::Generation("service unavailable".into()))
    };
    let policy = RetryPolicy::new(3).with_base_delay(Duration::ZERO);

    let result = generate_with_retry(&failing, &policy, "prompt", None, 0.7, 100);
    assert!(matches!(result, Err(Error::Generation(_))));
    assert_eq!(attempts.get(), 3);
}
