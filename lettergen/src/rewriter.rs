//! Placeholder substitution over a document model
//!
//! Word splits the visible text of a paragraph into runs whenever formatting,
//! spell-check state or edit history changes, so a placeholder such as
//! `{CUSTOMER_NAME}` can end up as `{CUST` in one run and `OMER_NAME}` in the
//! next. Substitution therefore always works on the paragraph's full text,
//! never on a single run.
//!
//! When a paragraph changes, all of its runs are replaced by one plain run
//! holding the new text. Any character formatting that varied inside the
//! paragraph (a bold word, a different font) is lost; paragraph properties,
//! bookmarks and the paragraph's place in the body or table are kept. There
//! is no sound way to map run styling back onto text whose length changed
//! across a run boundary, so this is accepted. Paragraphs without any match
//! are left byte-for-byte as they were.

use crate::docx::{Document, Paragraph, Table};
use crate::mapping::SubstitutionMapping;

/// Outcome of substituting one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Text-bearing units visited
    pub visited: usize,
    /// Units whose text changed
    pub modified: usize,
}

impl WalkReport {
    fn record(&mut self, modified: bool) {
        self.visited += 1;
        if modified {
            self.modified += 1;
        }
    }
}

/// Substitute every mapped token in one paragraph
///
/// Each entry of `mapping` is applied in turn as a literal replacement on the
/// paragraph's full text. Returns `true` if the text changed, in which case
/// the paragraph's runs have been collapsed into a single run.
pub fn rewrite_paragraph(paragraph: &mut Paragraph, mapping: &SubstitutionMapping) -> bool {
    let original = paragraph.text();
    if !original.contains('{') {
        return false;
    }

    let mut text = original.clone();
    for (token, value) in mapping.iter() {
        if text.contains(token.as_str()) {
            text = text.replace(token.as_str(), value);
        }
    }

    if text == original {
        return false;
    }
    paragraph.replace_runs(&text);
    true
}

/// Apply `mapping` to every text-bearing unit of `document`
///
/// Units are visited in the same order as
/// [`text_units`](crate::discovery::text_units): top-level paragraphs, then
/// tables row by row and cell by cell, recursing into nested tables. Every
/// unit is visited exactly once.
pub fn apply_mapping(document: &mut Document, mapping: &SubstitutionMapping) -> WalkReport {
    let mut report = WalkReport::default();

    for paragraph in document.paragraphs_mut() {
        report.record(rewrite_paragraph(paragraph, mapping));
    }
    for table in document.tables_mut() {
        walk_table(table, mapping, &mut report);
    }

    report
}

fn walk_table(table: &mut Table, mapping: &SubstitutionMapping, report: &mut WalkReport) {
    for row in table.rows_mut() {
        for cell in row.cells_mut() {
            for paragraph in cell.paragraphs_mut() {
                report.record(rewrite_paragraph(paragraph, mapping));
            }
            for nested in cell.tables_mut() {
                walk_table(nested, mapping, report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::PlaceholderToken;

    fn mapping(pairs: &[(&str, &str)]) -> SubstitutionMapping {
        let mut mapping = SubstitutionMapping::new();
        for (name, value) in pairs {
            mapping.insert(PlaceholderToken::from_name(name).unwrap(), *value);
        }
        mapping
    }

    fn doc(body: &str) -> Document {
        Document::parse(&format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        ))
        .unwrap()
    }

    #[test]
    fn test_token_split_across_runs_is_replaced() {
        let mut document = doc(concat!(
            r#"<w:p><w:pPr><w:jc w:val="left"/></w:pPr>"#,
            "<w:r><w:t>Dear {CUST</w:t></w:r>",
            "<w:r><w:rPr><w:b/></w:rPr><w:t>OMER_NAME},</w:t></w:r></w:p>",
        ));
        let mapping = mapping(&[("CUSTOMER_NAME", "John Smith")]);

        let paragraph = document.paragraphs_mut().next().unwrap();
        assert_eq!(paragraph.run_count(), 2);
        assert!(rewrite_paragraph(paragraph, &mapping));
        assert_eq!(paragraph.text(), "Dear John Smith,");
        assert_eq!(paragraph.run_count(), 1);

        let xml = document.to_xml();
        assert!(xml.contains(r#"<w:jc w:val="left"/>"#));
        assert!(!xml.contains("CUST"));
    }

    #[test]
    fn test_every_split_position() {
        let text = "Dear {CUSTOMER_NAME},";
        let mapping = mapping(&[("CUSTOMER_NAME", "Jane Doe")]);
        for split in 1..text.len() {
            let (left, right) = text.split_at(split);
            let mut document = doc(&format!(
                "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
                left, right
            ));
            let paragraph = document.paragraphs_mut().next().unwrap();
            assert!(rewrite_paragraph(paragraph, &mapping), "split at {}", split);
            assert_eq!(paragraph.text(), "Dear Jane Doe,");
        }
    }

    #[test]
    fn test_unmatched_paragraph_is_untouched() {
        let body = r#"<w:p><w:r><w:rPr><w:i/></w:rPr><w:t>{UNKNOWN} and plain</w:t></w:r></w:p>"#;
        let mut document = doc(body);
        let before = document.to_xml();

        let report = apply_mapping(&mut document, &mapping(&[("DATE", "today")]));
        assert_eq!(report, WalkReport { visited: 1, modified: 0 });
        assert_eq!(document.to_xml(), before);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let mut document = doc("<w:p><w:r><w:t>{A} and {B}</w:t></w:r></w:p>");
        let mapping = mapping(&[("A", "one"), ("B", "two")]);

        assert_eq!(apply_mapping(&mut document, &mapping).modified, 1);
        let once = document.to_xml();
        assert_eq!(apply_mapping(&mut document, &mapping).modified, 0);
        assert_eq!(document.to_xml(), once);
        assert_eq!(document.text(), "one and two");
    }

    #[test]
    fn test_walker_visits_every_unit_once() {
        // 2 top-level paragraphs and a 3 x 2 table with one paragraph per cell
        let cell = |text: &str| format!("<w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc>", text);
        let row = |a: &str, b: &str| format!("<w:tr>{}{}</w:tr>", cell(a), cell(b));
        let body = format!(
            "<w:p><w:r><w:t>{{A}}</w:t></w:r></w:p><w:p/><w:tbl>{}{}{}</w:tbl>",
            row("{A}", "x"),
            row("y", "{B}"),
            row("{A}{B}", "z"),
        );
        let mut document = doc(&body);

        let report = apply_mapping(&mut document, &mapping(&[("A", "1"), ("B", "2")]));
        assert_eq!(report.visited, 2 + 3 * 2);
        assert_eq!(report.modified, 4);
        assert!(report.modified <= report.visited);
        assert_eq!(document.text(), "1\n\n1\nx\ny\n2\n12\nz");
    }

    #[test]
    fn test_nested_tables_are_walked() {
        let mut document = doc(concat!(
            "<w:tbl><w:tr><w:tc>",
            "<w:p><w:r><w:t>outer {A}</w:t></w:r></w:p>",
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner {A}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
            "</w:tc></w:tr></w:tbl>",
        ));
        let report = apply_mapping(&mut document, &mapping(&[("A", "ok")]));
        assert_eq!(report, WalkReport { visited: 2, modified: 2 });
        assert_eq!(document.text(), "outer ok\ninner ok");
    }

    #[test]
    fn test_replacement_order_follows_mapping() {
        // The first entry's output is seen by later entries
        let mut paragraph = Paragraph::plain("{A}");
        let mapping = mapping(&[("A", "{B}"), ("B", "done")]);
        assert!(rewrite_paragraph(&mut paragraph, &mapping));
        assert_eq!(paragraph.text(), "done");
    }
}
