//! Placeholder discovery in structured templates

use crate::docx::{Document, Paragraph, Table};
use crate::token::{find_tokens, PlaceholderToken};
use itertools::Itertools;

/// Every text-bearing unit of `document` in walk order
///
/// Top-level paragraphs come first, then each table row by row and cell by
/// cell. A cell's own paragraphs come before any table nested inside it.
pub fn text_units(document: &Document) -> Vec<&Paragraph> {
    let mut units: Vec<&Paragraph> = document.paragraphs().collect();
    for table in document.tables() {
        collect_table_units(table, &mut units);
    }
    units
}

fn collect_table_units<'a>(table: &'a Table, units: &mut Vec<&'a Paragraph>) {
    for row in table.rows() {
        for cell in row.cells() {
            units.extend(cell.paragraphs());
            for nested in cell.tables() {
                collect_table_units(nested, units);
            }
        }
    }
}

/// Distinct placeholder tokens of a template, in order of first appearance
///
/// Each unit is scanned as its full logical text, so a token split across
/// runs is still found.
pub fn discover_placeholders(document: &Document) -> Vec<PlaceholderToken> {
    let tokens: Vec<PlaceholderToken> = text_units(document)
        .into_iter()
        .flat_map(|paragraph| find_tokens(&paragraph.text()).collect::<Vec<_>>())
        .unique()
        .collect();

    if tokens.is_empty() {
        log::warn!("No placeholders found in template");
    } else {
        log::info!("Found {} distinct placeholders", tokens.len());
    }
    tokens
}
