//! Batch letter generation
//!
//! One pass over a selection of records:
//! 1. **Validation**: the row range is checked before any letter is built
//! 2. **Generation**: each record becomes one .docx, either by substituting
//!    placeholders in a copy of the structured template or by composing a
//!    flat-text letter
//! 3. **Collection**: finished letters are returned together as a [`Batch`]
//!
//! Records are processed one at a time in source order. Any error aborts the
//! pass and discards the letters generated so far.

use crate::config::GenerationSettings;
use crate::discovery::discover_placeholders;
use crate::docx::{DocxError, DocxTemplate};
use crate::flat_template::{FlatTemplate, FormattingError};
use crate::letter::{compose_letter, LetterContent};
use crate::mapping::build_mapping;
use crate::records::{RangeError, Record, RecordSet, RowRange};
use crate::rewriter::apply_mapping;
use crate::token::PlaceholderToken;
use thiserror::Error;

/// Where letter content comes from
#[derive(Debug, Clone)]
pub enum LetterTemplate {
    /// A .docx file with `{NAME}` placeholders
    Structured(DocxTemplate),
    /// Active and inactive flat-text bodies
    Flat(FlatTemplate),
}

/// Receives progress after each letter is finished
pub trait ProgressReporter {
    /// `current` is 1-based and `total` is the size of the selection
    fn on_record(&mut self, current: usize, total: usize, name: &str);
}

/// Reports progress through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn on_record(&mut self, current: usize, total: usize, name: &str) {
        log::info!("Generated letter {} of {} ({})", current, total, name);
    }
}

impl<F> ProgressReporter for F
where
    F: FnMut(usize, usize, &str),
{
    fn on_record(&mut self, current: usize, total: usize, name: &str) {
        self(current, total, name)
    }
}

/// One finished letter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    /// File name inside the archive, unique per batch
    pub file_name: String,
    /// 1-based source row the letter was generated from
    pub row_number: usize,
    /// The .docx bytes
    pub bytes: Vec<u8>,
    /// Paragraphs changed by substitution; `None` for flat-text letters
    pub modified_units: Option<usize>,
}

/// All letters of one generation pass, in record order
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub documents: Vec<GeneratedDocument>,
    /// Placeholders found in the structured template, if one was used
    pub placeholders: Option<Vec<PlaceholderToken>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total paragraphs changed across all structured letters
    pub fn modified_units(&self) -> usize {
        self.documents.iter().filter_map(|d| d.modified_units).sum()
    }
}

/// Errors that abort a generation pass
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Invalid row range: {0}")]
    Range(#[from] RangeError),

    #[error("Letter for row {row}: {source}")]
    Formatting {
        row: usize,
        #[source]
        source: FormattingError,
    },

    #[error("Letter for row {row}: {source}")]
    Docx {
        row: usize,
        #[source]
        source: DocxError,
    },
}

/// Generate one letter per selected record
///
/// # Parameters
/// * `records` - The full record table
/// * `template` - Structured or flat-text letter template
/// * `settings` - Resolved company, sender and date settings
/// * `range` - Rows to generate, validated before any work is done
/// * `progress` - Notified after every finished letter
///
/// # Returns
/// * `Ok(Batch)` - One document per selected record
/// * `Err(GenerateError)` - Invalid range or a letter that could not be built
pub fn generate(
    records: &RecordSet,
    template: &LetterTemplate,
    settings: &GenerationSettings,
    range: RowRange,
    progress: &mut dyn ProgressReporter,
) -> Result<Batch, GenerateError> {
    let selected = records.select(range)?;
    let total = selected.len();
    log::info!(
        "Generating {} letters for rows {}-{}",
        total,
        range.start(),
        range.end()
    );

    let placeholders = match template {
        LetterTemplate::Structured(docx) => Some(discover_placeholders(docx.document())),
        LetterTemplate::Flat(_) => None,
    };

    let mut documents = Vec::with_capacity(total);
    for (idx, record) in selected.iter().enumerate() {
        let document = generate_letter(record, template, settings)?;
        progress.on_record(idx + 1, total, &record.display_name());
        documents.push(document);
    }

    Ok(Batch {
        documents,
        placeholders,
    })
}

/// Build the letter for a single record
pub fn generate_letter(
    record: &Record,
    template: &LetterTemplate,
    settings: &GenerationSettings,
) -> Result<GeneratedDocument, GenerateError> {
    let row = record.row_number();
    let docx_error = |source| GenerateError::Docx { row, source };

    let (bytes, modified_units) = match template {
        LetterTemplate::Structured(docx) => {
            let mapping = build_mapping(record, settings);
            let mut document = docx.instantiate();
            let report = apply_mapping(&mut document, &mapping);
            if report.modified == 0 {
                log::warn!(
                    "Letter for row {} has no substitutions; the template may not match the data",
                    row
                );
            }
            log::debug!(
                "Row {}: {} of {} paragraphs modified",
                row,
                report.modified,
                report.visited
            );
            (docx.render(&document).map_err(docx_error)?, Some(report.modified))
        }
        LetterTemplate::Flat(flat) => {
            let body = flat
                .render(record, settings)
                .map_err(|source| GenerateError::Formatting { row, source })?;
            let content = LetterContent::new(record, settings, body);
            (compose_letter(&content).map_err(docx_error)?, None)
        }
    };

    Ok(GeneratedDocument {
        file_name: letter_file_name(record),
        row_number: row,
        bytes,
        modified_units,
    })
}

/// Archive entry name for a record's letter
///
/// The row number keeps names unique when customers share a name.
pub fn letter_file_name(record: &Record) -> String {
    let spaced: String = record
        .display_name()
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' { '_' } else { c })
        .collect();
    let sanitized = sanitize_filename::sanitize(spaced);
    let name = if sanitized.is_empty() {
        "Customer"
    } else {
        sanitized.as_str()
    };
    format!("Letter_{}_{:03}.docx", name, record.row_number())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LetterConfig;
    use crate::docx::package::tests::minimal_docx;
    use crate::docx::read_document;
    use chrono::NaiveDate;

    const CSV: &str = "\
CUSTOMER NAME,Billing Account,Department,Status(Active/Inactive),Outstanding amount in Rs
John Smith,ACC-12345,Sales,Active,5000.5
Jane Doe,ACC-67890,Billing,Inactive,2500.75
John Smith,ACC-11111,Sales,Active,10
";

    fn settings() -> GenerationSettings {
        LetterConfig::default()
            .resolve(Some("2026-02-09"), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .unwrap()
    }

    fn records() -> RecordSet {
        RecordSet::from_csv_reader(CSV.as_bytes()).unwrap()
    }

    fn structured(body: &str) -> LetterTemplate {
        LetterTemplate::Structured(DocxTemplate::from_bytes(&minimal_docx(body)).unwrap())
    }

    #[test]
    fn test_structured_generation() {
        let template = structured(concat!(
            "<w:p><w:r><w:t>Dear {CUSTOMER NAME},</w:t></w:r></w:p>",
            "<w:p><w:r><w:t>Due: {Outstanding amount in Rs} on {DATE}</w:t></w:r></w:p>",
        ));
        let set = records();
        let range = RowRange::resolve(Some(1), Some(2), set.len()).unwrap();

        let mut seen = Vec::new();
        let mut progress = |current: usize, total: usize, name: &str| {
            seen.push((current, total, name.to_string()))
        };
        let batch = generate(&set, &template, &settings(), range, &mut progress).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.modified_units(), 4);
        assert_eq!(batch.placeholders.as_ref().map(Vec::len), Some(3));
        assert_eq!(
            seen,
            [(1, 2, "John Smith".to_string()), (2, 2, "Jane Doe".to_string())]
        );

        let jane = read_document(&batch.documents[1].bytes).unwrap().text();
        assert_eq!(jane, "Dear Jane Doe,\nDue: 2,500.75 on February 09, 2026");
    }

    #[test]
    fn test_invalid_range_produces_nothing() {
        let template = structured("<w:p><w:r><w:t>{DATE}</w:t></w:r></w:p>");
        let set = records();
        let mut calls = 0;
        let mut progress = |_: usize, _: usize, _: &str| calls += 1;

        let result = generate(&set, &template, &settings(), RowRange::new(3, 1), &mut progress);
        assert!(matches!(
            result,
            Err(GenerateError::Range(RangeError::StartAfterEnd { start: 3, end: 1 }))
        ));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_template_without_placeholders_is_copied() {
        let template = structured("<w:p><w:r><w:t>Hello</w:t></w:r></w:p>");
        let set = records();
        let range = RowRange::resolve(None, Some(1), set.len()).unwrap();
        let batch = generate(&set, &template, &settings(), range, &mut LogProgress).unwrap();

        assert_eq!(batch.modified_units(), 0);
        assert_eq!(batch.placeholders, Some(Vec::new()));
        let text = read_document(&batch.documents[0].bytes).unwrap().text();
        assert_eq!(text, "Hello");
    }

    #[test]
    fn test_flat_generation_selects_body() {
        let template = LetterTemplate::Flat(FlatTemplate::new(
            "ACTIVE {billing_account}",
            "INACTIVE {billing_account} {outstanding:,.2f}",
        ));
        let set = records();
        let range = RowRange::resolve(None, None, set.len()).unwrap();
        let batch = generate(&set, &template, &settings(), range, &mut LogProgress).unwrap();

        assert_eq!(batch.len(), 3);
        assert!(batch.placeholders.is_none());
        let jane = read_document(&batch.documents[1].bytes).unwrap().text();
        assert!(jane.contains("INACTIVE ACC-67890 2,500.75"));
        assert!(jane.contains("Dear Jane Doe,"));
        assert_eq!(batch.documents[1].modified_units, None);
    }

    #[test]
    fn test_flat_formatting_error_aborts_batch() {
        let template = LetterTemplate::Flat(FlatTemplate::new("{billing_account}", "{balance}"));
        let set = records();
        let range = RowRange::resolve(None, None, set.len()).unwrap();

        match generate(&set, &template, &settings(), range, &mut LogProgress) {
            Err(GenerateError::Formatting { row, source }) => {
                assert_eq!(row, 2);
                assert_eq!(source, FormattingError::UnknownField("balance".to_string()));
            }
            other => panic!("expected formatting error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_letter_file_names_are_unique() {
        let set = records();
        let names: Vec<_> = set.records().iter().map(letter_file_name).collect();
        assert_eq!(
            names,
            [
                "Letter_John_Smith_001.docx",
                "Letter_Jane_Doe_002.docx",
                "Letter_John_Smith_003.docx"
            ]
        );

        let odd = RecordSet::from_rows(
            vec!["Customer Name".into()],
            vec![vec!["A/B: C?".into()], vec![crate::records::FieldValue::Empty]],
        );
        assert_eq!(letter_file_name(&odd.records()[0]), "Letter_A_B_C_001.docx");
        assert_eq!(letter_file_name(&odd.records()[1]), "Letter_Customer_002.docx");
    }
}
