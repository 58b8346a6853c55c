//! Flat-mode letter composition using the docx-rs library
//!
//! Builds a complete .docx from scratch for one record: company header,
//! date, recipient block, salutation, the selected body and the closing.

use crate::config::GenerationSettings;
use crate::docx::DocxError;
use crate::records::{FieldRole, Record};
use docx_rs::{AlignmentType, BreakType, Docx, Paragraph, Run};
use std::io::Cursor;

/// Salutation used when a record has no customer name
pub const FALLBACK_SALUTATION: &str = "Valued Customer";

/// Header font size in half-points (10pt)
const HEADER_SIZE: usize = 20;

/// Recipient block font size in half-points (11pt)
const RECIPIENT_SIZE: usize = 22;

/// Text of one flat-mode letter, section by section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterContent {
    pub header: String,
    pub date: String,
    pub recipient_name: String,
    pub recipient_address: String,
    pub body: String,
    pub closing: String,
}

impl LetterContent {
    /// Assemble the sections of a letter around an already formatted body
    pub fn new(record: &Record, settings: &GenerationSettings, body: String) -> Self {
        Self {
            header: settings.header_text.clone(),
            date: settings.letter_date.clone(),
            recipient_name: record.display_name(),
            recipient_address: record.role_text_or(FieldRole::Address, "").trim().to_string(),
            body,
            closing: settings.closing_text.clone(),
        }
    }

    /// Name used after "Dear"
    pub fn salutation_name(&self) -> &str {
        if self.recipient_name.is_empty() {
            FALLBACK_SALUTATION
        } else {
            &self.recipient_name
        }
    }

    /// Recipient name and address, one per line, skipping empty parts
    fn recipient_block(&self) -> String {
        [self.recipient_name.as_str(), self.recipient_address.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render a letter to the bytes of a .docx file
pub fn compose_letter(content: &LetterContent) -> Result<Vec<u8>, DocxError> {
    let mut docx = Docx::new()
        .add_paragraph(text_paragraph(&content.header, Some(HEADER_SIZE)))
        .add_paragraph(Paragraph::new())
        .add_paragraph(text_paragraph(&format!("Date: {}", content.date), None))
        .add_paragraph(Paragraph::new());

    let recipient = content.recipient_block();
    if !recipient.is_empty() {
        docx = docx.add_paragraph(text_paragraph(&recipient, Some(RECIPIENT_SIZE)));
    }

    docx = docx
        .add_paragraph(Paragraph::new())
        .add_paragraph(text_paragraph(
            &format!("Dear {},", content.salutation_name()),
            None,
        ));

    // Blank lines separate body paragraphs
    for block in content.body.split("\n\n") {
        docx = docx.add_paragraph(text_paragraph(block.trim_matches('\n'), None));
    }

    docx = docx.add_paragraph(text_paragraph(&content.closing, None));

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| DocxError::Format(format!("Failed to write DOCX: {}", e)))?;
    Ok(buffer.into_inner())
}

/// A left-aligned paragraph holding `text`, with line breaks for `\n`
fn text_paragraph(text: &str, size: Option<usize>) -> Paragraph {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        if !line.is_empty() {
            run = run.add_text(line);
        }
    }
    if let Some(size) = size {
        run = run.size(size);
    }
    Paragraph::new().add_run(run).align(AlignmentType::Left)
}
