//! WordprocessingML (.docx) support
//!
//! - [`xml`]: element scanning over raw OOXML text with `quick_xml`
//! - [`model`]: paragraphs, runs and tables of the main document part
//! - [`package`]: the ZIP package around it

pub(crate) mod xml;

pub mod model;
pub mod package;

pub use model::{Block, Document, Paragraph, Run, Table, TableCell, TableRow};
pub use package::{read_document, DocxTemplate};
pub use xml::XmlError;

use thiserror::Error;

/// Errors reading or writing .docx packages
#[derive(Error, Debug)]
pub enum DocxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed document XML: {0}")]
    Xml(#[from] XmlError),

    #[error("Package has no {0} part")]
    MissingPart(&'static str),

    #[error("Format error: {0}")]
    Format(String),
}
