//! Reading and writing .docx packages
//!
//! A .docx file is a ZIP archive of XML parts. The template is read once into
//! an ordered list of parts plus the parsed main document. Each generated
//! letter is written by copying every part of the template unchanged except
//! `word/document.xml`, which is rendered from that letter's own copy of the
//! document model. Styles, headers, footers, numbering and media therefore
//! come through untouched.

use super::model::Document;
use super::DocxError;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::read::ZipArchive;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Name of the main document part
pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";

/// A parsed .docx template, used as a read-only prototype
#[derive(Debug, Clone)]
pub struct DocxTemplate {
    /// Every non-directory part of the package in archive order
    parts: Vec<(String, Vec<u8>)>,
    /// The parsed main document part
    document: Document,
}

impl DocxTemplate {
    /// Load a template from a file on disk
    pub fn open(path: &Path) -> Result<Self, DocxError> {
        log::info!("Reading DOCX template from {}", path.display());
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Load a template from the bytes of a .docx file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            parts.push((name, contents));
        }

        let main = parts
            .iter()
            .find(|(name, _)| name == MAIN_DOCUMENT_PART)
            .map(|(_, contents)| contents)
            .ok_or(DocxError::MissingPart(MAIN_DOCUMENT_PART))?;
        let xml = std::str::from_utf8(main).map_err(|e| {
            DocxError::Format(format!("{} is not valid UTF-8: {}", MAIN_DOCUMENT_PART, e))
        })?;
        let document = Document::parse(xml)?;

        log::info!(
            "Template has {} parts and {} body blocks",
            parts.len(),
            document.blocks.len()
        );

        Ok(Self { parts, document })
    }

    /// The template's document model
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// An independently owned copy of the document model for one letter
    pub fn instantiate(&self) -> Document {
        self.document.clone()
    }

    /// Write a complete .docx package with `document` as its main part
    pub fn render(&self, document: &Document) -> Result<Vec<u8>, DocxError> {
        let mut output = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        // Images don't compress well
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        for (name, contents) in &self.parts {
            let options = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            output.start_file(name.as_str(), options)?;
            if name == MAIN_DOCUMENT_PART {
                output.write_all(document.to_xml().as_bytes())?;
            } else {
                output.write_all(contents)?;
            }
        }

        Ok(output.finish()?.into_inner())
    }
}

/// Read the main document part out of any .docx package
pub fn read_document(bytes: &[u8]) -> Result<Document, DocxError> {
    DocxTemplate::from_bytes(bytes).map(|template| template.document)
}
