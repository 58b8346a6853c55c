//! Packaging generated letters into one zip archive

use crate::generator::GeneratedDocument;
use chrono::{DateTime, TimeZone};
use std::collections::HashSet;
use std::fmt::Display;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Errors writing the output archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error writing {path}: {source}", path = .0.display(), source = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),
}

/// Default archive name for a batch generated at `now`
pub fn archive_file_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("customer_letters_{}.zip", now.format("%Y%m%d_%H%M%S"))
}

/// Write `documents` as deflated entries of a zip archive
pub fn write_archive<W: Write + Seek>(
    writer: W,
    documents: &[GeneratedDocument],
) -> Result<W, ArchiveError> {
    let mut seen = HashSet::new();
    if let Some(duplicate) = documents
        .iter()
        .find(|doc| !seen.insert(doc.file_name.as_str()))
    {
        return Err(ArchiveError::DuplicateEntry(duplicate.file_name.clone()));
    }

    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for doc in documents {
        zip.start_file(doc.file_name.as_str(), options)?;
        zip.write_all(&doc.bytes)
            .map_err(zip::result::ZipError::Io)?;
    }
    Ok(zip.finish()?)
}

/// Write `documents` to a zip file at `path`
///
/// The archive is staged in a temporary file next to `path` and only moved
/// into place once it is complete, so a failed write leaves nothing behind.
pub fn save_archive(path: &Path, documents: &[GeneratedDocument]) -> Result<(), ArchiveError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent)
                .map_err(|e| ArchiveError::Io(parent.to_path_buf(), e))?;
            parent
        }
        None => Path::new("."),
    };

    let staging = NamedTempFile::new_in(dir).map_err(|e| ArchiveError::Io(dir.to_path_buf(), e))?;
    let mut staging = write_archive(staging, documents)?;
    staging
        .flush()
        .map_err(|e| ArchiveError::Io(path.to_path_buf(), e))?;
    staging
        .persist(path)
        .map_err(|e| ArchiveError::Io(path.to_path_buf(), e.error))?;

    log::info!(
        "Wrote {} letters to {}",
        documents.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn doc(name: &str, bytes: &[u8]) -> GeneratedDocument {
        GeneratedDocument {
            file_name: name.to_string(),
            row_number: 1,
            bytes: bytes.to_vec(),
            modified_units: None,
        }
    }

    #[test]
    fn test_archive_file_name() {
        let now = NaiveDate::from_ymd_opt(2026, 2, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
            .and_utc();
        assert_eq!(archive_file_name(&now), "customer_letters_20260209_140507.zip");
        assert!(archive_file_name(&Utc::now()).starts_with("customer_letters_"));
    }

    #[test]
    fn test_entries_round_trip() {
        let docs = [doc("Letter_A_001.docx", b"first"), doc("Letter_B_002.docx", b"second")];
        let cursor = write_archive(Cursor::new(Vec::new()), &docs).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(archive.len(), 2);
        let mut contents = String::new();
        archive
            .by_name("Letter_B_002.docx")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "second");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let docs = [doc("Letter.docx", b"a"), doc("Letter.docx", b"b")];
        assert!(matches!(
            write_archive(Cursor::new(Vec::new()), &docs),
            Err(ArchiveError::DuplicateEntry(name)) if name == "Letter.docx"
        ));
    }

    #[test]
    fn test_save_archive_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("letters.zip");
        save_archive(&path, &[doc("Letter_A_001.docx", b"x")]).unwrap();
        assert!(path.exists());
        // Only the archive itself, no staging file
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_save_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letters.zip");
        let docs = [doc("Letter.docx", b"a"), doc("Letter.docx", b"b")];

        assert!(matches!(
            save_archive(&path, &docs),
            Err(ArchiveError::DuplicateEntry(_))
        ));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_replaces_existing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letters.zip");
        std::fs::write(&path, b"stale").unwrap();

        save_archive(&path, &[doc("Letter_A_001.docx", b"fresh")]).unwrap();
        let archive = ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
    }
}
