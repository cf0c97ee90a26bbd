//! Plain-text extraction for the accepted upload formats.

use std::io::{Cursor, Read};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
}

impl FileKind {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Docx),
            "txt" => Some(FileKind::Txt),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Txt => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileKind::Txt => "text/plain",
        }
    }
}

/// Checks name, emptiness and size before anything is stored.
pub fn validate_upload(file_name: &str, size: usize, max_bytes: usize) -> Result<FileKind, AppError> {
    let kind = FileKind::from_file_name(file_name).ok_or_else(|| {
        AppError::Validation(format!(
            "Invalid file type. Allowed types: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;
    if size == 0 {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if size > max_bytes {
        return Err(AppError::Validation(format!(
            "File too large. Maximum size is {} MB",
            max_bytes as f64 / (1024.0 * 1024.0)
        )));
    }
    Ok(kind)
}

/// Extracts text from the raw file bytes. CPU-bound; callers run it on the blocking pool.
pub fn extract_text(kind: FileKind, bytes: &[u8]) -> Result<String> {
    let text = match kind {
        FileKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| anyhow!("PDF text extraction failed: {e}"))?,
        FileKind::Docx => docx_text(bytes)?,
        FileKind::Txt => plain_text(bytes),
    };
    // Postgres TEXT cannot hold NUL.
    Ok(text.replace('\0', ""))
}

/// Lossy UTF-8, except for files carrying a UTF-16 byte order mark.
fn plain_text(bytes: &[u8]) -> String {
    let (body, little_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        _ => return String::from_utf8_lossy(bytes).into_owned(),
    };
    let units = body.chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

static XML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// Reads `word/document.xml` out of the DOCX zip container and flattens it to lines.
fn docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("Failed to read DOCX container")?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("DOCX has no word/document.xml")?
        .read_to_string(&mut xml)
        .context("Failed to read word/document.xml")?;

    let xml = xml
        .replace("</w:p>", "\n")
        .replace("<w:br/>", "\n")
        .replace("<w:tab/>", "\t");
    let stripped = XML_TAG_RE.replace_all(&xml, "");
    Ok(unescape_xml(&stripped))
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file("word/document.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(document_xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_file_kind_from_name() {
        assert_eq!(FileKind::from_file_name("cv.PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_file_name("my.cv.docx"), Some(FileKind::Docx));
        assert_eq!(FileKind::from_file_name("notes.txt"), Some(FileKind::Txt));
        assert_eq!(FileKind::from_file_name("cv.doc"), None);
        assert_eq!(FileKind::from_file_name("README"), None);
    }

    #[test]
    fn test_validate_upload_rules() {
        let max = 5 * 1024 * 1024;
        assert_eq!(validate_upload("a.txt", 10, max).unwrap(), FileKind::Txt);
        assert!(matches!(validate_upload("a.exe", 10, max), Err(AppError::Validation(_))));
        assert!(matches!(validate_upload("a.pdf", 0, max), Err(AppError::Validation(_))));
        let err = validate_upload("a.pdf", max + 1, max).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: File too large. Maximum size is 5 MB");
    }

    #[test]
    fn test_txt_is_lossy_utf8() {
        let text = extract_text(FileKind::Txt, b"John Doe\n\xffPython").unwrap();
        assert!(text.starts_with("John Doe\n"));
        assert!(text.ends_with("Python"));
    }

    #[test]
    fn test_nul_bytes_are_stripped() {
        let bytes = b"Jane Doe\njane@example.com\nPython, 4 years\x00\n";
        let text = extract_text(FileKind::Txt, bytes).unwrap();
        assert!(!text.contains('\0'));
        assert!(text.ends_with("4 years\n"));

        let xml = "<w:document><w:p><w:t>Jane\u{0}Doe</w:t></w:p></w:document>";
        let text = extract_text(FileKind::Docx, &docx_bytes(xml)).unwrap();
        assert_eq!(text, "JaneDoe\n");
    }

    #[test]
    fn test_utf16_text_with_bom() {
        let mut le = vec![0xFF, 0xFE];
        le.extend("Jane Doe\nPython".encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(extract_text(FileKind::Txt, &le).unwrap(), "Jane Doe\nPython");

        let mut be = vec![0xFE, 0xFF];
        be.extend("Go, Rust".encode_utf16().flat_map(u16::to_be_bytes));
        assert_eq!(extract_text(FileKind::Txt, &be).unwrap(), "Go, Rust");
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0"?><w:document><w:body><w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p><w:p><w:r><w:t>R&amp;D engineer</w:t></w:r></w:p></w:body></w:document>"#;
        let text = extract_text(FileKind::Docx, &docx_bytes(xml)).unwrap();
        assert_eq!(text, "Jane Doe\nR&D engineer\n");
    }

    #[test]
    fn test_corrupt_docx_is_an_error() {
        assert!(extract_text(FileKind::Docx, b"not a zip").is_err());
    }
}
