//! Per-format document readers

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::FileType;

/// How long pdf-extract may run before falling back to lopdf
const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Text extracted from a single file
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub text: String,
    /// Total pages (if applicable)
    pub total_pages: Option<u32>,
}

/// Capability to turn raw file bytes of one format into text
pub trait DocumentReader: Send + Sync {
    /// File type this reader handles
    fn file_type(&self) -> FileType;

    /// Extract text; `name` is only used in error messages
    fn read(&self, name: &str, data: &[u8]) -> Result<ParsedDocument>;
}

/// Dispatches files to the reader registered for their type
#[derive(Clone)]
pub struct ReaderRegistry {
    readers: Vec<Arc<dyn DocumentReader>>,
}

impl ReaderRegistry {
    /// Registry with no readers
    pub fn empty() -> Self {
        Self { readers: Vec::new() }
    }

    /// Register a reader, replacing any existing reader for the same type
    pub fn register(&mut self, reader: Arc<dyn DocumentReader>) {
        self.readers.retain(|r| r.file_type() != reader.file_type());
        self.readers.push(reader);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.register(reader);
        self
    }

    /// Reader for a file type, if one is registered
    pub fn reader_for(&self, file_type: FileType) -> Option<&Arc<dyn DocumentReader>> {
        self.readers.iter().find(|r| r.file_type() == file_type)
    }

    /// Whether a file name has a registered reader
    pub fn supports(&self, filename: &str) -> bool {
        self.reader_for(FileType::from_filename(filename)).is_some()
    }

    /// Parse a file by dispatching on its extension
    pub fn read(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = FileType::from_filename(filename);
        let reader = self
            .reader_for(file_type)
            .ok_or_else(|| Error::unreadable(filename, "unsupported file type"))?;

        let parsed = reader.read(filename, data)?;
        if parsed.text.trim().is_empty() {
            return Err(Error::unreadable(filename, "no text content could be extracted"));
        }
        Ok(parsed)
    }
}

impl Default for ReaderRegistry {
    /// PDF plus plain text and markdown
    fn default() -> Self {
        Self::empty()
            .with(Arc::new(PdfReader))
            .with(Arc::new(TextReader::new(FileType::Txt)))
            .with(Arc::new(TextReader::new(FileType::Markdown)))
    }
}

/// UTF-8 text reader (plain text, markdown)
pub struct TextReader {
    file_type: FileType,
}

impl TextReader {
    pub fn new(file_type: FileType) -> Self {
        Self { file_type }
    }
}

impl DocumentReader for TextReader {
    fn file_type(&self) -> FileType {
        self.file_type
    }

    fn read(&self, name: &str, data: &[u8]) -> Result<ParsedDocument> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::unreadable(name, format!("invalid UTF-8: {}", e)))?;

        Ok(ParsedDocument {
            file_type: self.file_type,
            text: text.replace('\0', ""),
            total_pages: None,
        })
    }
}

/// PDF reader: pdf-extract first, lopdf content streams as fallback
pub struct PdfReader;

impl DocumentReader for PdfReader {
    fn file_type(&self) -> FileType {
        FileType::Pdf
    }

    fn read(&self, name: &str, data: &[u8]) -> Result<ParsedDocument> {
        let raw = extract_pdf_with_timeout(name, data)?;

        let text = cleanup_pdf_text(&raw)
            .replace('\0', "")
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let total_pages = lopdf::Document::load_mem(data)
            .ok()
            .map(|doc| doc.get_pages().len() as u32);

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            text,
            total_pages,
        })
    }
}

/// Run pdf-extract on a worker thread; it can hang on problematic fonts
fn extract_pdf_with_timeout(name: &str, data: &[u8]) -> Result<String> {
    use std::sync::mpsc;
    use std::thread;

    let data_vec = data.to_vec();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let _ = tx.send(pdf_extract::extract_text_from_mem(&data_vec));
    });

    match rx.recv_timeout(PDF_EXTRACT_TIMEOUT) {
        Ok(Ok(text)) if !text.trim().is_empty() => Ok(text),
        Ok(Ok(_)) => {
            tracing::debug!("pdf-extract returned no text for {}, trying fallback", name);
            extract_pdf_text_fallback(name, data)
        }
        Ok(Err(e)) => {
            tracing::warn!("pdf-extract failed for {}: {}, trying fallback", name, e);
            extract_pdf_text_fallback(name, data)
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::error!(
                "PDF extraction of {} timed out after {:?}, trying fallback",
                name,
                PDF_EXTRACT_TIMEOUT
            );
            extract_pdf_text_fallback(name, data)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            tracing::error!("PDF extraction thread for {} crashed", name);
            extract_pdf_text_fallback(name, data)
        }
    }
}

/// Fallback PDF text extraction using lopdf directly
fn extract_pdf_text_fallback(name: &str, data: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(data)
        .map_err(|e| Error::unreadable(name, format!("failed to load PDF: {}", e)))?;

    let mut all_text = String::new();
    for (page_num, page_id) in doc.get_pages() {
        match doc.get_page_content(page_id) {
            Ok(content) => {
                let text = extract_text_from_content(&content);
                if !text.is_empty() {
                    all_text.push_str(&text);
                    all_text.push('\n');
                }
            }
            Err(e) => {
                tracing::debug!("Could not get content for page {} of {}: {}", page_num, name, e);
            }
        }
    }

    if all_text.trim().is_empty() {
        return Err(Error::unreadable(
            name,
            "PDF appears to be image-based or has no extractable text",
        ));
    }

    Ok(all_text)
}

/// Pull literal strings shown by Tj/TJ operators out of a content stream
fn extract_text_from_content(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;
    let mut current_text = String::new();

    for line in content_str.lines() {
        let line = line.trim();

        if line == "BT" {
            in_text_block = true;
            continue;
        }

        if line == "ET" {
            in_text_block = false;
            if !current_text.is_empty() {
                text.push_str(&current_text);
                text.push(' ');
                current_text.clear();
            }
            continue;
        }

        if in_text_block && (line.ends_with("Tj") || line.ends_with("TJ")) {
            if let (Some(start), Some(end)) = (line.find('('), line.rfind(')')) {
                if start < end {
                    let decoded = line[start + 1..end]
                        .replace("\\n", "\n")
                        .replace("\\(", "(")
                        .replace("\\)", ")")
                        .replace("\\\\", "\\");
                    current_text.push_str(&decoded);
                }
            }
        }
    }

    text.trim_end().to_string()
}

/// Normalize typographic characters and ligatures pdf-extract leaves behind
fn cleanup_pdf_text(text: &str) -> String {
    text
        .replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace('\u{2014}', "--")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_reader() {
        let registry = ReaderRegistry::default();
        let parsed = registry.read("notes.TXT", b"Gowning procedure.\n").unwrap();
        assert_eq!(parsed.file_type, FileType::Txt);
        assert_eq!(parsed.text, "Gowning procedure.\n");
    }

    #[test]
    fn test_unsupported_and_empty_are_unreadable() {
        let registry = ReaderRegistry::default();
        assert!(matches!(
            registry.read("image.png", b"\x89PNG"),
            Err(Error::UnreadableDocument { .. })
        ));
        assert!(matches!(
            registry.read("blank.md", b"  \n\t"),
            Err(Error::UnreadableDocument { .. })
        ));
        assert!(matches!(
            registry.read("bad.txt", &[0xff, 0xfe, 0x00]),
            Err(Error::UnreadableDocument { .. })
        ));
    }

    #[test]
    fn test_garbage_pdf_is_unreadable() {
        let registry = ReaderRegistry::default();
        let err = registry.read("broken.pdf", b"not a pdf at all").unwrap_err();
        match err {
            Error::UnreadableDocument { document, .. } => assert_eq!(document, "broken.pdf"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_register_replaces_reader_for_type() {
        struct Upper;
        impl DocumentReader for Upper {
            fn file_type(&self) -> FileType {
                FileType::Txt
            }
            fn read(&self, _name: &str, data: &[u8]) -> Result<ParsedDocument> {
                Ok(ParsedDocument {
                    file_type: FileType::Txt,
                    text: String::from_utf8_lossy(data).to_uppercase(),
                    total_pages: None,
                })
            }
        }

        let registry = ReaderRegistry::default().with(Arc::new(Upper));
        assert_eq!(registry.read("a.txt", b"abc").unwrap().text, "ABC");
        assert!(registry.supports("b.pdf"));
    }

    #[test]
    fn test_content_stream_extraction() {
        let stream = b"BT\n/F1 12 Tf\n(Hello \\(PDF\\)) Tj\nET\nBT\n(World) Tj\nET\n";
        assert_eq!(extract_text_from_content(stream), "Hello (PDF) World");
    }

    #[test]
    fn test_cleanup_pdf_text() {
        let cleaned = cleanup_pdf_text("\u{201C}ef\u{FB01}cacy\u{201D} \u{2013} \u{2026}");
        assert_eq!(cleaned, "\"efficacy\" - ...");
    }
}
