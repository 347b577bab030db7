//! Document ingestion: per-format readers, chunking, directory scan

mod chunker;
mod ingestor;
mod reader;

pub use chunker::TextChunker;
pub use ingestor::{IngestReport, Ingestor, SkippedDocument};
pub use reader::{DocumentReader, ParsedDocument, PdfReader, ReaderRegistry, TextReader};
