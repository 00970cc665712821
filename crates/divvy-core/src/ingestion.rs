use std::collections::HashSet;

use blake3::Hasher;
use divvy_ingest::{parse_metrics_export, ParsedExport, ParserError};

/// An export file as handed to ingestion: path for reporting, raw bytes for
/// hashing and parsing.
#[derive(Debug)]
pub struct FileInput<'a> {
    pub path: &'a str,
    pub contents: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Duplicate,
    Parsed,
    Failed,
}

#[derive(Debug)]
pub struct ParserAttemptReport {
    pub parser: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct FileReport {
    pub path: String,
    pub hash: String,
    pub status: FileStatus,
    pub parser_attempts: Vec<ParserAttemptReport>,
}

#[derive(Debug)]
pub struct ParsedFile {
    pub hash: String,
    pub export: ParsedExport,
}

#[derive(Debug)]
pub struct IngestionBatch {
    pub parsed: Vec<ParsedFile>,
    pub reports: Vec<FileReport>,
    pub new_hashes: Vec<String>,
}

/// Hashes, dedupes, and parses a batch of export files. A file seen before
/// (same content hash) is skipped; a file neither parser accepts is reported
/// with every attempt.
pub fn ingest_files(inputs: &[FileInput<'_>], existing_hashes: &HashSet<String>) -> IngestionBatch {
    let mut parsed_files = Vec::new();
    let mut reports = Vec::new();
    let mut new_hashes = Vec::new();

    for input in inputs {
        let hash = compute_hash(input.contents);
        if existing_hashes.contains(&hash) {
            reports.push(FileReport {
                path: input.path.to_string(),
                hash,
                status: FileStatus::Duplicate,
                parser_attempts: Vec::new(),
            });
            continue;
        }

        let Ok(content_str) = std::str::from_utf8(input.contents) else {
            reports.push(FileReport {
                path: input.path.to_string(),
                hash,
                status: FileStatus::Failed,
                parser_attempts: vec![ParserAttemptReport {
                    parser: "utf8",
                    message: "file contents were not valid UTF-8".to_string(),
                }],
            });
            continue;
        };

        match parse_metrics_export(content_str) {
            Ok(export) => {
                new_hashes.push(hash.clone());
                parsed_files.push(ParsedFile {
                    hash: hash.clone(),
                    export,
                });
                reports.push(FileReport {
                    path: input.path.to_string(),
                    hash,
                    status: FileStatus::Parsed,
                    parser_attempts: Vec::new(),
                });
            }
            Err(ParserError::NoMatchingParser { attempts }) => {
                reports.push(FileReport {
                    path: input.path.to_string(),
                    hash,
                    status: FileStatus::Failed,
                    parser_attempts: attempts
                        .into_iter()
                        .map(|attempt| ParserAttemptReport {
                            parser: attempt.parser,
                            message: attempt.message,
                        })
                        .collect(),
                });
            }
            Err(err) => {
                reports.push(FileReport {
                    path: input.path.to_string(),
                    hash,
                    status: FileStatus::Failed,
                    parser_attempts: vec![ParserAttemptReport {
                        parser: "export",
                        message: err.to_string(),
                    }],
                });
            }
        }
    }

    IngestionBatch {
        parsed: parsed_files,
        reports,
        new_hashes,
    }
}

fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    hasher.finalize().to_hex().to_string()
}
