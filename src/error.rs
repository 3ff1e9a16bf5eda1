use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while scanning a single dump stream.
///
/// These are fatal to the file being scanned, but never to other files. The caller decides what
/// happens to the rest of a batch.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The stream ended inside a frame, or a line lacks a field the layout requires.
    #[error("{}:{line} (byte {offset}): malformed input, {reason}", .path.display())]
    MalformedInput {
        path: PathBuf,
        /// 1-based number of the line being read when the problem was found.
        line: u64,
        /// Byte offset of the start of that line.
        offset: u64,
        reason: String,
    },
    /// A field that must be numeric is not.
    #[error("{}:{line}: could not parse {expected} from {content:?}", .path.display())]
    ParseFailure {
        path: PathBuf,
        line: u64,
        expected: &'static str,
        content: String,
    },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while resolving the configuration, before any file is read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid type mapping {0:?}, expected `TOKEN=SPECIES`")]
    InvalidTypeMapping(String),
}

/// A per-file failure inside a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not list {}: {source}", .path.display())]
    Discover {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not build the worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
