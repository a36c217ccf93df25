use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the fallible parsing entry points.
///
/// The [`SourceParser`](ripple_core::SourceParser) trait itself is
/// infallible; callers that want the underlying cause use
/// [`JavaParser::try_parse_file`](crate::JavaParser::try_parse_file).
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
