use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Failure to read any supported structure, trajectory or side-channel file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Line { line: usize, kind: ParseErrorKind },
    #[error("Malformed binary data: {0}")]
    Binary(String),
    #[error("Inconsistent data: {0}")]
    Inconsistent(String),
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to read '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<ParseError>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Record does not match the expected layout: '{0}'")]
    InvalidRecord(String),
    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEnd(String),
}

impl ParseError {
    pub(crate) fn line(line: usize, kind: ParseErrorKind) -> Self {
        Self::Line { line, kind }
    }

    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Whether the error is an unexpected end of stream, which multi-frame readers treat
    /// as the end of the trajectory.
    pub fn is_end_of_stream(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            Self::Line {
                kind: ParseErrorKind::UnexpectedEnd(_),
                ..
            } => true,
            Self::File { source, .. } => source.is_end_of_stream(),
            _ => false,
        }
    }
}

/// Fixed-column field access: clips to the line length and trims.
pub(crate) fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("").trim()
}

pub(crate) fn parse_int<T: FromStr>(
    value: &str,
    line: usize,
    columns: &str,
) -> Result<T, ParseError> {
    if value.is_empty() {
        return Err(ParseError::line(
            line,
            ParseErrorKind::MissingRequiredField {
                columns: columns.into(),
            },
        ));
    }
    value.parse().map_err(|_| {
        ParseError::line(
            line,
            ParseErrorKind::InvalidInt {
                columns: columns.into(),
                value: value.into(),
            },
        )
    })
}

pub(crate) fn parse_float(value: &str, line: usize, columns: &str) -> Result<f32, ParseError> {
    if value.is_empty() {
        return Err(ParseError::line(
            line,
            ParseErrorKind::MissingRequiredField {
                columns: columns.into(),
            },
        ));
    }
    value.parse().map_err(|_| {
        ParseError::line(
            line,
            ParseErrorKind::InvalidFloat {
                columns: columns.into(),
                value: value.into(),
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_and_trim_clips_to_line_length() {
        assert_eq!(slice_and_trim("    1WATER   OW", 10, 15), "OW");
        assert_eq!(slice_and_trim("    1WATER   OW", 10, 40), "OW");
        assert_eq!(slice_and_trim("abc", 5, 8), "");
    }

    #[test]
    fn number_parsers_report_columns() {
        assert_eq!(parse_int::<i32>("42", 1, "0-5").unwrap(), 42);
        let err = parse_float("x.y", 3, "20-28").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Line {
                line: 3,
                kind: ParseErrorKind::InvalidFloat { .. }
            }
        ));
        let err = parse_int::<i32>("", 2, "15-20").unwrap_err();
        assert!(err.to_string().contains("15-20"));
    }

    #[test]
    fn end_of_stream_is_detected_through_wrappers() {
        let eof = ParseError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(eof.is_end_of_stream());
        assert!(eof.in_file("traj.dcd").is_end_of_stream());
        assert!(!ParseError::Binary("bad".into()).is_end_of_stream());
    }
}
