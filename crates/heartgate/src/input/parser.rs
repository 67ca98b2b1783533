//! CSV parser producing an in-memory [`DataTable`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{HeartgateError, Result};
use super::source::{DataTable, SourceMetadata};

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Field delimiter.
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            max_rows: None,
        }
    }
}

/// Parses comma-separated files with a header row.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the data table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        let contents = fs::read(path).map_err(|e| HeartgateError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let table = self.parse_bytes(&contents)?;

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse bytes directly.
    ///
    /// Rows whose field count differs from the header are rejected.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<DataTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .quote(self.config.quote)
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(HeartgateError::EmptyData("No header row found".to_string()));
        }

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(DataTable::new(headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let parser = Parser::new();
        let data = b"age,slope,diagnosis\n63,flat,1\n41,upsloping,0";
        let table = parser.parse_bytes(data).unwrap();

        assert_eq!(table.headers, vec!["age", "slope", "diagnosis"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 1), Some("flat"));
        assert_eq!(table.get(1, 2), Some("0"));
    }

    #[test]
    fn test_header_only_is_an_empty_table() {
        let table = Parser::new().parse_bytes(b"age,diagnosis\n").unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = Parser::new().parse_bytes(b"").unwrap_err();
        assert!(err.is_file_read());
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let err = Parser::new()
            .parse_bytes(b"age,diagnosis\n63,1\n41\n")
            .unwrap_err();
        assert!(matches!(err, HeartgateError::Csv(_)));
    }

    #[test]
    fn test_quoted_fields() {
        let table = Parser::new()
            .parse_bytes(b"rest_ecg,diagnosis\n\"ST-T wave abnormality\",1\n")
            .unwrap();
        assert_eq!(table.get(0, 0), Some("ST-T wave abnormality"));
    }

    #[test]
    fn test_max_rows() {
        let parser = Parser::with_config(ParserConfig {
            max_rows: Some(1),
            ..ParserConfig::default()
        });
        let table = parser.parse_bytes(b"a\n1\n2\n3\n").unwrap();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = Parser::new().parse_file("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, HeartgateError::Io { .. }));
    }

    #[test]
    fn test_is_null_value() {
        assert!(DataTable::is_null_value(""));
        assert!(DataTable::is_null_value("  "));
        assert!(DataTable::is_null_value("NA"));
        assert!(DataTable::is_null_value("NaN"));
        assert!(!DataTable::is_null_value("?"));
        assert!(!DataTable::is_null_value("normal"));
        assert!(!DataTable::is_null_value("0"));
    }
}
