//! Delimited flat-file source (CSV, TSV)
//!
//! The column set is fixed by the header at construction time, which is what
//! makes delimited rows tabular: referencing an undeclared column later is a
//! rule-authoring bug, not a per-record miss.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::{RmlError, RmlResult};
use crate::formulation::ReferenceFormulation;
use crate::record::{DataRecord, KeyValueRecord};
use crate::source::LogicalSource;

/// Character encodings accepted for delimited payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

/// Whitespace trimming applied while reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
    None,
    Headers,
    Fields,
    All,
}

impl TrimMode {
    fn to_csv(self) -> Trim {
        match self {
            TrimMode::None => Trim::None,
            TrimMode::Headers => Trim::Headers,
            TrimMode::Fields => Trim::Fields,
            TrimMode::All => Trim::All,
        }
    }
}

/// Parsing options for one delimited file, resolved before open
#[derive(Debug, Clone)]
pub struct CsvDialect {
    pub delimiter: char,
    pub quote: char,
    pub escape: Option<char>,
    pub trim: TrimMode,
    pub has_header: bool,
    /// Column names to use when the file carries no header row
    pub fallback_header: Option<Vec<String>>,
    /// Leading rows discarded before the header (or first data row)
    pub skip_rows: usize,
    /// Leading columns discarded from the header and every row
    pub skip_columns: usize,
    pub encoding: Encoding,
    /// Field spellings treated as SQL NULL. The empty string is never a null
    /// marker by default; an empty field is a present, empty value.
    pub null_markers: Vec<String>,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            escape: None,
            trim: TrimMode::None,
            has_header: true,
            fallback_header: None,
            skip_rows: 0,
            skip_columns: 0,
            encoding: Encoding::Utf8,
            null_markers: vec!["\\N".to_string()],
        }
    }
}

impl CsvDialect {
    /// Tab-separated variant of the default dialect
    pub fn tsv() -> Self {
        Self {
            delimiter: '\t',
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_fallback_header(mut self, columns: Vec<String>) -> Self {
        self.fallback_header = Some(columns);
        self
    }

    pub fn with_trim(mut self, trim: TrimMode) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_null_markers(mut self, markers: Vec<String>) -> Self {
        self.null_markers = markers;
        self
    }

    fn byte_of(name: &str, c: char) -> RmlResult<u8> {
        u8::try_from(c).map_err(|_| {
            RmlError::Configuration(format!("{name} must be a single-byte character, got {c:?}"))
        })
    }
}

/// Streaming source over one CSV/TSV file
pub struct DelimitedSource {
    path: PathBuf,
    header: Vec<String>,
    null_markers: Vec<String>,
    skip_columns: usize,
    reader: Option<csv::Reader<std::io::Cursor<Vec<u8>>>>,
}

impl DelimitedSource {
    /// Open a delimited file and fix its column set.
    ///
    /// The whole dialect is validated here: multi-byte delimiter/quote/escape
    /// and a header-less file with no declared fallback are configuration
    /// errors, an unreadable path is `ResourceUnavailable`, and undecodable
    /// content is `Validation`.
    pub fn open(path: impl AsRef<Path>, dialect: CsvDialect) -> RmlResult<Self> {
        let path = path.as_ref().to_path_buf();
        let delimiter = CsvDialect::byte_of("delimiter", dialect.delimiter)?;
        let quote = CsvDialect::byte_of("quote", dialect.quote)?;
        let escape = dialect
            .escape
            .map(|c| CsvDialect::byte_of("escape", c))
            .transpose()?;

        let raw = fs::read(&path).map_err(|e| {
            RmlError::ResourceUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let decoded = match dialect.encoding {
            Encoding::Utf8 => String::from_utf8(raw).map_err(|e| {
                RmlError::Validation(format!("{} is not valid UTF-8: {e}", path.display()))
            })?,
            Encoding::Latin1 => raw.iter().map(|&b| b as char).collect(),
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(quote)
            .escape(escape)
            .trim(dialect.trim.to_csv())
            .has_headers(false)
            .flexible(true)
            .from_reader(std::io::Cursor::new(decoded.into_bytes()));

        let mut row = StringRecord::new();
        for _ in 0..dialect.skip_rows {
            let more = reader
                .read_record(&mut row)
                .map_err(|e| RmlError::Validation(format!("malformed delimited row: {e}")))?;
            if !more {
                break;
            }
        }

        let header = if dialect.has_header {
            let more = reader
                .read_record(&mut row)
                .map_err(|e| RmlError::Validation(format!("malformed header row: {e}")))?;
            if !more {
                match dialect.fallback_header {
                    Some(columns) => columns,
                    None => {
                        return Err(RmlError::Configuration(format!(
                            "{} has no header row and no fallback header is declared",
                            path.display()
                        )))
                    }
                }
            } else {
                row.iter()
                    .skip(dialect.skip_columns)
                    .map(str::to_string)
                    .collect()
            }
        } else {
            dialect.fallback_header.ok_or_else(|| {
                RmlError::Configuration(format!(
                    "{} is declared header-less but no fallback header is given",
                    path.display()
                ))
            })?
        };

        debug!(path = %path.display(), columns = header.len(), "delimited source opened");
        Ok(Self {
            path,
            header,
            null_markers: dialect.null_markers,
            skip_columns: dialect.skip_columns,
            reader: Some(reader),
        })
    }

    /// The fixed column set read at open
    pub fn header(&self) -> &[String] {
        &self.header
    }

    fn row_to_record(&self, row: &StringRecord) -> KeyValueRecord {
        let mut record = KeyValueRecord::new();
        let mut fields = row.iter().skip(self.skip_columns);
        for column in &self.header {
            let value = match fields.next() {
                // A short row leaves its trailing columns null.
                None => None,
                Some(field) if self.null_markers.iter().any(|m| m == field) => None,
                Some(field) => Some(field.to_string()),
            };
            record.insert(column.clone(), value);
        }
        record
    }
}

impl LogicalSource for DelimitedSource {
    fn next_record(&mut self) -> RmlResult<Option<DataRecord>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        let mut row = StringRecord::new();
        match reader.read_record(&mut row) {
            Ok(true) => Ok(Some(DataRecord::Row(self.row_to_record(&row)))),
            Ok(false) => {
                self.reader = None;
                Ok(None)
            }
            Err(e) => {
                self.reader = None;
                Err(RmlError::Validation(format!(
                    "malformed row in {}: {e}",
                    self.path.display()
                )))
            }
        }
    }

    fn formulation(&self) -> ReferenceFormulation {
        ReferenceFormulation::Tabular
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn get<'a>(record: &'a DataRecord, key: &str) -> Option<Option<&'a str>> {
        match record {
            DataRecord::Row(row) => row.get(key).map(|v| v.as_deref()),
            _ => panic!("expected a row record"),
        }
    }

    #[test]
    fn test_reads_headered_csv() {
        let f = write_file("id,name,age\n1,Ann,62\n2,Bob,30\n");
        let mut source = DelimitedSource::open(f.path(), CsvDialect::default()).unwrap();
        assert_eq!(source.header(), &["id", "name", "age"]);

        let first = source.next_record().unwrap().unwrap();
        assert_eq!(get(&first, "name"), Some(Some("Ann")));
        let second = source.next_record().unwrap().unwrap();
        assert_eq!(get(&second, "id"), Some(Some("2")));
        assert!(source.next_record().unwrap().is_none());
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_tsv_dialect() {
        let f = write_file("id\tname\n1\tAnn\n");
        let mut source = DelimitedSource::open(f.path(), CsvDialect::tsv()).unwrap();
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(get(&record, "name"), Some(Some("Ann")));
    }

    #[test]
    fn test_null_marker_and_empty_field() {
        let f = write_file("id,name\n1,\\N\n2,\n");
        let mut source = DelimitedSource::open(f.path(), CsvDialect::default()).unwrap();
        // \N is null, the empty string is a present empty value.
        let first = source.next_record().unwrap().unwrap();
        assert_eq!(get(&first, "name"), Some(None));
        let second = source.next_record().unwrap().unwrap();
        assert_eq!(get(&second, "name"), Some(Some("")));
    }

    #[test]
    fn test_headerless_requires_fallback() {
        let f = write_file("1,Ann\n");
        let err = DelimitedSource::open(f.path(), CsvDialect::default().with_header(false))
            .err().unwrap();
        assert!(matches!(err, RmlError::Configuration(_)));

        let dialect = CsvDialect::default()
            .with_header(false)
            .with_fallback_header(vec!["id".to_string(), "name".to_string()]);
        let mut source = DelimitedSource::open(f.path(), dialect).unwrap();
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(get(&record, "id"), Some(Some("1")));
    }

    #[test]
    fn test_empty_file_without_fallback_is_configuration_error() {
        let f = write_file("");
        let err = DelimitedSource::open(f.path(), CsvDialect::default()).err().unwrap();
        assert!(matches!(err, RmlError::Configuration(_)));
    }

    #[test]
    fn test_missing_file_is_resource_unavailable() {
        let err = DelimitedSource::open("/no/such/file.csv", CsvDialect::default()).err().unwrap();
        assert!(matches!(err, RmlError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_multibyte_delimiter_rejected() {
        let f = write_file("a\n");
        let err = DelimitedSource::open(f.path(), CsvDialect::default().with_delimiter('→'))
            .err().unwrap();
        assert!(matches!(err, RmlError::Configuration(_)));
    }

    #[test]
    fn test_skip_rows_and_columns() {
        let f = write_file("# generated\nrowid,id,name\n0,1,Ann\n");
        let dialect = CsvDialect {
            skip_rows: 1,
            skip_columns: 1,
            ..CsvDialect::default()
        };
        let mut source = DelimitedSource::open(f.path(), dialect).unwrap();
        assert_eq!(source.header(), &["id", "name"]);
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(get(&record, "id"), Some(Some("1")));
        assert_eq!(get(&record, "name"), Some(Some("Ann")));
    }

    #[test]
    fn test_latin1_decoding() {
        let mut f = NamedTempFile::new().unwrap();
        // "café" in Latin-1, where é is a single 0xE9 byte.
        f.write_all(b"name\ncaf\xe9\n").unwrap();
        let dialect = CsvDialect {
            encoding: Encoding::Latin1,
            ..CsvDialect::default()
        };
        let mut source = DelimitedSource::open(f.path(), dialect).unwrap();
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(get(&record, "name"), Some(Some("café")));
    }

    #[test]
    fn test_short_row_leaves_trailing_columns_null() {
        let f = write_file("id,name,age\n1,Ann\n");
        let mut source = DelimitedSource::open(f.path(), CsvDialect::default()).unwrap();
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(get(&record, "age"), Some(None));
    }
}
