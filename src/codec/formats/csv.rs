//! CSV format adapter for import/export.
//!
//! Comma separated, RFC 4180 quoting, first row is the header.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::io::{Read, Write};

use crate::codec::traits::{ExportSink, ImportSource, RawRow};
use crate::{Error, Result};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// CSV import source.
///
/// Cells are trimmed. Short rows are allowed; missing trailing cells read as
/// absent.
pub struct CsvImportSource<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    position: usize,
}

impl<R: Read> CsvImportSource<R> {
    /// Creates a new CSV import source and reads the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be read or repeats a column.
    pub fn new(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| Error::operation("read_csv_headers", e))?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if i == 0 {
                    h.trim_start_matches(BYTE_ORDER_MARK).to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        let mut seen = HashSet::new();
        for header in &headers {
            if !header.is_empty() && !seen.insert(header.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "CSV header repeats column '{header}'"
                )));
            }
        }

        Ok(Self {
            reader: csv_reader,
            headers,
            position: 0,
        })
    }
}

impl<R: Read> ImportSource for CsvImportSource<R> {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next(&mut self) -> Result<Option<RawRow>> {
        let mut record = csv::StringRecord::new();

        let has_record = self
            .reader
            .read_record(&mut record)
            .map_err(|e| Error::operation("read_csv", e))?;
        if !has_record {
            return Ok(None);
        }
        self.position += 1;

        let cells: IndexMap<String, String> = self
            .headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell.to_string()))
            .collect();

        Ok(Some(RawRow {
            position: self.position,
            cells,
        }))
    }
}

/// CSV export sink.
pub struct CsvExportSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvExportSink<W> {
    /// Creates a new CSV export sink.
    #[must_use]
    pub fn new(writer: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        Self { writer }
    }
}

impl<W: Write> ExportSink for CsvExportSink<W> {
    fn write_header(&mut self, columns: &[String]) -> Result<()> {
        self.writer
            .write_record(columns)
            .map_err(|e| Error::operation("write_csv_headers", e))
    }

    fn write_row(&mut self, cells: &[String]) -> Result<()> {
        self.writer
            .write_record(cells)
            .map_err(|e| Error::operation("write_csv", e))
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::operation("flush_csv", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_import_basic_csv() {
        let input = "---,id,tags\nfire,01A,\"(\"\"a\"\",\"\"b\"\")\"\n  ,01B , \n";
        let mut source = CsvImportSource::new(Cursor::new(input)).unwrap();
        assert_eq!(source.headers(), ["---", "id", "tags"]);

        let first = source.next().unwrap().unwrap();
        assert_eq!(first.position, 1);
        assert_eq!(first.get("id"), Some("01A"));
        assert_eq!(first.get("tags"), Some(r#"("a","b")"#));

        let second = source.next().unwrap().unwrap();
        assert_eq!(second.position, 2);
        assert_eq!(second.get("id"), Some("01B"));
        assert_eq!(second.get("tags"), Some(""));

        assert!(source.next().unwrap().is_none());
    }

    #[test]
    fn test_import_short_row_and_bom() {
        let input = "\u{feff}id,name,level\n01A,Blade\n";
        let mut source = CsvImportSource::new(Cursor::new(input)).unwrap();
        assert_eq!(source.headers()[0], "id");

        let row = source.next().unwrap().unwrap();
        assert_eq!(row.get("name"), Some("Blade"));
        assert_eq!(row.get("level"), None);
    }

    #[test]
    fn test_import_duplicate_header() {
        let input = "id,name,name\n";
        assert!(matches!(
            CsvImportSource::new(Cursor::new(input)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_export_quotes_when_needed() {
        let mut output = Vec::new();
        {
            let mut sink = CsvExportSink::new(&mut output);
            sink.write_header(&["---".to_string(), "tags".to_string()])
                .unwrap();
            sink.write_row(&["fire".to_string(), r#"("a","b")"#.to_string()])
                .unwrap();
            Box::new(sink).finalize().unwrap();
        }

        let output_str = String::from_utf8(output).unwrap();
        assert_eq!(output_str, "---,tags\nfire,\"(\"\"a\"\",\"\"b\"\")\"\n");
    }
}
