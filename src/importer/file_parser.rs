// ==========================================
// Vending Sales Ingest - CSV tokenizer
// ==========================================
// Whole file in memory; header + fields trimmed; blank lines skipped;
// a row whose column count differs from the header is MalformedCsv,
// and so is a quoted field still open at end of input.
// ==========================================

use crate::domain::vending::{ParsedTable, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sales_importer_trait::FileParser;
use csv::{ReaderBuilder, Trim};
use std::path::Path;

// ==========================================
// CsvParser
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_content(&self, content: &str) -> ImportResult<ParsedTable> {
        // Excel exports often start with a BOM
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        // The csv reader closes an open quote at EOF without complaint
        if let Some(line) = unclosed_quote_line(content) {
            return Err(ImportError::MalformedCsv(format!(
                "quoted field opened on line {} is not closed",
                line
            )));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let row = RawRow {
                row_number: row_idx + 1,
                values: headers
                    .iter()
                    .cloned()
                    .zip(record.iter().map(|v| v.trim().to_string()))
                    .collect(),
            };

            // Skip rows that are nothing but delimiters
            if row.is_blank() {
                continue;
            }

            rows.push(row);
        }

        Ok(ParsedTable { headers, rows })
    }

    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedTable> {
        let content = read_csv_file(file_path)?;
        self.parse_content(&content)
    }
}

/// Line (1-based) of a quoted field left open at end of input.
///
/// A quote opens a field only at field start; inside it `""` is an
/// escaped quote. Elsewhere a quote is literal, as the reader treats it.
fn unclosed_quote_line(content: &str) -> Option<usize> {
    let mut chars = content.chars().peekable();
    let mut line = 1;
    let mut field_start = true;
    let mut open_since: Option<usize> = None;

    while let Some(c) = chars.next() {
        if open_since.is_some() {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                }
                '"' => {
                    open_since = None;
                    field_start = false;
                }
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }

        match c {
            '"' if field_start => open_since = Some(line),
            ',' => field_start = true,
            '\n' => {
                line += 1;
                field_start = true;
            }
            '\r' => field_start = true,
            _ => field_start = false,
        }
    }

    open_since
}

/// Read a .csv file into memory after the existence and extension checks.
pub fn read_csv_file(path: &Path) -> ImportResult<String> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(ImportError::UnsupportedFormat(path.display().to_string()));
    }

    Ok(std::fs::read_to_string(path)?)
}
