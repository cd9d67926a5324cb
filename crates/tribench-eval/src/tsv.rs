//! Tab-separated system output
//!
//! The scorer reads headerless, index-free TSV with the columns
//! `sentence_id, subject, relation, object`. Fields containing a tab, a line
//! break or a double quote are quoted, with inner quotes doubled.

use std::borrow::Cow;
use std::io::{BufWriter, Write};
use std::path::Path;

use tribench_core::{BenchError, OutputRow, Result};

const COLUMNS: usize = 4;

fn needs_quoting(field: &str) -> bool {
    field.contains(&['\t', '\n', '\r', '"'][..])
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if needs_quoting(field) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Write rows to any writer
pub fn write_rows_to<W: Write>(mut writer: W, rows: &[OutputRow]) -> std::io::Result<()> {
    for row in rows {
        let [sentence_id, subject, relation, object] = row.fields();
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            escape_field(sentence_id),
            escape_field(subject),
            escape_field(relation),
            escape_field(object),
        )?;
    }
    writer.flush()
}

/// Write rows to a file, creating parent directories as needed
pub fn write_rows(path: &Path, rows: &[OutputRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
    }

    let file = std::fs::File::create(path).map_err(|e| BenchError::io(path, e))?;
    write_rows_to(BufWriter::new(file), rows).map_err(|e| BenchError::io(path, e))
}

/// Read rows back from a file
pub fn read_rows(path: &Path) -> Result<Vec<OutputRow>> {
    let content = std::fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
    parse_rows(&content, path)
}

/// Parse TSV content. `source` is only used in error messages.
pub fn parse_rows(content: &str, source: &Path) -> Result<Vec<OutputRow>> {
    let malformed = |line: usize, reason: String| BenchError::MalformedTable {
        path: source.to_path_buf(),
        line,
        reason,
    };

    let mut rows = Vec::new();
    for (line, record) in split_records(content).map_err(|line| {
        malformed(line, "unterminated quoted field".to_string())
    })? {
        // Blank line
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }

        let Ok([sentence_id, subject, relation, object]) = <[String; COLUMNS]>::try_from(record)
        else {
            return Err(malformed(line, format!("expected {COLUMNS} columns")));
        };

        rows.push(OutputRow {
            sentence_id,
            subject,
            relation,
            object,
        });
    }

    Ok(rows)
}

/// Split content into records of fields, tagged with their starting line.
/// On an unterminated quote, returns the line the quote opened on.
fn split_records(content: &str) -> std::result::Result<Vec<(usize, Vec<String>)>, usize> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();

    let mut line = 1;
    let mut record_line = 1;
    let mut quote_line = 1;
    let mut in_quotes = false;
    let mut at_field_start = true;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if at_field_start => {
                in_quotes = true;
                quote_line = line;
                at_field_start = false;
            }
            '\t' => {
                record.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut record)));
                line += 1;
                record_line = line;
                at_field_start = true;
            }
            _ => {
                field.push(c);
                at_field_start = false;
            }
        }
    }

    if in_quotes {
        return Err(quote_line);
    }
    if !record.is_empty() || !field.is_empty() {
        record.push(field);
        records.push((record_line, record));
    }

    Ok(records)
}
