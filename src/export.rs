use crate::error::ExportError;
use crate::results::PriceResult;
use crate::utils::sanitize_place;
use std::fs;
use std::mem::take;
use std::path::{Path, PathBuf};

/* ---------------- Writing ---------------- */

/// Quote a field, doubling embedded quotes
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render rows as CSV with a `place,url,price` (or `url,price`) header.
/// Every field is quoted.
pub fn to_csv_string(rows: &[PriceResult], place_column: bool) -> String {
    let header = if place_column {
        "place,url,price"
    } else {
        "url,price"
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header.to_string());
    for row in rows {
        let mut fields = Vec::with_capacity(3);
        if place_column {
            fields.push(quote(&row.place));
        }
        fields.push(quote(&row.url));
        fields.push(quote(&row.price));
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

/// Write `prices-<place>.csv` into `dir`, returning its path
pub fn write_csv(
    dir: &Path,
    place: &str,
    rows: &[PriceResult],
    place_column: bool,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(format!("prices-{}.csv", sanitize_place(place)));
    write_bytes(&path, to_csv_string(rows, place_column).as_bytes())?;
    Ok(path)
}

/// Write a file, creating its parent directory if needed
pub fn write_bytes(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    fs::write(path, contents).map_err(io_err)
}

/* ---------------- Reading ---------------- */

/// Quote-aware CSV parser: `""` inside quotes is a literal quote, and
/// quoted fields may span lines. Blank lines are skipped.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && matches!(chars.peek(), Some('"')) {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    row.push(field);
    if !(row.len() == 1 && row[0].is_empty()) {
        rows.push(row);
    }
    rows
}

/// Read a CSV file back into rows, header included
pub fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, ExportError> {
    let text = fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_rows(&text))
}
