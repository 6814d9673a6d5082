use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;

/// A parsed delimited table: header row plus data rows, cells as raw text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Column index by header name, case-insensitive.
    pub fn column_index(&self) -> HashMap<String, usize> {
        let mut idx = HashMap::new();
        for (i, name) in self.header.iter().enumerate() {
            idx.entry(normalize_key(name)).or_insert(i);
        }
        idx
    }
}

fn normalize_key(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

/// Returns the cell in `col` of `row`, trimmed, or `None` when absent or blank.
pub fn cell(row: &[String], col: Option<usize>) -> Option<String> {
    col.and_then(|c| row.get(c)).and_then(|s| non_empty_trimmed(s))
}

pub fn lookup(idx: &HashMap<String, usize>, name: &str) -> Option<usize> {
    idx.get(&normalize_key(name)).copied()
}

pub fn non_empty_trimmed(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Parses CSV text. Quoted fields may span lines; fully blank lines are skipped.
pub fn parse_table(text: &str) -> Table {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = parse_records(text).into_iter();
    let Some(header) = records.next() else {
        return Table::default();
    };
    Table {
        header: header.into_iter().map(|h| h.trim().to_string()).collect(),
        rows: records.collect(),
    }
}

fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut out: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut touched = false;
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' {
            if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                buf.push('"');
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
            touched = true;
            i += 1;
            continue;
        }
        if !in_quotes && ch == ',' {
            record.push(std::mem::take(&mut buf));
            touched = true;
            i += 1;
            continue;
        }
        if !in_quotes && (ch == '\n' || ch == '\r') {
            if ch == '\r' && i + 1 < chars.len() && chars[i + 1] == '\n' {
                i += 1;
            }
            if touched || !buf.is_empty() {
                record.push(std::mem::take(&mut buf));
                out.push(std::mem::take(&mut record));
            }
            touched = false;
            i += 1;
            continue;
        }
        buf.push(ch);
        i += 1;
    }
    if touched || !buf.is_empty() {
        record.push(buf);
        out.push(record);
    }
    out
}

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Renders a header and rows as CSV text. `None` cells are written empty.
pub fn render_table<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<Option<String>>>,
{
    let mut csv = header
        .iter()
        .map(|h| csv_quote(h))
        .collect::<Vec<_>>()
        .join(",");
    csv.push('\n');
    for row in rows {
        let line = row
            .iter()
            .map(|c| c.as_deref().map(csv_quote).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&line);
        csv.push('\n');
    }
    csv
}

/// Reads a table from disk. A missing file yields `Ok(None)`.
pub fn read_table(path: &Path) -> anyhow::Result<Option<Table>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read table {}", path.to_string_lossy()))?;
    Ok(Some(parse_table(&text)))
}

/// Outcome of a bulk save: rows written and rows dropped by the save rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSummary {
    pub saved: usize,
    pub dropped: usize,
}

/// Overwrites `path` with `contents`, creating parent directories first.
pub fn write_text_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))
}
