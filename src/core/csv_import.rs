//! CSV import of wish list items
//!
//! The importer is a pure function from text to records: it never touches
//! the project store. Callers persist the returned items as a separate step.
//!
//! Accepted layout:
//!
//! ```text
//! name,url,imagePaths
//! Desk lamp,https://example.com/lamp,lamp-front.jpg;lamp-side.jpg
//! "Shelf, oak",,
//! ```
//!
//! Column names are matched case-insensitively. `name` is required; `url`
//! and `imagePaths` are optional. Any other column is rejected. Import is
//! all-or-nothing: the first bad row aborts the whole file.

use miette::Diagnostic;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::entity::FieldError;
use crate::entities::wish_item::{split_image_paths, WishItem};

const NAME: &str = "name";
const URL: &str = "url";
const IMAGE_PATHS: &str = "imagePaths";

/// Columns in the order they are documented
pub const COLUMNS: [&str; 3] = [NAME, URL, IMAGE_PATHS];
const REQUIRED_COLUMNS: [&str; 1] = [NAME];

/// Reasons an import is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ImportError {
    #[error("The CSV file is empty.")]
    #[diagnostic(code(stash::import::empty_file))]
    EmptyFile,

    #[error("The CSV file must contain at least a header row and one data row.")]
    #[diagnostic(
        code(stash::import::insufficient_data),
        help("Generate a starting file with `stash wish import --template`")
    )]
    InsufficientData,

    #[error("Missing required column: '{0}'")]
    #[diagnostic(
        code(stash::import::missing_column),
        help("The header row must contain a 'name' column")
    )]
    MissingRequiredColumn(String),

    #[error("Unknown column: '{0}'. Only 'name', 'url', and 'imagePaths' are allowed.")]
    #[diagnostic(code(stash::import::unknown_column))]
    UnknownColumn(String),

    #[error("Line {line} has a different number of columns than the header.")]
    #[diagnostic(
        code(stash::import::inconsistent_columns),
        help("Wrap values containing commas in double quotes")
    )]
    InconsistentColumns { line: usize },

    #[error("Invalid data on line {line}: {source}")]
    #[diagnostic(code(stash::import::invalid_data))]
    InvalidData {
        line: usize,
        #[source]
        source: FieldError,
    },

    #[error("Could not read {}: {message}", .path.display())]
    #[diagnostic(code(stash::import::read_failed))]
    ReadFailed { path: PathBuf, message: String },
}

/// Case-insensitive header name to column index
#[derive(Debug)]
struct ColumnMap(HashMap<String, usize>);

impl ColumnMap {
    fn from_header(header: &[String]) -> Self {
        Self(
            header
                .iter()
                .enumerate()
                .map(|(i, column)| (column.to_lowercase(), i))
                .collect(),
        )
    }

    fn get(&self, column: &str) -> Option<usize> {
        self.0.get(&column.to_lowercase()).copied()
    }
}

/// Parse CSV text into validated wish list items.
///
/// Lines end with `\n`, `\r\n` or a lone `\r`. Blank lines are dropped
/// before numbering, so the header is line 1 and data row *i* is line *i + 1*.
pub fn parse_wish_list(content: &str) -> Result<Vec<WishItem>, ImportError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    let rows: Vec<(usize, &str)> = content
        .split(['\r', '\n'])
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .collect();
    if rows.len() < 2 {
        return Err(ImportError::InsufficientData);
    }

    let header = parse_line(rows[0].1);
    validate_header(&header)?;
    let columns = ColumnMap::from_header(&header);

    tracing::debug!(columns = ?header, rows = rows.len() - 1, "parsing wish list CSV");

    let mut items = Vec::with_capacity(rows.len() - 1);
    for &(line, text) in &rows[1..] {
        let fields = parse_line(text);
        if fields.len() != header.len() {
            return Err(ImportError::InconsistentColumns { line });
        }

        let item = build_item(&fields, &columns)
            .map_err(|source| ImportError::InvalidData { line, source })?;
        items.push(item);
    }

    Ok(items)
}

/// Read a file and parse it as a wish list.
///
/// The file handle is released as soon as the read finishes, whether or
/// not parsing succeeds.
pub fn import_file(path: &Path) -> Result<Vec<WishItem>, ImportError> {
    let content = read_to_string(path)?;
    parse_wish_list(&content)
}

fn read_to_string(path: &Path) -> Result<String, ImportError> {
    let read_failed = |e: std::io::Error| ImportError::ReadFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut file = File::open(path).map_err(read_failed)?;
    let mut content = String::new();
    file.read_to_string(&mut content).map_err(read_failed)?;
    Ok(content)
}

/// Split one CSV line into trimmed fields.
///
/// A double quote toggles quoted mode and is not kept; commas inside quotes
/// belong to the field.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

fn validate_header(header: &[String]) -> Result<(), ImportError> {
    for required in REQUIRED_COLUMNS {
        if !header.iter().any(|c| c.eq_ignore_ascii_case(required)) {
            return Err(ImportError::MissingRequiredColumn(required.to_string()));
        }
    }

    if let Some(unknown) = header
        .iter()
        .find(|c| !COLUMNS.iter().any(|allowed| c.eq_ignore_ascii_case(allowed)))
    {
        return Err(ImportError::UnknownColumn(unknown.clone()));
    }

    Ok(())
}

fn build_item(fields: &[String], columns: &ColumnMap) -> Result<WishItem, FieldError> {
    let field = |column: &str| columns.get(column).and_then(|i| fields.get(i));

    let name = field(NAME).ok_or_else(|| FieldError::MissingRequiredColumn(NAME.to_string()))?;
    let url = field(URL).map(String::as_str);
    let image_paths = field(IMAGE_PATHS)
        .map(|paths| split_image_paths(paths))
        .unwrap_or_default();

    WishItem::new(name, url, image_paths)
}

/// A header plus one example row, suitable for `stash wish import --template`
pub fn template() -> String {
    format!(
        "{}\nDesk lamp,https://example.com/lamp,lamp-front.jpg;lamp-side.jpg\n",
        COLUMNS.join(",")
    )
}
