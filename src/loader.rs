use crate::error::{Result, ViewError};
use crate::field::FieldRegistry;
use crate::record::{Record, Value};
use log::debug;
use serde_json::Value as Json;
use std::fs;
use std::path::Path;

fn load_error(path: &Path, reason: impl Into<String>) -> ViewError {
    ViewError::Load {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Types a raw value for `field`: registered fields are coerced to their
/// semantic type, anything else is kept as given.
fn typed(registry: &FieldRegistry, field: &str, value: Value) -> Value {
    match registry.resolve(field) {
        Ok(descriptor) => value.coerce(descriptor.semantic_type),
        Err(_) => value,
    }
}

/// Load records from a JSON file holding an array of objects.
///
/// Every object needs an `id` (string or number). Strings and numbers are
/// typed by the field registry, booleans become text (`"true"`/`"false"`),
/// nulls are skipped and nested values are stored as their JSON text.
///
/// # Examples
/// ```no_run
/// use gridview::field::FieldRegistry;
/// use gridview::loader::from_json;
///
/// match from_json("tasks.json", &FieldRegistry::standard()) {
///     Ok(records) => println!("Loaded {} records", records.len()),
///     Err(e) => eprintln!("Error loading JSON: {}", e),
/// }
/// ```
pub fn from_json(filepath: impl AsRef<Path>, registry: &FieldRegistry) -> Result<Vec<Record>> {
    let path = filepath.as_ref();
    let text = fs::read_to_string(path)?;
    let json: Json = serde_json::from_str(&text)?;
    let Json::Array(rows) = json else {
        return Err(load_error(path, "expected a JSON array of records"));
    };

    let mut records = Vec::with_capacity(rows.len());
    for (pos, row) in rows.into_iter().enumerate() {
        let Json::Object(object) = row else {
            return Err(load_error(path, format!("entry {} is not an object", pos)));
        };
        let id = match object.get("id") {
            Some(Json::String(s)) => s.clone(),
            Some(Json::Number(n)) => n.to_string(),
            _ => return Err(load_error(path, format!("entry {} has no id", pos))),
        };

        let mut record = Record::new(id);
        for (field, raw) in object {
            if field == "id" {
                continue;
            }
            let value = match raw {
                Json::Null => continue,
                Json::String(s) => Value::Text(s),
                Json::Number(n) => match n.as_f64() {
                    Some(f) => Value::Number(f),
                    None => Value::Text(n.to_string()),
                },
                Json::Bool(b) => Value::Text(b.to_string()),
                other => Value::Text(other.to_string()),
            };
            let value = typed(registry, &field, value);
            record.set(field, value);
        }
        records.push(record);
    }

    debug!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Load records from a CSV file whose first line names the fields.
///
/// A column called `id` is required. Quoted fields may contain commas and
/// doubled quotes; empty cells are left out of the record.
pub fn from_csv(filepath: impl AsRef<Path>, registry: &FieldRegistry) -> Result<Vec<Record>> {
    let path = filepath.as_ref();
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| load_error(path, "CSV file is empty"))?;
    let columns = parse_csv_row(header);
    let id_col = columns
        .iter()
        .position(|c| c.trim() == "id")
        .ok_or_else(|| load_error(path, "CSV header has no id column"))?;

    let mut records = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let cells = parse_csv_row(line);
        let id = cells
            .get(id_col)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| load_error(path, format!("row {} has no id", line_no + 2)))?;

        let mut record = Record::new(id);
        for (c, cell) in cells.into_iter().enumerate() {
            if c == id_col || cell.is_empty() {
                continue;
            }
            // Skip extra data past the header
            let Some(field) = columns.get(c) else {
                continue;
            };
            let field = field.trim();
            record.set(field, typed(registry, field, Value::Text(cell)));
        }
        records.push(record);
    }

    debug!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

// Parse a CSV row into a vector of strings
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Doubled quote inside a quoted field
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                result.push(std::mem::take(&mut current_field));
            }
            _ => {
                current_field.push(c);
            }
        }
    }

    result.push(current_field);
    result
}

/// Detect file type and load appropriate format
///
/// Dispatches on the file extension: `.json` or `.csv`.
pub fn load_records(filepath: impl AsRef<Path>, registry: &FieldRegistry) -> Result<Vec<Record>> {
    let path = filepath.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("json") => from_json(path, registry),
        Some("csv") => from_csv(path, registry),
        Some(ext) => Err(load_error(path, format!("unsupported file extension: {}", ext))),
        None => Err(load_error(path, "file has no extension")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_handle_quotes() {
        assert_eq!(
            parse_csv_row(r#"1,"Smith, Jane","say ""hi""",x"#),
            vec!["1", "Smith, Jane", r#"say "hi""#, "x"]
        );
        assert_eq!(parse_csv_row("a,,b"), vec!["a", "", "b"]);
    }
}
