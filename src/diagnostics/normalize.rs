//! Argument normalization for diagnostics tool calls.
//!
//! Language models routinely send arguments that violate the declared schema:
//! the string `"[]"` where an array was expected, `"all"` or `"None"` where the
//! field should simply have been left out. Everything a caller can send is
//! mapped here, in one place, to either a canonical value or an
//! [`AdapterError::InvalidArgument`].
//!
//! | field                     | input                                   | result            |
//! |---------------------------|-----------------------------------------|-------------------|
//! | `severity`                | absent, `null`, `""`, `"all"`, `"none"` | `None`            |
//! | `severity`                | `error`, `warning`/`warn`, `info`, `hidden` | `Some(level)` |
//! | `severity`                | anything else                           | `InvalidArgument` |
//! | `include`, `diagnostics`  | absent, `null`, `"[]"`, `[]`, `"None"`  | `None`            |
//! | `include`, `diagnostics`  | non-empty array of strings              | `Some(entries)`   |
//! | `include`, `diagnostics`  | JSON array encoded in a string          | decoded, same rules |
//! | `include`, `diagnostics`  | any other non-empty string              | `Some([string])`  |
//! | `include`, `diagnostics`  | non-string entry, number, bool, object  | `InvalidArgument` |
//! | `include`, `diagnostics`  | empty entry or entry starting with `-`  | `InvalidArgument` |
//! | `include`                 | entry with a glob character (`*?[]{}`)  | `InvalidArgument` |
//! | `path`                    | absent, `null`, `""`                    | `None`            |
//! | `path`                    | non-string                              | `InvalidArgument` |

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::adapter::AdapterError;

pub const FIELD_PATH: &str = "path";
pub const FIELD_SEVERITY: &str = "severity";
pub const FIELD_INCLUDE: &str = "include";
pub const FIELD_DIAGNOSTICS: &str = "diagnostics";

/// Severity applied when the caller did not ask for a specific one.
pub const DEFAULT_SEVERITY: Severity = Severity::Warning;

/// Textual stand-ins callers use to mean "no severity filter".
const SEVERITY_ABSENT_FORMS: &[&str] = &["", "all", "none"];
const LIST_ABSENT_FORMS: &[&str] = &["none", "null"];
const GLOB_CHARS: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Diagnostic severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Hidden,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Hidden => "hidden",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hidden" => Ok(Severity::Hidden),
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!(
                "unsupported value \"{other}\" (expected one of: error, warning, info, hidden, or all)"
            )),
        }
    }
}

/// Strictly typed arguments handed to a [`Runner`](super::runner::Runner).
///
/// `None` is the absent-value marker: no filter requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub path: Option<String>,
    pub severity: Option<Severity>,
    pub include: Option<Vec<String>>,
    pub diagnostics: Option<Vec<String>>,
}

impl NormalizedQuery {
    /// Normalize a raw tool request.
    ///
    /// `null` is accepted as an empty request. Unknown keys are ignored.
    pub fn from_request(request: &Value) -> Result<Self, AdapterError> {
        let empty = Map::new();
        let fields = match request {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(AdapterError::invalid(
                    "arguments",
                    format!("expected an object, got {}", json_type_name(other)),
                ));
            }
        };

        Ok(Self {
            path: normalize_path(fields.get(FIELD_PATH))?,
            severity: normalize_severity(fields.get(FIELD_SEVERITY))?,
            include: normalize_list(FIELD_INCLUDE, fields.get(FIELD_INCLUDE))?,
            diagnostics: normalize_list(FIELD_DIAGNOSTICS, fields.get(FIELD_DIAGNOSTICS))?,
        })
    }

    /// Severity threshold the runner must apply.
    pub fn effective_severity(&self) -> Severity {
        self.severity.unwrap_or(DEFAULT_SEVERITY)
    }

    /// Canonical request form of this query. Absent fields are omitted, so
    /// feeding the result back through [`from_request`](Self::from_request)
    /// yields the same query.
    pub fn to_request(&self) -> Value {
        let mut map = Map::new();
        if let Some(path) = &self.path {
            map.insert(FIELD_PATH.to_string(), Value::String(path.clone()));
        }
        if let Some(severity) = self.severity {
            map.insert(
                FIELD_SEVERITY.to_string(),
                Value::String(severity.as_str().to_string()),
            );
        }
        if let Some(include) = &self.include {
            map.insert(FIELD_INCLUDE.to_string(), string_array(include));
        }
        if let Some(diagnostics) = &self.diagnostics {
            map.insert(FIELD_DIAGNOSTICS.to_string(), string_array(diagnostics));
        }
        Value::Object(map)
    }
}

pub fn normalize_severity(value: Option<&Value>) -> Result<Option<Severity>, AdapterError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if SEVERITY_ABSENT_FORMS
                .iter()
                .any(|form| trimmed.eq_ignore_ascii_case(form))
            {
                return Ok(None);
            }
            trimmed
                .parse::<Severity>()
                .map(Some)
                .map_err(|reason| AdapterError::invalid(FIELD_SEVERITY, reason))
        }
        Some(other) => Err(AdapterError::invalid(
            FIELD_SEVERITY,
            format!("expected a string, got {}", json_type_name(other)),
        )),
    }
}

pub fn normalize_list(
    field: &str,
    value: Option<&Value>,
) -> Result<Option<Vec<String>>, AdapterError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => collect_strings(field, items),
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty()
                || trimmed == "[]"
                || LIST_ABSENT_FORMS
                    .iter()
                    .any(|form| trimmed.eq_ignore_ascii_case(form))
            {
                return Ok(None);
            }
            if trimmed.starts_with('[') {
                return match serde_json::from_str::<Vec<Value>>(trimmed) {
                    Ok(items) => collect_strings(field, &items),
                    Err(e) => Err(AdapterError::invalid(
                        field,
                        format!("could not decode list \"{trimmed}\": {e}"),
                    )),
                };
            }
            check_entry(field, 0, raw)?;
            Ok(Some(vec![raw.clone()]))
        }
        Some(other) => Err(AdapterError::invalid(
            field,
            format!(
                "expected an array of strings, got {}",
                json_type_name(other)
            ),
        )),
    }
}

pub fn normalize_path(value: Option<&Value>) -> Result<Option<String>, AdapterError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => Ok(Some(raw.clone())),
        Some(other) => Err(AdapterError::invalid(
            FIELD_PATH,
            format!("expected a string, got {}", json_type_name(other)),
        )),
    }
}

fn collect_strings(field: &str, items: &[Value]) -> Result<Option<Vec<String>>, AdapterError> {
    if items.is_empty() {
        return Ok(None);
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(s) => check_entry(field, index, s).map(|()| s.clone()),
            other => Err(AdapterError::invalid(
                field,
                format!(
                    "entry {index} must be a string, got {}",
                    json_type_name(other)
                ),
            )),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Entries are passed to the analyzer as literal arguments: no options, and
/// no glob patterns in `include`.
fn check_entry(field: &str, index: usize, entry: &str) -> Result<(), AdapterError> {
    let trimmed = entry.trim();
    if trimmed.is_empty() {
        return Err(AdapterError::invalid(
            field,
            format!("entry {index} is empty"),
        ));
    }
    if trimmed.starts_with('-') {
        return Err(AdapterError::invalid(
            field,
            format!("entry {index} (\"{entry}\") must not start with '-'"),
        ));
    }
    if field == FIELD_INCLUDE && trimmed.contains(GLOB_CHARS) {
        return Err(AdapterError::invalid(
            field,
            format!("entry {index} (\"{entry}\") is a glob pattern, list literal paths instead"),
        ));
    }
    Ok(())
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
