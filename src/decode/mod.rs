// src/decode/mod.rs

use csv::{ErrorKind, ReaderBuilder, StringRecord};
use serde_json::{Map, Number, Value};
use tracing::error;

/// One decoded CSV row: header field name to inferred-type value.
pub type Record = Map<String, Value>;

/// Decode a CSV body into records.
///
/// The first row is the header and defines the field names; fields are
/// comma-delimited, lines `\n`-terminated, empty lines skipped. Each field
/// value is dynamically typed (see [`infer_value`] rules).
///
/// Returns `Some(records)` in input order when parsing reports zero errors.
/// On any parse error, one diagnostic line per error is logged in the form
/// `<error type> <error code> <error message>` and `None` is returned —
/// rows that parsed cleanly are discarded along with the bad ones.
pub fn parse_results(body: &str) -> Option<Vec<Record>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .from_reader(body.as_bytes());

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            Diagnostic::from_csv(&e).emit();
            return None;
        }
    };

    let mut records = Vec::new();
    let mut failed = false;
    for row in reader.records() {
        match row {
            Ok(row) => records.push(to_record(&headers, &row)),
            Err(e) => {
                Diagnostic::from_csv(&e).emit();
                failed = true;
            }
        }
    }

    if failed {
        return None;
    }
    Some(records)
}

fn to_record(headers: &StringRecord, row: &StringRecord) -> Record {
    headers
        .iter()
        .zip(row.iter())
        .map(|(name, raw)| (name.to_string(), infer_value(raw)))
        .collect()
}

/// Dynamic typing for a single field: `true`/`TRUE` and `false`/`FALSE`
/// become booleans, unambiguously numeric text becomes a number, an empty
/// field becomes null, everything else stays a string.
fn infer_value(raw: &str) -> Value {
    match raw {
        "" => Value::Null,
        "true" | "TRUE" => Value::Bool(true),
        "false" | "FALSE" => Value::Bool(false),
        _ => {
            // surrounding whitespace is tolerated for numbers only
            let trimmed = raw.trim_matches(|c: char| c.is_ascii_whitespace());
            if looks_numeric(trimmed) {
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Value::Number(n.into());
                }
                if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
                    return Value::Number(n);
                }
            }
            Value::String(raw.to_string())
        }
    }
}

/// `f64::from_str` accepts words like "inf" and "NaN" and a leading `+`;
/// only coerce digit/point/exponent text with an optional leading minus,
/// where a sign is otherwise allowed in exponent position alone.
fn looks_numeric(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().any(|b| b.is_ascii_digit())
        && bytes.iter().enumerate().all(|(i, &b)| match b {
            b'0'..=b'9' | b'.' | b'e' | b'E' => true,
            b'-' => i == 0 || matches!(bytes[i - 1], b'e' | b'E'),
            b'+' => i > 0 && matches!(bytes[i - 1], b'e' | b'E'),
            _ => false,
        })
}

/// Plain-text decode diagnostic. Logged, never returned to the caller.
struct Diagnostic {
    kind: &'static str,
    code: &'static str,
    message: String,
}

impl Diagnostic {
    fn from_csv(err: &csv::Error) -> Self {
        match err.kind() {
            ErrorKind::UnequalLengths {
                pos,
                expected_len,
                len,
            } => {
                let code = if len < expected_len {
                    "TooFewFields"
                } else {
                    "TooManyFields"
                };
                let line = pos
                    .as_ref()
                    .map(|p| format!(" on line {}", p.line()))
                    .unwrap_or_default();
                Self {
                    kind: "FieldMismatch",
                    code,
                    message: format!(
                        "expected {expected_len} fields, found {len}{line}"
                    ),
                }
            }
            ErrorKind::Utf8 { .. } => Self {
                kind: "Encoding",
                code: "InvalidUtf8",
                message: err.to_string(),
            },
            _ => Self {
                kind: "Parse",
                code: "Error",
                message: err.to_string(),
            },
        }
    }

    fn emit(&self) {
        error!("{} {} {}", self.kind, self.code, self.message);
    }
}
