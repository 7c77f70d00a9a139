//! Strict request-body validation that reports every problem it finds.
//!
//! Handlers read the raw body and run it through [`parse_body`]; on failure the
//! caller gets the full list of [`Issue`]s instead of a single serde message.

use base64::{
    alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidJson,
    InvalidType,
    UnrecognizedKeys,
    InvalidFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub path: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
}

impl Issue {
    fn new(code: IssueCode, path: &[&str], message: String) -> Self {
        Self {
            code,
            path: path.iter().map(|s| s.to_string()).collect(),
            message,
            expected: None,
            keys: Vec::new(),
            format: None,
        }
    }

    pub fn invalid_json(err: &serde_json::Error) -> Self {
        Self::new(IssueCode::InvalidJson, &[], format!("Invalid JSON body: {}", err))
    }

    pub fn invalid_type(path: &[&str], expected: &'static str, received: Option<&Value>) -> Self {
        let received = received.map(type_name).unwrap_or("undefined");
        Self {
            expected: Some(expected),
            ..Self::new(
                IssueCode::InvalidType,
                path,
                format!("Invalid input: expected {}, received {}", expected, received),
            )
        }
    }

    pub fn unrecognized_keys(path: &[&str], keys: Vec<String>) -> Self {
        let quoted = keys
            .iter()
            .map(|k| format!("\"{}\"", k))
            .collect::<Vec<_>>()
            .join(", ");
        let noun = if keys.len() == 1 { "key" } else { "keys" };
        Self {
            keys,
            ..Self::new(
                IssueCode::UnrecognizedKeys,
                path,
                format!("Unrecognized {}: {}", noun, quoted),
            )
        }
    }

    pub fn invalid_format(path: &[&str], format: &'static str, message: &str) -> Self {
        Self {
            format: Some(format),
            ..Self::new(IssueCode::InvalidFormat, path, message.to_string())
        }
    }
}

/// Standard-alphabet base64 with canonical padding that, like browser `atob`,
/// ignores non-zero bits in the final symbol.
pub const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Types that can be built from an untrusted JSON value.
pub trait Validate: Sized {
    fn validate(value: &Value) -> Result<Self, Vec<Issue>>;
}

pub fn parse_body<T: Validate>(body: &[u8]) -> Result<T, Vec<Issue>> {
    let value: Value = serde_json::from_slice(body).map_err(|e| vec![Issue::invalid_json(&e)])?;
    T::validate(&value)
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Collects issues while walking a value.
#[derive(Debug, Default)]
pub struct Checker {
    issues: Vec<Issue>,
    unknown_keys: Vec<Issue>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn object<'a>(
        &mut self,
        value: Option<&'a Value>,
        path: &[&str],
    ) -> Option<&'a Map<String, Value>> {
        match value {
            Some(Value::Object(map)) => Some(map),
            other => {
                self.push(Issue::invalid_type(path, "object", other));
                None
            }
        }
    }

    pub fn string<'a>(&mut self, value: Option<&'a Value>, path: &[&str]) -> Option<&'a str> {
        match value {
            Some(Value::String(s)) => Some(s.as_str()),
            other => {
                self.push(Issue::invalid_type(path, "string", other));
                None
            }
        }
    }

    /// Rejects keys of `map` not listed in `allowed`. Reported after the
    /// field issues.
    pub fn strict(&mut self, map: &Map<String, Value>, allowed: &[&str], path: &[&str]) {
        let extra: Vec<String> = map
            .keys()
            .filter(|k| !allowed.contains(&k.as_str()))
            .cloned()
            .collect();
        if !extra.is_empty() {
            self.unknown_keys.push(Issue::unrecognized_keys(path, extra));
        }
    }

    pub fn finish<T>(mut self, value: Option<T>) -> Result<T, Vec<Issue>> {
        self.issues.append(&mut self.unknown_keys);
        match value {
            Some(v) if self.issues.is_empty() => Ok(v),
            _ => Err(self.issues),
        }
    }
}
