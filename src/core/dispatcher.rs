//! Request Dispatcher
//!
//! Resolves a tool by name, validates and coerces the caller's arguments
//! against the tool's schema, then invokes the handler. Every failure is
//! returned as a [`DispatchError`]; nothing here panics on caller input.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::registry::{ParamSpec, ParamType, ToolDefinition, ToolRegistry};

/// An inbound tool call: tool name plus raw JSON arguments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvocationRequest {
    #[serde(rename = "name")]
    pub tool_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub arguments: Map<String, Value>,
}

/// `"arguments": null` reads as no arguments.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Outcome of a single dispatch.
pub type InvocationResult = Result<Value, DispatchError>;

/// Category of a dispatch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Handler,
}

impl ErrorKind {
    /// Name reported to callers in error payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Handler => "HandlerError",
        }
    }
}

/// One argument that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Why a dispatch did not produce a value.
#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Invalid arguments for tool {tool}: {}", join_fields(.fields))]
    Validation { tool: String, fields: Vec<FieldError> },

    #[error("{0}")]
    Handler(String),
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::NotFound(_) => ErrorKind::NotFound,
            DispatchError::Validation { .. } => ErrorKind::Validation,
            DispatchError::Handler(_) => ErrorKind::Handler,
        }
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A validated argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Integer(i64),
    Number(f64),
    String(String),
    Boolean(bool),
}

impl ArgValue {
    fn to_json(&self) -> Value {
        match self {
            ArgValue::Integer(i) => Value::from(*i),
            ArgValue::Number(n) => Value::from(*n),
            ArgValue::String(s) => Value::from(s.as_str()),
            ArgValue::Boolean(b) => Value::from(*b),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Integer(i) => write!(f, "{i}"),
            ArgValue::Number(n) => write!(f, "{n}"),
            ArgValue::String(s) => write!(f, "{s}"),
            ArgValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Arguments that passed schema validation, in schema order.
///
/// Only the dispatcher constructs these, so a handler can rely on every
/// required parameter being present with its declared type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: Vec<(String, ArgValue)>,
}

impl ToolArguments {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ArgValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(ArgValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ArgValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ArgValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// JSON object view, used for structured logging.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(n, v)| (n.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// Routes invocation requests to the tools of a registry.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r ToolRegistry,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r ToolRegistry) -> Self {
        Self { registry }
    }

    /// Resolve, validate and invoke.
    ///
    /// The handler only runs when every declared argument validated.
    pub fn dispatch(&self, request: &InvocationRequest) -> InvocationResult {
        let tool = self
            .registry
            .lookup(&request.tool_name)
            .map_err(|_| DispatchError::NotFound(request.tool_name.clone()))?;

        let args = validate(tool, &request.arguments)?;
        debug!(tool = tool.name(), arguments = %args.to_json(), "Dispatching tool call");

        tool.invoke(&args).map_err(DispatchError::Handler)
    }
}

/// Check `raw` against the tool's schema, collecting every bad field.
pub fn validate(tool: &ToolDefinition, raw: &Map<String, Value>) -> Result<ToolArguments, DispatchError> {
    let mut values = Vec::with_capacity(tool.params().len());
    let mut fields = Vec::new();

    for spec in tool.params() {
        match raw.get(&spec.name) {
            None | Some(Value::Null) if spec.required => fields.push(FieldError {
                field: spec.name.clone(),
                message: "field required".to_string(),
            }),
            None | Some(Value::Null) => {}
            Some(value) => match coerce(spec, value) {
                Ok(v) => values.push((spec.name.clone(), v)),
                Err(message) => fields.push(FieldError {
                    field: spec.name.clone(),
                    message,
                }),
            },
        }
    }

    for extra in raw.keys().filter(|k| !tool.params().iter().any(|p| &p.name == *k)) {
        debug!(tool = tool.name(), argument = %extra, "Ignoring undeclared argument");
    }

    if fields.is_empty() {
        Ok(ToolArguments { values })
    } else {
        Err(DispatchError::Validation {
            tool: tool.name().to_string(),
            fields,
        })
    }
}

fn coerce(spec: &ParamSpec, value: &Value) -> Result<ArgValue, String> {
    let expected = || format!("expected {}, got {}", spec.ty, describe(value));

    match spec.ty {
        ParamType::Integer => coerce_integer(value).ok_or_else(expected).map(ArgValue::Integer),
        ParamType::Number => match value {
            Value::Number(n) => n.as_f64().map(ArgValue::Number).ok_or_else(expected),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(ArgValue::Number)
                .ok_or_else(expected),
            _ => Err(expected()),
        },
        ParamType::String => match value {
            Value::String(s) => Ok(ArgValue::String(s.clone())),
            _ => Err(expected()),
        },
        ParamType::Boolean => match value {
            Value::Bool(b) => Ok(ArgValue::Boolean(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(ArgValue::Boolean(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(ArgValue::Boolean(false)),
            _ => Err(expected()),
        },
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
