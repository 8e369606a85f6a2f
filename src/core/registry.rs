//! Tool Registry
//!
//! Maps tool names to their definitions: a description, an ordered input
//! schema, an optional output type and the handler that executes the tool.
//! Definitions are immutable once registered.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use super::dispatcher::ToolArguments;

/// Primitive parameter and result types a tool schema can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    Number,
    String,
    Boolean,
}

impl ParamType {
    /// JSON Schema type name.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
}

/// Tool handler function type.
///
/// Handlers receive arguments that already passed schema validation and
/// return either a JSON result or an error message. They must be
/// Send + Sync to be shared across HTTP worker threads.
pub type ToolHandler = Box<dyn Fn(&ToolArguments) -> Result<Value, String> + Send + Sync>;

/// A named, schema-described callable.
pub struct ToolDefinition {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
    output: Option<ParamType>,
    handler: ToolHandler,
}

impl ToolDefinition {
    /// Create a definition with no parameters.
    ///
    /// Parameters are declared with [`param`](Self::param) and
    /// [`optional_param`](Self::optional_param), in the order callers
    /// should see them.
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&ToolArguments) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            output: None,
            handler: Box::new(handler),
        }
    }

    /// Declare a required parameter. Redeclaring a name replaces it in place.
    pub fn param(self, name: impl Into<String>, ty: ParamType) -> Self {
        self.with_param(name.into(), ty, true)
    }

    /// Declare an optional parameter.
    pub fn optional_param(self, name: impl Into<String>, ty: ParamType) -> Self {
        self.with_param(name.into(), ty, false)
    }

    /// Declare the primitive type of the handler's return value.
    pub fn returns(mut self, ty: ParamType) -> Self {
        self.output = Some(ty);
        self
    }

    fn with_param(mut self, name: String, ty: ParamType, required: bool) -> Self {
        let spec = ParamSpec { name, ty, required };
        match self.params.iter_mut().find(|p| p.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.params.push(spec),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared parameters in declaration order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn output(&self) -> Option<ParamType> {
        self.output
    }

    /// Run the handler. Callers are expected to have validated `args`.
    pub(crate) fn invoke(&self, args: &ToolArguments) -> Result<Value, String> {
        (self.handler)(args)
    }

    /// JSON Schema for the tool's input object.
    pub fn input_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), json!({ "type": p.ty.as_str() })))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// JSON Schema for the structured result, when an output type is declared.
    ///
    /// Primitive results are wrapped in an object under `result`.
    pub fn output_schema(&self) -> Option<Value> {
        self.output.map(|ty| {
            json!({
                "type": "object",
                "properties": { "result": { "type": ty.as_str() } },
                "required": ["result"],
            })
        })
    }

    /// Serializable descriptor as returned by `tools/list`.
    pub fn descriptor(&self) -> ToolDescriptor<'_> {
        ToolDescriptor {
            name: &self.name,
            description: &self.description,
            input_schema: self.input_schema(),
            output_schema: self.output_schema(),
        }
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Tool metadata with MCP field names (`inputSchema` in camelCase).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub input_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

/// Errors raised by registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateName(String),

    #[error("Unknown tool: {0}")]
    NotFound(String),
}

/// Registry of available tools.
///
/// Keeps registration order for listing and an index by name for lookup.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Fails if a tool with the same name is already present.
    pub fn register(&mut self, tool: ToolDefinition) -> Result<(), RegistryError> {
        if self.index.contains_key(tool.name()) {
            return Err(RegistryError::DuplicateName(tool.name().to_string()));
        }
        self.index.insert(tool.name().to_string(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolDefinition, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// All tools in registration order.
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
