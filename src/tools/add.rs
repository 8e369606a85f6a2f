//! Add Tool Implementation
//!
//! Adds two integers. Arithmetic is on i64; a sum that does not fit is
//! reported as a tool error instead of wrapping.

use serde_json::Value;
use tracing::info;

use crate::core::dispatcher::ToolArguments;
use crate::core::registry::{ParamType, RegistryError, ToolDefinition};
use crate::core::server::McpServer;

pub const NAME: &str = "add";

pub const DESCRIPTION: &str =
    "Use this to add two numbers together. You MUST use this tool when asked to perform additions";

/// Tool definition: `a` and `b` are required integers, the result is an integer.
pub fn definition() -> ToolDefinition {
    ToolDefinition::new(NAME, DESCRIPTION, handle)
        .param("a", ParamType::Integer)
        .param("b", ParamType::Integer)
        .returns(ParamType::Integer)
}

/// Register the add tool with the server.
pub fn register(server: &mut McpServer) -> Result<(), RegistryError> {
    server.register(definition())
}

fn handle(args: &ToolArguments) -> Result<Value, String> {
    let a = args.integer("a").ok_or("Missing required parameter: a")?;
    let b = args.integer("b").ok_or("Missing required parameter: b")?;
    info!("Received add request: a={}, b={}", a, b);

    add(a, b).map(Value::from)
}

pub fn add(a: i64, b: i64) -> Result<i64, String> {
    a.checked_add(b).ok_or_else(|| "integer overflow".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispatcher::{Dispatcher, ErrorKind, InvocationRequest};
    use crate::core::logging::tests::capture_logs;
    use crate::core::registry::ToolRegistry;
    use serde_json::json;

    fn dispatch(arguments: Value) -> Result<Value, crate::core::dispatcher::DispatchError> {
        let mut registry = ToolRegistry::new();
        registry.register(definition()).unwrap();
        let arguments = arguments.as_object().cloned().unwrap_or_default();
        Dispatcher::new(&registry).dispatch(&InvocationRequest::new(NAME, arguments))
    }

    #[test]
    fn test_add() {
        assert_eq!(add(2, 3), Ok(5));
        assert_eq!(add(-10, 10), Ok(0));
        assert_eq!(add(i64::MIN, i64::MAX), Ok(-1));
    }

    #[test]
    fn test_add_overflow_is_error() {
        assert_eq!(add(i64::MAX, 1), Err("integer overflow".to_string()));
        assert_eq!(add(i64::MIN, -1), Err("integer overflow".to_string()));
    }

    #[test]
    fn test_definition_schema() {
        let tool = definition();
        assert_eq!(tool.name(), "add");
        assert!(tool.description().contains("MUST use this tool"));
        assert_eq!(
            tool.input_schema(),
            json!({
                "type": "object",
                "properties": {
                    "a": { "type": "integer" },
                    "b": { "type": "integer" }
                },
                "required": ["a", "b"]
            })
        );
        assert_eq!(tool.output(), Some(ParamType::Integer));
    }

    #[test]
    fn test_dispatch_scenarios() {
        assert_eq!(dispatch(json!({"a": 2, "b": 3})), Ok(json!(5)));
        assert_eq!(dispatch(json!({"a": -10, "b": 10})), Ok(json!(0)));
        assert_eq!(dispatch(json!({"a": "4", "b": 1.0})), Ok(json!(5)));
        assert_eq!(dispatch(json!({"a": 2})).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(dispatch(json!({"a": "hello", "b": 1})).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(dispatch(json!({"a": i64::MAX, "b": 1})).unwrap_err().kind(), ErrorKind::Handler);
    }

    #[test]
    fn test_add_request_is_logged_at_info() {
        let (result, output) = capture_logs(|| dispatch(json!({"a": 2, "b": 3})));

        assert_eq!(result, Ok(json!(5)));
        assert!(
            output.lines().any(|line| line == "[INFO]: Received add request: a=2, b=3"),
            "{output}"
        );
    }

    #[test]
    fn test_sums_match_wide_arithmetic() {
        let samples = [i64::MIN, -1_000_000_007, -1, 0, 1, 42, 1_000_000_007, i64::MAX];
        for &a in &samples {
            for &b in &samples {
                let wide = i128::from(a) + i128::from(b);
                match add(a, b) {
                    Ok(sum) => assert_eq!(i128::from(sum), wide),
                    Err(_) => assert!(wide > i128::from(i64::MAX) || wide < i128::from(i64::MIN)),
                }
            }
        }
    }
}
