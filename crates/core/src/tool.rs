//! Structured tools — the output contracts offered to the model.
//!
//! An expert binds a [`ToolBundle`] to its model. When the model answers with
//! a tool call, the bundle runs the matching native function and hands back a
//! type-erased [`ToolOutput`] that the task downcasts into its result type.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{TaskError, ToolError};
use crate::provider::ToolDefinition;

/// Last path segment of a type name, e.g. `MappingReport`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// The native value produced by a tool, plus a JSON snapshot for logging.
pub struct ToolOutput {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
    snapshot: serde_json::Value,
}

impl ToolOutput {
    pub fn new<T: Any + Send + Serialize>(value: T) -> Result<Self, serde_json::Error> {
        let snapshot = serde_json::to_value(&value)?;
        Ok(Self {
            value: Box::new(value),
            type_name: short_type_name::<T>(),
            snapshot,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn snapshot(&self) -> &serde_json::Value {
        &self.snapshot
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Take the value out as `T`, or fail with [`TaskError::TypeMismatch`].
    pub fn downcast<T: Any>(self) -> Result<T, TaskError> {
        let actual = self.type_name;
        self.value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| TaskError::TypeMismatch {
                expected: short_type_name::<T>(),
                actual,
            })
    }
}

impl std::fmt::Debug for ToolOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolOutput")
            .field("type_name", &self.type_name)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

/// A structured-output contract: a named schema plus the native function
/// that turns validated arguments into a typed value.
pub trait StructuredTool: Send + Sync {
    /// The unique name of this tool (e.g., "CreateMappingReport").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run the native function on the model's arguments.
    fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError>;

    /// Convert this tool into a ToolDefinition for binding to a model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A [`StructuredTool`] backed by a native function `Fn(A) -> Result<R, ToolError>`.
///
/// The parameter schema is generated from `A`; arguments that do not
/// deserialize into `A` are rejected with [`ToolError::SchemaViolation`].
pub struct TypedTool<A, R> {
    name: String,
    description: String,
    schema: serde_json::Value,
    func: Box<dyn Fn(A) -> Result<R, ToolError> + Send + Sync>,
    _marker: PhantomData<fn(A) -> R>,
}

impl<A, R> TypedTool<A, R>
where
    A: DeserializeOwned + JsonSchema + 'static,
    R: Any + Send + Serialize + 'static,
{
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        func: impl Fn(A) -> Result<R, ToolError> + Send + Sync + 'static,
    ) -> Self {
        let mut schema = serde_json::to_value(schemars::schema_for!(A))
            .unwrap_or_else(|_| serde_json::json!({ "type": "object" }));
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }

        Self {
            name: name.into(),
            description: description.into(),
            schema,
            func: Box::new(func),
            _marker: PhantomData,
        }
    }
}

impl<A, R> StructuredTool for TypedTool<A, R>
where
    A: DeserializeOwned + JsonSchema + 'static,
    R: Any + Send + Serialize + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.schema.clone()
    }

    fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let args: A = serde_json::from_value(arguments).map_err(|e| ToolError::SchemaViolation {
            tool_name: self.name.clone(),
            reason: e.to_string(),
        })?;

        let value = (self.func)(args)?;

        ToolOutput::new(value).map_err(|e| ToolError::UnserializableOutput {
            tool_name: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

/// The ordered set of tools offered to one expert.
///
/// One task, one tool: the bundle is built around a single task tool. Extra
/// entries are only for variants of the same task (e.g. a low-confidence
/// form of the same answer), never for unrelated work.
#[derive(Clone)]
pub struct ToolBundle {
    tools: Vec<Arc<dyn StructuredTool>>,
}

impl ToolBundle {
    pub fn new(task_tool: impl StructuredTool + 'static) -> Self {
        Self {
            tools: vec![Arc::new(task_tool)],
        }
    }

    /// Add a variant of the task tool. Replaces any tool with the same name
    /// in place, keeping order.
    pub fn with_variant(mut self, tool: impl StructuredTool + 'static) -> Self {
        let tool: Arc<dyn StructuredTool> = Arc::new(tool);
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => self.tools[i] = tool,
            None => self.tools.push(tool),
        }
        self
    }

    /// Tool definitions in bundle order, for binding to a model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn StructuredTool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute the tool named `name`. Errors from the tool are returned as-is.
    pub fn execute(&self, name: &str, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let start = std::time::Instant::now();
        let output = tool.execute(arguments)?;
        debug!(
            tool = %name,
            output_type = output.type_name(),
            duration_us = start.elapsed().as_micros() as u64,
            "Executed tool"
        );
        Ok(output)
    }
}

impl std::fmt::Debug for ToolBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBundle").field("tools", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct EchoArgs {
        /// Text to echo back
        text: String,
    }

    #[derive(Debug, PartialEq, Serialize)]
    struct Echoed(String);

    fn echo_tool(name: &str) -> TypedTool<EchoArgs, Echoed> {
        TypedTool::new(name, "Echoes back the input", |args: EchoArgs| Ok(Echoed(args.text)))
    }

    #[test]
    fn typed_tool_generates_object_schema() {
        let tool = echo_tool("echo");
        let schema = tool.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["text"].is_object());
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn bundle_executes_by_name() {
        let bundle = ToolBundle::new(echo_tool("echo"));
        let output = bundle.execute("echo", serde_json::json!({"text": "hello"})).unwrap();
        assert_eq!(output.type_name(), "Echoed");
        assert_eq!(output.snapshot(), &serde_json::json!("hello"));
        assert_eq!(output.downcast::<Echoed>().unwrap(), Echoed("hello".into()));
    }

    #[test]
    fn bundle_rejects_unknown_tool() {
        let bundle = ToolBundle::new(echo_tool("echo"));
        let err = bundle.execute("nonexistent", serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn malformed_arguments_surface_schema_violation() {
        let bundle = ToolBundle::new(echo_tool("echo"));
        let err = bundle.execute("echo", serde_json::json!({"txt": 3})).unwrap_err();
        match err {
            ToolError::SchemaViolation { tool_name, reason } => {
                assert_eq!(tool_name, "echo");
                assert!(reason.contains("text"));
            }
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn native_function_errors_are_not_wrapped() {
        let tool: TypedTool<EchoArgs, Echoed> = TypedTool::new("strict", "rejects empty", |args: EchoArgs| {
            if args.text.is_empty() {
                return Err(ToolError::ExecutionFailed {
                    tool_name: "strict".into(),
                    reason: "text must not be empty".into(),
                });
            }
            Ok(Echoed(args.text))
        });
        let err = ToolBundle::new(tool)
            .execute("strict", serde_json::json!({"text": ""}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Tool execution failed: strict — text must not be empty");
    }

    #[test]
    fn downcast_to_wrong_type_is_a_mismatch() {
        let output = ToolOutput::new(Echoed("x".into())).unwrap();
        let err = output.downcast::<String>().unwrap_err();
        match err {
            TaskError::TypeMismatch { expected, actual } => {
                assert_eq!(expected, "String");
                assert_eq!(actual, "Echoed");
            }
        }
    }

    #[test]
    fn variants_keep_order_and_replace_by_name() {
        let bundle = ToolBundle::new(echo_tool("answer"))
            .with_variant(echo_tool("answer_low_confidence"))
            .with_variant(echo_tool("answer"));
        assert_eq!(bundle.names(), vec!["answer", "answer_low_confidence"]);
        assert_eq!(bundle.definitions().len(), 2);
    }
}
