use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::Debug;

use crate::errors::{AgentError, AgentResult};

/// A tool that can be used by a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema for the parameters that the tool accepts
    pub parameters: Value,
}

impl Tool {
    /// Start building a tool descriptor with the given name and description
    pub fn builder<N, D>(name: N, description: D) -> ToolBuilder
    where
        N: Into<String>,
        D: Into<String>,
    {
        ToolBuilder::new(name, description)
    }
}

/// A model-issued request to execute one named tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// The name of the tool to execute
    pub name: String,
    /// The parsed JSON arguments for the execution
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new ToolCall with the given name and arguments
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The primitive type vocabulary accepted by the model's
/// function-calling interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ParamType {
    fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Null => "null",
        }
    }
}

#[derive(Debug, Clone)]
struct ToolParam {
    name: String,
    description: Option<String>,
    param_type: ParamType,
    required: bool,
}

/// Declarative builder for tool descriptors. Tool authors state the
/// parameter list directly at registration time; building is pure, so
/// the same builder inputs always produce an identical descriptor.
#[derive(Debug, Clone)]
pub struct ToolBuilder {
    name: String,
    description: String,
    params: Vec<ToolParam>,
}

fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl ToolBuilder {
    fn new<N: Into<String>, D: Into<String>>(name: N, description: D) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Add a required parameter
    pub fn param<N: Into<String>, D: Into<String>>(
        mut self,
        name: N,
        param_type: ParamType,
        description: D,
    ) -> Self {
        self.params.push(ToolParam {
            name: name.into(),
            description: Some(description.into()),
            param_type,
            required: true,
        });
        self
    }

    /// Add an optional parameter (one that has a default on the
    /// implementation side)
    pub fn optional_param<N: Into<String>, D: Into<String>>(
        mut self,
        name: N,
        param_type: ParamType,
        description: D,
    ) -> Self {
        self.params.push(ToolParam {
            name: name.into(),
            description: Some(description.into()),
            param_type,
            required: false,
        });
        self
    }

    /// Build the descriptor, validating the tool and parameter names.
    pub fn build(self) -> AgentResult<Tool> {
        if !is_valid_tool_name(&self.name) {
            return Err(AgentError::InvalidSchema(format!(
                "tool name '{}' must match [a-zA-Z0-9_-]+",
                self.name
            )));
        }

        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            if properties.contains_key(&param.name) {
                return Err(AgentError::InvalidSchema(format!(
                    "duplicate parameter '{}' on tool '{}'",
                    param.name, self.name
                )));
            }
            let mut schema = Map::new();
            schema.insert("type".to_string(), json!(param.param_type.as_str()));
            if let Some(description) = &param.description {
                if !description.is_empty() {
                    schema.insert("description".to_string(), json!(description));
                }
            }
            properties.insert(param.name.clone(), Value::Object(schema));
            if param.required {
                required.push(param.name.clone());
            }
        }

        Ok(Tool {
            name: self.name,
            description: self.description.trim().to_string(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_builder() -> ToolBuilder {
        Tool::builder("query_order_resolution", "Look up resolution records")
            .param("id_type", ParamType::String, "IH_NUMBER or CUSTOMER_ORDER_ID")
            .param("id_list", ParamType::Array, "identifiers to look up")
            .optional_param("limit", ParamType::Integer, "maximum rows to return")
    }

    #[test]
    fn test_build_schema() {
        let tool = lookup_builder().build().unwrap();

        assert_eq!(tool.name, "query_order_resolution");
        assert_eq!(tool.parameters["type"], "object");
        assert_eq!(tool.parameters["properties"]["id_type"]["type"], "string");
        assert_eq!(tool.parameters["properties"]["id_list"]["type"], "array");
        assert_eq!(tool.parameters["properties"]["limit"]["type"], "integer");
        // required holds exactly the parameters without a default
        assert_eq!(tool.parameters["required"], json!(["id_type", "id_list"]));
    }

    #[test]
    fn test_build_is_idempotent() {
        let first = lookup_builder().build().unwrap();
        let second = lookup_builder().build().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_description_is_trimmed() {
        let tool = Tool::builder("noop", "  does nothing\n").build().unwrap();
        assert_eq!(tool.description, "does nothing");
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let result = Tool::builder("dup", "duplicate params")
            .param("id", ParamType::String, "first")
            .param("id", ParamType::Integer, "second")
            .build();
        assert!(matches!(result, Err(AgentError::InvalidSchema(_))));
    }

    #[test]
    fn test_invalid_tool_name_rejected() {
        let result = Tool::builder("bad name", "space in name").build();
        assert!(matches!(result, Err(AgentError::InvalidSchema(_))));

        let result = Tool::builder("", "empty name").build();
        assert!(matches!(result, Err(AgentError::InvalidSchema(_))));
    }
}
