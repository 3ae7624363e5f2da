use anyhow::{anyhow, Result};
use regex::Regex;
use serde_json::{json, Value};

use crate::agent::ToolChoice;
use crate::errors::AgentError;
use crate::models::message::{Message, MessageContent};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

/// Convert internal messages to the OpenAI-style API message array.
///
/// Assistant tool requests become `tool_calls` entries; tool-role
/// messages become `tool` entries carrying the call id and tool name.
/// A request whose arguments could not be parsed is skipped on the wire:
/// the loop has already appended an error tool-result for it, and that
/// result is what the model should see.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        match message.role {
            Role::User | Role::Assistant => {
                let mut converted = json!({
                    "role": message.role
                });

                for content in &message.content {
                    match content {
                        MessageContent::Text(text) => {
                            if !text.text.is_empty() {
                                converted["content"] = json!(text.text);
                            }
                        }
                        MessageContent::ToolRequest(request) => {
                            if let Ok(tool_call) = &request.tool_call {
                                let sanitized_name = sanitize_function_name(&tool_call.name);
                                let tool_calls = converted
                                    .as_object_mut()
                                    .unwrap()
                                    .entry("tool_calls")
                                    .or_insert(json!([]));

                                tool_calls.as_array_mut().unwrap().push(json!({
                                    "id": request.id,
                                    "type": "function",
                                    "function": {
                                        "name": sanitized_name,
                                        "arguments": tool_call.arguments.to_string(),
                                    }
                                }));
                            }
                        }
                        MessageContent::ToolResponse(_) => {
                            // Tool responses ride on tool-role messages
                        }
                    }
                }

                if converted.get("content").is_some() || converted.get("tool_calls").is_some() {
                    messages_spec.push(converted);
                }
            }
            Role::Tool => {
                for content in &message.content {
                    if let MessageContent::ToolResponse(response) = content {
                        let text = match &response.tool_result {
                            Ok(result) => result.clone(),
                            // A tool error is shown as output so the model
                            // can interpret it and self-correct
                            Err(e) => {
                                format!("The tool call returned the following error:\n{}", e)
                            }
                        };
                        messages_spec.push(json!({
                            "role": "tool",
                            "tool_call_id": response.id,
                            "name": response.tool_name,
                            "content": text,
                        }));
                    }
                }
            }
        }
    }

    messages_spec
}

/// Convert internal Tool descriptors to OpenAI's function-calling spec
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert the tool-invocation mode to its wire value
pub fn tool_choice_to_spec(tool_choice: ToolChoice) -> Value {
    match tool_choice {
        ToolChoice::Auto => json!("auto"),
        ToolChoice::Required => json!("required"),
    }
}

/// Convert an OpenAI-style API response to the internal Message format.
///
/// Malformed tool calls (invalid function names, argument strings that
/// are not JSON) are preserved as in-band errors rather than failing the
/// whole response, so the loop can report them back to the model.
pub fn openai_response_to_message(response: Value) -> Result<Message> {
    let original = response["choices"][0]["message"].clone();
    let mut message = Message::assistant();

    if let Some(text) = original.get("content") {
        if let Some(text_str) = text.as_str() {
            if !text_str.is_empty() {
                message = message.with_text(text_str);
            }
        }
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(|v| v.as_array()) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default().to_string();
            let function_name = tool_call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments = tool_call["function"]["arguments"]
                .as_str()
                .unwrap_or_default()
                .to_string();

            if !is_valid_function_name(&function_name) {
                let error = AgentError::ToolNotFound(format!(
                    "The provided function name '{}' had invalid characters, it must match this regex [a-zA-Z0-9_-]+",
                    function_name
                ));
                message = message.with_tool_request(id, Err(error));
            } else {
                match serde_json::from_str::<Value>(&arguments) {
                    Ok(params) => {
                        message = message
                            .with_tool_request(id, Ok(ToolCall::new(&function_name, params)));
                    }
                    Err(e) => {
                        let error = AgentError::InvalidParameters(format!(
                            "Could not interpret tool use parameters for id {}: {}",
                            id, e
                        ));
                        message = message.with_tool_request(id, Err(error));
                    }
                }
            }
        }
    }

    Ok(message)
}

fn sanitize_function_name(name: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    re.replace_all(name, "_").to_string()
}

fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    re.is_match(name)
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOOL_USE_RESPONSE: &str = r#"{
        "choices": [{
            "role": "assistant",
            "message": {
                "tool_calls": [{
                    "id": "1",
                    "function": {
                        "name": "example_fn",
                        "arguments": "{\"param\": \"value\"}"
                    }
                }]
            }
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 25,
            "total_tokens": 35
        }
    }"#;

    #[test]
    fn test_messages_to_openai_spec() {
        let message = Message::user().with_text("Hello");
        let spec = messages_to_openai_spec(&[message]);

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[0]["content"], "Hello");
    }

    #[test]
    fn test_messages_to_openai_spec_complex() {
        let messages = vec![
            Message::assistant().with_text("Hello!"),
            Message::user().with_text("Find order X"),
            Message::assistant().with_tool_request(
                "call_1",
                Ok(ToolCall::new("lookup", json!({"id": "X"}))),
            ),
            Message::tool().with_tool_response("call_1", "lookup", Ok("found".to_string())),
        ];

        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 4);
        assert_eq!(spec[0]["role"], "assistant");
        assert_eq!(spec[0]["content"], "Hello!");
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[2]["role"], "assistant");
        assert!(spec[2]["tool_calls"].is_array());
        assert_eq!(spec[3]["role"], "tool");
        assert_eq!(spec[3]["content"], "found");
        assert_eq!(spec[3]["name"], "lookup");
        assert_eq!(spec[3]["tool_call_id"], spec[2]["tool_calls"][0]["id"]);
    }

    #[test]
    fn test_failed_tool_request_skipped_on_wire() {
        let messages = vec![Message::assistant().with_tool_request(
            "call_1",
            Err(AgentError::InvalidParameters("bad json".to_string())),
        )];

        let spec = messages_to_openai_spec(&messages);
        assert!(spec.is_empty());
    }

    #[test]
    fn test_tool_error_rendered_for_model() {
        let messages = vec![Message::tool().with_tool_response(
            "call_1",
            "lookup",
            Err(AgentError::ToolNotFound("lookup".to_string())),
        )];

        let spec = messages_to_openai_spec(&messages);
        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "tool");
        assert!(spec[0]["content"]
            .as_str()
            .unwrap()
            .contains("Tool not found"));
    }

    #[test]
    fn test_tools_to_openai_spec() -> Result<()> {
        let tool = Tool {
            name: "test_tool".to_string(),
            description: "A test tool".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {"input": {"type": "string"}},
                "required": ["input"]
            }),
        };

        let spec = tools_to_openai_spec(&[tool])?;

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["type"], "function");
        assert_eq!(spec[0]["function"]["name"], "test_tool");
        Ok(())
    }

    #[test]
    fn test_tools_to_openai_spec_duplicate() {
        let tool = Tool {
            name: "test_tool".to_string(),
            description: "A test tool".to_string(),
            parameters: json!({"type": "object", "properties": {}, "required": []}),
        };

        let result = tools_to_openai_spec(&[tool.clone(), tool]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Duplicate tool name"));
    }

    #[test]
    fn test_tool_choice_to_spec() {
        assert_eq!(tool_choice_to_spec(ToolChoice::Auto), json!("auto"));
        assert_eq!(tool_choice_to_spec(ToolChoice::Required), json!("required"));
    }

    #[test]
    fn test_sanitize_function_name() {
        assert_eq!(sanitize_function_name("hello-world"), "hello-world");
        assert_eq!(sanitize_function_name("hello world"), "hello_world");
        assert_eq!(sanitize_function_name("hello@world"), "hello_world");
    }

    #[test]
    fn test_response_to_message_text() -> Result<()> {
        let response = json!({
            "choices": [{
                "role": "assistant",
                "message": {
                    "content": "All clear."
                }
            }]
        });

        let message = openai_response_to_message(response)?;
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text(), "All clear.");
        Ok(())
    }

    #[test]
    fn test_response_to_message_valid_toolrequest() -> Result<()> {
        let response: Value = serde_json::from_str(TOOL_USE_RESPONSE)?;
        let message = openai_response_to_message(response)?;

        assert_eq!(message.content.len(), 1);
        let request = message.content[0].as_tool_request().unwrap();
        let tool_call = request.tool_call.as_ref().unwrap();
        assert_eq!(tool_call.name, "example_fn");
        assert_eq!(tool_call.arguments, json!({"param": "value"}));
        Ok(())
    }

    #[test]
    fn test_response_to_message_invalid_func_name() -> Result<()> {
        let mut response: Value = serde_json::from_str(TOOL_USE_RESPONSE)?;
        response["choices"][0]["message"]["tool_calls"][0]["function"]["name"] =
            json!("invalid fn");

        let message = openai_response_to_message(response)?;
        let request = message.content[0].as_tool_request().unwrap();
        match &request.tool_call {
            Err(AgentError::ToolNotFound(msg)) => {
                assert!(msg.starts_with("The provided function name"));
            }
            _ => panic!("Expected ToolNotFound error"),
        }
        Ok(())
    }

    #[test]
    fn test_response_to_message_json_decode_error() -> Result<()> {
        let mut response: Value = serde_json::from_str(TOOL_USE_RESPONSE)?;
        response["choices"][0]["message"]["tool_calls"][0]["function"]["arguments"] =
            json!("invalid json {");

        let message = openai_response_to_message(response)?;
        let request = message.content[0].as_tool_request().unwrap();
        match &request.tool_call {
            Err(AgentError::InvalidParameters(msg)) => {
                assert!(msg.starts_with("Could not interpret tool use parameters"));
            }
            _ => panic!("Expected InvalidParameters error"),
        }
        Ok(())
    }

    #[test]
    fn test_check_context_length_error() {
        let error = json!({
            "code": "context_length_exceeded",
            "message": "This message is too long"
        });
        assert!(check_context_length_error(&error).is_some());

        let error = json!({
            "code": "other_error",
            "message": "Some other error"
        });
        assert!(check_context_length_error(&error).is_none());
    }
}
