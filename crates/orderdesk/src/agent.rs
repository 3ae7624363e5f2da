use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

/// What a tool hands back to the loop. Returning an `Agent` is the
/// hand-off trigger: control transfers purely by return type, never by
/// tool name or convention.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    /// A text or JSON-serialized result, appended to the transcript verbatim
    Text(String),
    /// Transfer active-agent status to this agent
    Handoff(Agent),
}

/// Executes one tool invocation with the model's parsed arguments.
///
/// Implementations must return `InvalidParameters` for arguments that
/// fail validation (reported back to the model in-band) and
/// `ExecutionError` for infrastructure failures (these abort the turn).
/// Expected "no data found" conditions are normal `Text` results, not
/// errors.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, arguments: Value) -> AgentResult<ToolOutput>;
}

/// A tool registered on an agent: the model-facing descriptor paired
/// with its executor.
#[derive(Clone)]
pub struct AgentTool {
    pub tool: Tool,
    executor: Arc<dyn ToolExecutor>,
}

impl AgentTool {
    pub fn new(tool: Tool, executor: Arc<dyn ToolExecutor>) -> Self {
        Self { tool, executor }
    }

    pub fn name(&self) -> &str {
        &self.tool.name
    }

    pub async fn execute(&self, arguments: Value) -> AgentResult<ToolOutput> {
        self.executor.execute(arguments).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("tool", &self.tool)
            .finish_non_exhaustive()
    }
}

/// How the model is told to use tools for a given agent. A per-agent
/// policy, not a per-call decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolChoice {
    /// The model may choose whether to call tools
    #[default]
    Auto,
    /// The model must call at least one tool
    Required,
}

/// An immutable bundle of display name, model identifier, system
/// instructions, and the ordered set of tools the agent may invoke.
/// "Switching agents" means the loop references a different instance.
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: String,
    pub model: String,
    pub instructions: String,
    pub tool_choice: ToolChoice,
    tools: Vec<AgentTool>,
}

impl Agent {
    pub fn builder<N, M, I>(name: N, model: M, instructions: I) -> AgentBuilder
    where
        N: Into<String>,
        M: Into<String>,
        I: Into<String>,
    {
        AgentBuilder {
            name: name.into(),
            model: model.into(),
            instructions: instructions.into(),
            tool_choice: ToolChoice::default(),
            tools: Vec::new(),
        }
    }

    pub fn tools(&self) -> &[AgentTool] {
        &self.tools
    }

    /// Descriptors for the model's function-calling interface,
    /// regenerated fresh on every loop iteration.
    pub fn tool_specs(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.tool.clone()).collect()
    }

    /// Name to tool index over this agent's tool set only. An agent can
    /// only execute its own declared tools.
    pub fn tool_index(&self) -> HashMap<&str, &AgentTool> {
        self.tools.iter().map(|t| (t.name(), t)).collect()
    }
}

pub struct AgentBuilder {
    name: String,
    model: String,
    instructions: String,
    tool_choice: ToolChoice,
    tools: Vec<AgentTool>,
}

impl AgentBuilder {
    pub fn tool(mut self, tool: AgentTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }

    /// Build the agent. Tool names are used as lookup keys during
    /// execution, so duplicates are rejected here.
    pub fn build(self) -> AgentResult<Agent> {
        let mut seen = std::collections::HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name().to_string()) {
                return Err(AgentError::InvalidSchema(format!(
                    "duplicate tool '{}' on agent '{}'",
                    tool.name(),
                    self.name
                )));
            }
        }
        Ok(Agent {
            name: self.name,
            model: self.model,
            instructions: self.instructions,
            tool_choice: self.tool_choice,
            tools: self.tools,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::ParamType;

    struct EchoExecutor;

    #[async_trait]
    impl ToolExecutor for EchoExecutor {
        async fn execute(&self, arguments: Value) -> AgentResult<ToolOutput> {
            Ok(ToolOutput::Text(arguments.to_string()))
        }
    }

    fn echo_tool(name: &str) -> AgentTool {
        let tool = Tool::builder(name, "Echoes back the input")
            .param("message", ParamType::String, "text to echo")
            .build()
            .unwrap();
        AgentTool::new(tool, Arc::new(EchoExecutor))
    }

    #[test]
    fn test_agent_builder() {
        let agent = Agent::builder("Echo Agent", "test-model", "You echo.")
            .tool(echo_tool("echo"))
            .tool_choice(ToolChoice::Required)
            .build()
            .unwrap();

        assert_eq!(agent.name, "Echo Agent");
        assert_eq!(agent.tool_choice, ToolChoice::Required);
        assert_eq!(agent.tool_specs().len(), 1);
        assert!(agent.tool_index().contains_key("echo"));
    }

    #[test]
    fn test_duplicate_tool_name_rejected() {
        let result = Agent::builder("Dup Agent", "test-model", "dup")
            .tool(echo_tool("echo"))
            .tool(echo_tool("echo"))
            .build();
        assert!(matches!(result, Err(AgentError::InvalidSchema(_))));
    }

    #[test]
    fn test_tool_specs_do_not_mutate_agent() {
        let agent = Agent::builder("Echo Agent", "test-model", "You echo.")
            .tool(echo_tool("echo"))
            .build()
            .unwrap();

        let first = agent.tool_specs();
        let second = agent.tool_specs();
        assert_eq!(first, second);
        assert_eq!(agent.tools().len(), 1);
    }
}
