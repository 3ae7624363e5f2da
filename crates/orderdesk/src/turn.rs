use anyhow::Result;
use tracing::{debug, warn};

use crate::agent::{Agent, ToolOutput};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, ToolRequest};
use crate::providers::base::Provider;

/// The agent active at the end of a turn, plus the messages newly
/// produced during it (everything appended after the turn started).
#[derive(Debug)]
pub struct TurnResult {
    pub agent: Agent,
    pub messages: Vec<Message>,
}

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Drives one turn: query the model, execute any requested tool calls in
/// order, append the results, and repeat until the model answers without
/// further tool requests. Hand-offs switch the active agent between
/// iterations; a runaway model is stopped by the iteration budget.
pub struct TurnExecutor {
    provider: Box<dyn Provider>,
    max_iterations: usize,
}

impl TurnExecutor {
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            provider,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub async fn run(&self, agent: &Agent, transcript: &[Message]) -> Result<TurnResult> {
        let mut messages = transcript.to_vec();
        let turn_start = messages.len();
        let mut current = agent.clone();

        for iteration in 0..self.max_iterations {
            // Descriptors and the name index are derived fresh from the
            // active agent each iteration; an agent can only execute its
            // own declared tools.
            let tools = current.tool_specs();

            debug!(agent = %current.name, iteration, "querying model");
            let (response, _usage) = self
                .provider
                .complete(
                    &current.model,
                    &current.instructions,
                    &messages,
                    &tools,
                    current.tool_choice,
                )
                .await?;

            let requests: Vec<ToolRequest> =
                response.tool_requests().into_iter().cloned().collect();
            messages.push(response);

            if requests.is_empty() {
                return Ok(TurnResult {
                    agent: current,
                    messages: messages.split_off(turn_start),
                });
            }

            let mut next_agent: Option<Agent> = None;
            {
                let index = current.tool_index();
                for request in &requests {
                    let (tool_name, result) = match &request.tool_call {
                        // The backend produced a call we could not parse.
                        // Report it as the tool result so the model can
                        // self-correct on the next iteration.
                        Err(e) => ("unknown".to_string(), Err(e.clone())),
                        Ok(call) => {
                            let result = match index.get(call.name.as_str()) {
                                None => {
                                    warn!(
                                        agent = %current.name,
                                        tool = %call.name,
                                        "model requested a tool outside the agent's tool set"
                                    );
                                    Err(AgentError::ToolNotFound(call.name.clone()))
                                }
                                Some(tool) => {
                                    debug!(agent = %current.name, tool = %call.name, "executing tool");
                                    self.dispatch(tool, call.arguments.clone(), &mut next_agent)
                                        .await?
                                }
                            };
                            (call.name.clone(), result)
                        }
                    };
                    messages.push(Message::tool().with_tool_response(
                        request.id.as_str(),
                        tool_name,
                        result,
                    ));
                }
            }

            // A hand-off takes effect from the next iteration on; the
            // remainder of the batch used the index built above.
            if let Some(agent) = next_agent {
                debug!(from = %current.name, to = %agent.name, "agent hand-off");
                current = agent;
            }
        }

        Err(AgentError::TurnBudgetExceeded(self.max_iterations).into())
    }

    /// Execute one tool call. Validation failures become in-band error
    /// results; infrastructure failures abort the turn.
    async fn dispatch(
        &self,
        tool: &crate::agent::AgentTool,
        arguments: serde_json::Value,
        next_agent: &mut Option<Agent>,
    ) -> Result<AgentResult<String>> {
        match tool.execute(arguments).await {
            Ok(ToolOutput::Text(text)) => Ok(Ok(text)),
            Ok(ToolOutput::Handoff(agent)) => {
                let notice = format!("Transferred to {}. Adopt persona immediately.", agent.name);
                *next_agent = Some(agent);
                Ok(Ok(notice))
            }
            Err(AgentError::InvalidParameters(msg)) => {
                Ok(Err(AgentError::InvalidParameters(msg)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
