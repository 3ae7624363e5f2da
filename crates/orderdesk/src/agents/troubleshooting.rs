use async_trait::async_trait;
use indoc::indoc;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::AgentSlot;
use crate::agent::{Agent, AgentTool, ToolExecutor, ToolOutput};
use crate::errors::{AgentError, AgentResult};
use crate::logsearch::LogSearchClient;
use crate::models::tool::{ParamType, Tool};
use crate::store::{OrderStore, ResolutionRecord, SopEntry};

const INSTRUCTIONS: &str = indoc! {r#"
    You are an expert in troubleshooting order related issues.

    Take note of important order information: IH_NUMBER, ORDER_ID,
    CUSTOMER_ORDER_ID, INTEGRATION_ID, TRANSACTION_ID, SUBMITTED_DATE,
    SRC_SYSTEM.

    Based on the order provided by the user, find the corresponding NBP log
    based on the order's INTEGRATION_ID.

    If the NBP log is not found, inform the user that you are unable to
    troubleshoot the issue since no NBP log was found.

    If the NBP log is found:
    1. Return the NBP error, which is in the 35th position of the log,
       separated by '|'.
    2. Retrieve the SOP table.
    3. Find which SOP is applicable based on the NBP error and return the SOP
       with its header.
    4. Update the order resolution table with the following details, in this
       order: ih_number, order_id, customer_order_id, integration_id,
       transaction_id, submitted_date, src_system, root_cause_analysis,
       action_taken.
    5. Once completed, summarize the list of actions performed. Remember to
       always generate the summary!

    When the investigation is done, or the user asks about routine order
    management, transfer the conversation back to the manager agent.
"#};

/// Build the troubleshooting agent. The manager is late-bound through a
/// slot because it does not exist yet when this agent is wired.
pub fn build(
    model: &str,
    store: Arc<OrderStore>,
    logsearch: Arc<LogSearchClient>,
    manager: AgentSlot,
) -> AgentResult<Agent> {
    Agent::builder("Troubleshooting Agent", model, INSTRUCTIONS)
        .tool(retrieve_sop(store.clone())?)
        .tool(find_order_log(logsearch)?)
        .tool(update_order_resolution(store)?)
        .tool(transfer_to_manager(manager)?)
        .build()
}

fn retrieve_sop(store: Arc<OrderStore>) -> AgentResult<AgentTool> {
    let tool = Tool::builder(
        "retrieve_sop",
        "Retrieves the SOP list which contains error code, error description, root cause and next action.",
    )
    .build()?;
    Ok(AgentTool::new(tool, Arc::new(RetrieveSop { store })))
}

fn find_order_log(logsearch: Arc<LogSearchClient>) -> AgentResult<AgentTool> {
    let tool = Tool::builder(
        "find_order_log",
        "Searches the log index for the NBP log matching the provided integration_id.",
    )
    .param(
        "integration_id",
        ParamType::String,
        "The order's integration identifier",
    )
    .build()?;
    Ok(AgentTool::new(tool, Arc::new(FindOrderLog { logsearch })))
}

fn update_order_resolution(store: Arc<OrderStore>) -> AgentResult<AgentTool> {
    let tool = Tool::builder(
        "update_order_resolution",
        "Inserts a record into the order resolution table.",
    )
    .param("ih_number", ParamType::String, "Subscriber line number")
    .param("order_id", ParamType::String, "Order identifier")
    .param("customer_order_id", ParamType::String, "Customer's order identifier")
    .param("integration_id", ParamType::String, "Integration identifier")
    .param("transaction_id", ParamType::String, "Transaction identifier")
    .param("submitted_date", ParamType::String, "Date and time of submission")
    .param("src_system", ParamType::String, "Source system name")
    .param("root_cause_analysis", ParamType::String, "Analysis of the root cause")
    .param("action_taken", ParamType::String, "Next action taken")
    .build()?;
    Ok(AgentTool::new(tool, Arc::new(UpdateOrderResolution { store })))
}

fn transfer_to_manager(manager: AgentSlot) -> AgentResult<AgentTool> {
    let tool = Tool::builder(
        "transfer_to_manager",
        "Transfers the conversation back to the order manager agent.",
    )
    .build()?;
    Ok(AgentTool::new(tool, Arc::new(TransferToManager { manager })))
}

struct RetrieveSop {
    store: Arc<OrderStore>,
}

#[async_trait]
impl ToolExecutor for RetrieveSop {
    async fn execute(&self, _arguments: Value) -> AgentResult<ToolOutput> {
        let entries = self
            .store
            .sop_entries()
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;

        let mut dump = String::from(SopEntry::HEADER);
        for entry in &entries {
            dump.push('\n');
            dump.push_str(&entry.to_row());
        }
        Ok(ToolOutput::Text(dump))
    }
}

#[derive(Deserialize)]
struct FindLogArgs {
    integration_id: String,
}

struct FindOrderLog {
    logsearch: Arc<LogSearchClient>,
}

#[async_trait]
impl ToolExecutor for FindOrderLog {
    async fn execute(&self, arguments: Value) -> AgentResult<ToolOutput> {
        let args: FindLogArgs = serde_json::from_value(arguments)
            .map_err(|e| AgentError::InvalidParameters(e.to_string()))?;
        if args.integration_id.trim().is_empty() {
            return Err(AgentError::InvalidParameters(
                "integration_id cannot be empty".to_string(),
            ));
        }

        let found = self
            .logsearch
            .search(&args.integration_id)
            .await
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;

        let text = match found {
            Some(raw) => format!("Found NBP log: {}", raw),
            None => format!(
                "Cannot find the corresponding NBP log based on INTEGRATION_ID {}",
                args.integration_id
            ),
        };
        Ok(ToolOutput::Text(text))
    }
}

#[derive(Deserialize)]
struct UpdateResolutionArgs {
    ih_number: String,
    order_id: String,
    customer_order_id: String,
    integration_id: String,
    transaction_id: String,
    submitted_date: String,
    src_system: String,
    root_cause_analysis: String,
    action_taken: String,
}

struct UpdateOrderResolution {
    store: Arc<OrderStore>,
}

#[async_trait]
impl ToolExecutor for UpdateOrderResolution {
    async fn execute(&self, arguments: Value) -> AgentResult<ToolOutput> {
        let args: UpdateResolutionArgs = serde_json::from_value(arguments)
            .map_err(|e| AgentError::InvalidParameters(e.to_string()))?;

        let record = ResolutionRecord {
            ih_number: args.ih_number,
            order_id: args.order_id,
            customer_order_id: args.customer_order_id,
            integration_id: args.integration_id,
            transaction_id: args.transaction_id,
            submitted_date: args.submitted_date,
            src_system: args.src_system,
            root_cause_analysis: args.root_cause_analysis,
            action_taken: args.action_taken,
            status: "OPEN".to_string(),
        };
        self.store
            .insert_resolution(&record)
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;
        Ok(ToolOutput::Text(format!(
            "Success: updated resolution table for order {}.",
            record.ih_number
        )))
    }
}

struct TransferToManager {
    manager: AgentSlot,
}

#[async_trait]
impl ToolExecutor for TransferToManager {
    async fn execute(&self, _arguments: Value) -> AgentResult<ToolOutput> {
        match self.manager.get() {
            Some(agent) => Ok(ToolOutput::Handoff(agent)),
            None => Err(AgentError::ExecutionError(
                "transfer target is not configured".to_string(),
            )),
        }
    }
}
