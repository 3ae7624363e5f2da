use async_trait::async_trait;
use indoc::indoc;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::agent::{Agent, AgentTool, ToolExecutor, ToolOutput};
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{ParamType, Tool};
use crate::store::{IdType, OrderStore};

const INSTRUCTIONS: &str = indoc! {r#"
    You are an expert agent specialized in managing failed customer orders.
    Your primary task is to assist users by processing a list of order IDs they
    provide, either in the form of an IH_NUMBER or a CUSTOMER_ORDER_ID, and
    retrieving the root cause and resolution details for each from the order
    resolution table. Deliver clear, concise, and accurate information based on
    the user's input. Always mention the IH_NUMBER in your response as a
    reference.

    Here's how you operate:
    1. Identify a list of order IDs from the user, which can be IH_NUMBER or
       CUSTOMER_ORDER_ID type. Take note of the identifier type or id_type.
        - IH_NUMBER: number only, e.g. 190000000080, 190000000004
        - CUSTOMER_ORDER_ID: mixed letters and numbers, e.g.
          MOk42501300904219745e55a0, MOi12501190613532282c4b90
    2. Query the order resolution table to find the associated root cause and
       resolution using the id_type and the id_list.
    3. If the action taken contains "INFORM:", you can offer to help the user
       draft a notification email. Do not offer to send the email because you
       are not authorized to do so.
    4. If the action taken contains "RETRY:", ask the user for approval before
       executing the retry order tool.
    5. If the action taken contains "FORCE:", ask the user for approval before
       executing the force complete order tool.
    6. If the order has no recorded resolution yet and needs investigation,
       transfer the conversation to the troubleshooting agent.
"#};

/// Build the manager (routing) agent.
pub fn build(
    model: &str,
    store: Arc<OrderStore>,
    troubleshooting: Agent,
) -> AgentResult<Agent> {
    Agent::builder("Order Manager Agent", model, INSTRUCTIONS)
        .tool(query_order_resolution(store.clone())?)
        .tool(retry_order(store.clone())?)
        .tool(force_complete_order(store)?)
        .tool(transfer_to_troubleshooting(troubleshooting)?)
        .build()
}

fn query_order_resolution(store: Arc<OrderStore>) -> AgentResult<AgentTool> {
    let tool = Tool::builder(
        "query_order_resolution",
        "Queries the order resolution table for root cause and resolution details based on id_type and id_list.",
    )
    .param(
        "id_type",
        ParamType::String,
        "Identifier type, either IH_NUMBER or CUSTOMER_ORDER_ID",
    )
    .param("id_list", ParamType::Array, "The order identifiers to look up")
    .build()?;
    Ok(AgentTool::new(tool, Arc::new(QueryOrderResolution { store })))
}

fn retry_order(store: Arc<OrderStore>) -> AgentResult<AgentTool> {
    let tool = Tool::builder("retry_order", "Resubmits a failed order for processing.")
        .param("customer_order_id", ParamType::String, "The customer order id to retry")
        .build()?;
    Ok(AgentTool::new(tool, Arc::new(RetryOrder { store })))
}

fn force_complete_order(store: Arc<OrderStore>) -> AgentResult<AgentTool> {
    let tool = Tool::builder(
        "force_complete_order",
        "Marks a failed order as completed without reprocessing it.",
    )
    .param(
        "customer_order_id",
        ParamType::String,
        "The customer order id to force complete",
    )
    .build()?;
    Ok(AgentTool::new(tool, Arc::new(ForceCompleteOrder { store })))
}

fn transfer_to_troubleshooting(troubleshooting: Agent) -> AgentResult<AgentTool> {
    let tool = Tool::builder(
        "transfer_to_troubleshooting",
        "Transfers the conversation to the troubleshooting agent for root cause investigation.",
    )
    .build()?;
    Ok(AgentTool::new(tool, Arc::new(TransferToTroubleshooting { troubleshooting })))
}

#[derive(Deserialize)]
struct QueryArgs {
    id_type: IdType,
    id_list: Vec<String>,
}

struct QueryOrderResolution {
    store: Arc<OrderStore>,
}

#[async_trait]
impl ToolExecutor for QueryOrderResolution {
    async fn execute(&self, arguments: Value) -> AgentResult<ToolOutput> {
        let args: QueryArgs = serde_json::from_value(arguments)
            .map_err(|e| AgentError::InvalidParameters(e.to_string()))?;
        // reject before touching the store
        if args.id_list.is_empty() {
            return Err(AgentError::InvalidParameters(
                "id_list cannot be empty".to_string(),
            ));
        }

        let records = self
            .store
            .resolutions(args.id_type, &args.id_list)
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;

        if records.is_empty() {
            return Ok(ToolOutput::Text(
                "No resolution records found for the given identifiers.".to_string(),
            ));
        }
        let json = serde_json::to_string(&records)
            .map_err(|e| AgentError::Internal(e.to_string()))?;
        Ok(ToolOutput::Text(json))
    }
}

#[derive(Deserialize)]
struct OrderActionArgs {
    customer_order_id: String,
}

struct RetryOrder {
    store: Arc<OrderStore>,
}

#[async_trait]
impl ToolExecutor for RetryOrder {
    async fn execute(&self, arguments: Value) -> AgentResult<ToolOutput> {
        let args: OrderActionArgs = serde_json::from_value(arguments)
            .map_err(|e| AgentError::InvalidParameters(e.to_string()))?;

        let matched = self
            .store
            .set_status(&args.customer_order_id, "RETRY_SUBMITTED")
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;
        let text = if matched {
            format!("Retry submitted for order {}.", args.customer_order_id)
        } else {
            format!(
                "No open resolution found for order {}; nothing was retried.",
                args.customer_order_id
            )
        };
        Ok(ToolOutput::Text(text))
    }
}

struct ForceCompleteOrder {
    store: Arc<OrderStore>,
}

#[async_trait]
impl ToolExecutor for ForceCompleteOrder {
    async fn execute(&self, arguments: Value) -> AgentResult<ToolOutput> {
        let args: OrderActionArgs = serde_json::from_value(arguments)
            .map_err(|e| AgentError::InvalidParameters(e.to_string()))?;

        let matched = self
            .store
            .set_status(&args.customer_order_id, "FORCE_COMPLETED")
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;
        let text = if matched {
            format!("Order {} has been force completed.", args.customer_order_id)
        } else {
            format!(
                "No open resolution found for order {}; nothing was completed.",
                args.customer_order_id
            )
        };
        Ok(ToolOutput::Text(text))
    }
}

struct TransferToTroubleshooting {
    troubleshooting: Agent,
}

#[async_trait]
impl ToolExecutor for TransferToTroubleshooting {
    async fn execute(&self, _arguments: Value) -> AgentResult<ToolOutput> {
        Ok(ToolOutput::Handoff(self.troubleshooting.clone()))
    }
}
