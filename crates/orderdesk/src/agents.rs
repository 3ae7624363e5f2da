//! The two support agents and their tool wiring: a manager agent that
//! routes order lookups and approved retry/force-complete actions, and a
//! troubleshooting agent that works an order through log search, SOP
//! matching, and resolution recording. Control moves between them by
//! tools returning an agent (hand-off by return type).
pub mod manager;
pub mod troubleshooting;

use std::sync::{Arc, OnceLock};

use crate::agent::Agent;
use crate::errors::AgentResult;
use crate::logsearch::LogSearchClient;
use crate::store::OrderStore;

/// A late-bound agent reference. Hand-off tools capture a slot when the
/// target agent cannot exist yet (the manager and troubleshooting agents
/// reference each other), and the slot is filled once wiring completes.
#[derive(Clone, Default)]
pub struct AgentSlot(Arc<OnceLock<Agent>>);

impl AgentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, agent: Agent) {
        // A second set is a wiring bug; the first value wins.
        let _ = self.0.set(agent);
    }

    pub fn get(&self) -> Option<Agent> {
        self.0.get().cloned()
    }
}

/// Build the manager/troubleshooting pair and return the manager, the
/// entry agent for new sessions.
pub fn build_agents(
    model: &str,
    store: Arc<OrderStore>,
    logsearch: Arc<LogSearchClient>,
) -> AgentResult<Agent> {
    let manager_slot = AgentSlot::new();
    let troubleshooting = troubleshooting::build(model, store.clone(), logsearch, manager_slot.clone())?;
    let manager = manager::build(model, store, troubleshooting)?;
    manager_slot.set(manager.clone());
    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_build_agents_wiring() {
        let dir = tempdir().unwrap();
        let store = Arc::new(OrderStore::open(&dir.path().join("orderdesk.db")).unwrap());
        let logsearch = Arc::new(LogSearchClient::new("http://localhost:0").unwrap());

        let manager = build_agents("test-model", store, logsearch).unwrap();
        assert_eq!(manager.name, "Order Manager Agent");

        let names: Vec<_> = manager.tools().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "query_order_resolution",
                "retry_order",
                "force_complete_order",
                "transfer_to_troubleshooting",
            ]
        );
    }

    #[test]
    fn test_agent_slot_empty_then_filled() {
        let slot = AgentSlot::new();
        assert!(slot.get().is_none());

        let agent = Agent::builder("A", "m", "i").build().unwrap();
        slot.set(agent);
        assert_eq!(slot.get().unwrap().name, "A");
    }
}
