// SPDX-License-Identifier: MIT

//! Agent dispatch table: topic category → agent

use crate::adk::agent::Agent;
use crate::kaizen::workflow::state::QueryType;
use std::fmt;
use std::sync::Arc;

/// Categories answered by an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentCategory {
    Manufacturing,
    Python,
    General,
}

impl AgentCategory {
    pub const ALL: [AgentCategory; 3] = [
        AgentCategory::Manufacturing,
        AgentCategory::Python,
        AgentCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentCategory::Manufacturing => "manufacturing",
            AgentCategory::Python => "python",
            AgentCategory::General => "general",
        }
    }

    /// `None` for the tool branch; unclassified routes to general
    pub fn for_query_type(query_type: QueryType) -> Option<Self> {
        match query_type {
            QueryType::Manufacturing => Some(AgentCategory::Manufacturing),
            QueryType::Python => Some(AgentCategory::Python),
            QueryType::General | QueryType::Unclassified => Some(AgentCategory::General),
            QueryType::Tool => None,
        }
    }
}

impl fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One slot per category. An empty slot is a configuration error for any
/// request routed to it.
#[derive(Clone, Default)]
pub struct AgentTable {
    manufacturing: Option<Arc<dyn Agent>>,
    python: Option<Arc<dyn Agent>>,
    general: Option<Arc<dyn Agent>>,
}

impl AgentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: AgentCategory, agent: Arc<dyn Agent>) -> Self {
        *self.slot_mut(category) = Some(agent);
        self
    }

    pub fn without(mut self, category: AgentCategory) -> Self {
        *self.slot_mut(category) = None;
        self
    }

    pub fn get(&self, category: AgentCategory) -> Option<Arc<dyn Agent>> {
        match category {
            AgentCategory::Manufacturing => self.manufacturing.clone(),
            AgentCategory::Python => self.python.clone(),
            AgentCategory::General => self.general.clone(),
        }
    }

    /// Categories with no registered agent
    pub fn missing(&self) -> Vec<AgentCategory> {
        AgentCategory::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_none())
            .collect()
    }

    fn slot_mut(&mut self, category: AgentCategory) -> &mut Option<Arc<dyn Agent>> {
        match category {
            AgentCategory::Manufacturing => &mut self.manufacturing,
            AgentCategory::Python => &mut self.python,
            AgentCategory::General => &mut self.general,
        }
    }
}

impl fmt::Debug for AgentTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |slot: &Option<Arc<dyn Agent>>| slot.as_ref().map(|a| a.name().to_string());
        f.debug_struct("AgentTable")
            .field("manufacturing", &name(&self.manufacturing))
            .field("python", &name(&self.python))
            .field("general", &name(&self.general))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::agent::{AgentInput, AgentOutput};
    use crate::adk::model::provider::LlmProvider;
    use async_trait::async_trait;

    struct NamedAgent(&'static str);

    #[async_trait]
    impl Agent for NamedAgent {
        fn name(&self) -> &str {
            self.0
        }

        async fn respond(&self, _llm: &dyn LlmProvider, _input: &AgentInput) -> AgentOutput {
            AgentOutput::ok(self.0)
        }
    }

    fn full_table() -> AgentTable {
        AgentTable::new()
            .with(AgentCategory::Manufacturing, Arc::new(NamedAgent("m")))
            .with(AgentCategory::Python, Arc::new(NamedAgent("p")))
            .with(AgentCategory::General, Arc::new(NamedAgent("g")))
    }

    #[test]
    fn test_routing_from_query_type() {
        assert_eq!(
            AgentCategory::for_query_type(QueryType::Python),
            Some(AgentCategory::Python)
        );
        assert_eq!(
            AgentCategory::for_query_type(QueryType::Unclassified),
            Some(AgentCategory::General)
        );
        assert_eq!(AgentCategory::for_query_type(QueryType::Tool), None);
    }

    #[test]
    fn test_lookup() {
        let table = full_table();
        assert_eq!(table.get(AgentCategory::Python).unwrap().name(), "p");
        assert!(table.missing().is_empty());
    }

    #[test]
    fn test_without_removes_only_that_entry() {
        let table = full_table().without(AgentCategory::Python);
        assert!(table.get(AgentCategory::Python).is_none());
        assert!(table.get(AgentCategory::General).is_some());
        assert_eq!(table.missing(), vec![AgentCategory::Python]);
        assert!(format!("{:?}", table).contains("python: None"));
    }
}
