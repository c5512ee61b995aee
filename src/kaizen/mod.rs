// SPDX-License-Identifier: MIT

pub mod agents;
pub mod config;
pub mod factory;
pub mod messages;
pub mod tools;
pub mod workflow;

pub use config::RouterConfig;
pub use factory::EngineFactory;
pub use workflow::graph::WorkflowEngine;
