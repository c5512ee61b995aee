// SPDX-License-Identifier: MIT

//! Agent development kit: models, provider client, agents and tools

pub mod agent;
pub mod error;
pub mod model;
pub mod tool;
