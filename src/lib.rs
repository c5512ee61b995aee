// SPDX-License-Identifier: MIT

//! kaizen-rs routes a free-text query to a specialised agent or tool.
//!
//! - [`adk`] holds the reusable building blocks (model, provider client,
//!   agent and tool traits)
//! - [`kaizen`] holds the application: configuration, tools, and the
//!   query-routing workflow engine

pub mod adk;
pub mod kaizen;
