// SPDX-License-Identifier: MIT

pub mod checkpoint;
pub mod classifier;
pub mod dispatch;
pub mod graph;
pub mod registry;
pub mod state;
