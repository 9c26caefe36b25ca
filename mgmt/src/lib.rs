// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! The setup orchestrator: the stage pipeline that turns an edge-node table
//! and a GraphML topology document into a fully addressed, routed virtual
//! network, driven entirely through the [`worker::Worker`] host-abstraction
//! trait.

pub mod config;
pub mod error;
pub mod logging_worker;
pub mod orchestrator;
pub mod worker;

pub use config::SetupConfig;
pub use error::{ConfigError, ResourceError, SetupError, TopologyError};
pub use logging_worker::LoggingWorker;
pub use orchestrator::run_setup;
