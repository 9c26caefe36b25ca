// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! A streaming parser for the subset of GraphML used to describe network
//! topologies: one undirected `<graph>` of `<node>`/`<edge>` elements with a
//! fixed, typed set of `<data>` attributes.

mod error;
mod keys;

pub mod driver;
pub mod sink;

pub use driver::{GraphmlDriver, PassFilter};
pub use error::GraphmlError;
pub use sink::{EdgeAttrs, GraphSink, NodeAttrs};
