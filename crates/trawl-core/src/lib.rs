#![forbid(unsafe_code)]

//! Food-web flow matrix -> Sankey graph (headless).
//!
//! Design goals:
//! - deterministic, testable outputs (stable node/link ordering)
//! - passive encoding: display values never feed back into the model
//! - feedback loops (predation on lower trophic levels, cannibalism)
//!   are kept as-is; the renderer routes them as reversed links

pub mod error;
pub mod graph;
pub mod model;
pub mod options;

pub use error::{Error, Result};
pub use graph::GraphBuilder;
pub use model::{FlowGraph, FlowLink, FlowNode, FoodWebModel, GroupInfo, GroupKind};
pub use options::{GraphOptions, LinkScale};
