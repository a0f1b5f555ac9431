//! Live read models for the storefront's query side.
//!
//! The store publishes each collection as a full snapshot whenever it
//! changes. This crate turns those snapshots into query-ready views:
//! - [`Projection`] trait for rebuilding a read model from a snapshot
//! - [`ReadModel`] trait for query access to the view
//! - [`ProjectionProcessor`] for following a change feed
//! - The live order board, the customer directory and dashboard figures

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{CustomerDirectory, DashboardStats, LiveOrderBoard};
