//! Warehouse rack configuration search.
//!
//! Enumerates a grid of candidate rack sizes, lays each one out in a
//! rectangular warehouse with aisles and a safety margin, and ranks the
//! feasible configurations by a selectable objective.

pub mod api;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod layout;
pub mod logging;
pub mod model;
pub mod optimizer;
pub mod types;
