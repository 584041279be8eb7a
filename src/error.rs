//! Errors surfaced by the configuration search.
//!
//! Infeasible candidates are not errors; they are reported as
//! `LayoutOutcome::Infeasible` and simply left out of the result.

use thiserror::Error;

use crate::model::{Axis, ValidationError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// A rack dimension range is malformed. Raised before any candidate is
    /// evaluated.
    #[error("Invalid {axis} range: {source}")]
    InvalidRange {
        axis: Axis,
        #[source]
        source: ValidationError,
    },

    /// Warehouse or clearance dimensions are malformed. Raised before any
    /// candidate is evaluated.
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(#[source] ValidationError),

    /// The grid was searched but no candidate fits the envelope.
    #[error(
        "No configuration possible: none of {evaluated} evaluated candidates (grid of {total}) fits the warehouse, widen the rack dimension ranges"
    )]
    EmptyResult { evaluated: usize, total: usize },

    /// Search tunables (fill rate, weights, cap) are out of range.
    #[error(transparent)]
    InvalidConfiguration(#[from] ValidationError),
}

impl SearchError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::InvalidRange { .. } => "invalid_range",
            SearchError::InvalidDimensions(_) => "invalid_dimensions",
            SearchError::EmptyResult { .. } => "empty_result",
            SearchError::InvalidConfiguration(_) => "invalid_configuration",
        }
    }
}
