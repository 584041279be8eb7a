//! Input records for the rack configuration search.
//!
//! This module defines the typed parameters that replace free-form form
//! fields:
//! - `WarehouseEnvelope`: the building's usable interior
//! - `RackDimensionRange` / `RackRanges`: the candidate grid per axis
//! - `LayoutConstraints`: aisle clearances and safety margin
//! - `RackDimensions`: one concrete rack size
//!
//! All records validate on construction. Records arriving through serde are
//! re-validated with `validated()` before they reach the search.

use std::fmt;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::SearchError;
use crate::types::{Dimensional, EPSILON_GRID, Rect, validation};

/// Validation error for input data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    validation::validate_dimension(value, name).map_err(ValidationError::InvalidDimension)
}

fn validate_clearance(value: f64, name: &str) -> Result<(), ValidationError> {
    validation::validate_clearance(value, name).map_err(ValidationError::InvalidConfiguration)
}

/// One of the three rack axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Length,
    Width,
    Height,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Length, Axis::Width, Axis::Height];

    pub fn code(&self) -> &'static str {
        match self {
            Axis::Length => "length",
            Axis::Width => "width",
            Axis::Height => "height",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Interior dimensions of the warehouse in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"length": 50.0, "width": 30.0, "height": 12.0}))]
pub struct WarehouseEnvelope {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl WarehouseEnvelope {
    /// Creates a new envelope with validation.
    ///
    /// # Examples
    /// ```
    /// use rack_planner::model::WarehouseEnvelope;
    ///
    /// assert!(WarehouseEnvelope::new(50.0, 30.0, 12.0).is_ok());
    /// assert!(WarehouseEnvelope::new(50.0, 0.0, 12.0).is_err());
    /// ```
    pub fn new(length: f64, width: f64, height: f64) -> Result<Self, ValidationError> {
        validate_dimension(length, "Warehouse length")?;
        validate_dimension(width, "Warehouse width")?;
        validate_dimension(height, "Warehouse height")?;
        Ok(Self {
            length,
            width,
            height,
        })
    }

    /// Re-runs construction-time validation on a deserialized value.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Self::new(self.length, self.width, self.height)
    }

    /// The full floor as a rectangle anchored at the origin.
    pub fn floor_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.length, self.width)
    }
}

impl Dimensional for WarehouseEnvelope {
    fn length(&self) -> f64 {
        self.length
    }
    fn width(&self) -> f64 {
        self.width
    }
    fn height(&self) -> f64 {
        self.height
    }
}

/// Discrete candidate values `{min, min+step, ...}` for one rack axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"min": 1.0, "max": 3.0, "step": 0.5}))]
pub struct RackDimensionRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl RackDimensionRange {
    /// Creates a new range after validating bounds and step.
    ///
    /// # Examples
    /// ```
    /// use rack_planner::model::RackDimensionRange;
    ///
    /// let range = RackDimensionRange::new(1.0, 2.0, 0.5).unwrap();
    /// assert_eq!(range.value_count(), 3);
    /// assert!(RackDimensionRange::new(1.0, 2.0, 0.0).is_err());
    /// assert!(RackDimensionRange::new(3.0, 2.0, 0.5).is_err());
    /// ```
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self, ValidationError> {
        let range = Self { min, max, step };
        range.validate()?;
        Ok(range)
    }

    /// A range holding exactly one value.
    pub fn single(value: f64) -> Result<Self, ValidationError> {
        Self::new(value, value, 1.0)
    }

    /// Checks the range invariants: finite positive bounds, `step > 0`,
    /// `min <= max`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(ValidationError::InvalidRange(format!(
                "step must be positive, got: {}",
                self.step
            )));
        }
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ValidationError::InvalidRange(
                "bounds must be finite numbers".to_string(),
            ));
        }
        if self.min <= 0.0 {
            return Err(ValidationError::InvalidRange(format!(
                "min must be positive, got: {}",
                self.min
            )));
        }
        if self.min > self.max {
            return Err(ValidationError::InvalidRange(format!(
                "min ({}) must not exceed max ({})",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Number of grid values: `floor((max - min) / step) + 1`.
    ///
    /// A small fraction of a step is tolerated so a boundary that is an exact
    /// multiple of the step survives floating-point rounding.
    pub fn value_count(&self) -> usize {
        let spans = ((self.max - self.min) / self.step + EPSILON_GRID).floor();
        if spans.is_nan() || spans < 0.0 {
            return 1;
        }
        (spans as usize).saturating_add(1)
    }

    /// The `index`-th grid value, never above `max`.
    ///
    /// When `max` sits just below a lattice point (within the tolerance used
    /// by `value_count`), the last value is `max` itself rather than
    /// `min + index * step`, so it may lie off the step lattice.
    pub fn value_at(&self, index: usize) -> f64 {
        (self.min + index as f64 * self.step).min(self.max)
    }
}

/// The three axis ranges spanning the candidate grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RackRanges {
    pub length: RackDimensionRange,
    pub width: RackDimensionRange,
    pub height: RackDimensionRange,
}

impl RackRanges {
    pub fn new(
        length: RackDimensionRange,
        width: RackDimensionRange,
        height: RackDimensionRange,
    ) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    pub fn get(&self, axis: Axis) -> &RackDimensionRange {
        match axis {
            Axis::Length => &self.length,
            Axis::Width => &self.width,
            Axis::Height => &self.height,
        }
    }

    /// Validates every axis, reporting the first offending one.
    pub fn validate(&self) -> Result<(), SearchError> {
        for axis in Axis::ALL {
            self.get(axis)
                .validate()
                .map_err(|source| SearchError::InvalidRange { axis, source })?;
        }
        Ok(())
    }

    /// Total number of grid combinations (saturating).
    pub fn combination_count(&self) -> usize {
        self.length
            .value_count()
            .saturating_mul(self.width.value_count())
            .saturating_mul(self.height.value_count())
    }
}

/// Clearances applied around and between rack blocks, in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"aisle_between_racks": 1.0, "main_aisle_width": 4.0, "safety_margin": 0.5}))]
pub struct LayoutConstraints {
    /// Clearance between adjacent rack rows on the same side
    pub aisle_between_racks: f64,
    /// Width of the main circulation aisle
    pub main_aisle_width: f64,
    /// Margin kept free along every wall
    pub safety_margin: f64,
}

impl LayoutConstraints {
    pub fn new(
        aisle_between_racks: f64,
        main_aisle_width: f64,
        safety_margin: f64,
    ) -> Result<Self, ValidationError> {
        validate_clearance(aisle_between_racks, "Aisle between racks")?;
        validate_clearance(main_aisle_width, "Main aisle width")?;
        validate_clearance(safety_margin, "Safety margin")?;
        Ok(Self {
            aisle_between_racks,
            main_aisle_width,
            safety_margin,
        })
    }

    pub fn validated(self) -> Result<Self, ValidationError> {
        Self::new(
            self.aisle_between_racks,
            self.main_aisle_width,
            self.safety_margin,
        )
    }
}

/// Size of one rack in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"length": 2.0, "width": 1.0, "height": 6.0}))]
pub struct RackDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl RackDimensions {
    pub fn new(length: f64, width: f64, height: f64) -> Result<Self, ValidationError> {
        validate_dimension(length, "Rack length")?;
        validate_dimension(width, "Rack width")?;
        validate_dimension(height, "Rack height")?;
        Ok(Self {
            length,
            width,
            height,
        })
    }

    pub fn validated(self) -> Result<Self, ValidationError> {
        Self::new(self.length, self.width, self.height)
    }
}

impl Dimensional for RackDimensions {
    fn length(&self) -> f64 {
        self.length
    }
    fn width(&self) -> f64 {
        self.width
    }
    fn height(&self) -> f64 {
        self.height
    }
}

impl From<(f64, f64, f64)> for RackDimensions {
    fn from((length, width, height): (f64, f64, f64)) -> Self {
        Self {
            length,
            width,
            height,
        }
    }
}
