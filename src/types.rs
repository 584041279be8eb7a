//! Common types and traits for warehouse geometry.
//!
//! This module defines the small numeric building blocks shared by the
//! layout calculator, the schematic planner and the scorer.

use serde::Serialize;
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
///
/// Used for containment and overlap checks on placed rectangles.
pub const EPSILON_GENERAL: f64 = 1e-9;

/// Fraction of a step tolerated when deciding whether a grid value still
/// lies on the inclusive upper boundary of a range.
pub const EPSILON_GRID: f64 = 1e-6;

/// Trait for objects with a three-dimensional extent in meters.
///
/// `length` runs along the warehouse's long axis (x), `width` across it (y)
/// and `height` is vertical.
pub trait Dimensional {
    /// Extent along the x axis.
    fn length(&self) -> f64;

    /// Extent along the y axis.
    fn width(&self) -> f64;

    /// Vertical extent.
    fn height(&self) -> f64;

    /// Floor area (length × width).
    fn footprint(&self) -> f64 {
        self.length() * self.width()
    }

    /// Volume (length × width × height).
    fn volume(&self) -> f64 {
        self.footprint() * self.height()
    }
}

/// Returns `part / whole * 100`, or `0.0` when the denominator is not a
/// positive finite number.
///
/// # Examples
/// ```
/// use rack_planner::types::percent_of;
///
/// assert_eq!(percent_of(25.0, 100.0), 25.0);
/// assert_eq!(percent_of(25.0, 0.0), 0.0);
/// ```
#[inline]
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 || !whole.is_finite() {
        return 0.0;
    }
    part / whole * 100.0
}

/// Floors a non-negative ratio into a count, clamping negatives and NaN to 0.
#[inline]
pub fn floor_count(numerator: f64, denominator: f64) -> u64 {
    if denominator <= 0.0 || !denominator.is_finite() {
        return 0;
    }
    let ratio = (numerator / denominator).floor();
    if ratio.is_nan() || ratio <= 0.0 {
        0
    } else {
        ratio as u64
    }
}

/// Axis-aligned rectangle on the warehouse floor.
///
/// Used by the schematic planner for rack and aisle footprints.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct Rect {
    /// Minimum x (along the warehouse length)
    pub x: f64,
    /// Minimum y (across the warehouse width)
    pub y: f64,
    /// Extent along x
    pub length: f64,
    /// Extent along y
    pub width: f64,
}

impl Rect {
    #[inline]
    pub const fn new(x: f64, y: f64, length: f64, width: f64) -> Self {
        Self {
            x,
            y,
            length,
            width,
        }
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.x + self.length
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.y + self.width
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.length * self.width
    }

    /// Checks if two rectangles overlap with a positive area.
    ///
    /// Touching edges do not count as an intersection.
    #[inline]
    pub fn intersects(&self, other: &Self, tolerance: f64) -> bool {
        !(self.max_x() <= other.x + tolerance
            || other.max_x() <= self.x + tolerance
            || self.max_y() <= other.y + tolerance
            || other.max_y() <= self.y + tolerance)
    }

    /// Calculates the overlap area with another rectangle.
    #[inline]
    pub fn overlap_area(&self, other: &Self) -> f64 {
        overlap_1d(self.x, self.max_x(), other.x, other.max_x())
            * overlap_1d(self.y, self.max_y(), other.y, other.max_y())
    }

    /// Checks if this rectangle lies completely inside `outer`.
    #[inline]
    pub fn fits_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.x + tolerance >= outer.x
            && self.y + tolerance >= outer.y
            && self.max_x() <= outer.max_x() + tolerance
            && self.max_y() <= outer.max_y() + tolerance
    }
}

/// Calculates the overlap of two intervals in one dimension.
#[inline]
pub fn overlap_1d(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
    (a_max.min(b_max) - a_min.max(b_min)).max(0.0)
}

/// Validation helpers shared by the input records.
pub mod validation {

    /// Validates a strictly positive, finite dimension.
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a finite clearance that may be zero.
    pub fn validate_clearance(value: f64, name: &str) -> Result<(), String> {
        if !value.is_finite() {
            return Err(format!("{} must be a finite number", name));
        }
        if value < 0.0 {
            return Err(format!("{} must not be negative, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a fraction in the half-open interval (0, 1].
    pub fn validate_fraction(value: f64, name: &str) -> Result<(), String> {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            return Err(format!("{} must be within (0, 1], got: {}", name, value));
        }
        Ok(())
    }
}
