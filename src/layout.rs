//! Layout calculation for a single rack size.
//!
//! Racks are arranged in two blocks on either side of the warehouse's
//! central aisle. Along the length axis, one row holds as many racks as fit
//! once the safety margins and the main aisle are subtracted. Across the
//! width, each side holds as many rows as fit with `aisle_between_racks`
//! clearance per row. Vertically the rack height is stacked into levels.
//!
//! Infeasibility is an expected outcome during a grid search and is
//! reported as a value, never as an error.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{LayoutConstraints, RackDimensions, WarehouseEnvelope};
use crate::types::{Dimensional, floor_count, percent_of};

/// Geometry and capacity of one feasible rack size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct RackLayout {
    pub rack: RackDimensions,
    /// Racks placed end to end along the warehouse length
    pub racks_per_row: u64,
    /// Rack rows on one side of the central aisle
    pub racks_per_side: u64,
    /// Racks on one side (`racks_per_row * racks_per_side`)
    pub racks_per_side_total: u64,
    /// Racks on both sides
    pub total_racks: u64,
    /// Storage tiers per rack
    pub levels: u64,
    /// Nominal pallet positions (`total_racks * levels`)
    pub capacity_total: u64,
    /// Floor area covered by rack footprints (m²)
    pub storage_area: f64,
    /// `storage_area` as a percentage of the floor
    pub storage_ratio: f64,
    /// Rack volume used up to the top level (m³)
    pub volume_utilized: f64,
    /// `volume_utilized` as a percentage of the warehouse volume
    pub volume_ratio: f64,
}

/// Reasons a rack size does not fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfeasibleReason {
    NoRackAlongLength,
    NoRackAcrossWidth,
    RackTallerThanWarehouse,
    /// The rack is so small that the rack or pallet count exceeds `u64`
    TooManyRacks,
}

impl InfeasibleReason {
    pub fn code(&self) -> &'static str {
        match self {
            InfeasibleReason::NoRackAlongLength => "no_rack_along_length",
            InfeasibleReason::NoRackAcrossWidth => "no_rack_across_width",
            InfeasibleReason::RackTallerThanWarehouse => "rack_taller_than_warehouse",
            InfeasibleReason::TooManyRacks => "too_many_racks",
        }
    }
}

impl std::fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibleReason::NoRackAlongLength => write!(
                f,
                "Rack is longer than the usable length after margins and main aisle"
            ),
            InfeasibleReason::NoRackAcrossWidth => write!(
                f,
                "No rack row fits across the usable width of one side"
            ),
            InfeasibleReason::RackTallerThanWarehouse => {
                write!(f, "Rack is taller than the warehouse")
            }
            InfeasibleReason::TooManyRacks => {
                write!(f, "Rack is too small, the rack count cannot be represented")
            }
        }
    }
}

/// Result of evaluating one rack size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayoutOutcome {
    Feasible(RackLayout),
    Infeasible(InfeasibleReason),
}

impl LayoutOutcome {
    pub fn is_feasible(&self) -> bool {
        matches!(self, LayoutOutcome::Feasible(_))
    }

    pub fn feasible(self) -> Option<RackLayout> {
        match self {
            LayoutOutcome::Feasible(layout) => Some(layout),
            LayoutOutcome::Infeasible(_) => None,
        }
    }
}

/// Length available for racks along one row.
pub fn usable_length(envelope: &WarehouseEnvelope, constraints: &LayoutConstraints) -> f64 {
    envelope.length - 2.0 * constraints.safety_margin - constraints.main_aisle_width
}

/// Width available to the rack rows of one side.
pub fn usable_width_per_side(
    envelope: &WarehouseEnvelope,
    constraints: &LayoutConstraints,
) -> f64 {
    (envelope.width - 2.0 * constraints.safety_margin - constraints.aisle_between_racks) / 2.0
}

/// Evaluates one rack size against the envelope.
///
/// Counts are truncated, never rounded up. Ratios fall back to `0` when the
/// envelope has no area or volume.
///
/// # Examples
/// ```
/// use rack_planner::layout::{LayoutOutcome, calculate_layout};
/// use rack_planner::model::{LayoutConstraints, RackDimensions, WarehouseEnvelope};
///
/// let envelope = WarehouseEnvelope::new(50.0, 30.0, 12.0).unwrap();
/// let constraints = LayoutConstraints::new(1.0, 4.0, 0.5).unwrap();
/// let rack = RackDimensions::new(2.0, 1.0, 6.0).unwrap();
///
/// match calculate_layout(&rack, &envelope, &constraints) {
///     LayoutOutcome::Feasible(layout) => assert_eq!(layout.total_racks, 308),
///     LayoutOutcome::Infeasible(reason) => panic!("unexpected: {}", reason),
/// }
/// ```
pub fn calculate_layout(
    rack: &RackDimensions,
    envelope: &WarehouseEnvelope,
    constraints: &LayoutConstraints,
) -> LayoutOutcome {
    let racks_per_row = floor_count(usable_length(envelope, constraints), rack.length);
    if racks_per_row == 0 {
        return LayoutOutcome::Infeasible(InfeasibleReason::NoRackAlongLength);
    }

    let racks_per_side = floor_count(
        usable_width_per_side(envelope, constraints),
        rack.width + constraints.aisle_between_racks,
    );
    if racks_per_side == 0 {
        return LayoutOutcome::Infeasible(InfeasibleReason::NoRackAcrossWidth);
    }

    let levels = floor_count(envelope.height, rack.height);
    if levels == 0 {
        return LayoutOutcome::Infeasible(InfeasibleReason::RackTallerThanWarehouse);
    }

    let counts = racks_per_row.checked_mul(racks_per_side).and_then(|per_side| {
        let total = per_side.checked_mul(2)?;
        let capacity = total.checked_mul(levels)?;
        Some((per_side, total, capacity))
    });
    let Some((racks_per_side_total, total_racks, capacity_total)) = counts else {
        return LayoutOutcome::Infeasible(InfeasibleReason::TooManyRacks);
    };

    let storage_area = total_racks as f64 * rack.footprint();
    let storage_ratio = percent_of(storage_area, envelope.footprint());

    let volume_utilized = storage_area * (levels as f64 * rack.height);
    let volume_ratio = percent_of(volume_utilized, envelope.volume());

    LayoutOutcome::Feasible(RackLayout {
        rack: *rack,
        racks_per_row,
        racks_per_side,
        racks_per_side_total,
        total_racks,
        levels,
        capacity_total,
        storage_area,
        storage_ratio,
        volume_utilized,
        volume_ratio,
    })
}
