//! Geometrische Anordnung der Regale für die Schemaansicht.
//!
//! Dieses Modul übersetzt eine berechnete Regalkonfiguration in konkrete
//! Rechtecke auf der Hallenfläche. Das Zeichnen selbst übernimmt ein externer
//! Renderer; hier entstehen nur Positionen, Maße und Beschriftungen.
//!
//! Koordinaten: x entlang der Hallenlänge, y quer dazu, Ursprung in der Ecke
//! der Halle, alle Werte in Metern.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::layout::{RackLayout, usable_width_per_side};
use crate::model::{LayoutConstraints, WarehouseEnvelope};
use crate::types::Rect;

/// Art einer freizuhaltenden Verkehrsfläche.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AisleKind {
    /// Hauptgang quer zur Hallenlänge zwischen den beiden Regalblöcken
    Main,
    /// Mittelgang zwischen den beiden Regalseiten
    Central,
}

/// Ein platziertes Regal.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct RackPlacement {
    /// Beschriftung im Schema (`R01`, `R02`, ...)
    pub label: String,
    /// Seite des Mittelgangs (0 oder 1)
    pub side: u8,
    /// Reihe innerhalb der Seite, vom Mittelgang abgewandt gezählt
    pub row: u64,
    /// Position innerhalb der Reihe entlang der Hallenlänge
    pub column: u64,
    pub rect: Rect,
}

/// Eine Verkehrsfläche im Schema.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct AisleZone {
    pub kind: AisleKind,
    pub rect: Rect,
}

/// Vollständiges Schema einer Konfiguration.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct SchematicPlan {
    /// Gesamte Hallenfläche
    pub floor: Rect,
    /// Fläche innerhalb des Sicherheitsabstands
    pub usable_floor: Rect,
    pub racks: Vec<RackPlacement>,
    pub aisles: Vec<AisleZone>,
}

/// Standardobergrenze für Regale in einem Schema.
pub const DEFAULT_MAX_PLACEMENTS: usize = 50_000;

/// Das Schema würde mehr Regale enthalten als erlaubt.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Schematic would place {racks} racks, the limit is {limit}")]
pub struct PlacementLimitExceeded {
    pub racks: u64,
    pub limit: usize,
}

/// Erzeugt die Regalpositionen für eine machbare Konfiguration.
///
/// Entlang der Länge wird jede Reihe durch den Hauptgang in zwei Blöcke
/// geteilt (die ersten `ceil(n/2)` Regale, dann der Gang, dann der Rest).
/// Quer dazu liegen zwei Seiten, getrennt durch einen Mittelgang der Breite
/// `aisle_between_racks`; jede Seite enthält `racks_per_side` Reihen im
/// Abstand `rack_width + aisle_between_racks`.
///
/// # Parameter
/// * `layout` - Ergebnis von `calculate_layout`
/// * `envelope` - Hallenmaße
/// * `constraints` - Gänge und Sicherheitsabstand
/// * `max_placements` - Höchstzahl platzierter Regale
///
/// # Rückgabewert
/// `SchematicPlan` mit genau `layout.total_racks` Regalen, die sich nicht
/// überschneiden und innerhalb des Sicherheitsabstands liegen, oder
/// `PlacementLimitExceeded`, bevor irgendetwas angelegt wird
pub fn plan_schematic(
    layout: &RackLayout,
    envelope: &WarehouseEnvelope,
    constraints: &LayoutConstraints,
    max_placements: usize,
) -> Result<SchematicPlan, PlacementLimitExceeded> {
    let capacity = match usize::try_from(layout.total_racks) {
        Ok(count) if count <= max_placements => count,
        _ => {
            return Err(PlacementLimitExceeded {
                racks: layout.total_racks,
                limit: max_placements,
            });
        }
    };

    let margin = constraints.safety_margin;
    let aisle = constraints.aisle_between_racks;
    let rack_length = layout.rack.length;
    let rack_width = layout.rack.width;

    let usable_floor = Rect::new(
        margin,
        margin,
        envelope.length - 2.0 * margin,
        envelope.width - 2.0 * margin,
    );

    let side_width = usable_width_per_side(envelope, constraints);
    let side_origins = [margin, margin + side_width + aisle];
    let first_block = layout.racks_per_row.div_ceil(2);

    let column_x = |column: u64| -> f64 {
        let offset = margin + column as f64 * rack_length;
        if column < first_block {
            offset
        } else {
            offset + constraints.main_aisle_width
        }
    };

    let mut racks = Vec::with_capacity(capacity);
    for (side, origin) in side_origins.iter().enumerate() {
        for row in 0..layout.racks_per_side {
            let y = origin + row as f64 * (rack_width + aisle);
            for column in 0..layout.racks_per_row {
                racks.push(RackPlacement {
                    label: format!("R{:02}", racks.len() + 1),
                    side: side as u8,
                    row,
                    column,
                    rect: Rect::new(column_x(column), y, rack_length, rack_width),
                });
            }
        }
    }

    let mut aisles = Vec::new();
    if constraints.main_aisle_width > 0.0 {
        aisles.push(AisleZone {
            kind: AisleKind::Main,
            rect: Rect::new(
                margin + first_block as f64 * rack_length,
                margin,
                constraints.main_aisle_width,
                usable_floor.width,
            ),
        });
    }
    if aisle > 0.0 {
        aisles.push(AisleZone {
            kind: AisleKind::Central,
            rect: Rect::new(margin, margin + side_width, usable_floor.length, aisle),
        });
    }

    Ok(SchematicPlan {
        floor: envelope.floor_rect(),
        usable_floor,
        racks,
        aisles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::calculate_layout;
    use crate::model::RackDimensions;
    use crate::types::EPSILON_GENERAL;

    fn plan_for(
        envelope: WarehouseEnvelope,
        constraints: LayoutConstraints,
        rack: RackDimensions,
    ) -> (RackLayout, SchematicPlan) {
        let layout = calculate_layout(&rack, &envelope, &constraints)
            .feasible()
            .expect("Konfiguration muss machbar sein");
        let plan = plan_schematic(&layout, &envelope, &constraints, DEFAULT_MAX_PLACEMENTS)
            .expect("Schema liegt unter der Obergrenze");
        (layout, plan)
    }

    fn reference() -> (RackLayout, SchematicPlan) {
        plan_for(
            WarehouseEnvelope::new(50.0, 30.0, 12.0).unwrap(),
            LayoutConstraints::new(1.0, 4.0, 0.5).unwrap(),
            RackDimensions::new(2.0, 1.0, 6.0).unwrap(),
        )
    }

    #[test]
    fn places_every_rack() {
        let (layout, plan) = reference();
        assert_eq!(plan.racks.len() as u64, layout.total_racks);
        assert_eq!(plan.racks[0].label, "R01");
        assert_eq!(plan.racks[9].label, "R10");
        assert_eq!(plan.racks.last().unwrap().label, "R308");
    }

    #[test]
    fn racks_stay_inside_safety_margin() {
        let (_, plan) = reference();
        for rack in &plan.racks {
            assert!(
                rack.rect.fits_within(&plan.usable_floor, EPSILON_GENERAL),
                "{} liegt außerhalb der nutzbaren Fläche: {:?}",
                rack.label,
                rack.rect
            );
        }
    }

    #[test]
    fn racks_and_aisles_do_not_overlap() {
        let (_, plan) = plan_for(
            WarehouseEnvelope::new(30.0, 20.0, 8.0).unwrap(),
            LayoutConstraints::new(1.5, 3.0, 1.0).unwrap(),
            RackDimensions::new(2.7, 1.2, 2.5).unwrap(),
        );

        for (i, a) in plan.racks.iter().enumerate() {
            for b in plan.racks.iter().skip(i + 1) {
                assert!(
                    !a.rect.intersects(&b.rect, EPSILON_GENERAL),
                    "{} überschneidet {}",
                    a.label,
                    b.label
                );
            }
            for zone in &plan.aisles {
                assert!(
                    !a.rect.intersects(&zone.rect, EPSILON_GENERAL),
                    "{} ragt in den Gang {:?}",
                    a.label,
                    zone.kind
                );
            }
        }
    }

    #[test]
    fn main_aisle_splits_rows_into_two_blocks() {
        let (layout, plan) = reference();
        let main = plan
            .aisles
            .iter()
            .find(|zone| zone.kind == AisleKind::Main)
            .expect("Hauptgang fehlt");

        // 22 racks per row: 11 before the aisle, 11 behind it
        assert_eq!(layout.racks_per_row, 22);
        assert!((main.rect.x - 22.5).abs() < EPSILON_GENERAL);
        assert!((main.rect.length - 4.0).abs() < EPSILON_GENERAL);

        let twelfth = &plan.racks[11];
        assert_eq!(twelfth.column, 11);
        assert!((twelfth.rect.x - 26.5).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn zero_clearances_produce_no_aisle_zones() {
        let (_, plan) = plan_for(
            WarehouseEnvelope::new(10.0, 10.0, 3.0).unwrap(),
            LayoutConstraints::new(0.0, 0.0, 0.0).unwrap(),
            RackDimensions::new(1.0, 1.0, 1.0).unwrap(),
        );
        assert!(plan.aisles.is_empty());
        assert_eq!(plan.racks.len(), 100);
        let covered: f64 = plan.racks.iter().map(|r| r.rect.area()).sum();
        assert!((covered - plan.floor.area()).abs() < 1e-6);
    }

    #[test]
    fn placement_limit_is_checked_before_allocating() {
        let envelope = WarehouseEnvelope::new(200.0, 200.0, 10.0).unwrap();
        let constraints = LayoutConstraints::new(0.0, 0.0, 0.0).unwrap();
        let rack = RackDimensions::new(0.01, 0.01, 10.0).unwrap();
        let layout = calculate_layout(&rack, &envelope, &constraints)
            .feasible()
            .expect("Konfiguration muss machbar sein");
        assert!(layout.total_racks > 100_000_000);

        let err = plan_schematic(&layout, &envelope, &constraints, DEFAULT_MAX_PLACEMENTS)
            .expect_err("Obergrenze muss greifen");
        assert_eq!(err.racks, layout.total_racks);
        assert_eq!(err.limit, DEFAULT_MAX_PLACEMENTS);
    }

    #[test]
    fn placement_limit_is_inclusive() {
        let (layout, _) = reference();
        let envelope = WarehouseEnvelope::new(50.0, 30.0, 12.0).unwrap();
        let constraints = LayoutConstraints::new(1.0, 4.0, 0.5).unwrap();
        assert!(plan_schematic(&layout, &envelope, &constraints, 308).is_ok());
        assert!(plan_schematic(&layout, &envelope, &constraints, 307).is_err());
    }
}
