//! Suche und Bewertung von Regalkonfigurationen.
//!
//! Dieses Modul durchläuft das Raster aller Regalmaße, berechnet für jede
//! Kombination das Layout und bewertet die machbaren Kandidaten:
//! - Zielgröße (Regalanzahl, Volumen, Flächenbelegung oder gewichteter Score)
//! - Gleichstandsregel (mehr Regale, kleinere Grundfläche, Rasterreihenfolge)
//! - Füllgrad zur Umrechnung von Stellplätzen in erwartete Paletten
//! - Obergrenze für die Anzahl ausgewerteter Kandidaten
//!
//! Die Berechnung ist rein: gleiche Eingaben liefern das gleiche Ergebnis.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::SearchError;
use crate::grid::CandidateGrid;
use crate::layout::{InfeasibleReason, LayoutOutcome, RackLayout, calculate_layout};
use crate::model::{
    LayoutConstraints, RackDimensions, RackRanges, ValidationError, WarehouseEnvelope,
};
use crate::types::{Dimensional, validation};

/// Zielgröße, nach der absteigend sortiert wird.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Möglichst viele Regale
    MaxRacks,
    /// Möglichst viel genutztes Regalvolumen
    MaxVolume,
    /// Möglichst hoher Anteil belegter Grundfläche
    BestOccupancy,
    /// Gewichteter Score aus Fläche, Volumen und Regalanzahl
    #[default]
    Balanced,
}

impl Objective {
    pub fn code(&self) -> &'static str {
        match self {
            Objective::MaxRacks => "max_racks",
            Objective::MaxVolume => "max_volume",
            Objective::BestOccupancy => "best_occupancy",
            Objective::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "max_racks" | "racks" => Ok(Objective::MaxRacks),
            "max_volume" | "volume" => Ok(Objective::MaxVolume),
            "best_occupancy" | "occupancy" => Ok(Objective::BestOccupancy),
            "balanced" => Ok(Objective::Balanced),
            other => Err(format!("unknown objective '{}'", other)),
        }
    }
}

/// Regel für Kandidaten mit gleichem Zielwert.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Mehr Regale zuerst, danach kleinere Grundfläche, danach Rasterreihenfolge
    #[default]
    MoreRacksThenSmallerFootprint,
    /// Reihenfolge des Rasters (Länge außen, Höhe innen)
    GridOrder,
}

impl TieBreak {
    pub fn code(&self) -> &'static str {
        match self {
            TieBreak::MoreRacksThenSmallerFootprint => "racks",
            TieBreak::GridOrder => "grid",
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "racks" | "more_racks" | "more_racks_then_smaller_footprint" => {
                Ok(TieBreak::MoreRacksThenSmallerFootprint)
            }
            "grid" | "grid_order" => Ok(TieBreak::GridOrder),
            other => Err(format!("unknown tie-break policy '{}'", other)),
        }
    }
}

/// Gewichtung des zusammengesetzten Scores.
///
/// `score = storage_weight * storage_ratio + volume_weight * volume_ratio
///        + rack_weight * min(total_racks / rack_normalization, 1) * 100`
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoringPolicy {
    pub storage_weight: f64,
    pub volume_weight: f64,
    pub rack_weight: f64,
    /// Regalanzahl, ab der der Regalanteil voll zählt
    pub rack_normalization: f64,
}

impl ScoringPolicy {
    pub const DEFAULT_STORAGE_WEIGHT: f64 = 0.4;
    pub const DEFAULT_VOLUME_WEIGHT: f64 = 0.4;
    pub const DEFAULT_RACK_WEIGHT: f64 = 0.2;
    pub const DEFAULT_RACK_NORMALIZATION: f64 = 100.0;

    /// Berechnet den Score eines Layouts.
    pub fn score(&self, layout: &RackLayout) -> f64 {
        let rack_share = if self.rack_normalization > 0.0 {
            (layout.total_racks as f64 / self.rack_normalization).min(1.0)
        } else {
            0.0
        };
        self.storage_weight * layout.storage_ratio
            + self.volume_weight * layout.volume_ratio
            + self.rack_weight * rack_share * 100.0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (value, name) in [
            (self.storage_weight, "Storage weight"),
            (self.volume_weight, "Volume weight"),
            (self.rack_weight, "Rack weight"),
        ] {
            validation::validate_clearance(value, name)
                .map_err(ValidationError::InvalidConfiguration)?;
        }
        validation::validate_dimension(self.rack_normalization, "Rack normalization")
            .map_err(ValidationError::InvalidConfiguration)
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            storage_weight: Self::DEFAULT_STORAGE_WEIGHT,
            volume_weight: Self::DEFAULT_VOLUME_WEIGHT,
            rack_weight: Self::DEFAULT_RACK_WEIGHT,
            rack_normalization: Self::DEFAULT_RACK_NORMALIZATION,
        }
    }
}

/// Grenzwerte der Konformitätsprüfung.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComplianceThresholds {
    /// Mindestbreite des Hauptgangs für Gabelstapler (m)
    pub forklift_aisle_min: f64,
    /// Größte Regalhöhe ohne Spezialgerät (m)
    pub standard_height_max: f64,
}

impl ComplianceThresholds {
    pub const DEFAULT_FORKLIFT_AISLE_MIN: f64 = 3.0;
    pub const DEFAULT_STANDARD_HEIGHT_MAX: f64 = 12.0;

    /// Prüft Hauptgang und Regalhöhe gegen die Grenzwerte.
    ///
    /// Beide Grenzen sind inklusiv: ein Gang von genau `forklift_aisle_min`
    /// ist befahrbar, ein Regal von genau `standard_height_max` ist Standard.
    pub fn check(&self, rack: &RackDimensions, constraints: &LayoutConstraints) -> ComplianceReport {
        ComplianceReport {
            main_aisle_forklift_ok: constraints.main_aisle_width >= self.forklift_aisle_min,
            height_standard: rack.height <= self.standard_height_max,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_clearance(self.forklift_aisle_min, "Forklift aisle minimum")
            .map_err(ValidationError::InvalidConfiguration)?;
        validation::validate_dimension(self.standard_height_max, "Standard height maximum")
            .map_err(ValidationError::InvalidConfiguration)
    }
}

impl Default for ComplianceThresholds {
    fn default() -> Self {
        Self {
            forklift_aisle_min: Self::DEFAULT_FORKLIFT_AISLE_MIN,
            standard_height_max: Self::DEFAULT_STANDARD_HEIGHT_MAX,
        }
    }
}

/// Ergebnis der Konformitätsprüfung eines Kandidaten.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ComplianceReport {
    /// Hauptgang breit genug für Gabelstapler
    pub main_aisle_forklift_ok: bool,
    /// Regalhöhe ohne Spezialgerät bedienbar
    pub height_standard: bool,
}

/// Konfiguration für die Konfigurationssuche.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// Zielgröße der Sortierung
    pub objective: Objective,
    /// Anteil tatsächlich belegter Stellplätze (0.0 bis 1.0)
    pub fill_rate: f64,
    /// Gleichstandsregel
    pub tie_break: TieBreak,
    /// Gewichtung des Scores
    pub scoring: ScoringPolicy,
    /// Höchstzahl ausgewerteter Rasterpunkte (`None` = unbegrenzt)
    pub max_candidates: Option<usize>,
    /// Grenzwerte der Konformitätsprüfung
    pub compliance: ComplianceThresholds,
}

impl SearchConfig {
    pub const DEFAULT_FILL_RATE: f64 = 1.0;
    pub const DEFAULT_MAX_CANDIDATES: usize = 100_000;

    /// Erstellt einen Builder für benutzerdefinierte Konfiguration.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_fraction(self.fill_rate, "Fill rate")
            .map_err(ValidationError::InvalidConfiguration)?;
        if self.max_candidates == Some(0) {
            return Err(ValidationError::InvalidConfiguration(
                "Candidate limit must be at least 1".to_string(),
            ));
        }
        self.scoring.validate()?;
        self.compliance.validate()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            objective: Objective::default(),
            fill_rate: Self::DEFAULT_FILL_RATE,
            tie_break: TieBreak::default(),
            scoring: ScoringPolicy::default(),
            max_candidates: Some(Self::DEFAULT_MAX_CANDIDATES),
            compliance: ComplianceThresholds::default(),
        }
    }
}

/// Builder-Pattern für SearchConfig.
#[derive(Clone, Debug, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Setzt die Zielgröße.
    pub fn objective(mut self, objective: Objective) -> Self {
        self.config.objective = objective;
        self
    }

    /// Setzt den Füllgrad.
    pub fn fill_rate(mut self, fill_rate: f64) -> Self {
        self.config.fill_rate = fill_rate;
        self
    }

    /// Setzt die Gleichstandsregel.
    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.config.tie_break = tie_break;
        self
    }

    /// Setzt die Score-Gewichtung.
    pub fn scoring(mut self, scoring: ScoringPolicy) -> Self {
        self.config.scoring = scoring;
        self
    }

    /// Setzt die Obergrenze ausgewerteter Kandidaten.
    pub fn max_candidates(mut self, limit: Option<usize>) -> Self {
        self.config.max_candidates = limit;
        self
    }

    /// Setzt die Grenzwerte der Konformitätsprüfung.
    pub fn compliance(mut self, compliance: ComplianceThresholds) -> Self {
        self.config.compliance = compliance;
        self
    }

    /// Erstellt die finale Konfiguration.
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

/// Eingaben einer Suche.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchInput {
    pub envelope: WarehouseEnvelope,
    pub ranges: RackRanges,
    pub constraints: LayoutConstraints,
}

/// Ein machbarer, bewerteter Kandidat.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct CandidateConfiguration {
    /// Position im Raster (Länge außen, Höhe innen)
    pub grid_index: usize,
    #[serde(flatten)]
    pub layout: RackLayout,
    /// Erwartete Paletten nach Füllgrad
    pub total_pallets: u64,
    /// Zusammengesetzter Score nach `ScoringPolicy`
    pub score: f64,
    /// Gabelstapler- und Höhenprüfung
    pub compliance: ComplianceReport,
}

impl CandidateConfiguration {
    pub fn new(
        grid_index: usize,
        layout: RackLayout,
        constraints: &LayoutConstraints,
        config: &SearchConfig,
    ) -> Self {
        let total_pallets = (layout.capacity_total as f64 * config.fill_rate).floor() as u64;
        Self {
            grid_index,
            layout,
            total_pallets,
            score: config.scoring.score(&layout),
            compliance: config.compliance.check(&layout.rack, constraints),
        }
    }

    pub fn rack(&self) -> &RackDimensions {
        &self.layout.rack
    }

    pub fn total_racks(&self) -> u64 {
        self.layout.total_racks
    }
}

/// Ergebnis einer Kandidatenbewertung.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CandidateOutcome {
    Feasible(CandidateConfiguration),
    Infeasible(InfeasibleReason),
}

/// Bewertet ein einzelnes Regalmaß.
pub fn evaluate_rack(
    grid_index: usize,
    rack: &RackDimensions,
    envelope: &WarehouseEnvelope,
    constraints: &LayoutConstraints,
    config: &SearchConfig,
) -> CandidateOutcome {
    match calculate_layout(rack, envelope, constraints) {
        LayoutOutcome::Feasible(layout) => {
            CandidateOutcome::Feasible(CandidateConfiguration::new(
            grid_index,
            layout,
            constraints,
            config,
        ))
        }
        LayoutOutcome::Infeasible(reason) => CandidateOutcome::Infeasible(reason),
    }
}

/// Ergebnis einer Suche. Enthält mindestens einen Kandidaten.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    candidates: Vec<CandidateConfiguration>,
    objective: Objective,
    evaluated: usize,
    total_combinations: usize,
    infeasible: usize,
}

impl SearchResult {
    /// Alle machbaren Kandidaten, absteigend sortiert.
    pub fn candidates(&self) -> &[CandidateConfiguration] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<CandidateConfiguration> {
        self.candidates
    }

    /// Bester Kandidat (Kopf der Liste).
    pub fn best(&self) -> &CandidateConfiguration {
        &self.candidates[0]
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    pub fn total_combinations(&self) -> usize {
        self.total_combinations
    }

    pub fn feasible_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn infeasible_count(&self) -> usize {
        self.infeasible
    }

    /// Gibt an, ob die Suche an der Kandidatengrenze abgebrochen wurde.
    pub fn is_truncated(&self) -> bool {
        self.evaluated < self.total_combinations
    }

    /// Kurzbeschreibung für Logs und Antworten.
    pub fn summary(&self) -> String {
        if self.is_truncated() {
            format!(
                "searched {} of {} combinations, returning best so far ({} feasible)",
                self.evaluated,
                self.total_combinations,
                self.feasible_count()
            )
        } else {
            format!(
                "searched {} combinations, {} feasible",
                self.evaluated,
                self.feasible_count()
            )
        }
    }
}

/// Ereignisse während der Suche, um Fortschritt live anzeigen zu können.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SearchEvent {
    /// Die Suche beginnt.
    Started {
        total_combinations: usize,
        limit: Option<usize>,
        objective: Objective,
    },
    /// Ein Kandidat ist machbar.
    CandidateAccepted {
        index: usize,
        rack: RackDimensions,
        total_racks: u64,
        total_pallets: u64,
        score: f64,
    },
    /// Ein Kandidat passt nicht in die Halle.
    CandidateRejected {
        index: usize,
        rack: RackDimensions,
        reason_code: String,
        reason_text: String,
    },
    /// Die Kandidatengrenze wurde erreicht.
    Truncated { evaluated: usize, total: usize },
    /// Suche abgeschlossen.
    Finished {
        evaluated: usize,
        feasible: usize,
        best: Option<CandidateConfiguration>,
    },
}

/// Vergleicht zwei Kandidaten: `Less` bedeutet "`a` steht vor `b`".
///
/// # Parameter
/// * `a`, `b` - Die Kandidaten
/// * `objective` - Zielgröße (absteigend)
/// * `tie_break` - Regel bei gleichem Zielwert
pub fn compare_candidates(
    a: &CandidateConfiguration,
    b: &CandidateConfiguration,
    objective: Objective,
    tie_break: TieBreak,
) -> Ordering {
    let primary = match objective {
        Objective::MaxRacks => b.layout.total_racks.cmp(&a.layout.total_racks),
        Objective::MaxVolume => b.layout.volume_utilized.total_cmp(&a.layout.volume_utilized),
        Objective::BestOccupancy => b.layout.storage_ratio.total_cmp(&a.layout.storage_ratio),
        Objective::Balanced => b.score.total_cmp(&a.score),
    };

    let secondary = match tie_break {
        TieBreak::MoreRacksThenSmallerFootprint => b
            .layout
            .total_racks
            .cmp(&a.layout.total_racks)
            .then_with(|| a.rack().footprint().total_cmp(&b.rack().footprint())),
        TieBreak::GridOrder => Ordering::Equal,
    };

    primary
        .then(secondary)
        .then_with(|| a.grid_index.cmp(&b.grid_index))
}

/// Sortiert Kandidaten absteigend nach der Zielgröße.
pub fn rank_candidates(
    mut candidates: Vec<CandidateConfiguration>,
    objective: Objective,
    tie_break: TieBreak,
) -> Vec<CandidateConfiguration> {
    candidates.sort_by(|a, b| compare_candidates(a, b, objective, tie_break));
    candidates
}

/// Hauptfunktion der Konfigurationssuche.
///
/// # Parameter
/// * `input` - Halle, Rasterbereiche und Gänge
/// * `config` - Zielgröße, Füllgrad, Gleichstandsregel und Grenzen
///
/// # Rückgabewert
/// `SearchResult` mit allen machbaren Kandidaten oder `SearchError`, wenn
/// ein Bereich ungültig ist bzw. kein Kandidat passt
pub fn search(input: &SearchInput, config: &SearchConfig) -> Result<SearchResult, SearchError> {
    search_with_progress(input, config, |_| {})
}

/// Suche mit Live-Progress Callback.
///
/// Ruft für jeden Rasterpunkt ein Callback auf (geeignet für SSE).
/// Hallenmaße, Gänge, Bereiche und Konfiguration werden in dieser
/// Reihenfolge geprüft, bevor der erste Kandidat ausgewertet wird.
pub fn search_with_progress(
    input: &SearchInput,
    config: &SearchConfig,
    mut on_event: impl FnMut(&SearchEvent),
) -> Result<SearchResult, SearchError> {
    let envelope = input
        .envelope
        .validated()
        .map_err(SearchError::InvalidDimensions)?;
    let constraints = input
        .constraints
        .validated()
        .map_err(SearchError::InvalidDimensions)?;
    let grid = CandidateGrid::new(&input.ranges)?;
    config.validate()?;

    let total_combinations = grid.total();
    let limit = config.max_candidates.unwrap_or(usize::MAX);
    on_event(&SearchEvent::Started {
        total_combinations,
        limit: config.max_candidates,
        objective: config.objective,
    });
    tracing::debug!(
        total_combinations,
        objective = %config.objective,
        "starting rack configuration search"
    );

    let mut candidates = Vec::new();
    let mut infeasible = 0usize;
    let mut evaluated = 0usize;

    for (index, rack) in grid.take(limit).enumerate() {
        evaluated += 1;
        match evaluate_rack(index, &rack, &envelope, &constraints, config) {
            CandidateOutcome::Feasible(candidate) => {
                tracing::trace!(index, total_racks = candidate.total_racks(), "candidate fits");
                on_event(&SearchEvent::CandidateAccepted {
                    index,
                    rack,
                    total_racks: candidate.total_racks(),
                    total_pallets: candidate.total_pallets,
                    score: candidate.score,
                });
                candidates.push(candidate);
            }
            CandidateOutcome::Infeasible(reason) => {
                tracing::trace!(index, reason = reason.code(), "candidate rejected");
                infeasible += 1;
                on_event(&SearchEvent::CandidateRejected {
                    index,
                    rack,
                    reason_code: reason.code().to_string(),
                    reason_text: reason.to_string(),
                });
            }
        }
    }

    if evaluated < total_combinations {
        on_event(&SearchEvent::Truncated {
            evaluated,
            total: total_combinations,
        });
    }

    let candidates = rank_candidates(candidates, config.objective, config.tie_break);
    on_event(&SearchEvent::Finished {
        evaluated,
        feasible: candidates.len(),
        best: candidates.first().copied(),
    });

    if candidates.is_empty() {
        return Err(SearchError::EmptyResult {
            evaluated,
            total: total_combinations,
        });
    }

    Ok(SearchResult {
        candidates,
        objective: config.objective,
        evaluated,
        total_combinations,
        infeasible,
    })
}
