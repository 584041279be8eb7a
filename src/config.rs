use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use crate::geometry::DEFAULT_MAX_PLACEMENTS;
use crate::optimizer::{ComplianceThresholds, Objective, ScoringPolicy, SearchConfig, TieBreak};

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(env_string)
    }

    /// Creates a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api: ApiConfig::from_lookup(&lookup),
            optimizer: OptimizerConfig::from_lookup(&lookup),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "RACK_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "RACK_PLANNER_API_PORT";

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let default_ip = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        let host_value = lookup(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (default_ip, Self::DEFAULT_HOST.to_string())
            }
        };

        let port = load_with_warning(
            &lookup,
            Self::PORT_VAR,
            Self::DEFAULT_PORT,
            |value: u16| value != 0,
            "must not be 0",
        );

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Configuration for the rack configuration search.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    search: SearchConfig,
    max_placements: usize,
}

impl OptimizerConfig {
    const OBJECTIVE_VAR: &'static str = "RACK_PLANNER_OBJECTIVE";
    const FILL_RATE_VAR: &'static str = "RACK_PLANNER_FILL_RATE";
    const MAX_CANDIDATES_VAR: &'static str = "RACK_PLANNER_MAX_CANDIDATES";
    const TIE_BREAK_VAR: &'static str = "RACK_PLANNER_TIE_BREAK";
    const STORAGE_WEIGHT_VAR: &'static str = "RACK_PLANNER_SCORE_STORAGE_WEIGHT";
    const VOLUME_WEIGHT_VAR: &'static str = "RACK_PLANNER_SCORE_VOLUME_WEIGHT";
    const RACK_WEIGHT_VAR: &'static str = "RACK_PLANNER_SCORE_RACK_WEIGHT";
    const RACK_NORMALIZATION_VAR: &'static str = "RACK_PLANNER_SCORE_RACK_NORMALIZATION";
    const FORKLIFT_AISLE_VAR: &'static str = "RACK_PLANNER_FORKLIFT_AISLE_MIN";
    const STANDARD_HEIGHT_VAR: &'static str = "RACK_PLANNER_STANDARD_HEIGHT_MAX";
    const MAX_PLACEMENTS_VAR: &'static str = "RACK_PLANNER_MAX_PLACEMENTS";

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let objective = load_with_warning(
            lookup,
            Self::OBJECTIVE_VAR,
            Objective::default(),
            |_| true,
            "",
        );

        let fill_rate = load_with_warning(
            lookup,
            Self::FILL_RATE_VAR,
            SearchConfig::DEFAULT_FILL_RATE,
            |value: f64| value > 0.0 && value <= 1.0,
            "must be within (0, 1]",
        );

        let max_candidates = load_with_warning(
            lookup,
            Self::MAX_CANDIDATES_VAR,
            SearchConfig::DEFAULT_MAX_CANDIDATES,
            |value: usize| value >= 1,
            "must be at least 1",
        );

        let tie_break = load_with_warning(
            lookup,
            Self::TIE_BREAK_VAR,
            TieBreak::default(),
            |_| true,
            "",
        );

        let scoring = ScoringPolicy {
            storage_weight: load_with_warning(
                lookup,
                Self::STORAGE_WEIGHT_VAR,
                ScoringPolicy::DEFAULT_STORAGE_WEIGHT,
                is_weight,
                "must be a non-negative number",
            ),
            volume_weight: load_with_warning(
                lookup,
                Self::VOLUME_WEIGHT_VAR,
                ScoringPolicy::DEFAULT_VOLUME_WEIGHT,
                is_weight,
                "must be a non-negative number",
            ),
            rack_weight: load_with_warning(
                lookup,
                Self::RACK_WEIGHT_VAR,
                ScoringPolicy::DEFAULT_RACK_WEIGHT,
                is_weight,
                "must be a non-negative number",
            ),
            rack_normalization: load_with_warning(
                lookup,
                Self::RACK_NORMALIZATION_VAR,
                ScoringPolicy::DEFAULT_RACK_NORMALIZATION,
                |value: f64| value.is_finite() && value > 0.0,
                "must be greater than 0",
            ),
        };
        if scoring != ScoringPolicy::default() {
            tracing::info!(
                "⚠️ Custom score weights in use (storage {}, volume {}, racks {}, normalization {})",
                scoring.storage_weight,
                scoring.volume_weight,
                scoring.rack_weight,
                scoring.rack_normalization
            );
        }

        let compliance = ComplianceThresholds {
            forklift_aisle_min: load_with_warning(
                lookup,
                Self::FORKLIFT_AISLE_VAR,
                ComplianceThresholds::DEFAULT_FORKLIFT_AISLE_MIN,
                is_weight,
                "must be a non-negative number",
            ),
            standard_height_max: load_with_warning(
                lookup,
                Self::STANDARD_HEIGHT_VAR,
                ComplianceThresholds::DEFAULT_STANDARD_HEIGHT_MAX,
                |value: f64| value.is_finite() && value > 0.0,
                "must be greater than 0",
            ),
        };

        let max_placements = load_with_warning(
            lookup,
            Self::MAX_PLACEMENTS_VAR,
            DEFAULT_MAX_PLACEMENTS,
            |value: usize| value >= 1,
            "must be at least 1",
        );

        let search = SearchConfig::builder()
            .objective(objective)
            .fill_rate(fill_rate)
            .max_candidates(Some(max_candidates))
            .tie_break(tie_break)
            .scoring(scoring)
            .compliance(compliance)
            .build();

        Self {
            search,
            max_placements,
        }
    }

    /// Returns the configured SearchConfig.
    pub fn search_config(&self) -> SearchConfig {
        self.search
    }

    /// Upper bound on racks drawn into one schematic.
    pub fn max_placements(&self) -> usize {
        self.max_placements
    }
}

fn is_weight(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            tracing::warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name,
                err
            );
            None
        }
    }
}

fn load_with_warning<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    default: T,
    validator: impl Fn(T) -> bool,
    invalid_hint: &str,
) -> T
where
    T: FromStr + Copy + Display,
    T::Err: Display,
{
    match lookup(var_name) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) if validator(value) => value,
            Ok(_) => {
                tracing::warn!(
                    "⚠️ {} contains invalid value '{}': {}. Using {}.",
                    var_name,
                    raw,
                    invalid_hint,
                    default
                );
                default
            }
            Err(err) => {
                tracing::warn!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    var_name,
                    raw,
                    err,
                    default
                );
                default
            }
        },
        None => default,
    }
}
