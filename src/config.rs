use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::ValidationError;

/// Penalty weights for the two constraint classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub hard: f64,
    pub preference: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            hard: 100.0,
            preference: 1.0,
        }
    }
}

impl FitnessWeights {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.hard.is_finite() || !self.preference.is_finite() {
            return Err(ValidationError::parameter("weights", "must be finite"));
        }
        if self.preference < 0.0 {
            return Err(ValidationError::parameter(
                "weights.preference",
                "must not be negative",
            ));
        }
        if self.hard <= self.preference {
            return Err(ValidationError::parameter(
                "weights.hard",
                format!(
                    "must exceed the preference weight ({} <= {})",
                    self.hard, self.preference
                ),
            ));
        }
        Ok(())
    }
}

fn default_num_runs() -> usize {
    1
}

/// Parameters of one optimization request.
///
/// ```
/// use schedule_optimizer::config::OptimizationParams;
///
/// let params = OptimizationParams::default()
///     .with_swarm_size(30)
///     .with_max_iterations(200)
///     .with_num_runs(3)
///     .with_seed(7);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationParams {
    pub swarm_size: usize,
    pub max_iterations: usize,
    pub cognitive_weight: f64,
    pub social_weight: f64,
    pub inertia_weight: f64,
    #[serde(default = "default_num_runs")]
    pub num_runs: usize,
    /// Upper bound on `|velocity|` per dimension. `None` leaves velocity unbounded.
    #[serde(default)]
    pub velocity_clamp: Option<f64>,
    /// End a run as soon as a conflict-free timetable is found.
    #[serde(default)]
    pub stop_at_zero: bool,
    /// Seed for the request generator. `None` seeds from system entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub weights: FitnessWeights,
}

impl Default for OptimizationParams {
    fn default() -> Self {
        Self {
            swarm_size: 50,
            max_iterations: 500,
            cognitive_weight: 1.5,
            social_weight: 1.5,
            inertia_weight: 0.7,
            num_runs: 1,
            velocity_clamp: None,
            stop_at_zero: false,
            seed: None,
            weights: FitnessWeights::default(),
        }
    }
}

impl OptimizationParams {
    pub fn with_swarm_size(mut self, n: usize) -> Self {
        self.swarm_size = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_num_runs(mut self, n: usize) -> Self {
        self.num_runs = n;
        self
    }

    pub fn with_coefficients(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia_weight = inertia;
        self.cognitive_weight = cognitive;
        self.social_weight = social;
        self
    }

    pub fn with_velocity_clamp(mut self, v_max: f64) -> Self {
        self.velocity_clamp = Some(v_max);
        self
    }

    pub fn with_stop_at_zero(mut self, stop: bool) -> Self {
        self.stop_at_zero = stop;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.swarm_size == 0 {
            return Err(ValidationError::parameter("swarm_size", "must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(ValidationError::parameter(
                "max_iterations",
                "must be positive",
            ));
        }
        if self.num_runs == 0 {
            return Err(ValidationError::parameter("num_runs", "must be positive"));
        }
        for (field, value) in [
            ("cognitive_weight", self.cognitive_weight),
            ("social_weight", self.social_weight),
            ("inertia_weight", self.inertia_weight),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::parameter(field, "must be finite"));
            }
        }
        if let Some(v_max) = self.velocity_clamp {
            if !(v_max.is_finite() && v_max > 0.0) {
                return Err(ValidationError::parameter(
                    "velocity_clamp",
                    format!("must be positive and finite, got {v_max}"),
                ));
            }
        }
        self.weights.validate()
    }
}

/// Process-level settings for the HTTP front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub allowed_origin: String,
    pub progress_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            allowed_origin: "http://localhost:3000".to_string(),
            progress_capacity: 1024,
        }
    }
}

impl ServerConfig {
    pub const BIND_ADDR_VAR: &'static str = "SCHEDULER_BIND_ADDR";
    pub const ALLOWED_ORIGIN_VAR: &'static str = "SCHEDULER_ALLOWED_ORIGIN";
    pub const PROGRESS_CAPACITY_VAR: &'static str = "SCHEDULER_PROGRESS_CAPACITY";

    /// Reads the environment, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup(Self::BIND_ADDR_VAR) {
            config.bind_addr = addr.parse().map_err(|_| {
                ValidationError::parameter(Self::BIND_ADDR_VAR, format!("`{addr}` is not a socket address"))
            })?;
        }
        if let Some(origin) = lookup(Self::ALLOWED_ORIGIN_VAR) {
            config.allowed_origin = origin;
        }
        if let Some(capacity) = lookup(Self::PROGRESS_CAPACITY_VAR) {
            config.progress_capacity = match capacity.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ValidationError::parameter(
                        Self::PROGRESS_CAPACITY_VAR,
                        format!("`{capacity}` is not a positive integer"),
                    ))
                }
            };
        }

        Ok(config)
    }
}
