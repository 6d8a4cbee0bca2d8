//! Coordinate-wise parameter search.
//!
//! Parameters are tuned one at a time in a fixed order. While one is swept,
//! the others stay at the best values found so far.

use log::info;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::OptimizationParams;
use crate::error::ValidationError;
use crate::orchestrator::RunContext;
use crate::service::run_prepared;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sweep<T> {
    pub start: T,
    pub end: T,
    pub step: T,
}

impl Sweep<usize> {
    fn values(&self, field: &'static str) -> Result<Vec<f64>, ValidationError> {
        if self.start == 0 || self.step == 0 || self.start > self.end {
            return Err(ValidationError::parameter(
                field,
                "sweep needs 0 < start <= end and a positive step",
            ));
        }
        Ok((self.start..=self.end)
            .step_by(self.step)
            .map(|v| v as f64)
            .collect())
    }
}

impl Sweep<f64> {
    fn values(&self, field: &'static str) -> Result<Vec<f64>, ValidationError> {
        let finite = self.start.is_finite() && self.end.is_finite() && self.step.is_finite();
        if !finite || self.step <= 0.0 || self.start > self.end {
            return Err(ValidationError::parameter(
                field,
                "sweep needs finite start <= end and a positive step",
            ));
        }
        // Index-based to avoid accumulating rounding error.
        let count = ((self.end - self.start) / self.step + 1e-9).floor() as usize + 1;
        Ok((0..count).map(|k| self.start + k as f64 * self.step).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub swarm_size: Sweep<usize>,
    pub max_iterations: Sweep<usize>,
    pub inertia_weight: Sweep<f64>,
    pub cognitive_weight: Sweep<f64>,
    pub social_weight: Sweep<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub parameter: String,
    pub value: f64,
    pub params: OptimizationParams,
    pub fitness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneReport {
    pub best_params: OptimizationParams,
    /// Fitness of a final run with `best_params`.
    pub fitness: f64,
    pub trials: Vec<Trial>,
}

#[derive(Debug, Clone, Copy)]
enum Param {
    SwarmSize,
    MaxIterations,
    Inertia,
    Cognitive,
    Social,
}

impl Param {
    const ORDER: [Param; 5] = [
        Param::SwarmSize,
        Param::MaxIterations,
        Param::Inertia,
        Param::Cognitive,
        Param::Social,
    ];

    fn name(self) -> &'static str {
        match self {
            Param::SwarmSize => "swarm_size",
            Param::MaxIterations => "max_iterations",
            Param::Inertia => "inertia_weight",
            Param::Cognitive => "cognitive_weight",
            Param::Social => "social_weight",
        }
    }

    fn apply(self, params: &mut OptimizationParams, value: f64) {
        match self {
            Param::SwarmSize => params.swarm_size = value as usize,
            Param::MaxIterations => params.max_iterations = value as usize,
            Param::Inertia => params.inertia_weight = value,
            Param::Cognitive => params.cognitive_weight = value,
            Param::Social => params.social_weight = value,
        }
    }

    fn values(self, range: &ParamRange) -> Result<Vec<f64>, ValidationError> {
        match self {
            Param::SwarmSize => range.swarm_size.values(self.name()),
            Param::MaxIterations => range.max_iterations.values(self.name()),
            Param::Inertia => range.inertia_weight.values(self.name()),
            Param::Cognitive => range.cognitive_weight.values(self.name()),
            Param::Social => range.social_weight.values(self.name()),
        }
    }
}

/// Sweeps every parameter of `range` in turn. `base` supplies the values not
/// covered by the range (runs, weights, seed). Each trial is a full request,
/// so a fixed seed makes trials directly comparable.
pub fn tune(
    catalog: &Catalog,
    base: &OptimizationParams,
    range: &ParamRange,
) -> Result<TuneReport, ValidationError> {
    base.validate()?;
    let sweeps = Param::ORDER
        .iter()
        .map(|&p| p.values(range).map(|v| (p, v)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut best_params = base.clone();
    for (param, values) in &sweeps {
        param.apply(&mut best_params, values[0]);
    }

    let mut trials = Vec::new();
    for (param, values) in sweeps {
        info!("Tuning {} over {} values", param.name(), values.len());

        let mut best_value = values[0];
        let mut best_fitness = f64::INFINITY;
        for value in values {
            let mut candidate = best_params.clone();
            param.apply(&mut candidate, value);

            let fitness = run_prepared(catalog, &candidate, RunContext::default()).fitness;
            if fitness < best_fitness {
                best_fitness = fitness;
                best_value = value;
            }
            trials.push(Trial {
                parameter: param.name().to_string(),
                value,
                params: candidate,
                fitness,
            });
        }

        param.apply(&mut best_params, best_value);
        info!("Best {}: {} (fitness {})", param.name(), best_value, best_fitness);
    }

    let fitness = run_prepared(catalog, &best_params, RunContext::default()).fitness;
    info!("Tuning finished with fitness {}", fitness);

    Ok(TuneReport {
        best_params,
        fitness,
        trials,
    })
}
