use log::{error, info};

use crate::models::{ConflictReport, OptimizationResult};
use crate::orchestrator::RunSetOutcome;
use crate::pso::fitness::FitnessCalculator;

impl OptimizationResult {
    /// Payload for a request that was valid but aborted by an internal fault.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        error!("Optimization failed: {}", message);
        Self {
            success: false,
            fitness: f64::INFINITY,
            schedule: Vec::new(),
            conflicts: ConflictReport::default(),
            all_best_fitness: Vec::new(),
            cancelled: false,
            message: Some(message),
        }
    }
}

/// Packages the winning timetable with its full conflict breakdown.
pub fn assemble(calculator: &FitnessCalculator, outcome: RunSetOutcome) -> OptimizationResult {
    let RunSetOutcome {
        best,
        all_best_fitness,
        cancelled,
        ..
    } = outcome;

    let Some((run, best)) = best else {
        return OptimizationResult::failure("no run produced a timetable");
    };

    let conflicts = calculator.evaluate(&best.timetable);
    let fitness = calculator.fitness(&conflicts);
    debug_assert_eq!(fitness, best.fitness, "report disagrees with search score");

    info!(
        "Best timetable from run {} (iteration {}): fitness {}, {} hard conflicts, {} preference conflicts",
        run + 1,
        best.iteration,
        fitness,
        conflicts.hard_total,
        conflicts.preference_conflicts.len()
    );

    OptimizationResult {
        success: true,
        fitness,
        schedule: best.timetable,
        conflicts,
        all_best_fitness,
        cancelled,
        message: cancelled.then(|| "optimization stopped early".to_string()),
    }
}
