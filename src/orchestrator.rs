//! Multi-run driver: runs independent swarms, reports progress after every
//! iteration and honours stop requests at iteration boundaries.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use crate::catalog::Catalog;
use crate::config::OptimizationParams;
use crate::models::OptimizationProgress;
use crate::pso::encoding::Encoding;
use crate::pso::fitness::FitnessCalculator;
use crate::pso::optimizer::Pso;
use crate::pso::swarm::GlobalBest;

pub type ProgressSender = broadcast::Sender<OptimizationProgress>;

/// Cooperative stop signal shared between the caller and a running request.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Whether both handles control the same request.
    pub fn same_as(&self, other: &StopFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Everything a request needs from its environment.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub progress: Option<ProgressSender>,
    pub stop: StopFlag,
}

impl RunContext {
    pub fn new(progress: Option<ProgressSender>) -> Self {
        Self {
            progress,
            stop: StopFlag::new(),
        }
    }
}

/// Orchestrator bookkeeping; progress events are read-only snapshots of it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub run: usize,
    pub total_runs: usize,
    pub iteration: usize,
    pub elapsed: Duration,
    pub best_fitness: f64,
    pub all_best_fitness: Vec<f64>,
    pub finished: bool,
}

impl RunState {
    fn new(total_runs: usize) -> Self {
        Self {
            run: 0,
            total_runs,
            iteration: 0,
            elapsed: Duration::ZERO,
            best_fitness: f64::INFINITY,
            all_best_fitness: Vec::with_capacity(total_runs),
            finished: false,
        }
    }

    pub fn snapshot(&self) -> OptimizationProgress {
        OptimizationProgress {
            iteration: self.iteration,
            best_fitness: self.best_fitness,
            current_run: self.run,
            total_runs: self.total_runs,
            all_best_fitness: self.all_best_fitness.clone(),
            elapsed_time: self.elapsed.into(),
            is_finished: self.finished,
        }
    }
}

/// Final state handed to the result assembler.
#[derive(Debug, Clone)]
pub struct RunSetOutcome {
    /// Winning run index and its global best.
    pub best: Option<(usize, GlobalBest)>,
    pub all_best_fitness: Vec<f64>,
    pub cancelled: bool,
    pub elapsed: Duration,
}

pub struct Orchestrator<'c> {
    catalog: &'c Catalog,
    params: &'c OptimizationParams,
    calculator: FitnessCalculator,
    ctx: RunContext,
}

impl<'c> Orchestrator<'c> {
    pub fn new(catalog: &'c Catalog, params: &'c OptimizationParams, ctx: RunContext) -> Self {
        Self {
            catalog,
            params,
            calculator: FitnessCalculator::new(
                catalog.lecturers(),
                params.weights,
                catalog.sections().len(),
            ),
            ctx,
        }
    }

    pub fn calculator(&self) -> &FitnessCalculator {
        &self.calculator
    }

    /// Runs `num_runs` independent swarms. Each run is seeded from `rng`.
    pub fn run<R: Rng>(&self, rng: &mut R) -> RunSetOutcome {
        let params = self.params;
        let start = Instant::now();
        let encoding = Encoding::new(self.catalog);
        let mut state = RunState::new(params.num_runs);
        let mut overall: Option<(usize, GlobalBest)> = None;
        let mut cancelled = false;

        for run in 0..params.num_runs {
            let mut run_rng = StdRng::seed_from_u64(rng.random());
            let mut pso = Pso::new(&encoding, &self.calculator, params, &mut run_rng);

            info!(
                "Starting PSO run {}/{}: swarm size {}, max iterations {}",
                run + 1,
                params.num_runs,
                params.swarm_size,
                params.max_iterations
            );
            state.run = run;

            loop {
                let summary = pso.step();

                // Stop requests are only observed between iterations.
                cancelled = self.ctx.stop.is_stopped();
                let perfect = params.stop_at_zero && summary.best_fitness == 0.0;
                let run_over =
                    cancelled || perfect || summary.iteration >= params.max_iterations;

                state.iteration = summary.iteration;
                state.best_fitness = summary.best_fitness;
                state.elapsed = start.elapsed();
                state.finished = cancelled || (run_over && run + 1 == params.num_runs);
                // The closing snapshot of a run already counts that run.
                if run_over {
                    state.all_best_fitness.push(summary.best_fitness);
                }
                self.emit(&state);

                if perfect && !cancelled {
                    info!("Conflict-free timetable found at iteration {}", summary.iteration);
                }
                if run_over {
                    break;
                }
            }

            let best = pso.into_best();
            info!("Run {} finished with best fitness {}", run + 1, best.fitness);

            let better = match &overall {
                Some((_, current)) => best.fitness < current.fitness,
                None => true,
            };
            if better {
                overall = Some((run, best));
            }

            if cancelled {
                warn!("Optimization stopped during run {} at iteration {}", run + 1, state.iteration);
                break;
            }
        }

        RunSetOutcome {
            best: overall,
            all_best_fitness: state.all_best_fitness,
            cancelled,
            elapsed: start.elapsed(),
        }
    }

    /// Non-blocking push; lagging receivers lose the oldest snapshots.
    fn emit(&self, state: &RunState) {
        if let Some(tx) = &self.ctx.progress {
            let _ = tx.send(state.snapshot());
        }
    }
}
