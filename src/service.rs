//! Runs an optimization request as one background task.

use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::catalog::Catalog;
use crate::config::OptimizationParams;
use crate::error::OptimizeError;
use crate::models::{CatalogInput, OptimizationProgress, OptimizationResult};
use crate::orchestrator::{Orchestrator, RunContext, StopFlag};
use crate::result::assemble;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub params: OptimizationParams,
    #[serde(flatten)]
    pub catalog: CatalogInput,
}

/// Validates a request and turns it into a catalog ready for the engine.
pub fn prepare(request: OptimizationRequest) -> Result<(Catalog, OptimizationParams), OptimizeError> {
    let OptimizationRequest { params, catalog } = request;
    params.validate()?;
    let catalog = Catalog::new(catalog)?;
    Ok((catalog, params))
}

/// Runs a prepared request to completion on the current thread.
pub fn run_prepared(catalog: &Catalog, params: &OptimizationParams, ctx: RunContext) -> OptimizationResult {
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::random()),
    };
    let orchestrator = Orchestrator::new(catalog, params, ctx);
    let outcome = orchestrator.run(&mut rng);
    assemble(orchestrator.calculator(), outcome)
}

/// Synchronous entry point: validate, run, assemble.
pub fn optimize(request: OptimizationRequest, ctx: RunContext) -> Result<OptimizationResult, OptimizeError> {
    let (catalog, params) = prepare(request)?;
    Ok(run_prepared(&catalog, &params, ctx))
}

/// A running optimization request.
pub struct OptimizationHandle {
    ctx: RunContext,
    task: JoinHandle<OptimizationResult>,
}

impl OptimizationHandle {
    /// Validates `request` and spawns it on the blocking pool. Invalid
    /// requests are rejected before anything is spawned.
    ///
    /// Subscribe to `ctx.progress` before calling this to observe every
    /// snapshot.
    pub fn start(request: OptimizationRequest, ctx: RunContext) -> Result<Self, OptimizeError> {
        let (catalog, params) = prepare(request)?;
        info!(
            "Accepted optimization request: {} sections, {} slots, {} rooms, {} runs",
            catalog.sections().len(),
            catalog.time_slots().len(),
            catalog.rooms().len(),
            params.num_runs
        );

        let task_ctx = ctx.clone();
        let task = tokio::task::spawn_blocking(move || run_prepared(&catalog, &params, task_ctx));
        Ok(Self { ctx, task })
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.ctx.stop.clone()
    }

    /// Requests a cooperative stop; acknowledged by the next progress event.
    pub fn stop(&self) {
        self.ctx.stop.stop();
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<OptimizationProgress>> {
        self.ctx.progress.as_ref().map(|tx| tx.subscribe())
    }

    /// Waits for the final result. A fault inside the task becomes a
    /// `success = false` result instead of propagating.
    pub async fn join(self) -> OptimizationResult {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                let payload = e.into_panic();
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Optimization task panicked: {}", reason);
                OptimizationResult::failure(format!("internal error: {reason}"))
            }
            Err(e) => OptimizationResult::failure(format!("optimization task was cancelled: {e}")),
        }
    }
}
