use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::encoding::Encoding;
use super::fitness::FitnessCalculator;
use super::particle::Particle;
use super::swarm::{GlobalBest, Swarm};
use crate::config::OptimizationParams;

/// Outcome of one swarm iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationSummary {
    /// 1-based; iteration 0 is the initial evaluation.
    pub iteration: usize,
    pub best_fitness: f64,
    pub improved: bool,
}

/// One PSO run over a freshly initialized swarm.
pub struct Pso<'a> {
    encoding: &'a Encoding<'a>,
    calculator: &'a FitnessCalculator,
    params: &'a OptimizationParams,
    swarm: Swarm,
    iteration: usize,
}

impl<'a> Pso<'a> {
    /// Creates and evaluates the initial swarm. Each particle gets its own
    /// generator seeded from `rng`.
    pub fn new<R: Rng>(
        encoding: &'a Encoding<'a>,
        calculator: &'a FitnessCalculator,
        params: &'a OptimizationParams,
        rng: &mut R,
    ) -> Self {
        let bounds = encoding.bounds();
        let particles = (0..params.swarm_size)
            .map(|_| Particle::new(bounds, StdRng::seed_from_u64(rng.random())))
            .collect();

        let mut pso = Pso {
            encoding,
            calculator,
            params,
            swarm: Swarm {
                particles,
                best: Default::default(),
            },
            iteration: 0,
        };
        pso.initialize_swarm();
        pso
    }

    fn initialize_swarm(&mut self) {
        let encoding = self.encoding;
        let calculator = self.calculator;
        let Swarm { particles, best } = &mut self.swarm;
        let best = &*best;

        particles.par_iter_mut().enumerate().for_each(|(idx, particle)| {
            particle.evaluate(encoding, calculator);
            particle.update_personal_best();
            best.try_update(particle, 0, idx);
        });

        debug!(
            "Swarm initialized with {} particles, {} dimensions, best fitness {}",
            particles.len(),
            encoding.dimension(),
            best.fitness()
        );
    }

    /// Runs one iteration: velocity and position update, decode, evaluate,
    /// then personal and global best updates.
    pub fn step(&mut self) -> IterationSummary {
        self.iteration += 1;
        let iteration = self.iteration;
        let encoding = self.encoding;
        let calculator = self.calculator;
        let params = self.params;

        let Swarm { particles, best } = &mut self.swarm;
        let best = &*best;
        let gbest = best.position();
        let before = best.fitness();

        particles.par_iter_mut().enumerate().for_each(|(idx, particle)| {
            particle.update_velocity(
                &gbest,
                params.inertia_weight,
                params.cognitive_weight,
                params.social_weight,
                params.velocity_clamp,
            );
            particle.update_position(encoding.bounds());
            particle.evaluate(encoding, calculator);
            particle.update_personal_best();
            best.try_update(particle, iteration, idx);
        });

        let best_fitness = best.fitness();
        let improved = best_fitness < before;
        if improved {
            debug!("Iteration {}: global best {} -> {}", iteration, before, best_fitness);
        }

        IterationSummary {
            iteration,
            best_fitness,
            improved,
        }
    }

    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn best_fitness(&self) -> f64 {
        self.swarm.best.fitness()
    }

    pub fn best(&self) -> GlobalBest {
        self.swarm.best.snapshot()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.swarm.particles
    }

    pub fn into_best(self) -> GlobalBest {
        self.swarm.best.into_inner()
    }
}
