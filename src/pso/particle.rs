use rand::rngs::StdRng;
use rand::Rng;

use super::encoding::Encoding;
use super::fitness::FitnessCalculator;
use crate::models::Timetable;

/// Initial velocity is drawn from `[-1, 1) * VELOCITY_SCALE * range`.
const VELOCITY_SCALE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub timetable: Timetable,
    pub fitness: f64,
    pub pbest_position: Vec<f64>,
    pub pbest_fitness: f64,
    rng: StdRng,
}

impl Particle {
    /// Random particle inside the box `[0, bounds[d]]`. The particle keeps
    /// `rng` for its own later draws.
    pub fn new(bounds: &[f64], mut rng: StdRng) -> Self {
        let position: Vec<f64> = bounds.iter().map(|&hi| rng.random::<f64>() * hi).collect();
        let velocity: Vec<f64> = bounds
            .iter()
            .map(|&hi| (rng.random::<f64>() * 2.0 - 1.0) * VELOCITY_SCALE * hi)
            .collect();

        Particle {
            pbest_position: position.clone(),
            position,
            velocity,
            timetable: Vec::new(),
            fitness: f64::INFINITY,
            pbest_fitness: f64::INFINITY,
            rng,
        }
    }

    /// Standard inertia-weight velocity update with fresh `r1, r2` per dimension.
    pub fn update_velocity(
        &mut self,
        gbest: &[f64],
        inertia_weight: f64,
        cognitive_weight: f64,
        social_weight: f64,
        velocity_clamp: Option<f64>,
    ) {
        for i in 0..self.velocity.len() {
            let r1: f64 = self.rng.random();
            let r2: f64 = self.rng.random();

            let cognitive = cognitive_weight * r1 * (self.pbest_position[i] - self.position[i]);
            let social = social_weight * r2 * (gbest[i] - self.position[i]);

            let mut v = inertia_weight * self.velocity[i] + cognitive + social;
            if let Some(v_max) = velocity_clamp {
                v = v.clamp(-v_max, v_max);
            }
            self.velocity[i] = v;
        }
    }

    /// Moves the particle and clamps it into `[0, bounds[d]]`.
    pub fn update_position(&mut self, bounds: &[f64]) {
        for ((x, v), &hi) in self.position.iter_mut().zip(&self.velocity).zip(bounds) {
            let next = *x + v;
            *x = if next.is_nan() { 0.0 } else { next.clamp(0.0, hi) };
        }
    }

    /// Decodes and scores the current position.
    pub fn evaluate(&mut self, encoding: &Encoding<'_>, calculator: &FitnessCalculator) -> f64 {
        self.timetable = encoding.decode(&self.position);
        self.fitness = calculator.score(&self.timetable);
        self.fitness
    }

    /// Returns `true` when the current fitness became the new personal best.
    pub fn update_personal_best(&mut self) -> bool {
        if self.fitness < self.pbest_fitness {
            self.pbest_fitness = self.fitness;
            self.pbest_position.clone_from(&self.position);
            true
        } else {
            false
        }
    }
}
