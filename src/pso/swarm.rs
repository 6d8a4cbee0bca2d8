use std::sync::{Mutex, PoisonError};

use super::particle::Particle;
use crate::models::Timetable;

/// Best position found so far in one run, with the iteration and particle
/// that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalBest {
    pub position: Vec<f64>,
    pub timetable: Timetable,
    pub fitness: f64,
    pub iteration: usize,
    pub particle: usize,
}

impl GlobalBest {
    fn empty() -> Self {
        Self {
            position: Vec::new(),
            timetable: Vec::new(),
            fitness: f64::INFINITY,
            iteration: 0,
            particle: usize::MAX,
        }
    }
}

/// Global best shared by the worker threads of one iteration.
///
/// Candidates are ordered by `(fitness, iteration, particle)`, so the winner
/// does not depend on which thread reaches the lock first.
#[derive(Debug)]
pub struct SharedBest {
    inner: Mutex<GlobalBest>,
}

impl Default for SharedBest {
    fn default() -> Self {
        Self {
            inner: Mutex::new(GlobalBest::empty()),
        }
    }
}

impl SharedBest {
    pub fn try_update(&self, candidate: &Particle, iteration: usize, particle: usize) -> bool {
        let mut best = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if (candidate.fitness, iteration, particle) >= (best.fitness, best.iteration, best.particle) {
            return false;
        }
        best.fitness = candidate.fitness;
        best.iteration = iteration;
        best.particle = particle;
        best.position.clone_from(&candidate.position);
        best.timetable.clone_from(&candidate.timetable);
        true
    }

    pub fn fitness(&self) -> f64 {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).fitness
    }

    pub fn position(&self) -> Vec<f64> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .position
            .clone()
    }

    pub fn snapshot(&self) -> GlobalBest {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn into_inner(self) -> GlobalBest {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
pub struct Swarm {
    pub particles: Vec<Particle>,
    pub best: SharedBest,
}
