//! Particle swarm search over encoded timetables.

pub mod encoding;
pub mod fitness;
pub mod optimizer;
pub mod particle;
pub mod swarm;
