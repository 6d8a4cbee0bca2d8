//! Course timetabling with particle swarm optimization.
//!
//! A request carries a course catalog and PSO parameters. The engine runs
//! several independent swarms, streams progress snapshots over a broadcast
//! channel, honours cooperative stop requests and returns the lowest-fitness
//! timetable with its conflict breakdown.

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod pso;
pub mod result;
pub mod service;
pub mod tune;
