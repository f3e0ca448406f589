//! Business logic services

pub mod emitter;
pub mod geo;
pub mod orchestrator;
pub mod pipeline;
pub mod problem;
pub mod reallocation;
pub mod vrp;
