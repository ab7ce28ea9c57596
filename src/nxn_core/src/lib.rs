#![warn(clippy::pedantic)]
#![allow(clippy::similar_names, clippy::too_many_lines)]

pub mod alg;
pub mod block;
pub mod config;
pub mod cube;
pub mod geometry;
pub mod operator;
pub mod reducer;
pub mod scramble;
pub mod solver;
pub mod solver3x3;
pub mod walking;

pub use alg::{Alg, Move};
pub use config::{ParityAlgorithm, SolverConfig};
pub use cube::Cube;
pub use operator::Operator;
pub use solver::{SolveError, SolveStep, Solver, SolverResults};

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}
