//! # gs-data
//!
//! Loads labelled sparse datasets (`<label> <index>:<value> ...` per line)
//! into a [`gs_types::Problem`].

pub mod loaders;

pub use loaders::ProblemLoader;
