pub mod grid;
pub mod params;
pub mod problem;
pub mod learner;
pub mod errors;

pub use grid::*;
pub use params::*;
pub use problem::*;
pub use learner::*;
pub use errors::*;
