pub mod assistant;
pub mod tier;

pub use assistant::*;
pub use tier::*;
