pub mod plan;
pub mod stats;
