pub mod graph;
pub mod solve;
