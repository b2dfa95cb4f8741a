pub mod variable;
pub mod factor;
pub mod problem;
pub mod graph;
pub mod separator;
pub mod buckets;
