pub mod graph;
pub mod levels;
pub mod tree;

pub use graph::KinshipGraph;
pub use levels::LevelAssigner;
pub use tree::{AssemblyOptions, TreeAssembler, UnknownDatePlacement};
