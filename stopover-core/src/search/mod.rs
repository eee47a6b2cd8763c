//! Label-setting search: state arena, Pareto dominance tree, remaining-cost
//! heuristics and the expansion engine.

pub mod dominance;
pub mod engine;
pub mod heuristic;
pub mod label;

pub use dominance::{PathTree, better_or_equal};
pub use engine::{SearchEngine, SearchOutcome};
pub use heuristic::RemainingCost;
pub use label::{Label, LabelArena, LabelId, Path, PathState};
