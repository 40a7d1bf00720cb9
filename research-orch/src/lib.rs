#![deny(missing_docs)]
//! Planning, pooled execution, synthesis, and the diffusion-style
//! alternative for the deep-research agent engine's "deep" mode.
//!
//! [`Orchestrator`] ties [`Planner`], [`WorkerPool`], and [`Synthesizer`]
//! together into the plan→pool→synthesize flow. [`DiffusionSupervisor`] is
//! a separate, pluggable strategy: an iterative draft-and-refine loop
//! instead of an up-front decomposition.

mod diffusion;
mod orchestrator;
mod planner;
mod pool;
mod synthesizer;
mod util;

pub use diffusion::{DiffusionConfig, DiffusionOutcome, DiffusionSupervisor};
pub use orchestrator::{DeepResearchOutcome, Orchestrator};
pub use planner::{worker_count_for_score, Planner, Task};
pub use pool::WorkerPool;
pub use synthesizer::Synthesizer;
