// Covenant - constitutional critique and revision for model answers
// Library exports

pub mod cli;
pub mod config;
pub mod constitution;
pub mod invoker;
pub mod logging;
pub mod principles;
pub mod providers;
pub mod telemetry;

pub use constitution::{
    CritiqueEngine, CritiqueOutcome, ModelInvocationError, ModelInvoker, RunError, RunEvent,
    RunTrail, TrailRecorder,
};
pub use principles::{default_registry, Principle, PrincipleRegistry};
