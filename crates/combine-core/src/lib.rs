// Library root: derived-metrics engine for athletic testing rosters.
//
// `pipeline::Engine::process` (or `pipeline::process_data`) is the entry
// point; the remaining modules are its stages and are public so each can be
// used and tested on its own.

pub mod analytics;
pub mod athlete;
pub mod audit;
pub mod config;
pub mod grading;
pub mod history;
pub mod parse;
pub mod physics;
pub mod pipeline;
pub mod roster;
pub mod standards;
pub mod stats;

pub use analytics::DerivedAthlete;
pub use athlete::{AthleteRecord, RawAthlete};
pub use config::{AuditLimits, Constants, EngineConfig, ProcessOptions};
pub use pipeline::{process_data, DerivedDataset, Engine, RawDataset};
pub use standards::{Metric, Registry, Sport};
