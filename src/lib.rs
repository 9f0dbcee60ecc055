//! Multi-head ordinal text scoring for equipment anomaly reports,
//! backed by a fine-tuned ONNX transformer.
//!
//! One forward pass produces three ordinal scores (reliability /
//! integrity, availability, process safety, each 0-5) and their sum,
//! the criticality. The crate ships the scorer itself, an HTTP
//! serving layer and spreadsheet ingestion tooling around it.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use criticore::{Scorer, BuiltinModel};
//!
//! let scorer = Scorer::builder()
//!     .with_model(BuiltinModel::CamembertCriticality)?
//!     .build()?;
//!
//! let scores = scorer.predict("fuite d'huile importante sur la pompe P-101")?;
//! println!(
//!     "criticité {} (FI {} / D {} / PS {})",
//!     scores.criticite,
//!     scores.fiabilite_integrite,
//!     scores.disponibilite,
//!     scores.process_safety,
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The scorer is thread-safe and is meant to be built once and shared
//! across request handlers using `Arc`:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use criticore::{Scorer, BuiltinModel};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let scorer = Arc::new(
//!     Scorer::builder()
//!         .with_model(BuiltinModel::CamembertCriticality)?
//!         .build()?,
//! );
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let scorer = Arc::clone(&scorer);
//!     handles.push(thread::spawn(move || {
//!         scorer.predict("vibration anormale du moteur").unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod forward;
pub mod model_manager;
pub mod models;
mod runtime;
pub mod scorer;
pub mod server;
pub mod settings;
pub mod sheet;

pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use scorer::{CriticalityScores, Scorer, ScorerBuilder, ScorerError, ScorerInfo};
pub use settings::Settings;

/// Initializes env_logger with `level` as the default filter.
/// Repeated calls are harmless.
pub fn init_logger(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .try_init();
}
