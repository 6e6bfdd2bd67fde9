//! levsim-config
//!
//! Layered YAML configuration for the simulator.
//! - Documents merge in order (later overrides earlier, deep merge on maps)
//! - The merged document is hashed over its canonical JSON form
//! - `SimConfig` is the typed view; every key has a default
//! - Unused-key guard reports leaves the simulator never reads

mod consumption;
mod error;
mod layered;
mod sim;
mod unused;

pub use consumption::consumed_pointers;
pub use error::ConfigError;
pub use layered::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};
pub use sim::{
    ActionMode, BrokerConfig, EpisodeConfig, FieldsConfig, RecordsConfig, SimConfig, StrategyKind,
};
pub use unused::{report_unused_keys, UnusedKeyPolicy, UnusedKeyReport};
