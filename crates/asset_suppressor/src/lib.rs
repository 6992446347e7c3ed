pub mod compiler;
pub mod config;
pub mod logger;
pub mod options;
pub mod plugin;
pub mod plugins;

pub use compiler::{Asset, AssetMap, ChunkDescriptor, CompilationSnapshot, Compiler};
pub use config::{PluginConfig, Strictness};
pub use options::{Configuration, ConfigurationWarning, RawObject, RawOption};
pub use plugins::asset_suppressor::{suppress, AssetSuppressor, UsageError};
