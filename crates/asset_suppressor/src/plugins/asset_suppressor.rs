use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::{PluginConfig, Strictness};
use crate::options::{Configuration, ConfigurationWarning, RawOption, PACKAGE_NAME};
use crate::plugin::{Compilation, DoneCallback, HookEvent, HookRegistry, Plugin};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("the plugin instance has already been applied, create a new one for each compiler")]
    AlreadyApplied,
    #[error("the compiler does not provide the `{event}` hook")]
    UnsupportedHost { event: HookEvent },
}

/// Drops the files of the configured chunks before they are written out.
pub struct AssetSuppressor {
    config: Arc<Configuration>,
    plugin_config: PluginConfig,
    used: AtomicBool,
}

impl AssetSuppressor {
    pub fn new(options: RawOption, plugin_config: PluginConfig) -> Self {
        Self {
            config: Arc::new(Configuration::normalize(&options)),
            plugin_config,
            used: AtomicBool::new(false),
        }
    }

    /// Only the first argument is used as options, the rest are ignored with
    /// a warning.
    pub fn from_args(args: Vec<RawOption>, plugin_config: PluginConfig) -> Self {
        let (plugin, warnings) = Self::from_args_with_warnings(args, plugin_config);
        warnings.iter().for_each(ConfigurationWarning::log);
        plugin
    }

    pub fn from_args_with_warnings(
        args: Vec<RawOption>,
        plugin_config: PluginConfig,
    ) -> (Self, Vec<ConfigurationWarning>) {
        let mut args = args.into_iter();
        let options = args.next().unwrap_or(RawOption::Undefined);
        let unused = args.collect::<Vec<_>>();
        let mut warnings = vec![];
        if !unused.is_empty() {
            warnings.push(ConfigurationWarning::ExtraArguments(
                RawOption::List(unused).to_string(),
            ));
        }
        let (config, normalize_warnings) = Configuration::normalize_with_warnings(&options);
        warnings.extend(normalize_warnings);
        let plugin = Self {
            config: Arc::new(config),
            plugin_config,
            used: AtomicBool::new(false),
        };
        (plugin, warnings)
    }

    pub fn from_json(options: &str, plugin_config: &str) -> Result<Self> {
        let options: RawOption = serde_json::from_str(options)
            .with_context(|| format!("invalid {} options: {}", PACKAGE_NAME, options))?;
        let plugin_config = PluginConfig::from_literal_str(plugin_config)?;
        Ok(Self::new(options, plugin_config))
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::SeqCst)
    }

    fn report(&self, err: UsageError) -> Result<bool> {
        match self.plugin_config.strictness {
            Strictness::Strict => Err(err.into()),
            Strictness::Tolerant => {
                error!("{}: {}.", PACKAGE_NAME, err);
                Ok(false)
            }
        }
    }
}

impl Plugin for AssetSuppressor {
    fn name(&self) -> &str {
        PACKAGE_NAME
    }

    fn apply(&self, registry: &mut dyn HookRegistry) -> Result<bool> {
        if self
            .used
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return self.report(UsageError::AlreadyApplied);
        }
        let event = self.plugin_config.hook;
        if !registry.supports(event) {
            self.used.store(false, Ordering::SeqCst);
            return self.report(UsageError::UnsupportedHost { event });
        }

        let config = self.config.clone();
        let tapped = registry.tap(
            event,
            PACKAGE_NAME,
            Box::new(
                move |compilation: &mut dyn Compilation, done: Option<DoneCallback>| {
                    let removed = suppress(&config, compilation);
                    debug!("{}: removed {} assets", PACKAGE_NAME, removed);
                    if let Some(done) = done {
                        done();
                    }
                    Ok(())
                },
            ),
        );
        if let Err(err) = tapped {
            self.used.store(false, Ordering::SeqCst);
            return Err(err);
        }
        Ok(true)
    }
}

/// Deletes every asset emitted by a chunk named in `config`, returns how many
/// entries were actually removed. Missing assets are skipped.
pub fn suppress(config: &Configuration, compilation: &mut dyn Compilation) -> usize {
    if config.is_empty() {
        return 0;
    }
    let files = compilation
        .chunks()
        .iter()
        .filter(|chunk| chunk.name.as_deref().is_some_and(|name| config.contains(name)))
        .flat_map(|chunk| chunk.files.iter().cloned())
        .collect::<Vec<_>>();

    let assets = compilation.assets_mut();
    files
        .iter()
        .filter(|file| assets.shift_remove(file.as_str()).is_some())
        .count()
}
