use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::compiler::{AssetMap, ChunkDescriptor};

/// Build events a plugin can tap into.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum HookEvent {
    #[serde(rename = "afterCompile")]
    #[default]
    AfterCompile,
    #[serde(rename = "emit")]
    Emit,
}

impl HookEvent {
    pub const ALL: [HookEvent; 2] = [HookEvent::AfterCompile, HookEvent::Emit];
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookEvent::AfterCompile => write!(f, "after-compile"),
            HookEvent::Emit => write!(f, "emit"),
        }
    }
}

/// What a host exposes to hooks for one build: the generated chunks and the
/// assets about to be written.
pub trait Compilation {
    fn chunks(&self) -> &[ChunkDescriptor];
    fn assets_mut(&mut self) -> &mut AssetMap;
}

pub type DoneCallback = Box<dyn FnOnce() + Send>;

pub type HookCallback =
    Box<dyn Fn(&mut dyn Compilation, Option<DoneCallback>) -> Result<()> + Send + Sync>;

/// The registration side of a host.
pub trait HookRegistry {
    fn supports(&self, event: HookEvent) -> bool;
    fn tap(&mut self, event: HookEvent, name: &str, callback: HookCallback) -> Result<()>;
}

pub trait Plugin: Send + Sync {
    /// Note: it is recommended to keep names unique, the driver refuses duplicates
    fn name(&self) -> &str;

    /// register hooks, returns false when the plugin decided to stay inactive
    fn apply(&self, _registry: &mut dyn HookRegistry) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("plugin {0} already exist, please check your plugin name")]
    DuplicatePlugin(String),
}

struct Tap {
    event: HookEvent,
    name: String,
    callback: HookCallback,
}

pub struct PluginDriver {
    plugins: Vec<Arc<dyn Plugin>>,
    taps: Vec<Tap>,
    events: Vec<HookEvent>,
}

impl Default for PluginDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginDriver {
    pub fn new() -> Self {
        Self::with_events(&HookEvent::ALL)
    }

    /// a driver for hosts that only fire some of the events
    pub fn with_events(events: &[HookEvent]) -> Self {
        Self {
            plugins: vec![],
            taps: vec![],
            events: events.to_vec(),
        }
    }

    fn check_plugin_exist(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    /// register a plugin and let it tap the hooks it needs
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        if self.check_plugin_exist(plugin.name()) {
            return Err(DriverError::DuplicatePlugin(plugin.name().to_string()).into());
        }
        if !plugin.apply(self)? {
            debug!("plugin {} is inactive", plugin.name());
        }
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    /// run the taps of `event` in registration order
    ///
    /// `done` is handed to the last tap only so it fires once; without any
    /// tap it is called right away.
    pub fn run_hook_serial(
        &self,
        event: HookEvent,
        compilation: &mut dyn Compilation,
        done: Option<DoneCallback>,
    ) -> Result<()> {
        let taps = self
            .taps
            .iter()
            .filter(|tap| tap.event == event)
            .collect::<Vec<_>>();
        let mut pending_done = done;
        let last = taps.len().saturating_sub(1);
        for (index, tap) in taps.iter().enumerate() {
            debug!("run {} hook of {}", event, tap.name);
            let done = if index == last {
                pending_done.take()
            } else {
                None
            };
            (tap.callback)(&mut *compilation, done)?;
        }
        if let Some(done) = pending_done {
            done();
        }
        Ok(())
    }
}

impl HookRegistry for PluginDriver {
    fn supports(&self, event: HookEvent) -> bool {
        self.events.contains(&event)
    }

    fn tap(&mut self, event: HookEvent, name: &str, callback: HookCallback) -> Result<()> {
        self.taps.push(Tap {
            event,
            name: name.to_string(),
            callback,
        });
        Ok(())
    }
}
