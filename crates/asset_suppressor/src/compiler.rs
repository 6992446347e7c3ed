use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use indexmap::IndexMap;
use tracing::debug;

use crate::plugin::{Compilation, DoneCallback, HookEvent, Plugin, PluginDriver};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Asset {
    pub content: Vec<u8>,
}

impl From<&str> for Asset {
    fn from(content: &str) -> Self {
        Self {
            content: content.as_bytes().to_vec(),
        }
    }
}

pub type AssetMap = IndexMap<String, Asset>;

/// A generated chunk and the files it was written to. Runtime chunks and
/// the like may have no name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChunkDescriptor {
    pub name: Option<String>,
    pub files: Vec<String>,
}

impl ChunkDescriptor {
    pub fn new(name: &str, files: &[&str]) -> Self {
        Self {
            name: Some(name.to_string()),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CompilationSnapshot {
    pub chunks: Vec<ChunkDescriptor>,
    pub assets: AssetMap,
}

impl Compilation for CompilationSnapshot {
    fn chunks(&self) -> &[ChunkDescriptor] {
        &self.chunks
    }

    fn assets_mut(&mut self) -> &mut AssetMap {
        &mut self.assets
    }
}

pub struct Compiler {
    pub plugin_driver: PluginDriver,
}

impl Compiler {
    pub fn new(plugins: Vec<Arc<dyn Plugin>>) -> Result<Self> {
        Self::with_driver(PluginDriver::new(), plugins)
    }

    pub fn with_driver(
        mut plugin_driver: PluginDriver,
        plugins: Vec<Arc<dyn Plugin>>,
    ) -> Result<Self> {
        for plugin in plugins {
            plugin_driver.register(plugin)?;
        }
        Ok(Self { plugin_driver })
    }

    pub fn after_compile(&self, compilation: &mut dyn Compilation) -> Result<()> {
        self.run_event(HookEvent::AfterCompile, compilation, None)
    }

    pub fn emit(
        &self,
        compilation: &mut dyn Compilation,
        done: Option<DoneCallback>,
    ) -> Result<()> {
        self.run_event(HookEvent::Emit, compilation, done)
    }

    pub fn run_event(
        &self,
        event: HookEvent,
        compilation: &mut dyn Compilation,
        done: Option<DoneCallback>,
    ) -> Result<()> {
        let t_event = Instant::now();
        self.plugin_driver.run_hook_serial(event, compilation, done)?;
        debug!("{} hooks: {}ms", event, t_event.elapsed().as_millis());
        Ok(())
    }
}
