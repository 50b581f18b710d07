//! Process-wide graph handles.
//!
//! The default graph is opened from [`GraphConfig::load`] the first time it is
//! asked for, unless [`init_default`] installed one before. Named graphs share
//! the default graph's settings under their own name, which also gives each of
//! them its own directory under `storage.db_root_dir`.

use std::collections::HashMap;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use tracing::debug;
use tracing::info;

use crate::constants::DEFAULT_GRAPH_NAME;
use crate::Error;
use crate::Graph;
use crate::GraphConfig;
use crate::Result;

#[derive(Default)]
struct Handles {
    template: Option<GraphConfig>,
    graphs: HashMap<String, Graph>,
}

lazy_static! {
    static ref HANDLES: Mutex<Handles> = Mutex::new(Handles::default());
}

impl Handles {
    fn template(&mut self) -> Result<GraphConfig> {
        if let Some(config) = &self.template {
            return Ok(config.clone());
        }
        let config = GraphConfig::load(None)?;
        self.template = Some(config.clone());
        Ok(config)
    }

    fn get_or_open(
        &mut self,
        key: &str,
    ) -> Result<Graph> {
        if let Some(graph) = self.graphs.get(key) {
            return Ok(graph.clone());
        }
        let template = self.template()?;
        let config = if key == DEFAULT_GRAPH_NAME {
            template
        } else {
            template.renamed(key)
        };
        let graph = Graph::open(config)?;
        debug!(%key, "graph handle registered");
        self.graphs.insert(key.to_string(), graph.clone());
        Ok(graph)
    }
}

/// Installs `config` as the default graph and as the template for named
/// graphs opened afterwards. Fails if a default graph is already open.
pub fn init_default(config: GraphConfig) -> Result<Graph> {
    let mut handles = HANDLES.lock();
    if handles.graphs.contains_key(DEFAULT_GRAPH_NAME) {
        return Err(Error::InvalidConfig(
            "default graph is already initialized".to_string(),
        ));
    }
    let graph = Graph::open(config.clone())?;
    info!(name = %config.name, "default graph initialized");
    handles.template = Some(config);
    handles.graphs.insert(DEFAULT_GRAPH_NAME.to_string(), graph.clone());
    Ok(graph)
}

/// The process-wide default graph
pub fn default_graph() -> Result<Graph> {
    HANDLES.lock().get_or_open(DEFAULT_GRAPH_NAME)
}

/// The process-wide graph registered under `name`, opened on first use
pub fn named(name: &str) -> Result<Graph> {
    if name.trim().is_empty() {
        return Err(Error::InvalidConfig("graph name cannot be empty".into()));
    }
    HANDLES.lock().get_or_open(name)
}

/// Forgets the handle registered under `name`. The store closes once every
/// other clone of it is dropped.
pub fn release(name: &str) -> Option<Graph> {
    HANDLES.lock().graphs.remove(name)
}

/// Forgets every handle and the default template.
pub fn shutdown_all() {
    let mut handles = HANDLES.lock();
    let count = handles.graphs.len();
    *handles = Handles::default();
    info!(count, "graph handles released");
}
