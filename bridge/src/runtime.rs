//! Host runtime: owns the world, the shared metadata, the replicator and the
//! loaded resources
//!
//! There is no process-global core object. A [`Runtime`] is built at startup
//! and script modules capture a cloned [`HostHandle`] instead.

use crate::config::{BridgeConfig, ConfigError};
use crate::core::entity::{SharedWorld, World};
use crate::meta::{read_store, MetaData, SharedStore, SyncedMetaData};
use crate::net::{MetaOwner, MetaTransport, Replicator};
use crate::scripting::log::{LogSink, TracingLogSink};
use crate::scripting::resource::{Resource, ResourceError};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Errors from runtime resource management
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("Resource '{0}' is already running")]
    AlreadyRunning(String),

    #[error("Resource '{0}' is not running")]
    NotRunning(String),
}

/// Cheap handle to host state, captured by script modules
#[derive(Clone)]
pub struct HostHandle {
    world: SharedWorld,
    meta: SharedStore<MetaData>,
    synced_meta: SharedStore<SyncedMetaData>,
    sink: Arc<dyn LogSink>,
    debug: bool,
}

impl HostHandle {
    /// Fresh host state whose synced stores queue into `replicator`
    pub fn new(replicator: &Replicator, sink: Arc<dyn LogSink>, debug: bool) -> Self {
        Self {
            world: World::new(replicator.outbox()).into_shared(),
            meta: MetaData::shared(),
            synced_meta: SyncedMetaData::shared(MetaOwner::Global, replicator.outbox()),
            sink,
            debug,
        }
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Process-wide local metadata
    pub fn shared_meta(&self) -> SharedStore<MetaData> {
        self.meta.clone()
    }

    /// Process-wide replicated metadata
    pub fn shared_synced_meta(&self) -> SharedStore<SyncedMetaData> {
        self.synced_meta.clone()
    }

    /// Synced store for a replication owner, if it exists on this peer
    pub fn synced_store(&self, owner: MetaOwner) -> Option<SharedStore<SyncedMetaData>> {
        match owner {
            MetaOwner::Global => Some(self.shared_synced_meta()),
            MetaOwner::Entity(id) => read_store(&self.world).synced_meta(id),
        }
    }
}

/// The bridge host
pub struct Runtime {
    config: BridgeConfig,
    host: HostHandle,
    replicator: Replicator,
    resources: IndexMap<String, Resource>,
}

impl Runtime {
    /// Create a runtime that logs resource output through `tracing`
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingLogSink))
    }

    pub fn with_sink(config: BridgeConfig, sink: Arc<dyn LogSink>) -> Self {
        let replicator = Replicator::new(config.peer());
        let host = HostHandle::new(&replicator, sink, config.debug);
        info!(peer = config.peer_id, debug = config.debug, "Runtime created");
        Self {
            config,
            host,
            replicator,
            resources: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn host(&self) -> &HostHandle {
        &self.host
    }

    pub fn world(&self) -> &SharedWorld {
        self.host.world()
    }

    pub fn replicator(&self) -> &Replicator {
        &self.replicator
    }

    /// Load `name` from the resource root and start it
    pub fn start_resource(&mut self, name: &str) -> Result<(), RuntimeError> {
        if self.resources.contains_key(name) {
            return Err(RuntimeError::AlreadyRunning(name.to_string()));
        }
        let path = self.config.resource_path(name)?;
        let resource = Resource::from_file(name, &path, &self.host, &self.config.limits)?;
        self.insert_and_start(resource)
    }

    /// Start a resource from in-memory source
    pub fn start_resource_from_source(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<(), RuntimeError> {
        if self.resources.contains_key(name) {
            return Err(RuntimeError::AlreadyRunning(name.to_string()));
        }
        let resource = Resource::from_source(name, source, &self.host, &self.config.limits)?;
        self.insert_and_start(resource)
    }

    fn insert_and_start(&mut self, mut resource: Resource) -> Result<(), RuntimeError> {
        resource.start()?;
        self.resources.insert(resource.name().to_string(), resource);
        Ok(())
    }

    /// Stop and unload a resource
    ///
    /// The resource is unloaded even when its `on_stop` fails.
    pub fn stop_resource(&mut self, name: &str) -> Result<(), RuntimeError> {
        let mut resource = self
            .resources
            .shift_remove(name)
            .ok_or_else(|| RuntimeError::NotRunning(name.to_string()))?;
        resource.stop()?;
        Ok(())
    }

    /// Stop a resource and load it again from where it came from
    pub fn restart_resource(&mut self, name: &str) -> Result<(), RuntimeError> {
        let resource = self
            .resources
            .get(name)
            .ok_or_else(|| RuntimeError::NotRunning(name.to_string()))?;
        let from_disk = resource.path().is_some();
        let source = resource.source().to_string();

        if let Err(e) = self.stop_resource(name) {
            warn!(resource = name, error = %e, "Resource failed to stop cleanly");
        }
        info!(resource = name, "Restarting resource");

        if from_disk {
            self.start_resource(name)
        } else {
            self.start_resource_from_source(name, &source)
        }
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn resource_mut(&mut self, name: &str) -> Option<&mut Resource> {
        self.resources.get_mut(name)
    }

    /// Loaded resources in start order
    pub fn resource_names(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }

    /// Apply received replication updates, then tick every resource
    pub fn tick(&mut self, delta_time: f64) {
        self.pump_replication();
        for (name, resource) in self.resources.iter_mut() {
            if let Err(e) = resource.tick(delta_time) {
                error!(resource = name, error = %e, "Resource tick failed");
            }
        }
    }

    /// Apply every update waiting in the inbox
    pub fn pump_replication(&self) -> usize {
        let applied = self.replicator.pump(|owner| self.host.synced_store(owner));
        if applied > 0 {
            debug!(count = applied, "Applied remote metadata updates");
        }
        applied
    }

    /// Hand queued local updates to `transport`
    pub fn flush_replication(&self, transport: &dyn MetaTransport) -> usize {
        self.replicator.flush(transport)
    }

    /// Stop every resource in reverse start order
    pub fn shutdown(mut self) {
        while let Some((name, mut resource)) = self.resources.pop() {
            if let Err(e) = resource.stop() {
                error!(resource = name, error = %e, "Resource failed to stop cleanly");
            }
        }
        info!("Runtime shut down");
    }
}
