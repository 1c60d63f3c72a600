use std::sync::Arc;

use async_lock::RwLock;
use log::info;

use super::btuuid::BluetoothUuidExt;
use super::service::MutableService;
use super::{PeripheralId, Result};

/// A peripheral-role context that publishes local services.
///
/// The peripheral owns the services attached to it; each service refers back to
/// its peripheral without keeping it alive.
#[derive(Clone)]
pub struct Peripheral {
    inner: Arc<PeripheralInner>,
}

pub(crate) struct PeripheralInner {
    id: PeripheralId,
    name: String,
    services: RwLock<Vec<MutableService>>,
}

impl PartialEq for Peripheral {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Peripheral {}

impl std::hash::Hash for Peripheral {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl std::fmt::Debug for Peripheral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut f = f.debug_struct("Peripheral");
        f.field("name", &self.inner.name);
        f.field("id", &self.inner.id);
        f.finish()
    }
}

impl std::fmt::Display for Peripheral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner.name)
    }
}

impl Peripheral {
    /// Creates a peripheral context with no services.
    pub fn new<S: ToString>(name: S) -> Self {
        Self {
            inner: Arc::new(PeripheralInner {
                id: PeripheralId::next(),
                name: name.to_string(),
                services: RwLock::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<PeripheralInner>) -> Self {
        Self { inner }
    }

    /// Returns this peripheral's unique identifier.
    pub fn id(&self) -> PeripheralId {
        self.inner.id
    }

    /// The local name of this peripheral.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Attaches `service` to this peripheral for publication.
    ///
    /// From now on the service reports this peripheral as its owner and no longer
    /// accepts mutations unless its policy allows them. Attaching a service to a
    /// second peripheral fails with [`crate::error::ErrorKind::IllegalRebind`];
    /// attaching it again to this one does nothing.
    pub fn add_service(&self, service: &MutableService) -> Result<()> {
        if !service.bind(self.inner.id, &self.inner)? {
            let mut services = self.inner.services.write_blocking();
            if !services.contains(service) {
                services.push(service.clone());
            }
            return Ok(());
        }
        info!(
            "attached service {} to {}",
            service.uuid().to_short_string(),
            self.inner.id
        );
        self.inner.services.write_blocking().push(service.clone());
        Ok(())
    }

    /// Stops publishing `service`. Returns `false` if it was not published by this peripheral.
    ///
    /// The service stays bound to this peripheral.
    pub fn remove_service(&self, service: &MutableService) -> bool {
        let mut services = self.inner.services.write_blocking();
        let len = services.len();
        services.retain(|serv| serv != service);
        let removed = services.len() != len;
        if removed {
            info!(
                "removed service {} from {}",
                service.uuid().to_short_string(),
                self.inner.id
            );
        }
        removed
    }

    /// Stops publishing all services.
    pub fn remove_all_services(&self) {
        let removed = std::mem::take(&mut *self.inner.services.write_blocking());
        info!("removed {} services from {}", removed.len(), self.inner.id);
    }

    /// Returns the services published by this peripheral, in the order they were added.
    pub fn services(&self) -> Vec<MutableService> {
        self.inner.services.read_blocking().clone()
    }
}
