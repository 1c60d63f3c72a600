use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use async_lock::{Mutex, RwLock};
use log::{debug, warn};
use uuid::Uuid;

use super::btuuid::BluetoothUuidExt;
use super::characteristic::MutableCharacteristic;
use super::config::{AttachedMutation, BridgeConfig};
use super::error::{Error, ErrorKind};
use super::peripheral::{Peripheral, PeripheralInner};
use super::{PeripheralId, Result};

/// A read-only view of a local Bluetooth GATT service.
///
/// Every [`MutableService`] dereferences to a `Service`, and both observe the same
/// state: code that only reads a service never needs to know whether it may be mutated.
#[derive(Clone)]
pub struct Service {
    inner: Arc<ServiceInner>,
}

/// A Bluetooth GATT service built locally and published from the peripheral role.
///
/// The handle is mutable until it is attached to a [`Peripheral`] with
/// [`Peripheral::add_service`]; what happens to later writes is decided by the
/// [`AttachedMutation`] policy the service was constructed with.
#[derive(Clone)]
pub struct MutableService {
    service: Service,
}

/// Serializes inclusion updates, so that two services cannot include each other
/// by being assigned concurrently.
static INCLUSION_LOCK: Mutex<()> = Mutex::new(());

pub(crate) struct ServiceInner {
    state: RwLock<ServiceState>,
    attached_mutation: AttachedMutation,
}

struct ServiceState {
    uuid: Uuid,
    is_primary: bool,
    characteristics: Vec<MutableCharacteristic>,
    included_services: Vec<Service>,
    peripheral: Option<PeripheralBinding>,
}

struct PeripheralBinding {
    id: PeripheralId,
    peripheral: Weak<PeripheralInner>,
}

/// A plain description of a service at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceSnapshot {
    /// The service type.
    pub uuid: Uuid,
    /// Whether this is a primary service.
    pub is_primary: bool,
    /// Types of the characteristics, in attribute-table order.
    pub characteristics: Vec<Uuid>,
    /// Types of the included services, in order.
    pub included_services: Vec<Uuid>,
    /// The peripheral the service is attached to, if any.
    pub peripheral: Option<PeripheralId>,
}

impl PartialEq for Service {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Service {}

impl std::hash::Hash for Service {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl PartialEq for MutableService {
    fn eq(&self, other: &Self) -> bool {
        self.service == other.service
    }
}

impl Eq for MutableService {}

impl std::hash::Hash for MutableService {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.service.hash(state);
    }
}

impl PartialEq<MutableService> for Service {
    fn eq(&self, other: &MutableService) -> bool {
        *self == other.service
    }
}

impl PartialEq<Service> for MutableService {
    fn eq(&self, other: &Service) -> bool {
        self.service == *other
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read_blocking();
        f.debug_struct("Service")
            .field("uuid", &state.uuid.to_short_string())
            .field("is_primary", &state.is_primary)
            .field("characteristics", &state.characteristics.len())
            .field("included_services", &state.included_services.len())
            .field("peripheral", &state.peripheral.as_ref().map(|b| b.id))
            .finish()
    }
}

impl std::fmt::Debug for MutableService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MutableService").field(&self.service).finish()
    }
}

impl std::ops::Deref for MutableService {
    type Target = Service;

    fn deref(&self) -> &Service {
        &self.service
    }
}

impl AsRef<Service> for Service {
    fn as_ref(&self) -> &Service {
        self
    }
}

impl AsRef<Service> for MutableService {
    fn as_ref(&self) -> &Service {
        &self.service
    }
}

impl From<MutableService> for Service {
    fn from(service: MutableService) -> Self {
        service.service
    }
}

impl From<&MutableService> for Service {
    fn from(service: &MutableService) -> Self {
        service.service.clone()
    }
}

impl Service {
    /// The [Uuid] identifying the type of this GATT service.
    pub fn uuid(&self) -> Uuid {
        self.inner.state.read_blocking().uuid
    }

    /// Whether this is a primary service.
    pub fn is_primary(&self) -> bool {
        self.inner.state.read_blocking().is_primary
    }

    /// Returns the characteristics of this service in attribute-table order.
    ///
    /// The returned vector is a copy; modifying it does not modify the service.
    pub fn characteristics(&self) -> Vec<MutableCharacteristic> {
        self.inner.state.read_blocking().characteristics.clone()
    }

    /// Returns the included services of this service.
    ///
    /// The returned vector is a copy; modifying it does not modify the service.
    pub fn included_services(&self) -> Vec<Service> {
        self.inner.state.read_blocking().included_services.clone()
    }

    /// The peripheral this service is attached to.
    ///
    /// Returns `None` if the service was never attached, or if the peripheral has
    /// since been released; the service never keeps its peripheral alive.
    pub fn peripheral(&self) -> Option<Peripheral> {
        self.inner
            .state
            .read_blocking()
            .peripheral
            .as_ref()
            .and_then(|binding| binding.peripheral.upgrade())
            .map(Peripheral::from_inner)
    }

    /// Whether this service has been attached to a peripheral.
    ///
    /// Attachment is permanent, even after the peripheral is released.
    pub fn is_attached(&self) -> bool {
        self.inner.state.read_blocking().peripheral.is_some()
    }

    /// Returns a plain description of the current state of this service.
    pub fn snapshot(&self) -> ServiceSnapshot {
        // included services are read after this service's lock is released
        let (uuid, is_primary, characteristics, included_services, peripheral) = {
            let state = self.inner.state.read_blocking();
            (
                state.uuid,
                state.is_primary,
                state.characteristics.iter().map(|ch| ch.uuid()).collect(),
                state.included_services.clone(),
                state.peripheral.as_ref().map(|b| b.id),
            )
        };
        ServiceSnapshot {
            uuid,
            is_primary,
            characteristics,
            included_services: included_services.iter().map(|serv| serv.uuid()).collect(),
            peripheral,
        }
    }

    /// Whether `target` is reachable from this service by following inclusions.
    fn includes(&self, target: &Service) -> bool {
        let mut visited = HashSet::new();
        let mut pending = self.included_services();
        while let Some(serv) = pending.pop() {
            if serv == *target {
                return true;
            }
            if visited.insert(Arc::as_ptr(&serv.inner)) {
                pending.extend(serv.included_services());
            }
        }
        false
    }
}

impl MutableService {
    /// Creates a service of the given type, with no characteristics or included services,
    /// not attached to any peripheral.
    pub fn new(uuid: Uuid, is_primary: bool) -> Self {
        Self::with_config(uuid, is_primary, &BridgeConfig::default())
    }

    /// Same as [`MutableService::new`] with the mutation policy taken from `config`.
    pub fn with_config(uuid: Uuid, is_primary: bool, config: &BridgeConfig) -> Self {
        if config.logs_property_access() {
            debug!("constructed service {}", uuid.to_short_string());
        }
        Self {
            service: Service {
                inner: Arc::new(ServiceInner {
                    state: RwLock::new(ServiceState {
                        uuid,
                        is_primary,
                        characteristics: Vec::new(),
                        included_services: Vec::new(),
                        peripheral: None,
                    }),
                    attached_mutation: config.attached_mutation_policy(),
                }),
            },
        }
    }

    /// Creates a service, parsing `uuid` from any Bluetooth UUID text form (`"180D"`,
    /// `"0000180D"` or the full 128-bit form).
    ///
    /// Fails with [`ErrorKind::InvalidIdentifier`] if `uuid` cannot be parsed.
    pub fn construct(uuid: &str, is_primary: bool) -> Result<Self> {
        let uuid = Uuid::parse_bluetooth(uuid)?;
        Ok(Self::new(uuid, is_primary))
    }

    /// Returns the read-only view of this service.
    pub fn as_service(&self) -> &Service {
        &self.service
    }

    /// Changes the type of this service.
    pub fn set_uuid(&self, uuid: Uuid) -> Result<()> {
        self.update("uuid", |state| {
            state.uuid = uuid;
            Ok(())
        })
    }

    /// Changes the type of this service, parsing `uuid` like [`MutableService::construct`].
    pub fn set_uuid_str(&self, uuid: &str) -> Result<()> {
        self.update("uuid", |state| {
            state.uuid = Uuid::parse_bluetooth(uuid)?;
            Ok(())
        })
    }

    /// Marks this service as primary or secondary.
    pub fn set_primary(&self, is_primary: bool) -> Result<()> {
        self.update("isPrimary", |state| {
            state.is_primary = is_primary;
            Ok(())
        })
    }

    /// Replaces all characteristics of this service.
    ///
    /// Fails with [`ErrorKind::DuplicateHandle`] if the same characteristic appears twice;
    /// the previous characteristics are kept on failure.
    pub fn set_characteristics(&self, characteristics: Vec<MutableCharacteristic>) -> Result<()> {
        self.update("characteristics", |state| {
            check_distinct(&characteristics, "characteristic")?;
            state.characteristics = characteristics;
            Ok(())
        })
    }

    /// Replaces all included services of this service.
    ///
    /// Fails with [`ErrorKind::DuplicateHandle`] if the same service appears twice, and
    /// with [`ErrorKind::InvalidCapability`] if an inclusion would make this service
    /// include itself. The previous included services are kept on failure.
    pub fn set_included_services(&self, included_services: Vec<Service>) -> Result<()> {
        let _guard = INCLUSION_LOCK.lock_blocking();
        self.update("includedServices", |state| {
            check_distinct(&included_services, "service")?;
            // this service's state is locked here: it must not be read through `serv`
            for serv in &included_services {
                let included = if *serv == self.service {
                    state.uuid
                } else if serv.includes(&self.service) {
                    serv.uuid()
                } else {
                    continue;
                };
                return Err(Error::new(
                    ErrorKind::InvalidCapability,
                    None,
                    format!(
                        "including service {} would make service {} include itself",
                        included.to_short_string(),
                        state.uuid.to_short_string()
                    ),
                ));
            }
            state.included_services = included_services;
            Ok(())
        })
    }

    /// Whether a write to `property` would currently be applied.
    ///
    /// Fails with [`ErrorKind::IllegalRebind`] when the service is attached and the policy is
    /// [`AttachedMutation::Reject`]; returns `false` when the write would be ignored.
    pub(crate) fn accepts_write(&self, property: &str) -> Result<bool> {
        let state = self.inner.state.read_blocking();
        self.admit(&state, property)
    }

    /// Binds this service to `peripheral`. Rebinding to another peripheral is rejected.
    ///
    /// Returns `false` if the service was already bound to the same peripheral.
    pub(crate) fn bind(&self, id: PeripheralId, peripheral: &Arc<PeripheralInner>) -> Result<bool> {
        let mut state = self.inner.state.write_blocking();
        match &state.peripheral {
            Some(binding) if binding.id == id => Ok(false),
            Some(binding) => Err(Error::new(
                ErrorKind::IllegalRebind,
                None,
                format!(
                    "service {} is attached to {}, cannot attach it to {id}",
                    state.uuid.to_short_string(),
                    binding.id
                ),
            )),
            None => {
                state.peripheral = Some(PeripheralBinding {
                    id,
                    peripheral: Arc::downgrade(peripheral),
                });
                Ok(true)
            }
        }
    }

    fn admit(&self, state: &ServiceState, property: &str) -> Result<bool> {
        let Some(binding) = &state.peripheral else {
            return Ok(true);
        };
        match self.inner.attached_mutation {
            AttachedMutation::Reject => Err(Error::new(
                ErrorKind::IllegalRebind,
                None,
                format!(
                    "cannot set `{property}` of service {} attached to {}",
                    state.uuid.to_short_string(),
                    binding.id
                ),
            )),
            AttachedMutation::Ignore => {
                warn!(
                    "ignored write to `{property}` of service {} attached to {}",
                    state.uuid.to_short_string(),
                    binding.id
                );
                Ok(false)
            }
            AttachedMutation::Allow => Ok(true),
        }
    }

    /// Applies `f` under the write lock once the attachment policy admits the write.
    /// `f` must validate before it modifies anything.
    fn update(
        &self,
        property: &str,
        f: impl FnOnce(&mut ServiceState) -> Result<()>,
    ) -> Result<()> {
        let mut state = self.inner.state.write_blocking();
        if !self.admit(&state, property)? {
            return Ok(());
        }
        f(&mut state)
    }
}

fn check_distinct<T: Eq + std::hash::Hash>(items: &[T], what: &str) -> Result<()> {
    let mut seen = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if let Some(first) = seen.insert(item, i) {
            return Err(Error::new(
                ErrorKind::DuplicateHandle,
                None,
                format!("{what} at index {i} already appears at index {first}"),
            ));
        }
    }
    Ok(())
}
