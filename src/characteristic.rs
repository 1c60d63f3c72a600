use std::sync::Arc;

use async_lock::RwLock;
use uuid::Uuid;

use super::btuuid::BluetoothUuidExt;
use super::{AttributePermissions, CharacteristicProperties, Result};

/// A locally published Bluetooth GATT characteristic.
///
/// Cloning yields another handle to the same characteristic; equality is handle identity,
/// so two characteristics sharing a UUID are still distinct entries of a service.
#[derive(Clone)]
pub struct MutableCharacteristic {
    inner: Arc<CharacteristicInner>,
}

struct CharacteristicInner {
    uuid: Uuid,
    properties: CharacteristicProperties,
    permissions: AttributePermissions,
    value: RwLock<Option<Vec<u8>>>,
}

impl PartialEq for MutableCharacteristic {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for MutableCharacteristic {}

impl std::hash::Hash for MutableCharacteristic {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl std::fmt::Debug for MutableCharacteristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutableCharacteristic")
            .field("uuid", &self.inner.uuid.to_short_string())
            .field("properties", &self.inner.properties.to_bits())
            .field("permissions", &self.inner.permissions.to_bits())
            .finish()
    }
}

impl MutableCharacteristic {
    /// Creates a characteristic of the given type.
    ///
    /// A `Some` value is published as a cached, read-only value; `None` means
    /// reads and writes are served dynamically by the Bluetooth stack.
    pub fn new(
        uuid: Uuid,
        properties: CharacteristicProperties,
        value: Option<Vec<u8>>,
        permissions: AttributePermissions,
    ) -> Self {
        Self {
            inner: Arc::new(CharacteristicInner {
                uuid,
                properties,
                permissions,
                value: RwLock::new(value),
            }),
        }
    }

    /// Same as [`MutableCharacteristic::new`], parsing `uuid` from any Bluetooth UUID text form.
    pub fn construct(
        uuid: &str,
        properties: CharacteristicProperties,
        value: Option<Vec<u8>>,
        permissions: AttributePermissions,
    ) -> Result<Self> {
        let uuid = Uuid::parse_bluetooth(uuid)?;
        Ok(Self::new(uuid, properties, value, permissions))
    }

    /// The [Uuid] identifying the type of this GATT characteristic.
    pub fn uuid(&self) -> Uuid {
        self.inner.uuid
    }

    /// The properties of this GATT characteristic.
    pub fn properties(&self) -> CharacteristicProperties {
        self.inner.properties
    }

    /// The permissions of the characteristic value.
    pub fn permissions(&self) -> AttributePermissions {
        self.inner.permissions
    }

    /// The cached value of this characteristic, if any.
    pub fn value(&self) -> Option<Vec<u8>> {
        self.inner.value.read_blocking().clone()
    }

    /// Replaces the cached value of this characteristic.
    pub fn set_value(&self, value: Option<Vec<u8>>) {
        *self.inner.value.write_blocking() = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btuuid::characteristics;
    use crate::ErrorKind;

    #[test]
    fn clones_share_identity() {
        let a = MutableCharacteristic::new(
            characteristics::BATTERY_LEVEL,
            CharacteristicProperties::from_bits(0x12),
            None,
            AttributePermissions::from_bits(0x1),
        );
        let b = MutableCharacteristic::new(
            characteristics::BATTERY_LEVEL,
            CharacteristicProperties::from_bits(0x12),
            None,
            AttributePermissions::from_bits(0x1),
        );
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.uuid(), b.uuid());

        a.clone().set_value(Some(vec![99]));
        assert_eq!(a.value(), Some(vec![99]));
        assert_eq!(b.value(), None);
    }

    #[test]
    fn construct_parses_uuid() {
        let ch = MutableCharacteristic::construct(
            "2a37",
            CharacteristicProperties::default(),
            Some(vec![0, 72]),
            AttributePermissions::default(),
        )
        .unwrap();
        assert_eq!(ch.uuid(), characteristics::HEART_RATE_MEASUREMENT);
        assert_eq!(ch.value(), Some(vec![0, 72]));

        let err = MutableCharacteristic::construct(
            "",
            CharacteristicProperties::default(),
            None,
            AttributePermissions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
    }
}
