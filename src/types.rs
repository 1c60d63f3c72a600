use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies a [`crate::Peripheral`] context for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeripheralId(u64);

impl PeripheralId {
    pub(crate) fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        PeripheralId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value of this identifier.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peripheral#{}", self.0)
    }
}

/// GATT characteristic properties as defined in the Bluetooth Core Specification, Vol 3, Part G, §3.3.1.1.
///
/// The two encryption-required flags occupy the bits the peripheral-role platform APIs use for them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub struct CharacteristicProperties {
    pub broadcast: bool,
    pub read: bool,
    pub write_without_response: bool,
    pub write: bool,
    pub notify: bool,
    pub indicate: bool,
    pub authenticated_signed_writes: bool,
    pub extended_properties: bool,
    pub notify_encryption_required: bool,
    pub indicate_encryption_required: bool,
}

impl CharacteristicProperties {
    /// Every bit [`CharacteristicProperties::from_bits`] understands.
    pub const ALL_BITS: u32 = 0x3ff;

    /// Raw transmutation from [`u32`].
    pub fn from_bits(bits: u32) -> Self {
        CharacteristicProperties {
            broadcast: (bits & (1 << 0)) != 0,
            read: (bits & (1 << 1)) != 0,
            write_without_response: (bits & (1 << 2)) != 0,
            write: (bits & (1 << 3)) != 0,
            notify: (bits & (1 << 4)) != 0,
            indicate: (bits & (1 << 5)) != 0,
            authenticated_signed_writes: (bits & (1 << 6)) != 0,
            extended_properties: (bits & (1 << 7)) != 0,
            notify_encryption_required: (bits & (1 << 8)) != 0,
            indicate_encryption_required: (bits & (1 << 9)) != 0,
        }
    }

    /// Raw transmutation to [`u32`].
    pub fn to_bits(self) -> u32 {
        u32::from(self.broadcast)
            | (u32::from(self.read) << 1)
            | (u32::from(self.write_without_response) << 2)
            | (u32::from(self.write) << 3)
            | (u32::from(self.notify) << 4)
            | (u32::from(self.indicate) << 5)
            | (u32::from(self.authenticated_signed_writes) << 6)
            | (u32::from(self.extended_properties) << 7)
            | (u32::from(self.notify_encryption_required) << 8)
            | (u32::from(self.indicate_encryption_required) << 9)
    }
}

/// Read/write permissions of a locally published attribute value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub struct AttributePermissions {
    pub readable: bool,
    pub writeable: bool,
    pub read_encryption_required: bool,
    pub write_encryption_required: bool,
}

impl AttributePermissions {
    /// Every bit [`AttributePermissions::from_bits`] understands.
    pub const ALL_BITS: u32 = 0xf;

    /// Raw transmutation from [`u32`].
    pub fn from_bits(bits: u32) -> Self {
        AttributePermissions {
            readable: (bits & (1 << 0)) != 0,
            writeable: (bits & (1 << 1)) != 0,
            read_encryption_required: (bits & (1 << 2)) != 0,
            write_encryption_required: (bits & (1 << 3)) != 0,
        }
    }

    /// Raw transmutation to [`u32`].
    pub fn to_bits(self) -> u32 {
        u32::from(self.readable)
            | (u32::from(self.writeable) << 1)
            | (u32::from(self.read_encryption_required) << 2)
            | (u32::from(self.write_encryption_required) << 3)
    }
}
