//! Bluetooth UUID extensions, canonicalization and a few assigned numbers.
//!
//! 16-bit and 32-bit Bluetooth UUIDs are aliases of full 128-bit UUIDs built on
//! the Bluetooth Base UUID `00000000-0000-1000-8000-00805F9B34FB`. Every identifier
//! handed to the bridge is stored in its full 128-bit form, so that `"180D"`,
//! `"0000180d"` and `"0000180D-0000-1000-8000-00805F9B34FB"` all denote the same
//! service type.

use uuid::Uuid;

use crate::error::{Error, ErrorKind};

/// The Bluetooth Base UUID.
pub const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

const BLUETOOTH_BASE_MASK: u128 = 0x00000000_ffff_ffff_ffff_ffffffffffff;
const BLUETOOTH_BASE_MASK_16: u128 = 0xffff0000_ffff_ffff_ffff_ffffffffffff;

/// Const function to create a 16-bit Bluetooth UUID.
pub const fn bluetooth_uuid_from_u16(uuid: u16) -> Uuid {
    Uuid::from_u128(((uuid as u128) << 96) | BLUETOOTH_BASE_UUID)
}

/// Const function to create a 32-bit Bluetooth UUID.
pub const fn bluetooth_uuid_from_u32(uuid: u32) -> Uuid {
    Uuid::from_u128(((uuid as u128) << 96) | BLUETOOTH_BASE_UUID)
}

/// Extension trait for [`Uuid`] with helper methods for dealing with Bluetooth 16-bit and 32-bit UUIDs.
pub trait BluetoothUuidExt: private::Sealed {
    /// Creates a 16-bit Bluetooth UUID.
    fn from_u16(uuid: u16) -> Self;

    /// Creates a 32-bit Bluetooth UUID.
    fn from_u32(uuid: u32) -> Self;

    /// Parses a Bluetooth UUID from its 4-digit, 8-digit or full 128-bit textual form.
    fn parse_bluetooth(input: &str) -> Result<Self, Error>
    where
        Self: Sized;

    /// Returns `true` if self is a valid 16-bit Bluetooth UUID.
    fn is_u16_uuid(&self) -> bool;

    /// Returns `true` if self is a valid 32-bit Bluetooth UUID.
    fn is_u32_uuid(&self) -> bool;

    /// Returns the 16-bit alias of self, if it has one.
    fn try_to_u16(&self) -> Option<u16>;

    /// Returns the 32-bit alias of self, if it has one.
    fn try_to_u32(&self) -> Option<u32>;

    /// Returns the shortest upper-case textual form of self.
    ///
    /// This is `XXXX` for 16-bit UUIDs, `XXXXXXXX` for 32-bit UUIDs and the
    /// hyphenated 128-bit form for everything else.
    fn to_short_string(&self) -> String;

    /// Returns the hyphenated upper-case 128-bit textual form of self.
    fn to_long_string(&self) -> String;
}

impl BluetoothUuidExt for Uuid {
    fn from_u16(uuid: u16) -> Self {
        bluetooth_uuid_from_u16(uuid)
    }

    fn from_u32(uuid: u32) -> Self {
        bluetooth_uuid_from_u32(uuid)
    }

    fn parse_bluetooth(input: &str) -> Result<Self, Error> {
        if input.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidIdentifier,
                None,
                "empty string is not a Bluetooth UUID",
            ));
        }
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);
        let is_hex = digits.bytes().all(|b| b.is_ascii_hexdigit());
        match digits.len() {
            4 if is_hex => u16::from_str_radix(digits, 16)
                .map(Self::from_u16)
                .map_err(|e| invalid_short(input, e)),
            8 if is_hex => u32::from_str_radix(digits, 16)
                .map(Self::from_u32)
                .map_err(|e| invalid_short(input, e)),
            _ => Uuid::parse_str(input).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidIdentifier,
                    Some(e),
                    format!("`{input}` is not a Bluetooth UUID"),
                )
            }),
        }
    }

    fn is_u16_uuid(&self) -> bool {
        self.as_u128() & BLUETOOTH_BASE_MASK_16 == BLUETOOTH_BASE_UUID
    }

    fn is_u32_uuid(&self) -> bool {
        self.as_u128() & BLUETOOTH_BASE_MASK == BLUETOOTH_BASE_UUID
    }

    fn try_to_u16(&self) -> Option<u16> {
        self.is_u16_uuid().then(|| (self.as_u128() >> 96) as u16)
    }

    fn try_to_u32(&self) -> Option<u32> {
        self.is_u32_uuid().then(|| (self.as_u128() >> 96) as u32)
    }

    fn to_short_string(&self) -> String {
        if let Some(short) = self.try_to_u16() {
            format!("{short:04X}")
        } else if let Some(short) = self.try_to_u32() {
            format!("{short:08X}")
        } else {
            self.to_long_string()
        }
    }

    fn to_long_string(&self) -> String {
        self.hyphenated()
            .encode_upper(&mut Uuid::encode_buffer())
            .to_string()
    }
}

fn invalid_short(input: &str, e: std::num::ParseIntError) -> Error {
    Error::new(
        ErrorKind::InvalidIdentifier,
        None,
        format!("`{input}` is not a short Bluetooth UUID: {e}"),
    )
}

mod private {
    use uuid::Uuid;

    pub trait Sealed {}

    impl Sealed for Uuid {}
}

/// Bluetooth GATT service 16-bit UUIDs.
#[allow(missing_docs)]
pub mod services {
    use uuid::Uuid;

    use super::bluetooth_uuid_from_u16;

    pub const GENERIC_ACCESS: Uuid = bluetooth_uuid_from_u16(0x1800);
    pub const GENERIC_ATTRIBUTE: Uuid = bluetooth_uuid_from_u16(0x1801);
    pub const DEVICE_INFORMATION: Uuid = bluetooth_uuid_from_u16(0x180a);
    pub const HEART_RATE: Uuid = bluetooth_uuid_from_u16(0x180d);
    pub const BATTERY: Uuid = bluetooth_uuid_from_u16(0x180f);
    pub const ENVIRONMENTAL_SENSING: Uuid = bluetooth_uuid_from_u16(0x181a);
}

/// Bluetooth GATT characteristic 16-bit UUIDs.
#[allow(missing_docs)]
pub mod characteristics {
    use uuid::Uuid;

    use super::bluetooth_uuid_from_u16;

    pub const DEVICE_NAME: Uuid = bluetooth_uuid_from_u16(0x2a00);
    pub const BATTERY_LEVEL: Uuid = bluetooth_uuid_from_u16(0x2a19);
    pub const MANUFACTURER_NAME_STRING: Uuid = bluetooth_uuid_from_u16(0x2a29);
    pub const HEART_RATE_MEASUREMENT: Uuid = bluetooth_uuid_from_u16(0x2a37);
    pub const BODY_SENSOR_LOCATION: Uuid = bluetooth_uuid_from_u16(0x2a38);
    pub const TEMPERATURE: Uuid = bluetooth_uuid_from_u16(0x2a6e);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_forms_expand_onto_base_uuid() {
        let uuid = Uuid::parse_bluetooth("180D").unwrap();
        assert_eq!(uuid, services::HEART_RATE);
        assert_eq!(
            uuid,
            Uuid::parse_str("0000180d-0000-1000-8000-00805f9b34fb").unwrap()
        );
        assert_eq!(Uuid::parse_bluetooth("0x180d").unwrap(), uuid);
        assert_eq!(Uuid::parse_bluetooth("0000180d").unwrap(), uuid);
    }

    #[test]
    fn aliases_are_detected() {
        assert_eq!(services::BATTERY.try_to_u16(), Some(0x180f));
        assert_eq!(services::BATTERY.try_to_u32(), Some(0x180f));

        let uuid32 = Uuid::from_u32(0x1234_5678);
        assert!(!uuid32.is_u16_uuid());
        assert_eq!(uuid32.try_to_u32(), Some(0x1234_5678));

        let custom = Uuid::from_u128(0x18EE2EF5_263D_4559_959F_4F9C429F9D11);
        assert!(!custom.is_u32_uuid());
        assert_eq!(custom.try_to_u16(), None);
    }

    #[test]
    fn short_string_forms() {
        assert_eq!(services::HEART_RATE.to_short_string(), "180D");
        assert_eq!(Uuid::from_u32(0xabcd_ef01).to_short_string(), "ABCDEF01");
        let custom = Uuid::from_u128(0x18ee2ef5_263d_4559_959f_4f9c429f9d11);
        assert_eq!(
            custom.to_short_string(),
            "18EE2EF5-263D-4559-959F-4F9C429F9D11"
        );
        assert_eq!(
            services::HEART_RATE.to_long_string(),
            "0000180D-0000-1000-8000-00805F9B34FB"
        );
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for input in ["", "18", "180G", "0x", "not-a-uuid", "180D-"] {
            let err = Uuid::parse_bluetooth(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidIdentifier, "{input:?}");
        }
    }

    #[test]
    fn malformed_long_form_keeps_source() {
        use std::error::Error as _;
        let err = Uuid::parse_bluetooth("0000180d-0000-1000-8000-00805f9b34fz").unwrap_err();
        assert!(err.source().is_some());
    }
}
