//! Script-facing projection of Bluetooth LE mutable local GATT services.
//!
//! A [`MutableService`] is a GATT service a program builds before publishing it from the
//! peripheral role. This crate models such services, the [`Peripheral`] context that owns
//! them, and the projection that makes them constructible and inspectable from an embedded
//! scripting environment through a [`Bridge`].
//!
//! The radio stack and the scripting engine are not part of this crate: the host hands
//! attached services to its Bluetooth stack, and converts between its own script values
//! and [`ScriptValue`].
//!
//! ```
//! use ble_service_bridge::{Bridge, MutableService, ScriptValue};
//!
//! let bridge = Bridge::default();
//! let service = bridge
//!     .construct("MutableService", &["180D".into(), true.into()])
//!     .unwrap();
//! assert_eq!(bridge.get(&service, "uuid").unwrap(), ScriptValue::from("180D"));
//! assert_eq!(bridge.get(&service, "peripheral").unwrap(), ScriptValue::Null);
//! # let _ = MutableService::construct("180D", true).unwrap();
//! ```

pub use btuuid::BluetoothUuidExt;
pub use characteristic::MutableCharacteristic;
pub use config::{AttachedMutation, BridgeConfig};
pub use error::{Error, ErrorKind, ScriptException};
pub use peripheral::Peripheral;
pub use script::{Bridge, PropertyDescriptor, ScriptClass, ScriptObject, ScriptValue};
pub use service::{MutableService, Service, ServiceSnapshot};

/// Convenience alias for a result with [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

pub use uuid::Uuid;
pub mod btuuid;
pub mod error;
pub mod script;
mod types;
pub use types::*;

mod characteristic;
mod config;
mod peripheral;
mod service;
