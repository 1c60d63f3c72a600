//! Projection of the bridged objects into a scripting environment.
//!
//! Every class a script can see is described by a static table of
//! [`PropertyDescriptor`]s, so the set of properties and their access rules can be
//! enumerated without reflection. The scripting runtime converts its own values
//! to and from [`ScriptValue`] and routes constructor calls and property accesses
//! through a [`Bridge`].

use log::debug;
use uuid::Uuid;

use super::btuuid::BluetoothUuidExt;
use super::characteristic::MutableCharacteristic;
use super::config::BridgeConfig;
use super::error::{Error, ErrorKind};
use super::peripheral::Peripheral;
use super::service::{MutableService, Service};
use super::{AttributePermissions, CharacteristicProperties, Result};

/// A value crossing the boundary between the scripting environment and the bridge.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScriptValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<ScriptValue>),
    Object(ScriptObject),
}

/// A host object visible to scripts.
///
/// Two objects compare equal when they are the same native handle; a [`Service`] view
/// and the [`MutableService`] it was taken from are the same object.
#[derive(Debug, Clone)]
pub enum ScriptObject {
    Characteristic(MutableCharacteristic),
    Service(Service),
    MutableService(MutableService),
    Peripheral(Peripheral),
    /// An object of some class this bridge does not know, by class name.
    Foreign(String),
}

impl PartialEq for ScriptObject {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScriptObject::Characteristic(a), ScriptObject::Characteristic(b)) => a == b,
            (ScriptObject::Peripheral(a), ScriptObject::Peripheral(b)) => a == b,
            (ScriptObject::Foreign(_), ScriptObject::Foreign(_)) => false,
            _ => match (self.as_service(), other.as_service()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl ScriptObject {
    /// The script-visible class name of this object.
    pub fn class_name(&self) -> &str {
        match self {
            ScriptObject::Characteristic(_) => MutableCharacteristic::CLASS_NAME,
            ScriptObject::Service(_) => Service::CLASS_NAME,
            ScriptObject::MutableService(_) => MutableService::CLASS_NAME,
            ScriptObject::Peripheral(_) => Peripheral::CLASS_NAME,
            ScriptObject::Foreign(name) => name,
        }
    }

    /// Returns the service this object is, if it satisfies the service capability.
    pub fn as_service(&self) -> Option<&Service> {
        match self {
            ScriptObject::Service(serv) => Some(serv),
            ScriptObject::MutableService(serv) => Some(serv.as_service()),
            _ => None,
        }
    }

    /// Returns the characteristic this object is, if it satisfies the characteristic capability.
    pub fn as_characteristic(&self) -> Option<&MutableCharacteristic> {
        match self {
            ScriptObject::Characteristic(ch) => Some(ch),
            _ => None,
        }
    }
}

impl From<MutableService> for ScriptValue {
    fn from(service: MutableService) -> Self {
        ScriptValue::Object(ScriptObject::MutableService(service))
    }
}

impl From<Service> for ScriptValue {
    fn from(service: Service) -> Self {
        ScriptValue::Object(ScriptObject::Service(service))
    }
}

impl From<MutableCharacteristic> for ScriptValue {
    fn from(characteristic: MutableCharacteristic) -> Self {
        ScriptValue::Object(ScriptObject::Characteristic(characteristic))
    }
}

impl From<Peripheral> for ScriptValue {
    fn from(peripheral: Peripheral) -> Self {
        ScriptValue::Object(ScriptObject::Peripheral(peripheral))
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::String(value.to_string())
    }
}

impl ScriptValue {
    /// Short description of the type of this value, used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Array(_) => "array",
            ScriptValue::Object(obj) => obj.class_name(),
        }
    }
}

/// Reads a property of `T`.
pub type Getter<T> = fn(&T, &BridgeConfig) -> ScriptValue;

/// Writes a property of `T`, validating the value first.
pub type Setter<T> = fn(&T, ScriptValue) -> Result<()>;

/// One entry of a class's property table.
pub struct PropertyDescriptor<T> {
    /// Script-visible property name.
    pub name: &'static str,
    pub get: Getter<T>,
    /// `None` for read-only properties.
    pub set: Option<Setter<T>>,
    /// Error raised when a script writes a read-only property.
    pub denied: ErrorKind,
}

impl<T> PropertyDescriptor<T> {
    /// Whether scripts may assign this property.
    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }
}

/// A native type exposed to scripts as a class.
pub trait ScriptClass: Sized + 'static {
    /// Script-visible class name.
    const CLASS_NAME: &'static str;

    /// The property table of this class.
    fn properties() -> &'static [PropertyDescriptor<Self>];

    /// Looks up a property by its script-visible name.
    fn property(name: &str) -> Result<&'static PropertyDescriptor<Self>> {
        Self::properties()
            .iter()
            .find(|prop| prop.name == name)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::UnknownProperty,
                    None,
                    format!("`{}` has no property `{name}`", Self::CLASS_NAME),
                )
            })
    }

    /// Names of all properties, in table order.
    fn property_names() -> Vec<&'static str> {
        Self::properties().iter().map(|prop| prop.name).collect()
    }

    /// Reads the property `name`.
    fn get_property(&self, name: &str, config: &BridgeConfig) -> Result<ScriptValue> {
        Ok((Self::property(name)?.get)(self, config))
    }

    /// Writes the property `name`.
    fn set_property(&self, name: &str, value: ScriptValue) -> Result<()> {
        let prop = Self::property(name)?;
        match prop.set {
            Some(set) => set(self, value),
            None => Err(Error::new(
                prop.denied,
                None,
                format!("`{}.{name}` is read-only", Self::CLASS_NAME),
            )),
        }
    }
}

fn uuid_value(uuid: Uuid, config: &BridgeConfig) -> ScriptValue {
    if config.uses_short_uuid_strings() {
        ScriptValue::String(uuid.to_short_string())
    } else {
        ScriptValue::String(uuid.to_long_string())
    }
}

fn uuid_from_value(value: &ScriptValue) -> Result<Uuid> {
    match value {
        ScriptValue::String(s) => Uuid::parse_bluetooth(s),
        other => Err(Error::new(
            ErrorKind::InvalidIdentifier,
            None,
            format!("expected a UUID string, got {}", other.type_name()),
        )),
    }
}

fn bool_from_value(value: &ScriptValue, what: &str) -> Result<bool> {
    match value {
        ScriptValue::Bool(b) => Ok(*b),
        other => Err(Error::new(
            ErrorKind::InvalidParameter,
            None,
            format!("`{what}` must be a boolean, got {}", other.type_name()),
        )),
    }
}

fn bits_from_value(value: &ScriptValue, what: &str, known: u32) -> Result<u32> {
    match value {
        ScriptValue::Number(n) if n.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(n) => {
            let bits = *n as u32;
            if bits & !known != 0 {
                return Err(Error::new(
                    ErrorKind::InvalidParameter,
                    None,
                    format!("`{what}` has unknown bits set: {:#x}", bits & !known),
                ));
            }
            Ok(bits)
        }
        ScriptValue::Undefined => Ok(0),
        other => Err(Error::new(
            ErrorKind::InvalidParameter,
            None,
            format!("`{what}` must be an unsigned integer, got {}", other.type_name()),
        )),
    }
}

fn bytes_value(bytes: Option<Vec<u8>>) -> ScriptValue {
    match bytes {
        Some(bytes) => ScriptValue::Array(
            bytes
                .into_iter()
                .map(|b| ScriptValue::Number(f64::from(b)))
                .collect(),
        ),
        None => ScriptValue::Null,
    }
}

fn bytes_from_value(value: &ScriptValue) -> Result<Option<Vec<u8>>> {
    let invalid = |what: &str| {
        Error::new(
            ErrorKind::InvalidParameter,
            None,
            format!("`value` must be null or an array of bytes, got {what}"),
        )
    };
    match value {
        ScriptValue::Null | ScriptValue::Undefined => Ok(None),
        ScriptValue::Array(items) => items
            .iter()
            .map(|item| match item {
                ScriptValue::Number(n) if n.fract() == 0.0 && (0.0..=255.0).contains(n) => {
                    Ok(*n as u8)
                }
                other => Err(invalid(other.type_name())),
            })
            .collect::<Result<Vec<u8>>>()
            .map(Some),
        other => Err(invalid(other.type_name())),
    }
}

/// Collects the elements of an array that all satisfy one capability.
fn collect_capable<T>(
    value: ScriptValue,
    property: &str,
    capability: &str,
    f: impl Fn(&ScriptObject) -> Option<T>,
) -> Result<Vec<T>> {
    let items = match value {
        ScriptValue::Array(items) => items,
        other => {
            return Err(Error::new(
                ErrorKind::InvalidCapability,
                None,
                format!("`{property}` must be an array, got {}", other.type_name()),
            ))
        }
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let found = match item {
                ScriptValue::Object(obj) => f(obj),
                _ => None,
            };
            found.ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidCapability,
                    None,
                    format!(
                        "`{property}[{i}]` is a {}, not a {capability}",
                        item.type_name()
                    ),
                )
            })
        })
        .collect()
}

fn service_uuid<S: AsRef<Service>>(serv: &S, config: &BridgeConfig) -> ScriptValue {
    uuid_value(serv.as_ref().uuid(), config)
}

fn service_is_primary<S: AsRef<Service>>(serv: &S, _: &BridgeConfig) -> ScriptValue {
    ScriptValue::Bool(serv.as_ref().is_primary())
}

fn service_characteristics<S: AsRef<Service>>(serv: &S, _: &BridgeConfig) -> ScriptValue {
    ScriptValue::Array(
        serv.as_ref()
            .characteristics()
            .into_iter()
            .map(Into::into)
            .collect(),
    )
}

fn service_included_services<S: AsRef<Service>>(serv: &S, _: &BridgeConfig) -> ScriptValue {
    ScriptValue::Array(
        serv.as_ref()
            .included_services()
            .into_iter()
            .map(Into::into)
            .collect(),
    )
}

fn service_peripheral<S: AsRef<Service>>(serv: &S, _: &BridgeConfig) -> ScriptValue {
    serv.as_ref().peripheral().map_or(ScriptValue::Null, Into::into)
}

/// Properties of the read-only `Service` class.
pub static SERVICE_PROPERTIES: [PropertyDescriptor<Service>; 5] = [
    PropertyDescriptor {
        name: "characteristics",
        get: service_characteristics::<Service>,
        set: None,
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "includedServices",
        get: service_included_services::<Service>,
        set: None,
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "peripheral",
        get: service_peripheral::<Service>,
        set: None,
        denied: ErrorKind::IllegalRebind,
    },
    PropertyDescriptor {
        name: "isPrimary",
        get: service_is_primary::<Service>,
        set: None,
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "uuid",
        get: service_uuid::<Service>,
        set: None,
        denied: ErrorKind::ReadOnlyProperty,
    },
];

impl ScriptClass for Service {
    const CLASS_NAME: &'static str = "Service";

    fn properties() -> &'static [PropertyDescriptor<Self>] {
        &SERVICE_PROPERTIES
    }
}

// The attachment policy is consulted before the value is converted, so a write to an
// attached service is rejected or ignored whatever the value.

fn set_characteristics(serv: &MutableService, value: ScriptValue) -> Result<()> {
    if !serv.accepts_write("characteristics")? {
        return Ok(());
    }
    let chars = collect_capable(value, "characteristics", "characteristic", |obj| {
        obj.as_characteristic().cloned()
    })?;
    serv.set_characteristics(chars)
}

fn set_included_services(serv: &MutableService, value: ScriptValue) -> Result<()> {
    if !serv.accepts_write("includedServices")? {
        return Ok(());
    }
    let services = collect_capable(value, "includedServices", "service", |obj| {
        obj.as_service().cloned()
    })?;
    serv.set_included_services(services)
}

fn set_is_primary(serv: &MutableService, value: ScriptValue) -> Result<()> {
    if !serv.accepts_write("isPrimary")? {
        return Ok(());
    }
    serv.set_primary(bool_from_value(&value, "isPrimary")?)
}

fn set_uuid(serv: &MutableService, value: ScriptValue) -> Result<()> {
    if !serv.accepts_write("uuid")? {
        return Ok(());
    }
    serv.set_uuid(uuid_from_value(&value)?)
}

/// Properties of the `MutableService` class.
pub static MUTABLE_SERVICE_PROPERTIES: [PropertyDescriptor<MutableService>; 5] = [
    PropertyDescriptor {
        name: "characteristics",
        get: service_characteristics::<MutableService>,
        set: Some(set_characteristics),
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "includedServices",
        get: service_included_services::<MutableService>,
        set: Some(set_included_services),
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "peripheral",
        get: service_peripheral::<MutableService>,
        set: None,
        denied: ErrorKind::IllegalRebind,
    },
    PropertyDescriptor {
        name: "isPrimary",
        get: service_is_primary::<MutableService>,
        set: Some(set_is_primary),
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "uuid",
        get: service_uuid::<MutableService>,
        set: Some(set_uuid),
        denied: ErrorKind::ReadOnlyProperty,
    },
];

impl ScriptClass for MutableService {
    const CLASS_NAME: &'static str = "MutableService";

    fn properties() -> &'static [PropertyDescriptor<Self>] {
        &MUTABLE_SERVICE_PROPERTIES
    }
}

fn characteristic_uuid(ch: &MutableCharacteristic, config: &BridgeConfig) -> ScriptValue {
    uuid_value(ch.uuid(), config)
}

fn characteristic_properties(ch: &MutableCharacteristic, _: &BridgeConfig) -> ScriptValue {
    ScriptValue::Number(f64::from(ch.properties().to_bits()))
}

fn characteristic_permissions(ch: &MutableCharacteristic, _: &BridgeConfig) -> ScriptValue {
    ScriptValue::Number(f64::from(ch.permissions().to_bits()))
}

fn characteristic_value(ch: &MutableCharacteristic, _: &BridgeConfig) -> ScriptValue {
    bytes_value(ch.value())
}

fn set_characteristic_value(ch: &MutableCharacteristic, value: ScriptValue) -> Result<()> {
    ch.set_value(bytes_from_value(&value)?);
    Ok(())
}

/// Properties of the `MutableCharacteristic` class.
pub static CHARACTERISTIC_PROPERTIES: [PropertyDescriptor<MutableCharacteristic>; 4] = [
    PropertyDescriptor {
        name: "uuid",
        get: characteristic_uuid,
        set: None,
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "properties",
        get: characteristic_properties,
        set: None,
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "permissions",
        get: characteristic_permissions,
        set: None,
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "value",
        get: characteristic_value,
        set: Some(set_characteristic_value),
        denied: ErrorKind::ReadOnlyProperty,
    },
];

impl ScriptClass for MutableCharacteristic {
    const CLASS_NAME: &'static str = "MutableCharacteristic";

    fn properties() -> &'static [PropertyDescriptor<Self>] {
        &CHARACTERISTIC_PROPERTIES
    }
}

fn peripheral_name(p: &Peripheral, _: &BridgeConfig) -> ScriptValue {
    ScriptValue::String(p.name().to_string())
}

fn peripheral_identifier(p: &Peripheral, _: &BridgeConfig) -> ScriptValue {
    ScriptValue::Number(p.id().as_u64() as f64)
}

fn peripheral_services(p: &Peripheral, _: &BridgeConfig) -> ScriptValue {
    ScriptValue::Array(p.services().into_iter().map(Into::into).collect())
}

/// Properties of the `Peripheral` class. Peripherals are created by the host, never by scripts.
pub static PERIPHERAL_PROPERTIES: [PropertyDescriptor<Peripheral>; 3] = [
    PropertyDescriptor {
        name: "name",
        get: peripheral_name,
        set: None,
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "identifier",
        get: peripheral_identifier,
        set: None,
        denied: ErrorKind::ReadOnlyProperty,
    },
    PropertyDescriptor {
        name: "services",
        get: peripheral_services,
        set: None,
        denied: ErrorKind::ReadOnlyProperty,
    },
];

impl ScriptClass for Peripheral {
    const CLASS_NAME: &'static str = "Peripheral";

    fn properties() -> &'static [PropertyDescriptor<Self>] {
        &PERIPHERAL_PROPERTIES
    }
}

/// Entry point for a scripting runtime: constructs bridged objects and routes property access.
#[derive(Debug, Clone, Default)]
pub struct Bridge {
    config: BridgeConfig,
}

impl Bridge {
    /// Classes scripts can construct with [`Bridge::construct`].
    pub const CONSTRUCTIBLE_CLASSES: [&'static str; 2] =
        [MutableService::CLASS_NAME, MutableCharacteristic::CLASS_NAME];

    /// Creates a bridge with the given configuration.
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// The configuration of this bridge.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Runs the script constructor of `class` with `args`.
    ///
    /// - `MutableService(uuid, isPrimary)`: `isPrimary` defaults to `false` when omitted.
    /// - `MutableCharacteristic(uuid, properties, value, permissions)`: `properties` and
    ///   `permissions` are bit sets and default to `0`, `value` defaults to `null`.
    ///
    /// Nothing is allocated when an argument is rejected.
    pub fn construct(&self, class: &str, args: &[ScriptValue]) -> Result<ScriptObject> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
        if class == MutableService::CLASS_NAME {
            let uuid = uuid_from_value(&arg(0))?;
            let is_primary = match arg(1) {
                ScriptValue::Undefined => false,
                value => bool_from_value(&value, "isPrimary")?,
            };
            Ok(ScriptObject::MutableService(MutableService::with_config(
                uuid,
                is_primary,
                &self.config,
            )))
        } else if class == MutableCharacteristic::CLASS_NAME {
            let uuid = uuid_from_value(&arg(0))?;
            let properties = CharacteristicProperties::from_bits(bits_from_value(
                &arg(1),
                "properties",
                CharacteristicProperties::ALL_BITS,
            )?);
            let value = bytes_from_value(&arg(2))?;
            let permissions = AttributePermissions::from_bits(bits_from_value(
                &arg(3),
                "permissions",
                AttributePermissions::ALL_BITS,
            )?);
            if self.config.logs_property_access() {
                debug!("constructed characteristic {}", uuid.to_short_string());
            }
            Ok(ScriptObject::Characteristic(MutableCharacteristic::new(
                uuid,
                properties,
                value,
                permissions,
            )))
        } else {
            Err(Error::new(
                ErrorKind::UnknownClass,
                None,
                format!("`{class}` cannot be constructed from scripts"),
            ))
        }
    }

    /// Reads the property `name` of `object`.
    pub fn get(&self, object: &ScriptObject, name: &str) -> Result<ScriptValue> {
        match object {
            ScriptObject::Characteristic(ch) => ch.get_property(name, &self.config),
            ScriptObject::Service(serv) => serv.get_property(name, &self.config),
            ScriptObject::MutableService(serv) => serv.get_property(name, &self.config),
            ScriptObject::Peripheral(p) => p.get_property(name, &self.config),
            ScriptObject::Foreign(class) => Err(foreign(class)),
        }
    }

    /// Writes the property `name` of `object`.
    ///
    /// The write is all-or-nothing: when it fails the object is left unchanged.
    pub fn set(&self, object: &ScriptObject, name: &str, value: ScriptValue) -> Result<()> {
        if self.config.logs_property_access() {
            debug!("{}.{name} = {}", object.class_name(), value.type_name());
        }
        match object {
            ScriptObject::Characteristic(ch) => ch.set_property(name, value),
            ScriptObject::Service(serv) => serv.set_property(name, value),
            ScriptObject::MutableService(serv) => serv.set_property(name, value),
            ScriptObject::Peripheral(p) => p.set_property(name, value),
            ScriptObject::Foreign(class) => Err(foreign(class)),
        }
    }

    /// Names of the properties `object` exposes, in table order.
    pub fn property_names(&self, object: &ScriptObject) -> Vec<&'static str> {
        match object {
            ScriptObject::Characteristic(_) => MutableCharacteristic::property_names(),
            ScriptObject::Service(_) => Service::property_names(),
            ScriptObject::MutableService(_) => MutableService::property_names(),
            ScriptObject::Peripheral(_) => Peripheral::property_names(),
            ScriptObject::Foreign(_) => Vec::new(),
        }
    }
}

fn foreign(class: &str) -> Error {
    Error::new(
        ErrorKind::UnknownClass,
        None,
        format!("`{class}` objects are not bridged"),
    )
}
