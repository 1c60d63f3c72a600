use ble_service_bridge::btuuid::services;
use ble_service_bridge::{
    AttachedMutation, BluetoothUuidExt, Bridge, BridgeConfig, ErrorKind, MutableService,
    Peripheral, ScriptObject, ScriptValue, Service, Uuid,
};
use proptest::prelude::*;

fn construct(bridge: &Bridge, uuid: &str, primary: bool) -> Result<ScriptObject, ErrorKind> {
    bridge
        .construct("MutableService", &[uuid.into(), primary.into()])
        .map_err(|e| e.kind())
}

fn uuid_of(bridge: &Bridge, obj: &ScriptObject) -> String {
    match bridge.get(obj, "uuid").unwrap() {
        ScriptValue::String(s) => s,
        other => panic!("uuid is not a string: {other:?}"),
    }
}

fn spellings() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<u16>().prop_map(|v| format!("{v:04X}")),
        any::<u16>().prop_map(|v| format!("0x{v:04x}")),
        any::<u32>().prop_map(|v| format!("{v:08x}")),
        any::<u16>().prop_map(|v| Uuid::from_u16(v).hyphenated().to_string()),
        any::<u128>().prop_map(|v| Uuid::from_u128(v).hyphenated().to_string()),
        any::<u128>().prop_map(|v| Uuid::from_u128(v).simple().to_string().to_uppercase()),
    ]
}

proptest! {
    #[test]
    fn canonical_uuid_is_a_fixed_point(u in spellings(), primary in any::<bool>()) {
        let bridge = Bridge::default();
        let first = construct(&bridge, &u, primary).unwrap();
        let canonical = uuid_of(&bridge, &first);
        let second = construct(&bridge, &canonical, primary).unwrap();
        prop_assert_eq!(uuid_of(&bridge, &second), canonical);
        prop_assert_eq!(
            first.as_service().unwrap().uuid(),
            second.as_service().unwrap().uuid()
        );
    }

    #[test]
    fn fresh_handles_are_empty(u in spellings(), primary in any::<bool>()) {
        let bridge = Bridge::default();
        let s = construct(&bridge, &u, primary).unwrap();
        prop_assert_eq!(bridge.get(&s, "characteristics").unwrap(), ScriptValue::Array(vec![]));
        prop_assert_eq!(bridge.get(&s, "includedServices").unwrap(), ScriptValue::Array(vec![]));
        prop_assert_eq!(bridge.get(&s, "peripheral").unwrap(), ScriptValue::Null);
        prop_assert_eq!(bridge.get(&s, "isPrimary").unwrap(), ScriptValue::Bool(primary));
    }
}

#[test]
fn unparsable_identifier_yields_no_handle() {
    let bridge = Bridge::default();
    assert_eq!(
        construct(&bridge, "", true).unwrap_err(),
        ErrorKind::InvalidIdentifier
    );
    assert_eq!(
        construct(&bridge, "heart-rate", true).unwrap_err(),
        ErrorKind::InvalidIdentifier
    );
}

#[test]
fn publish_heart_rate_service() {
    let bridge = Bridge::default();
    let peripheral = Peripheral::new("chest strap");

    let hr = construct(&bridge, "180D", true).unwrap();
    let battery = construct(&bridge, "180F", false).unwrap();
    let measurement = bridge
        .construct(
            "MutableCharacteristic",
            &["2A37".into(), ScriptValue::Number(16.0)],
        )
        .unwrap();
    let location = bridge
        .construct(
            "MutableCharacteristic",
            &[
                "2A38".into(),
                ScriptValue::Number(2.0),
                ScriptValue::Array(vec![ScriptValue::Number(1.0)]),
                ScriptValue::Number(1.0),
            ],
        )
        .unwrap();

    bridge
        .set(
            &hr,
            "characteristics",
            ScriptValue::Array(vec![
                ScriptValue::Object(measurement.clone()),
                ScriptValue::Object(location.clone()),
            ]),
        )
        .unwrap();
    bridge
        .set(
            &hr,
            "includedServices",
            ScriptValue::Array(vec![ScriptValue::Object(battery.clone())]),
        )
        .unwrap();

    let ScriptObject::MutableService(hr_service) = &hr else {
        unreachable!()
    };
    peripheral.add_service(hr_service).unwrap();

    assert_eq!(
        bridge.get(&hr, "peripheral").unwrap(),
        ScriptValue::from(peripheral.clone())
    );
    let err = bridge
        .set(&hr, "characteristics", ScriptValue::Array(vec![]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalRebind);
    assert_eq!(hr_service.characteristics().len(), 2);

    // the included service itself is not attached and stays mutable
    bridge.set(&battery, "isPrimary", true.into()).unwrap();

    let snapshot = hr_service.snapshot();
    assert_eq!(snapshot.uuid, services::HEART_RATE);
    assert_eq!(snapshot.included_services, vec![services::BATTERY]);
    assert_eq!(snapshot.peripheral, Some(peripheral.id()));
    assert_eq!(
        bridge.get(&ScriptObject::Peripheral(peripheral), "services").unwrap(),
        ScriptValue::Array(vec![ScriptValue::Object(hr)])
    );
}

#[test]
fn plain_service_code_accepts_mutable_services() {
    fn describe(service: &Service) -> (Uuid, bool, Option<Peripheral>) {
        (service.uuid(), service.is_primary(), service.peripheral())
    }

    let peripheral = Peripheral::new("sensor");
    let service = MutableService::construct("180F", true).unwrap();
    peripheral.add_service(&service).unwrap();
    let view = Service::from(&service);
    assert_eq!(describe(&service), describe(&view));
    assert_eq!(describe(&service).2, Some(peripheral));
}

#[test]
fn ignore_policy_discards_writes_after_attach() {
    let bridge = Bridge::new(BridgeConfig::default().attached_mutation(AttachedMutation::Ignore));
    let peripheral = Peripheral::new("sensor");
    let s = construct(&bridge, "180D", true).unwrap();
    let ScriptObject::MutableService(service) = &s else {
        unreachable!()
    };
    peripheral.add_service(service).unwrap();
    bridge.set(&s, "uuid", "180F".into()).unwrap();
    assert_eq!(bridge.get(&s, "uuid").unwrap(), ScriptValue::from("180D"));
    assert_eq!(service.uuid(), Uuid::from_u16(0x180d));
}
