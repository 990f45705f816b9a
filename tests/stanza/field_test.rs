use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use stanza_map::{FieldValue, Registry, Schema, SchemaClass, XML_NS, types};

use crate::utils::{init_logging, jxt_fixture};

fn kitchen_sink() -> (Registry, SchemaClass) {
    init_logging();
    let registry = Registry::new();
    let class = registry.define(
        Schema::new("sink", "urn:sink")
            .prefix("ext", "urn:ext")
            .field("named", types::attribute("named", Some("fallback")))
            .field("foreign", types::attribute_ns("urn:ext", "foreign", None))
            .field("count", types::number_attribute("count", false, None))
            .field("ratio", types::number_attribute("ratio", true, None))
            .field("priority", types::number_sub("urn:sink", "priority", false, Some(7.into())))
            .field("size", types::number_sub_attribute("urn:sink", "info", "size", false, None))
            .field("secure", types::bool_sub_attribute("urn:sink", "info", "secure"))
            .field("stamp", types::date_attribute("stamp", false))
            .field("created", types::date_attribute("created", true))
            .field("delay", types::date_sub("urn:sink", "delay", false))
            .field("expires", types::date_sub_attribute("urn:sink", "info", "expires", false))
            .field("lang", types::lang_attribute())
            .field("payload", types::b64_text())
            .field("uris", types::multi_sub_attribute("urn:sink", "uri", "href"))
            .field("condition", types::enum_sub("urn:sink", &["ok", "busy", "gone"])),
    );
    (registry, class)
}

#[test]
fn test_basic_fields_round_trip() {
    let fixture = jxt_fixture();
    let xml = fixture.jxt.new_instance();

    xml.set("attribute", "foo");
    assert_eq!(xml.value("attribute"), json!("foo"));

    xml.set("boolAttribute", true);
    assert_eq!(xml.value("boolAttribute"), json!(true));
    xml.set("boolAttribute", false);
    assert_eq!(xml.value("boolAttribute"), json!(false));
    assert!(xml.xml().attr("boolattr").is_none());

    xml.set("subAttribute", "foo");
    assert_eq!(xml.value("subAttribute"), json!("foo"));

    xml.set("boolSub", true);
    assert_eq!(xml.value("boolSub"), json!(true));

    xml.set("subText", "foo");
    assert_eq!(xml.value("subText"), json!("foo"));

    xml.set("multiSubText", json!(["foo", "bar"]));
    assert_eq!(xml.value("multiSubText"), json!(["foo", "bar"]));

    xml.set("subLangText", json!({"en": "foo", "sv": "bar"}));
    assert_eq!(xml.value("subLangText"), json!({"en": "foo", "sv": "bar"}));

    let sub = fixture.sub.new_instance();
    sub.set("text", "foo");
    assert_eq!(sub.value("text"), json!("foo"));
}

#[test]
fn test_multi_sub_text_splits_lines() {
    let fixture = jxt_fixture();
    let xml = fixture.jxt.new_instance();

    xml.set("multiSubText", "one\ntwo");
    assert_eq!(xml.value("multiSubText"), json!(["one", "two"]));

    xml.set("multiSubText", json!([]));
    assert_eq!(xml.value("multiSubText"), json!([]));
    assert!(xml.xml().find("test", "sub").is_empty());
}

#[test]
fn test_attribute_defaults_and_removal() {
    let (_registry, class) = kitchen_sink();
    let stanza = class.new_instance();

    assert_eq!(stanza.value("named"), json!("fallback"));
    stanza.set("named", "given");
    assert_eq!(stanza.value("named"), json!("given"));
    stanza.set("named", "");
    assert!(stanza.xml().attr("named").is_none());
    assert_eq!(stanza.value("named"), json!("fallback"));
}

#[test]
fn test_namespaced_attribute_uses_declared_prefix() {
    let (_registry, class) = kitchen_sink();
    let stanza = class.new_instance();

    stanza.set("foreign", "x");
    assert_eq!(stanza.xml().attr("ext:foreign").as_deref(), Some("x"));
    assert_eq!(stanza.value("foreign"), json!("x"));
}

#[test]
fn test_number_fields() {
    let (_registry, class) = kitchen_sink();
    let stanza = class.new_instance();

    assert_eq!(stanza.value("count"), Value::Null);
    stanza.set("count", 42);
    assert_eq!(stanza.value("count"), json!(42));

    stanza.set("ratio", 42.2);
    assert_eq!(stanza.get("ratio").and_then(|v| v.as_f64()), Some(42.2));

    stanza.xml().set_attr("count", "12abc");
    assert_eq!(stanza.value("count"), json!(12));
    stanza.xml().set_attr("count", "abc");
    assert_eq!(stanza.value("count"), Value::Null);

    assert_eq!(stanza.value("priority"), json!(7));
    stanza.set("priority", 3);
    assert_eq!(stanza.value("priority"), json!(3));

    stanza.set("size", 1024);
    assert_eq!(stanza.value("size"), json!(1024));
}

#[test]
fn test_bool_sub_attribute() {
    let (_registry, class) = kitchen_sink();
    let stanza = class.new_instance();

    assert_eq!(stanza.value("secure"), json!(false));
    stanza.set("secure", true);
    assert_eq!(stanza.value("secure"), json!(true));
    stanza.set("secure", false);
    assert_eq!(stanza.value("secure"), json!(false));
}

#[test]
fn test_date_fields() {
    let (_registry, class) = kitchen_sink();
    let stanza = class.new_instance();
    let date = Utc.with_ymd_and_hms(2021, 6, 1, 12, 30, 0).unwrap();

    assert!(stanza.get("stamp").is_some_and(|v| v.is_absent()));
    assert!(stanza.get("created").and_then(|v| v.as_date()).is_some());

    stanza.set("stamp", "2021-06-01T12:30:00Z");
    assert_eq!(stanza.get("stamp").and_then(|v| v.as_date()), Some(date));

    stanza.set_date("delay", date);
    assert_eq!(stanza.get("delay").and_then(|v| v.as_date()), Some(date));
    assert_eq!(stanza.value("delay"), json!("2021-06-01T12:30:00.000Z"));

    stanza.set("expires", date.timestamp_millis());
    assert_eq!(stanza.get("expires").and_then(|v| v.as_date()), Some(date));

    // Falsy input leaves the stored value alone
    stanza.set("stamp", Value::Null);
    assert_eq!(stanza.get("stamp").and_then(|v| v.as_date()), Some(date));

    stanza.xml().set_attr("stamp", "not a date");
    assert!(stanza.get("stamp").is_some_and(|v| v.is_absent()));
}

#[test]
fn test_lang_and_base64() {
    let (_registry, class) = kitchen_sink();
    let stanza = class.new_instance();

    stanza.set("lang", "en");
    assert_eq!(stanza.xml().attr_ns(XML_NS, "lang").as_deref(), Some("en"));
    assert_eq!(stanza.value("lang"), json!("en"));

    stanza.set("payload", "hello");
    assert_eq!(stanza.xml().text(), "aGVsbG8=");
    assert_eq!(stanza.value("payload"), json!("hello"));

    stanza.set("payload", "");
    assert_eq!(stanza.xml().text(), "=");
    assert_eq!(stanza.value("payload"), json!(""));

    stanza.set_bytes("payload", &[0xff, 0x00]);
    assert!(matches!(stanza.get("payload"), Some(FieldValue::Bytes(bytes)) if bytes == [0xff, 0x00]));
}

#[test]
fn test_multi_sub_attribute() {
    let (_registry, class) = kitchen_sink();
    let stanza = class.new_instance();

    stanza.set("uris", json!(["a:1", "b:2"]));
    assert_eq!(stanza.value("uris"), json!(["a:1", "b:2"]));
    assert_eq!(stanza.xml().find("urn:sink", "uri").len(), 2);
}

#[test]
fn test_enum_sub() {
    let (_registry, class) = kitchen_sink();
    let stanza = class.new_instance();

    assert_eq!(stanza.value("condition"), json!(""));
    stanza.set("condition", "busy");
    assert_eq!(stanza.value("condition"), json!("busy"));

    stanza.set("condition", "gone");
    assert_eq!(stanza.value("condition"), json!("gone"));
    assert!(stanza.xml().find("urn:sink", "busy").is_empty());

    stanza.set("condition", "gone");
    assert_eq!(stanza.xml().find("urn:sink", "gone").len(), 1);

    stanza.set("condition", Value::Null);
    assert_eq!(stanza.value("condition"), json!(""));
}

#[test]
fn test_custom_field() {
    init_logging();
    let registry = Registry::new();
    let class = registry.define(Schema::new("pair", "urn:pair").field(
        "joined",
        types::field(
            |stanza| {
                let first = stanza.xml().attr("a").unwrap_or_default();
                let second = stanza.xml().attr("b").unwrap_or_default();
                FieldValue::Json(json!(format!("{first}-{second}")))
            },
            |stanza, value| {
                if let Some((first, second)) = value.as_str().and_then(|v| v.split_once('-')) {
                    stanza.xml().set_attr("a", first);
                    stanza.xml().set_attr("b", second);
                }
            },
        ),
    ));

    let stanza = class.from_data(&json!({"joined": "x-y"}));
    assert_eq!(stanza.to_string(), r#"<pair xmlns="urn:pair" a="x" b="y"/>"#);
    assert_eq!(stanza.value("joined"), json!("x-y"));
}
