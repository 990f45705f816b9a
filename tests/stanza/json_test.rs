use serde_json::json;
use stanza_map::{Registry, Schema, types};

use crate::utils::{init_logging, jxt_fixture};

#[test]
fn test_json_projection_and_reconstruction() {
    let fixture = jxt_fixture();
    let xml = fixture.jxt.new_instance();

    xml.set("attribute", "foo");
    xml.child("subJXT").expect("extension field").set("text", "bar");

    let expected = json!({
        "attribute": "foo",
        "subJXT": {"text": "bar"},
        "multiSubs": [{"text": "bar"}]
    });
    let res = xml.to_json();
    assert_eq!(res, expected);

    let xml2 = fixture.jxt.from_data(&res);
    assert_eq!(xml2.to_json(), expected);
}

#[test]
fn test_empty_instance_projects_to_empty_object() {
    let fixture = jxt_fixture();
    let xml = fixture.jxt.new_instance();
    assert_eq!(xml.to_json(), json!({}));
    assert_eq!(xml.to_string(), r#"<jxt xmlns="test"/>"#);
}

#[test]
fn test_text_round_trip_preserves_projection() {
    let fixture = jxt_fixture();
    let xml = fixture.jxt.from_data(&json!({
        "attribute": "a",
        "boolAttribute": true,
        "subAttribute": "b",
        "subLangText": {"en": "hello", "sv": "hej"},
        "subJXT": {"text": "nested"}
    }));

    let reparsed = fixture
        .registry
        .parse(&xml.to_string())
        .expect("serialized text parses")
        .expect("root is registered");
    assert_eq!(reparsed.to_json(), xml.to_json());
}

#[test]
fn test_falsy_values_are_omitted() {
    init_logging();
    let registry = Registry::new();
    let class = registry.define(
        Schema::new("flags", "urn:flags")
            .field("on", types::bool_attribute("on"))
            .field("label", types::attribute("label", None))
            .field("level", types::number_attribute("level", false, None)),
    );

    let stanza = class.from_data(&json!({"on": false, "label": "", "level": 0}));
    assert_eq!(stanza.to_json(), json!({"level": 0}));

    stanza.set("on", true);
    assert_eq!(stanza.to_json(), json!({"on": true, "level": 0}));
}

#[test]
fn test_internal_fields_are_not_projected() {
    init_logging();
    let registry = Registry::new();
    let class = registry.define(
        Schema::new("item", "urn:item")
            .field("id", types::attribute("id", None))
            .field("_raw", types::text()),
    );

    let stanza = class.from_data(&json!({"id": "1", "_raw": "payload"}));
    assert_eq!(stanza.value("_raw"), json!("payload"));
    assert_eq!(stanza.to_json(), json!({"id": "1"}));
}
