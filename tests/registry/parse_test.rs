use serde_json::json;
use stanza_map::{Registry, Schema, StanzaError, parse_document, types};

use crate::utils::{init_logging, jxt_fixture};

#[test]
fn test_parse_builds_registered_root() {
    let fixture = jxt_fixture();
    let xml = fixture
        .registry
        .parse(r#"<jxt xmlns="test" attr="foo"><sub>text</sub></jxt>"#)
        .expect("well formed")
        .expect("registered root");

    assert!(xml.class().ptr_eq(&fixture.jxt));
    assert_eq!(xml.value("attribute"), json!("foo"));
    assert_eq!(xml.value("subText"), json!("text"));
}

#[test]
fn test_parse_unknown_root_is_absent() {
    let fixture = jxt_fixture();
    let result = fixture
        .registry
        .parse(r#"<jxt xmlns="elsewhere"/>"#)
        .expect("well formed");
    assert!(result.is_none());
}

#[test]
fn test_parse_malformed_text() {
    let fixture = jxt_fixture();
    let input = "<jxt xmlns='test'><unclosed></jxt>";
    let error = fixture.registry.parse(input).expect_err("malformed");
    match error {
        StanzaError::Parse { text, .. } => assert_eq!(text, input),
        other => panic!("unexpected error: {other}"),
    }

    assert!(fixture.registry.parse("").is_err());
    assert!(fixture.registry.parse("not xml at all").is_err());
}

#[test]
fn test_parse_as_explicit_class() {
    init_logging();
    let registry = Registry::new();
    let class = registry.define(
        Schema::new("anything", "urn:a").field("id", types::attribute("id", None)),
    );

    let stanza = registry
        .parse_as(r#"<other xmlns="urn:b" id="9"/>"#, &class)
        .expect("well formed");
    assert_eq!(stanza.value("id"), json!("9"));
    assert_eq!(stanza.xml().local_name(), "other");
}

#[test]
fn test_build_from_element() {
    let fixture = jxt_fixture();
    let root = parse_document(r#"<jxt xmlns="test" boolattr="true"/>"#).expect("well formed");
    let xml = fixture.registry.build(root).expect("registered");
    assert_eq!(xml.value("boolAttribute"), json!(true));

    let stray = parse_document(r#"<stray xmlns="test"/>"#).expect("well formed");
    assert!(fixture.registry.build(stray).is_none());
}

#[test]
fn test_serialization_round_trip() {
    let fixture = jxt_fixture();
    let text = r#"<jxt xmlns="test" attr="x"><subjxt>one</subjxt><subjxt>two</subjxt></jxt>"#;
    let xml = fixture.registry.parse(text).expect("well formed").expect("registered");
    assert_eq!(xml.to_string(), text);
    assert_eq!(
        xml.to_json(),
        json!({
            "subJXT": {"text": "two"},
            "attribute": "x",
            "multiSubs": [{"text": "one"}, {"text": "two"}]
        })
    );
}

#[test]
fn test_parse_from_several_threads() {
    let fixture = jxt_fixture();
    let text = r#"<jxt xmlns="test" attr="a"><subjxt>x</subjxt></jxt>"#;

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let registry = fixture.registry.clone();
            std::thread::spawn(move || {
                registry
                    .parse(text)
                    .expect("well formed")
                    .expect("registered")
                    .to_json()
            })
        })
        .collect();

    for worker in workers {
        let projected = worker.join().expect("worker finished");
        assert_eq!(
            projected,
            json!({"subJXT": {"text": "x"}, "attribute": "a", "multiSubs": [{"text": "x"}]})
        );
    }
}
