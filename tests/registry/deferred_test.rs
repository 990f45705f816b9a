use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::json;
use stanza_map::{Registry, Schema, types};

use crate::utils::init_logging;

#[test]
fn test_with_definition_before_define() {
    init_logging();
    let registry = Registry::new();
    let child = registry.define(
        Schema::new("child", "test")
            .element("childel")
            .field("foo", types::attribute("foo", Some("works"))),
    );

    let handle = registry.clone();
    let linked = child.clone();
    registry.with_definition("baseel", "test", move |base| handle.extend(base, &linked));

    let base = registry.define(Schema::new("base", "test").element("baseel"));
    let b = base.new_instance();
    let child = b.child("child").expect("child extension");
    assert_eq!(child.value("foo"), json!("works"));
}

#[test]
fn test_with_definition_fires_once_per_definition() {
    init_logging();
    let registry = Registry::new();
    let calls = Arc::new(AtomicUsize::new(0));

    registry.define(Schema::new("y", "x"));
    let counter = Arc::clone(&calls);
    registry.with_definition("y", "x", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let later = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&later);
    registry.with_definition("z", "x", move |class| {
        assert_eq!(class.qname().to_string(), "x|z");
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(later.load(Ordering::SeqCst), 0);
    registry.define(Schema::new("z", "x"));
    assert_eq!(later.load(Ordering::SeqCst), 1);
    registry.define(Schema::new("unrelated", "x"));
    assert_eq!(later.load(Ordering::SeqCst), 1);
}

#[test]
fn test_tagged_in_registration_order() {
    init_logging();
    let registry = Registry::new();
    registry.define(Schema::new("a", "urn:t").tag("feature"));
    registry.define(Schema::new("b", "urn:t").tags(["feature", "other"]));
    registry.define(Schema::new("c", "urn:t"));

    let names: Vec<String> = registry
        .tagged("feature")
        .iter()
        .map(|class| class.name().to_string())
        .collect();
    assert_eq!(names, ["a", "b"]);
    assert!(registry.tagged("missing").is_empty());
}

#[test]
fn test_with_tag_replays_then_delivers() {
    init_logging();
    let registry = Registry::new();
    registry.define(Schema::new("a", "urn:t").tag("feature"));
    registry.define(Schema::new("b", "urn:t").tag("feature"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    registry.with_tag("feature", move |class| sink.lock().push(class.name().to_string()));
    assert_eq!(*seen.lock(), ["a", "b"]);

    registry.define(Schema::new("c", "urn:t").tag("feature"));
    registry.define(Schema::new("d", "urn:t").tag("unrelated"));
    assert_eq!(*seen.lock(), ["a", "b", "c"]);
}

#[test]
fn test_tag_subscribers_run_after_name_subscribers() {
    init_logging();
    let registry = Registry::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&order);
    registry.with_tag("t", move |_| sink.lock().push("tag"));
    let sink = Arc::clone(&order);
    registry.with_definition("n", "urn:o", move |_| sink.lock().push("name"));

    registry.define(Schema::new("n", "urn:o").tag("t"));
    assert_eq!(*order.lock(), ["name", "tag"]);
}
