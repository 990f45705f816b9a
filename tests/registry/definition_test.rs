use serde_json::json;
use stanza_map::{Registry, RegistryConfig, Schema, StanzaError, schema, types};

use crate::utils::{init_logging, jxt_fixture};

#[test]
fn test_define_registers_qualified_name() {
    let fixture = jxt_fixture();
    let found = fixture
        .registry
        .get_definition("jxt", "test")
        .expect("jxt is defined");
    assert!(found.ptr_eq(&fixture.jxt));
    assert!(found.is_top_level());
    assert_eq!(found.name(), "jxtTest");
    assert_eq!(found.qname().to_string(), "test|jxt");
}

#[test]
fn test_require_definition_reports_missing() {
    let fixture = jxt_fixture();
    let error = fixture
        .registry
        .require_definition("missing", "test")
        .expect_err("not defined");
    assert!(matches!(error, StanzaError::MissingDefinition { .. }));
    assert_eq!(
        error.to_string(),
        r#"Could not find definition for <missing xmlns="test" />"#
    );
}

#[test]
fn test_extensions_lookup() {
    let fixture = jxt_fixture();
    let extensions = fixture.registry.get_extensions("jxt", "test");
    assert_eq!(extensions.keys().collect::<Vec<_>>(), ["subJXT"]);
    assert!(fixture.registry.get_extensions("nothing", "test").is_empty());
}

#[test]
fn test_add_field_after_definition() {
    let fixture = jxt_fixture();
    fixture
        .registry
        .add(&fixture.jxt, "lang", types::lang_attribute());

    let xml = fixture.jxt.from_data(&json!({"lang": "fr"}));
    assert_eq!(xml.value("lang"), json!("fr"));
    assert_eq!(xml.to_string(), r#"<jxt xmlns="test" xml:lang="fr"/>"#);
}

#[test]
fn test_registries_are_independent() {
    init_logging();
    let first = Registry::new();
    let second = Registry::with_config(RegistryConfig {
        warn_on_redefinition: false,
        ..RegistryConfig::default()
    });

    first.define(Schema::new("only", "urn:first"));
    assert!(first.get_definition("only", "urn:first").is_some());
    assert!(second.get_definition("only", "urn:first").is_none());
    assert!(!second.config().warn_on_redefinition);
}

#[test]
fn test_schema_macro() {
    init_logging();
    let registry = Registry::new();
    let message = registry.define(schema! {
        name: "message",
        namespace: "jabber:client",
        top_level: true,
        event_name: "message",
        tags: ["content", "routable"],
        fields: {
            "to" => attribute("to", None),
            "body" => sub_text("jabber:client", "body"),
        }
    });

    assert_eq!(message.element(), "message");
    assert_eq!(message.event_name(), Some("message"));
    assert_eq!(message.tags(), ["content", "routable"]);
    assert_eq!(registry.tagged("routable").len(), 1);

    let stanza = message.from_data(&json!({"to": "a@b", "body": "hi"}));
    assert_eq!(
        stanza.to_string(),
        r#"<message xmlns="jabber:client" to="a@b"><body>hi</body></message>"#
    );
}

#[test]
fn test_use_plugin_is_idempotent() {
    fn register(registry: &Registry) {
        registry.define(Schema::new("plugged", "urn:plugin").tag("plugins"));
    }

    init_logging();
    let registry = Registry::new();
    registry.use_plugin(register).use_plugin(register);
    assert_eq!(registry.tagged("plugins").len(), 1);
}
