use stanza_map::{Registry, Schema, SchemaClass, types};

/// Initialise logging once for the whole test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A registry with a top-level `test|jxt` schema and a nested `test|subjxt`
/// bound to it both singly (`subJXT`) and as a list (`multiSubs`)
pub struct JxtFixture {
    pub registry: Registry,
    pub jxt: SchemaClass,
    pub sub: SchemaClass,
}

#[must_use]
pub fn jxt_fixture() -> JxtFixture {
    init_logging();
    let registry = Registry::new();

    let jxt = registry.define(
        Schema::new("jxtTest", "test")
            .element("jxt")
            .top_level(true)
            .field("attribute", types::attribute("attr", None))
            .field("boolAttribute", types::bool_attribute("boolattr"))
            .field("boolSub", types::bool_sub("test", "boolsub"))
            .field("subAttribute", types::sub_attribute("test", "subattr", "attr"))
            .field("subText", types::sub_text("test", "sub"))
            .field("multiSubText", types::multi_sub_text("test", "sub"))
            .field("subLangText", types::sub_lang_text("test", "sublang", "")),
    );

    let sub = registry.define(
        Schema::new("subJXT", "test")
            .element("subjxt")
            .field("text", types::text()),
    );

    registry.extend_multi(&jxt, &sub, "multiSubs", false);

    JxtFixture { registry, jxt, sub }
}
