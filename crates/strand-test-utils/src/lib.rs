//! Test fixtures for Strand development.
//!
//! Provides scripted task payloads and a prebuilt registry that wires
//! them up next to the built-in control-flow variants. See [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Arc;

use strand_exec::{Runtime, RuntimeConfig, TaskRegistry};

pub use fixtures::*;

/// Registry holding the control-flow variants and every fixture type.
pub fn fixture_registry() -> Arc<TaskRegistry> {
    let registry = TaskRegistry::builder()
        .with_control_flow()
        .register(fixtures::scripted_decl())
        .register(fixtures::counter_decl())
        .register(fixtures::dependency_decl())
        .register(fixtures::sorted_group_decl())
        .register(fixtures::value_decl())
        .register(fixtures::spawner_decl())
        .build()
        .expect("fixture registry is valid");
    Arc::new(registry)
}

/// Runtime over [`fixture_registry`] with a small initial store.
pub fn runtime(shadow: bool) -> Runtime {
    let mut config = RuntimeConfig {
        shadow,
        ..RuntimeConfig::default()
    };
    config.store.initial_capacity = 1024;
    Runtime::new(config, fixture_registry()).expect("fixture runtime config is valid")
}
