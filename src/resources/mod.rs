//! Kasm object kinds and their registration
//!
//! Each kind module defines the desired-state struct and the field
//! mapping to and from the Kasm wire model. [`build_registry`] wires them
//! to one shared API client.

pub mod api;
pub mod cast_config;
pub mod connection_info;
pub mod image;
pub mod registry;

#[cfg(test)]
pub mod fake;

use declarative::{Controller, Lookup, LookupPolicy, Registry};
use kasmkit::Client;

use api::KasmApi;
use cast_config::CastConfigKind;
use connection_info::ConnectionInfoKind;
use image::ImageKind;
use registry::RegistryKind;

/// A registered kind as shown by `kasmctl kinds`
pub struct KindInfo {
    pub name: &'static str,
    pub data_source: bool,
    pub description: &'static str,
}

/// Every kind [`build_registry`] registers, in registration order.
pub const CATALOG: &[KindInfo] = &[
    KindInfo {
        name: "image",
        data_source: false,
        description: "Workspace image (deleted from the admin UI only)",
    },
    KindInfo {
        name: "cast_config",
        data_source: false,
        description: "Casting configuration published at /#/cast/<key>",
    },
    KindInfo {
        name: "registry",
        data_source: false,
        description: "Workspace registry (created asynchronously)",
    },
    KindInfo {
        name: "connection_info",
        data_source: true,
        description: "Connection details of a running session",
    },
];

/// Register every controller and data source against `client`.
pub fn build_registry(client: &Client, lookup: LookupPolicy) -> Registry {
    let api = KasmApi::new(client.clone());
    let mut registry = Registry::new();

    registry
        .register_resource(Controller::<ImageKind, _>::new(api.clone()))
        .register_resource(Controller::<CastConfigKind, _>::new(api.clone()))
        .register_resource(
            Controller::<RegistryKind, _>::new(api.clone()).with_lookup_policy(lookup),
        )
        .register_data_source(Lookup::<ConnectionInfoKind, _>::new(api));

    registry
}
