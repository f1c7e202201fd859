//! Catalogues embedded at compile time.

/// Field type catalogue.
pub const FIELD_TYPES: &str = include_str!("../data/field_types.toml");

/// Action catalogue.
pub const ACTIONS: &str = include_str!("../data/actions.toml");
