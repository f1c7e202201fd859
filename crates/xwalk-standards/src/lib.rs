#![deny(unsafe_code)]

pub mod catalogue;
pub mod embedded;
pub mod error;
pub mod hash;
pub mod loaders;
pub mod paths;

pub use crate::error::CatalogueError;
pub use crate::loaders::{
    Registries, load_actions, load_actions_str, load_default_actions, load_default_field_types,
    load_default_registries, load_field_types, load_field_types_str, load_registries_from,
};
pub use crate::paths::CATALOGUE_ENV_VAR;
