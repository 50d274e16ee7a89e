//! Structured configuration files.
//!
//! A configuration file replaces hand-written setup code: it names the
//! pipeline definition, lists the validations as tagged entries and carries
//! the settings for existence lookups.

pub mod schema;
pub mod loader;

pub use schema::{AttributeSpec, ConfigDocument, FilterSpec, ValidationSpec, SUPPORTED_VERSIONS};
pub use loader::{discover, read_document, LoadedConfiguration};
