//! Module catalog wiring.
//!
//! Module definition documents under `SAAD/module_configs` describe command
//! templates; this module parses them into `Module` values and merges them
//! into one `ModuleCatalog` keyed by module name.

pub mod index;
pub mod model;
pub mod template;

pub use index::{ModuleCatalog, ModuleDocument};
pub use model::{DefinitionDocument, Module, ModuleDefinition};
pub use template::{FILE_SLOT, SlotKind, extract_parameters};
