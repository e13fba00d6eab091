//! Deserializable representation of module definition documents.
//!
//! A document maps module names to definitions; only `command` is required and
//! any other field is ignored. `Module` is the parsed, immutable view the
//! authoring session works from.

use crate::catalog::template::{SlotKind, extract_parameters};
use serde::Deserialize;
use std::collections::BTreeMap;

/// One module definition as stored on disk.
#[derive(Clone, Debug, Deserialize)]
pub struct ModuleDefinition {
    pub command: String,
}

/// A whole module definition document.
pub type DefinitionDocument = BTreeMap<String, ModuleDefinition>;

/// A named command template and the parameter slots it declares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    name: String,
    command: String,
    parameters: Vec<String>,
}

impl Module {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            name: name.into(),
            parameters: extract_parameters(&command),
            command,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Declared slots in template order, reserved ones included.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Slots the user fills in as free text.
    pub fn text_slots(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .map(String::as_str)
            .filter(|slot| SlotKind::of(slot) == SlotKind::Text)
    }

    pub fn wants_file(&self) -> bool {
        self.parameters
            .iter()
            .any(|slot| SlotKind::of(slot) == SlotKind::File)
    }
}
