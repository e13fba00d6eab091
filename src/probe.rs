//! Probe records as stored in probe files.
//!
//! A probe instantiates one module with concrete parameter values. The
//! `condition` entry gates the probe on other probes; a vacuous condition
//! (missing, empty, or the `None` placeholder offered by the authoring forms)
//! is stripped before a probe reaches disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CONDITION_KEY: &str = "condition";
pub const FILE_KEY: &str = "file";
/// Placeholder the authoring forms use for "no condition".
pub const NO_CONDITION: &str = "None";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Probe {
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: String,
    pub config: BTreeMap<String, String>,
}

impl Probe {
    pub fn new(
        name: impl Into<String>,
        module_type: impl Into<String>,
        config: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            module_type: module_type.into(),
            config,
        }
    }

    /// The condition, if it is not vacuous.
    pub fn condition(&self) -> Option<&str> {
        self.config
            .get(CONDITION_KEY)
            .map(String::as_str)
            .filter(|value| !is_vacuous_condition(value))
    }

    /// Drop a vacuous condition. Returns true when the config changed.
    pub fn normalize_condition(&mut self) -> bool {
        match self.config.get(CONDITION_KEY) {
            Some(value) if is_vacuous_condition(value) => {
                self.config.remove(CONDITION_KEY);
                true
            }
            _ => false,
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.config
            .get(CONDITION_KEY)
            .is_none_or(|value| !is_vacuous_condition(value))
    }

    pub fn reference_token(&self) -> String {
        reference_token(&self.name)
    }
}

/// `name` wrapped as `{name}`, the form later probes use to refer to it.
pub fn reference_token(name: &str) -> String {
    format!("{{{name}}}")
}

fn is_vacuous_condition(value: &str) -> bool {
    value.is_empty() || value == NO_CONDITION
}
