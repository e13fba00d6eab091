//! Embedded JSON Schemas for the two on-disk contracts.
//!
//! Module definition documents and probe files are checked against the
//! schemas under `schema/` before typed parsing so that error messages point
//! at the offending JSON path instead of a serde field name. Schemas are
//! compiled once per process.

use jsonschema::JSONSchema;
use serde_json::Value;
use std::sync::OnceLock;

const MODULE_DEFINITION_SCHEMA: &str =
    include_str!("../schema/module_definition.schema.json");
const PROBE_FILE_SCHEMA: &str = include_str!("../schema/probe_file.schema.json");

/// Which embedded contract a document is checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Contract {
    ModuleDefinition,
    ProbeFile,
}

impl Contract {
    fn name(self) -> &'static str {
        match self {
            Contract::ModuleDefinition => "module_definition.schema.json",
            Contract::ProbeFile => "probe_file.schema.json",
        }
    }

    fn raw(self) -> &'static str {
        match self {
            Contract::ModuleDefinition => MODULE_DEFINITION_SCHEMA,
            Contract::ProbeFile => PROBE_FILE_SCHEMA,
        }
    }

    fn compiled(self) -> &'static Result<JSONSchema, String> {
        static MODULE: OnceLock<Result<JSONSchema, String>> = OnceLock::new();
        static PROBE: OnceLock<Result<JSONSchema, String>> = OnceLock::new();
        let cell = match self {
            Contract::ModuleDefinition => &MODULE,
            Contract::ProbeFile => &PROBE,
        };
        cell.get_or_init(|| compile(self.name(), self.raw()))
    }
}

fn compile(name: &str, raw: &str) -> Result<JSONSchema, String> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| format!("parsing schema {name}: {err}"))?;
    JSONSchema::compile(&value).map_err(|err| format!("compiling schema {name}: {err}"))
}

/// Validate `instance` against `contract`.
///
/// On failure the returned string joins every validation error, one per line,
/// each prefixed with the JSON pointer of the failing value.
pub(crate) fn validate(contract: Contract, instance: &Value) -> Result<(), String> {
    let schema = contract.compiled().as_ref().map_err(Clone::clone)?;
    if let Err(errors) = schema.validate(instance) {
        let details = errors
            .map(|err| {
                let pointer = err.instance_path.to_string();
                if pointer.is_empty() {
                    err.to_string()
                } else {
                    format!("{pointer}: {err}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        return Err(details);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_schemas_compile() {
        assert!(Contract::ModuleDefinition.compiled().is_ok());
        assert!(Contract::ProbeFile.compiled().is_ok());
    }

    #[test]
    fn module_definition_requires_command_string() {
        let ok = json!({"grep": {"command": "grep {pattern}", "description": "search"}});
        assert!(validate(Contract::ModuleDefinition, &ok).is_ok());

        let missing = json!({"grep": {"cmd": "grep"}});
        let err = validate(Contract::ModuleDefinition, &missing).unwrap_err();
        assert!(err.contains("/grep"), "unexpected error: {err}");

        let wrong_type = json!({"grep": {"command": 7}});
        assert!(validate(Contract::ModuleDefinition, &wrong_type).is_err());
    }

    #[test]
    fn probe_file_rejects_extra_fields_and_numbers() {
        let ok = json!([{"name": "p1", "type": "grep", "config": {"pattern": "foo"}}]);
        assert!(validate(Contract::ProbeFile, &ok).is_ok());

        let extra = json!([{"name": "p1", "type": "grep", "config": {}, "id": 3}]);
        assert!(validate(Contract::ProbeFile, &extra).is_err());

        let numeric = json!([{"name": "p1", "type": "grep", "config": {"depth": 3}}]);
        let err = validate(Contract::ProbeFile, &numeric).unwrap_err();
        assert!(err.contains("/0/config/depth"), "unexpected error: {err}");
    }
}
