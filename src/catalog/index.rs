//! Merged view over every module definition document in a project.
//!
//! Each document is validated against the embedded module schema before typed
//! parsing. Documents merge last-write-wins; `from_documents` pins the merge
//! order to the lexical order of document origins so a directory listing never
//! decides which definition survives a name collision.

use crate::catalog::model::{DefinitionDocument, Module};
use crate::error::AuthorError;
use crate::schema_loader::{Contract, validate};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Raw module definition text plus where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleDocument {
    pub origin: String,
    pub text: String,
}

impl ModuleDocument {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }
}

/// Module name to parsed module, iterated in lexical name order.
#[derive(Clone, Debug, Default)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, Module>,
}

impl ModuleCatalog {
    /// Merge raw document bodies in iteration order; later bodies win.
    pub fn discover<I, S>(definition_texts: I) -> Result<Self, AuthorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::default();
        for (idx, text) in definition_texts.into_iter().enumerate() {
            catalog.merge(&format!("document #{}", idx + 1), text.as_ref())?;
        }
        Ok(catalog)
    }

    /// Merge documents sorted by origin, whatever order they arrive in.
    pub fn from_documents(mut documents: Vec<ModuleDocument>) -> Result<Self, AuthorError> {
        documents.sort_by(|a, b| a.origin.cmp(&b.origin));
        let mut catalog = Self::default();
        for document in &documents {
            catalog.merge(&document.origin, &document.text)?;
        }
        Ok(catalog)
    }

    fn merge(&mut self, origin: &str, text: &str) -> Result<(), AuthorError> {
        for (name, module) in parse_document(origin, text)? {
            if self.modules.insert(name.clone(), module).is_some() {
                debug!(module = %name, origin, "module definition overridden");
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Look up a module, failing with `UnknownModule` when absent.
    pub fn require(&self, name: &str) -> Result<&Module, AuthorError> {
        self.get(name)
            .ok_or_else(|| AuthorError::UnknownModule(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn parse_document(origin: &str, text: &str) -> Result<Vec<(String, Module)>, AuthorError> {
    let malformed = |detail: String| AuthorError::MalformedCatalog {
        origin: origin.to_string(),
        detail,
    };
    let value: Value = serde_json::from_str(text).map_err(|err| malformed(err.to_string()))?;
    validate(Contract::ModuleDefinition, &value).map_err(malformed)?;
    let document: DefinitionDocument =
        serde_json::from_value(value).map_err(|err| malformed(err.to_string()))?;
    Ok(document
        .into_iter()
        .map(|(name, definition)| {
            let module = Module::new(name.clone(), definition.command);
            (name, module)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_merges_documents_last_write_wins() {
        let catalog = ModuleCatalog::discover([
            r#"{"grep": {"command": "grep {pattern} {file}"}, "ls": {"command": "ls"}}"#,
            r#"{"grep": {"command": "rg {pattern}"}}"#,
        ])
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["grep", "ls"]);
        assert_eq!(catalog.get("grep").unwrap().parameters(), ["pattern"]);
        assert!(catalog.get("ls").unwrap().parameters().is_empty());
    }

    #[test]
    fn from_documents_merges_in_origin_order() {
        let docs = vec![
            ModuleDocument::new("b.json", r#"{"grep": {"command": "rg {b}"}}"#),
            ModuleDocument::new("a.json", r#"{"grep": {"command": "grep {a}"}}"#),
        ];
        let catalog = ModuleCatalog::from_documents(docs).unwrap();
        assert_eq!(catalog.get("grep").unwrap().command(), "rg {b}");
    }

    #[test]
    fn invalid_json_names_the_origin() {
        let docs = vec![ModuleDocument::new("broken.json", "{not json")];
        let err = ModuleCatalog::from_documents(docs).unwrap_err();
        match err {
            AuthorError::MalformedCatalog { origin, .. } => assert_eq!(origin, "broken.json"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn wrong_shape_is_malformed() {
        for body in [
            r#"["grep"]"#,
            r#"{"grep": "grep {pattern}"}"#,
            r#"{"grep": {"description": "no command"}}"#,
            r#"{"grep": {"command": ["grep"]}}"#,
        ] {
            let err = ModuleCatalog::discover([body]).unwrap_err();
            assert!(
                matches!(err, AuthorError::MalformedCatalog { .. }),
                "body {body} gave {err:?}"
            );
        }
    }

    #[test]
    fn require_reports_unknown_module() {
        let catalog = ModuleCatalog::discover([r#"{"ls": {"command": "ls"}}"#]).unwrap();
        assert!(catalog.require("ls").is_ok());
        assert!(matches!(
            catalog.require("grep"),
            Err(AuthorError::UnknownModule(name)) if name == "grep"
        ));
    }
}
