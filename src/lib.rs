//! Shared library for authoring SAAD probe files.
//!
//! Module definition documents under `SAAD/module_configs` describe command
//! templates with `{parameter}` slots. A `ProbeSession` turns user input into
//! probes that instantiate those modules, and the codec writes them as a JSON
//! array under `SAAD/probe_configs` for the instrumentation runner. Public
//! items here are the contract the `saad-probe` binary and any other front end
//! build on; none of them depend on a particular UI.

pub mod catalog;
pub mod codec;
pub mod edit;
pub mod error;
pub mod layout;
pub mod probe;
mod schema_loader;
pub mod session;
pub mod shell;

pub use catalog::{
    Module, ModuleCatalog, ModuleDefinition, ModuleDocument, SlotKind, extract_parameters,
};
pub use codec::{deserialize, read_probe_file, serialize, write_probe_file};
pub use edit::{ProbeEdit, rebuild};
pub use error::{AuthorError, SessionWarning};
pub use layout::{
    MODULE_CONFIGS_DIR, PROBE_CONFIGS_DIR, PROJECT_ROOT_ENV, ProjectLayout, SAAD_DIR,
    find_project_root, normalize_probe_file_name, relativize,
};
pub use probe::{CONDITION_KEY, FILE_KEY, NO_CONDITION, Probe, reference_token};
pub use session::{
    FormField, NextStep, ParameterForm, ProbeDraft, ProbeSession, SessionState,
};
pub use shell::Prompter;
