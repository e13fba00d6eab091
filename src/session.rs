//! The probe authoring loop.
//!
//! A `ProbeSession` is created per probe file. Each iteration starts from a
//! module (yielding the `ParameterForm` to fill in) and ends with a commit
//! that either continues the loop or finishes it. Probes committed while the
//! loop continues become reference tokens (`{name}`) that later forms offer as
//! values, so a probe can refer to the ones authored before it.

use crate::catalog::{Module, SlotKind};
use crate::error::{AuthorError, SessionWarning};
use crate::layout::relativize;
use crate::probe::{CONDITION_KEY, FILE_KEY, NO_CONDITION, Probe, reference_token};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Collecting,
    Done,
}

/// What the user chose at the end of an iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextStep {
    AddAnother,
    Finish,
}

/// One value to collect from the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormField {
    pub key: String,
    pub label: String,
    /// Suggested values; the user may still type anything.
    pub choices: Vec<String>,
    pub default: String,
}

/// The fields a caller must collect for one probe of `module`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterForm {
    pub module: String,
    /// Text slots in template order. Reserved and file slots never appear.
    pub fields: Vec<FormField>,
    /// The module declares a `file` slot; collect a path for it.
    pub wants_file: bool,
    pub condition: FormField,
}

/// Raw values collected for one probe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeDraft {
    pub name: String,
    pub module_type: String,
    pub fields: BTreeMap<String, String>,
    pub file: Option<PathBuf>,
    pub condition: Option<String>,
}

impl ProbeDraft {
    pub fn new(name: impl Into<String>, module_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module_type: module_type.into(),
            ..Self::default()
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

#[derive(Debug)]
pub struct ProbeSession {
    project_root: PathBuf,
    state: SessionState,
    active: Option<ParameterForm>,
    probes: Vec<Probe>,
    reference_tokens: Vec<String>,
    warnings: Vec<SessionWarning>,
}

impl ProbeSession {
    /// Start an empty session. File paths are stored relative to `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            state: SessionState::Collecting,
            active: None,
            probes: Vec::new(),
            reference_tokens: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == SessionState::Done
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Tokens offered to the next probe, in creation order.
    pub fn reference_tokens(&self) -> &[String] {
        &self.reference_tokens
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    pub fn warnings(&self) -> &[SessionWarning] {
        &self.warnings
    }

    /// Begin collecting values for one probe of `module`.
    pub fn start_iteration(&mut self, module: &Module) -> Result<ParameterForm, AuthorError> {
        self.ensure_collecting()?;
        let fields = module
            .text_slots()
            .map(|slot| FormField {
                key: slot.to_string(),
                label: label_for(slot),
                choices: self.reference_tokens.clone(),
                default: String::new(),
            })
            .collect();
        let form = ParameterForm {
            module: module.name().to_string(),
            fields,
            wants_file: module.wants_file(),
            condition: FormField {
                key: CONDITION_KEY.to_string(),
                label: label_for(CONDITION_KEY),
                choices: self.reference_tokens.clone(),
                default: NO_CONDITION.to_string(),
            },
        };
        debug!(module = module.name(), fields = form.fields.len(), "iteration started");
        self.active = Some(form.clone());
        Ok(form)
    }

    /// Record a probe built from `draft` and apply the user's `next` choice.
    ///
    /// A file path that cannot be stored relative to the project root is
    /// dropped with a warning instead of failing the commit.
    pub fn commit(&mut self, draft: ProbeDraft, next: NextStep) -> Result<Probe, AuthorError> {
        self.ensure_collecting()?;
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(AuthorError::InvalidProbeName);
        }

        // Without a matching form the module's slots are unknown, so any text
        // key is accepted and a file is stored when given.
        let form = self
            .active
            .take()
            .filter(|form| form.module == draft.module_type);
        let mut config = BTreeMap::new();
        if let Some(form) = &form {
            for field in &form.fields {
                config.insert(field.key.clone(), field.default.clone());
            }
        }
        for (key, value) in draft.fields {
            let accepted = match &form {
                Some(form) => form.fields.iter().any(|field| field.key == key),
                None => SlotKind::of(&key) == SlotKind::Text && key != CONDITION_KEY,
            };
            if accepted {
                config.insert(key, value);
            } else {
                debug!(probe = %name, key = %key, "ignoring value for undeclared slot");
            }
        }

        let wants_file = form.as_ref().is_none_or(|form| form.wants_file);
        if let Some(raw) = draft.file.filter(|path| !path.as_os_str().is_empty()) {
            if !wants_file {
                debug!(probe = %name, "module has no file slot, ignoring file");
            } else {
                match relativize(&self.project_root, &raw) {
                    Ok(relative) => {
                        config.insert(FILE_KEY.to_string(), relative);
                    }
                    Err(err) => self.warn(SessionWarning::FileDropped {
                        probe: name.clone(),
                        reason: err.to_string(),
                    }),
                }
            }
        }

        let condition = draft
            .condition
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| NO_CONDITION.to_string());
        config.insert(CONDITION_KEY.to_string(), condition);

        if self.probes.iter().any(|probe| probe.name == name) {
            self.warn(SessionWarning::DuplicateProbeName(name.clone()));
        }

        let probe = Probe::new(name, draft.module_type, config);
        info!(probe = %probe.name, module = %probe.module_type, "probe committed");
        self.probes.push(probe.clone());

        match next {
            NextStep::AddAnother => {
                let token = probe.reference_token();
                if !self.reference_tokens.contains(&token) {
                    self.reference_tokens.push(token);
                }
            }
            NextStep::Finish => self.state = SessionState::Done,
        }
        Ok(probe)
    }

    /// Abandon the loop. Probes already committed are kept.
    pub fn cancel(&mut self) {
        self.active = None;
        self.state = SessionState::Done;
    }

    /// Every committed probe in creation order. Does not reset the session.
    pub fn finish(&self) -> Vec<Probe> {
        self.probes.clone()
    }

    fn ensure_collecting(&self) -> Result<(), AuthorError> {
        match self.state {
            SessionState::Collecting => Ok(()),
            SessionState::Done => Err(AuthorError::SessionClosed),
        }
    }

    fn warn(&mut self, warning: SessionWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Display label for a slot: first character upper-cased.
pub fn label_for(slot: &str) -> String {
    let mut chars = slot.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Distinct reference tokens for `names`, in order.
pub fn reference_tokens_for<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for name in names {
        let token = reference_token(name.trim());
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grep() -> Module {
        Module::new("grep", "grep {pattern} {file}")
    }

    #[test]
    fn reserved_slots_never_reach_the_form() {
        let module = Module::new("log", "git log {HEAD} {Head~1} {custom} {file}");
        let mut session = ProbeSession::new("/work/project");
        let form = session.start_iteration(&module).unwrap();
        let keys: Vec<&str> = form.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["custom"]);
        assert!(form.wants_file);
        assert_eq!(form.fields[0].label, "Custom");
        assert_eq!(form.condition.default, NO_CONDITION);
    }

    #[test]
    fn commit_builds_the_documented_probe() {
        let mut session = ProbeSession::new("/work/project");
        session.start_iteration(&grep()).unwrap();
        let probe = session
            .commit(
                ProbeDraft::new("p1", "grep")
                    .field("pattern", "foo")
                    .file("/work/project/src/a.txt")
                    .condition(NO_CONDITION),
                NextStep::Finish,
            )
            .unwrap();
        assert_eq!(probe.config["pattern"], "foo");
        assert_eq!(probe.config[FILE_KEY], "src/a.txt");
        assert_eq!(probe.config[CONDITION_KEY], NO_CONDITION);
        assert!(session.is_done());
        assert_eq!(session.finish(), vec![probe]);
    }

    #[test]
    fn tokens_are_offered_only_to_later_probes() {
        let mut session = ProbeSession::new("/work/project");
        let first = session.start_iteration(&grep()).unwrap();
        assert!(first.fields[0].choices.is_empty());
        session
            .commit(
                ProbeDraft::new("p1", "grep").field("pattern", "a"),
                NextStep::AddAnother,
            )
            .unwrap();
        assert_eq!(session.reference_tokens(), ["{p1}"]);

        let second = session.start_iteration(&grep()).unwrap();
        assert_eq!(second.fields[0].choices, vec!["{p1}"]);
        assert_eq!(second.condition.choices, vec!["{p1}"]);
        session
            .commit(
                ProbeDraft::new("p2", "grep").condition("{p1}"),
                NextStep::Finish,
            )
            .unwrap();
        assert_eq!(session.reference_tokens(), ["{p1}"]);
        assert_eq!(session.probes().len(), 2);
        assert_eq!(session.probes()[1].config["pattern"], "");
        assert_eq!(session.probes()[1].config[CONDITION_KEY], "{p1}");
    }

    #[test]
    fn outside_file_is_dropped_with_warning() {
        let mut session = ProbeSession::new("/work/project");
        session.start_iteration(&grep()).unwrap();
        let probe = session
            .commit(
                ProbeDraft::new("p1", "grep").file("/etc/passwd"),
                NextStep::AddAnother,
            )
            .unwrap();
        assert!(!probe.config.contains_key(FILE_KEY));
        assert!(matches!(
            session.warnings(),
            [SessionWarning::FileDropped { probe, .. }] if probe == "p1"
        ));
        assert!(!session.is_done());
    }

    #[test]
    fn reserved_and_special_keys_are_not_taken_from_fields() {
        let mut session = ProbeSession::new("/work/project");
        let probe = session
            .commit(
                ProbeDraft::new("p1", "log")
                    .field("head", "abc")
                    .field("file", "/etc/passwd")
                    .field("condition", "{x}")
                    .field("custom", "v"),
                NextStep::Finish,
            )
            .unwrap();
        let keys: Vec<&str> = probe.config.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![CONDITION_KEY, "custom"]);
        assert_eq!(probe.config[CONDITION_KEY], NO_CONDITION);
    }

    #[test]
    fn only_declared_slots_reach_config() {
        let module = Module::new("ls", "ls {dir}");
        let mut session = ProbeSession::new("/work/project");
        let form = session.start_iteration(&module).unwrap();
        assert!(!form.wants_file);
        let probe = session
            .commit(
                ProbeDraft::new("p1", "ls")
                    .field("dir", "src")
                    .field("bogus", "x")
                    .file("/work/project/src/a.txt"),
                NextStep::Finish,
            )
            .unwrap();
        let keys: Vec<&str> = probe.config.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![CONDITION_KEY, "dir"]);
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn duplicate_names_warn_but_commit() {
        let mut session = ProbeSession::new("/work/project");
        for _ in 0..2 {
            session
                .commit(ProbeDraft::new("p1", "ls"), NextStep::AddAnother)
                .unwrap();
        }
        assert_eq!(session.probes().len(), 2);
        assert_eq!(session.reference_tokens(), ["{p1}"]);
        assert_eq!(
            session.warnings(),
            [SessionWarning::DuplicateProbeName("p1".to_string())]
        );
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut session = ProbeSession::new("/work/project");
        assert!(matches!(
            session.commit(ProbeDraft::new("  ", "ls"), NextStep::Finish),
            Err(AuthorError::InvalidProbeName)
        ));
        assert!(!session.is_done());
        assert!(session.probes().is_empty());
    }

    #[test]
    fn closed_session_rejects_more_work() {
        let mut session = ProbeSession::new("/work/project");
        session.cancel();
        assert!(session.finish().is_empty());
        assert!(matches!(
            session.start_iteration(&grep()),
            Err(AuthorError::SessionClosed)
        ));
        assert!(matches!(
            session.commit(ProbeDraft::new("p1", "grep"), NextStep::Finish),
            Err(AuthorError::SessionClosed)
        ));
    }

    #[test]
    fn finish_is_idempotent() {
        let mut session = ProbeSession::new("/work/project");
        session
            .commit(ProbeDraft::new("a", "ls"), NextStep::AddAnother)
            .unwrap();
        session
            .commit(ProbeDraft::new("b", "ls"), NextStep::Finish)
            .unwrap();
        let first = session.finish();
        assert_eq!(first, session.finish());
        let names: Vec<&str> = first.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn reference_tokens_for_skips_duplicate_names() {
        assert!(reference_tokens_for(Vec::<&str>::new()).is_empty());
        assert_eq!(reference_tokens_for(["a", " a "]), vec!["{a}"]);
        assert_eq!(reference_tokens_for(["a", "a", "b"]), vec!["{a}", "{b}"]);
    }

    #[test]
    fn labels_capitalize_first_letter() {
        assert_eq!(label_for("pattern"), "Pattern");
        assert_eq!(label_for(""), "");
    }
}
