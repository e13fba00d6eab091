//! Rebuilding probe files from edited fields.
//!
//! Editing never patches a file in place: every probe is turned into a
//! `ProbeEdit`, the caller changes whatever it likes, and the whole list is
//! rebuilt and written back.

use crate::catalog::SlotKind;
use crate::error::SessionWarning;
use crate::layout::relativize;
use crate::probe::{CONDITION_KEY, FILE_KEY, NO_CONDITION, Probe};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeEdit {
    pub name: String,
    pub module_type: String,
    /// Text parameters in key order.
    pub fields: Vec<(String, String)>,
    /// Reserved-slot values found in the file, written back as they were.
    pub preserved: Vec<(String, String)>,
    pub file: Option<String>,
    pub condition: String,
}

impl ProbeEdit {
    pub fn from_probe(probe: &Probe) -> Self {
        let mut fields = Vec::new();
        let mut preserved = Vec::new();
        let mut file = None;
        for (key, value) in &probe.config {
            if key == CONDITION_KEY {
                continue;
            }
            match SlotKind::of(key) {
                SlotKind::Text => fields.push((key.clone(), value.clone())),
                SlotKind::Reserved => preserved.push((key.clone(), value.clone())),
                // `file` sorts after `File`, so the lowercase spelling wins.
                SlotKind::File => file = Some(value.clone()),
            }
        }
        Self {
            name: probe.name.clone(),
            module_type: probe.module_type.clone(),
            fields,
            preserved,
            file,
            condition: probe
                .condition()
                .unwrap_or(NO_CONDITION)
                .to_string(),
        }
    }

    /// Rebuild the probe. Absolute file paths are made relative to
    /// `project_root`; one that falls outside it is dropped and reported.
    pub fn into_probe(self, project_root: &Path) -> (Probe, Option<SessionWarning>) {
        let mut config: BTreeMap<String, String> =
            self.preserved.into_iter().chain(self.fields).collect();
        let mut warning = None;
        if let Some(file) = self.file.map(|f| f.trim().to_string()).filter(|f| !f.is_empty()) {
            let path = Path::new(&file);
            if path.is_absolute() {
                match relativize(project_root, path) {
                    Ok(relative) => {
                        config.insert(FILE_KEY.to_string(), relative);
                    }
                    Err(err) => {
                        let dropped = SessionWarning::FileDropped {
                            probe: self.name.clone(),
                            reason: err.to_string(),
                        };
                        warn!("{dropped}");
                        warning = Some(dropped);
                    }
                }
            } else {
                config.insert(FILE_KEY.to_string(), file);
            }
        }
        config.insert(CONDITION_KEY.to_string(), self.condition.trim().to_string());
        (Probe::new(self.name.trim(), self.module_type, config), warning)
    }
}

/// Rebuild a whole probe list, preserving order.
pub fn rebuild(edits: Vec<ProbeEdit>, project_root: &Path) -> (Vec<Probe>, Vec<SessionWarning>) {
    let mut probes = Vec::with_capacity(edits.len());
    let mut warnings = Vec::new();
    for edit in edits {
        let (probe, warning) = edit.into_probe(project_root);
        probes.push(probe);
        warnings.extend(warning);
    }
    (probes, warnings)
}
