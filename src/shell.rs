//! Line-oriented terminal front end for the authoring and edit workflows.
//!
//! The prompter only gathers raw strings and hands them to the session, the
//! edit helpers, and the project layout; every rule about what ends up in a
//! probe file lives there. Input is any `BufRead` so tests can script a whole
//! session. End of input behaves like cancelling the current prompt.

use crate::catalog::{Module, ModuleCatalog};
use crate::codec;
use crate::edit::{ProbeEdit, rebuild};
use crate::error::AuthorError;
use crate::layout::ProjectLayout;
use crate::probe::{CONDITION_KEY, Probe};
use crate::session::{
    FormField, NextStep, ProbeDraft, ProbeSession, label_for, reference_tokens_for,
};
use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the add loop and save the resulting probe file.
    ///
    /// Returns the written path, or `None` when the user cancelled before
    /// adding a probe or while naming the file.
    pub fn add_probes(
        &mut self,
        layout: &ProjectLayout,
        catalog: &ModuleCatalog,
    ) -> Result<Option<PathBuf>> {
        let mut session = ProbeSession::new(layout.root());
        while !session.is_done() {
            let Some(module) = self.choose_module(catalog)? else {
                session.cancel();
                break;
            };
            let form = session.start_iteration(module)?;
            writeln!(self.output, "Adding a '{}' probe", form.module)?;

            let Some(name) = self.ask_probe_name()? else {
                session.cancel();
                break;
            };
            let mut draft = ProbeDraft::new(name, module.name());
            for field in &form.fields {
                let Some(value) = self.ask_field(field)? else {
                    session.cancel();
                    break;
                };
                draft.fields.insert(field.key.clone(), value);
            }
            if session.is_done() {
                break;
            }
            if form.wants_file {
                let Some(path) = self.ask("File (path inside the project)")? else {
                    session.cancel();
                    break;
                };
                if !path.is_empty() {
                    draft.file = Some(PathBuf::from(path));
                }
            }
            let Some(condition) = self.ask_field(&form.condition)? else {
                session.cancel();
                break;
            };
            draft.condition = Some(condition);

            let next = self.ask_next_step()?;
            let warnings_before = session.warnings().len();
            let probe = session.commit(draft, next)?;
            for warning in &session.warnings()[warnings_before..] {
                writeln!(self.output, "warning: {warning}")?;
            }
            writeln!(self.output, "Added probe '{}'", probe.name)?;
        }

        let mut probes = session.finish();
        if probes.is_empty() {
            writeln!(self.output, "No probes added; nothing written.")?;
            return Ok(None);
        }
        self.save(layout, &mut probes)
    }

    /// Re-enter every field of the probes in `file` and overwrite it.
    pub fn edit_probes(&mut self, layout: &ProjectLayout, file: &str) -> Result<Option<PathBuf>> {
        let path = resolve_probe_file(layout, file)?;
        let probes = codec::read_probe_file(&path)?;
        if probes.is_empty() {
            writeln!(self.output, "{} contains no probes.", path.display())?;
            return Ok(None);
        }

        let mut edits: Vec<ProbeEdit> = Vec::with_capacity(probes.len());
        for (index, probe) in probes.iter().enumerate() {
            writeln!(
                self.output,
                "Probe {} of {} ({})",
                index + 1,
                probes.len(),
                probe.module_type
            )?;
            let tokens = reference_tokens_for(edits.iter().map(|edit| edit.name.as_str()));
            match self.edit_one(probe, &tokens)? {
                Some(edit) => edits.push(edit),
                None => {
                    writeln!(self.output, "Edit cancelled; {} unchanged.", path.display())?;
                    return Ok(None);
                }
            }
        }

        let (mut rebuilt, warnings) = rebuild(edits, layout.root());
        for warning in &warnings {
            writeln!(self.output, "warning: {warning}")?;
        }
        codec::write_probe_file(&path, &mut rebuilt)
            .with_context(|| format!("overwriting {}", path.display()))?;
        writeln!(self.output, "Updated {}", path.display())?;
        Ok(Some(path))
    }

    fn edit_one(&mut self, probe: &Probe, tokens: &[String]) -> Result<Option<ProbeEdit>> {
        let mut edit = ProbeEdit::from_probe(probe);
        let Some(name) = self.ask_with_default("Probe name", &edit.name)? else {
            return Ok(None);
        };
        edit.name = name;
        for (key, value) in edit.fields.iter_mut() {
            let field = FormField {
                key: key.clone(),
                label: label_for(key),
                choices: tokens.to_vec(),
                default: value.clone(),
            };
            let Some(entered) = self.ask_field(&field)? else {
                return Ok(None);
            };
            *value = entered;
        }
        if let Some(file) = edit.file.clone() {
            let Some(entered) = self.ask_with_default("File", &file)? else {
                return Ok(None);
            };
            edit.file = Some(entered);
        }
        let condition = FormField {
            key: CONDITION_KEY.to_string(),
            label: label_for(CONDITION_KEY),
            choices: tokens.to_vec(),
            default: edit.condition.clone(),
        };
        let Some(entered) = self.ask_field(&condition)? else {
            return Ok(None);
        };
        edit.condition = entered;
        Ok(Some(edit))
    }

    fn save(&mut self, layout: &ProjectLayout, probes: &mut [Probe]) -> Result<Option<PathBuf>> {
        loop {
            let Some(raw_name) = self.ask("Probe file name (blank to discard)")? else {
                writeln!(self.output, "Discarded {} probe(s).", probes.len())?;
                return Ok(None);
            };
            if raw_name.is_empty() {
                writeln!(self.output, "Discarded {} probe(s).", probes.len())?;
                return Ok(None);
            }
            match layout.save_probes(&raw_name, probes) {
                Ok(Some(path)) => {
                    writeln!(self.output, "Wrote {} probe(s) to {}", probes.len(), path.display())?;
                    return Ok(Some(path));
                }
                Ok(None) => return Ok(None),
                Err(err @ AuthorError::InvalidProbeFileName(_)) => {
                    writeln!(self.output, "{err}")?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn choose_module<'c>(&mut self, catalog: &'c ModuleCatalog) -> Result<Option<&'c Module>> {
        let modules: Vec<&Module> = catalog.modules().collect();
        writeln!(self.output, "Modules:")?;
        for (idx, module) in modules.iter().enumerate() {
            writeln!(self.output, "  {}) {}", idx + 1, module.name())?;
        }
        loop {
            let Some(answer) = self.ask("Module (number or name, blank to stop)")? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(None);
            }
            if let Some(module) = pick(&answer, &modules).copied() {
                return Ok(Some(module));
            }
            if let Some(module) = catalog.get(&answer) {
                return Ok(Some(module));
            }
            writeln!(self.output, "Unknown module '{answer}'")?;
        }
    }

    fn ask_probe_name(&mut self) -> Result<Option<String>> {
        loop {
            let Some(name) = self.ask("Probe name")? else {
                return Ok(None);
            };
            if !name.is_empty() {
                return Ok(Some(name));
            }
            writeln!(self.output, "Probe name must not be empty")?;
        }
    }

    /// Ask for one form field. Blank keeps the default and `#N` picks the Nth
    /// listed choice; anything else is taken verbatim.
    fn ask_field(&mut self, field: &FormField) -> Result<Option<String>> {
        if !field.choices.is_empty() {
            let listed: Vec<String> = field
                .choices
                .iter()
                .enumerate()
                .map(|(idx, choice)| format!("#{} {}", idx + 1, choice))
                .collect();
            writeln!(self.output, "  references: {}", listed.join("  "))?;
        }
        let Some(answer) = self.ask_with_default(&field.label, &field.default)? else {
            return Ok(None);
        };
        let chosen = answer
            .strip_prefix('#')
            .and_then(|index| pick(index, &field.choices))
            .cloned();
        Ok(Some(chosen.unwrap_or(answer)))
    }

    fn ask_next_step(&mut self) -> Result<NextStep> {
        loop {
            let Some(answer) = self.ask("[a]dd another probe or [f]inish")? else {
                return Ok(NextStep::Finish);
            };
            match answer.to_lowercase().as_str() {
                "a" | "add" => return Ok(NextStep::AddAnother),
                "f" | "finish" | "" => return Ok(NextStep::Finish),
                _ => writeln!(self.output, "Please answer 'a' or 'f'")?,
            }
        }
    }

    fn ask_with_default(&mut self, label: &str, default: &str) -> Result<Option<String>> {
        let prompt = if default.is_empty() {
            label.to_string()
        } else {
            format!("{label} [{default}]")
        };
        Ok(self.ask(&prompt)?.map(|answer| {
            if answer.is_empty() {
                default.to_string()
            } else {
                answer
            }
        }))
    }

    /// Prompt and read one trimmed line; `None` at end of input.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("reading from terminal")?;
        if read == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

fn pick<'a, T>(answer: &str, items: &'a [T]) -> Option<&'a T> {
    let index: usize = answer.parse().ok()?;
    items.get(index.checked_sub(1)?)
}

/// Accept a bare name, a name with `.json`, or a path to an existing file.
pub fn resolve_probe_file(layout: &ProjectLayout, file: &str) -> Result<PathBuf> {
    let direct = Path::new(file);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }
    let path = layout.probe_file_path(file)?;
    if !path.is_file() {
        bail!("probe file not found: {}", path.display());
    }
    Ok(path)
}

/// Human-readable listing of every probe file and the probes it holds.
pub fn describe_probe_files(layout: &ProjectLayout) -> Result<String> {
    let files = layout.load_probe_files()?;
    if files.is_empty() {
        return Ok(format!("No probe files under {}\n", layout.probe_configs().display()));
    }
    let mut out = String::new();
    for (name, parsed) in files {
        match parsed {
            Ok(probes) => {
                let names: Vec<&str> = probes.iter().map(|p| p.name.as_str()).collect();
                out.push_str(&format!("{name}: {}\n", names.join(", ")));
            }
            Err(err) => out.push_str(&format!("{name}: unreadable ({err})\n")),
        }
    }
    Ok(out)
}

/// Human-readable listing of the module catalog.
pub fn describe_catalog(catalog: &ModuleCatalog) -> String {
    let mut out = String::new();
    for module in catalog.modules() {
        out.push_str(&format!("{}: {}\n", module.name(), module.command()));
        if !module.parameters().is_empty() {
            out.push_str(&format!("  parameters: {}\n", module.parameters().join(", ")));
        }
    }
    out
}

/// Human-readable rendering of one probe list.
pub fn describe_probes(probes: &[Probe]) -> String {
    let mut out = String::new();
    for probe in probes {
        out.push_str(&format!("{} ({})\n", probe.name, probe.module_type));
        for (key, value) in &probe.config {
            out.push_str(&format!("  {key} = {value}\n"));
        }
    }
    out
}
