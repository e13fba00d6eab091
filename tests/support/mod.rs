use anyhow::{Context, Result, bail};
use saad_probes::{MODULE_CONFIGS_DIR, SAAD_DIR};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

pub const CORE_MODULES: &str = r#"{
    "grep": {"command": "grep {pattern} {file}"},
    "commit_diff": {"command": "git diff {head~1} {HEAD} -- {file}", "description": "changed lines"},
    "complexity": {"command": "python3 complexity.py {file} {threshold} {threshold}"}
}"#;

/// A throwaway project with `SAAD/module_configs` populated from `docs`.
pub fn fixture_project(docs: &[(&str, &str)]) -> Result<TempDir> {
    let temp = TempDir::new().context("allocating fixture project")?;
    let modules = temp.path().join(SAAD_DIR).join(MODULE_CONFIGS_DIR);
    std::fs::create_dir_all(&modules)?;
    for (name, body) in docs {
        std::fs::write(modules.join(name), body)?;
    }
    Ok(temp)
}

pub fn saad_probe_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_saad-probe"))
}

/// Run `saad-probe` in `project` with `stdin` piped in.
pub fn run_saad_probe(project: &Path, args: &[&str], stdin: &str) -> Result<Output> {
    let mut cmd = Command::new(saad_probe_binary());
    cmd.args(args)
        .arg("--project")
        .arg(project)
        .env_remove("SAAD_PROJECT_ROOT")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn {:?}", cmd))?;
    if let Some(mut input) = child.stdin.take() {
        // Pre-flight failures exit before reading stdin.
        if let Err(err) = input.write_all(stdin.as_bytes()) {
            if err.kind() != ErrorKind::BrokenPipe {
                return Err(err.into());
            }
        }
    }
    child.wait_with_output().context("waiting for saad-probe")
}

pub fn run_ok(project: &Path, args: &[&str], stdin: &str) -> Result<Output> {
    let output = run_saad_probe(project, args, stdin)?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "saad-probe {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            args,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}
