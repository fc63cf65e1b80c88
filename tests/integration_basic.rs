#![cfg(unix)]

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    temp_dir: TempDir,
    exe: PathBuf,
    log: PathBuf,
}

impl Workspace {
    /// Layout with a fake renderer that logs its arguments
    fn new(exit_code: i32) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let log = temp_dir.path().join("calls.log");
        let exe = temp_dir.path().join("fake-aseprite");
        fs::write(
            &exe,
            format!(
                "#!/bin/sh\necho \"$@\" >> '{}'\necho rendered\necho broken >&2\nexit {exit_code}\n",
                log.display()
            ),
        )?;
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755))?;

        fs::create_dir_all(temp_dir.path().join("art/chars"))?;
        fs::create_dir_all(temp_dir.path().join("out"))?;
        fs::write(temp_dir.path().join("art/chars/hero_t.aseprite"), b"x")?;

        Ok(Self { temp_dir, exe, log })
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn cmd(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("asexport")?;
        cmd.env("ASEXPORT_CONFIG_PATH", self.path().join("no-config.toml"))
            .env_remove("ASEXPORT_EXECPATH")
            .env_remove("ASEXPORT_LOG");
        Ok(cmd)
    }

    fn export(&self) -> Result<Command> {
        let mut cmd = self.cmd()?;
        cmd.arg("export")
            .arg("--execpath")
            .arg(&self.exe)
            .arg("--source")
            .arg(self.path().join("art"))
            .arg("--target")
            .arg(self.path().join("out"))
            .arg("--db")
            .arg(self.path().join("mod.db"));
        Ok(cmd)
    }

    fn calls(&self) -> String {
        fs::read_to_string(&self.log).unwrap_or_default()
    }
}

#[test]
fn test_export_invokes_renderer() -> Result<()> {
    let ws = Workspace::new(0)?;

    ws.export()?
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("rendered"))
        .stderr(predicate::str::contains("export:"));

    let calls = ws.calls();
    assert!(calls.contains("-b"));
    assert!(calls.contains("--scale 1 --trim --save-as"));
    assert!(calls.contains("out/art/chars/hero_t/hero-[t={tag}][f={frame}].png"));
    assert!(ws.path().join("out/art/chars/hero_t").is_dir());
    assert!(ws.path().join("mod.db").exists());
    Ok(())
}

#[test]
fn test_second_run_skips_unchanged() -> Result<()> {
    let ws = Workspace::new(0)?;
    ws.export()?.arg("--yes").assert().success();

    ws.export()?
        .assert()
        .success()
        .stderr(predicate::str::contains("was not modified"));

    assert_eq!(ws.calls().lines().count(), 1);
    Ok(())
}

#[test]
fn test_declined_prompt_exits_cleanly() -> Result<()> {
    let ws = Workspace::new(0)?;
    fs::write(ws.path().join("out/keep.png"), b"x")?;

    ws.export()?
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[y/N]"));

    assert!(ws.path().join("out/keep.png").exists());
    assert!(!ws.path().join("mod.db").exists());
    assert!(ws.calls().is_empty());
    Ok(())
}

#[test]
fn test_renderer_failure_is_fatal() -> Result<()> {
    let ws = Workspace::new(3)?;

    ws.export()?
        .arg("--yes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Export failed"))
        .stderr(predicate::str::contains("broken"));

    assert!(!ws.path().join("mod.db").exists());
    Ok(())
}

#[test]
fn test_missing_source_directory() -> Result<()> {
    let ws = Workspace::new(0)?;
    fs::remove_dir_all(ws.path().join("art"))?;

    ws.export()?
        .arg("--yes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source directory does not exist"));
    Ok(())
}

#[test]
fn test_missing_executable() -> Result<()> {
    let ws = Workspace::new(0)?;

    ws.cmd()?
        .arg("export")
        .arg("--source")
        .arg(ws.path().join("art"))
        .arg("--target")
        .arg(ws.path().join("out"))
        .arg("--db")
        .arg(ws.path().join("mod.db"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No executable given"));
    Ok(())
}

#[test]
fn test_executable_from_config() -> Result<()> {
    let ws = Workspace::new(0)?;
    let config = ws.path().join("config.toml");
    fs::write(
        &config,
        format!("[export]\nexecutable = '{}'\n", ws.exe.display()),
    )?;

    ws.cmd()?
        .env("ASEXPORT_CONFIG_PATH", &config)
        .arg("export")
        .arg("--source")
        .arg(ws.path().join("art"))
        .arg("--target")
        .arg(ws.path().join("out"))
        .arg("--db")
        .arg(ws.path().join("mod.db"))
        .arg("--yes")
        .assert()
        .success();

    assert_eq!(ws.calls().lines().count(), 1);
    Ok(())
}

#[test]
fn test_corrupt_manifest_reports_line() -> Result<()> {
    let ws = Workspace::new(0)?;
    fs::write(ws.path().join("mod.db"), "a|b|c\n")?;

    ws.export()?
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
    assert!(ws.calls().is_empty());
    Ok(())
}

#[test]
fn test_status_lists_new_files() -> Result<()> {
    let ws = Workspace::new(0)?;

    ws.cmd()?
        .arg("status")
        .arg("--source")
        .arg(ws.path().join("art"))
        .arg("--target")
        .arg(ws.path().join("out"))
        .arg("--db")
        .arg(ws.path().join("mod.db"))
        .assert()
        .success()
        .stdout(predicate::str::contains("new"))
        .stdout(predicate::str::contains("hero_t.aseprite"))
        .stdout(predicate::str::contains("(trim)"));

    assert!(ws.calls().is_empty());
    Ok(())
}

#[test]
fn test_dry_run_exports_nothing() -> Result<()> {
    let ws = Workspace::new(0)?;

    ws.export()?.arg("--dry-run").assert().success();

    assert!(ws.calls().is_empty());
    assert!(!ws.path().join("mod.db").exists());
    Ok(())
}

#[test]
fn test_completion_generation() -> Result<()> {
    Command::cargo_bin("asexport")?
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("asexport"));
    Ok(())
}
