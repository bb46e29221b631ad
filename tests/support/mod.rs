#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub struct BeatDir {
    dir: tempfile::TempDir,
}

impl BeatDir {
    pub fn new() -> TestResult<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_config(&self, yaml: &str) -> TestResult<PathBuf> {
        let path = self.dir.path().join("wmibeat.yml");
        std::fs::write(&path, yaml)?;
        Ok(path)
    }
}

/// Run the built binary with a clean environment for config lookup.
pub fn wmibeat(args: &[&str], cwd: &Path) -> TestResult<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_wmibeat"))
        .args(args)
        .current_dir(cwd)
        .env_remove("WMIBEAT_CONFIG")
        .env("NO_COLOR", "1")
        .output()?;
    Ok(output)
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}
