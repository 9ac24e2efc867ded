#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Sample manifest shared with the unit tests.
pub const SAMPLE_MANIFEST: &str = include_str!("../fixtures/App.pbxproj");

/// Source tree plus manifest on disk, with a `pbxsync.toml` naming it `app`
pub struct TestWorkspace {
    pub temp_dir: TempDir,
    pub source_dir: PathBuf,
    pub manifest: PathBuf,
    pub config_path: PathBuf,
}

impl TestWorkspace {
    /// Workspace whose manifest already references every file on disk
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let source_dir = temp_dir.path().join("App");
        let manifest = source_dir.join("App.xcodeproj/project.pbxproj");
        let config_path = temp_dir.path().join("pbxsync.toml");

        fs::create_dir_all(manifest.parent().expect("manifest has a parent"))?;
        fs::write(&manifest, SAMPLE_MANIFEST)?;
        fs::write(
            &config_path,
            "[core]\ndefault_project = \"app\"\n\n[projects.app]\nsource_dir = \"App\"\nmanifest = \"App/App.xcodeproj/project.pbxproj\"\n",
        )?;

        let ws = Self {
            temp_dir,
            source_dir,
            manifest,
            config_path,
        };
        for file in ["App.swift", "Views/ContentView.swift", "AppTests/AppTests.swift"] {
            ws.create_file(file)?;
        }
        Ok(ws)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn create_file(&self, rel: &str) -> Result<PathBuf> {
        let path = self.source_dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, "import Foundation\n")?;
        Ok(path)
    }

    pub fn manifest_text(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.manifest)?)
    }

    pub fn backup_path(&self) -> PathBuf {
        pbxsync::persist::backup_path(&self.manifest)
    }

    /// `pbxsync --config <workspace config>` isolated from the user's environment
    pub fn cmd(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("pbxsync")?;
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env_remove("PBXSYNC_CONFIG")
            .env_remove("PBXSYNC_LOG")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config_path);
        Ok(cmd)
    }
}
