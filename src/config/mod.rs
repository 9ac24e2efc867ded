pub mod parser;
pub mod validator;

use crate::error::SyncError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,

    /// Named projects, each a source directory paired with its manifest
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Project used when none is named on the command line
    #[serde(default)]
    pub default_project: Option<String>,
    #[serde(default = "default_color")]
    pub color: bool,
    /// Maximum characters of diff output; unlimited when absent
    #[serde(default)]
    pub diff_limit: Option<usize>,
}

/// How files on disk are matched against existing file references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// A file counts as present when any reference has the same leaf name
    #[default]
    Filename,
    /// A file counts as present when a reference resolves to the same relative path
    Path,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Table key of the project, filled in on load
    #[serde(skip)]
    pub name: String,
    pub source_dir: PathBuf,
    pub manifest: PathBuf,
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_file_type")]
    pub file_type: String,
    /// Group standing for the source directory, when it is not `mainGroup`
    #[serde(default)]
    pub source_group: Option<String>,
    /// Synchronized root group whose presence hands the project to Xcode
    #[serde(default)]
    pub synchronized_group: Option<String>,
    /// Target whose Sources phase receives new files
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_project: None,
            color: true,
            diff_limit: None,
        }
    }
}

impl ProjectConfig {
    /// Project with default scan settings.
    pub fn new(name: impl Into<String>, source_dir: PathBuf, manifest: PathBuf) -> Self {
        Self {
            name: name.into(),
            source_dir,
            manifest,
            skip_dirs: default_skip_dirs(),
            extensions: default_extensions(),
            file_type: default_file_type(),
            source_group: None,
            synchronized_group: None,
            target: None,
            match_mode: MatchMode::default(),
        }
    }

    /// Ad-hoc project named after the manifest's `.xcodeproj` bundle.
    #[must_use]
    pub fn ad_hoc(source_dir: PathBuf, manifest: PathBuf) -> Self {
        let name = manifest
            .ancestors()
            .find_map(|p| {
                p.extension()
                    .filter(|ext| *ext == "xcodeproj")
                    .and(p.file_stem())
            })
            .map_or_else(|| "project".to_string(), |s| s.to_string_lossy().into_owned());
        Self::new(name, source_dir, manifest)
    }

    /// Checks that the source directory and manifest exist.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the missing path.
    pub fn check_paths(&self) -> std::result::Result<(), SyncError> {
        if !self.source_dir.is_dir() {
            return Err(SyncError::config(
                &self.name,
                format!("source directory not found: {}", self.source_dir.display()),
            ));
        }
        if !self.manifest.is_file() {
            return Err(SyncError::config(
                &self.name,
                format!("manifest not found: {}", self.manifest.display()),
            ));
        }
        Ok(())
    }

    fn resolve_against(&mut self, base: &Path) {
        let source_dir = crate::utils::expand_tilde(&self.source_dir);
        let manifest = crate::utils::expand_tilde(&self.manifest);
        self.source_dir = base.join(source_dir);
        self.manifest = base.join(manifest);
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// Project names are filled in from their table keys, and relative paths
    /// are resolved against the directory holding the file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is missing, is not valid TOML,
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SyncError::config(
                "",
                format!("configuration file not found: {}", path.display()),
            )
            .into());
        }

        let mut config = parser::parse_config_file(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for (name, project) in &mut config.projects {
            project.name.clone_from(name);
            project.resolve_against(base);
        }
        Ok(config)
    }

    /// Configuration holding a single project, which is also the default.
    #[must_use]
    pub fn single(project: ProjectConfig) -> Self {
        let mut config = Self::default();
        config.core.default_project = Some(project.name.clone());
        config.projects.insert(project.name.clone(), project);
        config
    }

    /// Get a project by name
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown names.
    pub fn project(&self, name: &str) -> std::result::Result<&ProjectConfig, SyncError> {
        self.projects.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.projects.keys().map(String::as_str).collect();
            SyncError::config(
                name,
                format!("unknown project (known: {})", known.join(", ")),
            )
        })
    }

    /// Projects selected by the command line.
    ///
    /// `all` selects every project; otherwise the named ones, falling back to
    /// `core.default_project`, and finally to the only project if there is
    /// exactly one.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown names or when nothing can be
    /// selected.
    pub fn select(
        &self,
        names: &[String],
        all: bool,
    ) -> std::result::Result<Vec<&ProjectConfig>, SyncError> {
        if all {
            return Ok(self.projects.values().collect());
        }
        if !names.is_empty() {
            return names.iter().map(|n| self.project(n)).collect();
        }
        if let Some(default) = &self.core.default_project {
            return Ok(vec![self.project(default)?]);
        }
        if self.projects.len() == 1 {
            return Ok(self.projects.values().collect());
        }
        Err(SyncError::config(
            "",
            "no project selected: name one, pass --all, or set core.default_project",
        ))
    }
}

// Default functions for serde
const fn default_color() -> bool {
    true
}

fn default_skip_dirs() -> Vec<String> {
    ["build", ".build", "DerivedData", "Packages", ".swiftpm", "xcshareddata"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_extensions() -> Vec<String> {
    vec!["swift".to_string()]
}

fn default_file_type() -> String {
    "sourcecode.swift".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[core]
default_project = "app"

[projects.app]
source_dir = "App"
manifest = "App/App.xcodeproj/project.pbxproj"
source_group = "App"

[projects.widget]
source_dir = "/abs/Widget"
manifest = "/abs/Widget/Widget.xcodeproj/project.pbxproj"
skip_dirs = ["Generated"]
extensions = ["swift", "m"]
match_mode = "path"
target = "Widget"
"#;

    fn write_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("pbxsync.toml");
        fs::write(&path, CONFIG).unwrap();
        path
    }

    #[test]
    fn test_load_fills_names_and_resolves_paths() -> Result<()> {
        let dir = TempDir::new()?;
        let config = Config::load(&write_config(&dir))?;

        let app = config.project("app")?;
        assert_eq!(app.name, "app");
        assert_eq!(app.source_dir, dir.path().join("App"));
        assert_eq!(
            app.manifest,
            dir.path().join("App/App.xcodeproj/project.pbxproj")
        );
        assert_eq!(app.skip_dirs, default_skip_dirs());
        assert_eq!(app.file_type, "sourcecode.swift");
        assert_eq!(app.match_mode, MatchMode::Filename);

        let widget = config.project("widget")?;
        assert_eq!(widget.source_dir, PathBuf::from("/abs/Widget"));
        assert_eq!(widget.skip_dirs, vec!["Generated"]);
        assert_eq!(widget.match_mode, MatchMode::Path);
        assert_eq!(widget.target.as_deref(), Some("Widget"));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::load(Path::new("/nonexistent/pbxsync.toml")).unwrap_err();
        assert_eq!(crate::error::exit_code_for(&err), 2);
    }

    #[test]
    fn test_select() -> Result<()> {
        let dir = TempDir::new()?;
        let config = Config::load(&write_config(&dir))?;

        let default: Vec<_> = config.select(&[], false)?.iter().map(|p| p.name.clone()).collect();
        assert_eq!(default, vec!["app"]);

        let all: Vec<_> = config.select(&[], true)?.iter().map(|p| p.name.clone()).collect();
        assert_eq!(all, vec!["app", "widget"]);

        let named = config.select(&["widget".to_string()], false)?;
        assert_eq!(named[0].name, "widget");

        assert!(config.select(&["nope".to_string()], false).is_err());
        Ok(())
    }

    #[test]
    fn test_select_without_default() {
        let mut config = Config::default();
        assert!(config.select(&[], false).is_err());

        let project = ProjectConfig::new("only", PathBuf::from("."), PathBuf::from("p"));
        config.projects.insert("only".to_string(), project);
        assert_eq!(config.select(&[], false).unwrap().len(), 1);
    }

    #[test]
    fn test_ad_hoc_name_from_bundle() {
        let project = ProjectConfig::ad_hoc(
            PathBuf::from("macOS/Talkie"),
            PathBuf::from("macOS/Talkie/Talkie.xcodeproj/project.pbxproj"),
        );
        assert_eq!(project.name, "Talkie");

        let unnamed = ProjectConfig::ad_hoc(PathBuf::from("."), PathBuf::from("project.pbxproj"));
        assert_eq!(unnamed.name, "project");
    }

    #[test]
    fn test_check_paths() -> Result<()> {
        let dir = TempDir::new()?;
        let manifest = dir.path().join("project.pbxproj");
        let project = ProjectConfig::new("app", dir.path().to_path_buf(), manifest.clone());
        assert!(project.check_paths().is_err());

        fs::write(&manifest, "{}")?;
        project.check_paths()?;

        let missing_dir = ProjectConfig::new("app", dir.path().join("nope"), manifest);
        let err = missing_dir.check_paths().unwrap_err();
        assert!(err.to_string().contains("source directory not found"));
        Ok(())
    }
}
