use anyhow::Result;
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

/// Fields accepted inside every `[projects.<name>]` table.
const PROJECT_FIELDS: &[&str] = &[
    "source_dir",
    "manifest",
    "skip_dirs",
    "extensions",
    "file_type",
    "source_group",
    "synchronized_group",
    "target",
    "match_mode",
];

/// Flags configuration keys pbxsync does not understand
pub struct ConfigValidator {
    /// Set of valid configuration fields that are recognized by pbxsync
    known_fields: HashSet<String>,
}

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_fields = ["core.default_project", "core.color", "core.diff_limit"]
            .iter()
            .map(ToString::to_string)
            .collect();

        Self { known_fields }
    }

    /// Validate a configuration file and warn about unknown fields
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn validate_config_file(&self, config_path: &Path) -> Result<Vec<String>> {
        if !config_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(config_path)?;
        let parsed: toml::Value = toml::from_str(&content)?;

        let mut unknown_fields = Vec::new();
        self.check_table(&parsed, "", &mut unknown_fields);

        if !unknown_fields.is_empty() {
            eprintln!("{}", "Configuration warnings:".yellow().bold());
            for field in &unknown_fields {
                eprintln!("  Unknown configuration field: {}", field.yellow());
            }
            eprintln!();
        }

        Ok(unknown_fields)
    }

    /// Recursively checks a TOML table for unknown fields
    ///
    /// `projects.<name>` tables are dynamic and are checked against
    /// [`PROJECT_FIELDS`] instead of the fixed field set.
    fn check_table(&self, table: &toml::Value, prefix: &str, unknown: &mut Vec<String>) {
        let toml::Value::Table(map) = table else {
            return;
        };

        for (key, value) in map {
            let full_key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };

            if prefix == "projects" {
                Self::check_project(value, &full_key, unknown);
                continue;
            }

            if self.known_fields.contains(&full_key) {
                continue;
            }

            match value {
                toml::Value::Table(_) if full_key == "core" || full_key == "projects" => {
                    self.check_table(value, &full_key, unknown);
                }
                _ => unknown.push(full_key),
            }
        }
    }

    /// Validates the fields of one project table
    fn check_project(value: &toml::Value, prefix: &str, unknown: &mut Vec<String>) {
        let toml::Value::Table(map) = value else {
            unknown.push(prefix.to_string());
            return;
        };
        for key in map.keys() {
            if !PROJECT_FIELDS.contains(&key.as_str()) {
                unknown.push(format!("{prefix}.{key}"));
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_unknown_fields() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pbxsync.toml");
        std::fs::write(
            &path,
            r#"
[core]
default_project = "app"
pager = "less"

[projects.app]
source_dir = "App"
manifest = "p.pbxproj"
skip_dir = ["build"]

[remotes.origin]
url = "x"
"#,
        )?;

        let mut unknown = ConfigValidator::new().validate_config_file(&path)?;
        unknown.sort();
        assert_eq!(
            unknown,
            vec!["core.pager", "projects.app.skip_dir", "remotes"]
        );
        Ok(())
    }

    #[test]
    fn test_clean_config_has_no_warnings() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pbxsync.toml");
        std::fs::write(
            &path,
            "[core]\ncolor = false\n\n[projects.app]\nsource_dir = \"App\"\nmanifest = \"p\"\nmatch_mode = \"path\"\n",
        )?;
        assert!(ConfigValidator::new().validate_config_file(&path)?.is_empty());
        Ok(())
    }
}
