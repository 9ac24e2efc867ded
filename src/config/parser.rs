use super::Config;
use crate::error::SyncError;
use anyhow::{Context, Result};
use memmap2::MmapOptions;
use std::fs::File;
use std::path::Path;

/// Reads and validates a TOML configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or fails
/// validation.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    // For small files, use regular reading
    let metadata = std::fs::metadata(path)?;

    if metadata.len() < 4096 {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config_str(&content)
    } else {
        // Large file - use memory mapping
        let file = File::open(path)?;
        // SAFETY: the mapping is read once and parsed into owned values.
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let content = simdutf8::basic::from_utf8(&mmap)
            .map_err(|e| anyhow::anyhow!("Invalid UTF-8 in config file: {}", e))?;

        parse_config_str(content)
    }
}

/// Parses and validates configuration text.
///
/// # Errors
///
/// Returns a configuration error for invalid TOML or invalid values.
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| SyncError::config("", format!("invalid TOML: {e}")))?;

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), SyncError> {
    if let Some(default) = &config.core.default_project
        && !config.projects.contains_key(default)
    {
        return Err(SyncError::config(
            default,
            "core.default_project names a project that is not configured",
        ));
    }

    for (name, project) in &config.projects {
        if project.source_dir.as_os_str().is_empty() {
            return Err(SyncError::config(name, "source_dir must not be empty"));
        }
        if project.manifest.as_os_str().is_empty() {
            return Err(SyncError::config(name, "manifest must not be empty"));
        }
        if project.extensions.is_empty() {
            return Err(SyncError::config(name, "extensions must list at least one extension"));
        }
        if project.file_type.trim().is_empty() {
            return Err(SyncError::config(name, "file_type must not be empty"));
        }
        if let Some(ext) = project.extensions.iter().find(|e| e.starts_with('.')) {
            return Err(SyncError::config(
                name,
                format!("extension '{ext}' must be given without a leading dot"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let config = parse_config_str(
            r#"
[projects.app]
source_dir = "App"
manifest = "App/App.xcodeproj/project.pbxproj"
"#,
        )
        .unwrap();
        assert_eq!(config.projects.len(), 1);
        assert!(config.core.color);
        assert_eq!(config.core.diff_limit, None);
    }

    #[test]
    fn test_unknown_default_project_rejected() {
        let err = parse_config_str(
            r#"
[core]
default_project = "missing"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("default_project"));
    }

    #[test]
    fn test_dotted_extension_rejected() {
        let err = parse_config_str(
            r#"
[projects.app]
source_dir = "App"
manifest = "p.pbxproj"
extensions = [".swift"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("leading dot"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = parse_config_str("[projects.app\n").unwrap_err();
        assert_eq!(crate::error::exit_code_for(&err), 2);
    }

    #[test]
    fn test_parse_large_file_via_mmap() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pbxsync.toml");
        let mut content = String::from("[projects.app]\nsource_dir = \"App\"\nmanifest = \"p.pbxproj\"\nskip_dirs = [\n");
        for i in 0..500 {
            content.push_str(&format!("  \"generated_{i}\",\n"));
        }
        content.push_str("]\n");
        std::fs::write(&path, &content)?;

        let config = parse_config_file(&path)?;
        assert_eq!(config.projects["app"].skip_dirs.len(), 500);
        Ok(())
    }
}
