#[cfg(test)]
pub mod fixtures {
    use crate::config::{Config, ProjectConfig};
    use crate::manifest::{Document, IdGenerator};
    use anyhow::Result;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Small two-target manifest shared by unit tests.
    pub const SAMPLE_MANIFEST: &str = include_str!("../tests/fixtures/App.pbxproj");

    pub const MAIN_GROUP: &str = "A40000000000000000000001";
    pub const VIEWS_GROUP: &str = "A40000000000000000000002";
    /// Group with a `name` but no `path`.
    pub const PRODUCTS_GROUP: &str = "A40000000000000000000003";
    pub const APP_SOURCES_PHASE: &str = "A30000000000000000000001";
    pub const TESTS_SOURCES_PHASE: &str = "A30000000000000000000003";

    pub fn sample_document() -> Document {
        Document::new(SAMPLE_MANIFEST)
    }

    pub fn sample_project(source_dir: &str) -> ProjectConfig {
        ProjectConfig::new(
            "app",
            PathBuf::from(source_dir),
            PathBuf::from(source_dir).join("App.xcodeproj/project.pbxproj"),
        )
    }

    /// Id generator with a fixed seed, so runs are repeatable.
    pub fn seeded_ids() -> IdGenerator<StdRng> {
        IdGenerator::with_rng(StdRng::seed_from_u64(0x5EED))
    }

    /// A source directory and manifest on disk.
    pub struct TestProject {
        pub temp_dir: TempDir,
        pub project: ProjectConfig,
    }

    impl TestProject {
        /// Source directory holding `App.swift` and `Views/ContentView.swift`
        /// next to a copy of the sample manifest.
        pub fn new() -> Result<Self> {
            let temp_dir = tempfile::tempdir()?;
            let source_dir = temp_dir.path().join("App");
            let manifest = source_dir.join("App.xcodeproj/project.pbxproj");

            fs::create_dir_all(manifest.parent().expect("manifest has a parent"))?;
            fs::write(&manifest, SAMPLE_MANIFEST)?;

            let project = ProjectConfig::new("app", source_dir, manifest);
            let this = Self { temp_dir, project };
            this.create_file("App.swift")?;
            this.create_file("Views/ContentView.swift")?;
            this.create_file("AppTests/AppTests.swift")?;
            Ok(this)
        }

        pub fn create_file(&self, rel: &str) -> Result<PathBuf> {
            let path = self.project.source_dir.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "import Foundation\n")?;
            Ok(path)
        }

        pub fn manifest_text(&self) -> Result<String> {
            Ok(fs::read_to_string(&self.project.manifest)?)
        }

        pub fn config(&self) -> Config {
            Config::single(self.project.clone())
        }
    }
}
