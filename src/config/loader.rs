//! Loading configuration files and the pipelines they name.

use crate::config::schema::ConfigDocument;
use crate::core::error::{ConfigError, LintError, LintResult};
use crate::execution::{Configuration, Report, RunOptions};
use crate::pipeline::serialization::load_pipeline;
use crate::pipeline::structure::Pipeline;
use crate::validation::Validation;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never searched for configurations.
const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

/// Read a configuration file, picking the format from its extension.
pub fn read_document(path: &Path) -> LintResult<ConfigDocument> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| LintError::io(path.display().to_string(), e))?;
    let parse_error = |message: String| ConfigError::Parse {
        path: path.display().to_string(),
        message,
    };

    let document: ConfigDocument = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&text).map_err(|e| parse_error(e.to_string()))?,
        Some("json") => serde_json::from_str(&text).map_err(|e| parse_error(e.to_string()))?,
        other => {
            return Err(ConfigError::UnsupportedFormat(other.unwrap_or("<none>").to_string()).into())
        }
    };

    document.check_version()?;
    Ok(document)
}

/// A configuration file with its pipeline loaded and validations built.
pub struct LoadedConfiguration {
    path: PathBuf,
    pipeline: Pipeline,
    validations: Vec<Box<dyn Validation>>,
    options: RunOptions,
}

impl LoadedConfiguration {
    /// Load `path` and the pipeline it names.
    ///
    /// The pipeline path is resolved against the configuration's directory.
    pub fn load(path: &Path) -> LintResult<Self> {
        let document = read_document(path)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let pipeline_path = base.join(&document.pipeline);
        let pipeline = load_pipeline(&pipeline_path)?;
        let validations = document.build_validations()?;

        log::info!(
            "Loaded {} with {} validation(s) for pipeline '{}'",
            path.display(),
            validations.len(),
            pipeline.name()
        );

        Ok(Self {
            path: path.to_path_buf(),
            pipeline,
            validations,
            options: RunOptions {
                fail_fast: document.fail_fast,
            },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Split into the pipeline, the validations and the run options.
    pub fn into_parts(self) -> (Pipeline, Vec<Box<dyn Validation>>, RunOptions) {
        (self.pipeline, self.validations, self.options)
    }

    /// Run the configuration, with `fail_fast` forced on when requested.
    pub fn run(self, force_fail_fast: bool) -> LintResult<Report> {
        let (pipeline, validations, mut options) = self.into_parts();
        options.fail_fast |= force_fail_fast;
        let configuration = Configuration::new(&pipeline, validations)?;
        Ok(configuration.run_with(options)?)
    }
}

/// Resolve a path argument to configuration files.
///
/// A file is returned as is. A directory is searched recursively for
/// `.toml` and `.json` files that hold a `validations` list, in sorted order.
pub fn discover(path: &Path) -> LintResult<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(LintError::io(
            path.display().to_string(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        ));
    }

    let walker = WalkDir::new(path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_skip(e));

    let mut found = Vec::new();
    for entry in walker.filter_map(Result::ok) {
        if entry.file_type().is_file() && is_configuration(entry.path()) {
            found.push(entry.into_path());
        }
    }

    if found.is_empty() {
        return Err(ConfigError::NothingFound(path.display().to_string()).into());
    }
    log::debug!("Discovered {} configuration(s) under {}", found.len(), path.display());
    Ok(found)
}

fn should_skip(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || SKIPPED_DIRS.contains(&&*name))
}

/// Whether a file parses with a top-level `validations` key.
fn is_configuration(path: &Path) -> bool {
    let Ok(text) = std::fs::read_to_string(path) else {
        return false;
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str::<toml::Table>(&text)
            .map(|table| table.contains_key("validations"))
            .unwrap_or(false),
        Some("json") => serde_json::from_str::<serde_json::Value>(&text)
            .map(|value| value.get("validations").is_some())
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PIPELINE: &str = r#"{
        "name": "p",
        "steps": [{"name": "train", "step_type": "Training", "role": "roleA"}]
    }"#;

    const CONFIG: &str = r#"
        pipeline = "pipeline.json"
        fail_fast = true

        [[validations]]
        kind = "role_name"
        expected = "roleA"
    "#;

    #[test]
    fn test_load_relative_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pipeline.json"), PIPELINE).unwrap();
        let config = dir.path().join("steplint.toml");
        fs::write(&config, CONFIG).unwrap();

        let loaded = LoadedConfiguration::load(&config).unwrap();
        assert_eq!(loaded.pipeline().name(), "p");
        assert!(loaded.options().fail_fast);

        let report = loaded.run(false).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.is_success());
    }

    #[test]
    fn test_missing_pipeline_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("steplint.toml");
        fs::write(&config, CONFIG).unwrap();
        assert!(matches!(
            LoadedConfiguration::load(&config),
            Err(LintError::Io { .. })
        ));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("broken.toml");
        fs::write(&config, "pipeline = ").unwrap();
        match read_document(&config) {
            Err(LintError::Config(ConfigError::Parse { path, .. })) => {
                assert!(path.ends_with("broken.toml"))
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_discover_skips_pipelines_and_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pipeline.json"), PIPELINE).unwrap();
        fs::write(dir.path().join("b.toml"), CONFIG).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/a.json"), r#"{"pipeline": "x.json", "validations": []}"#)
            .unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/c.toml"), CONFIG).unwrap();

        let found = discover(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["b.toml", "nested/a.json"]);
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover(dir.path()),
            Err(LintError::Config(ConfigError::NothingFound(_)))
        ));
    }
}
