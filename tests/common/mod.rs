/*!
 * Common test utilities for the mdlingo test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use mdlingo::app_config::Config;
use mdlingo::translation::TranslateOptions;

/// Document with frontmatter and a single article
pub const SIMPLE_DOC: &str = "---\ntitle: Hello\n---\n\n# Hi\nBody text.";

/// Document mixing every section kind
pub const MIXED_DOC: &str = "---\ntitle: Guide\ndescription: How to start\nlayout: post\n---\n\n# Intro\nWelcome to the guide.\n\n> [!NOTE]\n> Read this first.\n---\n\n## Setup\nInstall the tool.\n\n```bash\ncargo install mdlingo\n```\n\nThat is all.";

/// Route library logs to the test output, once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Options with review and summary off, the way most pipeline tests want them
pub fn quiet_options() -> TranslateOptions {
    TranslateOptions {
        review: false,
        summarize: false,
        ..TranslateOptions::new("test-model", "English", "German")
    }
}

/// Configuration targeting German with review and summary off
pub fn test_config() -> Config {
    let mut config = Config {
        source_language: "en".to_string(),
        target_language: "de".to_string(),
        ..Config::default()
    };
    config.translation.model = "test-model".to_string();
    config.translation.review = false;
    config.translation.summarize = false;
    config
}
