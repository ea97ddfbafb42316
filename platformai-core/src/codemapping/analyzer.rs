//! Repository walker and manifest parsers.

use super::types::RepositoryAnalysis;
use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

/// Directory names never descended into.
pub const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "__pycache__",
    "dist",
    "build",
    ".next",
];

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("repository path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("repository path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to walk repository: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Scans a repository and extracts files, dependencies and runtime hints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    pub async fn analyze(&self, repo_path: impl AsRef<Path>) -> Result<RepositoryAnalysis> {
        let root = repo_path.as_ref();
        let metadata = match fs::metadata(root).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AnalysisError::NotFound(root.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_dir() {
            return Err(AnalysisError::NotADirectory(root.to_path_buf()));
        }

        let mut paths = Vec::new();
        walk(root, &mut paths).await?;
        paths.sort();

        let mut analysis = RepositoryAnalysis::default();
        for path in &paths {
            analysis.files.push(relative_path(root, path));
            self.process_special_file(path, &mut analysis).await;
        }
        analysis.files.sort();

        debug!(
            path = %root.display(),
            files = analysis.files.len(),
            dependencies = analysis.dependencies.len(),
            "Repository scanned"
        );
        Ok(analysis)
    }

    async fn process_special_file(&self, path: &Path, analysis: &mut RepositoryAnalysis) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        let parser: fn(&str, &mut RepositoryAnalysis) = match name {
            "go.mod" => parse_go_mod,
            "package.json" => parse_package_json,
            "requirements.txt" => parse_requirements_txt,
            "pyproject.toml" => parse_pyproject_toml,
            "Dockerfile" => {
                analysis.has_dockerfile = true;
                parse_dockerfile
            }
            _ => return,
        };

        match fs::read_to_string(path).await {
            Ok(content) => parser(&content, analysis),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to read manifest"),
        }
    }
}

fn walk<'a>(dir: &'a Path, paths: &'a mut Vec<PathBuf>) -> BoxFuture<'a, Result<()>> {
    async move {
        let mut entries = fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                let skipped = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name));
                if !skipped {
                    walk(&path, paths).await?;
                }
            } else {
                paths.push(path);
            }
        }

        Ok(())
    }
    .boxed()
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reads the `go` directive plus single-line and block `require` entries.
pub fn parse_go_mod(content: &str, analysis: &mut RepositoryAnalysis) {
    let mut in_require_block = false;

    for line in content.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("go ") {
            if let Some(version) = rest.split_whitespace().next() {
                analysis.language_version = version.to_string();
            }
        }

        if line.starts_with("require (") {
            in_require_block = true;
            continue;
        }

        if in_require_block {
            if line == ")" {
                in_require_block = false;
                continue;
            }
            let mut parts = line.split_whitespace();
            if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
                if !name.starts_with("//") {
                    analysis
                        .dependencies
                        .insert(name.to_string(), version.to_string());
                }
            }
        } else if let Some(rest) = line.strip_prefix("require ") {
            let mut parts = rest.split_whitespace();
            if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
                analysis
                    .dependencies
                    .insert(name.to_string(), version.to_string());
            }
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct PackageJson {
    dependencies: HashMap<String, String>,
    dev_dependencies: HashMap<String, String>,
    engines: Engines,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Engines {
    node: String,
}

/// Merges `dependencies` and `devDependencies`; `engines.node` becomes the language version.
pub fn parse_package_json(content: &str, analysis: &mut RepositoryAnalysis) {
    let package: PackageJson = match serde_json::from_str(content) {
        Ok(package) => package,
        Err(e) => {
            debug!(error = %e, "Skipping malformed package.json");
            return;
        }
    };

    if !package.engines.node.is_empty() {
        analysis.language_version = package.engines.node;
    }
    analysis.dependencies.extend(package.dependencies);
    analysis.dependencies.extend(package.dev_dependencies);
}

/// Handles `name==1.0`, `name>=1.0` and bare names (version `*`).
pub fn parse_requirements_txt(content: &str, analysis: &mut RepositoryAnalysis) {
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (name, version) = if let Some((name, version)) = line.split_once("==") {
            (name.trim(), version.trim().to_string())
        } else if let Some((name, version)) = line.split_once(">=") {
            (name.trim(), format!(">={}", version.trim()))
        } else {
            (line, "*".to_string())
        };

        if !name.is_empty() {
            analysis.dependencies.insert(name.to_string(), version);
        }
    }
}

/// Reads `[tool.poetry.dependencies]` or `[project.dependencies]` key/value entries.
/// The `python` entry sets the language version.
pub fn parse_pyproject_toml(content: &str, analysis: &mut RepositoryAnalysis) {
    let mut in_dependencies = false;

    for line in content.lines().map(str::trim) {
        if line.starts_with("[tool.poetry.dependencies]") || line.starts_with("[project.dependencies]")
        {
            in_dependencies = true;
            continue;
        }
        if line.starts_with('[') {
            in_dependencies = false;
        }

        if !in_dependencies {
            continue;
        }
        if let Some((name, version)) = line.split_once('=') {
            let name = name.trim();
            let version = version.trim().trim_matches(|c| c == '"' || c == '\'');
            if name == "python" {
                analysis.language_version = version.to_string();
            } else {
                analysis
                    .dependencies
                    .insert(name.to_string(), version.to_string());
            }
        }
    }
}

fn parse_dockerfile(content: &str, analysis: &mut RepositoryAnalysis) {
    analysis.dockerfile_content = content.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std_fs::create_dir_all(parent).unwrap();
        }
        std_fs::write(path, content).unwrap();
    }

    #[test]
    fn test_parse_go_mod() {
        let mut analysis = RepositoryAnalysis::default();
        parse_go_mod(
            "module example.com/svc\n\ngo 1.21\n\nrequire github.com/gin-gonic/gin v1.9.1\n\nrequire (\n\tgithub.com/lib/pq v1.10.9\n\t// indirect comment\n\tgolang.org/x/net v0.17.0 // indirect\n)\n",
            &mut analysis,
        );

        assert_eq!(analysis.language_version, "1.21");
        assert_eq!(analysis.dependencies["github.com/gin-gonic/gin"], "v1.9.1");
        assert_eq!(analysis.dependencies["github.com/lib/pq"], "v1.10.9");
        assert_eq!(analysis.dependencies["golang.org/x/net"], "v0.17.0");
        assert_eq!(analysis.dependencies.len(), 3);
    }

    #[test]
    fn test_parse_package_json() {
        let mut analysis = RepositoryAnalysis::default();
        parse_package_json(
            r#"{"dependencies":{"express":"^4.18.0"},"devDependencies":{"jest":"^29.0.0"},"engines":{"node":">=18"}}"#,
            &mut analysis,
        );

        assert_eq!(analysis.language_version, ">=18");
        assert_eq!(analysis.dependencies["express"], "^4.18.0");
        assert_eq!(analysis.dependencies["jest"], "^29.0.0");
    }

    #[test]
    fn test_parse_malformed_package_json_is_ignored() {
        let mut analysis = RepositoryAnalysis::default();
        parse_package_json("{ not json", &mut analysis);
        assert!(analysis.dependencies.is_empty());
    }

    #[test]
    fn test_parse_requirements_txt() {
        let mut analysis = RepositoryAnalysis::default();
        parse_requirements_txt(
            "# web\nflask==2.3.0\n\nrequests >= 2.31\ngunicorn\n",
            &mut analysis,
        );

        assert_eq!(analysis.dependencies["flask"], "2.3.0");
        assert_eq!(analysis.dependencies["requests"], ">=2.31");
        assert_eq!(analysis.dependencies["gunicorn"], "*");
        assert_eq!(analysis.dependencies.len(), 3);
    }

    #[test]
    fn test_parse_pyproject_toml() {
        let mut analysis = RepositoryAnalysis::default();
        parse_pyproject_toml(
            "[tool.poetry]\nname = \"svc\"\n\n[tool.poetry.dependencies]\npython = \"^3.11\"\nfastapi = \"^0.104.0\"\nuvicorn = '0.24'\n\n[tool.poetry.dev-dependencies]\npytest = \"^7\"\n",
            &mut analysis,
        );

        assert_eq!(analysis.language_version, "^3.11");
        assert_eq!(analysis.dependencies["fastapi"], "^0.104.0");
        assert_eq!(analysis.dependencies["uvicorn"], "0.24");
        assert!(!analysis.dependencies.contains_key("pytest"));
        assert!(!analysis.dependencies.contains_key("name"));
    }

    #[tokio::test]
    async fn test_analyze_walks_and_skips_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "go.mod", "module svc\n\ngo 1.22\n");
        write(root, "cmd/server/main.go", "package main");
        write(root, "Dockerfile", "FROM golang:1.22\n");
        write(root, "node_modules/left-pad/index.js", "");
        write(root, ".git/HEAD", "ref: refs/heads/main");
        write(root, "vendor/lib/lib.go", "");

        let analysis = Analyzer::new().analyze(root).await.unwrap();

        assert_eq!(
            analysis.files,
            vec!["Dockerfile", "cmd/server/main.go", "go.mod"]
        );
        assert_eq!(analysis.language_version, "1.22");
        assert!(analysis.has_dockerfile);
        assert_eq!(analysis.dockerfile_content, "FROM golang:1.22\n");
    }

    #[tokio::test]
    async fn test_analyze_missing_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = Analyzer::new().analyze(&missing).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NotFound(path) if path == missing));
    }

    #[tokio::test]
    async fn test_analyze_file_path_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "# hi");

        let err = Analyzer::new()
            .analyze(dir.path().join("README.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NotADirectory(_)));
    }
}
