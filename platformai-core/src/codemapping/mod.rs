//! Code-to-platform mapping.
//!
//! Scans a repository, detects its language and framework, asks the LLM for a
//! [`PlatformConfig`], and derives a list of [`Recommendation`]s.

mod analyzer;
mod detector;
mod generator;
mod types;

pub use analyzer::{
    parse_go_mod, parse_package_json, parse_pyproject_toml, parse_requirements_txt, AnalysisError,
    Analyzer, SKIPPED_DIRS,
};
pub use detector::{Detector, NO_FRAMEWORK, UNKNOWN_LANGUAGE};
pub use generator::{build_user_prompt, ConfigGenerator, GenerationError};
pub use types::{
    CacheConfig, DatabaseConfig, HealthCheckConfig, MonitoringConfig, PlatformConfig,
    Recommendation, RecommendationLevel, RepositoryAnalysis, ResourceConfig, ScalingConfig,
    SecurityConfig, ServiceConfig,
};

use crate::llm::LlmClient;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CodeMappingError {
    #[error("repository analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("config generation failed: {0}")]
    Generation(#[from] GenerationError),
}

pub type Result<T> = std::result::Result<T, CodeMappingError>;

#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub repo_path: PathBuf,
    pub options: AnalyzeOptions,
}

impl AnalyzeRequest {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            options: AnalyzeOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    /// Log each analysis stage at `info` instead of `debug`.
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct AnalyzeResult {
    pub analysis: RepositoryAnalysis,
    pub config: PlatformConfig,
    pub recommendations: Vec<Recommendation>,
}

/// Repository analysis and platform config generation.
#[derive(Clone)]
pub struct CodeMapping {
    analyzer: Analyzer,
    detector: Detector,
    generator: ConfigGenerator,
}

impl CodeMapping {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            analyzer: Analyzer::new(),
            detector: Detector::new(),
            generator: ConfigGenerator::new(llm),
        }
    }

    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResult> {
        let verbose = request.options.verbose;

        let mut analysis = self.analyzer.analyze(&request.repo_path).await?;
        analysis.primary_language = self.detector.detect_language(&analysis).to_string();
        analysis.detected_framework = self.detector.detect_framework(&analysis).to_string();
        if verbose {
            info!(
                language = %analysis.primary_language,
                framework = %analysis.detected_framework,
                files = analysis.files.len(),
                "Repository analyzed"
            );
        } else {
            debug!(
                language = %analysis.primary_language,
                framework = %analysis.detected_framework,
                "Repository analyzed"
            );
        }

        let config = self.generator.generate(&analysis).await?;
        let recommendations = recommendations(&analysis);
        if verbose {
            info!(
                service = %config.service.name,
                recommendations = recommendations.len(),
                "Platform config generated"
            );
        }

        Ok(AnalyzeResult {
            analysis,
            config,
            recommendations,
        })
    }
}

/// Heuristic findings about the repository, warnings first for each check.
pub fn recommendations(analysis: &RepositoryAnalysis) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    let lowered: Vec<String> = analysis.files.iter().map(|f| f.to_lowercase()).collect();

    if !lowered.iter().any(|f| f.contains("health")) {
        recs.push(Recommendation::warning(
            "No health check endpoint found",
            "Consider adding a /health endpoint for monitoring",
        ));
    }

    if !analysis.has_dockerfile {
        recs.push(Recommendation::warning(
            "No Dockerfile found",
            "Consider adding a Dockerfile for containerization",
        ));
    }

    let has_tests = lowered
        .iter()
        .any(|f| f.contains("test") || f.contains("spec"));
    if !has_tests {
        recs.push(Recommendation::info(
            "No test files detected",
            "Consider adding tests for better code quality",
        ));
    }

    if analysis.has_dockerfile {
        recs.push(Recommendation::info(
            "Dockerfile present",
            "Good! Your service is ready for containerization",
        ));
    }

    if !analysis.dependencies.is_empty() {
        recs.push(Recommendation::info(
            format!("Detected {} dependencies", analysis.dependencies.len()),
            "Dependencies configured in platform config",
        ));
    }

    if has_tests {
        recs.push(Recommendation::info(
            "Test files detected",
            "Great! Tests help ensure code quality",
        ));
    }

    match analysis.primary_language.as_str() {
        "go" if !analysis.has_file("go.sum") => {
            recs.push(Recommendation::warning(
                "No go.sum found",
                "Run 'go mod tidy' to generate go.sum for dependency verification",
            ));
        }
        "nodejs"
            if !["package-lock.json", "yarn.lock", "pnpm-lock.yaml"]
                .iter()
                .any(|lockfile| analysis.has_file(lockfile)) =>
        {
            recs.push(Recommendation::warning(
                "No lockfile found",
                "Consider committing package-lock.json or yarn.lock for reproducible builds",
            ));
        }
        "python"
            if ["requirements.txt", "pyproject.toml", "Pipfile"]
                .iter()
                .any(|manifest| analysis.has_file(manifest)) =>
        {
            recs.push(Recommendation::info(
                "Python dependency management detected",
                "Ensure you're using a virtual environment for development",
            ));
        }
        _ => {}
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLlm;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG_REPLY: &str = r#"{"service":{"name":"orders","template":"api","runtime":"node20","framework":"express","port":3000},
 "resources":{"cpu":"500m","memory":"512Mi","scaling":{"min_replicas":2,"max_replicas":10,"target_cpu_percent":70}},
 "database":null,"cache":null,
 "monitoring":{"metrics":true,"logs":true,"traces":true},
 "security":{"health_check":{"path":"/health","port":3000}}}"#;

    fn analysis(language: &str, files: &[&str]) -> RepositoryAnalysis {
        RepositoryAnalysis {
            primary_language: language.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            ..RepositoryAnalysis::default()
        }
    }

    fn titles(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_recommendations_for_bare_repo() {
        let recs = recommendations(&analysis("unknown", &["main.c"]));
        assert_eq!(
            titles(&recs),
            vec![
                "No health check endpoint found",
                "No Dockerfile found",
                "No test files detected"
            ]
        );
        assert_eq!(recs[0].level, RecommendationLevel::Warning);
        assert_eq!(recs[2].level, RecommendationLevel::Info);
    }

    #[test]
    fn test_recommendations_for_complete_go_repo() {
        let mut repo = analysis(
            "go",
            &["Dockerfile", "go.mod", "go.sum", "internal/health/handler.go", "main_test.go"],
        );
        repo.has_dockerfile = true;
        repo.dependencies.insert("github.com/lib/pq".to_string(), "v1".to_string());

        let recs = recommendations(&repo);
        assert_eq!(
            titles(&recs),
            vec!["Dockerfile present", "Detected 1 dependencies", "Test files detected"]
        );
    }

    #[test]
    fn test_language_specific_recommendations() {
        let go = recommendations(&analysis("go", &["go.mod"]));
        assert!(titles(&go).contains(&"No go.sum found"));

        let node = recommendations(
            &analysis("nodejs", &["package.json"])
        );
        assert!(titles(&node).contains(&"No lockfile found"));

        let node_locked = recommendations(
            &analysis("nodejs", &["package.json", "yarn.lock"])
        );
        assert!(!titles(&node_locked).contains(&"No lockfile found"));

        let python = recommendations(
            &analysis("python", &["pyproject.toml"])
        );
        assert!(titles(&python).contains(&"Python dependency management detected"));
    }

    #[tokio::test]
    async fn test_analyze_end_to_end() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(
            root.join("package.json"),
            r#"{"dependencies":{"express":"^4.18.0"},"engines":{"node":"20"}}"#,
        )
        .unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/index.js"), "require('express')").unwrap();

        let llm = Arc::new(ScriptedLlm::new(CONFIG_REPLY));
        let mapping = CodeMapping::new(llm.clone());
        let result = mapping.analyze(AnalyzeRequest::new(root)).await.unwrap();

        assert_eq!(result.analysis.primary_language, "nodejs");
        assert_eq!(result.analysis.detected_framework, "express");
        assert_eq!(result.analysis.language_version, "20");
        assert_eq!(result.config.service.name, "orders");
        assert!(titles(&result.recommendations).contains(&"No lockfile found"));

        let prompt = &llm.requests.lock()[0].user_prompt;
        assert!(prompt.contains("- Framework: express"));
        assert!(prompt.contains("src/index.js"));
    }

    #[tokio::test]
    async fn test_analyze_missing_repository() {
        let mapping = CodeMapping::new(Arc::new(ScriptedLlm::new("{}")));
        let err = mapping
            .analyze(AnalyzeRequest::new("/nonexistent/repo"))
            .await
            .unwrap_err();

        assert!(matches!(err, CodeMappingError::Analysis(AnalysisError::NotFound(_))));
        assert!(err.to_string().starts_with("repository analysis failed"));
    }
}
