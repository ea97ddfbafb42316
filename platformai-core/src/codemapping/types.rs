//! Repository analysis and generated platform configuration types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What the analyzer learned about a repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    pub primary_language: String,
    pub detected_framework: String,
    /// Paths relative to the repository root, `/`-separated and sorted.
    pub files: Vec<String>,
    /// Dependency name to version constraint.
    pub dependencies: BTreeMap<String, String>,
    pub has_dockerfile: bool,
    pub dockerfile_content: String,
    pub language_version: String,
}

impl RepositoryAnalysis {
    pub fn has_file(&self, path: &str) -> bool {
        self.files.iter().any(|file| file == path)
    }
}

/// Deployment configuration proposed for a repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub service: ServiceConfig,
    pub resources: ResourceConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
    pub monitoring: MonitoringConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub template: String,
    pub runtime: String,
    pub framework: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub cpu: String,
    pub memory: String,
    pub scaling: ScalingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub target_cpu_percent: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub storage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub memory: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub metrics: bool,
    pub logs: bool,
    pub traces: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub health_check: HealthCheckConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    pub path: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationLevel {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for RecommendationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// An actionable finding about the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub level: RecommendationLevel,
    pub title: String,
    pub message: String,
}

impl Recommendation {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: RecommendationLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: RecommendationLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_config_tolerates_nulls_and_missing_fields() {
        let raw = r#"{
            "service": {"name": "api", "port": 8080},
            "database": null,
            "cache": {"type": "redis", "version": "7", "memory": "256Mi"}
        }"#;
        let config: PlatformConfig = serde_json::from_str(raw).unwrap();

        assert_eq!(config.service.name, "api");
        assert_eq!(config.service.port, 8080);
        assert!(config.database.is_none());
        assert_eq!(config.cache.unwrap().kind, "redis");
        assert!(!config.monitoring.metrics);
    }

    #[test]
    fn test_yaml_omits_absent_database() {
        let yaml = serde_yaml::to_string(&PlatformConfig::default()).unwrap();
        assert!(!yaml.contains("database"));
        assert!(yaml.contains("health_check"));
    }

    #[test]
    fn test_recommendation_level_serializes_lowercase() {
        let rec = Recommendation::warning("No Dockerfile found", "Add one");
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["level"], "warning");
        assert_eq!(rec.level.to_string(), "warning");
    }
}
