//! Language and framework detection from an analyzed repository.

use super::types::RepositoryAnalysis;
use std::collections::HashMap;
use std::path::Path;

/// Root-level files that identify a language outright, checked in file order.
const MARKER_FILES: &[(&str, &str)] = &[
    ("go.mod", "go"),
    ("package.json", "nodejs"),
    ("requirements.txt", "python"),
    ("pyproject.toml", "python"),
    ("setup.py", "python"),
    ("Cargo.toml", "rust"),
    ("pom.xml", "java"),
    ("build.gradle", "java"),
];

/// Source extensions counted when no marker file is present.
const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("go", "go"),
    ("js", "nodejs"),
    ("ts", "nodejs"),
    ("jsx", "nodejs"),
    ("tsx", "nodejs"),
    ("py", "python"),
    ("rs", "rust"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("rb", "ruby"),
    ("php", "php"),
];

/// Dependency names per framework, in priority order.
const FRAMEWORK_DEPENDENCIES: &[(&str, &[&str])] = &[
    // Go
    ("gin", &["github.com/gin-gonic/gin"]),
    ("echo", &["github.com/labstack/echo"]),
    ("fiber", &["github.com/gofiber/fiber"]),
    ("chi", &["github.com/go-chi/chi"]),
    ("gorilla-mux", &["github.com/gorilla/mux"]),
    // Node.js
    ("express", &["express"]),
    ("nestjs", &["@nestjs/core", "@nestjs/common"]),
    ("fastify", &["fastify"]),
    ("nextjs", &["next"]),
    ("react", &["react"]),
    ("vue", &["vue"]),
    // Python
    ("fastapi", &["fastapi"]),
    ("flask", &["flask"]),
    ("django", &["django", "Django"]),
];

/// Framework config files, matched on file name anywhere in the tree.
const FRAMEWORK_FILES: &[(&str, &str)] = &[
    ("next.config.js", "nextjs"),
    ("next.config.ts", "nextjs"),
    ("nuxt.config.js", "nuxtjs"),
    ("nuxt.config.ts", "nuxtjs"),
    ("vue.config.js", "vue"),
    ("angular.json", "angular"),
];

pub const UNKNOWN_LANGUAGE: &str = "unknown";
pub const NO_FRAMEWORK: &str = "none";

#[derive(Debug, Clone, Copy, Default)]
pub struct Detector;

impl Detector {
    pub fn new() -> Self {
        Self
    }

    /// Primary language: the first marker file wins, otherwise the language with
    /// the most source files (ties go to the earlier table entry).
    pub fn detect_language(&self, analysis: &RepositoryAnalysis) -> &'static str {
        for file in &analysis.files {
            if let Some(&(_, language)) = MARKER_FILES
                .iter()
                .find(|(marker, _)| *marker == file.as_str())
            {
                return language;
            }
        }

        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for file in &analysis.files {
            let ext = Path::new(file).extension().and_then(|e| e.to_str());
            if let Some(&(_, language)) = EXTENSION_LANGUAGES.iter().find(|(e, _)| Some(*e) == ext) {
                *counts.entry(language).or_default() += 1;
            }
        }

        let mut best = (0, UNKNOWN_LANGUAGE);
        for &(_, language) in EXTENSION_LANGUAGES {
            let count = counts.get(language).copied().unwrap_or(0);
            if count > best.0 {
                best = (count, language);
            }
        }
        best.1
    }

    /// Framework from known dependencies, then from framework config files.
    pub fn detect_framework(&self, analysis: &RepositoryAnalysis) -> &'static str {
        for &(framework, dependencies) in FRAMEWORK_DEPENDENCIES {
            if dependencies
                .iter()
                .any(|dep| analysis.dependencies.contains_key(*dep))
            {
                return framework;
            }
        }

        for file in &analysis.files {
            let name = Path::new(file)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if let Some(&(_, framework)) = FRAMEWORK_FILES.iter().find(|(f, _)| *f == name) {
                return framework;
            }
        }

        NO_FRAMEWORK
    }
}
