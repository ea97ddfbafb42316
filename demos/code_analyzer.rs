//! Example analyzing a repository and generating its platform configuration.
//!
//! Usage: `cargo run --example code_analyzer -- <repository-path>`
//!
//! Requires `ANTHROPIC_API_KEY`. The `platformai analyze` command does the
//! same with file output and a full report.

use anyhow::Context;
use platformai::codemapping::RecommendationLevel;
use platformai::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let repo = std::env::args()
        .nth(1)
        .context("usage: code_analyzer <repository-path>")?;
    let api_key =
        std::env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY environment variable is required")?;

    let sdk = Sdk::new(Config::new(LlmConfig::new("anthropic", api_key)))?;

    println!("Platform AI - Code Analyzer");
    println!("===========================\n");
    println!("Analyzing {}...\n", repo);

    let result = sdk.code_mapping().analyze(AnalyzeRequest::new(&repo)).await?;
    let analysis = &result.analysis;

    println!("=== Stack Detection ===");
    println!("  Language:  {} {}", analysis.primary_language, analysis.language_version);
    println!("  Framework: {}", analysis.detected_framework);
    println!("  Files:     {}", analysis.files.len());
    for (name, version) in analysis.dependencies.iter().take(5) {
        println!("  → {}: {}", name, version);
    }
    println!();

    println!("=== Generated Configuration ===");
    println!("{}", serde_yaml::to_string(&result.config)?);

    if !result.recommendations.is_empty() {
        println!("=== Recommendations ===");
        for rec in &result.recommendations {
            let marker = match rec.level {
                RecommendationLevel::Info => "✓",
                RecommendationLevel::Warning => "⚠",
                RecommendationLevel::Critical => "✗",
            };
            println!("  {} {}", marker, rec.title);
            println!("    {}", rec.message);
        }
    }

    Ok(())
}
