use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use platformai_core::codemapping::{
    AnalyzeOptions, AnalyzeRequest, AnalyzeResult, PlatformConfig, RecommendationLevel,
};
use platformai_core::config::{Config, LlmConfig, RagConfig};
use platformai_core::rag::{DocumentInput, RagModule, RetrieveRequest};
use platformai_core::{Sdk, VERSION};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "platformai")]
#[command(about = "Analyze repositories and query knowledge bases with the Platform AI SDK", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// SDK config file; flags and environment are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Analyze a repository and generate a platform configuration")]
    Analyze {
        #[arg(help = "Repository path")]
        repo: PathBuf,

        #[arg(short, long, help = "Output path (default: <repo>/.platform/config.yaml)")]
        output: Option<PathBuf>,

        #[arg(short, long, default_value = "yaml", help = "Output format (yaml)")]
        format: String,

        #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[arg(long, help = "Anthropic model name")]
        model: Option<String>,
    },

    #[command(about = "Index text files and retrieve context for a question")]
    Rag {
        #[arg(help = "Directory of documents to index")]
        docs: PathBuf,

        #[arg(help = "Question to retrieve context for")]
        query: String,

        #[arg(short = 'k', long, default_value_t = 3)]
        top_k: usize,

        #[arg(long, default_value_t = 0.0)]
        min_score: f32,

        #[arg(long, default_value = "openai", help = "Embedding provider (openai, voyageai)")]
        provider: String,

        #[arg(long, env = "EMBEDDING_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[arg(long, value_delimiter = ',', default_value = "md,txt")]
        extensions: Vec<String>,
    },

    #[command(about = "Configuration commands")]
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    #[command(about = "Show current configuration")]
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            repo,
            output,
            format,
            api_key,
            model,
        } => {
            let config = analyze_config(cli.config.as_deref(), api_key, model)?;
            analyze(config, &repo, output, &format, cli.verbose).await
        }
        Commands::Rag {
            docs,
            query,
            top_k,
            min_score,
            provider,
            api_key,
            extensions,
        } => {
            let config = rag_config(cli.config.as_deref(), provider, api_key)?;
            rag_query(&config, &docs, &query, top_k, min_score, &extensions).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let path = cli
                    .config
                    .context("--config is required for `config show`")?;
                show_config(&path)
            }
        },
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn analyze_config(
    path: Option<&Path>,
    api_key: Option<String>,
    model: Option<String>,
) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path).context("Failed to load config")?,
        None => {
            let api_key = api_key
                .context("ANTHROPIC_API_KEY environment variable or --api-key is required")?;
            Config::new(LlmConfig::new("anthropic", api_key))
        }
    };
    if let Some(model) = model {
        config.llm.model = model;
    }
    Ok(config)
}

fn rag_config(path: Option<&Path>, provider: String, api_key: Option<String>) -> Result<RagConfig> {
    if let Some(path) = path {
        let config = Config::load(path).context("Failed to load config")?;
        if let Some(rag) = config.rag {
            return Ok(rag);
        }
    }

    let api_key = api_key.context("EMBEDDING_API_KEY environment variable or --api-key is required")?;
    Ok(RagConfig::new(provider, api_key))
}

async fn analyze(
    config: Config,
    repo: &Path,
    output: Option<PathBuf>,
    format: &str,
    verbose: bool,
) -> Result<()> {
    if !repo.exists() {
        bail!("repository path does not exist: {}", repo.display());
    }

    let sdk = Sdk::new(config).context("Failed to initialize SDK")?;

    print_header("Platform AI - Repository Analysis Report");
    println!("\n{} {}\n", "Repository:".bold(), repo.display());
    println!("{} Analyzing repository...", "→".blue());

    let result = sdk
        .code_mapping()
        .analyze(AnalyzeRequest {
            repo_path: repo.to_path_buf(),
            options: AnalyzeOptions { verbose },
        })
        .await
        .context("Analysis failed")?;

    print_report(&result);

    let output = output.unwrap_or_else(|| repo.join(".platform").join("config.yaml"));
    write_config_file(&result.config, &output, format).context("Failed to write config")?;

    println!(
        "\n{} Generated configuration: {}",
        "✓".green().bold(),
        output.display().to_string().cyan()
    );
    Ok(())
}

fn print_header(title: &str) {
    let line = "━".repeat(80);
    println!("\n{}", line);
    println!("{}", title.bold());
    println!("{}", line);
}

fn print_report(result: &AnalyzeResult) {
    let analysis = &result.analysis;
    let config = &result.config;

    println!("\n{}", "Stack Detection:".bold().green());
    if analysis.language_version.is_empty() {
        println!("  Language:       {}", analysis.primary_language.cyan());
    } else {
        println!(
            "  Language:       {} ({})",
            analysis.primary_language.cyan(),
            analysis.language_version
        );
    }
    println!("  Framework:      {}", analysis.detected_framework.cyan());
    println!("  Files Analyzed: {}", analysis.files.len());
    if analysis.has_dockerfile {
        println!("  Dockerfile:     Present");
    }

    if !analysis.dependencies.is_empty() {
        println!("\n{}", "Detected Dependencies:".bold().green());
        for (name, version) in analysis.dependencies.iter().take(5) {
            println!("  {} {}: {}", "•".cyan(), name, version);
        }
        if analysis.dependencies.len() > 5 {
            println!("  ... and {} more", analysis.dependencies.len() - 5);
        }
    }

    println!("\n{}", "Platform Services:".bold().green());
    println!("  Service:  {}", config.service.name.cyan());
    println!("  Template: {}", config.service.template);
    println!("  Runtime:  {}", config.service.runtime);
    println!("  Port:     {}", config.service.port);
    if let Some(database) = &config.database {
        println!("  Database: {} {} ({})", database.kind, database.version, database.storage);
    }
    if let Some(cache) = &config.cache {
        println!("  Cache:    {} {} ({})", cache.kind, cache.version, cache.memory);
    }

    let scaling = &config.resources.scaling;
    println!("\n{}", "Resources:".bold().green());
    println!("  CPU:     {}", config.resources.cpu);
    println!("  Memory:  {}", config.resources.memory);
    println!(
        "  Scaling: {}-{} replicas (target: {}% CPU)",
        scaling.min_replicas, scaling.max_replicas, scaling.target_cpu_percent
    );

    println!("\n{}", "Monitoring:".bold().green());
    println!("  Metrics: {}", config.monitoring.metrics);
    println!("  Logs:    {}", config.monitoring.logs);
    println!("  Traces:  {}", config.monitoring.traces);

    if !result.recommendations.is_empty() {
        println!("\n{}", "Recommendations:".bold().green());
        for rec in &result.recommendations {
            let marker = match rec.level {
                RecommendationLevel::Info => "✓".green(),
                RecommendationLevel::Warning => "!".yellow(),
                RecommendationLevel::Critical => "✗".red(),
            };
            println!("  {} {}", marker.bold(), rec.title);
            if !rec.message.is_empty() {
                println!("    {}", rec.message.dimmed());
            }
        }
    }

    println!("\n{}", "━".repeat(80));
}

fn write_config_file(config: &PlatformConfig, output: &Path, format: &str) -> Result<()> {
    if format != "yaml" {
        bail!("unsupported format: {}", format);
    }

    if let Some(dir) = output.parent() {
        std::fs::create_dir_all(dir).context("Failed to create output directory")?;
    }

    let body = serde_yaml::to_string(config).context("Failed to serialize config")?;
    let content = format!(
        "# Platform Configuration\n# Auto-generated by Platform AI SDK v{}\n\n{}",
        VERSION, body
    );

    std::fs::write(output, content).context("Failed to write config file")?;
    Ok(())
}

/// Files under `dir` with one of `extensions`, sorted, as (relative path, content).
fn collect_documents(dir: &Path, extensions: &[String]) -> Result<Vec<(String, String)>> {
    let mut documents = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current)
            .with_context(|| format!("Failed to read directory {}", current.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext));
            if !matches {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let id = path
                        .strip_prefix(dir)
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .into_owned();
                    documents.push((id, content));
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable file"),
            }
        }
    }

    documents.sort();
    Ok(documents)
}

async fn rag_query(
    config: &RagConfig,
    docs: &Path,
    query: &str,
    top_k: usize,
    min_score: f32,
    extensions: &[String],
) -> Result<()> {
    let documents = collect_documents(docs, extensions)?;
    if documents.is_empty() {
        bail!("no documents with extensions [{}] found in {}", extensions.join(", "), docs.display());
    }

    let rag = RagModule::new(config).context("Failed to initialize RAG module")?;
    let inputs = documents
        .into_iter()
        .map(|(id, content)| {
            let title = Path::new(&id)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| id.clone());
            DocumentInput::new(id.clone(), content)
                .with_metadata("source", id)
                .with_metadata("title", title)
        })
        .collect();

    println!("{} Indexing documents from {}...", "→".blue(), docs.display());
    rag.add_documents(inputs).await.context("Failed to index documents")?;
    println!("{} Indexed {} documents", "✓".green().bold(), rag.count());

    let response = rag
        .retrieve(
            RetrieveRequest::new(query)
                .with_top_k(top_k)
                .with_min_score(min_score),
        )
        .await
        .context("Retrieval failed")?;

    if response.results.is_empty() {
        println!("{}", "No documents matched the query.".yellow());
        return Ok(());
    }

    println!();
    print!("{}", response.context);
    Ok(())
}

fn show_config(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load config")?;

    println!("{}", "Current Configuration:".bold().green());
    println!();
    println!("{}", "LLM:".bold());
    println!("  Provider:    {}", config.llm.provider.cyan());
    println!("  Model:       {}", config.llm.model.cyan());
    println!("  Temperature: {}", config.llm.temperature);
    println!("  Max Tokens:  {}", config.llm.max_tokens);
    println!("  API Key:     {}", mask(&config.llm.api_key));
    println!();
    println!("{}", "RAG:".bold());
    match &config.rag {
        Some(rag) => {
            println!("  Provider:  {}", rag.embedding_provider.cyan());
            println!(
                "  Model:     {}",
                rag.model.as_deref().unwrap_or("(provider default)")
            );
            if let Some(dim) = rag.embedding_dim {
                println!("  Dimension: {}", dim);
            }
            println!("  Timeout:   {}s", rag.timeout_secs);
            println!("  API Key:   {}", mask(&rag.api_key));
        }
        None => println!("  {}", "not configured".dimmed()),
    }

    Ok(())
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
