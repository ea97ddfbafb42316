//! Example answering platform questions with retrieved document context.
//!
//! This example shows how to:
//! - Build the SDK with a RAG section
//! - Add a small knowledge base in one batch
//! - Retrieve context for a question and pass it to the LLM
//!
//! Requires `ANTHROPIC_API_KEY` and `OPENAI_API_KEY`.

use anyhow::Context;
use platformai::prelude::*;

const SYSTEM_PROMPT: &str = "You are a helpful platform engineering assistant. \
Use the provided context to answer questions accurately. \
If the context doesn't contain relevant information, say so.";

const QUESTIONS: [&str; 3] = [
    "What CPU and memory limits should I use for a medium-sized web service in Kubernetes?",
    "How should I configure PostgreSQL for a production application with high traffic?",
    "What metrics are most important to track for monitoring a web service?",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let anthropic_key =
        std::env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY environment variable is required")?;
    let openai_key =
        std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY environment variable is required")?;

    let config = Config::new(LlmConfig::new("anthropic", anthropic_key))
        .with_rag(RagConfig::new("openai", openai_key).with_model("text-embedding-3-small"));
    let sdk = Sdk::new(config)?;
    let rag = sdk.rag().context("RAG module not configured")?;

    println!("Platform AI - RAG Demo");
    println!("======================\n");

    println!("=== Step 1: Adding documents ===");
    rag.add_documents(knowledge_base()).await?;
    println!("✓ Added {} documents to the knowledge base\n", rag.count());

    println!("=== Step 2: Asking questions ===\n");
    let mut answered = 0;
    for (i, question) in QUESTIONS.iter().enumerate() {
        println!("Question {}: {}\n", i + 1, question);

        let retrieved = match rag
            .retrieve(RetrieveRequest::new(*question).with_top_k(2).with_min_score(0.3))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                eprintln!("⚠ Failed to retrieve context: {}", e);
                continue;
            }
        };

        println!("Retrieved {} documents:", retrieved.results.len());
        for (j, result) in retrieved.results.iter().enumerate() {
            let title = result
                .document
                .metadata
                .get("title")
                .map(String::as_str)
                .unwrap_or(&result.document.id);
            println!("  {}. {} ({:.2} relevance)", j + 1, title, result.score);
        }
        println!();

        let request = GenerateRequest::new(SYSTEM_PROMPT, *question)
            .with_temperature(0.7)
            .with_max_tokens(500);
        let response = match sdk.llm().generate_with_context(request, &retrieved.context).await {
            Ok(response) => response,
            Err(e) => {
                eprintln!("⚠ Failed to generate response: {}", e);
                continue;
            }
        };

        answered += 1;
        println!("Response:\n{}\n", response.text);
        println!(
            "Tokens used: {} (prompt: {}, completion: {})",
            response.usage.total_tokens, response.usage.prompt_tokens, response.usage.completion_tokens
        );
        println!("{}\n", "-".repeat(65));
    }

    if answered == 0 {
        anyhow::bail!("no questions were answered");
    }
    println!("✓ Answered {} of {} questions", answered, QUESTIONS.len());
    Ok(())
}

fn knowledge_base() -> Vec<DocumentInput> {
    vec![
        DocumentInput::new(
            "k8s-resources",
            "# Kubernetes Resource Best Practices\n\n\
             CPU limits: web services 500m-1000m, background workers 200m-500m.\n\
             Memory limits: small services 512Mi-1Gi, medium 1Gi-2Gi, large 2Gi-4Gi.\n\
             Autoscaling: at least 2 replicas, target 70-80% CPU utilization.\n\
             Health checks: liveness, readiness and startup probes with a 10-30s initial delay.",
        )
        .with_metadata("title", "Kubernetes Resource Best Practices")
        .with_metadata("category", "infrastructure")
        .with_metadata("source", "platform-engineering-guide"),
        DocumentInput::new(
            "database-config",
            "# Database Configuration Guidelines\n\n\
             PostgreSQL: version 15 or later, PgBouncer pool size 20-50, 50Gi+ storage for\n\
             high-traffic apps, daily backups with 7-day retention, at least 1 standby.\n\
             Redis: version 7.x, start with 512Mi, allkeys-lru eviction.\n\
             Connections: pool 10-20 per instance, 30s timeout, retry with backoff.",
        )
        .with_metadata("title", "Database Configuration Guidelines")
        .with_metadata("category", "databases")
        .with_metadata("source", "database-ops-handbook"),
        DocumentInput::new(
            "monitoring-setup",
            "# Monitoring and Observability\n\n\
             Track request rate, error rate, p50/p95/p99 latency, CPU and memory,\n\
             query performance and cache hit ratio. Use structured JSON logs with\n\
             correlation IDs. Alert when errors exceed 5% or p95 exceeds 1s.\n\
             Trace every service with OpenTelemetry, sampling 10-20% of requests.",
        )
        .with_metadata("title", "Monitoring and Observability")
        .with_metadata("category", "operations")
        .with_metadata("source", "sre-playbook"),
    ]
}
