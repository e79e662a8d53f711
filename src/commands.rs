//! Command handlers for the CLI.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audit::AuditLog;
use crate::cache::{MemoryStore, SearchCache};
use crate::config::Config;
use crate::domain::SearchDomain;
use crate::errors::SearchError;
use crate::llm::gemini::GeminiProvider;
use crate::llm::openai::OpenAiProvider;
use crate::llm::{ExtractionClient, ExtractionOptions, ExtractionProvider};
use crate::pipeline::{SearchOutcome, SearchPipeline};
use crate::providers::{Provider, ProviderConfig};
use crate::rate_limiter::RateLimiter;
use crate::{log_debug, log_warn};

/// Endpoint label recorded in the audit log
const AI_SEARCH_ENDPOINT: &str = "ai_search";

/// Handle the `query` command
pub async fn handle_query(
    query: String,
    domain: SearchDomain,
    provider_override: Option<String>,
    json_output: bool,
) -> Result<()> {
    let config = Config::load()?;
    let pipeline = build_pipeline(&config, domain, provider_override)?;

    let started = Instant::now();
    let result = pipeline.run(&query).await;
    let duration = started.elapsed().as_secs_f64();

    let status_code = match &result {
        Ok(_) => 200,
        Err(e) => e.status_code(),
    };
    record_audit(&config, &query, duration, status_code);

    match result {
        Ok(outcome) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome, duration);
            }
            Ok(())
        }
        Err(e) => {
            let response = e.to_response();
            eprintln!("{}", serde_json::to_string_pretty(&response)?);
            Err(anyhow::anyhow!("search failed ({}): {}", status_code, e))
        }
    }
}

/// Handle the `config` command
pub fn handle_config(
    provider: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let mut config = Config::load()?;

    let changed = provider.is_some() || api_key.is_some() || model.is_some();
    if changed {
        config.update(provider, api_key, model)?;
        config.save()?;
        println!("{}", "Configuration updated.".green());
    }

    println!("{} {}", "Default provider:".cyan().bold(), config.default_provider);
    for (name, provider_config) in &config.providers {
        let key_state = if provider_config.has_api_key() {
            "set".green()
        } else {
            "not set".yellow()
        };
        println!(
            "  {name}: model={}, api_key={key_state}",
            provider_config.model
        );
    }
    println!(
        "{} {} requests / {}s",
        "Rate limit:".cyan().bold(),
        config.rate_limit.max_requests,
        config.rate_limit.time_window_seconds
    );
    Ok(())
}

/// Assemble the pipeline from configuration
fn build_pipeline(
    config: &Config,
    domain: SearchDomain,
    provider_override: Option<String>,
) -> Result<SearchPipeline> {
    let provider_name = provider_override.unwrap_or_else(|| config.default_provider.clone());
    let provider: Provider = provider_name.parse()?;
    let provider_config = config
        .get_provider_config(provider.name())
        .cloned()
        .unwrap_or_else(|| ProviderConfig::with_defaults(provider));

    log_debug!("Using provider `{provider}` for {domain} search");

    let llm_provider: Box<dyn ExtractionProvider> = match provider {
        Provider::OpenAI => Box::new(OpenAiProvider::from_config(&provider_config)),
        Provider::Google => Box::new(GeminiProvider::from_config(&provider_config)),
    };

    let options = ExtractionOptions {
        max_tokens: config.search.max_tokens,
        max_retries: config.search.max_retries,
        call_timeout: Duration::from_secs(config.search.request_timeout_seconds),
    };
    let client = ExtractionClient::new(llm_provider, domain, options);

    let rate_limiter = Arc::new(RateLimiter::from_env(
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.time_window_seconds),
    ));

    let store = Arc::new(MemoryStore::default());
    let cache = SearchCache::new(store, config.cache.clone());

    Ok(SearchPipeline::new(rate_limiter, client, cache))
}

/// Best-effort audit recording; failures are logged and swallowed
fn record_audit(config: &Config, query: &str, duration: f64, status_code: u16) {
    if !config.audit.enabled {
        return;
    }
    let path = match &config.audit.db_path {
        Some(path) => path.clone(),
        None => match Config::default_audit_db_path() {
            Ok(path) => path,
            Err(e) => {
                log_warn!("Could not resolve audit database path: {e}");
                return;
            }
        },
    };
    let request = json!({"query": query});
    let recorded = AuditLog::open(&path)
        .and_then(|log| log.record(AI_SEARCH_ENDPOINT, &request, duration, status_code));
    if let Err(e) = recorded {
        log_warn!("Failed to record audit entry: {e}");
    }
}

fn print_outcome(outcome: &SearchOutcome, duration: f64) {
    println!("{}", "Parsed parameters".magenta().bold());
    match serde_json::to_string_pretty(&outcome.parsed_parameters) {
        Ok(rendered) => println!("{rendered}"),
        Err(_) => println!("{:?}", outcome.parsed_parameters),
    }
    println!();
    println!("{}", "Mapped query".magenta().bold());
    match serde_json::to_string_pretty(&outcome.mapped_parameters) {
        Ok(rendered) => println!("{rendered}"),
        Err(_) => println!("{:?}", outcome.mapped_parameters),
    }
    println!();
    if let Some(list_id) = &outcome.list_id {
        println!("{} {list_id}", "Cache key:".cyan().bold());
    }
    if let Some(storage_error) = &outcome.storage_error {
        println!(
            "{} {}",
            "Caching failed:".yellow().bold(),
            storage_error.error.error_msg
        );
    }
    println!("{} {duration:.2}s", "Elapsed:".cyan().bold());
}

/// Convenience used by tests and embedders to render a pipeline error the way
/// the CLI does
pub fn error_payload(error: &SearchError) -> (u16, serde_json::Value) {
    let response = error.to_response();
    (
        error.status_code(),
        serde_json::to_value(response).unwrap_or(serde_json::Value::Null),
    )
}
