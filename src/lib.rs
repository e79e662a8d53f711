//! GlySearch - AI-assisted structured search for glycans and proteins
//!
//! This library turns natural-language search queries into validated,
//! canonical search parameters: a rate-limited LLM extraction client, a
//! per-domain response validator, a deterministic parameter mapper, and a
//! content-hash search cache.

#![allow(clippy::uninlined_format_args)] // Style preference
#![allow(clippy::return_self_not_must_use)] // Builder pattern is clear enough
#![allow(clippy::items_after_statements)] // Locally-scoped use statements are fine

pub mod audit;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod llm;
pub mod logger;
pub mod mapper;
pub mod pipeline;
pub mod providers;
pub mod rate_limiter;
pub mod schema;

// Re-export important structs and functions for easier testing
pub use config::Config;
pub use domain::SearchDomain;
pub use errors::{ErrorResponse, SearchError};
pub use pipeline::{SearchOutcome, SearchPipeline};
pub use providers::{Provider, ProviderConfig};
pub use rate_limiter::RateLimiter;
