//! Command-line interface definition.

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand, crate_version};

use crate::domain::SearchDomain;

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Magenta.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
}

/// AI-assisted structured search for glycans and proteins
#[derive(Parser)]
#[command(
    author,
    version = crate_version!(),
    about = "Extract structured glycan and protein search parameters from natural language",
    styles = get_styles()
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log to the specified file
    #[arg(short = 'l', long, global = true)]
    pub log_file: Option<String>,

    /// Print log output to stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a natural-language query through the extraction pipeline
    Query {
        /// The natural-language search query
        query: String,

        /// Target search domain
        #[arg(long, value_enum, default_value_t = SearchDomain::Glycan)]
        domain: SearchDomain,

        /// Override the configured LLM provider
        #[arg(long)]
        provider: Option<String>,

        /// Print the raw JSON outcome instead of the summary view
        #[arg(long)]
        json: bool,
    },
    /// Show or update configuration
    Config {
        /// Set the default LLM provider
        #[arg(long)]
        provider: Option<String>,

        /// Set the API key for the default provider
        #[arg(long)]
        api_key: Option<String>,

        /// Set the model for the default provider
        #[arg(long)]
        model: Option<String>,
    },
}
