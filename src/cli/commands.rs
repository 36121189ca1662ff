//! CLI commands implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;

use indexfilters::config::{keys, Configuration};
use indexfilters::indexer::{create_filter, resolve_output_dir, IndexingFilters};
use indexfilters::models::{CrawlDatum, IndexDocument, Inlinks, Parse};
use indexfilters::services::{CaptionOptions, CaptionRetriever, YtDlpCaptionSource};

#[derive(Parser)]
#[command(name = "indexfilters")]
#[command(about = "Run indexing filters over a single page")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "INDEXFILTERS_CONFIG")]
    config: Option<PathBuf>,

    /// Override a config property (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", global = true, value_parser = parse_key_value)]
    overrides: Vec<(String, String)>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the filter chain over one page and print the document as JSON
    Index {
        /// Page URL
        #[arg(long)]
        url: String,
        /// Parsed text of the page
        #[arg(long, conflicts_with = "text_file", required_unless_present = "text_file")]
        text: Option<String>,
        /// Read the parsed text from a file
        #[arg(long)]
        text_file: Option<PathBuf>,
        /// Page title
        #[arg(long)]
        title: Option<String>,
        /// Filters to run, in order (default: indexingfilter.order)
        #[arg(long, value_delimiter = ',')]
        filters: Vec<String>,
    },

    /// Download and print the default caption track of a video
    Captions {
        /// Video URL
        #[arg(short = 'i', long = "input")]
        input: String,
        /// Directory for caption files
        #[arg(short = 'o', long = "output-dir")]
        output_dir: Option<String>,
        /// Verbose downloader output; keep caption files
        #[arg(short, long)]
        debug: bool,
        /// Prepend the video title
        #[arg(short = 't', long)]
        include_title: bool,
        /// Prepend the track title
        #[arg(short = 'r', long)]
        include_track_title: bool,
        /// Omit cue timestamps; `-m false` keeps them (default: configured value)
        #[arg(
            short = 'm',
            long,
            value_name = "BOOL",
            num_args = 0..=1,
            default_missing_value = "true"
        )]
        remove_timing: Option<bool>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

async fn load_configuration(
    path: Option<&Path>,
    overrides: &[(String, String)],
) -> anyhow::Result<Configuration> {
    let mut conf = match path {
        Some(path) => Configuration::load_from_path(path).await?,
        None => Configuration::load().await,
    };
    for (key, value) in overrides {
        conf.set(key.clone(), value.clone());
    }
    Ok(conf)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let conf = load_configuration(cli.config.as_deref(), &cli.overrides).await?;

    match cli.command {
        Commands::Index {
            url,
            text,
            text_file,
            title,
            filters,
        } => cmd_index(&conf, &url, text, text_file, title, &filters).await,
        Commands::Captions {
            input,
            output_dir,
            debug,
            include_title,
            include_track_title,
            remove_timing,
        } => {
            let mut options = CaptionOptions::from_conf(&conf);
            options.debug |= debug;
            options.include_title |= include_title;
            options.include_track_title |= include_track_title;
            if let Some(remove_timing) = remove_timing {
                options.remove_timing = remove_timing;
            }

            let output_dir = output_dir.or_else(|| conf.get(keys::OUTPUT_DIR).map(str::to_string));
            cmd_captions(&conf, &input, output_dir.as_deref(), options).await
        }
    }
}

async fn cmd_index(
    conf: &Configuration,
    url: &str,
    text: Option<String>,
    text_file: Option<PathBuf>,
    title: Option<String>,
    filters: &[String],
) -> anyhow::Result<()> {
    let text = match (text, text_file) {
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("either --text or --text-file is required"),
    };

    let mut parse = Parse::new(text);
    if let Some(title) = title {
        parse = parse.with_title(title);
    }

    let chain = if filters.is_empty() {
        IndexingFilters::from_conf(conf)?
    } else {
        let built = filters
            .iter()
            .map(|name| create_filter(name, conf))
            .collect::<Result<Vec<_>, _>>()?;
        IndexingFilters::new(built)
    };

    let doc = chain
        .filter(
            IndexDocument::new(),
            &parse,
            url,
            &CrawlDatum::default(),
            &Inlinks::default(),
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

async fn cmd_captions(
    conf: &Configuration,
    url: &str,
    output_dir: Option<&str>,
    options: CaptionOptions,
) -> anyhow::Result<()> {
    let output_dir = resolve_output_dir(output_dir).await;
    let source = Arc::new(YtDlpCaptionSource::from_conf(conf));
    let retriever = CaptionRetriever::new(url, output_dir, options, source);

    match retriever.retrieve().await {
        Some(doc) => {
            println!("{}", retriever.process(&doc));
            Ok(())
        }
        None => {
            eprintln!("{} No captions available for {}", style("✗").red(), url);
            std::process::exit(1);
        }
    }
}
