//! Data lake exporter CLI
//!
//! Runs GitHub and Stack Overflow exports against WebHDFS, or against a
//! local directory with `--local-root`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use datalake::{
    config,
    diagnostics::LogSink,
    error::Result,
    models::{Config, Order},
    pipeline,
    services::{RepositorySearchClient, TaggedQuestionScraper},
    storage::{AttributeStore, Datalake, FileSystem, LocalFileSystem, SystemClock, WebHdfs, XattrBackend},
    utils::{http::HttpTransport, log},
};
use serde_json::Value;

/// Data lake exporter for GitHub and Stack Overflow
#[derive(Parser, Debug)]
#[command(
    name = "datalake",
    version,
    about = "Export GitHub repositories and Stack Overflow questions into HDFS"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Store under a local directory instead of WebHDFS
    #[arg(long)]
    local_root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export repositories matching a search query
    Github {
        /// Search query, e.g. `stars:>1000 language:rust`
        query: String,

        /// Sort key (`stars`, `forks`, `updated`, ...)
        #[arg(long)]
        sort: Option<String>,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,

        /// First page to request
        #[arg(long, default_value_t = 1)]
        start_page: u32,

        /// Stop after storing this many repositories
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Export repositories for every tracked language
    Languages {
        #[arg(long)]
        sort: Option<String>,

        /// Per-language item limit
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Export questions carrying a tag
    Stackoverflow {
        tag: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// List stored objects
    List {
        #[arg(value_enum)]
        source: Source,

        /// Sub-path under the type directory, e.g. `2024/03`
        #[arg(long)]
        stem: Option<String>,

        /// Show attributes next to each path
        #[arg(long)]
        attrs: bool,
    },

    /// Print a stored object
    Get {
        #[arg(value_enum)]
        source: Source,

        /// Full path, or a path relative to the type directory
        path: String,
    },

    /// Show or change attributes of a stored object
    Attrs {
        #[arg(value_enum)]
        source: Source,

        path: String,

        /// Set `name=value` (repeatable)
        #[arg(long = "set", value_parser = parse_pair)]
        set: Vec<(String, String)>,

        /// Remove a named attribute (repeatable)
        #[arg(long = "remove")]
        remove: Vec<String>,

        /// Remove every attribute
        #[arg(long, conflicts_with_all = ["set", "remove"])]
        clear: bool,
    },

    /// Show remaining GitHub API quota
    RateLimit,

    /// Validate configuration
    Validate,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Source {
    Github,
    Stackoverflow,
}

impl Source {
    fn location(self) -> (&'static str, &'static str) {
        match self {
            Source::Github => ("github", "repositories"),
            Source::Stackoverflow => ("stackoverflow", "questions"),
        }
    }
}

fn parse_pair(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got {s:?}"))
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn open_lake(cli: &Cli, config: &Config, source: Source) -> Result<Datalake> {
    let (fs, xattrs): (Arc<dyn FileSystem>, Arc<dyn XattrBackend>) = match &cli.local_root {
        Some(root) => {
            let local = Arc::new(LocalFileSystem::new(root));
            (local.clone(), local)
        }
        None => {
            let hdfs = Arc::new(WebHdfs::new(&config.hdfs, &config.http)?);
            (hdfs.clone(), hdfs)
        }
    };

    let (name, kind) = source.location();
    let lake = Datalake::new(
        &config.lake.zone,
        name,
        kind,
        &SystemClock,
        fs,
        AttributeStore::new(xattrs),
    );
    log::header(&format!("Storing under {}", lake.storage_path()));
    Ok(lake)
}

fn github_client(config: &Config) -> Result<RepositorySearchClient> {
    Ok(RepositorySearchClient::new(
        Arc::new(HttpTransport::new(&config.http)?),
        &config.github,
        config::resolve_credentials(&config.github),
        LogSink::shared(),
    ))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::load_config(&cli.config);

    match &cli.command {
        Command::Github {
            query,
            sort,
            asc,
            start_page,
            limit,
        } => {
            let client = github_client(&config)?;
            let mut search = client
                .query(query.as_str())
                .order(if *asc { Order::Asc } else { Order::Desc })
                .start_page(*start_page);
            if let Some(sort) = sort {
                search = search.sort(sort.as_str());
            }

            let lake = open_lake(&cli, &config, Source::Github)?;
            pipeline::export_repositories(&client, &lake, &search, *limit)?.log("GitHub export");
        }

        Command::Languages { sort, limit } => {
            let client = github_client(&config)?;
            let lake = open_lake(&cli, &config, Source::Github)?;

            let results = pipeline::export_languages(&client, &lake, sort.as_deref(), *limit)?;
            log::summary(
                "Language export",
                &results
                    .iter()
                    .map(|(language, summary)| (*language, summary.stored.to_string()))
                    .collect::<Vec<_>>(),
            );
        }

        Command::Stackoverflow { tag, limit } => {
            let scraper = TaggedQuestionScraper::new(
                Arc::new(HttpTransport::new(&config.http)?),
                &config.stackoverflow,
                LogSink::shared(),
            )?;
            let lake = open_lake(&cli, &config, Source::Stackoverflow)?;
            pipeline::export_questions(&scraper, &lake, tag, *limit)?.log("Stack Overflow export");
        }

        Command::List {
            source,
            stem,
            attrs,
        } => {
            let lake = open_lake(&cli, &config, *source)?;
            let mut count = 0usize;
            for listing in lake.list(stem.as_deref(), *attrs) {
                println!("{}", listing?);
                count += 1;
            }
            ::log::info!("{count} objects");
        }

        Command::Get { source, path } => {
            let lake = open_lake(&cli, &config, *source)?;
            let body: Value = lake.get_json(path)?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Command::Attrs {
            source,
            path,
            set,
            remove,
            clear,
        } => {
            let lake = open_lake(&cli, &config, *source)?;
            let store = lake.attributes();
            let path = lake.resolve_path(path);
            let path = path.as_str();

            if *clear {
                store.remove_all_attributes(path)?;
            }
            if !set.is_empty() {
                let attrs: BTreeMap<String, String> = set.iter().cloned().collect();
                store.set_attributes(path, &attrs)?;
            }
            if !remove.is_empty() {
                let names: Vec<&str> = remove.iter().map(String::as_str).collect();
                store.remove_attributes(path, &names)?;
            }

            for (name, value) in store.get_attributes(path, &[])? {
                println!("{name} = {value}");
            }
        }

        Command::RateLimit => {
            let limits = github_client(&config)?.log_limits()?;
            log::summary(
                "GitHub rate limit",
                &[
                    ("core remaining", limits.core_remaining.to_string()),
                    ("search remaining", limits.search_remaining.to_string()),
                ],
            );
        }

        Command::Validate => {
            ::log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                ::log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if config::resolve_credentials(&config.github).is_none() {
                ::log::warn!("No GitHub credentials; searches run with the anonymous quota");
            }
            ::log::info!("Config OK");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("language=Rust").unwrap(),
            ("language".to_string(), "Rust".to_string())
        );
        assert_eq!(parse_pair("q=a=b").unwrap().1, "a=b");
        assert!(parse_pair("=x").is_err());
        assert!(parse_pair("plain").is_err());
    }

    #[test]
    fn test_cli_parses_attrs() {
        let cli = Cli::try_parse_from([
            "datalake",
            "--local-root",
            "/tmp/lake",
            "attrs",
            "github",
            "2024/03/07/1.json",
            "--set",
            "a=1",
            "--remove",
            "b",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Attrs { ref set, .. } if set.len() == 1));
    }
}
