//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{load_definition, DefinitionFile, EngineConfig, SourceQuery};
use crate::engine::FetchEngine;
use crate::error::{Error, Result};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch {
                query,
                max_chunks,
                stats,
            } => self.fetch(query.as_deref(), *max_chunks, *stats).await,
            Commands::Validate => self.validate(),
        }
    }

    /// Load the definition file named on the command line
    fn load_definition(&self) -> Result<DefinitionFile> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Definition file not specified (use -c flag)"))?;
        load_definition(path)
    }

    /// Run one query (or all of them) and print chunks as JSON lines
    async fn fetch(
        &self,
        query_name: Option<&str>,
        max_chunks: Option<usize>,
        print_stats: bool,
    ) -> Result<()> {
        let definition = self.load_definition()?;
        let engine = FetchEngine::new(EngineConfig::from_env())?;

        let queries: Vec<&SourceQuery> = match query_name {
            Some(name) => {
                let query = definition.query(name).ok_or_else(|| {
                    Error::config(format!("Query '{name}' not found in definition"))
                })?;
                vec![query]
            }
            None => definition.queries.iter().collect(),
        };

        if queries.is_empty() {
            return Err(Error::config("Definition file contains no queries"));
        }

        for query in queries {
            info!("Running query '{}'", query.name);
            let fetcher = engine.fetcher(&definition.source, query).await;
            let mut stream = fetcher.stream()?;

            let mut count = 0usize;
            while let Some(chunk) = stream.try_next().await? {
                println!("{}", serde_json::to_string(&chunk.value)?);
                count += 1;
                if max_chunks.is_some_and(|max| count >= max) {
                    info!("Reached chunk limit for query '{}'", query.name);
                    break;
                }
            }

            if print_stats {
                let stats = fetcher.stats();
                eprintln!(
                    "{}: {} chunks, {} requests, {} cache hits, {} records",
                    query.name, count, stats.requests, stats.cache_hits, stats.records
                );
            }
        }

        Ok(())
    }

    /// Validate a definition file and print a summary
    fn validate(&self) -> Result<()> {
        let definition = self.load_definition()?;

        println!("Definition is valid");
        println!("Source: {}", definition.source.name);
        for query in &definition.queries {
            println!(
                "  {} {} ({} pagination)",
                query.method,
                if query.path.is_empty() {
                    "<base>"
                } else {
                    &query.path
                },
                query.pagination.kind()
            );
        }

        Ok(())
    }
}
