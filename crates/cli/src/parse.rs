//! Turns parsed arguments into a run plan.

use clap::ArgMatches;
use std::path::PathBuf;
use verso_engine::{OutputFormat, VersoConfig, CONFIG_FILE_NAME};

/// What the binary should do
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Print the starter configuration
    PrintDefaultConfig,
    /// Load the configuration and print its weights
    ShowWeights(RunOptions),
    /// Decode the input
    Decode(RunOptions),
}

/// Everything needed to load the decoder and run a batch
#[derive(Debug, PartialEq)]
pub struct RunOptions {
    pub config: PathBuf,
    /// `None` reads stdin
    pub input: Option<PathBuf>,
    pub format: OutputFormat,
    pub nbest: Option<NBestOutput>,
    /// Search-graph file
    pub search_graph: Option<PathBuf>,
    pub overrides: SearchOverrides,
}

/// Where n-best lists go and how long they are
#[derive(Debug, PartialEq)]
pub struct NBestOutput {
    /// `None` writes to stdout
    pub path: Option<PathBuf>,
    pub size: usize,
    pub distinct: bool,
}

/// Command-line values that replace `[search]` settings
#[derive(Debug, Default, PartialEq)]
pub struct SearchOverrides {
    pub threads: Option<usize>,
    pub algorithm: Option<String>,
    pub stack_size: Option<usize>,
    pub distortion_limit: Option<i32>,
    pub pop_limit: Option<usize>,
}

impl SearchOverrides {
    /// Write the overrides into `config`
    pub fn apply(&self, config: &mut VersoConfig) {
        let search = &mut config.search;
        if let Some(threads) = self.threads {
            search.threads = threads;
        }
        if let Some(algorithm) = self.algorithm.as_deref() {
            search.algorithm = match algorithm {
                "cube-pruning" => verso_engine::Algorithm::CubePruning,
                _ => verso_engine::Algorithm::Normal,
            };
        }
        if let Some(stack_size) = self.stack_size {
            search.stack_size = stack_size;
        }
        if let Some(limit) = self.distortion_limit {
            search.distortion_limit = limit;
        }
        if let Some(pop_limit) = self.pop_limit {
            search.pop_limit = pop_limit;
        }
    }
}

impl RunOptions {
    /// Apply every command-line setting to a loaded configuration
    pub fn configure(&self, config: &mut VersoConfig) {
        self.overrides.apply(config);
        if let Some(nbest) = &self.nbest {
            config.search.nbest_size = nbest.size;
            config.search.nbest_distinct = nbest.distinct;
        }
        if self.search_graph.is_some() {
            config.search.search_graph = true;
        }
    }
}

/// Interpret the matches produced by [`build_cli`](crate::commands::build_cli)
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    if matches.get_flag("print-default-config") {
        return Ok(CliAction::PrintDefaultConfig);
    }

    let config = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let input = matches
        .get_one::<String>("input")
        .filter(|path| path.as_str() != "-")
        .map(PathBuf::from);

    let format = if matches.get_flag("json") {
        OutputFormat::Json
    } else if matches.get_flag("report-scores") {
        OutputFormat::Scores
    } else {
        OutputFormat::Plain
    };

    let nbest = match matches.get_many::<String>("n-best-list") {
        Some(values) => {
            let values: Vec<&String> = values.collect();
            let size = values[1]
                .parse::<usize>()
                .map_err(|_| format!("n-best size must be a non-negative integer, got '{}'", values[1]))?;
            Some(NBestOutput {
                path: (values[0].as_str() != "-").then(|| PathBuf::from(values[0])),
                size,
                distinct: matches.get_flag("distinct"),
            })
        }
        None => None,
    };

    let search_graph = matches.get_one::<String>("output-search-graph").map(PathBuf::from);

    let overrides = SearchOverrides {
        threads: matches.get_one::<usize>("threads").copied(),
        algorithm: matches.get_one::<String>("search-algorithm").cloned(),
        stack_size: matches.get_one::<usize>("stack").copied(),
        distortion_limit: matches.get_one::<i32>("distortion-limit").copied(),
        pop_limit: matches.get_one::<usize>("cube-pruning-pop-limit").copied(),
    };

    let options = RunOptions {
        config,
        input,
        format,
        nbest,
        search_graph,
        overrides,
    };
    if matches.get_flag("show-weights") {
        Ok(CliAction::ShowWeights(options))
    } else {
        Ok(CliAction::Decode(options))
    }
}
