//! Verso CLI: batch translation from the command line.
//!
//! Reads one source sentence per line from a file or stdin, decodes with the
//! configured model on a worker pool, and writes one line per sentence to
//! stdout in input order. N-best lists and search graphs go to their own
//! files. Logging goes to stderr.

mod commands;
mod parse;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process;
use std::sync::Arc;

use tracing::Level;
use verso_engine::{format_weights, DecodePool, DecoderContext, OutputCollector, SideOutputs, VersoConfig};

use commands::build_cli;
use parse::{matches_to_action, CliAction, RunOptions};

type SideWriter = Box<dyn Write + Send>;

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    let exit_code = match action {
        CliAction::PrintDefaultConfig => {
            print!("{}", VersoConfig::default_toml());
            0
        }
        CliAction::ShowWeights(options) => match load(&options) {
            Ok(context) => {
                print!("{}", format_weights(&context.weights()));
                0
            }
            Err(e) => {
                eprintln!("{}", e);
                1
            }
        },
        CliAction::Decode(options) => match load(&options) {
            Ok(context) => match decode(&options, context) {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("{}", e);
                    1
                }
            },
            Err(e) => {
                eprintln!("{}", e);
                1
            }
        },
    };
    process::exit(exit_code);
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load(options: &RunOptions) -> Result<Arc<DecoderContext>, String> {
    let mut config = VersoConfig::from_file(&options.config)
        .map_err(|e| format!("Failed to read {}: {}", options.config.display(), e))?;
    options.configure(&mut config);
    let context = DecoderContext::from_config(config).map_err(|e| format!("Failed to load decoder: {}", e))?;
    Ok(Arc::new(context))
}

fn decode(options: &RunOptions, context: Arc<DecoderContext>) -> Result<(), String> {
    let input: Box<dyn BufRead + Send> = match &options.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let nbest: Option<OutputCollector<SideWriter>> = match &options.nbest {
        Some(nbest) => {
            let writer: SideWriter = match &nbest.path {
                Some(path) => create(path)?,
                None => Box::new(io::stdout()),
            };
            Some(OutputCollector::new(writer))
        }
        None => None,
    };
    let graph: Option<OutputCollector<SideWriter>> = match &options.search_graph {
        Some(path) => Some(OutputCollector::new(create(path)?)),
        None => None,
    };

    let output = OutputCollector::new(io::stdout());
    let side = SideOutputs {
        nbest: nbest.as_ref(),
        search_graph: graph.as_ref(),
    };
    DecodePool::new(context)
        .run(input.lines(), options.format, &output, side)
        .map_err(|e| format!("Decoding aborted: {}", e))?;
    Ok(())
}

fn create(path: &Path) -> Result<SideWriter, String> {
    let file = File::create(path).map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
    Ok(Box::new(BufWriter::new(file)))
}
