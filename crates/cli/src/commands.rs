//! Clap command definition.

use clap::{Arg, ArgAction, Command};

/// Build the `verso` command line.
pub fn build_cli() -> Command {
    Command::new("verso")
        .about("Phrase-based statistical machine translation decoder")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("config")
                .long("config")
                .short('f')
                .value_name("PATH")
                .help("Decoder configuration (default: ./verso.toml)"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .value_name("PATH")
                .help("Source sentences, one per line ('-' or absent for stdin)"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Worker threads (overrides search.threads)"),
        )
        // Search overrides
        .arg(
            Arg::new("search-algorithm")
                .long("search-algorithm")
                .value_name("ALGORITHM")
                .value_parser(["normal", "cube-pruning"])
                .help("Stack decoding variant"),
        )
        .arg(
            Arg::new("stack")
                .long("stack")
                .short('s')
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Maximum hypotheses per stack"),
        )
        .arg(
            Arg::new("distortion-limit")
                .long("distortion-limit")
                .value_name("N")
                .value_parser(clap::value_parser!(i32))
                .allow_negative_numbers(true)
                .help("Maximum reordering jump (negative for unlimited)"),
        )
        .arg(
            Arg::new("cube-pruning-pop-limit")
                .long("cube-pruning-pop-limit")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Hypotheses popped per stack in cube pruning"),
        )
        // Output
        .arg(
            Arg::new("report-scores")
                .long("report-scores")
                .action(ArgAction::SetTrue)
                .conflicts_with("json")
                .help("Prefix each translation with its total score"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("One JSON object per sentence"),
        )
        .arg(
            Arg::new("n-best-list")
                .long("n-best-list")
                .num_args(2)
                .value_names(["FILE", "N"])
                .help("Write the N best translations of each sentence to FILE ('-' for stdout)"),
        )
        .arg(
            Arg::new("distinct")
                .long("distinct")
                .action(ArgAction::SetTrue)
                .requires("n-best-list")
                .help("Only list distinct target strings in the n-best list"),
        )
        .arg(
            Arg::new("output-search-graph")
                .long("output-search-graph")
                .value_name("FILE")
                .help("Write the search graph of each sentence to FILE"),
        )
        // Informational
        .arg(
            Arg::new("show-weights")
                .long("show-weights")
                .action(ArgAction::SetTrue)
                .help("Print feature weights and exit"),
        )
        .arg(
            Arg::new("print-default-config")
                .long("print-default-config")
                .action(ArgAction::SetTrue)
                .help("Print a starter configuration and exit"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("More logging on stderr (-v debug, -vv trace)"),
        )
}
