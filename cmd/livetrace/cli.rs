use std::path::PathBuf;

use clap::{Parser as ClapParser, Subcommand as ClapSubcommand, ValueEnum};
use livetrace::ExecutionContext;
use tracing::{Level, info};

use crate::initializers::{
    build_demo_chain, init_live_tracer, init_tracer_registry, init_tracing, load_chain_config,
};

#[allow(clippy::upper_case_acronyms)]
#[derive(ClapParser)]
#[command(
    name = "livetrace",
    author = "Lambdaclass",
    version,
    about = "Runs blocks through the in-memory engine with a live EVM tracer attached"
)]
pub struct CLI {
    #[command(flatten)]
    pub opts: Options,
    #[command(subcommand)]
    pub command: Option<Subcommand>,
}

#[derive(ClapParser, Debug, Clone)]
pub struct Options {
    #[arg(
        long = "live-evm-tracer",
        value_name = "TRACER",
        help = "Live tracer to attach to block execution.",
        long_help = "Either a registered tracer name such as `log`, or a URL whose scheme is the tracer name, e.g. `log://?level=debug`. The rest of the URL is handed to the tracer as its configuration. Tracing is disabled when not set.",
        help_heading = "Tracing options",
        env = "LIVETRACE_LIVE_EVM_TRACER"
    )]
    pub live_evm_tracer: Option<String>,
    #[arg(
        long = "chain-config",
        value_name = "CHAIN_CONFIG_FILE_PATH",
        help = "Receives a `ChainConfig` in json format.",
        long_help = "If not specified, a mainnet-like config with chain id 1 is used.",
        help_heading = "Node options",
        env = "LIVETRACE_CHAIN_CONFIG"
    )]
    pub chain_config: Option<PathBuf>,
    #[arg(
        long = "blocks",
        value_name = "COUNT",
        default_value_t = 3,
        help = "Number of demo blocks to execute.",
        help_heading = "Node options",
        env = "LIVETRACE_BLOCKS"
    )]
    pub blocks: u64,
    #[arg(
        long = "log.level",
        default_value_t = Level::INFO,
        value_name = "LOG_LEVEL",
        env = "LIVETRACE_LOG_LEVEL",
        help = "The verbosity level used for logs.",
        long_help = "Possible values: info, debug, trace, warn, error",
        help_heading = "Node options"
    )]
    pub log_level: Level,
    #[arg(
        long = "log.color",
        value_enum,
        ignore_case = true,
        default_value_t = LogColor::Auto,
        help = "Output logs with ANSI color codes.",
        help_heading = "Node options",
        env = "LIVETRACE_LOG_COLOR"
    )]
    pub log_color: LogColor,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            live_evm_tracer: None,
            chain_config: None,
            blocks: 3,
            log_level: Level::INFO,
            log_color: Default::default(),
        }
    }
}

#[derive(ClapSubcommand)]
pub enum Subcommand {
    #[command(name = "list-tracers", about = "List the live tracers compiled into this binary")]
    ListTracers,
}

impl Subcommand {
    pub fn run(self, _opts: &Options) -> eyre::Result<()> {
        match self {
            Subcommand::ListTracers => {
                for selector in init_tracer_registry().selectors() {
                    println!("{selector}");
                }
            }
        }
        Ok(())
    }
}

/// Executes the demo chain with the configured live tracer.
pub fn run(opts: &Options) -> eyre::Result<()> {
    init_tracing(opts)?;

    let chain_config = load_chain_config(opts)?;
    let ctx = init_live_tracer(opts, &chain_config)?;

    let (mut blockchain, blocks) = build_demo_chain(chain_config, opts.blocks);
    for block in &blocks {
        blockchain.process_block(&ctx, block)?;
    }
    // Feeding a block twice shows how tracers see skipped blocks.
    if let Some(last) = blocks.last() {
        blockchain.process_block(&ctx, last)?;
    }

    close_live_tracer(&ctx);
    info!(blocks = blocks.len(), "Done");
    Ok(())
}

fn close_live_tracer(ctx: &ExecutionContext) {
    if let Some(tracer) = livetrace::get_ctx_live_tracer(ctx) {
        tracer.close();
    }
}

/// When to emit ANSI colors. `auto` colors only when stdout is a terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogColor {
    #[default]
    Auto,
    Always,
    Never,
}
