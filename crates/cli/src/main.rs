use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use jsplit_chunker::{ChunkStrategy, Chunker, ChunkerConfig, FileErrorPolicy};
use std::path::PathBuf;

mod emit;

use emit::Target;

#[derive(Parser)]
#[command(name = "jsplit")]
#[command(about = "Split JavaScript into dependency-aware, size-bounded chunks", long_about = None)]
#[command(version)]
struct Cli {
    /// Input JavaScript files, processed in order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory for chunks, manifest and entry script
    #[arg(short, long, default_value = "dist")]
    out_dir: PathBuf,

    /// Packing strategy
    #[arg(long, value_enum, default_value_t = StrategyFlag::Auto)]
    strategy: StrategyFlag,

    /// Byte budget per chunk
    #[arg(long, default_value_t = jsplit_chunker::DEFAULT_MAX_CHUNK_SIZE)]
    max_chunk_size: usize,

    /// Best-effort lower bound per chunk, in bytes
    #[arg(long)]
    min_chunk_size: Option<usize>,

    /// Loader flavor to emit alongside the chunks
    #[arg(long, value_enum, default_value_t = TargetFlag::Browser)]
    target: TargetFlag,

    /// Entry script filename, overriding the target's default
    /// (loader.js for browser, index.js for node)
    #[arg(long)]
    entry_name: Option<String>,

    /// Continue past input files that fail instead of aborting the run
    #[arg(long)]
    skip_failures: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log only warnings and errors
    #[arg(long)]
    quiet: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum StrategyFlag {
    Aggressive,
    Conservative,
    Auto,
}

impl StrategyFlag {
    const fn as_domain(self) -> ChunkStrategy {
        match self {
            StrategyFlag::Aggressive => ChunkStrategy::Aggressive,
            StrategyFlag::Conservative => ChunkStrategy::Conservative,
            StrategyFlag::Auto => ChunkStrategy::Auto,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum TargetFlag {
    Browser,
    Node,
}

impl TargetFlag {
    const fn as_domain(self) -> Target {
        match self {
            TargetFlag::Browser => Target::Browser,
            TargetFlag::Node => Target::Node,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = ChunkerConfig {
        strategy: cli.strategy.as_domain(),
        max_chunk_size: cli.max_chunk_size,
        min_chunk_size: cli.min_chunk_size,
    };
    let mut chunker = Chunker::new(config).context("invalid configuration")?;

    let policy = if cli.skip_failures {
        FileErrorPolicy::Skip
    } else {
        FileErrorPolicy::Abort
    };

    let target = cli.target.as_domain();
    let mut chunks = chunker
        .chunk_files(&cli.inputs, policy)
        .context("chunking failed")?;

    if chunks.is_empty() {
        anyhow::bail!("no chunks produced from {} input file(s)", cli.inputs.len());
    }

    if target == Target::Node {
        emit::append_export_footers(&mut chunks);
    }

    let entry_name = cli.entry_name.as_deref().unwrap_or(target.entry_name());

    // Manifest is derived after any content rewrite so sizes stay honest
    let manifest = chunker.manifest(&chunks, entry_name);
    emit::write_artifacts(&cli.out_dir, &chunks, &manifest, target, entry_name)
        .with_context(|| format!("writing artifacts to {}", cli.out_dir.display()))?;

    println!(
        "{} file(s) -> {} chunk(s) in {} [{}]",
        cli.inputs.len(),
        chunks.len(),
        cli.out_dir.display(),
        Chunker::get_stats(&chunks)
    );

    Ok(())
}
