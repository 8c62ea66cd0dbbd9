//! Binary entry point for the `rlzs` command-line tool.
//!
//! Parses arguments with `clap`, wires a [`rlzstore::Config`], and dispatches
//! to the orchestrator. `run(args) -> Result<()>` does the dispatch work;
//! `main` handles only argv parsing and the final `process::exit`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use rlzstore::collection::CollectionStore;
use rlzstore::config::{BlockMapKind, Config, SelectionPolicyKind};
use rlzstore::coder::CoderKind;
use rlzstore::RlzBuilder;

#[derive(Parser)]
#[command(name = "rlzs", version = rlzstore::VERSION_STRING, about = "RLZ compressed collection store")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (0 = silent, 5 = trace).
    #[arg(short, long, global = true, default_value_t = 1)]
    verbose: i32,
}

#[derive(Subcommand)]
enum Command {
    /// Build (or refresh) the index for a collection.
    Build {
        #[arg(short = 'c', long = "collection")]
        collection_dir: PathBuf,
        #[arg(long)]
        rebuild: bool,
        #[arg(long)]
        threads: Option<usize>,
        #[arg(long = "dict-size")]
        dict_size: Option<u64>,
        #[arg(long = "dict-block-size")]
        dict_block_size: Option<u32>,
        #[arg(long = "estimator-window")]
        estimator_window: Option<u32>,
        #[arg(long = "factorization-block-size")]
        factorization_block_size: Option<u32>,
        #[arg(long = "heavy-threshold")]
        heavy_threshold: Option<u64>,
        #[arg(long = "selection-policy", value_enum, default_value_t = SelectionPolicyArg::SaSample)]
        selection_policy: SelectionPolicyArg,
        #[arg(long, value_enum, default_value_t = CoderArg::Vbyte)]
        coder: CoderArg,
    },
    /// Extract one factorization block from an already-built collection.
    Extract {
        #[arg(short = 'c', long = "collection")]
        collection_dir: PathBuf,
        #[arg(long)]
        block: usize,
    },
    /// Print summary statistics about a built collection.
    Stats {
        #[arg(short = 'c', long = "collection")]
        collection_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SelectionPolicyArg {
    First,
    Random,
    #[value(name = "sa-sample")]
    SaSample,
}

impl From<SelectionPolicyArg> for SelectionPolicyKind {
    fn from(v: SelectionPolicyArg) -> Self {
        match v {
            SelectionPolicyArg::First => SelectionPolicyKind::First,
            SelectionPolicyArg::Random => SelectionPolicyKind::Random,
            SelectionPolicyArg::SaSample => SelectionPolicyKind::SuffixArraySample,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CoderArg {
    U32,
    Vbyte,
}

impl From<CoderArg> for CoderKind {
    fn from(v: CoderArg) -> Self {
        match v {
            CoderArg::U32 => CoderKind::U32Raw,
            CoderArg::Vbyte => CoderKind::VarByte,
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    rlzstore::log::set_display_level(cli.verbose);

    match cli.command {
        Command::Build {
            collection_dir,
            rebuild,
            threads,
            dict_size,
            dict_block_size,
            estimator_window,
            factorization_block_size,
            heavy_threshold,
            selection_policy,
            coder,
        } => {
            let mut cfg = Config::default();
            cfg.rebuild = rebuild;
            if let Some(t) = threads {
                cfg.num_threads = t;
            }
            if let Some(s) = dict_size {
                cfg.budget_bytes = s;
            }
            if let Some(b) = dict_block_size {
                cfg.sample_block_size = b;
            }
            if let Some(w) = estimator_window {
                cfg.estimator_window = w;
            }
            if let Some(bf) = factorization_block_size {
                cfg.factorization_block_size = bf;
            }
            if let Some(t) = heavy_threshold {
                cfg.heavy_threshold = t;
            }
            cfg.selection_policy = selection_policy.into();
            cfg.coder = coder.into();
            cfg.block_map = BlockMapKind::Uncompressed;

            let mut collection = CollectionStore::open(&collection_dir)
                .with_context(|| format!("opening collection at {}", collection_dir.display()))?;
            let builder = RlzBuilder::new(cfg).context("validating configuration")?;
            let store = builder
                .build_or_load(&mut collection)
                .context("building RLZ index")?;
            println!(
                "built index: {} bytes, {} blocks, dict_hash={}",
                store.len(),
                store.num_blocks(),
                store.dict_hash()
            );
            Ok(())
        }
        Command::Extract { collection_dir, block } => {
            let mut collection = CollectionStore::open(&collection_dir)
                .with_context(|| format!("opening collection at {}", collection_dir.display()))?;
            let builder = RlzBuilder::new(Config::default())?;
            let store = builder.build_or_load(&mut collection)?;
            let bytes = store.extract_block(block).with_context(|| format!("extracting block {block}"))?;
            use std::io::Write;
            std::io::stdout().write_all(&bytes)?;
            Ok(())
        }
        Command::Stats { collection_dir } => {
            let mut collection = CollectionStore::open(&collection_dir)
                .with_context(|| format!("opening collection at {}", collection_dir.display()))?;
            let builder = RlzBuilder::new(Config::default())?;
            let store = builder.build_or_load(&mut collection)?;
            println!("text length: {}", store.len());
            println!("blocks: {}", store.num_blocks());
            println!("dict_hash: {}", store.dict_hash());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("rlzs: {e:#}");
        std::process::exit(1);
    }
}
