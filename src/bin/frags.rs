use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use frag_scan::*;
use log::{info, warn};

/// Report feature fragment hits in DNA sequences.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Feature file (count line + `feature,fragment,mask,seq,shift` records)
    features: PathBuf,

    /// Sequence files to scan
    #[arg(required = true)]
    sequences: Vec<PathBuf>,

    /// Treat sequences as linear (no wrap-around sites)
    #[arg(long, default_value_t = false)]
    linear: bool,

    /// Maximum number of bases read per sequence
    #[arg(long, default_value_t = MAX_SEQ_LEN)]
    max_len: usize,

    /// Threads used to scan files in parallel
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = ScanConfig::default()
        .circular(!args.linear)
        .max_seq_len(args.max_len);
    let cfg = match args.threads {
        Some(n) => cfg.threads(n),
        None => cfg,
    };
    if let Some(n) = cfg.thread_count() {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok();
    }

    let store = FeatureStore::load_path(&args.features)
        .with_context(|| format!("loading features from {}", args.features.display()))?;
    let index = KmerIndex::build(store);
    info!(
        "indexed {} descriptors ({} degenerate)",
        index.store().len(),
        index.store().degenerate().len()
    );

    let mut names = Vec::with_capacity(args.sequences.len());
    let mut seqs = Vec::with_capacity(args.sequences.len());
    for path in &args.sequences {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                continue;
            }
        };
        let seq = cfg.prepare(&raw);
        if seq.truncated() {
            warn!("{} cut off at {} (max)", path.display(), seq.len());
        }
        names.push(path);
        seqs.push(seq);
    }

    let results = scan_batch(&index, &seqs, &cfg);

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for ((path, seq), matches) in names.iter().zip(&seqs).zip(&results) {
        writeln!(out, "======{} {}", seq.len(), path.display())?;
        for m in matches {
            writeln!(out, "{m}")?;
        }
    }
    out.flush()?;
    Ok(())
}
