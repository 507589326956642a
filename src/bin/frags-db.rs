use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use frag_scan::*;

/// Build a feature file from a list of named sequences.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input list: `name<TAB>sequence[<TAB>enzyme]` per line
    input: PathBuf,

    /// Output feature file
    #[arg(short, long)]
    output: PathBuf,

    /// Optional feature table output (index, name, strand, length)
    #[arg(long)]
    table: Option<PathBuf>,

    /// Minimum feature / tail fragment length
    #[arg(long, default_value_t = 6)]
    min_frag: usize,

    /// Do not add reverse-complement features
    #[arg(long, default_value_t = false)]
    no_antisense: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let file = File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let sources = read_feature_sources(BufReader::new(file))?;

    let cfg = BuildConfig::default()
        .min_frag(args.min_frag)
        .antisense(!args.no_antisense);
    let db = build_feature_db(&sources, &cfg)?;

    // Refuse to write a file the scanner would reject.
    FeatureStore::from_descriptors(db.descriptors.iter().copied())?;

    FeatureFileWriter::new(&db.descriptors)
        .write_to(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    if let Some(path) = &args.table {
        let file = File::create(path)
            .with_context(|| format!("creating feature table {}", path.display()))?;
        write_feature_table(&db, std::io::BufWriter::new(file))
            .with_context(|| format!("writing feature table {}", path.display()))?;
    }
    log::info!(
        "wrote {} descriptors for {} features to {}",
        db.descriptors.len(),
        db.features.len(),
        args.output.display()
    );
    Ok(())
}
