//! Text formats around the feature database.
//!
//! - Feature file: count line, then `feature_index,fragment_index,mask,seq,shift,` per line
//!   (the trailing comma is part of the format as generated).
//! - Feature table: `feature_index<TAB>name<TAB>strand<TAB>length` per line.
//! - Feature source list: `name<TAB>sequence[<TAB>enzyme]`, `#` comments and blank lines skipped.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::builder::{FeatureDb, FeatureEntry, FeatureSource};
use crate::feature::FeatureDescriptor;

/// Writer that serializes descriptors to the feature file format.
pub struct FeatureFileWriter<'a> {
    descriptors: &'a [FeatureDescriptor],
}

impl<'a> FeatureFileWriter<'a> {
    pub fn new(descriptors: &'a [FeatureDescriptor]) -> Self {
        Self { descriptors }
    }

    /// Serialize to any writer.
    pub fn write<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "{}", self.descriptors.len())?;
        for d in self.descriptors {
            writeln!(
                w,
                "{},{},{},{},{},",
                d.feature_index, d.fragment_index, d.mask, d.seq, d.shift
            )?;
        }
        w.flush()
    }

    /// Serialize to disk, truncating any existing file.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        self.write(BufWriter::new(File::create(path)?))
    }
}

/// Write the feature table of a built database.
pub fn write_feature_table<W: Write>(db: &FeatureDb, mut w: W) -> std::io::Result<()> {
    for FeatureEntry {
        feature_index,
        name,
        antisense,
        length,
    } in &db.features
    {
        let strand = if *antisense { '-' } else { '+' };
        writeln!(w, "{feature_index}\t{name}\t{strand}\t{length}")?;
    }
    w.flush()
}

/// Read feature sources. Lines with fewer than two columns are skipped.
pub fn read_feature_sources<R: BufRead>(r: R) -> std::io::Result<Vec<FeatureSource>> {
    let mut out = Vec::new();
    for line in r.lines() {
        let line = line?;
        let line = line.trim_end();
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut cols = line.split('\t');
        let (Some(name), Some(sequence)) = (cols.next(), cols.next()) else {
            log::warn!("skipping feature line without a sequence column: {line:?}");
            continue;
        };
        let enzyme = cols
            .next()
            .is_some_and(|c| c.trim().eq_ignore_ascii_case("enzyme"));
        out.push(FeatureSource::new(name.trim(), sequence.trim()).enzyme(enzyme));
    }
    Ok(out)
}
