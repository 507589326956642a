//! Feature fragment scanning over (circular) DNA sequences.
//!
//! A feature database is a list of 12-base fragment descriptors, either exact 12-mers or
//! masked ("degenerate") patterns. [`FeatureStore`] loads and validates them, [`KmerIndex`]
//! adds an O(1) table from packed 12-mer to its exact descriptors, and [`MatchIterator`]
//! walks a sequence once, yielding every descriptor hit in sequence order.
//!
//! ```no_run
//! use frag_scan::*;
//!
//! let store = FeatureStore::load_path(std::path::Path::new("features.data"))?;
//! let index = KmerIndex::build(store);
//! let seq = ScanConfig::default().prepare(b"GAATTCAAAAAAAAAAAAAAAA");
//! for m in CircularMatches::new(&index, &seq) {
//!     println!("{m}");
//! }
//! # Ok::<(), FeatureError>(())
//! ```
//!
//! Index and store are immutable once built and can be shared by any number of scans; each scan
//! owns its [`ScanState`].

mod builder;
pub mod encode;
mod feature;
mod index;
mod io;
mod preprocess;
mod scan;
mod store;

pub use builder::{BuildConfig, BuildError, FeatureDb, FeatureEntry, FeatureSource, build_feature_db};
pub use feature::{FeatureDescriptor, Match};
pub use index::KmerIndex;
pub use io::{FeatureFileWriter, read_feature_sources, write_feature_table};
pub use preprocess::{CleanedSequence, MAX_SEQ_LEN, normalize};
pub use scan::{CircularMatches, MatchIterator, ScanConfig, ScanState, scan_batch, scan_sequence};
pub use store::{FeatureError, FeatureStore, MAX_FEATURES};
