//! Inclusion Normalizer
//!
//! Loads the raw indicator observation, event and impact link tables and
//! produces the canonical [`Dataset`](inclusion_core::Dataset) consumed by the
//! forecasting engine.
//!
//! ## Flow
//!
//! ```text
//! observations ─┐
//! events ───────┼──► RawRecords ──► Normalizer ──► Normalized { dataset, diagnostics }
//! impact_links ─┘                                      │
//!                                                      ▼
//!                                               DatasetSummary
//! ```
//!
//! Malformed rows are dropped and reported, never fatal. Duplicates are
//! resolved by confidence rank with a `ConflictWarning`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inclusion_normalizer::{Normalizer, RawRecords};
//!
//! let raw = RawRecords::from_file("data/raw/records.json")?;
//! let normalized = Normalizer::default().normalize(&raw);
//! for diagnostic in &normalized.diagnostics {
//!     println!("{}", diagnostic);
//! }
//! ```

pub mod error;
pub mod normalizer;
pub mod parse;
pub mod records;
pub mod summary;

// Re-export main types
pub use error::{NormalizeError, RecordError, Result};
pub use normalizer::{Normalized, Normalizer, NormalizerConfig, derive_record_id};
pub use records::{EventRecord, ImpactLinkRecord, ObservationRecord, RawRecords};
pub use summary::{DatasetSummary, IndicatorCoverage};
