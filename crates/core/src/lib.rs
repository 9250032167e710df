//! Core types for the verso decoder
//!
//! This crate defines the foundational value types shared by every layer:
//! - Range: inclusive span over source positions
//! - Bitmap: immutable source coverage vector
//! - Bitmaps: per-sentence hash-consing interner for bitmaps
//! - ScoreVector / Weights / FeatureSlot: dense feature scores
//! - Word / Phrase / Sentence: tokens
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitmap;
pub mod bitmaps;
pub mod error;
pub mod phrase;
pub mod range;
pub mod scores;

pub use bitmap::{Bitmap, Gaps};
pub use bitmaps::{BitmapId, Bitmaps};
pub use error::{Error, Result};
pub use phrase::{Phrase, Sentence, Word};
pub use range::{distortion_distance, Range};
pub use scores::{FeatureSlot, ScoreVector, Weights};
