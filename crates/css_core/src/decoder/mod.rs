//! Decoder contract and backends.
//!
//! A decoder maps detection events to predicted logical observable flips.
//! Backends are constructed from a detector error model and looked up by
//! name through the [`registry::DecoderRegistry`].

use crate::QecError;
use crate::gf2::{BitMatrix, BitRow};
use bitvec::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub mod concatenated;
pub mod matching;
pub mod registry;
pub mod union_find;

pub use concatenated::ConcatenatedDecoder;
pub use matching::MatchingDecoder;
pub use registry::{DecoderFactory, DecoderRegistry};
pub use union_find::UnionFindDecoder;

/// Common interface of every decoder backend.
pub trait Decoder: Send + Sync {
    /// Backend name as registered.
    fn name(&self) -> &str;

    /// Number of detector columns accepted per shot.
    fn num_detectors(&self) -> usize;

    /// Number of observable columns produced per shot.
    fn num_observables(&self) -> usize;

    /// Decodes the detection events of one shot.
    ///
    /// # Arguments
    ///
    /// * `syndrome` - Detection events, exactly `num_detectors()` bits
    ///
    /// # Returns
    ///
    /// Predicted observable flips, `num_observables()` bits.
    fn decode_shot(&self, syndrome: &BitSlice<u64, Lsb0>) -> Result<BitRow, QecError>;

    /// Decodes a batch of shots, one row per shot.
    ///
    /// The column count is checked once up front; a mismatch rejects the
    /// whole batch before any shot is decoded.
    fn decode_batch(&self, syndromes: &BitMatrix) -> Result<BitMatrix, QecError> {
        if syndromes.num_cols() != self.num_detectors() {
            return Err(QecError::DetectorCountMismatch {
                expected: self.num_detectors(),
                found: syndromes.num_cols(),
            });
        }

        #[cfg(feature = "parallel")]
        let rows: Vec<BitRow> = syndromes
            .rows()
            .par_iter()
            .map(|s| self.decode_shot(s))
            .collect::<Result<_, _>>()?;

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<BitRow> = syndromes
            .rows()
            .iter()
            .map(|s| self.decode_shot(s))
            .collect::<Result<_, _>>()?;

        BitMatrix::from_rows(self.num_observables(), rows)
    }
}

/// Number of rows on which two equally shaped matrices differ.
///
/// Applied to predicted and actual observable flips this is the count of
/// logical failures.
pub fn count_mismatches(predicted: &BitMatrix, actual: &BitMatrix) -> Result<usize, QecError> {
    if predicted.num_cols() != actual.num_cols() {
        return Err(QecError::ShapeMismatch {
            context: "observable columns",
            expected: actual.num_cols(),
            found: predicted.num_cols(),
        });
    }
    if predicted.num_rows() != actual.num_rows() {
        return Err(QecError::ShapeMismatch {
            context: "shot count",
            expected: actual.num_rows(),
            found: predicted.num_rows(),
        });
    }
    Ok(predicted
        .rows()
        .iter()
        .zip(actual.rows())
        .filter(|(p, a)| p != a)
        .count())
}
