//! Concatenated decoding.
//!
//! Each level consumes the previous level's observable predictions as its
//! detection events. Shapes are checked once, at construction.

use super::Decoder;
use crate::QecError;
use crate::gf2::{BitMatrix, BitRow};
use bitvec::prelude::*;

pub struct ConcatenatedDecoder {
    levels: Vec<Box<dyn Decoder>>,
    num_observables: usize,
}

impl ConcatenatedDecoder {
    /// Chains `levels` bottom-up.
    ///
    /// # Arguments
    ///
    /// * `levels` - Per-level decoders, innermost first
    /// * `num_observables` - Observable count expected from the top level
    ///
    /// # Returns
    ///
    /// `LevelMismatch` naming the first level whose output width differs
    /// from the next level's input (or from `num_observables` for the top).
    pub fn new(levels: Vec<Box<dyn Decoder>>, num_observables: usize) -> Result<Self, QecError> {
        if levels.is_empty() {
            return Err(QecError::LevelMismatch {
                level: 0,
                produced: 0,
                expected: num_observables,
            });
        }
        for (i, pair) in levels.windows(2).enumerate() {
            if pair[0].num_observables() != pair[1].num_detectors() {
                return Err(QecError::LevelMismatch {
                    level: i,
                    produced: pair[0].num_observables(),
                    expected: pair[1].num_detectors(),
                });
            }
        }
        let top = levels.len() - 1;
        if levels[top].num_observables() != num_observables {
            return Err(QecError::LevelMismatch {
                level: top,
                produced: levels[top].num_observables(),
                expected: num_observables,
            });
        }
        Ok(Self {
            levels,
            num_observables,
        })
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }
}

impl Decoder for ConcatenatedDecoder {
    fn name(&self) -> &str {
        "concatenated"
    }

    fn num_detectors(&self) -> usize {
        self.levels[0].num_detectors()
    }

    fn num_observables(&self) -> usize {
        self.num_observables
    }

    fn decode_shot(&self, syndrome: &BitSlice<u64, Lsb0>) -> Result<BitRow, QecError> {
        let mut bits = syndrome.to_bitvec();
        for level in &self.levels {
            bits = level.decode_shot(&bits)?;
        }
        Ok(bits)
    }

    fn decode_batch(&self, syndromes: &BitMatrix) -> Result<BitMatrix, QecError> {
        let mut current = self.levels[0].decode_batch(syndromes)?;
        for level in &self.levels[1..] {
            current = level.decode_batch(&current)?;
        }
        Ok(current)
    }
}
