//! Core algorithms and data structures for CSS quantum error correction.
//!
//! This crate provides GF(2) linear algebra, the CSS code model with logical
//! operator inference, the memory-experiment circuit builder, stabilizer
//! simulation, detector error model extraction and the decoder adapter layer
//! with its built-in backends. Everything here is synchronous, in-memory
//! computation; file formats and the command line live in the outer crates.

use core::fmt;

/// Named catalog of validated CSS code constructions.
///
/// Provides one construction per named code (repetition, [[4,2,2]],
/// [[6,2,2]], Steane, Shor, toric, rotated surface), each satisfying the
/// orthogonality and logical-validity invariants.
pub mod catalog;

/// Ordered stabilizer circuit with measurement record bookkeeping.
///
/// Wraps the instruction stream from `css_common::isa` and tracks qubit,
/// measurement, detector and observable counts so that every record lookback
/// can be validated at the moment it is appended.
pub mod circuit;

/// CSS code model and the capability trait shared by all code variants.
///
/// Construction validates shapes, the orthogonality invariant and logical
/// operator validity, inferring logicals when none are supplied.
pub mod code;

/// Decoder adapter layer.
///
/// Defines the `Decoder` contract, the name-based backend registry, the
/// concatenated composition and the built-in union-find and matching backends.
pub mod decoder;

/// Detector error model extraction and sampling.
///
/// Propagates every single fault of a noisy circuit to the detectors and
/// observables it flips, producing the independent error mechanisms that
/// decoders are built from.
pub mod dem;

/// Disjoint set union (DSU) data structure with parity tracking.
///
/// Used by the union-find decoder to grow clusters of fired detectors and
/// track whether each cluster is neutralized.
pub mod dsu;

/// End-to-end memory experiment runner.
///
/// Builds, applies noise, samples, decodes and scores a memory experiment,
/// reporting the logical error rate.
pub mod experiment;

/// GF(2) linear algebra over bit-packed binary matrices.
///
/// Row reduction, rank, kernel, row space and membership tests. All
/// arithmetic is mod 2.
pub mod gf2;

/// Decoding graph representation built from a detector error model.
///
/// Nodes are detectors plus a single virtual boundary node; edges carry
/// log-likelihood weights and the observables they flip.
pub mod graph;

/// Logical operator inference from parity-check matrices.
pub mod logicals;

/// Memory-experiment circuit builder.
///
/// Turns a CSS code plus optional geometric metadata into a round-by-round
/// syndrome extraction circuit with detectors and logical observables.
pub mod memory;

/// Circuit-level noise insertion.
pub mod noise;

/// Pauli operators and sparse Pauli strings.
pub mod pauli;

/// Pauli frame tracking for fault propagation.
///
/// Tracks X and Z errors on every qubit without storing the quantum state.
/// Used to compute which detectors a single fault flips.
pub mod pauli_frame;

/// Stabilizer tableau simulator.
///
/// Exact Clifford simulation used to sample circuits shot by shot and to
/// verify that every detector of a noiseless circuit is deterministic.
pub mod tableau;

use gf2::BitMatrix;

/// Relation that a logical operator failed to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalViolation {
    /// The logical X operator anticommutes with a Z check.
    XAnticommutesWithZCheck,
    /// The logical Z operator anticommutes with an X check.
    ZAnticommutesWithXCheck,
    /// The logical X and Z operators of the same pair commute.
    PairCommutes,
    /// The logical X operator lies in the span of the X stabilizers and the
    /// preceding logical X operators.
    DependentX,
    /// The logical Z operator lies in the span of the Z stabilizers and the
    /// preceding logical Z operators.
    DependentZ,
    /// The number of logical operators does not equal the code dimension.
    CountMismatch,
}

impl fmt::Display for LogicalViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogicalViolation::XAnticommutesWithZCheck => "logical X anticommutes with a Z check",
            LogicalViolation::ZAnticommutesWithXCheck => "logical Z anticommutes with an X check",
            LogicalViolation::PairCommutes => "logical X and Z of the pair commute",
            LogicalViolation::DependentX => "logical X is dependent on stabilizers or earlier logicals",
            LogicalViolation::DependentZ => "logical Z is dependent on stabilizers or earlier logicals",
            LogicalViolation::CountMismatch => "number of logical operators differs from k",
        };
        f.write_str(s)
    }
}

/// Error types returned by code construction, circuit building and decoding.
///
/// Every variant is fatal at the point of detection and carries the indices,
/// shapes or matrices needed to diagnose the failure without re-running.
#[derive(Debug, Clone, PartialEq)]
pub enum QecError {
    /// Matrix or vector dimensions do not agree.
    ///
    /// Raised before any algebra is attempted, whenever inputs with different
    /// column counts or lengths are combined.
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// The X and Z parity-check matrices violate CSS orthogonality.
    ///
    /// Carries the overlap matrix Hx·Hzᵗ mod 2. A nonzero entry (i, j) means
    /// X check i anticommutes with Z check j.
    NonOrthogonal { overlap: BitMatrix },

    /// A supplied or inferred logical operator is invalid.
    ///
    /// Names the offending pair index and the relation that failed.
    LogicalOperator {
        index: usize,
        violation: LogicalViolation,
    },

    /// Logical inference found fewer anticommuting pairs than the code
    /// dimension. The caller must supply logical operators explicitly.
    InferenceExhausted { expected: usize, found: usize },

    /// No decoder backend is registered under the requested name.
    DecoderUnavailable(String),

    /// A syndrome batch has a different column count than the decoder's
    /// number of detectors. The whole batch is rejected.
    DetectorCountMismatch { expected: usize, found: usize },

    /// Consecutive levels of a concatenated decoder are shape-incompatible.
    ///
    /// `level` is the index of the level whose output does not match the
    /// input expected by the next level (or by the overall observable count).
    LevelMismatch {
        level: usize,
        produced: usize,
        expected: usize,
    },

    /// A Pauli string contains a character outside `{I, X, Y, Z}`.
    InvalidPauli(char),

    /// An instruction references a qubit or measurement record that does not
    /// exist, or a record lookback is not negative.
    InvalidTarget,

    /// A noise probability lies outside its valid range.
    InvalidProbability(f64),

    /// A node index exceeds the bounds of the decoding graph.
    ///
    /// Indicates that an error mechanism or syndrome references a detector
    /// that does not exist in the model it is being added to.
    NodeOutOfBounds(usize),

    /// The decoder failed to produce a correction.
    ///
    /// Occurs when a cluster cannot be neutralized, e.g. an odd cluster in a
    /// graph component with no boundary.
    DecodingFailed,
}

impl fmt::Display for QecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QecError::ShapeMismatch {
                context,
                expected,
                found,
            } => write!(
                f,
                "shape mismatch in {}: expected {}, found {}",
                context, expected, found
            ),
            QecError::NonOrthogonal { overlap } => {
                write!(f, "Hx and Hz are not orthogonal; anticommuting pairs:")?;
                for (i, row) in overlap.rows().iter().enumerate() {
                    for j in row.iter_ones() {
                        write!(f, " (X{}, Z{})", i, j)?;
                    }
                }
                Ok(())
            }
            QecError::LogicalOperator { index, violation } => {
                write!(f, "invalid logical operator pair {}: {}", index, violation)
            }
            QecError::InferenceExhausted { expected, found } => write!(
                f,
                "logical inference found {} of {} pairs; supply logicals explicitly",
                found, expected
            ),
            QecError::DecoderUnavailable(name) => write!(f, "decoder '{}' is not available", name),
            QecError::DetectorCountMismatch { expected, found } => write!(
                f,
                "syndrome batch has {} detector columns, decoder expects {}",
                found, expected
            ),
            QecError::LevelMismatch {
                level,
                produced,
                expected,
            } => write!(
                f,
                "decoder level {} produces {} bits but the next stage expects {}",
                level, produced, expected
            ),
            QecError::InvalidPauli(c) => write!(f, "invalid Pauli character '{}'", c),
            QecError::InvalidTarget => write!(f, "instruction target out of range"),
            QecError::InvalidProbability(p) => write!(f, "probability {} out of range", p),
            QecError::NodeOutOfBounds(i) => write!(f, "node {} out of bounds", i),
            QecError::DecodingFailed => write!(f, "decoder failed to neutralize all clusters"),
        }
    }
}

impl std::error::Error for QecError {}
