//! Pauli operators and sparse Pauli strings.

use crate::QecError;
use crate::gf2::BitRow;
use core::fmt;
use std::collections::BTreeMap;

/// Single-qubit non-identity Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pauli {
    X,
    Y,
    Z,
}

impl Pauli {
    pub fn from_char(c: char) -> Result<Option<Pauli>, QecError> {
        match c {
            'I' | '_' => Ok(None),
            'X' => Ok(Some(Pauli::X)),
            'Y' => Ok(Some(Pauli::Y)),
            'Z' => Ok(Some(Pauli::Z)),
            other => Err(QecError::InvalidPauli(other)),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    /// Returns true if this operator has a component of the given type.
    ///
    /// Y = iXZ carries both an X and a Z component.
    pub fn has(self, basis: Basis) -> bool {
        matches!(
            (self, basis),
            (Pauli::X, Basis::X) | (Pauli::Z, Basis::Z) | (Pauli::Y, _)
        )
    }
}

/// Measurement basis / stabilizer type of a CSS code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Basis {
    X,
    #[default]
    Z,
}

impl Basis {
    /// The other basis.
    pub fn dual(self) -> Basis {
        match self {
            Basis::X => Basis::Z,
            Basis::Z => Basis::X,
        }
    }

    pub fn pauli(self) -> Pauli {
        match self {
            Basis::X => Pauli::X,
            Basis::Z => Pauli::Z,
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Basis::X => "X",
            Basis::Z => "Z",
        })
    }
}

/// Sparse Pauli operator: qubit index to non-identity Pauli.
///
/// Absent indices act as the identity. Ordered by qubit so iteration and
/// formatting are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PauliString {
    ops: BTreeMap<usize, Pauli>,
}

impl PauliString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a dense string over `{I, X, Y, Z}` where position `i` is qubit `i`.
    pub fn parse(dense: &str) -> Result<Self, QecError> {
        let mut ops = BTreeMap::new();
        for (q, c) in dense.chars().enumerate() {
            if let Some(p) = Pauli::from_char(c)? {
                ops.insert(q, p);
            }
        }
        Ok(Self { ops })
    }

    /// Builds a string with the same Pauli on every qubit in `support`.
    pub fn from_support<I: IntoIterator<Item = usize>>(pauli: Pauli, support: I) -> Self {
        Self {
            ops: support.into_iter().map(|q| (q, pauli)).collect(),
        }
    }

    /// Builds a uniform-type string from a GF(2) support vector.
    pub fn from_bits(basis: Basis, bits: &BitRow) -> Self {
        Self::from_support(basis.pauli(), bits.iter_ones())
    }

    pub fn get(&self, qubit: usize) -> Option<Pauli> {
        self.ops.get(&qubit).copied()
    }

    pub fn insert(&mut self, qubit: usize, pauli: Pauli) {
        self.ops.insert(qubit, pauli);
    }

    pub fn weight(&self) -> usize {
        self.ops.len()
    }

    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Pauli)> + '_ {
        self.ops.iter().map(|(&q, &p)| (q, p))
    }

    /// Qubits whose operator has a component of type `basis`.
    pub fn support(&self, basis: Basis) -> Vec<usize> {
        self.ops
            .iter()
            .filter(|(_, p)| p.has(basis))
            .map(|(&q, _)| q)
            .collect()
    }

    /// Largest qubit index touched, if any.
    pub fn max_qubit(&self) -> Option<usize> {
        self.ops.keys().next_back().copied()
    }

    /// The `basis`-type support as a length-`n` GF(2) vector.
    ///
    /// Returns `ShapeMismatch` if the string touches a qubit at or beyond `n`.
    pub fn to_bits(&self, basis: Basis, n: usize) -> Result<BitRow, QecError> {
        if let Some(q) = self.max_qubit().filter(|&q| q >= n) {
            return Err(QecError::ShapeMismatch {
                context: "Pauli string qubit",
                expected: n,
                found: q,
            });
        }
        let mut bits = BitRow::repeat(false, n);
        for q in self.support(basis) {
            bits.set(q, true);
        }
        Ok(bits)
    }

    /// Dense representation padded with `I` to `n` qubits.
    pub fn to_dense(&self, n: usize) -> String {
        let len = n.max(self.max_qubit().map_or(0, |q| q + 1));
        (0..len)
            .map(|q| self.get(q).map_or('I', Pauli::as_char))
            .collect()
    }

    /// Returns true if the two operators commute.
    ///
    /// Counts positions where both act non-trivially with different Paulis.
    pub fn commutes_with(&self, other: &PauliString) -> bool {
        self.ops
            .iter()
            .filter(|(q, p)| other.get(**q).is_some_and(|o| o != **p))
            .count()
            % 2
            == 0
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("I");
        }
        for (i, (q, p)) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}{}", p.as_char(), q)?;
        }
        Ok(())
    }
}
