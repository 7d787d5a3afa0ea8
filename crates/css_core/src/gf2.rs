//! GF(2) linear algebra on bit-packed binary matrices.
//!
//! Matrices are stored row-major with each row a `BitVec<u64, Lsb0>`, so a
//! mod-2 row addition is a word-wise XOR. Every operation is exact and
//! deterministic: row reduction always picks the topmost candidate pivot row,
//! which makes kernel bases reproducible across runs.

use crate::QecError;
use bitvec::prelude::*;
use core::fmt;

/// A single row (or vector) over GF(2).
pub type BitRow = BitVec<u64, Lsb0>;

/// Binary matrix over GF(2).
///
/// Rows are checks and columns are qubits in parity-check usage. The column
/// count is stored explicitly so that a matrix with zero rows still knows its
/// width.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BitMatrix {
    cols: usize,
    rows: Vec<BitRow>,
}

impl BitMatrix {
    /// Creates an all-zero matrix of the given shape.
    pub fn zeros(num_rows: usize, num_cols: usize) -> Self {
        Self {
            cols: num_cols,
            rows: vec![bitvec![u64, Lsb0; 0; num_cols]; num_rows],
        }
    }

    /// Creates a matrix with no rows and `num_cols` columns.
    pub fn empty(num_cols: usize) -> Self {
        Self::zeros(0, num_cols)
    }

    /// Creates the `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for (i, row) in m.rows.iter_mut().enumerate() {
            row.set(i, true);
        }
        m
    }

    /// Builds a matrix from pre-packed rows.
    ///
    /// # Arguments
    ///
    /// * `num_cols` - Width every row must have
    /// * `rows` - Row vectors
    ///
    /// # Returns
    ///
    /// The matrix, or `ShapeMismatch` if any row has the wrong length.
    pub fn from_rows(num_cols: usize, rows: Vec<BitRow>) -> Result<Self, QecError> {
        if let Some(bad) = rows.iter().find(|r| r.len() != num_cols) {
            return Err(QecError::ShapeMismatch {
                context: "matrix row",
                expected: num_cols,
                found: bad.len(),
            });
        }
        Ok(Self {
            cols: num_cols,
            rows,
        })
    }

    /// Builds a matrix from dense 0/1 rows. Any nonzero entry is a 1.
    ///
    /// All rows must have length `num_cols`; the explicit width lets an empty
    /// row list describe a matrix over a known number of qubits.
    pub fn from_dense<R: AsRef<[u8]>>(num_cols: usize, rows: &[R]) -> Result<Self, QecError> {
        let packed = rows
            .iter()
            .map(|r| r.as_ref().iter().map(|&b| b != 0).collect::<BitRow>())
            .collect();
        Self::from_rows(num_cols, packed)
    }

    /// Builds a matrix whose row `i` has ones exactly at `supports[i]`.
    pub fn from_supports<S: AsRef<[usize]>>(
        num_cols: usize,
        supports: &[S],
    ) -> Result<Self, QecError> {
        let mut m = Self::zeros(supports.len(), num_cols);
        for (row, support) in m.rows.iter_mut().zip(supports) {
            for &q in support.as_ref() {
                if q >= num_cols {
                    return Err(QecError::ShapeMismatch {
                        context: "support index",
                        expected: num_cols,
                        found: q,
                    });
                }
                row.set(q, true);
            }
        }
        Ok(m)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> &[BitRow] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &BitSlice<u64, Lsb0> {
        &self.rows[i]
    }

    pub fn get(&self, r: usize, c: usize) -> bool {
        self.rows[r][c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: bool) {
        self.rows[r].set(c, value);
    }

    /// Appends a row, checking its width.
    pub fn push_row(&mut self, row: BitRow) -> Result<(), QecError> {
        if row.len() != self.cols {
            return Err(QecError::ShapeMismatch {
                context: "appended row",
                expected: self.cols,
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Stacks `other` below `self`.
    pub fn vstack(&self, other: &BitMatrix) -> Result<BitMatrix, QecError> {
        check_cols("vertical stack", self.cols, other.cols)?;
        let mut rows = self.rows.clone();
        rows.extend(other.rows.iter().cloned());
        Ok(Self {
            cols: self.cols,
            rows,
        })
    }

    /// Returns true if every entry is zero.
    pub fn is_zero(&self) -> bool {
        self.rows.iter().all(|r| r.not_any())
    }

    pub fn transpose(&self) -> BitMatrix {
        let mut t = Self::zeros(self.cols, self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            for j in row.iter_ones() {
                t.rows[j].set(i, true);
            }
        }
        t
    }

    /// Computes `self · otherᵗ` mod 2.
    ///
    /// Entry (i, j) is the parity of the overlap between row i of `self` and
    /// row j of `other`. For parity-check matrices this is the commutation
    /// table of the two generator sets.
    pub fn mul_transpose(&self, other: &BitMatrix) -> Result<BitMatrix, QecError> {
        check_cols("matrix product", self.cols, other.cols)?;
        let mut out = Self::zeros(self.rows.len(), other.rows.len());
        for (i, a) in self.rows.iter().enumerate() {
            for (j, b) in other.rows.iter().enumerate() {
                if parity(a, b) {
                    out.rows[i].set(j, true);
                }
            }
        }
        Ok(out)
    }

    /// Computes the syndrome `self · v` mod 2.
    pub fn mul_vec(&self, v: &BitSlice<u64, Lsb0>) -> Result<BitRow, QecError> {
        check_cols("matrix-vector product", self.cols, v.len())?;
        Ok(self.rows.iter().map(|r| parity(r, v)).collect())
    }

    /// Reduced row echelon form.
    ///
    /// Scans columns left to right; for each column the topmost row at or
    /// below the current pivot row with a one in that column becomes the
    /// pivot, is swapped into place and eliminated from every other row.
    ///
    /// # Returns
    ///
    /// The reduced matrix and the ordered list of pivot columns.
    pub fn rref(&self) -> (BitMatrix, Vec<usize>) {
        let mut reduced = self.clone();
        let pivots = reduce_columns(&mut reduced.rows, self.cols);
        (reduced, pivots)
    }

    pub fn rank(&self) -> usize {
        self.rref().1.len()
    }

    /// Basis of the null space `{v : self · v = 0}`.
    ///
    /// Augments `selfᵗ` with an identity block, reduces over the left block
    /// only, and collects the identity-side rows whose left side vanished.
    /// A matrix with no rows or no ones has the full space as its kernel.
    pub fn kernel(&self) -> BitMatrix {
        let n = self.cols;
        let m = self.rows.len();
        if m == 0 || self.is_zero() {
            return Self::identity(n);
        }

        let t = self.transpose();
        let mut augmented: Vec<BitRow> = t
            .rows
            .iter()
            .enumerate()
            .map(|(i, left)| {
                let mut row = BitRow::with_capacity(m + n);
                row.extend_from_bitslice(left);
                row.resize(m + n, false);
                row.set(m + i, true);
                row
            })
            .collect();

        let pivots = reduce_columns(&mut augmented, m);
        let basis = augmented
            .into_iter()
            .skip(pivots.len())
            .map(|row| row[m..].to_bitvec())
            .collect();
        Self { cols: n, rows: basis }
    }

    /// Basis of the row space: the nonzero rows of the reduced form.
    pub fn row_space(&self) -> BitMatrix {
        let (reduced, pivots) = self.rref();
        let mut rows = reduced.rows;
        rows.truncate(pivots.len());
        Self {
            cols: self.cols,
            rows,
        }
    }

    /// Returns true if `v` is a GF(2) combination of the rows of `self`.
    ///
    /// Equivalent to appending `v` and observing that the rank does not grow.
    pub fn in_row_space(&self, v: &BitSlice<u64, Lsb0>) -> Result<bool, QecError> {
        check_cols("row-space membership", self.cols, v.len())?;
        let mut rows = self.row_space().rows;
        let base = rows.len();
        rows.push(v.to_bitvec());
        Ok(reduce_columns(&mut rows, self.cols).len() == base)
    }
}

/// Mod-2 inner product of two equal-length vectors.
///
/// `ShapeMismatch` if the lengths differ.
pub fn dot(a: &BitSlice<u64, Lsb0>, b: &BitSlice<u64, Lsb0>) -> Result<bool, QecError> {
    check_cols("inner product", a.len(), b.len())?;
    Ok(parity(a, b))
}

// Overlap parity; callers have already matched the lengths.
fn parity(a: &BitSlice<u64, Lsb0>, b: &BitSlice<u64, Lsb0>) -> bool {
    a.iter_ones().filter(|&i| b[i]).count() % 2 == 1
}

/// Hamming weight of a vector.
pub fn weight(v: &BitSlice<u64, Lsb0>) -> usize {
    v.count_ones()
}

fn check_cols(context: &'static str, expected: usize, found: usize) -> Result<(), QecError> {
    if expected != found {
        return Err(QecError::ShapeMismatch {
            context,
            expected,
            found,
        });
    }
    Ok(())
}

// Gauss-Jordan elimination in place, pivoting only on columns < `limit`.
fn reduce_columns(rows: &mut [BitRow], limit: usize) -> Vec<usize> {
    let mut pivots = Vec::new();
    let mut r = 0;
    for col in 0..limit {
        if r >= rows.len() {
            break;
        }
        let Some(p) = (r..rows.len()).find(|&i| rows[i][col]) else {
            continue;
        };
        rows.swap(r, p);
        let pivot = rows[r].clone();
        for (i, row) in rows.iter_mut().enumerate() {
            if i != r && row[col] {
                *row ^= pivot.as_bitslice();
            }
        }
        pivots.push(col);
        r += 1;
    }
    pivots
}

impl fmt::Debug for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitMatrix({}x{})", self.rows.len(), self.cols)?;
        if !self.rows.is_empty() {
            write!(f, " {}", self)?;
        }
        Ok(())
    }
}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            for bit in row.iter() {
                f.write_str(if *bit { "1" } else { "0" })?;
            }
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hamming() -> BitMatrix {
        BitMatrix::from_dense(
            7,
            &[
                [1u8, 0, 1, 0, 1, 0, 1],
                [0, 1, 1, 0, 0, 1, 1],
                [0, 0, 0, 1, 1, 1, 1],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rref_picks_topmost_pivot() {
        let m = BitMatrix::from_dense(3, &[[0u8, 1, 1], [1, 1, 0], [1, 0, 1]]).unwrap();
        let (r, pivots) = m.rref();
        assert_eq!(pivots, vec![0, 1]);
        assert_eq!(r.to_string(), "[101, 011, 000]");
        assert_eq!(m.rank(), 2);
    }

    #[test]
    fn dot_rejects_unequal_lengths() {
        let a = bitvec![u64, Lsb0; 1, 1, 0, 1];
        let b = bitvec![u64, Lsb0; 1, 1, 1];
        assert_eq!(
            dot(&a, &b),
            Err(QecError::ShapeMismatch {
                context: "inner product",
                expected: 4,
                found: 3,
            })
        );
        assert_eq!(dot(&a, &a), Ok(true));
        assert_eq!(dot(&b, &b), Ok(true));
        assert_eq!(dot(&a[..3], &b), Ok(false));
    }

    #[test]
    fn kernel_of_empty_matrix_is_identity() {
        let m = BitMatrix::empty(4);
        assert_eq!(m.kernel(), BitMatrix::identity(4));
        let z = BitMatrix::zeros(2, 3);
        assert_eq!(z.kernel(), BitMatrix::identity(3));
    }

    #[test]
    fn hamming_kernel_dimension() {
        let h = hamming();
        let k = h.kernel();
        assert_eq!(k.num_rows(), 4);
        assert!(h.mul_transpose(&k).unwrap().is_zero());
    }

    #[test]
    fn row_space_membership() {
        let h = hamming();
        let sum = h.row(0).to_bitvec() ^ h.row(2);
        assert!(h.in_row_space(&sum).unwrap());
        let single = BitMatrix::from_supports(7, &[[0usize]]).unwrap();
        assert!(!h.in_row_space(single.row(0)).unwrap());
        assert_eq!(h.row_space().num_rows(), 3);
    }

    #[test]
    fn shape_errors_come_first() {
        let a = BitMatrix::zeros(1, 3);
        let b = BitMatrix::zeros(1, 4);
        assert!(matches!(
            a.mul_transpose(&b),
            Err(QecError::ShapeMismatch {
                expected: 3,
                found: 4,
                ..
            })
        ));
        assert!(BitMatrix::from_dense(3, &[[1u8, 0]]).is_err());
        assert!(BitMatrix::from_supports(3, &[[5usize]]).is_err());
    }

    fn arb_matrix() -> impl Strategy<Value = BitMatrix> {
        (0usize..7, 1usize..10).prop_flat_map(|(r, c)| {
            proptest::collection::vec(proptest::collection::vec(any::<bool>(), c), r).prop_map(
                move |rows| {
                    let packed = rows.into_iter().map(|r| r.into_iter().collect()).collect();
                    BitMatrix::from_rows(c, packed).unwrap()
                },
            )
        })
    }

    proptest! {
        /// Every kernel vector is annihilated, and rank-nullity holds.
        #[test]
        fn prop_kernel_correct(m in arb_matrix()) {
            let k = m.kernel();
            for v in k.rows() {
                prop_assert!(m.mul_vec(v).unwrap().not_any());
            }
            prop_assert_eq!(m.rank() + k.rank(), m.num_cols());
        }

        /// The row space has the same rank as the matrix and contains every row.
        #[test]
        fn prop_row_space_spans_rows(m in arb_matrix()) {
            let rs = m.row_space();
            prop_assert_eq!(rs.num_rows(), m.rank());
            for row in m.rows() {
                prop_assert!(rs.in_row_space(row).unwrap());
            }
        }
    }
}
