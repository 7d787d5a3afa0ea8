//! CSS code model.
//!
//! A CSS code is a pair of binary parity-check matrices over the same qubits,
//! together with one logical X and one logical Z operator per encoded qubit.
//! Construction validates everything up front; a `CssCode` that exists is
//! always orthogonal and carries valid logicals.

use crate::gf2::{self, BitMatrix};
use crate::logicals;
use crate::pauli::{Basis, PauliString};
use crate::{LogicalViolation, QecError};
use log::debug;

/// A 2D coordinate or a relative 2D offset.
pub type Coord = (f64, f64);

/// Typed code metadata.
///
/// Every field is optional. Coordinates place data qubits and ancillas on
/// the plane; schedules list the relative offsets (data minus ancilla) swept
/// in order by the geometric syndrome extraction path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeMetadata {
    pub name: Option<String>,
    pub distance: Option<usize>,
    pub data_coords: Option<Vec<Coord>>,
    pub x_stab_coords: Option<Vec<Coord>>,
    pub z_stab_coords: Option<Vec<Coord>>,
    pub x_schedule: Option<Vec<Coord>>,
    pub z_schedule: Option<Vec<Coord>>,
}

impl CodeMetadata {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn with_distance(mut self, d: usize) -> Self {
        self.distance = Some(d);
        self
    }

    pub fn with_data_coords(mut self, coords: Vec<Coord>) -> Self {
        self.data_coords = Some(coords);
        self
    }

    pub fn with_stab_coords(mut self, x: Vec<Coord>, z: Vec<Coord>) -> Self {
        self.x_stab_coords = Some(x);
        self.z_stab_coords = Some(z);
        self
    }

    pub fn with_schedules(mut self, x: Vec<Coord>, z: Vec<Coord>) -> Self {
        self.x_schedule = Some(x);
        self.z_schedule = Some(z);
        self
    }

    /// Stabilizer coordinates for checks of the given type.
    pub fn stab_coords(&self, basis: Basis) -> Option<&[Coord]> {
        match basis {
            Basis::X => self.x_stab_coords.as_deref(),
            Basis::Z => self.z_stab_coords.as_deref(),
        }
    }

    /// Syndrome extraction schedule for checks of the given type.
    pub fn schedule(&self, basis: Basis) -> Option<&[Coord]> {
        match basis {
            Basis::X => self.x_schedule.as_deref(),
            Basis::Z => self.z_schedule.as_deref(),
        }
    }
}

/// Capability interface shared by every code variant.
///
/// The first five methods are required. The remaining capabilities are
/// optional and report absence with `None`.
pub trait Code {
    /// Number of physical qubits.
    fn n(&self) -> usize;

    /// Number of logical qubits.
    fn k(&self) -> usize;

    fn logical_x_ops(&self) -> &[PauliString];

    fn logical_z_ops(&self) -> &[PauliString];

    /// Stabilizer generators.
    fn stabilizers(&self) -> Vec<PauliString>;

    /// Gauge operators of a subsystem code.
    fn gauge_ops(&self) -> Option<Vec<PauliString>> {
        None
    }

    /// Planar coordinates of the data qubits.
    fn qubit_coords(&self) -> Option<&[Coord]> {
        None
    }

    fn metadata(&self) -> Option<&CodeMetadata> {
        None
    }

    /// Downcast to the CSS representation, if this code has one.
    fn as_css(&self) -> Option<&CssCode> {
        None
    }
}

/// A validated CSS code.
#[derive(Debug, Clone)]
pub struct CssCode {
    hx: BitMatrix,
    hz: BitMatrix,
    logical_x: Vec<PauliString>,
    logical_z: Vec<PauliString>,
    metadata: CodeMetadata,
    k: usize,
}

impl CssCode {
    /// Builds a code from its check matrices, inferring the logicals.
    pub fn new(hx: BitMatrix, hz: BitMatrix) -> Result<Self, QecError> {
        Self::from_parts(hx, hz, None, None, CodeMetadata::default())
    }

    /// Builds a code with explicit logical operators.
    pub fn with_logicals(
        hx: BitMatrix,
        hz: BitMatrix,
        logical_x: Vec<PauliString>,
        logical_z: Vec<PauliString>,
    ) -> Result<Self, QecError> {
        Self::from_parts(
            hx,
            hz,
            Some(logical_x),
            Some(logical_z),
            CodeMetadata::default(),
        )
    }

    /// General constructor.
    ///
    /// Validation runs in order: matrix and metadata shapes, CSS
    /// orthogonality, logical inference for any omitted list, then logical
    /// validity. The first failure is returned and no code is built.
    ///
    /// # Arguments
    ///
    /// * `hx` - X-type parity-check matrix (rows are X stabilizers)
    /// * `hz` - Z-type parity-check matrix (rows are Z stabilizers)
    /// * `logical_x` - Logical X operators, inferred if `None`
    /// * `logical_z` - Logical Z operators, inferred if `None`
    /// * `metadata` - Name, distance, coordinates and schedules
    pub fn from_parts(
        hx: BitMatrix,
        hz: BitMatrix,
        logical_x: Option<Vec<PauliString>>,
        logical_z: Option<Vec<PauliString>>,
        metadata: CodeMetadata,
    ) -> Result<Self, QecError> {
        let n = hx.num_cols();
        if hz.num_cols() != n {
            return Err(QecError::ShapeMismatch {
                context: "Hx/Hz column count",
                expected: n,
                found: hz.num_cols(),
            });
        }
        check_metadata(&metadata, n, hx.num_rows(), hz.num_rows())?;

        let overlap = hx.mul_transpose(&hz)?;
        if !overlap.is_zero() {
            return Err(QecError::NonOrthogonal { overlap });
        }

        let k = logicals::code_dimension(&hx, &hz)?;
        let (logical_x, logical_z) = match (logical_x, logical_z) {
            (Some(lx), Some(lz)) => (lx, lz),
            (None, None) => logicals::infer(&hx, &hz)?,
            (Some(lx), None) => {
                let lz = logicals::infer_partners(&hx, &hz, &lx, Basis::X)?;
                (lx, lz)
            }
            (None, Some(lz)) => {
                let lx = logicals::infer_partners(&hx, &hz, &lz, Basis::Z)?;
                (lx, lz)
            }
        };

        validate_logicals(&hx, &hz, &logical_x, &logical_z, k)?;
        debug!(
            "constructed [[{}, {}]] code {}",
            n,
            k,
            metadata.name.as_deref().unwrap_or("<unnamed>")
        );

        Ok(Self {
            hx,
            hz,
            logical_x,
            logical_z,
            metadata,
            k,
        })
    }

    /// Replaces the metadata, re-checking coordinate and schedule shapes.
    pub fn with_metadata(mut self, metadata: CodeMetadata) -> Result<Self, QecError> {
        check_metadata(&metadata, self.n(), self.hx.num_rows(), self.hz.num_rows())?;
        self.metadata = metadata;
        Ok(self)
    }

    pub fn hx(&self) -> &BitMatrix {
        &self.hx
    }

    pub fn hz(&self) -> &BitMatrix {
        &self.hz
    }

    /// Check matrix of the given type.
    pub fn checks(&self, basis: Basis) -> &BitMatrix {
        match basis {
            Basis::X => &self.hx,
            Basis::Z => &self.hz,
        }
    }

    /// Logical operators of the given type.
    pub fn logicals(&self, basis: Basis) -> &[PauliString] {
        match basis {
            Basis::X => &self.logical_x,
            Basis::Z => &self.logical_z,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    pub fn distance(&self) -> Option<usize> {
        self.metadata.distance
    }

    /// Owned copy of the metadata.
    pub fn extra_metadata(&self) -> CodeMetadata {
        self.metadata.clone()
    }
}

impl Code for CssCode {
    fn n(&self) -> usize {
        self.hx.num_cols()
    }

    fn k(&self) -> usize {
        self.k
    }

    fn logical_x_ops(&self) -> &[PauliString] {
        &self.logical_x
    }

    fn logical_z_ops(&self) -> &[PauliString] {
        &self.logical_z
    }

    /// X stabilizers (rows of Hx) first, then Z stabilizers (rows of Hz).
    fn stabilizers(&self) -> Vec<PauliString> {
        let xs = self
            .hx
            .rows()
            .iter()
            .map(|r| PauliString::from_bits(Basis::X, r));
        let zs = self
            .hz
            .rows()
            .iter()
            .map(|r| PauliString::from_bits(Basis::Z, r));
        xs.chain(zs).collect()
    }

    fn qubit_coords(&self) -> Option<&[Coord]> {
        self.metadata.data_coords.as_deref()
    }

    fn metadata(&self) -> Option<&CodeMetadata> {
        Some(&self.metadata)
    }

    fn as_css(&self) -> Option<&CssCode> {
        Some(self)
    }
}

fn check_metadata(
    meta: &CodeMetadata,
    n: usize,
    n_x: usize,
    n_z: usize,
) -> Result<(), QecError> {
    let checks = [
        ("data coordinates", meta.data_coords.as_ref(), n),
        ("X stabilizer coordinates", meta.x_stab_coords.as_ref(), n_x),
        ("Z stabilizer coordinates", meta.z_stab_coords.as_ref(), n_z),
    ];
    for (context, coords, expected) in checks {
        if let Some(c) = coords.filter(|c| c.len() != expected) {
            return Err(QecError::ShapeMismatch {
                context,
                expected,
                found: c.len(),
            });
        }
    }
    Ok(())
}

fn validate_logicals(
    hx: &BitMatrix,
    hz: &BitMatrix,
    logical_x: &[PauliString],
    logical_z: &[PauliString],
    k: usize,
) -> Result<(), QecError> {
    if logical_x.len() != k || logical_z.len() != k {
        return Err(QecError::LogicalOperator {
            index: logical_x.len().min(logical_z.len()).min(k),
            violation: LogicalViolation::CountMismatch,
        });
    }

    let n = hx.num_cols();
    let mut span_x = hx.row_space();
    let mut span_z = hz.row_space();
    for (index, (x, z)) in logical_x.iter().zip(logical_z).enumerate() {
        let xb = x.to_bits(Basis::X, n)?;
        let zb = z.to_bits(Basis::Z, n)?;
        let fail = |violation| QecError::LogicalOperator { index, violation };

        if hz.mul_vec(&xb)?.any() {
            return Err(fail(LogicalViolation::XAnticommutesWithZCheck));
        }
        if hx.mul_vec(&zb)?.any() {
            return Err(fail(LogicalViolation::ZAnticommutesWithXCheck));
        }
        if !gf2::dot(&xb, &zb)? {
            return Err(fail(LogicalViolation::PairCommutes));
        }
        if span_x.in_row_space(&xb)? {
            return Err(fail(LogicalViolation::DependentX));
        }
        if span_z.in_row_space(&zb)? {
            return Err(fail(LogicalViolation::DependentZ));
        }
        span_x.push_row(xb)?;
        span_z.push_row(zb)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_two_two() -> (BitMatrix, BitMatrix) {
        let h = BitMatrix::from_dense(4, &[[1u8, 1, 1, 1]]).unwrap();
        (h.clone(), h)
    }

    #[test]
    fn non_orthogonal_reports_overlap() {
        let hx = BitMatrix::from_dense(3, &[[1u8, 1, 0]]).unwrap();
        let hz = BitMatrix::from_dense(3, &[[0u8, 1, 1], [1, 1, 0]]).unwrap();
        match CssCode::new(hx, hz) {
            Err(QecError::NonOrthogonal { overlap }) => {
                assert_eq!(overlap.to_string(), "[10]");
            }
            other => panic!("expected NonOrthogonal, got {:?}", other),
        }
    }

    #[test]
    fn rejects_commuting_pair() {
        let (hx, hz) = four_two_two();
        let lx = vec![
            PauliString::parse("XXII").unwrap(),
            PauliString::parse("XIXI").unwrap(),
        ];
        let lz = vec![
            PauliString::parse("ZZII").unwrap(),
            PauliString::parse("ZIIZ").unwrap(),
        ];
        assert_eq!(
            CssCode::with_logicals(hx, hz, lx, lz).unwrap_err(),
            QecError::LogicalOperator {
                index: 0,
                violation: LogicalViolation::PairCommutes
            }
        );
    }

    #[test]
    fn rejects_anticommuting_with_checks() {
        let (hx, hz) = four_two_two();
        let lx = vec![
            PauliString::parse("XIII").unwrap(),
            PauliString::parse("XXII").unwrap(),
        ];
        let lz = vec![
            PauliString::parse("ZZII").unwrap(),
            PauliString::parse("ZIZI").unwrap(),
        ];
        assert_eq!(
            CssCode::with_logicals(hx, hz, lx, lz).unwrap_err(),
            QecError::LogicalOperator {
                index: 0,
                violation: LogicalViolation::XAnticommutesWithZCheck
            }
        );
    }

    #[test]
    fn rejects_dependent_logicals() {
        let (hx, hz) = four_two_two();
        let lx = vec![
            PauliString::parse("XXII").unwrap(),
            PauliString::parse("IIXX").unwrap(),
        ];
        let lz = vec![
            PauliString::parse("ZIZI").unwrap(),
            PauliString::parse("IZIZ").unwrap(),
        ];
        assert_eq!(
            CssCode::with_logicals(hx, hz, lx, lz).unwrap_err(),
            QecError::LogicalOperator {
                index: 1,
                violation: LogicalViolation::DependentX
            }
        );
    }

    #[test]
    fn rejects_wrong_count() {
        let (hx, hz) = four_two_two();
        let lx = vec![PauliString::parse("XXII").unwrap()];
        let lz = vec![PauliString::parse("ZIZI").unwrap()];
        assert!(matches!(
            CssCode::with_logicals(hx, hz, lx, lz),
            Err(QecError::LogicalOperator {
                violation: LogicalViolation::CountMismatch,
                ..
            })
        ));
    }

    #[test]
    fn infers_missing_side() {
        let (hx, hz) = four_two_two();
        let lx = vec![
            PauliString::parse("IIXX").unwrap(),
            PauliString::parse("XXII").unwrap(),
        ];
        let code = CssCode::from_parts(hx, hz, Some(lx), None, CodeMetadata::default()).unwrap();
        assert_eq!(code.k(), 2);
        assert_eq!(code.logical_z_ops().len(), 2);
    }

    #[test]
    fn metadata_shapes_checked() {
        let (hx, hz) = four_two_two();
        let meta = CodeMetadata::named("bad").with_data_coords(vec![(0.0, 0.0); 3]);
        assert!(matches!(
            CssCode::from_parts(hx, hz, None, None, meta),
            Err(QecError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn optional_capabilities() {
        let (hx, hz) = four_two_two();
        let code = CssCode::new(hx, hz).unwrap();
        assert!(code.qubit_coords().is_none());
        assert!(code.gauge_ops().is_none());
        assert!(code.as_css().is_some());
        assert_eq!(code.stabilizers().len(), 2);
        assert_eq!(code.stabilizers()[0].to_dense(4), "XXXX");
        assert_eq!(code.stabilizers()[1].to_dense(4), "ZZZZ");
    }
}
