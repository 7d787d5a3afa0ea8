//! Memory-experiment circuit builder.
//!
//! Produces the standard CSS memory circuit: reset every qubit, repeat
//! `rounds` rounds of X-check then Z-check syndrome extraction, measure the
//! data, and annotate detectors and logical observables.
//!
//! Qubits are laid out as data `0..n`, X ancillas `n..n+n_x` and Z ancillas
//! `n+n_x..n+n_x+n_z`. Measurement results are tracked internally by absolute
//! record index and converted to negative lookbacks at the moment each
//! detector or observable is appended.
//!
//! A detector compares consecutive measurements of the same check. In the
//! first round only checks of the experiment basis get a lone detector,
//! since only those are deterministic after a fresh reset. The final data
//! measurement closes each basis check with a space-like detector and reads
//! out one observable per requested logical.

use crate::QecError;
use crate::circuit::Circuit;
use crate::code::{Code, Coord, CssCode};
use crate::pauli::Basis;
use log::{debug, warn};

// Coordinates closer than this on both axes identify the same site.
const COORD_TOLERANCE: f64 = 0.1;

/// Diagnostics gathered while building a circuit.
///
/// Geometric schedule problems never abort a build; they are counted here
/// and logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// (check, offset) pairs of a geometric schedule that landed on no data
    /// qubit. Expected on lattice boundaries.
    pub skipped_offsets: usize,

    /// Checks for which no schedule offset matched any data qubit. Such a
    /// check gets no entangling gates.
    pub empty_scheduled_checks: usize,

    /// Checks whose geometric support differs from their parity-check row.
    /// Only qubits in the row are ever entangled.
    pub support_mismatches: usize,
}

/// One memory experiment over a CSS code.
pub struct MemoryExperiment<'a> {
    code: &'a CssCode,
    rounds: usize,
    basis: Basis,
    observables: Option<Vec<usize>>,
}

/// Per-basis syndrome extraction layout resolved before emission.
struct CheckLayout {
    basis: Basis,
    ancillas: Vec<u32>,
    coords: Vec<Coord>,
    supports: Vec<Vec<u32>>,
    // CX layers, each a list of (control, target) pairs.
    layers: Vec<Vec<(u32, u32)>>,
}

impl<'a> MemoryExperiment<'a> {
    /// Creates an experiment of `rounds` syndrome rounds in `basis`.
    ///
    /// `Basis::Z` prepares and measures the data in the computational basis;
    /// `Basis::X` rotates the data with Hadamards at both ends.
    pub fn new(code: &'a CssCode, rounds: usize, basis: Basis) -> Self {
        Self {
            code,
            rounds,
            basis,
            observables: None,
        }
    }

    /// Restricts the observables to the listed logical indices.
    ///
    /// Observable `j` of the circuit reads logical `indices[j]`.
    pub fn with_observables(mut self, indices: Vec<usize>) -> Self {
        self.observables = Some(indices);
        self
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// Builds the circuit, discarding diagnostics.
    pub fn build(&self) -> Result<Circuit, QecError> {
        self.build_with_report().map(|(circuit, _)| circuit)
    }

    /// Builds the circuit and returns the schedule diagnostics with it.
    pub fn build_with_report(&self) -> Result<(Circuit, BuildReport), QecError> {
        let code = self.code;
        let n = code.n();
        let mut circuit = Circuit::new();
        let mut report = BuildReport::default();
        if n == 0 {
            return Ok((circuit, report));
        }

        let k = code.k();
        let logical_indices: Vec<usize> = match &self.observables {
            Some(list) => list.clone(),
            None => (0..k).collect(),
        };
        if let Some(&bad) = logical_indices.iter().find(|&&i| i >= k) {
            return Err(QecError::ShapeMismatch {
                context: "logical observable index",
                expected: k,
                found: bad,
            });
        }

        let n_x = code.hx().num_rows();
        let n_z = code.hz().num_rows();
        let x_layout = self.layout(Basis::X, n as u32, &mut report);
        let z_layout = self.layout(Basis::Z, (n + n_x) as u32, &mut report);
        let data: Vec<u32> = (0..n as u32).collect();
        let all: Vec<u32> = (0..(n + n_x + n_z) as u32).collect();

        // INIT
        let meta = code.extra_metadata();
        if let Some(coords) = &meta.data_coords {
            for (q, &c) in coords.iter().enumerate() {
                circuit.qubit_coords(q as u32, c)?;
            }
        }
        for layout in [&x_layout, &z_layout] {
            if meta.stab_coords(layout.basis).is_some() {
                for (&a, &c) in layout.ancillas.iter().zip(&layout.coords) {
                    circuit.qubit_coords(a, c)?;
                }
            }
        }
        circuit.reset(&all)?;
        if self.basis == Basis::X {
            circuit.h(&data)?;
        }

        let mut recorded = 0usize;
        let mut last_x: Vec<Option<usize>> = vec![None; n_x];
        let mut last_z: Vec<Option<usize>> = vec![None; n_z];

        // ROUND r
        for _ in 0..self.rounds {
            circuit.tick()?;
            for (layout, last) in [(&x_layout, &mut last_x), (&z_layout, &mut last_z)] {
                if layout.ancillas.is_empty() {
                    continue;
                }
                let rotate = layout.basis == Basis::X;
                if rotate {
                    circuit.h(&layout.ancillas)?;
                }
                for pairs in &layout.layers {
                    circuit.cx(pairs)?;
                }
                if rotate {
                    circuit.h(&layout.ancillas)?;
                }
                circuit.measure_reset(&layout.ancillas)?;
                let first = recorded;
                recorded += layout.ancillas.len();

                for (i, prev) in last.iter_mut().enumerate() {
                    let current = first + i;
                    let (x, y) = layout.coords[i];
                    match *prev {
                        Some(p) => {
                            circuit.detector(&lookbacks(&[current, p], recorded), [x, y, 0.0])?;
                        }
                        None if layout.basis == self.basis => {
                            circuit.detector(&lookbacks(&[current], recorded), [x, y, 0.0])?;
                        }
                        None => {}
                    }
                    *prev = Some(current);
                }
            }
            circuit.shift_coords([0.0, 0.0, 1.0])?;
        }

        // FINALIZE
        circuit.tick()?;
        if self.basis == Basis::X {
            circuit.h(&data)?;
        }
        circuit.measure(&data)?;
        let data_start = recorded;
        recorded += n;

        let (closing, last) = match self.basis {
            Basis::X => (&x_layout, &last_x),
            Basis::Z => (&z_layout, &last_z),
        };
        for (i, support) in closing.supports.iter().enumerate() {
            let mut recs: Vec<usize> = support.iter().map(|&q| data_start + q as usize).collect();
            recs.extend(last[i]);
            if recs.is_empty() {
                continue;
            }
            let (x, y) = closing.coords[i];
            circuit.detector(&lookbacks(&recs, recorded), [x, y, 0.0])?;
        }

        let logicals = code.logicals(self.basis);
        for (obs, &li) in logical_indices.iter().enumerate() {
            let recs: Vec<usize> = logicals[li]
                .support(self.basis)
                .into_iter()
                .map(|q| data_start + q)
                .collect();
            circuit.observable_include(&lookbacks(&recs, recorded), obs)?;
        }

        debug!(
            "built {}-basis memory circuit: {} rounds, {} detectors, {} observables",
            self.basis,
            self.rounds,
            circuit.num_detectors(),
            circuit.num_observables()
        );
        Ok((circuit, report))
    }

    fn layout(&self, basis: Basis, first_ancilla: u32, report: &mut BuildReport) -> CheckLayout {
        let code = self.code;
        let checks = code.checks(basis);
        let meta = code.metadata().cloned().unwrap_or_default();
        let data_coords = meta.data_coords.as_deref();

        let supports: Vec<Vec<u32>> = checks
            .rows()
            .iter()
            .map(|r| r.iter_ones().map(|q| q as u32).collect())
            .collect();
        let ancillas: Vec<u32> = (0..supports.len() as u32)
            .map(|i| first_ancilla + i)
            .collect();
        let coords: Vec<Coord> = match meta.stab_coords(basis) {
            Some(c) => c.to_vec(),
            None => supports
                .iter()
                .enumerate()
                .map(|(i, s)| fallback_coord(basis, i, s, data_coords))
                .collect(),
        };

        // (ancilla, data) interactions grouped into layers.
        let pairs: Vec<Vec<(u32, u32)>> = match (
            meta.schedule(basis).filter(|s| !s.is_empty()),
            data_coords,
            meta.stab_coords(basis),
        ) {
            (Some(schedule), Some(data_coords), Some(stab_coords)) => geometric_layers(
                basis,
                schedule,
                data_coords,
                stab_coords,
                &supports,
                &ancillas,
                report,
            ),
            _ => supports
                .iter()
                .zip(&ancillas)
                .map(|(s, &a)| s.iter().map(|&q| (a, q)).collect())
                .collect(),
        };

        let layers = pairs
            .into_iter()
            .filter(|l| !l.is_empty())
            .map(|l| {
                l.into_iter()
                    .map(|(a, q)| match basis {
                        Basis::X => (a, q),
                        Basis::Z => (q, a),
                    })
                    .collect()
            })
            .collect();

        CheckLayout {
            basis,
            ancillas,
            coords,
            supports,
            layers,
        }
    }
}

fn geometric_layers(
    basis: Basis,
    schedule: &[Coord],
    data_coords: &[Coord],
    stab_coords: &[Coord],
    supports: &[Vec<u32>],
    ancillas: &[u32],
    report: &mut BuildReport,
) -> Vec<Vec<(u32, u32)>> {
    let mut matched: Vec<Vec<u32>> = vec![Vec::new(); supports.len()];
    let mut layers = Vec::with_capacity(schedule.len());

    for &(dx, dy) in schedule {
        let mut layer = Vec::new();
        for (i, &(sx, sy)) in stab_coords.iter().enumerate() {
            let target = (sx - dx, sy - dy);
            let Some(q) = data_coords.iter().position(|&c| same_site(c, target)) else {
                report.skipped_offsets += 1;
                continue;
            };
            let q = q as u32;
            matched[i].push(q);
            if supports[i].contains(&q) {
                layer.push((ancillas[i], q));
            }
        }
        layers.push(layer);
    }

    for (i, m) in matched.iter_mut().enumerate() {
        if m.is_empty() && !supports[i].is_empty() {
            report.empty_scheduled_checks += 1;
            warn!(
                "{} check {} matched no data qubit under its schedule; no gates emitted",
                basis, i
            );
            continue;
        }
        m.sort_unstable();
        m.dedup();
        if *m != supports[i] {
            report.support_mismatches += 1;
            warn!(
                "{} check {} schedule support {:?} differs from parity-check row {:?}",
                basis, i, m, supports[i]
            );
        }
    }
    layers
}

fn same_site(a: Coord, b: Coord) -> bool {
    (a.0 - b.0).abs() < COORD_TOLERANCE && (a.1 - b.1).abs() < COORD_TOLERANCE
}

// Centroid of the support if data coordinates exist, else a per-check slot.
fn fallback_coord(basis: Basis, index: usize, support: &[u32], data: Option<&[Coord]>) -> Coord {
    match data {
        Some(d) if !support.is_empty() => {
            let (sx, sy) = support
                .iter()
                .map(|&q| d[q as usize])
                .fold((0.0, 0.0), |acc, c| (acc.0 + c.0, acc.1 + c.1));
            let w = support.len() as f64;
            (sx / w, sy / w)
        }
        _ => (
            index as f64,
            match basis {
                Basis::X => 0.0,
                Basis::Z => 1.0,
            },
        ),
    }
}

// Converts absolute record indices to lookbacks from the current record end.
fn lookbacks(records: &[usize], recorded: usize) -> Vec<i32> {
    records
        .iter()
        .map(|&r| r as i32 - recorded as i32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gf2::BitMatrix;
    use css_common::isa::Opcode;

    fn four_two_two() -> CssCode {
        let h = BitMatrix::from_dense(4, &[[1u8, 1, 1, 1]]).unwrap();
        CssCode::new(h.clone(), h).unwrap()
    }

    #[test]
    fn four_two_two_counts() {
        let code = four_two_two();
        let one = MemoryExperiment::new(&code, 1, Basis::Z).build().unwrap();
        assert_eq!(one.num_detectors(), 2);
        assert_eq!(one.num_observables(), 2);
        assert_eq!(one.num_measurements(), 2 + 4);

        let three = MemoryExperiment::new(&code, 3, Basis::Z).build().unwrap();
        // 1 lone Z + 2 time-like per check for rounds 1..3, + 1 space-like.
        assert_eq!(three.num_detectors(), 1 + 2 * 2 + 1);
    }

    #[test]
    fn lookbacks_are_relative() {
        let code = four_two_two();
        let c = MemoryExperiment::new(&code, 2, Basis::Z).build().unwrap();
        let first_detector = c
            .iter()
            .find(|i| i.opcode == Opcode::Detector)
            .unwrap();
        // Z ancilla is the last of the two round-0 measurements.
        assert_eq!(first_detector.lookbacks().collect::<Vec<_>>(), vec![-1]);
        for instr in c.iter().filter(|i| i.opcode.uses_records()) {
            assert!(instr.lookbacks().all(|r| r < 0));
        }
    }

    #[test]
    fn empty_code_gives_empty_circuit() {
        let code = CssCode::new(BitMatrix::empty(0), BitMatrix::empty(0)).unwrap();
        let c = MemoryExperiment::new(&code, 3, Basis::Z).build().unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn zero_rounds_measures_data_only() {
        let code = four_two_two();
        let c = MemoryExperiment::new(&code, 0, Basis::X).build().unwrap();
        assert_eq!(c.count(Opcode::MeasureReset), 0);
        assert_eq!(c.num_detectors(), 1);
        assert_eq!(c.num_observables(), 2);
    }

    #[test]
    fn selected_observables() {
        let code = four_two_two();
        let c = MemoryExperiment::new(&code, 1, Basis::Z)
            .with_observables(vec![1])
            .build()
            .unwrap();
        assert_eq!(c.num_observables(), 1);
        assert!(
            MemoryExperiment::new(&code, 1, Basis::Z)
                .with_observables(vec![2])
                .build()
                .is_err()
        );
    }

    #[test]
    fn x_checks_use_ancilla_controls() {
        let code = four_two_two();
        let c = MemoryExperiment::new(&code, 1, Basis::Z).build().unwrap();
        let cxs: Vec<_> = c.iter().filter(|i| i.opcode == Opcode::Cx).collect();
        assert_eq!(cxs.len(), 2);
        // X ancilla is qubit 4, Z ancilla is qubit 5.
        assert_eq!(cxs[0].qubits().next(), Some(4));
        assert_eq!(cxs[1].qubits().nth(1), Some(5));
    }
}
