//! Stabilizer tableau simulator (Aaronson–Gottesman CHP).
//!
//! Holds `2n` generator rows: destabilizers `0..n` and stabilizers `n..2n`,
//! each an X part, a Z part and a sign bit. Clifford gates update every row
//! in place; a measurement is random exactly when some stabilizer
//! anticommutes with the measured Z.

use crate::QecError;
use crate::circuit::{Circuit, ShotBatch};
use crate::gf2::{BitMatrix, BitRow};
use css_common::isa::Opcode;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone)]
struct Row {
    x: BitRow,
    z: BitRow,
    sign: bool,
}

impl Row {
    fn zero(n: usize) -> Self {
        Self {
            x: BitRow::repeat(false, n),
            z: BitRow::repeat(false, n),
            sign: false,
        }
    }

    // Left-multiplies `self` by `src`, tracking the phase exponent mod 4.
    fn multiply_by(&mut self, src: &Row) {
        let mut phase: i32 = 2 * (self.sign as i32) + 2 * (src.sign as i32);
        for j in 0..self.x.len() {
            phase += g(src.x[j], src.z[j], self.x[j], self.z[j]);
        }
        self.sign = phase.rem_euclid(4) == 2;
        self.x ^= src.x.as_bitslice();
        self.z ^= src.z.as_bitslice();
    }
}

// Exponent of i picked up when multiplying Pauli (x1, z1) by (x2, z2).
fn g(x1: bool, z1: bool, x2: bool, z2: bool) -> i32 {
    let (x2, z2) = (x2 as i32, z2 as i32);
    match (x1, z1) {
        (false, false) => 0,
        (true, true) => z2 - x2,
        (true, false) => z2 * (2 * x2 - 1),
        (false, true) => x2 * (1 - 2 * z2),
    }
}

/// Outcome of one simulated shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub measurements: BitRow,
    pub detectors: BitRow,
    pub observables: BitRow,
}

/// CHP stabilizer simulator over `n` qubits, starting in |0…0⟩.
pub struct TableauSimulator {
    n: usize,
    rows: Vec<Row>,
    rng: ChaCha8Rng,
}

impl TableauSimulator {
    /// Creates a simulator with a deterministic random stream.
    pub fn new(num_qubits: usize, seed: u64) -> Self {
        Self::with_rng(num_qubits, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(num_qubits: usize, rng: ChaCha8Rng) -> Self {
        let mut sim = Self {
            n: num_qubits,
            rows: Vec::new(),
            rng,
        };
        sim.clear();
        sim
    }

    /// Returns every qubit to |0⟩.
    pub fn clear(&mut self) {
        let n = self.n;
        self.rows = (0..2 * n).map(|_| Row::zero(n)).collect();
        for q in 0..n {
            self.rows[q].x.set(q, true);
            self.rows[n + q].z.set(q, true);
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.n
    }

    pub fn h(&mut self, q: usize) {
        for row in &mut self.rows {
            let (x, z) = (row.x[q], row.z[q]);
            row.sign ^= x & z;
            row.x.set(q, z);
            row.z.set(q, x);
        }
    }

    pub fn cx(&mut self, control: usize, target: usize) {
        for row in &mut self.rows {
            let (xa, za) = (row.x[control], row.z[control]);
            let (xb, zb) = (row.x[target], row.z[target]);
            row.sign ^= xa & zb & !(xb ^ za);
            row.x.set(target, xb ^ xa);
            row.z.set(control, za ^ zb);
        }
    }

    pub fn x(&mut self, q: usize) {
        for row in &mut self.rows {
            row.sign ^= row.z[q];
        }
    }

    pub fn z(&mut self, q: usize) {
        for row in &mut self.rows {
            row.sign ^= row.x[q];
        }
    }

    pub fn y(&mut self, q: usize) {
        for row in &mut self.rows {
            row.sign ^= row.x[q] ^ row.z[q];
        }
    }

    /// Measures qubit `q` in the Z basis.
    pub fn measure(&mut self, q: usize) -> bool {
        let n = self.n;
        if let Some(p) = (n..2 * n).find(|&i| self.rows[i].x[q]) {
            let pivot = self.rows[p].clone();
            for (i, row) in self.rows.iter_mut().enumerate() {
                if i != p && row.x[q] {
                    row.multiply_by(&pivot);
                }
            }
            let outcome = self.rng.gen_bool(0.5);
            self.rows[p - n] = pivot;
            let mut fresh = Row::zero(n);
            fresh.z.set(q, true);
            fresh.sign = outcome;
            self.rows[p] = fresh;
            outcome
        } else {
            let mut scratch = Row::zero(n);
            for i in 0..n {
                if self.rows[i].x[q] {
                    scratch.multiply_by(&self.rows[i + n]);
                }
            }
            scratch.sign
        }
    }

    /// Resets qubit `q` to |0⟩.
    pub fn reset(&mut self, q: usize) {
        if self.measure(q) {
            self.x(q);
        }
    }

    fn depolarize(&mut self, q: usize) {
        match self.rng.gen_range(0..3) {
            0 => self.x(q),
            1 => self.y(q),
            _ => self.z(q),
        }
    }

    /// Executes `circuit` from |0…0⟩ and returns one shot.
    ///
    /// Coordinate and layout annotations are ignored. Noise channels are
    /// sampled from the simulator's random stream.
    pub fn run(&mut self, circuit: &Circuit) -> Result<Sample, QecError> {
        if circuit.num_qubits() > self.n {
            return Err(QecError::ShapeMismatch {
                context: "simulator qubit count",
                expected: self.n,
                found: circuit.num_qubits(),
            });
        }
        self.clear();
        let mut record = BitRow::with_capacity(circuit.num_measurements());
        let mut detectors = BitRow::with_capacity(circuit.num_detectors());
        let mut observables = BitRow::repeat(false, circuit.num_observables());

        for instr in circuit {
            let p = instr.args.first().copied().unwrap_or(0.0);
            match instr.opcode {
                Opcode::QubitCoords | Opcode::Tick | Opcode::ShiftCoords => {}
                Opcode::Reset => instr.qubits().for_each(|q| self.reset(q as usize)),
                Opcode::H => instr.qubits().for_each(|q| self.h(q as usize)),
                Opcode::Cx => {
                    let qs: Vec<u32> = instr.qubits().collect();
                    for pair in qs.chunks_exact(2) {
                        self.cx(pair[0] as usize, pair[1] as usize);
                    }
                }
                Opcode::Measure | Opcode::MeasureReset => {
                    for q in instr.qubits() {
                        let bit = self.measure(q as usize);
                        record.push(bit);
                        if instr.opcode == Opcode::MeasureReset && bit {
                            self.x(q as usize);
                        }
                    }
                }
                Opcode::XError | Opcode::ZError | Opcode::Depolarize1 => {
                    for q in instr.qubits() {
                        if !self.rng.gen_bool(p) {
                            continue;
                        }
                        match instr.opcode {
                            Opcode::XError => self.x(q as usize),
                            Opcode::ZError => self.z(q as usize),
                            _ => self.depolarize(q as usize),
                        }
                    }
                }
                Opcode::Detector => detectors.push(parity(&record, instr.lookbacks())?),
                Opcode::ObservableInclude => {
                    let index = p as usize;
                    let flip = parity(&record, instr.lookbacks())?;
                    let current = observables[index];
                    observables.set(index, current ^ flip);
                }
            }
        }

        Ok(Sample {
            measurements: record,
            detectors,
            observables,
        })
    }
}

fn parity(record: &BitRow, lookbacks: impl Iterator<Item = i32>) -> Result<bool, QecError> {
    let mut acc = false;
    for lb in lookbacks {
        let idx = record.len() as i64 + lb as i64;
        if lb >= 0 || idx < 0 {
            return Err(QecError::InvalidTarget);
        }
        acc ^= record[idx as usize];
    }
    Ok(acc)
}

/// Samples `shots` independent shots of `circuit`.
///
/// Shot `s` draws from the ChaCha8 stream `s` of `seed`, so results do not
/// depend on how shots are scheduled across threads.
pub fn sample_batch(circuit: &Circuit, shots: usize, seed: u64) -> Result<ShotBatch, QecError> {
    let run_shot = |shot: usize| -> Result<Sample, QecError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(shot as u64);
        TableauSimulator::with_rng(circuit.num_qubits(), rng).run(circuit)
    };

    #[cfg(feature = "parallel")]
    let samples: Vec<Sample> = (0..shots)
        .into_par_iter()
        .map(run_shot)
        .collect::<Result<_, _>>()?;

    #[cfg(not(feature = "parallel"))]
    let samples: Vec<Sample> = (0..shots).map(run_shot).collect::<Result<_, _>>()?;

    let detectors = BitMatrix::from_rows(
        circuit.num_detectors(),
        samples.iter().map(|s| s.detectors.clone()).collect(),
    )?;
    let observables = BitMatrix::from_rows(
        circuit.num_observables(),
        samples.into_iter().map(|s| s.observables).collect(),
    )?;
    Ok(ShotBatch {
        detectors,
        observables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_qubits_measure_zero() {
        let mut sim = TableauSimulator::new(3, 7);
        assert!(!sim.measure(0));
        sim.x(1);
        assert!(sim.measure(1));
    }

    #[test]
    fn bell_pair_outcomes_agree() {
        for seed in 0..20 {
            let mut sim = TableauSimulator::new(2, seed);
            sim.h(0);
            sim.cx(0, 1);
            let a = sim.measure(0);
            let b = sim.measure(1);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn plus_state_measures_zero_in_x_basis() {
        let mut sim = TableauSimulator::new(1, 3);
        sim.h(0);
        sim.z(0);
        sim.z(0);
        sim.h(0);
        assert!(!sim.measure(0));
    }

    #[test]
    fn ghz_parity_via_circuit() {
        let mut c = Circuit::new();
        c.reset(&[0, 1, 2, 3]).unwrap();
        c.h(&[0]).unwrap();
        c.cx(&[(0, 1), (1, 2)]).unwrap();
        c.cx(&[(0, 3), (1, 3)]).unwrap();
        c.measure_reset(&[3]).unwrap();
        c.detector(&[-1], [0.0; 3]).unwrap();
        c.measure(&[0, 1, 2]).unwrap();
        c.detector(&[-1, -2], [0.0; 3]).unwrap();
        c.observable_include(&[-3], 0).unwrap();
        let batch = sample_batch(&c, 64, 11).unwrap();
        assert!(batch.detectors.is_zero());
        let ones = batch.observables.rows().iter().filter(|r| r[0]).count();
        assert!(ones > 0 && ones < 64);
    }

    #[test]
    fn certain_flip_is_detected() {
        let mut c = Circuit::new();
        c.reset(&[0]).unwrap();
        c.noise(Opcode::XError, 1.0, &[0]).unwrap();
        c.measure(&[0]).unwrap();
        c.detector(&[-1], [0.0; 3]).unwrap();
        let batch = sample_batch(&c, 4, 0).unwrap();
        assert!(batch.detectors.rows().iter().all(|r| r[0]));
    }
}
