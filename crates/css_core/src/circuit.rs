//! Stabilizer circuit container with measurement record bookkeeping.
//!
//! A `Circuit` is an ordered list of `Instruction`s. Appending validates each
//! instruction against the circuit built so far: record lookbacks must be
//! negative and reach no further back than the current record length, CX
//! targets must come in distinct pairs, and noise probabilities must be valid.
//! The counters kept alongside make detector and observable counts available
//! without a second pass.

use crate::QecError;
use crate::gf2::BitMatrix;
use css_common::isa::{Instruction, Opcode, Target};

/// Detection events and observable flips of a batch of shots.
///
/// Row `s` of each matrix belongs to shot `s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotBatch {
    pub detectors: BitMatrix,
    pub observables: BitMatrix,
}

impl ShotBatch {
    pub fn num_shots(&self) -> usize {
        self.detectors.num_rows()
    }
}

/// Ordered stabilizer circuit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circuit {
    instructions: Vec<Instruction>,
    num_qubits: usize,
    num_measurements: usize,
    num_detectors: usize,
    num_observables: usize,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends an instruction.
    ///
    /// # Arguments
    ///
    /// * `instr` - Instruction to append
    ///
    /// # Returns
    ///
    /// `InvalidTarget` for record references outside the current record,
    /// qubit targets on annotation instructions, or malformed CX pairs;
    /// `InvalidProbability` for noise arguments outside [0, 1].
    pub fn append(&mut self, instr: Instruction) -> Result<(), QecError> {
        if instr.opcode.uses_records() {
            for t in &instr.targets {
                match *t {
                    Target::Rec(r) if r < 0 && (r.unsigned_abs() as usize) <= self.num_measurements => {}
                    _ => return Err(QecError::InvalidTarget),
                }
            }
        } else if instr.targets.iter().any(|t| t.lookback().is_some()) {
            return Err(QecError::InvalidTarget);
        }

        match instr.opcode {
            Opcode::Cx => {
                if instr.targets.len() % 2 != 0
                    || instr.targets.chunks(2).any(|pair| pair[0] == pair[1])
                {
                    return Err(QecError::InvalidTarget);
                }
            }
            Opcode::QubitCoords => {
                if instr.targets.len() != 1 {
                    return Err(QecError::InvalidTarget);
                }
            }
            op if op.is_noise() => {
                let p = instr.args.first().copied().unwrap_or(0.0);
                if !(0.0..=1.0).contains(&p) {
                    return Err(QecError::InvalidProbability(p));
                }
            }
            _ => {}
        }

        if let Some(max_q) = instr.qubits().max() {
            self.num_qubits = self.num_qubits.max(max_q as usize + 1);
        }
        match instr.opcode {
            op if op.is_measurement() => self.num_measurements += instr.targets.len(),
            Opcode::Detector => self.num_detectors += 1,
            Opcode::ObservableInclude => {
                let index = instr.args.first().copied().unwrap_or(0.0) as usize;
                self.num_observables = self.num_observables.max(index + 1);
            }
            _ => {}
        }

        self.instructions.push(instr);
        Ok(())
    }

    fn gate(&mut self, opcode: Opcode, qubits: &[u32]) -> Result<(), QecError> {
        if qubits.is_empty() {
            return Ok(());
        }
        self.append(Instruction::new(
            opcode,
            qubits.iter().map(|&q| Target::Qubit(q)).collect(),
            Vec::new(),
        ))
    }

    pub fn qubit_coords(&mut self, qubit: u32, coord: (f64, f64)) -> Result<(), QecError> {
        self.append(Instruction::new(
            Opcode::QubitCoords,
            vec![Target::Qubit(qubit)],
            vec![coord.0, coord.1],
        ))
    }

    pub fn reset(&mut self, qubits: &[u32]) -> Result<(), QecError> {
        self.gate(Opcode::Reset, qubits)
    }

    pub fn h(&mut self, qubits: &[u32]) -> Result<(), QecError> {
        self.gate(Opcode::H, qubits)
    }

    /// CNOTs on (control, target) pairs, emitted as one instruction.
    pub fn cx(&mut self, pairs: &[(u32, u32)]) -> Result<(), QecError> {
        if pairs.is_empty() {
            return Ok(());
        }
        let targets = pairs
            .iter()
            .flat_map(|&(c, t)| [Target::Qubit(c), Target::Qubit(t)])
            .collect();
        self.append(Instruction::new(Opcode::Cx, targets, Vec::new()))
    }

    pub fn measure(&mut self, qubits: &[u32]) -> Result<(), QecError> {
        self.gate(Opcode::Measure, qubits)
    }

    pub fn measure_reset(&mut self, qubits: &[u32]) -> Result<(), QecError> {
        self.gate(Opcode::MeasureReset, qubits)
    }

    pub fn tick(&mut self) -> Result<(), QecError> {
        self.append(Instruction::new(Opcode::Tick, Vec::new(), Vec::new()))
    }

    /// Noise channel with probability `p` on each target.
    pub fn noise(&mut self, opcode: Opcode, p: f64, qubits: &[u32]) -> Result<(), QecError> {
        if qubits.is_empty() || p == 0.0 {
            return Ok(());
        }
        self.append(Instruction::new(
            opcode,
            qubits.iter().map(|&q| Target::Qubit(q)).collect(),
            vec![p],
        ))
    }

    /// Declares a detector over the given record lookbacks.
    pub fn detector(&mut self, lookbacks: &[i32], coords: [f64; 3]) -> Result<(), QecError> {
        self.append(Instruction::new(
            Opcode::Detector,
            lookbacks.iter().map(|&r| Target::Rec(r)).collect(),
            coords.to_vec(),
        ))
    }

    pub fn observable_include(&mut self, lookbacks: &[i32], index: usize) -> Result<(), QecError> {
        self.append(Instruction::new(
            Opcode::ObservableInclude,
            lookbacks.iter().map(|&r| Target::Rec(r)).collect(),
            vec![index as f64],
        ))
    }

    pub fn shift_coords(&mut self, shift: [f64; 3]) -> Result<(), QecError> {
        self.append(Instruction::new(
            Opcode::ShiftCoords,
            Vec::new(),
            shift.to_vec(),
        ))
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn num_measurements(&self) -> usize {
        self.num_measurements
    }

    pub fn num_detectors(&self) -> usize {
        self.num_detectors
    }

    pub fn num_observables(&self) -> usize {
        self.num_observables
    }

    /// Number of instructions with the given opcode.
    pub fn count(&self, opcode: Opcode) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.opcode == opcode)
            .count()
    }

    /// Absolute coordinates of every detector, in declaration order.
    ///
    /// Each detector's arguments are offset by the sum of all preceding
    /// `SHIFT_COORDS` instructions.
    pub fn detector_coords(&self) -> Vec<Vec<f64>> {
        let mut shift: Vec<f64> = Vec::new();
        let mut out = Vec::with_capacity(self.num_detectors);
        for instr in &self.instructions {
            match instr.opcode {
                Opcode::ShiftCoords => {
                    if shift.len() < instr.args.len() {
                        shift.resize(instr.args.len(), 0.0);
                    }
                    for (s, a) in shift.iter_mut().zip(&instr.args) {
                        *s += a;
                    }
                }
                Opcode::Detector => out.push(
                    instr
                        .args
                        .iter()
                        .enumerate()
                        .map(|(i, a)| a + shift.get(i).copied().unwrap_or(0.0))
                        .collect(),
                ),
                _ => {}
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a Instruction;
    type IntoIter = core::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_appends() {
        let mut c = Circuit::new();
        c.reset(&[0, 1, 2]).unwrap();
        c.cx(&[(0, 2), (1, 2)]).unwrap();
        c.measure_reset(&[2]).unwrap();
        c.detector(&[-1], [0.0, 0.0, 0.0]).unwrap();
        c.measure(&[0, 1]).unwrap();
        c.observable_include(&[-1, -2], 0).unwrap();
        assert_eq!(c.num_qubits(), 3);
        assert_eq!(c.num_measurements(), 3);
        assert_eq!(c.num_detectors(), 1);
        assert_eq!(c.num_observables(), 1);
    }

    #[test]
    fn rejects_bad_lookbacks() {
        let mut c = Circuit::new();
        c.measure(&[0]).unwrap();
        assert_eq!(c.detector(&[-2], [0.0; 3]), Err(QecError::InvalidTarget));
        assert_eq!(c.detector(&[0], [0.0; 3]), Err(QecError::InvalidTarget));
        assert!(c.detector(&[-1], [0.0; 3]).is_ok());
    }

    #[test]
    fn rejects_malformed_cx_and_noise() {
        let mut c = Circuit::new();
        assert_eq!(c.cx(&[(1, 1)]), Err(QecError::InvalidTarget));
        assert_eq!(
            c.noise(Opcode::XError, 1.5, &[0]),
            Err(QecError::InvalidProbability(1.5))
        );
        assert!(c.is_empty());
    }

    #[test]
    fn detector_coords_accumulate_shifts() {
        let mut c = Circuit::new();
        c.measure(&[0]).unwrap();
        c.detector(&[-1], [1.0, 2.0, 0.0]).unwrap();
        c.shift_coords([0.0, 0.0, 1.0]).unwrap();
        c.measure(&[0]).unwrap();
        c.detector(&[-1, -2], [1.0, 2.0, 0.0]).unwrap();
        assert_eq!(
            c.detector_coords(),
            vec![vec![1.0, 2.0, 0.0], vec![1.0, 2.0, 1.0]]
        );
    }
}
