//! Circuit-level noise insertion.
//!
//! Takes a noiseless circuit and returns a copy with noise channels inserted:
//! depolarizing noise on the data qubits at every tick, classical flip noise
//! on every measured qubit, and depolarizing noise on both qubits of every
//! CNOT.

use crate::QecError;
use crate::circuit::Circuit;
use css_common::isa::Opcode;

/// Probabilities of the three noise sources.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoiseModel {
    /// Depolarizing probability on each data qubit at the start of every
    /// round and before the final measurement.
    pub data_error: f64,

    /// Flip probability applied before each measurement.
    pub measurement_error: f64,

    /// Depolarizing probability on each qubit touched by a CNOT layer.
    pub gate_error: f64,
}

impl NoiseModel {
    /// Same probability for every source.
    pub fn uniform(p: f64) -> Self {
        Self {
            data_error: p,
            measurement_error: p,
            gate_error: p,
        }
    }

    /// Only data depolarization and measurement flips (phenomenological).
    pub fn phenomenological(p: f64) -> Self {
        Self {
            data_error: p,
            measurement_error: p,
            gate_error: 0.0,
        }
    }

    pub fn is_noiseless(&self) -> bool {
        self.data_error == 0.0 && self.measurement_error == 0.0 && self.gate_error == 0.0
    }

    /// Checks every probability lies in [0, 0.5].
    pub fn validate(&self) -> Result<(), QecError> {
        for p in [self.data_error, self.measurement_error, self.gate_error] {
            if !(0.0..=0.5).contains(&p) {
                return Err(QecError::InvalidProbability(p));
            }
        }
        Ok(())
    }

    /// Returns a noisy copy of `circuit`.
    ///
    /// # Arguments
    ///
    /// * `circuit` - Noiseless source circuit
    /// * `data_qubits` - Qubits that receive idle depolarization after each tick
    pub fn apply(&self, circuit: &Circuit, data_qubits: &[u32]) -> Result<Circuit, QecError> {
        self.validate()?;
        let mut out = Circuit::new();
        for instr in circuit {
            match instr.opcode {
                Opcode::Measure | Opcode::MeasureReset => {
                    let qubits: Vec<u32> = instr.qubits().collect();
                    out.noise(Opcode::XError, self.measurement_error, &qubits)?;
                    out.append(instr.clone())?;
                }
                Opcode::Tick => {
                    out.append(instr.clone())?;
                    out.noise(Opcode::Depolarize1, self.data_error, data_qubits)?;
                }
                Opcode::Cx => {
                    out.append(instr.clone())?;
                    let mut touched: Vec<u32> = instr.qubits().collect();
                    touched.sort_unstable();
                    touched.dedup();
                    out.noise(Opcode::Depolarize1, self.gate_error, &touched)?;
                }
                _ => out.append(instr.clone())?,
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_circuit() -> Circuit {
        let mut c = Circuit::new();
        c.reset(&[0, 1, 2]).unwrap();
        c.tick().unwrap();
        c.cx(&[(0, 2), (1, 2)]).unwrap();
        c.measure_reset(&[2]).unwrap();
        c.detector(&[-1], [0.0; 3]).unwrap();
        c
    }

    #[test]
    fn noiseless_model_is_identity() {
        let c = sample_circuit();
        assert_eq!(NoiseModel::default().apply(&c, &[0, 1]).unwrap(), c);
    }

    #[test]
    fn inserts_each_channel() {
        let c = sample_circuit();
        let noisy = NoiseModel::uniform(0.01).apply(&c, &[0, 1]).unwrap();
        assert_eq!(noisy.count(Opcode::Depolarize1), 2);
        assert_eq!(noisy.count(Opcode::XError), 1);
        assert_eq!(noisy.num_detectors(), c.num_detectors());
        let gate_noise = noisy
            .iter()
            .filter(|i| i.opcode == Opcode::Depolarize1)
            .nth(1)
            .unwrap();
        assert_eq!(gate_noise.qubits().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn rejects_out_of_range() {
        let c = sample_circuit();
        assert_eq!(
            NoiseModel::uniform(0.7).apply(&c, &[0]),
            Err(QecError::InvalidProbability(0.7))
        );
    }
}
