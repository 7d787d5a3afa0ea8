//! Pauli frame tracking for fault propagation.
//!
//! Implements the Pauli frame abstraction that tracks X and Z errors on each
//! qubit without storing the quantum state. Pushing a single fault through
//! the rest of a Clifford circuit with a frame tells exactly which
//! measurements it flips, which is how the detector error model is built.

use crate::gf2::BitRow;
use crate::pauli::Pauli;

/// Pauli frame tracking X and Z errors on every qubit.
///
/// Maintains two bit vectors (X and Z registers) where each bit indicates
/// whether the corresponding qubit currently carries an X or Z error. Gates
/// are applied by updating these registers according to their conjugation
/// rules on Pauli operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauliFrame {
    /// Bit vector tracking X errors on each qubit.
    ///
    /// An X error on a qubit flips its next Z-basis measurement.
    pub x_register: BitRow,

    /// Bit vector tracking Z errors on each qubit.
    ///
    /// Z errors are invisible to Z-basis measurements until a Hadamard or
    /// CNOT converts them into X errors.
    pub z_register: BitRow,
}

impl PauliFrame {
    /// Creates an error-free frame for the specified number of qubits.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            x_register: BitRow::repeat(false, num_qubits),
            z_register: BitRow::repeat(false, num_qubits),
        }
    }

    /// Clears both registers.
    pub fn reset(&mut self) {
        self.x_register.fill(false);
        self.z_register.fill(false);
    }

    /// Returns true if no qubit carries an error.
    pub fn is_clean(&self) -> bool {
        self.x_register.not_any() && self.z_register.not_any()
    }

    /// Multiplies a single-qubit Pauli error into the frame.
    ///
    /// # Arguments
    ///
    /// * `q` - Qubit the error acts on
    /// * `pauli` - Error type; Y toggles both registers
    pub fn inject(&mut self, q: usize, pauli: Pauli) {
        if matches!(pauli, Pauli::X | Pauli::Y) {
            let x = self.x_register[q];
            self.x_register.set(q, !x);
        }
        if matches!(pauli, Pauli::Z | Pauli::Y) {
            let z = self.z_register[q];
            self.z_register.set(q, !z);
        }
    }

    /// Applies a Hadamard gate to the specified qubit, updating the Pauli frame.
    ///
    /// The Hadamard gate conjugates X to Z and Z to X, so the frame update
    /// swaps the X and Z error bits for this qubit.
    pub fn apply_hadamard(&mut self, q: usize) {
        let has_x = self.x_register[q];
        let has_z = self.z_register[q];
        self.x_register.set(q, has_z);
        self.z_register.set(q, has_x);
    }

    /// Applies a CNOT gate with control and target qubits, updating the Pauli frame.
    ///
    /// CNOT conjugates X_c to X_c X_t and Z_t to Z_c Z_t. If the control has
    /// an X error, toggle the target's X error; if the target has a Z error,
    /// toggle the control's Z error.
    ///
    /// # Arguments
    ///
    /// * `c` - Control qubit index
    /// * `t` - Target qubit index
    pub fn apply_cnot(&mut self, c: usize, t: usize) {
        if self.x_register[c] {
            let x = self.x_register[t];
            self.x_register.set(t, !x);
        }
        if self.z_register[t] {
            let z = self.z_register[c];
            self.z_register.set(c, !z);
        }
    }

    /// Removes any error on a qubit that is being reset.
    pub fn clear_qubit(&mut self, q: usize) {
        self.x_register.set(q, false);
        self.z_register.set(q, false);
    }

    /// Checks whether the specified qubit has an X error in the frame.
    ///
    /// A qubit with an X error produces a flipped Z-basis measurement
    /// compared to the noiseless value.
    pub fn has_x_error(&self, q: usize) -> bool {
        self.x_register[q]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hadamard_swaps_error_type() {
        let mut f = PauliFrame::new(1);
        f.inject(0, Pauli::Z);
        assert!(!f.has_x_error(0));
        f.apply_hadamard(0);
        assert!(f.has_x_error(0));
    }

    #[test]
    fn cnot_spreads_x_forward_and_z_backward() {
        let mut f = PauliFrame::new(3);
        f.inject(0, Pauli::X);
        f.apply_cnot(0, 1);
        assert!(f.has_x_error(1));

        f.reset();
        f.inject(2, Pauli::Z);
        f.apply_cnot(1, 2);
        assert!(f.z_register[1]);
        assert!(f.z_register[2]);
    }

    #[test]
    fn y_is_x_times_z() {
        let mut f = PauliFrame::new(1);
        f.inject(0, Pauli::Y);
        f.inject(0, Pauli::X);
        assert!(!f.has_x_error(0));
        assert!(f.z_register[0]);
        f.clear_qubit(0);
        assert!(f.is_clean());
    }
}
