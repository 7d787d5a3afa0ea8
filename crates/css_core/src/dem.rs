//! Detector error model.
//!
//! A detector error model (DEM) lists independent error mechanisms, each with
//! a probability and the detectors and observables it flips. It is extracted
//! from a noisy circuit by pushing every single fault through the remainder
//! of the circuit with a Pauli frame.

use crate::QecError;
use crate::circuit::{Circuit, ShotBatch};
use crate::gf2::{BitMatrix, BitRow};
use crate::pauli::Pauli;
use crate::pauli_frame::PauliFrame;
use css_common::isa::Opcode;
use log::debug;
use rand::Rng;
use std::collections::BTreeMap;

/// One independent error mechanism.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorMechanism {
    pub probability: f64,
    /// Flipped detectors, sorted ascending.
    pub detectors: Vec<usize>,
    /// Flipped observables, sorted ascending.
    pub observables: Vec<usize>,
    /// Suggested split into simpler faults, `^`-separated in .dem text.
    ///
    /// Empty when the mechanism is not decomposed. Otherwise the components
    /// XOR to `detectors` and `observables`.
    pub components: Vec<Component>,
}

/// One piece of a decomposed error mechanism.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    pub detectors: Vec<usize>,
    pub observables: Vec<usize>,
}

impl ErrorMechanism {
    pub fn new(probability: f64, detectors: Vec<usize>, observables: Vec<usize>) -> Self {
        Self {
            probability,
            detectors,
            observables,
            components: Vec::new(),
        }
    }

    /// Components to hand to a graph decoder; the whole mechanism when it
    /// carries no decomposition.
    pub fn pieces(&self) -> Vec<Component> {
        if self.components.is_empty() {
            vec![Component {
                detectors: self.detectors.clone(),
                observables: self.observables.clone(),
            }]
        } else {
            self.components.clone()
        }
    }
}

/// Probability that exactly one of two independent events fires.
pub fn combine_probabilities(p1: f64, p2: f64) -> f64 {
    p1 * (1.0 - p2) + p2 * (1.0 - p1)
}

/// Collection of independent error mechanisms over fixed detector and
/// observable counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorErrorModel {
    num_detectors: usize,
    num_observables: usize,
    mechanisms: Vec<ErrorMechanism>,
    detector_coords: Vec<Vec<f64>>,
}

impl DetectorErrorModel {
    pub fn new(num_detectors: usize, num_observables: usize) -> Self {
        Self {
            num_detectors,
            num_observables,
            mechanisms: Vec::new(),
            detector_coords: Vec::new(),
        }
    }

    /// Appends a mechanism after validating its indices and probability.
    ///
    /// Detector and observable lists are sorted before storage.
    pub fn push(&mut self, mut mechanism: ErrorMechanism) -> Result<(), QecError> {
        if !(0.0..=1.0).contains(&mechanism.probability) {
            return Err(QecError::InvalidProbability(mechanism.probability));
        }
        if let Some(&d) = mechanism.detectors.iter().find(|&&d| d >= self.num_detectors) {
            return Err(QecError::NodeOutOfBounds(d));
        }
        if let Some(&o) = mechanism
            .observables
            .iter()
            .find(|&&o| o >= self.num_observables)
        {
            return Err(QecError::NodeOutOfBounds(o));
        }
        for c in &mut mechanism.components {
            if let Some(&d) = c.detectors.iter().find(|&&d| d >= self.num_detectors) {
                return Err(QecError::NodeOutOfBounds(d));
            }
            if let Some(&o) = c.observables.iter().find(|&&o| o >= self.num_observables) {
                return Err(QecError::NodeOutOfBounds(o));
            }
            c.detectors.sort_unstable();
            c.observables.sort_unstable();
        }
        mechanism.detectors.sort_unstable();
        mechanism.observables.sort_unstable();
        self.mechanisms.push(mechanism);
        Ok(())
    }

    /// Attaches per-detector coordinates, one list per detector.
    pub fn set_detector_coords(&mut self, coords: Vec<Vec<f64>>) -> Result<(), QecError> {
        if coords.len() != self.num_detectors {
            return Err(QecError::ShapeMismatch {
                context: "detector coordinates",
                expected: self.num_detectors,
                found: coords.len(),
            });
        }
        self.detector_coords = coords;
        Ok(())
    }

    pub fn detector_coords(&self) -> &[Vec<f64>] {
        &self.detector_coords
    }

    pub fn num_detectors(&self) -> usize {
        self.num_detectors
    }

    pub fn num_observables(&self) -> usize {
        self.num_observables
    }

    pub fn mechanisms(&self) -> &[ErrorMechanism] {
        &self.mechanisms
    }

    /// Extracts the model of a noisy circuit.
    ///
    /// Every noise channel component is injected alone right after its
    /// instruction and propagated to the end of the circuit. Depolarizing
    /// noise of strength p contributes X, Y and Z components of p/3 each.
    /// A Y fault whose X and Z parts both flip something keeps them as its
    /// components, so that decoders can keep the two check types apart.
    /// Faults that flip nothing are dropped; faults with identical effects
    /// are merged, keeping the first decomposition seen.
    pub fn from_circuit(circuit: &Circuit) -> Result<Self, QecError> {
        let mut merged: BTreeMap<(Vec<usize>, Vec<usize>), (f64, Vec<Component>)> =
            BTreeMap::new();
        let propagator = Propagator::new(circuit);

        for (pos, instr) in circuit.iter().enumerate() {
            if !instr.opcode.is_noise() {
                continue;
            }
            let p = instr.args.first().copied().unwrap_or(0.0);
            if p == 0.0 {
                continue;
            }
            for q in instr.qubits() {
                let q = q as usize;
                let faults: Vec<(Effect, Vec<Component>, f64)> = match instr.opcode {
                    Opcode::XError => vec![(propagator.run(pos + 1, q, Pauli::X)?, vec![], p)],
                    Opcode::ZError => vec![(propagator.run(pos + 1, q, Pauli::Z)?, vec![], p)],
                    _ => {
                        let x = propagator.run(pos + 1, q, Pauli::X)?;
                        let z = propagator.run(pos + 1, q, Pauli::Z)?;
                        let y = x.combine(&z);
                        let parts = if x.is_trivial() || z.is_trivial() {
                            vec![]
                        } else {
                            vec![x.to_component(), z.to_component()]
                        };
                        vec![(x, vec![], p / 3.0), (y, parts, p / 3.0), (z, vec![], p / 3.0)]
                    }
                };
                for (effect, parts, prob) in faults {
                    if effect.is_trivial() {
                        continue;
                    }
                    let c = effect.to_component();
                    merged
                        .entry((c.detectors, c.observables))
                        .and_modify(|(acc, _)| *acc = combine_probabilities(*acc, prob))
                        .or_insert((prob, parts));
                }
            }
        }

        let mut dem = Self::new(circuit.num_detectors(), circuit.num_observables());
        dem.detector_coords = circuit.detector_coords();
        for ((detectors, observables), (probability, components)) in merged {
            dem.push(ErrorMechanism {
                probability,
                detectors,
                observables,
                components,
            })?;
        }
        debug!(
            "extracted {} error mechanisms over {} detectors",
            dem.mechanisms.len(),
            dem.num_detectors
        );
        Ok(dem)
    }

    /// Samples detection events and observable flips directly from the model.
    pub fn sample<R: Rng>(&self, shots: usize, rng: &mut R) -> ShotBatch {
        let mut detectors = BitMatrix::zeros(shots, self.num_detectors);
        let mut observables = BitMatrix::zeros(shots, self.num_observables);
        for shot in 0..shots {
            for m in &self.mechanisms {
                if !rng.gen_bool(m.probability) {
                    continue;
                }
                for &d in &m.detectors {
                    let v = detectors.get(shot, d);
                    detectors.set(shot, d, !v);
                }
                for &o in &m.observables {
                    let v = observables.get(shot, o);
                    observables.set(shot, o, !v);
                }
            }
        }
        ShotBatch {
            detectors,
            observables,
        }
    }
}

// Detectors and observables flipped by one fault.
struct Effect {
    detectors: BitRow,
    observables: BitRow,
}

impl Effect {
    fn combine(&self, other: &Effect) -> Effect {
        Effect {
            detectors: self.detectors.clone() ^ other.detectors.as_bitslice(),
            observables: self.observables.clone() ^ other.observables.as_bitslice(),
        }
    }

    fn is_trivial(&self) -> bool {
        self.detectors.not_any() && self.observables.not_any()
    }

    fn to_component(&self) -> Component {
        Component {
            detectors: self.detectors.iter_ones().collect(),
            observables: self.observables.iter_ones().collect(),
        }
    }
}

struct Propagator<'a> {
    circuit: &'a Circuit,
    // Measurements and detectors preceding each instruction.
    measurements_before: Vec<usize>,
    detectors_before: Vec<usize>,
}

impl<'a> Propagator<'a> {
    fn new(circuit: &'a Circuit) -> Self {
        let mut measurements_before = Vec::with_capacity(circuit.len() + 1);
        let mut detectors_before = Vec::with_capacity(circuit.len() + 1);
        let (mut m, mut d) = (0, 0);
        for instr in circuit {
            measurements_before.push(m);
            detectors_before.push(d);
            if instr.opcode.is_measurement() {
                m += instr.targets.len();
            }
            if instr.opcode == Opcode::Detector {
                d += 1;
            }
        }
        measurements_before.push(m);
        detectors_before.push(d);
        Self {
            circuit,
            measurements_before,
            detectors_before,
        }
    }

    fn run(&self, start: usize, qubit: usize, pauli: Pauli) -> Result<Effect, QecError> {
        let circuit = self.circuit;
        let mut frame = PauliFrame::new(circuit.num_qubits());
        frame.inject(qubit, pauli);

        let mut flips = BitRow::repeat(false, circuit.num_measurements());
        let mut detectors = BitRow::repeat(false, circuit.num_detectors());
        let mut observables = BitRow::repeat(false, circuit.num_observables());
        let mut m = self.measurements_before[start];
        let mut d = self.detectors_before[start];

        for instr in &circuit.instructions()[start..] {
            match instr.opcode {
                Opcode::Reset => instr.qubits().for_each(|q| frame.clear_qubit(q as usize)),
                Opcode::H => instr.qubits().for_each(|q| frame.apply_hadamard(q as usize)),
                Opcode::Cx => {
                    let qs: Vec<u32> = instr.qubits().collect();
                    for pair in qs.chunks_exact(2) {
                        frame.apply_cnot(pair[0] as usize, pair[1] as usize);
                    }
                }
                Opcode::Measure | Opcode::MeasureReset => {
                    for q in instr.qubits() {
                        flips.set(m, frame.has_x_error(q as usize));
                        m += 1;
                        if instr.opcode == Opcode::MeasureReset {
                            frame.clear_qubit(q as usize);
                        }
                    }
                }
                Opcode::Detector => {
                    detectors.set(d, record_parity(&flips, m, instr.lookbacks())?);
                    d += 1;
                }
                Opcode::ObservableInclude => {
                    let index = instr.args.first().copied().unwrap_or(0.0) as usize;
                    if record_parity(&flips, m, instr.lookbacks())? {
                        let v = observables[index];
                        observables.set(index, !v);
                    }
                }
                _ => {}
            }
        }
        Ok(Effect {
            detectors,
            observables,
        })
    }
}

fn record_parity(
    flips: &BitRow,
    recorded: usize,
    lookbacks: impl Iterator<Item = i32>,
) -> Result<bool, QecError> {
    let mut acc = false;
    for lb in lookbacks {
        let idx = recorded as i64 + lb as i64;
        if lb >= 0 || idx < 0 {
            return Err(QecError::InvalidTarget);
        }
        acc ^= flips[idx as usize];
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // Two-qubit repetition check: data 0,1 measured by ancilla 2 once.
    fn parity_circuit(p: f64) -> Circuit {
        let mut c = Circuit::new();
        c.reset(&[0, 1, 2]).unwrap();
        c.noise(Opcode::XError, p, &[0, 1]).unwrap();
        c.cx(&[(0, 2), (1, 2)]).unwrap();
        c.measure_reset(&[2]).unwrap();
        c.detector(&[-1], [0.0; 3]).unwrap();
        c.measure(&[0, 1]).unwrap();
        c.detector(&[-1, -2, -3], [0.0; 3]).unwrap();
        c.observable_include(&[-2], 0).unwrap();
        c
    }

    #[test]
    fn single_faults_become_mechanisms() {
        let dem = DetectorErrorModel::from_circuit(&parity_circuit(0.1)).unwrap();
        assert_eq!(dem.num_detectors(), 2);
        assert_eq!(dem.num_observables(), 1);
        let mechs = dem.mechanisms();
        assert_eq!(mechs.len(), 2);
        assert_eq!(mechs[0].detectors, vec![0]);
        assert!(mechs[0].observables.is_empty());
        assert_eq!(mechs[1].detectors, vec![0]);
        assert_eq!(mechs[1].observables, vec![0]);
    }

    #[test]
    fn identical_effects_merge() {
        let mut c = Circuit::new();
        c.reset(&[0]).unwrap();
        c.noise(Opcode::XError, 0.1, &[0]).unwrap();
        c.noise(Opcode::XError, 0.2, &[0]).unwrap();
        c.measure(&[0]).unwrap();
        c.detector(&[-1], [0.0; 3]).unwrap();
        let dem = DetectorErrorModel::from_circuit(&c).unwrap();
        assert_eq!(dem.mechanisms().len(), 1);
        let p = dem.mechanisms()[0].probability;
        assert!((p - (0.1 * 0.8 + 0.2 * 0.9)).abs() < 1e-12);
    }

    #[test]
    fn z_errors_before_measurement_are_invisible() {
        let mut c = Circuit::new();
        c.reset(&[0]).unwrap();
        c.noise(Opcode::ZError, 0.3, &[0]).unwrap();
        c.measure(&[0]).unwrap();
        c.detector(&[-1], [0.0; 3]).unwrap();
        let dem = DetectorErrorModel::from_circuit(&c).unwrap();
        assert!(dem.mechanisms().is_empty());
    }

    // Data qubit 0 read out by a Z check (ancilla 1) and an X check (ancilla 2).
    #[test]
    fn y_faults_keep_their_x_and_z_parts() {
        let mut c = Circuit::new();
        c.reset(&[0, 1, 2]).unwrap();
        c.noise(Opcode::Depolarize1, 0.03, &[0]).unwrap();
        c.h(&[2]).unwrap();
        c.cx(&[(0, 1)]).unwrap();
        c.cx(&[(2, 0)]).unwrap();
        c.h(&[2]).unwrap();
        c.measure_reset(&[1, 2]).unwrap();
        c.detector(&[-2], [0.0; 3]).unwrap();
        c.detector(&[-1], [1.0, 0.0, 0.0]).unwrap();
        let dem = DetectorErrorModel::from_circuit(&c).unwrap();

        let mechs = dem.mechanisms();
        assert_eq!(mechs.len(), 3);
        let y = mechs.iter().find(|m| m.detectors == vec![0, 1]).unwrap();
        assert!((y.probability - 0.01).abs() < 1e-12);
        assert_eq!(
            y.components,
            vec![
                Component {
                    detectors: vec![0],
                    observables: vec![],
                },
                Component {
                    detectors: vec![1],
                    observables: vec![],
                },
            ]
        );
        for m in mechs.iter().filter(|m| m.detectors.len() == 1) {
            assert!(m.components.is_empty());
            assert_eq!(m.pieces().len(), 1);
        }
    }

    #[test]
    fn push_validates() {
        let mut dem = DetectorErrorModel::new(2, 1);
        let bad = ErrorMechanism::new(0.1, vec![2], vec![]);
        assert_eq!(dem.push(bad), Err(QecError::NodeOutOfBounds(2)));
        let mut bad_part = ErrorMechanism::new(0.1, vec![0], vec![]);
        bad_part.components = vec![Component {
            detectors: vec![0],
            observables: vec![1],
        }];
        assert_eq!(dem.push(bad_part), Err(QecError::NodeOutOfBounds(1)));
        let ok = ErrorMechanism::new(0.1, vec![1, 0], vec![0]);
        dem.push(ok).unwrap();
        assert_eq!(dem.mechanisms()[0].detectors, vec![0, 1]);
    }

    #[test]
    fn sampling_with_certain_error() {
        let mut dem = DetectorErrorModel::new(3, 1);
        dem.push(ErrorMechanism::new(1.0, vec![0, 2], vec![0])).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let batch = dem.sample(3, &mut rng);
        for shot in 0..3 {
            assert!(batch.detectors.get(shot, 0));
            assert!(!batch.detectors.get(shot, 1));
            assert!(batch.observables.get(shot, 0));
        }
    }
}
