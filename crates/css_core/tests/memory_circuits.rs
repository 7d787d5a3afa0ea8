use css_common::isa::Opcode;
use css_core::catalog;
use css_core::code::Code;
use css_core::memory::MemoryExperiment;
use css_core::noise::NoiseModel;
use css_core::pauli::Basis;
use css_core::tableau;

#[test]
fn noiseless_detectors_are_deterministic() {
    for code in catalog::all().unwrap() {
        for rounds in [1, 3] {
            for basis in [Basis::Z, Basis::X] {
                let circuit = MemoryExperiment::new(&code, rounds, basis).build().unwrap();
                let batch = tableau::sample_batch(&circuit, 100, 17).unwrap();
                assert_eq!(batch.num_shots(), 100);
                assert!(
                    batch.detectors.is_zero(),
                    "{} rounds={} basis={}: detector fired",
                    catalog::label(&code),
                    rounds,
                    basis
                );
                assert!(
                    batch.observables.is_zero(),
                    "{} rounds={} basis={}: observable flipped",
                    catalog::label(&code),
                    rounds,
                    basis
                );
            }
        }
    }
}

#[test]
fn noiseless_error_model_is_empty() {
    for code in catalog::all().unwrap() {
        let circuit = MemoryExperiment::new(&code, 2, Basis::Z).build().unwrap();
        let noisy = NoiseModel::default().apply(&circuit, &[]).unwrap();
        let dem = css_core::dem::DetectorErrorModel::from_circuit(&noisy).unwrap();
        assert!(dem.mechanisms().is_empty());
    }
}

#[test]
fn four_two_two_single_round() {
    let code = catalog::four_two_two().unwrap();
    assert_eq!(code.k(), 2);
    let circuit = MemoryExperiment::new(&code, 1, Basis::Z).build().unwrap();
    // One ancilla per basis, one Z comparison in round 0 and one closing
    // comparison against the data.
    assert_eq!(circuit.num_detectors(), 2);
    assert_eq!(circuit.num_observables(), 2);
    assert_eq!(circuit.count(Opcode::ObservableInclude), 2);
    assert_eq!(circuit.num_measurements(), 2 + 4);

    let three = MemoryExperiment::new(&code, 3, Basis::Z).build().unwrap();
    // Each extra round adds one comparison per ancilla.
    assert_eq!(three.num_detectors(), 2 + 2 * 2);
}

#[test]
fn rotated_surface_uses_geometric_schedule() {
    let code = catalog::rotated_surface(3).unwrap();
    let (circuit, report) = MemoryExperiment::new(&code, 1, Basis::Z)
        .build_with_report()
        .unwrap();
    assert_eq!(report.support_mismatches, 0);
    assert_eq!(report.empty_scheduled_checks, 0);
    // Four CX layers per basis.
    assert_eq!(circuit.count(Opcode::Cx), 8);
    assert_eq!(circuit.count(Opcode::QubitCoords), code.n() + 8);
}

#[test]
fn gate_noise_shows_up_in_the_error_model() {
    let code = catalog::steane().unwrap();
    let circuit = MemoryExperiment::new(&code, 2, Basis::X).build().unwrap();
    let data: Vec<u32> = (0..7).collect();
    let noisy = NoiseModel::uniform(0.001).apply(&circuit, &data).unwrap();
    let dem = css_core::dem::DetectorErrorModel::from_circuit(&noisy).unwrap();
    assert_eq!(dem.num_detectors(), circuit.num_detectors());
    assert!(!dem.mechanisms().is_empty());
    assert!(dem.mechanisms().iter().all(|m| m.probability > 0.0 && m.probability < 0.01));
}
