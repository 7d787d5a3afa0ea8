use css_core::catalog;
use css_core::dem::DetectorErrorModel;
use css_core::memory::MemoryExperiment;
use css_core::noise::NoiseModel;
use css_core::pauli::Basis;
use css_io::{loader, parser, stim};

fn noisy_repetition_dem() -> DetectorErrorModel {
    let code = catalog::repetition(3).unwrap();
    let circuit = MemoryExperiment::new(&code, 2, Basis::Z).build().unwrap();
    let noisy = NoiseModel::uniform(0.01).apply(&circuit, &[0, 1, 2]).unwrap();
    DetectorErrorModel::from_circuit(&noisy).unwrap()
}

#[test]
fn dem_text_round_trip_preserves_model() {
    let dem = noisy_repetition_dem();
    let text = parser::write_dem(&dem);
    let back = parser::parse_dem(&text).unwrap();
    assert_eq!(back.num_detectors(), dem.num_detectors());
    assert_eq!(back.num_observables(), dem.num_observables());
    assert_eq!(back.mechanisms(), dem.mechanisms());
    assert_eq!(back.detector_coords(), dem.detector_coords());
}

#[test]
fn dem_file_round_trip() {
    let dem = noisy_repetition_dem();
    let path = std::env::temp_dir().join(format!("css_io_{}.dem", std::process::id()));
    parser::save_dem_file(&dem, &path).unwrap();
    let back = parser::load_dem_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(back.mechanisms().len(), dem.mechanisms().len());
}

#[test]
fn stim_text_has_expected_shape() {
    let code = catalog::four_two_two().unwrap();
    let circuit = MemoryExperiment::new(&code, 1, Basis::Z).build().unwrap();
    let text = stim::to_stim_string(&circuit);
    assert!(text.starts_with("R "));
    assert!(text.contains("\nMR "));
    assert!(text.contains("DETECTOR("));
    assert!(text.contains("rec[-1]"));
    assert_eq!(text.lines().filter(|l| l.starts_with("OBSERVABLE_INCLUDE(")).count(), 2);

    let mut buf = Vec::new();
    stim::write_circuit(&circuit, &mut buf).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), text);
}

#[test]
fn b8_file_round_trip() {
    let dem = noisy_repetition_dem();
    let mut rng = <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(9);
    let batch = dem.sample(37, &mut rng);
    let path = std::env::temp_dir().join(format!("css_io_{}.b8", std::process::id()));
    loader::write_b8(&path, &batch.detectors).unwrap();
    let raw = loader::load_b8_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    let shots = loader::slice_shots(&raw, dem.num_detectors()).unwrap();
    assert_eq!(shots, batch.detectors);
}
