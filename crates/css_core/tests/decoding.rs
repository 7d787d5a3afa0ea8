use css_core::QecError;
use css_core::catalog;
use css_core::code::{Code, CssCode};
use css_core::decoder::{ConcatenatedDecoder, Decoder, DecoderRegistry, count_mismatches};
use css_core::dem::DetectorErrorModel;
use css_core::experiment::MemoryRun;
use css_core::graph::DecodingGraph;
use css_core::gf2::{BitMatrix, BitRow};
use css_core::memory::MemoryExperiment;
use css_core::noise::NoiseModel;
use css_core::pauli::Basis;

fn memory_dem(code: &CssCode, rounds: usize, noise: NoiseModel) -> DetectorErrorModel {
    let circuit = MemoryExperiment::new(code, rounds, Basis::Z).build().unwrap();
    let data: Vec<u32> = (0..code.n() as u32).collect();
    let noisy = noise.apply(&circuit, &data).unwrap();
    DetectorErrorModel::from_circuit(&noisy).unwrap()
}

fn repetition_dem(n: usize, rounds: usize) -> DetectorErrorModel {
    memory_dem(&catalog::repetition(n).unwrap(), rounds, NoiseModel::uniform(0.01))
}

fn syndrome_of(dem: &DetectorErrorModel, detectors: &[usize]) -> BitRow {
    let mut row = BitRow::repeat(false, dem.num_detectors());
    for &d in detectors {
        row.set(d, true);
    }
    row
}

#[test]
fn every_backend_corrects_single_faults() {
    let dem = repetition_dem(5, 3);
    let registry = DecoderRegistry::with_builtin();
    for name in ["matching", "union_find"] {
        let decoder = registry.get(name, &dem).unwrap();
        for m in dem.mechanisms() {
            let predicted = decoder.decode_shot(&syndrome_of(&dem, &m.detectors)).unwrap();
            let actual: Vec<usize> = predicted.iter_ones().collect();
            assert_eq!(actual, m.observables, "{} on {:?}", name, m.detectors);
        }
    }
}

#[test]
fn surface_code_single_faults_are_corrected() {
    let code = catalog::rotated_surface(3).unwrap();
    let dem = memory_dem(&code, 3, NoiseModel::phenomenological(0.001));
    // Y faults on data qubits split into one X-check and one Z-check piece.
    assert!(dem.mechanisms().iter().any(|m| m.components.len() == 2));

    let registry = DecoderRegistry::with_builtin();
    for name in ["matching", "union_find"] {
        let decoder = registry.get(name, &dem).unwrap();
        for m in dem.mechanisms() {
            let predicted = decoder.decode_shot(&syndrome_of(&dem, &m.detectors)).unwrap();
            let actual: Vec<usize> = predicted.iter_ones().collect();
            assert_eq!(actual, m.observables, "{} on {:?}", name, m.detectors);
        }
    }
}

#[test]
fn surface_code_graph_has_no_cross_type_edges() {
    let code = catalog::rotated_surface(3).unwrap();
    let dem = memory_dem(&code, 3, NoiseModel::uniform(0.001));
    let graph = DecodingGraph::from_dem(&dem).unwrap();

    // Detectors flipped by some X-only or Z-only single fault on a data
    // qubit, taken from the undecomposed two-part mechanisms.
    let mut x_side = vec![false; dem.num_detectors()];
    let mut z_side = vec![false; dem.num_detectors()];
    for m in dem.mechanisms().iter().filter(|m| m.components.len() == 2) {
        m.components[0].detectors.iter().for_each(|&d| x_side[d] = true);
        m.components[1].detectors.iter().for_each(|&d| z_side[d] = true);
    }
    for e in graph.edges().iter().filter(|e| e.v != graph.boundary()) {
        let mixed = (x_side[e.u] && z_side[e.v]) || (z_side[e.u] && x_side[e.v]);
        assert!(!mixed, "edge {}-{} joins both check types", e.u, e.v);
    }
}

#[test]
fn larger_distance_fails_less() {
    let registry = DecoderRegistry::with_builtin();
    for decoder in ["matching", "union_find"] {
        let failures = |d: usize| {
            let run = MemoryRun {
                rounds: d,
                basis: Basis::Z,
                noise: NoiseModel::uniform(0.001),
                shots: 4000,
                seed: 7,
                decoder: Some(decoder.to_string()),
                exact: false,
            };
            let code = catalog::rotated_surface(d).unwrap();
            run.run(&code, &registry).unwrap().logical_failures
        };
        let (d3, d5) = (failures(3), failures(5));
        assert!(d5 < d3, "{}: d=3 {} failures, d=5 {} failures", decoder, d3, d5);
    }
}

#[test]
fn batch_width_is_checked_before_decoding() {
    let dem = repetition_dem(3, 1);
    let decoder = DecoderRegistry::with_builtin().get("uf", &dem).unwrap();
    let wrong = BitMatrix::zeros(4, dem.num_detectors() + 1);
    assert_eq!(
        decoder.decode_batch(&wrong).err(),
        Some(QecError::DetectorCountMismatch {
            expected: dem.num_detectors(),
            found: dem.num_detectors() + 1,
        })
    );
}

#[test]
fn unknown_backend_falls_back_to_matching() {
    let dem = repetition_dem(3, 1);
    let registry = DecoderRegistry::with_builtin();
    assert_eq!(
        registry.get("tesseract", &dem).err().map(|e| e.to_string()),
        Some("decoder 'tesseract' is not available".to_string())
    );
    let decoder = registry.select(Some("tesseract"), &dem).unwrap();
    assert_eq!(decoder.name(), "matching");
}

#[test]
fn concatenation_checks_level_shapes() {
    let inner = repetition_dem(3, 1);
    let registry = DecoderRegistry::with_builtin();
    let levels: Vec<Box<dyn Decoder>> = vec![
        registry.get("matching", &inner).unwrap(),
        registry.get("matching", &inner).unwrap(),
    ];
    let err = ConcatenatedDecoder::new(levels, 1).err();
    assert_eq!(
        err,
        Some(QecError::LevelMismatch {
            level: 0,
            produced: inner.num_observables(),
            expected: inner.num_detectors(),
        })
    );
}

#[test]
fn decoding_beats_doing_nothing() {
    let code = catalog::rotated_surface(3).unwrap();
    let registry = DecoderRegistry::with_builtin();
    for decoder in ["matching", "union_find"] {
        let run = MemoryRun {
            rounds: 3,
            basis: Basis::Z,
            noise: NoiseModel::uniform(0.002),
            shots: 2000,
            seed: 21,
            decoder: Some(decoder.to_string()),
            exact: false,
        };
        let outcome = run.run(&code, &registry).unwrap();
        assert_eq!(outcome.decoder, decoder);

        let circuit = MemoryExperiment::new(&code, 3, Basis::Z).build().unwrap();
        let data: Vec<u32> = (0..9).collect();
        let noisy = run.noise.apply(&circuit, &data).unwrap();
        let dem = DetectorErrorModel::from_circuit(&noisy).unwrap();
        let mut rng = <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(21);
        let batch = dem.sample(2000, &mut rng);
        let undecoded = BitMatrix::zeros(2000, dem.num_observables());
        let raw = count_mismatches(&undecoded, &batch.observables).unwrap();
        assert!(
            outcome.logical_failures < raw,
            "{}: {} failures vs {} undecoded",
            decoder,
            outcome.logical_failures,
            raw
        );
    }
}
