//! Test data generator for decoder benchmarks.
//!
//! Extracts the detector error model of a noisy memory circuit and samples
//! shots from it. Outputs the model (.dem) and the detection events (.b8),
//! plus the observable flips when a path is given, so that `bench` can score
//! the decoder as well as time it.

use anyhow::Result;
use css_core::circuit::Circuit;
use css_core::dem::DetectorErrorModel;
use css_io::{loader, parser};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generates benchmark data for a noisy circuit.
///
/// # Arguments
///
/// * `circuit` - Noisy memory circuit
/// * `dem_path` - Output path for the detector error model (.dem file)
/// * `b8_path` - Output path for the detection events (.b8 file)
/// * `obs_path` - Optional output path for the observable flips (.b8 file)
/// * `num_shots` - Number of shots to sample
/// * `seed` - Seed of the ChaCha8 sampling stream
pub fn generate_memory_data(
    circuit: &Circuit,
    dem_path: &str,
    b8_path: &str,
    obs_path: Option<&str>,
    num_shots: usize,
    seed: u64,
) -> Result<()> {
    let dem = DetectorErrorModel::from_circuit(circuit)?;
    println!(
        "Model: {} detectors, {} observables, {} error mechanisms",
        dem.num_detectors(),
        dem.num_observables(),
        dem.mechanisms().len()
    );
    parser::save_dem_file(&dem, dem_path)?;

    println!("Simulating {} shots...", num_shots);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let batch = dem.sample(num_shots, &mut rng);
    loader::write_b8(b8_path, &batch.detectors)?;
    if let Some(path) = obs_path {
        loader::write_b8(path, &batch.observables)?;
    }

    println!("Done.");
    Ok(())
}
