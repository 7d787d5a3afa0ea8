use crate::stats::LatencyStats;
use anyhow::{Result, bail};
use css_core::decoder::DecoderRegistry;
use css_io::{loader, parser};
use rayon::prelude::*;
use std::time::Instant;

pub fn run_benchmark(
    dem_path: &str,
    b8_path: &str,
    obs_path: Option<&str>,
    decoder_name: Option<&str>,
) -> Result<()> {
    println!("Loading model from {}...", dem_path);
    let start_load = Instant::now();
    let dem = parser::load_dem_file(dem_path)?;
    let decoder = DecoderRegistry::with_builtin().select(decoder_name, &dem)?;
    println!(
        "Decoder '{}' built in {:?}. Detectors: {}, Mechanisms: {}",
        decoder.name(),
        start_load.elapsed(),
        dem.num_detectors(),
        dem.mechanisms().len()
    );

    println!("Loading shots from {}...", b8_path);
    let raw_bits = loader::load_b8_file(b8_path)?;
    let shots = loader::slice_shots(&raw_bits, dem.num_detectors())?;
    println!("Loaded {} shots.", shots.num_rows());

    let expected = match obs_path {
        Some(path) => {
            let raw = loader::load_b8_file(path)?;
            let obs = loader::slice_shots(&raw, dem.num_observables())?;
            if obs.num_rows() != shots.num_rows() {
                bail!(
                    "{} observable shots for {} detector shots",
                    obs.num_rows(),
                    shots.num_rows()
                );
            }
            Some(obs)
        }
        None => None,
    };

    println!("Starting benchmark (parallel, rayon)...");
    let start_bench = Instant::now();

    let (stats, solved, failures) = shots
        .rows()
        .par_iter()
        .enumerate()
        .map(|(i, shot)| {
            let t = Instant::now();
            let result = decoder.decode_shot(shot);
            let nanos = t.elapsed().as_nanos() as u64;
            let mut stats = LatencyStats::new();
            stats.update(nanos);
            match result {
                Ok(prediction) => {
                    let wrong = expected
                        .as_ref()
                        .is_some_and(|obs| obs.row(i) != prediction.as_bitslice());
                    (stats, 1usize, wrong as usize)
                }
                Err(_) => (stats, 0, 0),
            }
        })
        .reduce(
            || (LatencyStats::new(), 0, 0),
            |a, b| (a.0.merge(b.0), a.1 + b.1, a.2 + b.2),
        );

    let seconds = start_bench.elapsed().as_secs_f64();
    let throughput = shots.num_rows() as f64 / seconds;

    println!("Results");
    println!("Time: {:.4} s", seconds);
    println!("Throughput: {:.2} shots/s", throughput);
    println!("Solved: {}/{}", solved, shots.num_rows());
    if expected.is_some() {
        println!("Logical failures: {}/{}", failures, solved);
    }
    stats.print_report();

    Ok(())
}
