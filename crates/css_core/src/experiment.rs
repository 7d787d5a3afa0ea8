//! End-to-end memory experiment runner.

use crate::QecError;
use crate::code::{Code, CssCode};
use crate::decoder::{DecoderRegistry, count_mismatches};
use crate::dem::DetectorErrorModel;
use crate::memory::MemoryExperiment;
use crate::noise::NoiseModel;
use crate::pauli::Basis;
use crate::tableau;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Parameters of one memory run.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRun {
    pub rounds: usize,
    pub basis: Basis,
    pub noise: NoiseModel,
    pub shots: usize,
    pub seed: u64,
    /// Backend name; `None` selects the registry default.
    pub decoder: Option<String>,
    /// Sample with the tableau simulator instead of the detector error model.
    pub exact: bool,
}

impl Default for MemoryRun {
    fn default() -> Self {
        Self {
            rounds: 3,
            basis: Basis::Z,
            noise: NoiseModel::uniform(0.001),
            shots: 1000,
            seed: 0,
            decoder: None,
            exact: false,
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub shots: usize,
    pub logical_failures: usize,
    pub num_detectors: usize,
    pub num_observables: usize,
    pub num_error_mechanisms: usize,
    /// Name of the backend that actually decoded.
    pub decoder: String,
}

impl RunOutcome {
    /// Fraction of shots with at least one wrongly predicted observable.
    pub fn logical_error_rate(&self) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        self.logical_failures as f64 / self.shots as f64
    }
}

impl MemoryRun {
    /// Builds, samples, decodes and scores the experiment.
    ///
    /// A shot fails when the predicted observable flips differ from the
    /// sampled ones in any position.
    pub fn run(&self, code: &CssCode, registry: &DecoderRegistry) -> Result<RunOutcome, QecError> {
        let circuit = MemoryExperiment::new(code, self.rounds, self.basis).build()?;
        let data: Vec<u32> = (0..code.n() as u32).collect();
        let noisy = self.noise.apply(&circuit, &data)?;
        let dem = DetectorErrorModel::from_circuit(&noisy)?;
        let decoder = registry.select(self.decoder.as_deref(), &dem)?;

        let batch = if self.exact {
            tableau::sample_batch(&noisy, self.shots, self.seed)?
        } else {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            dem.sample(self.shots, &mut rng)
        };
        let predicted = decoder.decode_batch(&batch.detectors)?;
        let logical_failures = count_mismatches(&predicted, &batch.observables)?;

        info!(
            "{} shots, {} logical failures ({} decoder)",
            self.shots,
            logical_failures,
            decoder.name()
        );
        Ok(RunOutcome {
            shots: self.shots,
            logical_failures,
            num_detectors: dem.num_detectors(),
            num_observables: dem.num_observables(),
            num_error_mechanisms: dem.mechanisms().len(),
            decoder: decoder.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn noiseless_run_never_fails() {
        let code = catalog::repetition(3).unwrap();
        let run = MemoryRun {
            noise: NoiseModel::default(),
            shots: 50,
            ..MemoryRun::default()
        };
        let out = run.run(&code, &DecoderRegistry::with_builtin()).unwrap();
        assert_eq!(out.logical_failures, 0);
        assert_eq!(out.num_error_mechanisms, 0);
        assert_eq!(out.num_observables, 1);
        assert_eq!(out.decoder, "matching");
    }

    #[test]
    fn low_noise_repetition_mostly_succeeds() {
        let code = catalog::repetition(5).unwrap();
        let run = MemoryRun {
            noise: NoiseModel::phenomenological(0.01),
            shots: 400,
            seed: 3,
            decoder: Some("uf".into()),
            ..MemoryRun::default()
        };
        let out = run.run(&code, &DecoderRegistry::with_builtin()).unwrap();
        assert_eq!(out.decoder, "union_find");
        assert!(out.logical_error_rate() < 0.05);
    }
}
