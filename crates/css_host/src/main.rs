mod generator;
mod stats;
mod throughput;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use css_core::catalog;
use css_core::code::{Code, CssCode};
use css_core::decoder::DecoderRegistry;
use css_core::dem::DetectorErrorModel;
use css_core::experiment::MemoryRun;
use css_core::memory::MemoryExperiment;
use css_core::noise::NoiseModel;
use css_core::pauli::Basis;
use css_io::{parser, stim};

#[derive(Parser)]
#[command(about = "CSS code memory experiments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BasisArg {
    X,
    Z,
}

impl From<BasisArg> for Basis {
    fn from(b: BasisArg) -> Self {
        match b {
            BasisArg::X => Basis::X,
            BasisArg::Z => Basis::Z,
        }
    }
}

#[derive(clap::Args)]
struct ExperimentArgs {
    /// Catalog name, e.g. `steane` or `rotated_surface:5`.
    #[arg(short, long, default_value = "rotated_surface:3")]
    code: String,
    #[arg(short, long, default_value_t = 3)]
    rounds: usize,
    #[arg(long, value_enum, default_value_t = BasisArg::Z)]
    basis: BasisArg,
    /// Uniform noise strength; 0 emits the noiseless circuit.
    #[arg(short, long, default_value_t = 0.0)]
    p: f64,
}

impl ExperimentArgs {
    fn load_code(&self) -> Result<CssCode> {
        let code = catalog::by_name(&self.code).ok_or_else(|| {
            anyhow!(
                "unknown code '{}'; known: {}",
                self.code,
                catalog::NAMES.join(", ")
            )
        })??;
        Ok(code)
    }

    fn noisy_circuit(&self, code: &CssCode) -> Result<css_core::circuit::Circuit> {
        let circuit = MemoryExperiment::new(code, self.rounds, self.basis.into()).build()?;
        let data: Vec<u32> = (0..code.n() as u32).collect();
        Ok(NoiseModel::uniform(self.p).apply(&circuit, &data)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the code catalog.
    Codes,
    /// Print the memory-experiment circuit in Stim syntax.
    Circuit {
        #[command(flatten)]
        exp: ExperimentArgs,
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Print the detector error model of the noisy circuit.
    Dem {
        #[command(flatten)]
        exp: ExperimentArgs,
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Simulate, decode and report the logical error rate.
    Run {
        #[command(flatten)]
        exp: ExperimentArgs,
        #[arg(long, default_value_t = 10_000)]
        shots: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(short, long)]
        decoder: Option<String>,
        /// Sample with the tableau simulator instead of the error model.
        #[arg(long)]
        exact: bool,
    },
    /// Write a .dem file and sampled .b8 detector/observable files.
    Gen {
        #[command(flatten)]
        exp: ExperimentArgs,
        #[arg(long, default_value = "bench.dem")]
        dem: String,
        #[arg(long, default_value = "bench.b8")]
        b8: String,
        #[arg(long)]
        obs: Option<String>,
        #[arg(long, default_value_t = 100_000)]
        shots: usize,
        #[arg(long, default_value_t = 12345)]
        seed: u64,
    },
    /// Decode a .dem + .b8 pair and report throughput.
    Bench {
        #[arg(long)]
        dem: String,
        #[arg(long)]
        b8: String,
        #[arg(long)]
        obs: Option<String>,
        #[arg(short, long)]
        decoder: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Codes => {
            for code in catalog::all()? {
                println!(
                    "{:<20} {}",
                    code.name().unwrap_or("unnamed"),
                    catalog::label(&code)
                );
            }
            println!("\nNames: {}", catalog::NAMES.join(", "));
        }
        Commands::Circuit { exp, out } => {
            let code = exp.load_code()?;
            let circuit = exp.noisy_circuit(&code)?;
            match out {
                Some(path) => stim::save_circuit(&circuit, &path)?,
                None => print!("{}", stim::to_stim_string(&circuit)),
            }
        }
        Commands::Dem { exp, out } => {
            let code = exp.load_code()?;
            let dem = DetectorErrorModel::from_circuit(&exp.noisy_circuit(&code)?)?;
            match out {
                Some(path) => parser::save_dem_file(&dem, &path)?,
                None => print!("{}", parser::write_dem(&dem)),
            }
        }
        Commands::Run {
            exp,
            shots,
            seed,
            decoder,
            exact,
        } => {
            let code = exp.load_code()?;
            let run = MemoryRun {
                rounds: exp.rounds,
                basis: exp.basis.into(),
                noise: NoiseModel::uniform(exp.p),
                shots,
                seed,
                decoder,
                exact,
            };
            let outcome = run
                .run(&code, &DecoderRegistry::with_builtin())
                .with_context(|| format!("memory run on {} failed", exp.code))?;
            println!("Code: {} {}", exp.code, catalog::label(&code));
            println!(
                "Detectors: {}, Observables: {}, Error mechanisms: {}",
                outcome.num_detectors, outcome.num_observables, outcome.num_error_mechanisms
            );
            println!("Decoder: {}", outcome.decoder);
            println!(
                "Logical failures: {}/{} ({:.3e})",
                outcome.logical_failures,
                outcome.shots,
                outcome.logical_error_rate()
            );
        }
        Commands::Gen {
            exp,
            dem,
            b8,
            obs,
            shots,
            seed,
        } => {
            let code = exp.load_code()?;
            let circuit = exp.noisy_circuit(&code)?;
            generator::generate_memory_data(&circuit, &dem, &b8, obs.as_deref(), shots, seed)?;
        }
        Commands::Bench {
            dem,
            b8,
            obs,
            decoder,
        } => {
            throughput::run_benchmark(&dem, &b8, obs.as_deref(), decoder.as_deref())?;
        }
    }
    Ok(())
}
