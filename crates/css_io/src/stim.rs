//! Stim circuit text.

use css_common::isa::Instruction;
use css_core::circuit::Circuit;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Formats one instruction as a Stim line, e.g. `DETECTOR(1, 2, 0) rec[-1]`.
pub fn format_instruction(instr: &Instruction) -> String {
    let mut line = instr.opcode.name().to_string();
    if !instr.args.is_empty() {
        let args: Vec<String> = instr.args.iter().map(|a| a.to_string()).collect();
        let _ = write!(line, "({})", args.join(", "));
    }
    for t in &instr.targets {
        let _ = write!(line, " {}", t);
    }
    line
}

/// Renders a whole circuit, one instruction per line.
pub fn to_stim_string(circuit: &Circuit) -> String {
    let mut out = String::new();
    for instr in circuit {
        out.push_str(&format_instruction(instr));
        out.push('\n');
    }
    out
}

pub fn write_circuit<W: Write>(circuit: &Circuit, mut w: W) -> Result<()> {
    for instr in circuit {
        writeln!(w, "{}", format_instruction(instr))?;
    }
    w.flush()?;
    Ok(())
}

pub fn save_circuit<P: AsRef<Path>>(circuit: &Circuit, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create circuit file {}", path.display()))?;
    write_circuit(circuit, BufWriter::new(file))
}
