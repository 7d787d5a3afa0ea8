//! Parser for detector error model description files.
//!
//! Reads and writes the line-oriented Stim .dem text format:
//!
//! ```text
//! # comment
//! error(0.001) D0 D1 L0
//! error(0.002) D0 ^ D2 D3
//! detector(1, 2, 0) D0
//! logical_observable L0
//! ```
//!
//! Detector and observable counts are one past the largest index mentioned
//! anywhere in the file. A `^` splits an error into components; the error
//! itself flips the XOR of its components.

use anyhow::{Context, Result, anyhow, bail};
use css_core::dem::{Component, DetectorErrorModel, ErrorMechanism};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, space0, space1},
    combinator::{all_consuming, map, map_res, opt},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded},
};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DemTarget {
    Detector(usize),
    Observable(usize),
    Separator,
}

#[derive(Debug, Clone, PartialEq)]
enum DemLine {
    Error(Vec<f64>, Vec<DemTarget>),
    Detector(Vec<f64>, Vec<DemTarget>),
    Observable(Vec<DemTarget>),
}

fn index(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse)(input)
}

fn target(input: &str) -> IResult<&str, DemTarget> {
    alt((
        map(preceded(char('D'), index), DemTarget::Detector),
        map(preceded(char('L'), index), DemTarget::Observable),
        map(char('^'), |_| DemTarget::Separator),
    ))(input)
}

fn targets(input: &str) -> IResult<&str, Vec<DemTarget>> {
    many0(preceded(space1, target))(input)
}

fn args(input: &str) -> IResult<&str, Vec<f64>> {
    delimited(
        pair(char('('), space0),
        separated_list0(delimited(space0, char(','), space0), double),
        pair(space0, char(')')),
    )(input)
}

fn line(input: &str) -> IResult<&str, DemLine> {
    alt((
        map(preceded(tag("error"), pair(args, targets)), |(a, t)| {
            DemLine::Error(a, t)
        }),
        map(
            preceded(tag("detector"), pair(opt(args), targets)),
            |(a, t)| DemLine::Detector(a.unwrap_or_default(), t),
        ),
        map(preceded(tag("logical_observable"), targets), DemLine::Observable),
    ))(input)
}

/// Parses .dem text into a detector error model.
pub fn parse_dem(text: &str) -> Result<DetectorErrorModel> {
    let mut parsed = Vec::new();
    let mut num_detectors = 0;
    let mut num_observables = 0;

    for (lineno, raw) in text.lines().enumerate() {
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let (_, l) = all_consuming(line)(content)
            .map_err(|e| anyhow!("line {}: cannot parse '{}': {}", lineno + 1, content, e))?;

        let ts = match &l {
            DemLine::Error(a, ts) => {
                if a.len() != 1 {
                    bail!("line {}: error takes exactly one probability", lineno + 1);
                }
                ts
            }
            DemLine::Detector(_, ts) | DemLine::Observable(ts) => ts,
        };
        for t in ts {
            match *t {
                DemTarget::Detector(d) => num_detectors = num_detectors.max(d + 1),
                DemTarget::Observable(o) => num_observables = num_observables.max(o + 1),
                DemTarget::Separator => {}
            }
        }
        parsed.push((lineno + 1, l));
    }

    let mut dem = DetectorErrorModel::new(num_detectors, num_observables);
    let mut coords: Vec<Vec<f64>> = vec![Vec::new(); num_detectors];
    let mut any_coords = false;

    for (lineno, l) in parsed {
        match l {
            DemLine::Error(a, ts) => {
                let mut components = vec![Component::default()];
                for t in ts {
                    let last = components.len() - 1;
                    match t {
                        DemTarget::Detector(d) => toggle(&mut components[last].detectors, d),
                        DemTarget::Observable(o) => toggle(&mut components[last].observables, o),
                        DemTarget::Separator => components.push(Component::default()),
                    }
                }
                let mut mechanism = ErrorMechanism::new(a[0], Vec::new(), Vec::new());
                for c in &components {
                    c.detectors.iter().for_each(|&d| toggle(&mut mechanism.detectors, d));
                    c.observables.iter().for_each(|&o| toggle(&mut mechanism.observables, o));
                }
                if components.len() > 1 {
                    mechanism.components = components;
                }
                dem.push(mechanism).with_context(|| format!("line {}", lineno))?;
            }
            DemLine::Detector(a, ts) => {
                for t in ts {
                    match t {
                        DemTarget::Detector(d) => {
                            any_coords |= !a.is_empty();
                            coords[d] = a.clone();
                        }
                        DemTarget::Observable(_) | DemTarget::Separator => {
                            bail!("line {}: detector line names a non-detector", lineno)
                        }
                    }
                }
            }
            DemLine::Observable(ts) => {
                if ts.iter().any(|t| !matches!(t, DemTarget::Observable(_))) {
                    bail!("line {}: logical_observable line names a non-observable", lineno);
                }
            }
        }
    }

    if any_coords {
        dem.set_detector_coords(coords)?;
    }
    Ok(dem)
}

// Adds an index to a sorted set, or removes it if present.
fn toggle(set: &mut Vec<usize>, x: usize) {
    match set.binary_search(&x) {
        Ok(i) => {
            set.remove(i);
        }
        Err(i) => set.insert(i, x),
    }
}

/// Loads a Stim .dem file.
pub fn load_dem_file<P: AsRef<Path>>(path: P) -> Result<DetectorErrorModel> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to open .dem file {}", path.display()))?;
    parse_dem(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Renders a detector error model as .dem text.
///
/// Every detector and observable is declared explicitly so that counts
/// survive a round trip even when no mechanism references them.
pub fn write_dem(dem: &DetectorErrorModel) -> String {
    let mut out = String::new();
    for m in dem.mechanisms() {
        let _ = write!(out, "error({})", m.probability);
        for (i, c) in m.pieces().iter().enumerate() {
            if i > 0 {
                out.push_str(" ^");
            }
            for d in &c.detectors {
                let _ = write!(out, " D{}", d);
            }
            for o in &c.observables {
                let _ = write!(out, " L{}", o);
            }
        }
        out.push('\n');
    }
    let coords = dem.detector_coords();
    for d in 0..dem.num_detectors() {
        match coords.get(d).filter(|c| !c.is_empty()) {
            Some(c) => {
                let c: Vec<String> = c.iter().map(|x| x.to_string()).collect();
                let _ = writeln!(out, "detector({}) D{}", c.join(", "), d);
            }
            None => {
                let _ = writeln!(out, "detector D{}", d);
            }
        }
    }
    for o in 0..dem.num_observables() {
        let _ = writeln!(out, "logical_observable L{}", o);
    }
    out
}

pub fn save_dem_file<P: AsRef<Path>>(dem: &DetectorErrorModel, path: P) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, write_dem(dem))
        .with_context(|| format!("Failed to write .dem file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets_and_args() {
        assert_eq!(
            line("error(0.25) D0 D3 L1"),
            Ok((
                "",
                DemLine::Error(
                    vec![0.25],
                    vec![
                        DemTarget::Detector(0),
                        DemTarget::Detector(3),
                        DemTarget::Observable(1)
                    ]
                )
            ))
        );
        assert_eq!(args("(1, 2.5,0)"), Ok(("", vec![1.0, 2.5, 0.0])));
    }

    #[test]
    fn counts_come_from_largest_index() {
        let dem = parse_dem("error(0.1) D4\n# note\n\nlogical_observable L2\n").unwrap();
        assert_eq!(dem.num_detectors(), 5);
        assert_eq!(dem.num_observables(), 3);
        assert_eq!(dem.mechanisms().len(), 1);
    }

    #[test]
    fn separators_split_components() {
        let dem = parse_dem("error(0.01) D0 L0 ^ D0 D2\n").unwrap();
        let m = &dem.mechanisms()[0];
        assert_eq!(m.detectors, vec![2]);
        assert_eq!(m.observables, vec![0]);
        assert_eq!(m.components.len(), 2);
        assert_eq!(m.components[0].detectors, vec![0]);
        assert_eq!(m.components[1].detectors, vec![0, 2]);
        assert_eq!(write_dem(&dem).lines().next(), Some("error(0.01) D0 L0 ^ D0 D2"));
        assert!(parse_dem("detector D0 ^ D1").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_dem("error(0.1) Q3").is_err());
        assert!(parse_dem("error(0.1, 0.2) D0").is_err());
        assert!(parse_dem("error(1.5) D0").is_err());
    }
}
