//! Logical operator inference from parity-check matrices.
//!
//! X-logical candidates are the kernel vectors of Hz that are not themselves
//! X stabilizers; Z-logical candidates are the kernel vectors of Hx that are
//! not Z stabilizers. Candidates are paired greedily by anticommutation.

use crate::QecError;
use crate::gf2::{self, BitMatrix, BitRow};
use crate::pauli::{Basis, PauliString};
use log::debug;

/// Inferred logical operators, one X and one Z per logical qubit.
pub type LogicalPairs = (Vec<PauliString>, Vec<PauliString>);

/// Dimension `k = n − rank(Hx) − rank(Hz)` of the code defined by the two
/// check matrices.
pub fn code_dimension(hx: &BitMatrix, hz: &BitMatrix) -> Result<usize, QecError> {
    check_shapes(hx, hz)?;
    Ok(hx.num_cols().saturating_sub(hx.rank() + hz.rank()))
}

/// Infers `k` anticommuting logical pairs for the code `(hx, hz)`.
///
/// Greedy pass: X candidates are visited in kernel discovery order. A
/// candidate is skipped if it depends on the X stabilizers and the X
/// logicals accepted so far; otherwise it is paired with the first unused Z
/// candidate that has odd overlap with it and is independent of the Z
/// stabilizers and accepted Z logicals. If that under-delivers, a fallback
/// pass retries the leftover candidates sorted by weight, without the
/// independence filter. The combined list is then re-checked in order and
/// any pair whose X or Z part depends on the stabilizers and the pairs kept
/// before it is dropped.
///
/// # Returns
///
/// Empty lists if `k == 0`, the `k` pairs on success, or
/// `InferenceExhausted` if fewer than `k` independent pairs remain.
pub fn infer(hx: &BitMatrix, hz: &BitMatrix) -> Result<LogicalPairs, QecError> {
    let k = code_dimension(hx, hz)?;
    if k == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let x_cands = candidates(hz, hx)?;
    let z_cands = candidates(hx, hz)?;
    debug!(
        "inferring {} logical pairs from {} X and {} Z candidates",
        k,
        x_cands.len(),
        z_cands.len()
    );

    let mut x_used = vec![false; x_cands.len()];
    let mut z_used = vec![false; z_cands.len()];
    let mut span_x = hx.row_space();
    let mut span_z = hz.row_space();
    let mut pairs: Vec<(BitRow, BitRow)> = Vec::with_capacity(k);

    for (xi, x) in x_cands.iter().enumerate() {
        if pairs.len() == k {
            break;
        }
        if span_x.in_row_space(x)? {
            continue;
        }
        let mut partner = None;
        for (zi, z) in z_cands.iter().enumerate() {
            if z_used[zi] || !gf2::dot(x, z)? {
                continue;
            }
            if span_z.in_row_space(z)? {
                continue;
            }
            partner = Some(zi);
            break;
        }
        if let Some(zi) = partner {
            x_used[xi] = true;
            z_used[zi] = true;
            span_x.push_row(x.clone())?;
            span_z.push_row(z_cands[zi].clone())?;
            pairs.push((x.clone(), z_cands[zi].clone()));
        }
    }

    if pairs.len() < k {
        debug!(
            "greedy pass found {} of {} pairs, retrying by weight",
            pairs.len(),
            k
        );
        let mut xs: Vec<usize> = (0..x_cands.len()).filter(|&i| !x_used[i]).collect();
        let mut zs: Vec<usize> = (0..z_cands.len()).filter(|&i| !z_used[i]).collect();
        xs.sort_by_key(|&i| gf2::weight(&x_cands[i]));
        zs.sort_by_key(|&i| gf2::weight(&z_cands[i]));

        for xi in xs {
            if pairs.len() == k {
                break;
            }
            let x = &x_cands[xi];
            if pairs.iter().any(|(px, _)| px == x) {
                continue;
            }
            let mut found = None;
            for &zi in &zs {
                let z = &z_cands[zi];
                if !z_used[zi] && gf2::dot(x, z)? && !pairs.iter().any(|(_, pz)| pz == z) {
                    found = Some(zi);
                    break;
                }
            }
            if let Some(zi) = found {
                z_used[zi] = true;
                pairs.push((x.clone(), z_cands[zi].clone()));
            }
        }
        pairs = independent_pairs(hx, hz, pairs)?;
    }

    if pairs.len() < k {
        return Err(QecError::InferenceExhausted {
            expected: k,
            found: pairs.len(),
        });
    }

    Ok(pairs
        .into_iter()
        .map(|(x, z)| {
            (
                PauliString::from_bits(Basis::X, &x),
                PauliString::from_bits(Basis::Z, &z),
            )
        })
        .unzip())
}

/// Finds a partner for each supplied logical of type `basis`.
///
/// Used when only one of the two logical lists is given: each supplied
/// operator, in order, takes the first unused candidate of the dual type with
/// odd overlap that is independent of the dual stabilizers and the partners
/// chosen so far.
pub fn infer_partners(
    hx: &BitMatrix,
    hz: &BitMatrix,
    supplied: &[PauliString],
    basis: Basis,
) -> Result<Vec<PauliString>, QecError> {
    check_shapes(hx, hz)?;
    let n = hx.num_cols();
    let dual = basis.dual();
    let (pool, mut span) = match dual {
        Basis::X => (candidates(hz, hx)?, hx.row_space()),
        Basis::Z => (candidates(hx, hz)?, hz.row_space()),
    };

    let mut used = vec![false; pool.len()];
    let mut partners = Vec::with_capacity(supplied.len());
    for (i, op) in supplied.iter().enumerate() {
        let bits = op.to_bits(basis, n)?;
        let mut chosen = None;
        for (ci, c) in pool.iter().enumerate() {
            if !used[ci] && gf2::dot(&bits, c)? && !span.in_row_space(c)? {
                chosen = Some(ci);
                break;
            }
        }
        let Some(ci) = chosen else {
            return Err(QecError::InferenceExhausted {
                expected: supplied.len(),
                found: i,
            });
        };
        used[ci] = true;
        span.push_row(pool[ci].clone())?;
        partners.push(PauliString::from_bits(dual, &pool[ci]));
    }
    Ok(partners)
}

// Kernel vectors of `commute_with` that are not in the row space of `stabilizers`.
fn candidates(commute_with: &BitMatrix, stabilizers: &BitMatrix) -> Result<Vec<BitRow>, QecError> {
    let span = stabilizers.row_space();
    let mut out = Vec::new();
    for v in commute_with.kernel().rows() {
        if !span.in_row_space(v)? {
            out.push(v.clone());
        }
    }
    Ok(out)
}

// Keeps, in order, the pairs whose X and Z parts are both independent of the
// stabilizers and of the pairs already kept.
fn independent_pairs(
    hx: &BitMatrix,
    hz: &BitMatrix,
    pairs: Vec<(BitRow, BitRow)>,
) -> Result<Vec<(BitRow, BitRow)>, QecError> {
    let mut span_x = hx.row_space();
    let mut span_z = hz.row_space();
    let mut kept = Vec::with_capacity(pairs.len());
    let mut dropped = 0usize;
    for (x, z) in pairs {
        if span_x.in_row_space(&x)? || span_z.in_row_space(&z)? {
            dropped += 1;
            continue;
        }
        span_x.push_row(x.clone())?;
        span_z.push_row(z.clone())?;
        kept.push((x, z));
    }
    if dropped > 0 {
        debug!("dropped {} dependent pairs from the fallback pass", dropped);
    }
    Ok(kept)
}

fn check_shapes(hx: &BitMatrix, hz: &BitMatrix) -> Result<(), QecError> {
    if hx.num_cols() != hz.num_cols() {
        return Err(QecError::ShapeMismatch {
            context: "Hx/Hz column count",
            expected: hx.num_cols(),
            found: hz.num_cols(),
        });
    }
    Ok(())
}
