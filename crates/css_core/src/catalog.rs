//! Named CSS code constructions.
//!
//! One construction per code. Each returns a validated `CssCode`; the
//! constructors only fail on out-of-range size parameters.

use crate::QecError;
use crate::code::{Code, CodeMetadata, Coord, CssCode};
use crate::gf2::BitMatrix;
use crate::pauli::{Pauli, PauliString};

/// Names accepted by [`by_name`], with their size parameter if any.
pub const NAMES: &[&str] = &[
    "repetition:<n>",
    "four_two_two",
    "six_two_two",
    "steane",
    "shor",
    "toric:<l>",
    "rotated_surface:<d>",
];

/// Small instances of every construction.
pub fn all() -> Result<Vec<CssCode>, QecError> {
    Ok(vec![
        repetition(3)?,
        repetition(5)?,
        four_two_two()?,
        six_two_two()?,
        steane()?,
        shor()?,
        toric(3)?,
        rotated_surface(3)?,
    ])
}

/// Looks up a construction by name, e.g. `steane` or `rotated_surface:5`.
///
/// Returns `None` for an unknown name or a missing/unparsable size.
pub fn by_name(name: &str) -> Option<Result<CssCode, QecError>> {
    let (base, size) = match name.split_once(':') {
        Some((b, s)) => (b, Some(s.trim().parse::<usize>().ok()?)),
        None => (name, None),
    };
    let code = match (base.trim().to_ascii_lowercase().as_str(), size) {
        ("repetition" | "rep", Some(n)) => repetition(n),
        ("four_two_two" | "422", None) => four_two_two(),
        ("six_two_two" | "622", None) => six_two_two(),
        ("steane" | "713", None) => steane(),
        ("shor" | "913", None) => shor(),
        ("toric", Some(l)) => toric(l),
        ("rotated_surface" | "surface", Some(d)) => rotated_surface(d),
        _ => return None,
    };
    Some(code)
}

/// Short `[[n,k,d]]` label for listings.
pub fn label(code: &CssCode) -> String {
    match code.distance() {
        Some(d) => format!("[[{},{},{}]]", code.n(), code.k(), d),
        None => format!("[[{},{}]]", code.n(), code.k()),
    }
}

fn require(context: &'static str, value: usize, min: usize) -> Result<(), QecError> {
    if value < min {
        return Err(QecError::ShapeMismatch {
            context,
            expected: min,
            found: value,
        });
    }
    Ok(())
}

/// Bit-flip repetition code on `n` qubits.
///
/// Hz holds the adjacent pairs and Hx a single all-zero row. Logical Z acts
/// on qubit 0, logical X on the whole chain.
pub fn repetition(n: usize) -> Result<CssCode, QecError> {
    require("repetition length", n, 1)?;
    let hx = BitMatrix::zeros(1, n);
    let pairs: Vec<[usize; 2]> = (0..n.saturating_sub(1)).map(|i| [i, i + 1]).collect();
    let hz = BitMatrix::from_supports(n, &pairs)?;
    let meta = CodeMetadata::named(&format!("repetition_{}", n))
        .with_distance(n)
        .with_data_coords((0..n).map(|i| (2.0 * i as f64, 0.0)).collect());
    let meta = CodeMetadata {
        z_stab_coords: Some((0..n.saturating_sub(1)).map(|i| (2.0 * i as f64 + 1.0, 0.0)).collect()),
        ..meta
    };
    CssCode::from_parts(
        hx,
        hz,
        Some(vec![PauliString::from_support(Pauli::X, 0..n)]),
        Some(vec![PauliString::from_support(Pauli::Z, [0])]),
        meta,
    )
}

/// [[4,2,2]] code with stabilizers XXXX and ZZZZ.
pub fn four_two_two() -> Result<CssCode, QecError> {
    let h = BitMatrix::from_dense(4, &[[1u8, 1, 1, 1]])?;
    let lx = vec![PauliString::parse("XXII")?, PauliString::parse("XIXI")?];
    let lz = vec![PauliString::parse("ZIZI")?, PauliString::parse("ZZII")?];
    CssCode::from_parts(
        h.clone(),
        h,
        Some(lx),
        Some(lz),
        CodeMetadata::named("four_two_two").with_distance(2),
    )
}

/// [[6,2,2]] code. Logical operators are inferred.
pub fn six_two_two() -> Result<CssCode, QecError> {
    let hx = BitMatrix::from_dense(6, &[[1u8, 1, 1, 1, 0, 0], [1, 1, 0, 0, 1, 1]])?;
    let hz = BitMatrix::from_dense(6, &[[1u8, 0, 1, 0, 1, 0], [0, 1, 0, 1, 0, 1]])?;
    CssCode::from_parts(
        hx,
        hz,
        None,
        None,
        CodeMetadata::named("six_two_two").with_distance(2),
    )
}

/// [[7,1,3]] Steane code from the [7,4,3] Hamming code.
pub fn steane() -> Result<CssCode, QecError> {
    let rows = [
        [0u8, 0, 0, 1, 1, 1, 1],
        [0, 1, 1, 0, 0, 1, 1],
        [1, 0, 1, 0, 1, 0, 1],
    ];
    let h = BitMatrix::from_dense(7, &rows)?;
    let coords = vec![
        (1.0, 2.0),
        (0.0, 0.0),
        (0.5, 1.0),
        (2.0, 0.0),
        (1.5, 1.0),
        (1.0, 0.0),
        (1.0, 1.0),
    ];
    CssCode::from_parts(
        h.clone(),
        h,
        Some(vec![PauliString::parse("XXXIIII")?]),
        Some(vec![PauliString::parse("ZZZIIII")?]),
        CodeMetadata::named("steane")
            .with_distance(3)
            .with_data_coords(coords),
    )
}

/// [[9,1,3]] Shor code on a 3×3 grid.
///
/// Z checks are adjacent pairs within each row; X checks compare
/// neighbouring rows.
pub fn shor() -> Result<CssCode, QecError> {
    let hz = BitMatrix::from_supports(
        9,
        &[[0usize, 1], [1, 2], [3, 4], [4, 5], [6, 7], [7, 8]],
    )?;
    let hx = BitMatrix::from_supports(9, &[[0usize, 1, 2, 3, 4, 5], [3, 4, 5, 6, 7, 8]])?;
    CssCode::from_parts(
        hx,
        hz,
        Some(vec![PauliString::from_support(Pauli::X, 0..9)]),
        Some(vec![PauliString::from_support(Pauli::Z, 0..9)]),
        CodeMetadata::named("shor")
            .with_distance(3)
            .with_data_coords((0..9).map(|q| ((q % 3) as f64, (q / 3) as f64)).collect()),
    )
}

/// Toric code on an `l × l` periodic lattice, 2 logical qubits.
///
/// Qubits live on edges: `h(r, c) = r·l + c` joins vertex (r, c) to
/// (r, c+1) and `v(r, c) = l² + r·l + c` joins (r, c) to (r+1, c). X checks
/// are vertex stars and Z checks are plaquettes.
pub fn toric(l: usize) -> Result<CssCode, QecError> {
    require("toric lattice size", l, 2)?;
    let n = 2 * l * l;
    let h = |r: usize, c: usize| (r % l) * l + (c % l);
    let v = |r: usize, c: usize| l * l + (r % l) * l + (c % l);

    let mut stars = Vec::with_capacity(l * l);
    let mut plaquettes = Vec::with_capacity(l * l);
    let mut star_coords = Vec::with_capacity(l * l);
    let mut plaq_coords = Vec::with_capacity(l * l);
    for r in 0..l {
        for c in 0..l {
            stars.push([h(r, c), h(r, c + l - 1), v(r, c), v(r + l - 1, c)]);
            plaquettes.push([h(r, c), h(r + 1, c), v(r, c), v(r, c + 1)]);
            star_coords.push((2.0 * c as f64, 2.0 * r as f64));
            plaq_coords.push((2.0 * c as f64 + 1.0, 2.0 * r as f64 + 1.0));
        }
    }
    let hx = BitMatrix::from_supports(n, &stars)?;
    let hz = BitMatrix::from_supports(n, &plaquettes)?;

    let mut data_coords = vec![(0.0, 0.0); n];
    for r in 0..l {
        for c in 0..l {
            data_coords[h(r, c)] = (2.0 * c as f64 + 1.0, 2.0 * r as f64);
            data_coords[v(r, c)] = (2.0 * c as f64, 2.0 * r as f64 + 1.0);
        }
    }

    let lx = vec![
        PauliString::from_support(Pauli::X, (0..l).map(|r| h(r, 0))),
        PauliString::from_support(Pauli::X, (0..l).map(|c| v(0, c))),
    ];
    let lz = vec![
        PauliString::from_support(Pauli::Z, (0..l).map(|c| h(0, c))),
        PauliString::from_support(Pauli::Z, (0..l).map(|r| v(r, 0))),
    ];

    CssCode::from_parts(
        hx,
        hz,
        Some(lx),
        Some(lz),
        CodeMetadata::named(&format!("toric_{}", l))
            .with_distance(l)
            .with_data_coords(data_coords)
            .with_stab_coords(star_coords, plaq_coords),
    )
}

/// Distance-`d` rotated surface code with full geometry.
///
/// Data qubit (r, c) has index `r·d + c` and sits at (2c+1, 2r+1). The
/// plaquette whose top-left data corner is (r, c), for r, c in -1..d, is
/// centred at (2c+2, 2r+2) and is X-type when r + c is even. Bulk plaquettes
/// are all kept; on the top and bottom boundaries only X plaquettes survive,
/// on the left and right only Z plaquettes. Logical Z runs along row 0 and
/// logical X down column 0.
///
/// Schedules are ancilla-minus-data offsets swept in order by the geometric
/// extraction path.
pub fn rotated_surface(d: usize) -> Result<CssCode, QecError> {
    require("surface code distance", d, 2)?;
    let n = d * d;
    let di = d as isize;

    let mut x_checks: Vec<Vec<usize>> = Vec::new();
    let mut z_checks: Vec<Vec<usize>> = Vec::new();
    let mut x_coords: Vec<Coord> = Vec::new();
    let mut z_coords: Vec<Coord> = Vec::new();

    for r in -1..di {
        for c in -1..di {
            let support: Vec<usize> = [(r, c), (r, c + 1), (r + 1, c), (r + 1, c + 1)]
                .into_iter()
                .filter(|&(rr, cc)| (0..di).contains(&rr) && (0..di).contains(&cc))
                .map(|(rr, cc)| (rr * di + cc) as usize)
                .collect();
            let is_x = (r + c).rem_euclid(2) == 0;
            let keep = match support.len() {
                4 => true,
                2 if r == -1 || r == di - 1 => is_x,
                2 => !is_x,
                _ => false,
            };
            if !keep {
                continue;
            }
            let centre = (2.0 * c as f64 + 2.0, 2.0 * r as f64 + 2.0);
            if is_x {
                x_checks.push(support);
                x_coords.push(centre);
            } else {
                z_checks.push(support);
                z_coords.push(centre);
            }
        }
    }

    let hx = BitMatrix::from_supports(n, &x_checks)?;
    let hz = BitMatrix::from_supports(n, &z_checks)?;
    let data_coords = (0..n)
        .map(|q| (2.0 * (q % d) as f64 + 1.0, 2.0 * (q / d) as f64 + 1.0))
        .collect();

    let meta = CodeMetadata::named(&format!("rotated_surface_{}", d))
        .with_distance(d)
        .with_data_coords(data_coords)
        .with_stab_coords(x_coords, z_coords)
        .with_schedules(
            vec![(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)],
            vec![(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)],
        );

    CssCode::from_parts(
        hx,
        hz,
        Some(vec![PauliString::from_support(Pauli::X, (0..d).map(|r| r * d))]),
        Some(vec![PauliString::from_support(Pauli::Z, 0..d)]),
        meta,
    )
}
