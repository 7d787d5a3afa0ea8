use anyhow::{Context, Result, bail};
use bitvec::prelude::*;
use css_core::gf2::{BitMatrix, BitRow};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Loads a Stim .b8 file (binary measurement data).
pub fn load_b8_file<P: AsRef<Path>>(path: P) -> Result<BitVec<u8, Lsb0>> {
    let path = path.as_ref();
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open .b8 file {}", path.display()))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    // Stim packs each byte least significant bit first.
    Ok(BitVec::<u8, Lsb0>::from_vec(buffer))
}

/// Cuts raw .b8 bits into one row per shot.
///
/// Trailing bytes that do not form a whole shot are rejected.
pub fn slice_shots(raw_bits: &BitSlice<u8, Lsb0>, bits_per_shot: usize) -> Result<BitMatrix> {
    if bits_per_shot == 0 {
        return Ok(BitMatrix::empty(0));
    }
    let stride_bits = bits_per_shot.div_ceil(8) * 8;
    if raw_bits.len() % stride_bits != 0 {
        bail!(
            "{} bits is not a whole number of {}-bit shots",
            raw_bits.len(),
            bits_per_shot
        );
    }

    let rows: Vec<BitRow> = raw_bits
        .chunks(stride_bits)
        .map(|chunk| chunk[..bits_per_shot].iter().by_vals().collect())
        .collect();
    Ok(BitMatrix::from_rows(bits_per_shot, rows)?)
}

/// Packs shots into .b8 bytes, padding each shot to a byte boundary.
pub fn to_b8_bytes(shots: &BitMatrix) -> Vec<u8> {
    let bytes_per_shot = shots.num_cols().div_ceil(8);
    let mut buffer = Vec::with_capacity(bytes_per_shot * shots.num_rows());
    for row in shots.rows() {
        let mut packed = bitvec![u8, Lsb0; 0; bytes_per_shot * 8];
        packed[..row.len()].clone_from_bitslice(row);
        buffer.extend_from_slice(packed.as_raw_slice());
    }
    buffer
}

pub fn write_b8<P: AsRef<Path>>(path: P, shots: &BitMatrix) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create .b8 file {}", path.display()))?;
    file.write_all(&to_b8_bytes(shots))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shots_start_on_byte_boundaries() {
        // Two 3-bit shots: 101 and 011.
        let raw = BitVec::<u8, Lsb0>::from_vec(vec![0b0000_0101, 0b0000_0110]);
        let shots = slice_shots(&raw, 3).unwrap();
        assert_eq!(shots.num_rows(), 2);
        assert_eq!(shots.to_string(), "[101, 011]");
    }

    #[test]
    fn packs_lsb_first() {
        let shots = BitMatrix::from_dense(10, &[[1u8, 0, 0, 0, 0, 0, 0, 0, 0, 1]]).unwrap();
        assert_eq!(to_b8_bytes(&shots), vec![0b0000_0001, 0b0000_0010]);
    }

    #[test]
    fn rejects_partial_shots() {
        let raw = BitVec::<u8, Lsb0>::from_vec(vec![0, 0, 0]);
        assert!(slice_shots(&raw, 9).is_err());
    }
}
