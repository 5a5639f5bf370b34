//! Builds the magic bitboard lookup tables used by rook/bishop/queen
//! attack generation. Tables are derived once, at process start, rather
//! than loaded from disk.

use super::attacks::{
    bishop_attacks_per_square, bishop_relevance_mask, rook_attacks_per_square, rook_relevance_mask,
};
use super::search::find_magic_number_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use crate::square::NUM_SQUARES;
use rand::{SeedableRng, rngs::StdRng};

/// Where the magic-number search gets its randomness from. Search is
/// deterministic end to end, so a fixed seed always reproduces the same
/// tables.
#[derive(Debug, Clone, Copy)]
pub enum MagicTableSeed {
    Fixed(u64),
}

/// Enumerate every subset of `mask` via the standard "subtract and mask"
/// trick, yielding all 2^popcount(mask) occupancy patterns.
fn subsets_of(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset: u64 = 0;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

fn build_entry(
    square: usize,
    mask: u64,
    attacks_fn: impl Fn(usize, u64) -> u64,
    rng: &mut StdRng,
) -> MagicEntry {
    let shift = 64 - mask.count_ones();
    let blockers = subsets_of(mask);
    let attacks: Vec<u64> = blockers.iter().map(|&b| attacks_fn(square, b)).collect();

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)
        .unwrap_or_else(|e| panic!("no magic number found for square {square}: {e}"));

    let mut table = vec![0u64; 1usize << mask.count_ones()];
    for (&b, &a) in blockers.iter().zip(attacks.iter()) {
        let index = ((b.wrapping_mul(magic)) >> shift) as usize;
        table[index] = a;
    }

    MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    }
}

pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let MagicTableSeed::Fixed(seed) = seed;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut rook_entries = Vec::with_capacity(NUM_SQUARES);
    let mut bishop_entries = Vec::with_capacity(NUM_SQUARES);

    for square in 0..NUM_SQUARES {
        let rook_mask = rook_relevance_mask(square);
        rook_entries.push(build_entry(
            square,
            rook_mask,
            rook_attacks_per_square,
            &mut rng,
        ));

        let bishop_mask = bishop_relevance_mask(square);
        bishop_entries.push(build_entry(
            square,
            bishop_mask,
            bishop_attacks_per_square,
            &mut rng,
        ));
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = generate_magic_tables(MagicTableSeed::Fixed(7)).unwrap();
        let b = generate_magic_tables(MagicTableSeed::Fixed(7)).unwrap();
        for sq in 0..NUM_SQUARES {
            assert_eq!(a.rook.entries[sq].magic, b.rook.entries[sq].magic);
            assert_eq!(a.bishop.entries[sq].magic, b.bishop.entries[sq].magic);
        }
    }

    #[test]
    fn rook_table_matches_scan_for_every_subset() {
        let tables = generate_magic_tables(MagicTableSeed::Fixed(1)).unwrap();
        let square = 0usize;
        let mask = rook_relevance_mask(square);
        for blockers in subsets_of(mask) {
            let expected = rook_attacks_per_square(square, blockers);
            assert_eq!(tables.rook.get_attacks(square, blockers), expected);
        }
    }
}
