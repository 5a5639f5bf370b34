//! Slow, obviously-correct ray scanners used both to build the magic
//! tables and, in tests, as the ground truth they are checked against.

use crate::utils::square_index;

#[inline]
fn scan_ray<F>(mut row: isize, mut file: isize, step: F, mut on_square: impl FnMut(usize) -> bool)
where
    F: Fn(isize, isize) -> (isize, isize),
{
    while (0..=7).contains(&row) && (0..=7).contains(&file) {
        let sq = square_index(row as usize, file as usize);
        if !on_square(sq) {
            break;
        }
        let (nr, nf) = step(row, file);
        row = nr;
        file = nf;
    }
}

#[inline]
pub fn rook_attacks_per_square(square: usize, blockers: u64) -> u64 {
    let row = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut attacks = 0u64;

    let mut add = |sq: usize| {
        attacks |= 1u64 << sq;
        (blockers >> sq) & 1 == 0
    };

    scan_ray(row - 1, file, |r, f| (r - 1, f), &mut add); // north (toward rank 8)
    scan_ray(row + 1, file, |r, f| (r + 1, f), &mut add); // south
    scan_ray(row, file + 1, |r, f| (r, f + 1), &mut add); // east
    scan_ray(row, file - 1, |r, f| (r, f - 1), &mut add); // west

    attacks
}

#[inline]
pub fn bishop_attacks_per_square(square: usize, blockers: u64) -> u64 {
    let row = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut attacks = 0u64;

    let mut add = |sq: usize| {
        attacks |= 1u64 << sq;
        (blockers >> sq) & 1 == 0
    };

    scan_ray(row - 1, file + 1, |r, f| (r - 1, f + 1), &mut add); // NE
    scan_ray(row - 1, file - 1, |r, f| (r - 1, f - 1), &mut add); // NW
    scan_ray(row + 1, file + 1, |r, f| (r + 1, f + 1), &mut add); // SE
    scan_ray(row + 1, file - 1, |r, f| (r + 1, f - 1), &mut add); // SW

    attacks
}

/// Relevant-occupancy mask: same rays, but excluding the outermost square
/// on each ray (whether it is occupied or not can never change the attack
/// set actually returned, so it must not be part of the magic index key).
#[inline]
fn edge_excluded_ray(row: isize, file: isize, drow: isize, dfile: isize) -> u64 {
    let mut bb = 0u64;
    let mut r = row + drow;
    let mut f = file + dfile;
    while (0..=7).contains(&(r + drow)) && (0..=7).contains(&(f + dfile)) {
        bb |= 1u64 << square_index(r as usize, f as usize);
        r += drow;
        f += dfile;
    }
    bb
}

pub fn rook_relevance_mask(square: usize) -> u64 {
    let row = (square / 8) as isize;
    let file = (square % 8) as isize;
    edge_excluded_ray(row, file, -1, 0)
        | edge_excluded_ray(row, file, 1, 0)
        | edge_excluded_ray(row, file, 0, 1)
        | edge_excluded_ray(row, file, 0, -1)
}

pub fn bishop_relevance_mask(square: usize) -> u64 {
    let row = (square / 8) as isize;
    let file = (square % 8) as isize;
    edge_excluded_ray(row, file, -1, 1)
        | edge_excluded_ray(row, file, -1, -1)
        | edge_excluded_ray(row, file, 1, 1)
        | edge_excluded_ray(row, file, 1, -1)
}
