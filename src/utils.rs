//! Small grid/index helpers shared by the magic-table generators and tests.

/// Combine a 0..7 row (0 = rank 8) and a 0..7 file into a square index.
#[inline(always)]
pub fn square_index(row: usize, file: usize) -> usize {
    row * 8 + file
}

#[inline(always)]
pub fn in_bounds(row: isize, file: isize) -> bool {
    (0..=7).contains(&row) && (0..=7).contains(&file)
}
