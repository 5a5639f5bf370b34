pub mod attacks;
pub mod precompute;
pub mod search;
pub mod structs;

pub use structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};

use once_cell::sync::OnceCell;
use precompute::MagicTableSeed;

/// Fixed seed so magic-table generation (and therefore every derived
/// index) is reproducible across runs.
const MAGIC_SEED: u64 = 0xC0FF_EE15_5EED_0001;

static TABLES: OnceCell<MagicTables> = OnceCell::new();

/// Builds (once, lazily) and returns the rook/bishop magic tables.
pub fn load_magic_tables() -> MagicTables {
    TABLES
        .get_or_init(|| {
            precompute::generate_magic_tables(MagicTableSeed::Fixed(MAGIC_SEED))
                .expect("magic table generation must always succeed for a fixed seed")
        })
        .clone_shared()
}

impl MagicTables {
    /// Cheap "clone" that shares the underlying tables via a leaked
    /// reference would be wasteful; instead callers receiving this are
    /// expected to hold a `&'static` via [`magic_tables`]. Kept for API
    /// symmetry with callers that still want an owned value.
    fn clone_shared(&self) -> MagicTables {
        MagicTables {
            rook: RookMagicTables {
                entries: self.rook.entries.clone(),
            },
            bishop: BishopMagicTables {
                entries: self.bishop.entries.clone(),
            },
        }
    }
}

impl Clone for MagicEntry {
    fn clone(&self) -> Self {
        MagicEntry {
            magic: self.magic,
            shift: self.shift,
            mask: self.mask,
            table: self.table.clone(),
        }
    }
}

/// Re-export of the lazy table loader under the name search/eval callers expect.
pub mod loader {
    pub use super::load_magic_tables;
}

/// Knight attacks from `idx`, delegating to the compile-time leaper table.
/// Kept alongside the magic-table API since callers that already hold a
/// square index (rather than a [`crate::square::Square`]) reach for this
/// module for every other piece's attacks too.
pub fn get_knight_attacks(idx: usize) -> u64 {
    crate::moves::knight::KNIGHT_ATTACKS[idx]
}

/// Returns a process-wide `'static` reference to the magic tables,
/// avoiding the clone in [`load_magic_tables`] for hot callers (search).
pub fn magic_tables() -> &'static MagicTables {
    TABLES.get_or_init(|| {
        precompute::generate_magic_tables(MagicTableSeed::Fixed(MAGIC_SEED))
            .expect("magic table generation must always succeed for a fixed seed")
    })
}

/// Squares strictly between `a` and `b` on the same rank, file, or
/// diagonal; empty if they are not aligned. Used by check-evasion and
/// pin detection.
pub fn between(a: crate::square::Square, b: crate::square::Square) -> u64 {
    let tables = magic_tables();
    let (ai, bi) = (a.index() as usize, b.index() as usize);
    if ai == bi {
        return 0;
    }
    let occ_b = 1u64 << bi;
    let rook_from_a = tables.rook.get_attacks(ai, occ_b);
    if rook_from_a & occ_b != 0 {
        let occ_a = 1u64 << ai;
        let rook_from_b = tables.rook.get_attacks(bi, occ_a);
        return rook_from_a & rook_from_b;
    }
    let bishop_from_a = tables.bishop.get_attacks(ai, occ_b);
    if bishop_from_a & occ_b != 0 {
        let occ_a = 1u64 << ai;
        let bishop_from_b = tables.bishop.get_attacks(bi, occ_a);
        return bishop_from_a & bishop_from_b;
    }
    0
}
