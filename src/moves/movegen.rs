use crate::bitboard::{BitboardExt, shift, NORTH, NORTH2, SOUTH, SOUTH2};
use crate::board::{Board, Color, Piece};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::MagicTables;
use crate::moves::magic::structs::{BishopMagicTables, RookMagicTables};
use crate::moves::pawn::{BLACK_PAWN_ATTACKS, WHITE_PAWN_ATTACKS};
use crate::moves::square_control::is_legal_castling;
use crate::moves::types::{
    CAPTURE, DOUBLE_PAWN_PUSH, EN_PASSANT, KINGSIDE_CASTLE, Move, MoveBuffer, PROMOTION,
    PROMOTION_CAPTURE, QUEENSIDE_CASTLE, QUIET_MOVE,
};
use crate::square::Square;

/// Generation scope, matching UCI-driven callers that only need a subset
/// of the board's pseudo-legal moves (e.g. quiescence only wants captures).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenType {
    All,
    Captures,
    Quiets,
}

// Rank masks under the A8=0 indexing: row 0 = rank 8 .. row 7 = rank 1.
const RANK1: u64 = 0xFF00_0000_0000_0000;
const RANK2: u64 = 0x00FF_0000_0000_0000;
const RANK7: u64 = 0x0000_0000_0000_FF00;
const RANK8: u64 = 0x0000_0000_0000_00FF;

// White's back rank (rank 1) occupies row 7 (bits 56-63) under A8=0;
// black's back rank (rank 8) is row 0 (bits 0-7).
const WHITE_KINGSIDE_BETWEEN: u64 = 0x6000_0000_0000_0000; // f1, g1
const WHITE_QUEENSIDE_BETWEEN: u64 = 0x0E00_0000_0000_0000; // b1, c1, d1
const BLACK_KINGSIDE_BETWEEN: u64 = 0x0000_0000_0000_0060; // f8, g8
const BLACK_QUEENSIDE_BETWEEN: u64 = 0x0000_0000_0000_000E; // b8, c8, d8

// Promotion piece emission order: queen first, then the underpromotions.
const PROMOS: [Piece; 4] = [Piece::Queen, Piece::Knight, Piece::Bishop, Piece::Rook];

#[inline(always)]
fn pawn_attack_table(color: Color) -> &'static [u64; 64] {
    match color {
        Color::White => &WHITE_PAWN_ATTACKS,
        Color::Black => &BLACK_PAWN_ATTACKS,
    }
}

#[inline(always)]
fn push_moves(
    from: u8,
    mut targets: u64,
    enemy: u64,
    move_piece: Piece,
    move_list: &mut impl MoveBuffer,
) {
    while targets != 0 {
        let to = targets.pop_lsb();
        let is_cap = (enemy >> to) & 1 != 0;
        move_list.push(Move {
            from: Square::from_index(from),
            to: Square::from_index(to),
            piece: move_piece,
            promotion: None,
            flags: if is_cap { CAPTURE } else { QUIET_MOVE },
        });
    }
}

#[inline(always)]
fn kingside_between(color: Color) -> u64 {
    match color {
        Color::White => WHITE_KINGSIDE_BETWEEN,
        Color::Black => BLACK_KINGSIDE_BETWEEN,
    }
}

#[inline(always)]
fn queenside_between(color: Color) -> u64 {
    match color {
        Color::White => WHITE_QUEENSIDE_BETWEEN,
        Color::Black => BLACK_QUEENSIDE_BETWEEN,
    }
}

fn generate_knight(board: &Board, gen: GenType, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let empty = !board.occupied();

    let mut bb = board.pieces(Piece::Knight, color);
    while bb != 0 {
        let from = bb.pop_lsb();
        let reachable = KNIGHT_ATTACKS[from as usize] & !friendly & !enemy_king;
        let targets = match gen {
            GenType::All => reachable,
            GenType::Captures => reachable & enemy,
            GenType::Quiets => reachable & empty,
        };
        push_moves(from, targets, enemy, Piece::Knight, move_list);
    }
}

fn generate_bishop(
    board: &Board,
    tables: &BishopMagicTables,
    gen: GenType,
    move_list: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let blockers = board.occupied();
    let empty = !blockers;

    let mut bb = board.pieces(Piece::Bishop, color);
    while bb != 0 {
        let from = bb.pop_lsb();
        let reachable = tables.get_attacks(from as usize, blockers) & !friendly & !enemy_king;
        let targets = match gen {
            GenType::All => reachable,
            GenType::Captures => reachable & enemy,
            GenType::Quiets => reachable & empty,
        };
        push_moves(from, targets, enemy, Piece::Bishop, move_list);
    }
}

fn generate_rook(
    board: &Board,
    tables: &RookMagicTables,
    gen: GenType,
    move_list: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let blockers = board.occupied();
    let empty = !blockers;

    let mut bb = board.pieces(Piece::Rook, color);
    while bb != 0 {
        let from = bb.pop_lsb();
        let reachable = tables.get_attacks(from as usize, blockers) & !friendly & !enemy_king;
        let targets = match gen {
            GenType::All => reachable,
            GenType::Captures => reachable & enemy,
            GenType::Quiets => reachable & empty,
        };
        push_moves(from, targets, enemy, Piece::Rook, move_list);
    }
}

fn generate_queen(board: &Board, tables: &MagicTables, gen: GenType, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let blockers = board.occupied();
    let empty = !blockers;

    let mut bb = board.pieces(Piece::Queen, color);
    while bb != 0 {
        let from = bb.pop_lsb();
        let reachable = tables.queen_attacks(from as usize, blockers) & !friendly & !enemy_king;
        let targets = match gen {
            GenType::All => reachable,
            GenType::Captures => reachable & enemy,
            GenType::Quiets => reachable & empty,
        };
        push_moves(from, targets, enemy, Piece::Queen, move_list);
    }
}

fn generate_king(board: &Board, tables: &MagicTables, gen: GenType, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let king_bb = board.pieces(Piece::King, color);
    if king_bb == 0 {
        return;
    }
    let from = king_bb.lsb();
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let empty = !board.occupied();

    let reachable = KING_ATTACKS[from as usize] & !friendly & !enemy_king;
    let targets = match gen {
        GenType::All => reachable,
        GenType::Captures => reachable & enemy,
        GenType::Quiets => reachable & empty,
    };
    push_moves(from, targets, enemy, Piece::King, move_list);

    if gen == GenType::Captures {
        return;
    }

    let occ = board.occupied();
    if board.has_kingside_castle(color) && (occ & kingside_between(color)) == 0 {
        let mv = Move {
            from: Square::from_index(from),
            to: Square::from_index(from + 2),
            piece: Piece::King,
            promotion: None,
            flags: KINGSIDE_CASTLE,
        };
        if is_legal_castling(board, mv, tables) {
            move_list.push(mv);
        }
    }
    if board.has_queenside_castle(color) && (occ & queenside_between(color)) == 0 {
        let mv = Move {
            from: Square::from_index(from),
            to: Square::from_index(from - 2),
            piece: Piece::King,
            promotion: None,
            flags: QUEENSIDE_CASTLE,
        };
        if is_legal_castling(board, mv, tables) {
            move_list.push(mv);
        }
    }
}

fn generate_pawn(board: &Board, gen: GenType, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let pawns = board.pieces(Piece::Pawn, color);
    let enemy_without_king =
        board.opponent_occupancy(color) & !board.pieces(Piece::King, color.opposite());
    let empty = !board.occupied();
    let attacks = pawn_attack_table(color);

    let (start_rank, promo_rank, forward, double_forward) = match color {
        Color::White => (RANK7, RANK8, NORTH, NORTH2),
        Color::Black => (RANK2, RANK1, SOUTH, SOUTH2),
    };
    let back = -forward;

    if gen != GenType::Captures {
        let single_pushes = shift(forward, pawns) & empty & !promo_rank;
        let mut bb = single_pushes;
        while bb != 0 {
            let to = bb.pop_lsb();
            let from = (to as i32 + back) as u8;
            move_list.push(Move {
                from: Square::from_index(from),
                to: Square::from_index(to),
                piece: Piece::Pawn,
                promotion: None,
                flags: QUIET_MOVE,
            });
        }

        let first_step = shift(forward, pawns & start_rank) & empty;
        let double_pushes = shift(forward, first_step) & empty;
        let mut bb = double_pushes;
        while bb != 0 {
            let to = bb.pop_lsb();
            let from = (to as i32 - double_forward) as u8;
            move_list.push(Move {
                from: Square::from_index(from),
                to: Square::from_index(to),
                piece: Piece::Pawn,
                promotion: None,
                flags: DOUBLE_PAWN_PUSH,
            });
        }
    }

    if gen != GenType::Quiets {
        let mut attackers = pawns & !start_rank;
        while attackers != 0 {
            let from = attackers.pop_lsb();
            let mut targets = attacks[from as usize] & enemy_without_king & !promo_rank;
            while targets != 0 {
                let to = targets.pop_lsb();
                move_list.push(Move {
                    from: Square::from_index(from),
                    to: Square::from_index(to),
                    piece: Piece::Pawn,
                    promotion: None,
                    flags: CAPTURE,
                });
            }
        }
    }

    // Promotions (push and capture) are scoped by `gen` at the callsite
    // filters below since a promoting push is a "quiet" and a promoting
    // capture is a "capture".
    let mut promo_pawns = pawns & start_rank;
    while promo_pawns != 0 {
        let from = promo_pawns.pop_lsb();
        let from_bb = 1u64 << from;

        if gen != GenType::Captures {
            let to_bb = shift(forward, from_bb) & empty & promo_rank;
            if to_bb != 0 {
                let to = to_bb.trailing_zeros() as u8;
                for &promo in PROMOS.iter() {
                    move_list.push(Move {
                        from: Square::from_index(from),
                        to: Square::from_index(to),
                        piece: Piece::Pawn,
                        promotion: Some(promo),
                        flags: PROMOTION,
                    });
                }
            }
        }

        if gen != GenType::Quiets {
            let mut targets = attacks[from as usize] & enemy_without_king & promo_rank;
            while targets != 0 {
                let to = targets.pop_lsb();
                for &promo in PROMOS.iter() {
                    move_list.push(Move {
                        from: Square::from_index(from),
                        to: Square::from_index(to),
                        piece: Piece::Pawn,
                        promotion: Some(promo),
                        flags: PROMOTION_CAPTURE,
                    });
                }
            }
        }
    }

    if gen != GenType::Quiets {
        if let Some(ep_sq) = board.en_passant {
            let ep = ep_sq.index();
            let mut atk = pawns;
            while atk != 0 {
                let from = atk.pop_lsb();
                if (attacks[from as usize] & (1u64 << ep)) != 0 {
                    move_list.push(Move {
                        from: Square::from_index(from),
                        to: Square::from_index(ep),
                        piece: Piece::Pawn,
                        promotion: None,
                        flags: EN_PASSANT,
                    });
                }
            }
        }
    }
}

/// Generate pseudo-legal moves of the requested scope into `moves`,
/// clearing it first. Legality (not leaving one's own king in check) is
/// filtered separately by the caller via [`crate::moves::execute::is_legal_move`].
pub fn generate_moves(gen: GenType, board: &Board, tables: &MagicTables, moves: &mut impl MoveBuffer) {
    moves.clear();
    generate_pawn(board, gen, moves);
    generate_knight(board, gen, moves);
    generate_bishop(board, &tables.bishop, gen, moves);
    generate_rook(board, &tables.rook, gen, moves);
    generate_queen(board, tables, gen, moves);
    generate_king(board, tables, gen, moves);
}

pub fn generate_pseudo_legal(board: &Board, tables: &MagicTables, moves: &mut impl MoveBuffer) {
    generate_moves(GenType::All, board, tables, moves);
}

/// Generate only pawn moves (pushes, double pushes, captures, promotions,
/// en passant), independent of the sliding/leaper attack tables.
pub fn generate_pawn_moves(board: &Board, moves: &mut impl MoveBuffer) {
    moves.clear();
    generate_pawn(board, GenType::All, moves);
}

pub fn generate_pseudo_legal_captures(
    board: &Board,
    tables: &MagicTables,
    moves: &mut impl MoveBuffer,
) {
    moves.clear();
    generate_pawn(board, GenType::Captures, moves);
    generate_knight(board, GenType::Captures, moves);
    generate_bishop(board, &tables.bishop, GenType::Captures, moves);
    generate_rook(board, &tables.rook, GenType::Captures, moves);
    generate_queen(board, tables, GenType::Captures, moves);
    generate_king(board, tables, GenType::Captures, moves);
}

pub fn generate_pseudo_legal_quiets(
    board: &Board,
    tables: &MagicTables,
    moves: &mut impl MoveBuffer,
) {
    moves.clear();
    generate_pawn(board, GenType::Quiets, moves);
    generate_knight(board, GenType::Quiets, moves);
    generate_bishop(board, &tables.bishop, GenType::Quiets, moves);
    generate_rook(board, &tables.rook, GenType::Quiets, moves);
    generate_queen(board, tables, GenType::Quiets, moves);
    generate_king(board, tables, GenType::Quiets, moves);
}
