//! FEN parsing and serialization.
//!
//! The six-field form is accepted; the halfmove clock and fullmove number
//! fields may be omitted (defaulting to 0 and 1) per the UCI collaborator's
//! contract.

use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, EMPTY_SQ, Piece};
use crate::square::{Square, SquareError};
use std::fmt;

/// Error type for FEN parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// FEN has fewer than the 4 required fields (placement, turn, castling,
    /// en passant).
    TooFewFields { found: usize },
    /// Piece placement field does not split into exactly 8 ranks.
    BadRankCount { found: usize },
    /// A rank's digit run or piece count exceeds 8 files.
    RankOverflow { rank: usize },
    /// A rank's files summed to less than 8.
    RankUnderflow { rank: usize },
    /// Unrecognized piece glyph in the placement field.
    UnknownPieceGlyph { glyph: char },
    /// Side-to-move field was neither `w` nor `b`.
    BadSideToMove { found: String },
    /// Unrecognized castling-rights glyph.
    BadCastlingGlyph { glyph: char },
    /// En passant target square failed to parse.
    BadEnPassantSquare { notation: String },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewFields { found } => write!(
                f,
                "FEN needs at least 4 fields (placement, turn, castling, en passant), got {found}"
            ),
            FenError::BadRankCount { found } => {
                write!(f, "FEN piece placement must have 8 ranks, got {found}")
            }
            FenError::RankOverflow { rank } => write!(f, "rank {rank} overflows files"),
            FenError::RankUnderflow { rank } => write!(f, "rank {rank} does not sum to 8 files"),
            FenError::UnknownPieceGlyph { glyph } => write!(f, "unknown piece glyph '{glyph}'"),
            FenError::BadSideToMove { found } => write!(f, "bad side to move '{found}'"),
            FenError::BadCastlingGlyph { glyph } => write!(f, "bad castling glyph '{glyph}'"),
            FenError::BadEnPassantSquare { notation } => {
                write!(f, "bad en passant square '{notation}'")
            }
        }
    }
}

impl std::error::Error for FenError {}

impl From<SquareError> for FenError {
    fn from(e: SquareError) -> Self {
        let notation = match e {
            SquareError::BadNotation { notation } => notation,
            SquareError::IndexOutOfRange { index } => index.to_string(),
        };
        FenError::BadEnPassantSquare { notation }
    }
}

impl Board {
    /// Parses `fen` into `self`, replacing all prior state. On error `self`
    /// is left unchanged.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::TooFewFields {
                found: fields.len(),
            });
        }

        let mut board = Board::new_empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadRankCount { found: ranks.len() });
        }
        for (row, rank_str) in ranks.iter().enumerate() {
            let mut file = 0u8;
            for ch in rank_str.chars() {
                if let Some(d) = ch.to_digit(10) {
                    file += d as u8;
                    if file > 8 {
                        return Err(FenError::RankOverflow { rank: row + 1 });
                    }
                    continue;
                }
                if file >= 8 {
                    return Err(FenError::RankOverflow { rank: row + 1 });
                }
                let (piece, color) = CHAR_TO_PC[ch as usize]
                    .ok_or(FenError::UnknownPieceGlyph { glyph: ch })?;
                let sq = Square::from_file_row(file, row as u8);
                let bb = board.bb(color, piece) | (1u64 << sq.index());
                board.set_bb(color, piece, bb);
                file += 1;
            }
            if file != 8 {
                return Err(FenError::RankUnderflow { rank: row + 1 });
            }
        }

        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::BadSideToMove {
                    found: other.to_string(),
                });
            }
        };

        let mut rights = 0u8;
        if fields[2] != "-" {
            for ch in fields[2].chars() {
                rights |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    other => return Err(FenError::BadCastlingGlyph { glyph: other }),
                };
            }
        }
        board.castling_rights = rights;

        board.en_passant = if fields[3] == "-" {
            None
        } else {
            Some(fields[3].parse::<Square>()?)
        };

        board.halfmove_clock = fields.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
        board.fullmove_number = fields.get(5).and_then(|s| s.parse().ok()).unwrap_or(1);

        board.history.clear();
        board.refresh_zobrist();

        *self = board;
        Ok(())
    }

    /// Serializes the current position to the standard six-field FEN form.
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for row in 0..8u8 {
            let mut empty_run = 0u8;
            for file in 0..8u8 {
                let sq = Square::from_file_row(file, row);
                let code = self.piece_on_sq[sq.index() as usize];
                if code == EMPTY_SQ {
                    empty_run += 1;
                    continue;
                }
                if empty_run > 0 {
                    placement.push_str(&empty_run.to_string());
                    empty_run = 0;
                }
                let color = if code & 0b1000 != 0 {
                    Color::Black
                } else {
                    Color::White
                };
                let piece = Piece::from_u8(code & 0b0111);
                placement.push(PC_TO_CHAR[(color as usize) * 6 + (piece as usize)]);
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if row != 7 {
                placement.push('/');
            }
        }

        let turn = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.has_castling(CASTLE_WK) {
            castling.push('K');
        }
        if self.has_castling(CASTLE_WQ) {
            castling.push('Q');
        }
        if self.has_castling(CASTLE_BK) {
            castling.push('k');
        }
        if self.has_castling(CASTLE_BQ) {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = match self.en_passant {
            Some(sq) => sq.to_algebraic(),
            None => "-".to_string(),
        };

        format!(
            "{} {} {} {} {} {}",
            placement, turn, castling, ep, self.halfmove_clock, self.fullmove_number
        )
    }
}
