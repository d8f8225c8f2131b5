use chess::{Board as ChessBoard, ChessMove, Color, File, MoveGen, Piece, Rank, Square};
use std::fmt;
use std::str::FromStr;

use crate::error::ReplayError;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Owned replay state for one puzzle.
///
/// `chess::Board` only knows the first four FEN fields, so the halfmove clock
/// and fullmove number are tracked here. Every transition returns a new value;
/// nothing is shared between puzzles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplayBoard {
    inner: ChessBoard,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl ReplayBoard {
    pub fn new() -> Self {
        Self {
            inner: ChessBoard::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, ReplayError> {
        let invalid = |reason: String| ReplayError::InvalidPosition {
            fen: fen.to_string(),
            reason,
        };

        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(invalid(format!("expected 4 to 6 fields, got {}", fields.len())));
        }

        // chess::Board splits on single spaces, so hand it a normalized prefix
        let inner = ChessBoard::from_str(&fields[..4].join(" ")).map_err(|e| invalid(e.to_string()))?;

        let halfmove_clock = match fields.get(4) {
            Some(text) => text
                .parse()
                .map_err(|_| invalid(format!("bad halfmove clock {text:?}")))?,
            None => 0,
        };
        let fullmove_number = match fields.get(5) {
            Some(text) => text
                .parse()
                .map_err(|_| invalid(format!("bad fullmove number {text:?}")))?,
            None => 1,
        };

        Ok(Self {
            inner,
            halfmove_clock,
            fullmove_number,
        })
    }

    pub fn legal(&self, mv: &ChessMove) -> bool {
        self.inner.legal(*mv)
    }

    /// Returns the position after `mv`, refusing moves that are not legal here.
    pub fn apply(&self, mv: &ChessMove) -> Result<Self, ReplayError> {
        if !self.legal(mv) {
            return Err(ReplayError::Illegal {
                mv: mv.to_string(),
                fen: self.to_fen(),
            });
        }

        let resets_clock = self.inner.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.inner.piece_on(mv.get_dest()).is_some();
        let fullmove_number = match self.inner.side_to_move() {
            Color::Black => self.fullmove_number + 1,
            Color::White => self.fullmove_number,
        };

        Ok(Self {
            inner: self.inner.make_move_new(*mv),
            halfmove_clock: if resets_clock { 0 } else { self.halfmove_clock + 1 },
            fullmove_number,
        })
    }

    pub fn to_fen(&self) -> String {
        // chess::Board renders the pushed pawn's square for en passant and
        // placeholder clocks; keep its first three fields only
        let rendered = self.inner.to_string();
        let prefix: Vec<&str> = rendered.split_whitespace().take(3).collect();
        let en_passant = self
            .en_passant_target()
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());
        format!(
            "{} {} {} {}",
            prefix.join(" "),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// The square a pawn capturing en passant lands on, if such a capture exists.
    pub fn en_passant_target(&self) -> Option<Square> {
        let pushed = self.inner.en_passant()?;
        match self.inner.side_to_move() {
            Color::White => pushed.up(),
            Color::Black => pushed.down(),
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.inner.side_to_move()
    }

    pub fn as_chess_board(&self) -> &ChessBoard {
        &self.inner
    }
}

impl Default for ReplayBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReplayBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

fn parse_square(file: u8, rank: u8) -> Option<Square> {
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return None;
    }
    Some(Square::make_square(
        Rank::from_index((rank - b'1') as usize),
        File::from_index((file - b'a') as usize),
    ))
}

/// Parses a UCI move (`e2e4`, `e7e8q`). Legality is not checked.
pub fn parse_uci(text: &str) -> Option<ChessMove> {
    let bytes = text.as_bytes();
    if bytes.len() != 4 && bytes.len() != 5 {
        return None;
    }

    let from = parse_square(bytes[0], bytes[1])?;
    let to = parse_square(bytes[2], bytes[3])?;

    let promotion = match bytes.get(4) {
        None => None,
        Some(b'q') => Some(Piece::Queen),
        Some(b'r') => Some(Piece::Rook),
        Some(b'b') => Some(Piece::Bishop),
        Some(b'n') => Some(Piece::Knight),
        Some(_) => return None,
    };

    Some(ChessMove::new(from, to, promotion))
}

fn promotion_piece(text: &str) -> Option<Piece> {
    match text {
        "Q" => Some(Piece::Queen),
        "R" => Some(Piece::Rook),
        "B" => Some(Piece::Bishop),
        "N" => Some(Piece::Knight),
        _ => None,
    }
}

/// The constraints a SAN token puts on a legal move.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SanPattern {
    Castle {
        long: bool,
    },
    Normal {
        piece: Piece,
        file: Option<File>,
        rank: Option<Rank>,
        capture: bool,
        to: Square,
        promotion: Option<Piece>,
    },
}

impl SanPattern {
    fn parse(san: &str) -> Option<Self> {
        match san {
            "O-O" | "0-0" => return Some(SanPattern::Castle { long: false }),
            "O-O-O" | "0-0-0" => return Some(SanPattern::Castle { long: true }),
            _ => {}
        }

        let (body, promotion) = match san.split_once('=') {
            Some((body, promo)) => (body, Some(promotion_piece(promo)?)),
            None => (san, None),
        };

        let bytes = body.as_bytes();
        let (piece, rest) = match *bytes.first()? {
            b'K' => (Piece::King, &bytes[1..]),
            b'Q' => (Piece::Queen, &bytes[1..]),
            b'R' => (Piece::Rook, &bytes[1..]),
            b'B' => (Piece::Bishop, &bytes[1..]),
            b'N' => (Piece::Knight, &bytes[1..]),
            _ => (Piece::Pawn, bytes),
        };
        if rest.len() < 2 {
            return None;
        }
        let (head, dest) = rest.split_at(rest.len() - 2);
        let to = parse_square(dest[0], dest[1])?;

        // disambiguation is file, then rank, then the capture mark
        let mut file = None;
        let mut rank = None;
        let mut capture = false;
        for &b in head {
            match b {
                b'a'..=b'h' if file.is_none() && rank.is_none() && !capture => {
                    file = Some(File::from_index((b - b'a') as usize));
                }
                b'1'..=b'8' if rank.is_none() && !capture => {
                    rank = Some(Rank::from_index((b - b'1') as usize));
                }
                b'x' if !capture => capture = true,
                _ => return None,
            }
        }

        if piece == Piece::Pawn && (rank.is_some() || capture != file.is_some()) {
            return None;
        }
        if promotion.is_some() && piece != Piece::Pawn {
            return None;
        }

        Some(SanPattern::Normal {
            piece,
            file,
            rank,
            capture,
            to,
            promotion,
        })
    }

    fn matches(&self, board: &ChessBoard, mv: &ChessMove) -> bool {
        let from = mv.get_source();
        match *self {
            SanPattern::Castle { long } => {
                let to_file = if long { File::C } else { File::G };
                board.piece_on(from) == Some(Piece::King)
                    && from.get_file() == File::E
                    && mv.get_dest().get_file() == to_file
            }
            SanPattern::Normal {
                piece,
                file,
                rank,
                capture,
                to,
                promotion,
            } => {
                // a pawn push stays on its file; a pawn capture never does
                let pawn_path_ok =
                    piece != Piece::Pawn || (from.get_file() != to.get_file()) == capture;
                mv.get_dest() == to
                    && board.piece_on(from) == Some(piece)
                    && mv.get_promotion() == promotion
                    && file.map_or(true, |f| from.get_file() == f)
                    && rank.map_or(true, |r| from.get_rank() == r)
                    && pawn_path_ok
            }
        }
    }
}

/// Resolves a SAN move (`Nf3`, `exd6`, `fxg1=N+`, `O-O#`) against the legal
/// moves of `board`. Annotation suffixes are ignored.
pub fn parse_san(board: &ReplayBoard, text: &str) -> Result<ChessMove, ReplayError> {
    let san = text
        .trim()
        .trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'));
    let pattern =
        SanPattern::parse(san).ok_or_else(|| ReplayError::Unparsable(text.to_string()))?;

    let position = board.as_chess_board();
    let mut candidates = MoveGen::new_legal(position).filter(|mv| pattern.matches(position, mv));
    match (candidates.next(), candidates.next()) {
        (Some(mv), None) => Ok(mv),
        (None, _) => Err(ReplayError::Illegal {
            mv: text.to_string(),
            fen: board.to_fen(),
        }),
        (Some(_), Some(_)) => Err(ReplayError::Ambiguous {
            mv: text.to_string(),
            fen: board.to_fen(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn play(board: ReplayBoard, moves: &[&str]) -> ReplayBoard {
        moves.iter().fold(board, |board, text| {
            let mv = parse_uci(text).unwrap();
            board.apply(&mv).unwrap()
        })
    }

    #[test]
    fn test_fen_parsing() {
        let board = ReplayBoard::from_fen(STARTING_FEN).unwrap();
        assert_eq!(board.to_fen(), STARTING_FEN);
        assert_eq!(board, ReplayBoard::new());
    }

    #[test]
    fn test_missing_clocks_default() {
        let board = ReplayBoard::from_fen("8/8/8/4k3/8/8/8/4K2R w K -").unwrap();
        assert_eq!(board.to_fen(), "8/8/8/4k3/8/8/8/4K2R w K - 0 1");
    }

    #[test]
    fn test_invalid_fen() {
        assert!(ReplayBoard::from_fen("not a position").is_err());
        assert!(ReplayBoard::from_fen("").is_err());
        assert!(ReplayBoard::from_fen(&STARTING_FEN.replace(" 0 1", " x 1")).is_err());
    }

    #[test]
    fn test_clocks_advance() {
        let board = play(ReplayBoard::new(), &["g1f3", "g8f6", "f3g1", "f6g8"]);
        assert_eq!(
            board.to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 4 3"
        );
    }

    #[test]
    fn test_pawn_move_resets_halfmove_clock() {
        let board = play(ReplayBoard::new(), &["g1f3", "g8f6", "d2d4"]);
        assert!(board.to_fen().ends_with(" 0 2"));
        assert_eq!(board.side_to_move(), Color::Black);
    }

    #[test]
    fn test_illegal_move_is_refused() {
        let board = ReplayBoard::new();
        let mv = parse_uci("e2e5").unwrap();
        assert!(!board.legal(&mv));
        assert!(matches!(board.apply(&mv), Err(ReplayError::Illegal { .. })));
    }

    #[test]
    fn test_parse_uci() {
        let mv = parse_uci("e7e8q").unwrap();
        assert_eq!(mv.get_source(), Square::E7);
        assert_eq!(mv.get_dest(), Square::E8);
        assert_eq!(mv.get_promotion(), Some(Piece::Queen));
        assert_eq!(mv.to_string(), "e7e8q");

        assert!(parse_uci("e2e4").is_some());
        assert!(parse_uci("e2").is_none());
        assert!(parse_uci("i2e4").is_none());
        assert!(parse_uci("e2e9").is_none());
        assert!(parse_uci("e7e8k").is_none());
        assert!(parse_uci("0000").is_none());
    }

    #[test]
    fn test_parse_san() {
        let board = ReplayBoard::new();
        assert_eq!(parse_san(&board, "Nf3").unwrap().to_string(), "g1f3");
        assert_eq!(parse_san(&board, "e4+").unwrap().to_string(), "e2e4");
        assert!(parse_san(&board, "Qh5").is_err());
        assert!(parse_san(&board, "#").is_err());
    }

    #[test]
    fn test_en_passant_square_survives_fen() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        let board = ReplayBoard::from_fen(fen).unwrap();
        assert_eq!(board.en_passant_target(), Some(Square::F6));
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn test_double_push_next_to_enemy_pawn() {
        let board = ReplayBoard::from_fen("4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(
            play(board, &["e2e4"]).to_fen(),
            "4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1"
        );

        let board = ReplayBoard::from_fen("4k3/4p3/8/3P4/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(
            play(board, &["e7e5"]).to_fen(),
            "4k3/8/8/3Pp3/8/8/8/4K3 w - e6 0 2"
        );
    }

    #[test]
    fn test_parse_san_en_passant() {
        let board =
            ReplayBoard::from_fen("rnbqkb1r/ppp1pppp/5n2/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
                .unwrap();
        let mv = parse_san(&board, "exd6").unwrap();
        assert_eq!(mv.to_string(), "e5d6");
        assert_eq!(
            board.apply(&mv).unwrap().to_fen(),
            "rnbqkb1r/ppp1pppp/3P1n2/8/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 3"
        );
    }

    #[test]
    fn test_parse_san_promotions() {
        let board = ReplayBoard::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert_eq!(parse_san(&board, "e8=Q").unwrap().to_string(), "e7e8q");
        assert_eq!(parse_san(&board, "e8=N+").unwrap().to_string(), "e7e8n");
        assert!(matches!(parse_san(&board, "e8"), Err(ReplayError::Illegal { .. })));
        assert!(matches!(parse_san(&board, "e8=K"), Err(ReplayError::Unparsable(_))));

        let board = ReplayBoard::from_fen("4k3/8/8/8/8/8/5p2/K5N1 b - - 0 1").unwrap();
        assert_eq!(parse_san(&board, "fxg1=N").unwrap().to_string(), "f2g1n");
        assert_eq!(parse_san(&board, "f1=Q").unwrap().to_string(), "f2f1q");
    }

    #[test]
    fn test_parse_san_disambiguation_and_castling() {
        let board = ReplayBoard::from_fen("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1").unwrap();
        assert!(matches!(parse_san(&board, "Nd2"), Err(ReplayError::Ambiguous { .. })));
        assert_eq!(parse_san(&board, "Nbd2").unwrap().to_string(), "b1d2");
        assert_eq!(parse_san(&board, "Nfd2").unwrap().to_string(), "f3d2");

        let board = ReplayBoard::from_fen("r3k3/8/8/8/8/8/8/4K3 b q - 0 1").unwrap();
        assert_eq!(parse_san(&board, "O-O-O").unwrap().to_string(), "e8c8");
        assert!(parse_san(&board, "O-O").is_err());
    }
}
