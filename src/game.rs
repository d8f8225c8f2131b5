use chess::ChessMove;
use pgn_reader::{BufferedReader, RawHeader, SanPlus, Skip, Visitor};

use crate::board::{parse_san, ReplayBoard};
use crate::error::ReplayError;

/// A game transcript replayed along its main line.
#[derive(Debug, Clone)]
pub struct PgnGame {
    start: ReplayBoard,
    moves: Vec<ChessMove>,
    final_position: ReplayBoard,
}

impl PgnGame {
    pub fn start(&self) -> &ReplayBoard {
        &self.start
    }

    pub fn moves(&self) -> &[ChessMove] {
        &self.moves
    }

    pub fn final_position(&self) -> &ReplayBoard {
        &self.final_position
    }

    pub fn move_history(&self) -> Vec<String> {
        self.moves.iter().map(|mv| mv.to_string()).collect()
    }
}

struct MainLineReplay {
    start: ReplayBoard,
    board: ReplayBoard,
    moves: Vec<ChessMove>,
    error: Option<ReplayError>,
}

impl MainLineReplay {
    fn new() -> Self {
        Self {
            start: ReplayBoard::new(),
            board: ReplayBoard::new(),
            moves: Vec::new(),
            error: None,
        }
    }
}

impl Visitor for MainLineReplay {
    type Result = Result<PgnGame, ReplayError>;

    fn begin_game(&mut self) {
        *self = Self::new();
    }

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        if key != b"FEN" {
            return;
        }
        match ReplayBoard::from_fen(&value.decode_utf8_lossy()) {
            Ok(board) => {
                self.start = board;
                self.board = board;
            }
            Err(e) => self.error = Some(e),
        }
    }

    fn san(&mut self, san_plus: SanPlus) {
        if self.error.is_some() {
            return;
        }
        let text = san_plus.san.to_string();
        let step = parse_san(&self.board, &text)
            .and_then(|mv| self.board.apply(&mv).map(|next| (mv, next)));
        match step {
            Ok((mv, next)) => {
                self.moves.push(mv);
                self.board = next;
            }
            Err(e) => self.error = Some(e),
        }
    }

    fn begin_variation(&mut self) -> Skip {
        Skip(true) // main line only
    }

    fn end_game(&mut self) -> Self::Result {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        Ok(PgnGame {
            start: self.start,
            moves: std::mem::take(&mut self.moves),
            final_position: self.board,
        })
    }
}

/// Reads the first game in `text` and replays it to its final position.
pub fn load_pgn(text: &str) -> Result<PgnGame, ReplayError> {
    let mut reader = BufferedReader::new_cursor(text.as_bytes());
    let mut replay = MainLineReplay::new();
    match reader.read_game(&mut replay) {
        Ok(Some(game)) => game,
        Ok(None) => Err(ReplayError::Pgn("no game found".to_string())),
        Err(e) => Err(ReplayError::Pgn(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_movetext_without_headers() {
        let game = load_pgn("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6").unwrap();
        assert_eq!(
            game.move_history(),
            vec!["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6"]
        );
        assert_eq!(game.start(), &ReplayBoard::new());
        assert!(game.final_position().to_fen().ends_with(" 0 4"));
    }

    #[test]
    fn test_headers_comments_and_variations() {
        let pgn = r#"[Event "Casual"]
[White "A"]
[Black "B"]

1. Nf3 {develops} Nf6 (1... d5 2. d4) 2. Ng1 Ng8 1/2-1/2
"#;
        let game = load_pgn(pgn).unwrap();
        assert_eq!(game.moves().len(), 4);
        assert_eq!(
            game.final_position().to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 4 3"
        );
    }

    #[test]
    fn test_fen_header_sets_start() {
        let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/8/4K2R w K - 0 1"]

1. O-O Kd7 *
"#;
        let game = load_pgn(pgn).unwrap();
        assert_eq!(game.move_history(), vec!["e1g1", "e8d7"]);
        assert_eq!(
            game.final_position().to_fen(),
            "8/3k4/8/8/8/8/8/5RK1 w - - 2 2"
        );
    }

    #[test]
    fn test_en_passant_capture() {
        let game = load_pgn("1. e4 Nf6 2. e5 d5 3. exd6 Qxd6").unwrap();
        assert_eq!(
            game.move_history(),
            vec!["e2e4", "g8f6", "e4e5", "d7d5", "e5d6", "d8d6"]
        );
        assert_eq!(
            game.final_position().to_fen(),
            "rnb1kb1r/ppp1pppp/3q1n2/8/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 4"
        );
    }

    #[test]
    fn test_promotions() {
        let game = load_pgn("[FEN \"8/4P3/8/8/8/8/k7/4K3 w - - 0 1\"]\n\n1. e8=Q Kb2 *").unwrap();
        assert_eq!(game.move_history(), vec!["e7e8q", "a2b2"]);
        assert_eq!(game.final_position().to_fen(), "4Q3/8/8/8/8/8/1k6/4K3 w - - 1 2");

        let game =
            load_pgn("[FEN \"4k3/8/8/8/8/8/5p2/K5N1 b - - 0 1\"]\n\n1... fxg1=N 2. Kb2 *").unwrap();
        assert_eq!(game.move_history(), vec!["f2g1n", "a1b2"]);
        assert_eq!(game.final_position().to_fen(), "4k3/8/8/8/8/8/1K6/6n1 b - - 1 2");
    }

    #[test]
    fn test_illegal_move_fails() {
        let err = load_pgn("1. e4 e5 2. Ke3").unwrap_err();
        assert!(matches!(err, ReplayError::Illegal { .. } | ReplayError::Unparsable(_)));
    }

    #[test]
    fn test_empty_movetext() {
        let game = load_pgn("*").unwrap();
        assert!(game.moves().is_empty());
        assert_eq!(game.final_position(), &ReplayBoard::new());
    }
}
