//! Fixed-width FEN encoding for the ROOK language-model tokenizer.
//!
//! Layout (77 characters):
//!
//! | columns | field            | width | padding                 |
//! |---------|------------------|-------|-------------------------|
//! | 0..64   | piece placement  | 64    | digits expanded to `.`  |
//! | 64      | side to move     | 1     | none                    |
//! | 65..69  | castling rights  | 4     | right, `.`              |
//! | 69..71  | en passant       | 2     | right, `.`              |
//! | 71..74  | halfmove clock   | 3     | right to 2, then one `.`|
//! | 74..77  | fullmove number  | 3     | right, `.`              |

pub const FILLER: char = '.';
pub const ENCODED_LEN: usize = 77;

const PLACEMENT_WIDTH: usize = 64;
const CASTLING_WIDTH: usize = 4;
const EN_PASSANT_WIDTH: usize = 2;
const HALFMOVE_WIDTH: usize = 2;
const FULLMOVE_WIDTH: usize = 3;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("expected 6 FEN fields, got {0}")]
    FieldCount(usize),

    #[error("piece placement covers {0} squares, expected 64")]
    Placement(usize),

    #[error("{field} field {value:?} is wider than {width} columns")]
    TooWide {
        field: &'static str,
        value: String,
        width: usize,
    },

    #[error("encoded position has {0} characters, expected 77")]
    EncodedLength(usize),
}

fn pad_right(field: &'static str, value: &str, width: usize) -> Result<String, EncodeError> {
    let len = value.chars().count();
    if len > width {
        return Err(EncodeError::TooWide {
            field,
            value: value.to_string(),
            width,
        });
    }
    let mut out = value.to_string();
    out.extend(std::iter::repeat(FILLER).take(width - len));
    Ok(out)
}

fn expand_placement(placement: &str) -> Result<String, EncodeError> {
    let mut squares = String::with_capacity(PLACEMENT_WIDTH);
    for c in placement.chars() {
        match c {
            '/' => {}
            '1'..='9' => {
                let run = c as usize - '0' as usize;
                squares.extend(std::iter::repeat(FILLER).take(run));
            }
            _ => squares.push(c),
        }
    }
    let count = squares.chars().count();
    if count != PLACEMENT_WIDTH {
        return Err(EncodeError::Placement(count));
    }
    Ok(squares)
}

/// Encodes a six-field FEN into the fixed 77-column layout.
pub fn encode_fixed_width(fen: &str) -> Result<String, EncodeError> {
    let fields: Vec<&str> = fen.split(' ').collect();
    let [placement, side, castling, en_passant, halfmove, fullmove] = fields[..] else {
        return Err(EncodeError::FieldCount(fields.len()));
    };

    let mut out = expand_placement(placement)?;
    if side.chars().count() != 1 {
        return Err(EncodeError::TooWide {
            field: "side to move",
            value: side.to_string(),
            width: 1,
        });
    }
    out.push_str(side);
    out.push_str(&pad_right("castling", castling, CASTLING_WIDTH)?);
    out.push_str(&pad_right("en passant", en_passant, EN_PASSANT_WIDTH)?);
    out.push_str(&pad_right("halfmove clock", halfmove, HALFMOVE_WIDTH)?);
    out.push(FILLER);
    out.push_str(&pad_right("fullmove number", fullmove, FULLMOVE_WIDTH)?);
    Ok(out)
}

fn compress_rank(rank: &[char]) -> String {
    let mut out = String::new();
    let mut empty = 0;
    for &c in rank {
        if c == FILLER {
            empty += 1;
            continue;
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
            empty = 0;
        }
        out.push(c);
    }
    if empty > 0 {
        out.push_str(&empty.to_string());
    }
    out
}

/// Inverse of [`encode_fixed_width`].
pub fn decode_fixed_width(encoded: &str) -> Result<String, EncodeError> {
    let chars: Vec<char> = encoded.chars().collect();
    if chars.len() != ENCODED_LEN {
        return Err(EncodeError::EncodedLength(chars.len()));
    }

    let placement = chars[..PLACEMENT_WIDTH]
        .chunks(8)
        .map(compress_rank)
        .collect::<Vec<_>>()
        .join("/");

    let column = |from: usize, to: usize| -> String {
        chars[from..to]
            .iter()
            .collect::<String>()
            .trim_end_matches(FILLER)
            .to_string()
    };

    let side = column(64, 65);
    let castling = column(65, 69);
    let en_passant = column(69, 71);
    let halfmove = column(71, 74);
    let fullmove = column(74, 77);

    Ok(format!(
        "{placement} {side} {castling} {en_passant} {halfmove} {fullmove}"
    ))
}
