//! Action codec - one page's placement and flags packed into a single number
//!
//! Mixed-radix layout, least significant first:
//!
//! | Part | Radix |
//! |------|-------|
//! | piece | 8 |
//! | rotation | 4 |
//! | position | 240 |
//! | rise | 2 |
//! | mirror | 2 |
//! | colorize | 2 |
//! | comment | 2 |
//! | not lock | 2 |
//!
//! The result always fits in three value-stream symbols.

use crate::error::{ConsistencyError, FormatError};
use crate::types::{Move, Piece, Rotation, FIELD_TOP, FIELD_WIDTH, TOTAL_BLOCKS};

/// Symbols used by one action
pub const ACTION_SYMBOLS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub piece: Move,
    pub rise: bool,
    pub mirror: bool,
    pub colorize: bool,
    pub comment: bool,
    pub lock: bool,
}

fn decode_rotation(n: u32) -> Rotation {
    match n {
        0 => Rotation::Reverse,
        1 => Rotation::Right,
        2 => Rotation::Spawn,
        _ => Rotation::Left,
    }
}

fn encode_rotation(rotation: Rotation) -> u32 {
    match rotation {
        Rotation::Reverse => 0,
        Rotation::Right => 1,
        Rotation::Spawn => 2,
        Rotation::Left => 3,
    }
}

/// Difference between a piece's stored cell and its logical origin
///
/// Only O, I, S and Z have origins that differ from the stored position.
fn origin_offset(piece: Piece, rotation: Rotation) -> (i32, i32) {
    match (piece, rotation) {
        (Piece::O, Rotation::Left) => (1, -1),
        (Piece::O, Rotation::Reverse) => (1, 0),
        (Piece::O, Rotation::Spawn) => (0, -1),
        (Piece::I, Rotation::Reverse) => (1, 0),
        (Piece::I, Rotation::Left) => (0, -1),
        (Piece::S, Rotation::Spawn) => (0, -1),
        (Piece::S, Rotation::Right) => (-1, 0),
        (Piece::Z, Rotation::Spawn) => (0, -1),
        (Piece::Z, Rotation::Left) => (1, 0),
        _ => (0, 0),
    }
}

/// Unpack an action value
pub fn decode_action(value: u32) -> Result<Action, FormatError> {
    let mut v = value;
    let mut take = |radix: u32| {
        let part = v % radix;
        v /= radix;
        part
    };

    // radix 8 never yields Gray
    let piece = Piece::from_value(take(8) as u8).ok_or(FormatError::InvalidAction(value))?;
    let rotation = decode_rotation(take(4));
    let position = take(TOTAL_BLOCKS as u32) as i32;
    let rise = take(2) == 1;
    let mirror = take(2) == 1;
    let colorize = take(2) == 1;
    let comment = take(2) == 1;
    let lock = take(2) != 1;

    let (dx, dy) = origin_offset(piece, rotation);
    let x = position % FIELD_WIDTH as i32 + dx;
    let y = FIELD_TOP as i32 - position / FIELD_WIDTH as i32 - 1 + dy;

    Ok(Action {
        piece: Move::new(piece, rotation, x, y),
        rise,
        mirror,
        colorize,
        comment,
        lock,
    })
}

/// Pack an action value
///
/// The piece must be empty or a mino; its stored cell must fall inside the
/// 240-cell position range.
pub fn encode_action(action: &Action) -> Result<u32, crate::error::FumenError> {
    let mv = &action.piece;
    if mv.piece == Piece::Gray {
        return Err(ConsistencyError::NotMino {
            piece: mv.piece.as_char(),
        }
        .into());
    }

    let (dx, dy) = origin_offset(mv.piece, mv.rotation);
    let x = mv.x - dx;
    let y = mv.y - dy;
    let position = (FIELD_TOP as i32 - y - 1) * FIELD_WIDTH as i32 + x;
    if !(0..FIELD_WIDTH as i32).contains(&x) || !(0..TOTAL_BLOCKS as i32).contains(&position) {
        return Err(FormatError::InvalidValue {
            kind: "position",
            value: format!("({}, {})", mv.x, mv.y),
        }
        .into());
    }

    let flag = |b: bool| if b { 1 } else { 0 };
    let mut value = flag(!action.lock);
    value = value * 2 + flag(action.comment);
    value = value * 2 + flag(action.colorize);
    value = value * 2 + flag(action.mirror);
    value = value * 2 + flag(action.rise);
    value = value * TOTAL_BLOCKS as u32 + position as u32;
    value = value * 4 + encode_rotation(mv.rotation);
    value = value * 8 + mv.piece.value() as u32;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(piece: Move) -> Action {
        Action {
            piece,
            rise: false,
            mirror: false,
            colorize: true,
            comment: false,
            lock: true,
        }
    }

    #[test]
    fn empty_page_action() {
        // "AgH" from the canonical empty document
        let decoded = decode_action(30720).unwrap();
        assert_eq!(decoded, action(Move::empty()));
        assert_eq!(encode_action(&decoded).unwrap(), 30720);
    }

    #[test]
    fn offsets_invert_for_every_piece() {
        let rotations = [
            Rotation::Spawn,
            Rotation::Right,
            Rotation::Reverse,
            Rotation::Left,
        ];
        for piece in Piece::MINOS {
            for rotation in rotations {
                let a = Action {
                    piece: Move::new(piece, rotation, 4, 10),
                    rise: true,
                    mirror: false,
                    colorize: false,
                    comment: true,
                    lock: false,
                };
                let value = encode_action(&a).unwrap();
                assert!(value < 64 * 64 * 64);
                assert_eq!(decode_action(value).unwrap(), a);
            }
        }
    }

    #[test]
    fn o_spawn_origin_is_one_row_below_stored_cell() {
        let a = action(Move::new(Piece::O, Rotation::Spawn, 0, 0));
        let value = encode_action(&a).unwrap();
        // stored cell is (0, 1): row index 21 from the top
        assert_eq!((value / 32) % 240, 21 * 10);
    }

    #[test]
    fn rotation_values_are_not_declaration_order() {
        let declared = [
            Rotation::Spawn,
            Rotation::Right,
            Rotation::Reverse,
            Rotation::Left,
        ];
        let values: Vec<u32> = declared.into_iter().map(encode_rotation).collect();
        assert_eq!(values, [2, 1, 0, 3]);
        for value in 0..4 {
            assert_eq!(encode_rotation(decode_rotation(value)), value);
        }
    }

    #[test]
    fn gray_is_not_placeable() {
        let a = action(Move::new(Piece::Gray, Rotation::Spawn, 4, 4));
        assert_eq!(encode_action(&a).unwrap_err().code(), "not_mino");
    }

    #[test]
    fn position_outside_range_is_rejected() {
        let a = action(Move::new(Piece::T, Rotation::Spawn, 4, 30));
        assert!(encode_action(&a).is_err());
    }
}
