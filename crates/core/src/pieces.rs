//! Pieces module - mino cell offsets per rotation
//!
//! Offsets are relative to the logical origin stored in a [`Move`], with `y`
//! growing upward. Non-mino pieces have no shape.

use crate::types::{Move, Piece, Rotation};

/// Offset of a single mino relative to piece origin
pub type MinoOffset = (i32, i32);

/// Shape of a piece - 4 mino offsets from piece origin
pub type PieceShape = [MinoOffset; 4];

fn spawn_shape(piece: Piece) -> Option<PieceShape> {
    let shape = match piece {
        Piece::I => [(0, 0), (-1, 0), (1, 0), (2, 0)],
        Piece::T => [(0, 0), (-1, 0), (1, 0), (0, 1)],
        Piece::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
        Piece::L => [(0, 0), (-1, 0), (1, 0), (1, 1)],
        Piece::J => [(0, 0), (-1, 0), (1, 0), (-1, 1)],
        Piece::S => [(0, 0), (-1, 0), (0, 1), (1, 1)],
        Piece::Z => [(0, 0), (1, 0), (0, 1), (-1, 1)],
        Piece::Empty | Piece::Gray => return None,
    };
    Some(shape)
}

/// Get the shape (mino offsets) for a piece kind and rotation
pub fn get_shape(piece: Piece, rotation: Rotation) -> Option<PieceShape> {
    let shape = spawn_shape(piece)?;
    let rotate = |(x, y): MinoOffset| match rotation {
        Rotation::Spawn => (x, y),
        Rotation::Right => (y, -x),
        Rotation::Reverse => (-x, -y),
        Rotation::Left => (-y, x),
    };
    Some(shape.map(rotate))
}

/// Absolute cells covered by a placement
pub fn get_cells(mv: &Move) -> Option<PieceShape> {
    get_shape(mv.piece, mv.rotation).map(|shape| shape.map(|(dx, dy)| (mv.x + dx, mv.y + dy)))
}
