//! Compass-corner names resolved to coordinates on the simulator floor.
//!
//! The floor is a square of half-extent [`FLOOR_HALF_EXTENT`] centred on the
//! origin, with north towards `-z` and east towards `+x`.  A corner resolves
//! to a point inset from the boundary by a margin.

use crate::command::Position;

/// Half the side length of the simulator floor.
pub const FLOOR_HALF_EXTENT: f64 = 50.0;

/// Inset applied to corner coordinates when no explicit margin is given.
pub const DEFAULT_CORNER_MARGIN: f64 = 5.0;

/// Resolve a corner name such as `"NE"`, `"sw"` or `"TR"` to a ground
/// position.
///
/// Any name is accepted.  Outside the exact aliases (`NE/EN/TR`, `NW/WN/TL`,
/// `SE/ES/BR`, `SW/WS/BL`) the letters decide: an `E` pushes `x` east, an `S`
/// or `B` pushes `z` south, and everything else defaults to north-west.
pub fn corner_to_position(corner: &str, margin: f64) -> Position {
    let c = corner.to_uppercase();
    let edge = FLOOR_HALF_EXTENT - margin;

    let (x, z) = match c.as_str() {
        "NE" | "EN" | "TR" => (edge, -edge),
        "NW" | "WN" | "TL" => (-edge, -edge),
        "SE" | "ES" | "BR" => (edge, edge),
        "SW" | "WS" | "BL" => (-edge, edge),
        _ => {
            let x = if c.contains('E') { edge } else { -edge };
            let z = if c.contains('S') || c.contains('B') { edge } else { -edge };
            (x, z)
        }
    };

    Position::ground(x, z)
}
