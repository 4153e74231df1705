use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coordinate along one tissue axis.
pub type AxisPosition = u32;

/// Errors raised while building geometry from loosely-typed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimensionError {
    /// Only 2-dimensional tissues are supported.
    #[error("the {corner} corner must have exactly 2 coordinates, got {found}")]
    WrongArity { corner: &'static str, found: usize },
    /// A rectangle built from a corner and a size needs a non-zero size.
    #[error("rectangle size must be positive, got {width}x{height}")]
    EmptySize { width: AxisPosition, height: AxisPosition },
}

/// A position in the tissue grid.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: AxisPosition,
    pub y: AxisPosition,
}

impl Position {
    #[inline(always)]
    pub fn new(x: AxisPosition, y: AxisPosition) -> Self {
        Self { x, y }
    }

    /// Builds a position from a coordinate slice, rejecting anything that is not 2-D.
    pub fn from_slice(coords: &[AxisPosition], corner: &'static str) -> Result<Self, DimensionError> {
        match coords {
            [x, y] => Ok(Self::new(*x, *y)),
            _ => Err(DimensionError::WrongArity { corner, found: coords.len() }),
        }
    }

    /// Moves one step along `direction`. Returns `None` when the step would leave
    /// the non-negative quadrant; the upper tissue bound is the caller's business.
    #[inline(always)]
    pub fn step(self, direction: Direction) -> Option<Self> {
        let x = self.x.checked_add_signed(direction.dx as i32)?;
        let y = self.y.checked_add_signed(direction.dy as i32)?;
        Some(Self::new(x, y))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// One of the 8 grid moves (the null move excluded).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Direction {
    pub dx: i8,
    pub dy: i8,
}

impl Direction {
    /// Every non-null combination of an x move {up, down, none} and a y move
    /// {up, down, none}, x outer and y inner.
    pub const ALL: [Direction; 8] = [
        Direction { dx: 1, dy: 1 },
        Direction { dx: 1, dy: -1 },
        Direction { dx: 1, dy: 0 },
        Direction { dx: -1, dy: 1 },
        Direction { dx: -1, dy: -1 },
        Direction { dx: -1, dy: 0 },
        Direction { dx: 0, dy: 1 },
        Direction { dx: 0, dy: -1 },
    ];
}

/// An axis-aligned rectangle with inclusive corners.
///
/// A rectangle whose lower corner exceeds its upper corner on some axis is
/// *degenerate*: it contains no position. The tumour bounding box of an empty
/// tissue is reported that way.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub lower_corner: Position,
    pub upper_corner: Position,
}

impl Rectangle {
    pub fn new(lower_corner: Position, upper_corner: Position) -> Self {
        Self { lower_corner, upper_corner }
    }

    /// Builds the rectangle whose lower corner is `lower_corner` and that spans
    /// `width` x `height` positions.
    pub fn with_size(
        lower_corner: Position,
        width: AxisPosition,
        height: AxisPosition,
    ) -> Result<Self, DimensionError> {
        if width == 0 || height == 0 {
            return Err(DimensionError::EmptySize { width, height });
        }
        let upper_corner = Position::new(
            lower_corner.x.saturating_add(width - 1),
            lower_corner.y.saturating_add(height - 1),
        );
        Ok(Self::new(lower_corner, upper_corner))
    }

    /// Builds a rectangle from two coordinate slices, each of which must be 2-D.
    pub fn from_corners(
        lower_corner: &[AxisPosition],
        upper_corner: &[AxisPosition],
    ) -> Result<Self, DimensionError> {
        let lower = Position::from_slice(lower_corner, "lower")?;
        let upper = Position::from_slice(upper_corner, "upper")?;
        Ok(Self::new(lower, upper))
    }

    /// True when the lower corner exceeds the upper corner on some axis.
    #[inline(always)]
    pub fn is_degenerate(&self) -> bool {
        self.lower_corner.x > self.upper_corner.x || self.lower_corner.y > self.upper_corner.y
    }

    /// Number of columns, 0 for degenerate rectangles.
    pub fn width(&self) -> AxisPosition {
        if self.is_degenerate() { 0 } else { self.upper_corner.x - self.lower_corner.x + 1 }
    }

    /// Number of rows, 0 for degenerate rectangles.
    pub fn height(&self) -> AxisPosition {
        if self.is_degenerate() { 0 } else { self.upper_corner.y - self.lower_corner.y + 1 }
    }

    pub fn contains(&self, position: Position) -> bool {
        !self.is_degenerate()
            && (self.lower_corner.x..=self.upper_corner.x).contains(&position.x)
            && (self.lower_corner.y..=self.upper_corner.y).contains(&position.y)
    }

    /// Restricts the rectangle to a `width` x `height` tissue anchored at the origin.
    /// Returns `None` when nothing of the rectangle lies inside the tissue.
    pub fn clip_to(&self, width: AxisPosition, height: AxisPosition) -> Option<Self> {
        if self.is_degenerate()
            || width == 0
            || height == 0
            || self.lower_corner.x >= width
            || self.lower_corner.y >= height
        {
            return None;
        }
        let upper = Position::new(self.upper_corner.x.min(width - 1), self.upper_corner.y.min(height - 1));
        Some(Self::new(self.lower_corner, upper))
    }

    /// Positions of the rectangle, x outer and y inner.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let (lower, upper) = (self.lower_corner, self.upper_corner);
        let ys = move || lower.y..=upper.y;
        (lower.x..=upper.x).flat_map(move |x| ys().map(move |y| Position::new(x, y)))
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rectangle({},{})", self.lower_corner, self.upper_corner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_rejects_non_planar_input() {
        let err = Rectangle::from_corners(&[1, 2, 3], &[4, 5]).unwrap_err();
        assert_eq!(err, DimensionError::WrongArity { corner: "lower", found: 3 });
        let err = Rectangle::from_corners(&[1, 2], &[4]).unwrap_err();
        assert_eq!(err, DimensionError::WrongArity { corner: "upper", found: 1 });
    }

    #[test]
    fn test_with_size_is_inclusive() {
        let rect = Rectangle::with_size(Position::new(500, 450), 50, 25).unwrap();
        assert_eq!(rect.upper_corner, Position::new(549, 474));
        assert_eq!(rect.width(), 50);
        assert_eq!(rect.height(), 25);
        assert!(Rectangle::with_size(Position::new(0, 0), 0, 3).is_err());
    }

    #[test]
    fn test_degenerate_rectangle_is_empty() {
        let rect = Rectangle::new(Position::new(5, 0), Position::new(4, 9));
        assert!(rect.is_degenerate());
        assert!(!rect.contains(Position::new(4, 4)));
        assert_eq!(rect.clip_to(10, 10), None);
    }

    #[test]
    fn test_positions_are_x_major() {
        let rect = Rectangle::new(Position::new(1, 1), Position::new(2, 2));
        let visited: Vec<_> = rect.positions().collect();
        assert_eq!(
            visited,
            vec![Position::new(1, 1), Position::new(1, 2), Position::new(2, 1), Position::new(2, 2)]
        );
    }

    #[test]
    fn test_clip_to_tissue() {
        let rect = Rectangle::new(Position::new(8, 3), Position::new(12, 20));
        let clipped = rect.clip_to(10, 10).unwrap();
        assert_eq!(clipped.upper_corner, Position::new(9, 9));
        assert_eq!(Rectangle::new(Position::new(10, 0), Position::new(11, 1)).clip_to(10, 10), None);
    }

    #[test]
    fn test_step_stays_in_quadrant() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.step(Direction { dx: -1, dy: 0 }), None);
        assert_eq!(origin.step(Direction { dx: 1, dy: 1 }), Some(Position::new(1, 1)));
        assert_eq!(Direction::ALL.len(), 8);
        assert!(!Direction::ALL.contains(&Direction { dx: 0, dy: 0 }));
    }
}
