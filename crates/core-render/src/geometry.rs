//! Screen coordinates, text locations and half-open areas between them.

use std::cmp::Ordering;

/// Physical cell position; `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub x: usize,
    pub y: usize,
}

impl Coordinate {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Row-major order: earlier rows first, then columns.
impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Logical text position (line and column in characters).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

impl Location {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Span between two coordinates, end exclusive. The endpoints may be given
/// in either order; `start()`/`end()` normalize them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Area {
    pub from: Coordinate,
    pub to: Coordinate,
}

impl Area {
    pub const fn new(from: Coordinate, to: Coordinate) -> Self {
        Self { from, to }
    }

    pub fn start(&self) -> Coordinate {
        self.from.min(self.to)
    }

    pub fn end(&self) -> Coordinate {
        self.from.max(self.to)
    }

    pub fn is_empty(&self) -> bool {
        self.start() >= self.end()
    }

    /// Text-flow containment: full rows between the endpoint rows, partial
    /// rows at either end.
    pub fn contains(&self, c: Coordinate) -> bool {
        let (start, end) = (self.start(), self.end());
        if start.y == end.y {
            return c.y == start.y && start.x <= c.x && c.x < end.x;
        }
        if c.y == start.y {
            start.x <= c.x
        } else if c.y == end.y {
            c.x < end.x
        } else {
            start.y < c.y && c.y < end.y
        }
    }

    /// Rectangle containment with exclusive right and bottom edges.
    pub fn rect_contains(&self, c: Coordinate) -> bool {
        let (start, end) = (self.start(), self.end());
        start.y <= c.y && c.y < end.y && start.x <= c.x && c.x < end.x
    }

    /// Pull any endpoint past `limit` back to it.
    pub fn limit_to(&mut self, limit: Coordinate) {
        self.from = self.from.min(limit);
        self.to = self.to.min(limit);
    }
}
