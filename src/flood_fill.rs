// Reachable fish evaluation
//
// Counts the fish a penguin could still collect from a tile: the sum over
// the 4-connected region of unoccupied floes around it. Uses a span (scan
// line) fill so that the work is proportional to the region, with a visited
// grid and a span stack that are kept between calls.

use crate::board::Board;
use crate::types::{Coords, Neighbor};

/// A horizontal run `x1..=x2` on row `y` whose row `y + dy` is still to be scanned
#[derive(Debug, Clone, Copy)]
struct FillSpan {
    x1: i32,
    x2: i32,
    y: i32,
    dy: i32,
}

/// What the immediate surroundings of a tile say about its connectivity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunctionCheck {
    /// No passable orthogonal neighbor, the tile is cut off
    Isolated,
    /// All passable neighbors are connected around the tile
    Passage,
    /// The tile joins at least two groups of neighbors that only meet through it
    Junction,
}

/// Classifies `coords` by walking its 8-neighborhood
///
/// Two orthogonal neighbors are linked when the diagonal between them is
/// passable too. Removing a tile that is not a junction never splits the
/// region it belongs to.
pub fn quick_junction_check(board: &Board, coords: Coords) -> JunctionCheck {
    let ring = Neighbor::all();
    let passable: Vec<bool> = ring
        .iter()
        .map(|n| board.is_fish_at(n.apply(&coords)))
        .collect();

    let mut orthogonal = 0;
    let mut links = 0;
    for i in (0..ring.len()).step_by(2) {
        if !passable[i] {
            continue;
        }
        orthogonal += 1;
        let diagonal = i + 1;
        let next = (i + 2) % ring.len();
        if passable[diagonal] && passable[next] {
            links += 1;
        }
    }

    match orthogonal {
        0 => JunctionCheck::Isolated,
        _ if orthogonal - links <= 1 => JunctionCheck::Passage,
        _ => JunctionCheck::Junction,
    }
}

/// Scratch space for repeated flood fills over boards of the same size
#[derive(Debug, Default)]
pub struct FloodFill {
    width: i32,
    height: i32,
    visited: Vec<bool>,
    stack: Vec<FillSpan>,
}

impl FloodFill {
    pub fn new() -> Self {
        FloodFill::default()
    }

    /// Clears the visited grid for `board`, reusing the previous allocation
    pub fn reset_grid(&mut self, board: &Board) {
        let len = (board.width() * board.height()) as usize;
        self.width = board.width();
        self.height = board.height();
        self.visited.clear();
        self.visited.resize(len, false);
        self.stack.clear();
    }

    /// Fish reachable from `origin`, skipping the fill for cut-off tiles
    pub fn count_reachable_fish(&mut self, board: &Board, origin: Coords) -> u32 {
        if !board.is_in_bounds(origin) {
            return 0;
        }
        match quick_junction_check(board, origin) {
            JunctionCheck::Isolated => board.tile(origin).fish(),
            _ => self.count_fish(board, origin),
        }
    }

    /// Full span fill from `origin`
    ///
    /// The origin itself is always entered (it may hold a penguin) and
    /// contributes its own fish, every other tile must be an unoccupied floe.
    pub fn count_fish(&mut self, board: &Board, origin: Coords) -> u32 {
        self.reset_grid(board);
        if !board.is_in_bounds(origin) {
            return 0;
        }

        let mut stack = std::mem::take(&mut self.stack);
        let mut total = 0;
        stack.push(FillSpan {
            x1: origin.x,
            x2: origin.x,
            y: origin.y,
            dy: 1,
        });
        stack.push(FillSpan {
            x1: origin.x,
            x2: origin.x,
            y: origin.y - 1,
            dy: -1,
        });

        while let Some(FillSpan { mut x1, x2, y, dy }) = stack.pop() {
            let mut x = x1;
            if self.inside(board, origin, x, y) {
                while self.inside(board, origin, x - 1, y) {
                    total += self.mark(board, x - 1, y);
                    x -= 1;
                }
                if x < x1 {
                    stack.push(FillSpan {
                        x1: x,
                        x2: x1 - 1,
                        y: y - dy,
                        dy: -dy,
                    });
                }
            }
            while x1 <= x2 {
                while self.inside(board, origin, x1, y) {
                    total += self.mark(board, x1, y);
                    x1 += 1;
                }
                if x1 > x {
                    stack.push(FillSpan {
                        x1: x,
                        x2: x1 - 1,
                        y: y + dy,
                        dy,
                    });
                }
                if x1 - 1 > x2 {
                    stack.push(FillSpan {
                        x1: x2 + 1,
                        x2: x1 - 1,
                        y: y - dy,
                        dy: -dy,
                    });
                }
                x1 += 1;
                while x1 < x2 && !self.inside(board, origin, x1, y) {
                    x1 += 1;
                }
                x = x1;
            }
        }

        self.stack = stack;
        total
    }

    fn inside(&self, board: &Board, origin: Coords, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return false;
        }
        if self.visited[(y * self.width + x) as usize] {
            return false;
        }
        let coords = Coords::new(x, y);
        coords == origin || board.is_fish_at(coords)
    }

    fn mark(&mut self, board: &Board, x: i32, y: i32) -> u32 {
        self.visited[(y * self.width + x) as usize] = true;
        board.tile(Coords::new(x, y)).fish()
    }
}
