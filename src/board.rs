// Board model: the fixed-size grid of tiles
//
// A tile is water (a hole), an ice floe with fish on it, or an ice floe
// occupied by a penguin. Fish on a floe are credited to the player whose
// penguin lands there, so occupied tiles carry no fish.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rng::RandomSource;
use crate::types::{Coords, Direction};

/// Player identifiers are `index + 1`, at most 9 players fit the text layout
pub type PlayerId = u8;

/// A single tile of the board
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Tile {
    Water,
    Fish(u8),
    Penguin(PlayerId),
}

impl Tile {
    /// An unoccupied ice floe, the only kind of tile a penguin can cross or land on
    pub fn is_fish(&self) -> bool {
        matches!(self, Tile::Fish(_))
    }

    pub fn is_penguin(&self) -> bool {
        matches!(self, Tile::Penguin(_))
    }

    pub fn fish(&self) -> u32 {
        match self {
            Tile::Fish(n) => u32::from(*n),
            _ => 0,
        }
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            Tile::Penguin(id) => Some(*id),
            _ => None,
        }
    }

    fn to_char(self) -> char {
        match self {
            Tile::Water => '~',
            Tile::Fish(n) => char::from_digit(u32::from(n.min(9)), 10).unwrap_or('9'),
            Tile::Penguin(id) => char::from(b'A' + id.saturating_sub(1)),
        }
    }
}

/// Which generator fills a fresh board
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BoardGenerator {
    /// Every tile is independently water or 1-3 fish, looks like a maze
    Random,
    /// Random walks from the centre, looks like a big icy island
    Island,
}

/// The grid of tiles, stored row by row
#[derive(Serialize, Debug, PartialEq, Eq, Clone, Hash)]
pub struct Board {
    width: i32,
    height: i32,
    grid: Vec<Tile>,
}

impl Board {
    /// Creates a board filled with water
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Board {
            width,
            height,
            grid: vec![Tile::Water; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn is_in_bounds(&self, coords: Coords) -> bool {
        0 <= coords.x && coords.x < self.width && 0 <= coords.y && coords.y < self.height
    }

    /// Index of the tile in the row-major grid, `None` outside the board
    pub fn index(&self, coords: Coords) -> Option<usize> {
        if self.is_in_bounds(coords) {
            Some((coords.y * self.width + coords.x) as usize)
        } else {
            None
        }
    }

    /// Returns the tile at `coords`, `None` outside the board
    pub fn get(&self, coords: Coords) -> Option<Tile> {
        self.index(coords).map(|i| self.grid[i])
    }

    /// Out-of-bounds reads behave like water, which is what every rule wants
    pub fn tile(&self, coords: Coords) -> Tile {
        self.get(coords).unwrap_or(Tile::Water)
    }

    /// Overwrites the tile at `coords`, ignoring out-of-bounds writes
    pub(crate) fn set(&mut self, coords: Coords, tile: Tile) {
        if let Some(i) = self.index(coords) {
            self.grid[i] = tile;
        }
    }

    /// Whether an unoccupied ice floe is at `coords`
    pub fn is_fish_at(&self, coords: Coords) -> bool {
        self.tile(coords).is_fish()
    }

    /// Iterates over all coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coords> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coords::new(x, y)))
    }

    pub fn tiles(&self) -> impl Iterator<Item = (Coords, Tile)> + '_ {
        self.coords().map(move |c| (c, self.tile(c)))
    }

    /// Sum of fish still lying on the board
    pub fn total_fish(&self) -> u32 {
        self.grid.iter().map(Tile::fish).sum()
    }

    /// Fills every tile independently with water or 1-3 fish
    pub fn generate_random(&mut self, rng: &mut dyn RandomSource) {
        for i in 0..self.grid.len() {
            let fish = rng.next_range(0, 3);
            self.grid[i] = if fish > 0 { Tile::Fish(fish as u8) } else { Tile::Water };
        }
    }

    /// Floods the board with water, then lays ice along random walks from the centre
    pub fn generate_island(&mut self, rng: &mut dyn RandomSource) {
        self.grid.iter_mut().for_each(|t| *t = Tile::Water);
        let (w, h) = (self.width, self.height);
        let directions = Direction::all();
        for _ in 0..(w + h) {
            let mut coords = Coords::new(w / 2, h / 2);
            for _ in 0..(w + h) {
                let dir = directions[rng.next_index(directions.len())];
                coords = dir.apply(&coords);
                if !self.is_in_bounds(coords) {
                    break;
                }
                let fish = rng.next_range(1, 3);
                self.set(coords, Tile::Fish(fish as u8));
            }
        }
    }

    pub fn generate(&mut self, generator: BoardGenerator, rng: &mut dyn RandomSource) {
        match generator {
            BoardGenerator::Random => self.generate_random(rng),
            BoardGenerator::Island => self.generate_island(rng),
        }
    }

    /// Parses a text layout, one string per row
    ///
    /// `~` (or any unknown character) is water, `1`-`9` a floe with that many
    /// fish and `A`-`I` a penguin of player 1-9. Rows shorter than the widest
    /// one are padded with water.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;
        let mut board = Board::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let tile = match ch {
                    '1'..='9' => Tile::Fish(ch as u8 - b'0'),
                    'A'..='I' => Tile::Penguin(ch as u8 - b'A' + 1),
                    _ => Tile::Water,
                };
                board.set(Coords::new(x as i32, y as i32), tile);
            }
        }
        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            let row: String = (0..self.width)
                .map(|x| self.tile(Coords::new(x, y)).to_char())
                .collect();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}
