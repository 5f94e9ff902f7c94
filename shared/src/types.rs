//! Plain data types shared by the client and the server.

/// Player identifier assigned by the server, 0-based and dense.
pub type PlayerId = u8;
/// Bomb identifier assigned by the server.
pub type BombId = u32;
/// Number of times a player's robot has been destroyed.
pub type Score = u32;

/// A cell on the board.
///
/// Ordering is x-major, y-minor so positions can key ordered sets and maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring cell in `direction`, or `None` if it would
    /// leave a `size_x` by `size_y` board.
    pub fn step(self, direction: Direction, size_x: u16, size_y: u16) -> Option<Position> {
        let (x, y) = match direction {
            Direction::Up => (Some(self.x), self.y.checked_add(1)),
            Direction::Right => (self.x.checked_add(1), Some(self.y)),
            Direction::Down => (Some(self.x), self.y.checked_sub(1)),
            Direction::Left => (self.x.checked_sub(1), Some(self.y)),
        };

        match (x, y) {
            (Some(x), Some(y)) if x < size_x && y < size_y => Some(Position { x, y }),
            _ => None,
        }
    }
}

/// Movement direction carried by Move messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];
}

impl TryFrom<u8> for Direction {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Right),
            2 => Ok(Direction::Down),
            3 => Ok(Direction::Left),
            other => Err(other),
        }
    }
}

/// A participant as announced by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub address: String,
}

impl Player {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// A live bomb and the number of turns left on its fuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bomb {
    pub position: Position,
    pub timer: u16,
}

impl Bomb {
    pub fn new(position: Position, timer: u16) -> Self {
        Self { position, timer }
    }
}

/// Match configuration announced once in the server's Hello.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameParameters {
    pub server_name: String,
    pub players_count: u8,
    pub size_x: u16,
    pub size_y: u16,
    pub game_length: u16,
    pub explosion_radius: u16,
    pub bomb_timer: u16,
}
