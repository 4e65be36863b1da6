//! Match parameters fixed for the lifetime of one match.

use crate::Position;
use std::time::Duration;

pub const DEFAULT_GRID_SIZE: i32 = 20;
pub const DEFAULT_BOARD_WIDTH: i32 = 40;
pub const DEFAULT_BOARD_HEIGHT: i32 = 30;
pub const DEFAULT_TICK_RATE: u32 = 10;
pub const MAX_INITIAL_LENGTH: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tick rate must be positive")]
    ZeroTickRate,
    #[error("grid cell size must be positive, got {0}")]
    InvalidGridSize(i32),
    #[error("board must be at least 1x1 cells, got {width}x{height}")]
    InvalidBoard { width: i32, height: i32 },
    #[error("initial snake length must be within 1..={max}, got {length}")]
    InvalidInitialLength { length: usize, max: usize },
}

/// Board geometry and pacing shared by every participant of a match.
///
/// Board dimensions are counted in cells; positions on the board are in
/// pixels and always a multiple of `grid_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub grid_size: i32,
    pub board_width: i32,
    pub board_height: i32,
    pub tick_rate: u32,
    /// Segments a snake is seeded with at (re)spawn.
    pub initial_length: usize,
    /// Fixes food placement for reproducible matches.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            board_width: DEFAULT_BOARD_WIDTH,
            board_height: DEFAULT_BOARD_HEIGHT,
            tick_rate: DEFAULT_TICK_RATE,
            initial_length: 1,
            rng_seed: None,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.grid_size <= 0 {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        if self.board_width <= 0 || self.board_height <= 0 {
            return Err(ConfigError::InvalidBoard {
                width: self.board_width,
                height: self.board_height,
            });
        }
        if !(1..=MAX_INITIAL_LENGTH).contains(&self.initial_length) {
            return Err(ConfigError::InvalidInitialLength {
                length: self.initial_length,
                max: MAX_INITIAL_LENGTH,
            });
        }
        Ok(())
    }

    pub fn width_px(&self) -> i32 {
        self.board_width * self.grid_size
    }

    pub fn height_px(&self) -> i32 {
        self.board_height * self.grid_size
    }

    /// True when `position` lies in `[0, width) x [0, height)` pixels.
    pub fn in_bounds(&self, position: Position) -> bool {
        (0..self.width_px()).contains(&position.x) && (0..self.height_px()).contains(&position.y)
    }

    /// Pixel position of the cell at (`column`, `row`).
    pub fn cell(&self, column: i32, row: i32) -> Position {
        Position::new(column * self.grid_size, row * self.grid_size)
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }
}
