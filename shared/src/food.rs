use crate::config::GameConfig;
use crate::Position;
use log::debug;
use rand::Rng;
use std::collections::HashSet;

/// Random draws before placement gives up on finding a free cell.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 100;

/// The single food item of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Food {
    position: Position,
}

impl Food {
    pub fn new(position: Position) -> Self {
        Self { position }
    }

    /// Food on a random cell not in `occupied`, best effort.
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        config: &GameConfig,
        occupied: &HashSet<Position>,
    ) -> Self {
        let mut food = Self::new(Position::new(0, 0));
        food.relocate(rng, config, occupied);
        food
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Moves to a random grid cell avoiding `occupied`.
    ///
    /// After [`MAX_PLACEMENT_ATTEMPTS`] misses it settles for one more random
    /// cell, even if occupied, and returns `false`.
    pub fn relocate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        config: &GameConfig,
        occupied: &HashSet<Position>,
    ) -> bool {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = random_cell(rng, config);
            if !occupied.contains(&candidate) {
                self.position = candidate;
                return true;
            }
        }

        self.position = random_cell(rng, config);
        debug!(
            "No free cell found after {} attempts, placing food at {}",
            MAX_PLACEMENT_ATTEMPTS, self.position
        );
        false
    }
}

fn random_cell<R: Rng + ?Sized>(rng: &mut R, config: &GameConfig) -> Position {
    let column = rng.gen_range(0..config.board_width);
    let row = rng.gen_range(0..config.board_height);
    config.cell(column, row)
}
