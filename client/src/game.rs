use log::debug;
use shared::{MatchView, Position, Snake, Snapshot};
use std::collections::HashMap;

/// Local mirror of the host's match
///
/// Never simulated. Each snapshot replaces the previous state wholesale, so
/// applying the same snapshot twice leaves the mirror unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientGameState {
    snakes: HashMap<String, Snake>,
    player_ids: Vec<String>,
    food: Position,
    score: u32,
    is_game_over: bool,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            snakes: HashMap::new(),
            player_ids: Vec::new(),
            food: Position::new(0, 0),
            score: 0,
            is_game_over: false,
        }
    }

    /// Overwrites the mirror with `snapshot`
    ///
    /// Snakes for players no longer listed are dropped, newly listed players
    /// are created from the snapshot data.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        self.snakes.retain(|id, _| {
            snapshot.snakes.contains_key(id) && snapshot.player_ids.contains(id)
        });

        for player_id in &snapshot.player_ids {
            let Some(state) = snapshot.snakes.get(player_id) else {
                debug!("Snapshot lists {} without snake data", player_id);
                continue;
            };

            match self.snakes.get_mut(player_id) {
                Some(snake) => snake.overwrite(state),
                None => {
                    debug!("Mirroring new player {}", player_id);
                    self.snakes
                        .insert(player_id.clone(), Snake::from_state(player_id.as_str(), state));
                }
            }
        }

        for player_id in snapshot.snakes.keys() {
            if !snapshot.player_ids.contains(player_id) {
                debug!("Ignoring snake for unlisted player {}", player_id);
            }
        }

        self.player_ids = snapshot.player_ids.clone();
        self.food = snapshot.food_pos;
        self.score = snapshot.score;
        self.is_game_over = snapshot.is_game_over;
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchView for ClientGameState {
    fn player_ids(&self) -> &[String] {
        &self.player_ids
    }

    fn snake(&self, player_id: &str) -> Option<&Snake> {
        self.snakes.get(player_id)
    }

    fn food(&self) -> Position {
        self.food
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn is_game_over(&self) -> bool {
        self.is_game_over
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Color, Direction, SnakeState};

    fn snake_state(cells: &[(i32, i32)], direction: Direction) -> SnakeState {
        SnakeState {
            body: cells.iter().map(|&(x, y)| Position::new(x, y)).collect(),
            direction,
            is_dead: false,
            color: Color(0, 255, 0),
        }
    }

    fn snapshot(players: &[(&str, SnakeState)], food: (i32, i32), score: u32) -> Snapshot {
        Snapshot {
            snakes: players
                .iter()
                .map(|(id, state)| (id.to_string(), state.clone()))
                .collect(),
            food_pos: Position::new(food.0, food.1),
            score,
            is_game_over: false,
            player_ids: players.iter().map(|(id, _)| id.to_string()).collect(),
        }
    }

    #[test]
    fn test_new_mirror_is_empty() {
        let state = ClientGameState::new();
        assert!(state.player_ids().is_empty());
        assert_eq!(state.score(), 0);
        assert!(!state.is_game_over());
    }

    #[test]
    fn test_snapshot_creates_players() {
        let mut state = ClientGameState::new();
        let snap = snapshot(
            &[
                ("player1", snake_state(&[(100, 100), (80, 100)], Direction::Right)),
                ("player2", snake_state(&[(300, 300)], Direction::Up)),
            ],
            (200, 200),
            4,
        );

        state.apply_snapshot(&snap);

        assert_eq!(state.player_ids(), ["player1", "player2"]);
        assert_eq!(state.food(), Position::new(200, 200));
        assert_eq!(state.score(), 4);
        let snake = state.snake("player1").unwrap();
        assert_eq!(snake.len(), 2);
        assert_eq!(snake.direction(), Direction::Right);
    }

    #[test]
    fn test_snapshot_overwrites_and_removes() {
        let mut state = ClientGameState::new();
        state.apply_snapshot(&snapshot(
            &[
                ("player1", snake_state(&[(100, 100)], Direction::Right)),
                ("player2", snake_state(&[(300, 300)], Direction::Up)),
            ],
            (200, 200),
            0,
        ));

        let mut later = snapshot(
            &[("player1", snake_state(&[(120, 100), (100, 100)], Direction::Down))],
            (40, 40),
            1,
        );
        later.is_game_over = true;
        state.apply_snapshot(&later);

        assert_eq!(state.player_ids(), ["player1"]);
        assert!(state.snake("player2").is_none());
        assert_eq!(
            state.snake("player1").unwrap().to_state(),
            later.snakes["player1"]
        );
        assert!(state.is_game_over());
    }

    #[test]
    fn test_applying_twice_is_idempotent() {
        let snap = snapshot(
            &[("player1", snake_state(&[(100, 100)], Direction::Left))],
            (20, 20),
            2,
        );

        let mut once = ClientGameState::new();
        once.apply_snapshot(&snap);
        let mut twice = once.clone();
        twice.apply_snapshot(&snap);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_unlisted_snake_is_ignored() {
        let mut snap = snapshot(
            &[("player1", snake_state(&[(100, 100)], Direction::Left))],
            (20, 20),
            0,
        );
        snap.snakes
            .insert("ghost".to_string(), snake_state(&[(0, 0)], Direction::Up));

        let mut state = ClientGameState::new();
        state.apply_snapshot(&snap);

        assert!(state.snake("ghost").is_none());
        assert_eq!(state.snakes().len(), 1);
    }
}
