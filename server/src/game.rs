//! Authoritative match simulation

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    player_color, ConfigError, Direction, Food, GameConfig, MatchView, Position, Snake,
    Snapshot,
};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Columns between the spawn points of consecutive players.
pub const SPAWN_SPACING: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Wall,
    SelfCollision,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collision::Wall => f.write_str("hit the wall"),
            Collision::SelfCollision => f.write_str("ran into itself"),
        }
    }
}

/// Result of applying one direction change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Applied,
    /// Reversal, dead snake, or the match is already over.
    Ignored,
    UnknownPlayer,
}

/// What happened during one call to [`GameState::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Players whose snake ate the food this tick, in roster order.
    pub eaten_by: Vec<String>,
    /// Set when this tick ended the match.
    pub game_over: Option<(String, Collision)>,
}

/// Complete state of one match
///
/// Snakes are stepped in roster (join) order. The first collision ends the
/// match immediately: snakes later in the roster do not move on that tick.
#[derive(Debug, Clone)]
pub struct GameState {
    pub tick: u64,
    config: GameConfig,
    snakes: HashMap<String, Snake>,
    player_ids: Vec<String>,
    food: Food,
    score: u32,
    is_game_over: bool,
    rng: StdRng,
}

impl GameState {
    /// Starts a match with one snake per id, in roster order.
    ///
    /// Fails if `config` does not describe a playable board.
    pub fn new<S: AsRef<str>>(
        config: GameConfig,
        player_ids: &[S],
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let food = Food::spawn(&mut rng, &config, &HashSet::new());

        let mut state = Self {
            tick: 0,
            config,
            snakes: HashMap::new(),
            player_ids: Vec::new(),
            food,
            score: 0,
            is_game_over: false,
            rng,
        };

        for player_id in player_ids {
            state.add_player(player_id.as_ref());
        }
        state.respawn_food();
        Ok(state)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Adds a snake for `player_id` at the next spawn point
    ///
    /// Returns false if the player is already in the roster.
    pub fn add_player(&mut self, player_id: &str) -> bool {
        if self.snakes.contains_key(player_id) {
            debug!("Player {} is already in the match", player_id);
            return false;
        }

        let index = self.player_ids.len();
        let snake = self.spawn_snake(player_id, index);
        info!(
            "Added player {} at {}",
            player_id,
            snake.head().unwrap_or(Position::new(0, 0))
        );

        self.player_ids.push(player_id.to_string());
        self.snakes.insert(player_id.to_string(), snake);
        true
    }

    pub fn remove_player(&mut self, player_id: &str) -> bool {
        if self.snakes.remove(player_id).is_none() {
            return false;
        }
        self.player_ids.retain(|id| id != player_id);
        info!("Removed player {}", player_id);
        true
    }

    pub fn contains_player(&self, player_id: &str) -> bool {
        self.snakes.contains_key(player_id)
    }

    /// Requests a direction change for one snake, applied on the next tick.
    pub fn apply_input(&mut self, player_id: &str, direction: Direction) -> InputResult {
        let Some(snake) = self.snakes.get_mut(player_id) else {
            return InputResult::UnknownPlayer;
        };

        if self.is_game_over || snake.is_dead() {
            return InputResult::Ignored;
        }

        if snake.change_direction(direction) {
            InputResult::Applied
        } else {
            debug!("Ignoring reversal to {} for {}", direction, player_id);
            InputResult::Ignored
        }
    }

    /// Advances the match by one tick. Does nothing once the match is over.
    pub fn update(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.is_game_over {
            return report;
        }
        self.tick += 1;

        let grid_size = self.config.grid_size;
        for index in 0..self.player_ids.len() {
            let player_id = self.player_ids[index].clone();
            let Some(snake) = self.snakes.get_mut(&player_id) else {
                continue;
            };
            if snake.is_dead() {
                continue;
            }
            let Some(next_head) = snake.next_head(grid_size) else {
                continue;
            };

            // Growth lands on the same move that reaches the food
            let eats = next_head == self.food.position();
            if eats {
                snake.grow();
            }
            snake.advance(grid_size);

            let collision = if !self.config.in_bounds(next_head) {
                Some(Collision::Wall)
            } else if snake.hits_itself() {
                Some(Collision::SelfCollision)
            } else {
                None
            };

            if let Some(collision) = collision {
                snake.kill();
                self.is_game_over = true;
                info!(
                    "Game over on tick {}: {} {} at {}",
                    self.tick, player_id, collision, next_head
                );
                report.game_over = Some((player_id, collision));
                break;
            }

            if eats {
                self.score += 1;
                debug!("{} ate food at {}, score {}", player_id, next_head, self.score);
                self.respawn_food();
                report.eaten_by.push(player_id);
            }
        }

        report
    }

    /// Full state for broadcast to mirrors.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            snakes: self
                .snakes
                .iter()
                .map(|(id, snake)| (id.clone(), snake.to_state()))
                .collect(),
            food_pos: self.food.position(),
            score: self.score,
            is_game_over: self.is_game_over,
            player_ids: self.player_ids.clone(),
        }
    }

    /// Restarts the match with the same roster.
    pub fn reset(&mut self) {
        for (index, player_id) in self.player_ids.iter().enumerate() {
            let snake = self.spawn_snake(player_id, index);
            self.snakes.insert(player_id.clone(), snake);
        }
        self.tick = 0;
        self.score = 0;
        self.is_game_over = false;
        self.respawn_food();
        info!("Match reset with {} players", self.player_ids.len());
    }

    /// Every cell covered by any snake.
    pub fn occupied_cells(&self) -> HashSet<Position> {
        self.snakes
            .values()
            .flat_map(|snake| snake.body().iter().copied())
            .collect()
    }

    pub fn snake_mut(&mut self, player_id: &str) -> Option<&mut Snake> {
        self.snakes.get_mut(player_id)
    }

    /// Places the food explicitly, e.g. to script a scenario.
    pub fn set_food_position(&mut self, position: Position) {
        self.food.set_position(position);
    }

    /// Spawn point for roster slot `index`: centre row, columns staggered by
    /// [`SPAWN_SPACING`], heading right with the tail trailing left.
    fn spawn_snake(&self, player_id: &str, index: usize) -> Snake {
        let config = &self.config;
        let offset = (index as i32).saturating_mul(SPAWN_SPACING);
        let column = (config.board_width / 2 + offset).rem_euclid(config.board_width);
        let row = config.board_height / 2;

        let body: Vec<Position> = (0..config.initial_length as i32)
            .map(|back| column - back)
            .take_while(|c| *c >= 0)
            .map(|c| config.cell(c, row))
            .collect();

        Snake::with_body(player_id, body, Direction::Right, player_color(index))
    }

    fn respawn_food(&mut self) {
        let occupied = self.occupied_cells();
        self.food.relocate(&mut self.rng, &self.config, &occupied);
    }
}

impl MatchView for GameState {
    fn player_ids(&self) -> &[String] {
        &self.player_ids
    }

    fn snake(&self, player_id: &str) -> Option<&Snake> {
        self.snakes.get(player_id)
    }

    fn food(&self) -> Position {
        self.food.position()
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
    use shared::{Color, PLAYER_COLORS};

    const GRID: i32 = 20;

    fn seeded_config() -> GameConfig {
        GameConfig {
            rng_seed: Some(42),
            ..GameConfig::default()
        }
    }

    fn solo() -> GameState {
        GameState::new(seeded_config(), &["player1"]).unwrap()
    }

    /// Puts a one-segment snake at `head` and parks the food out of the way.
    fn place(state: &mut GameState, player_id: &str, head: Position, direction: Direction) {
        let snake = state.snake_mut(player_id).unwrap();
        snake.set_body([head]);
        snake.change_direction(direction);
        // Turn twice if the requested direction was a reversal
        if snake.direction() != direction {
            snake.change_direction(Direction::Up);
            snake.change_direction(direction);
        }
        state.set_food_position(Position::new(0, 0));
    }

    fn body(state: &GameState, player_id: &str) -> Vec<Position> {
        state
            .snake(player_id)
            .unwrap()
            .body()
            .iter()
            .copied()
            .collect()
    }

    #[test]
    fn test_game_state_creation() {
        let state = solo();
        assert_eq!(state.tick, 0);
        assert_eq!(state.player_ids(), ["player1".to_string()]);
        assert_eq!(state.score(), 0);
        assert!(!state.is_game_over());

        let snake = state.snake("player1").unwrap();
        assert_eq!(snake.head(), Some(Position::new(400, 300)));
        assert_eq!(snake.direction(), Direction::Right);
        assert_eq!(snake.len(), 1);
    }

    #[test]
    fn test_food_spawns_on_free_grid_cell() {
        let state = solo();
        let food = state.food();
        assert!(state.config().in_bounds(food));
        assert_eq!(food.x % GRID, 0);
        assert_eq!(food.y % GRID, 0);
        assert!(!state.occupied_cells().contains(&food));
    }

    #[test]
    fn test_movement_is_deterministic() {
        let mut a = solo();
        let mut b = solo();
        place(&mut a, "player1", Position::new(200, 200), Direction::Down);
        place(&mut b, "player1", Position::new(200, 200), Direction::Down);

        for _ in 0..5 {
            a.update();
            b.update();
        }

        assert_eq!(body(&a, "player1"), vec![Position::new(200, 300)]);
        assert_eq!(body(&a, "player1"), body(&b, "player1"));
    }

    #[test]
    fn test_reversal_input_is_ignored() {
        let mut state = solo();
        assert_eq!(
            state.apply_input("player1", Direction::Left),
            InputResult::Ignored
        );
        assert_eq!(state.apply_input("player1", Direction::Up), InputResult::Applied);
        assert_eq!(
            state.snake("player1").unwrap().direction(),
            Direction::Up
        );
    }

    #[test]
    fn test_unknown_player_input() {
        let mut state = solo();
        assert_eq!(
            state.apply_input("player9", Direction::Up),
            InputResult::UnknownPlayer
        );
    }

    #[test]
    fn test_eating_grows_on_same_tick_and_moves_food() {
        let mut state = solo();
        place(&mut state, "player1", Position::new(100, 100), Direction::Right);
        state.set_food_position(Position::new(120, 100));

        let report = state.update();

        assert_eq!(report.eaten_by, vec!["player1".to_string()]);
        assert_eq!(state.score(), 1);
        assert_eq!(
            body(&state, "player1"),
            vec![Position::new(120, 100), Position::new(100, 100)]
        );
        assert_ne!(state.food(), Position::new(120, 100));
        assert!(!state.occupied_cells().contains(&state.food()));

        // The gained segment is kept on later moves
        state.set_food_position(Position::new(700, 500));
        state.update();
        assert_eq!(state.snake("player1").unwrap().len(), 2);
    }

    #[test]
    fn test_wall_collision_ends_match() {
        let mut state = solo();
        place(&mut state, "player1", Position::new(760, 300), Direction::Right);

        // Reaching the last column is still legal
        let report = state.update();
        assert_eq!(report.game_over, None);
        assert!(!state.is_game_over());
        assert_eq!(body(&state, "player1"), vec![Position::new(780, 300)]);

        let report = state.update();
        assert_eq!(
            report.game_over,
            Some(("player1".to_string(), Collision::Wall))
        );
        assert!(state.is_game_over());
        assert!(state.snake("player1").unwrap().is_dead());
    }

    #[test]
    fn test_top_edge_is_a_wall() {
        let mut state = solo();
        place(&mut state, "player1", Position::new(300, 20), Direction::Up);

        state.update();
        assert!(!state.is_game_over());
        assert_eq!(body(&state, "player1"), vec![Position::new(300, 0)]);

        state.update();
        assert!(state.is_game_over());
    }

    #[test]
    fn test_self_collision_ends_match() {
        let mut state = solo();
        {
            let snake = state.snake_mut("player1").unwrap();
            snake.set_body([
                Position::new(2 * GRID, 0),
                Position::new(GRID, 0),
                Position::new(GRID, GRID),
                Position::new(2 * GRID, GRID),
                Position::new(3 * GRID, GRID),
            ]);
            snake.change_direction(Direction::Down);
        }
        state.set_food_position(Position::new(700, 500));

        let report = state.update();
        assert_eq!(
            report.game_over,
            Some(("player1".to_string(), Collision::SelfCollision))
        );
    }

    #[test]
    fn test_update_after_game_over_is_a_no_op() {
        let mut state = solo();
        place(&mut state, "player1", Position::new(0, 300), Direction::Left);
        state.update();
        assert!(state.is_game_over());

        let frozen = state.snapshot();
        let report = state.update();
        assert_eq!(report, TickReport::default());
        assert_eq!(state.snapshot(), frozen);
        assert_eq!(
            state.apply_input("player1", Direction::Up),
            InputResult::Ignored
        );
    }

    #[test]
    fn test_snakes_pass_through_each_other() {
        let mut state = GameState::new(seeded_config(), &["player1", "player2"]).unwrap();
        place(&mut state, "player1", Position::new(40, 40), Direction::Right);
        place(&mut state, "player2", Position::new(60, 40), Direction::Left);
        state.set_food_position(Position::new(700, 500));

        let report = state.update();

        assert_eq!(report.game_over, None);
        assert_eq!(body(&state, "player1"), vec![Position::new(60, 40)]);
        assert_eq!(body(&state, "player2"), vec![Position::new(40, 40)]);
    }

    #[test]
    fn test_collision_stops_later_snakes_this_tick() {
        let mut state = GameState::new(seeded_config(), &["player1", "player2"]).unwrap();
        place(&mut state, "player1", Position::new(780, 100), Direction::Right);
        place(&mut state, "player2", Position::new(200, 200), Direction::Down);
        state.set_food_position(Position::new(700, 500));

        state.update();

        assert!(state.is_game_over());
        assert_eq!(body(&state, "player2"), vec![Position::new(200, 200)]);
    }

    #[test]
    fn test_players_get_distinct_colors_and_spawns() {
        let state =
            GameState::new(seeded_config(), &["player1", "player2", "player3"]).unwrap();
        let snakes = state.snakes();

        assert_eq!(snakes[0].color(), PLAYER_COLORS[0]);
        assert_eq!(snakes[1].color(), PLAYER_COLORS[1]);
        assert_ne!(snakes[1].color(), snakes[2].color());
        assert_eq!(snakes[1].head(), Some(Position::new(500, 300)));

        let heads: HashSet<_> = snakes.iter().filter_map(|s| s.head()).collect();
        assert_eq!(heads.len(), 3);
    }

    #[test]
    fn test_unplayable_board_is_rejected() {
        let config = GameConfig {
            board_width: 0,
            ..seeded_config()
        };
        assert_eq!(
            GameState::new(config, &["player1"]).unwrap_err(),
            ConfigError::InvalidBoard {
                width: 0,
                height: 30
            }
        );

        let config = GameConfig {
            initial_length: 0,
            ..seeded_config()
        };
        assert!(GameState::new(config, &["player1"]).is_err());
    }

    #[test]
    fn test_initial_length_trails_left() {
        let config = GameConfig {
            initial_length: 3,
            ..seeded_config()
        };
        let state = GameState::new(config, &["player1"]).unwrap();
        assert_eq!(
            body(&state, "player1"),
            vec![
                Position::new(400, 300),
                Position::new(380, 300),
                Position::new(360, 300)
            ]
        );
    }

    #[test]
    fn test_add_and_remove_players() {
        let mut state = solo();
        assert!(state.add_player("player2"));
        assert!(!state.add_player("player2"));
        assert_eq!(state.player_ids().len(), 2);

        assert!(state.remove_player("player2"));
        assert!(!state.remove_player("player2"));
        assert_eq!(state.player_ids(), ["player1".to_string()]);
        assert!(state.snapshot().snakes.get("player2").is_none());
    }

    #[test]
    fn test_reset_restores_fresh_match() {
        let mut state = GameState::new(seeded_config(), &["player1", "player2"]).unwrap();
        place(&mut state, "player1", Position::new(780, 100), Direction::Right);
        state.update();
        assert!(state.is_game_over());

        state.reset();

        assert!(!state.is_game_over());
        assert_eq!(state.score(), 0);
        assert_eq!(state.tick, 0);
        assert_eq!(state.player_ids().len(), 2);
        let snake = state.snake("player1").unwrap();
        assert!(!snake.is_dead());
        assert_eq!(snake.head(), Some(Position::new(400, 300)));
        assert_eq!(snake.color(), Color(0, 255, 0));
    }

    #[test]
    fn test_snapshot_mirrors_state() {
        let state = GameState::new(seeded_config(), &["player1", "player2"]).unwrap();
        let snapshot = state.snapshot();

        assert_eq!(snapshot.player_ids, vec!["player1", "player2"]);
        assert_eq!(snapshot.snakes.len(), 2);
        assert_eq!(snapshot.food_pos, state.food());
        assert_eq!(
            snapshot.snakes["player1"],
            state.snake("player1").unwrap().to_state()
        );
    }

    /// One player heading right at (100, 100) with food one cell ahead
    #[test]
    fn test_single_tick_scenario() {
        let mut state = solo();
        place(&mut state, "player1", Position::new(100, 100), Direction::Right);
        state.set_food_position(Position::new(120, 100));

        state.update();
        let snapshot = state.snapshot();

        let snake = &snapshot.snakes["player1"];
        assert_eq!(snake.body[0], Position::new(120, 100));
        assert_eq!(snake.body.len(), 2);
        assert_eq!(snapshot.score, 1);
        assert!(!snapshot.is_game_over);
        assert_ne!(snapshot.food_pos, Position::new(120, 100));
        assert!(!snake.body.contains(&snapshot.food_pos));
    }
}
