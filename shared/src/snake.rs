//! A single player's snake on the grid.

use crate::protocol::SnakeState;
use crate::{Color, Direction, Position};
use std::collections::VecDeque;

/// Ordered body segments with the head at the front.
///
/// The authoritative side mutates a snake once per tick through
/// [`Snake::advance`]; a mirror only ever replaces it wholesale from
/// snapshot data with [`Snake::overwrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    player_id: String,
    body: VecDeque<Position>,
    direction: Direction,
    /// Moves left on which the tail is kept instead of popped.
    pending_growth: u32,
    is_dead: bool,
    color: Color,
}

impl Snake {
    pub fn new(
        player_id: impl Into<String>,
        head: Position,
        direction: Direction,
        color: Color,
    ) -> Self {
        Self::with_body(player_id, vec![head], direction, color)
    }

    /// Builds a snake from explicit segments, head first.
    pub fn with_body(
        player_id: impl Into<String>,
        body: Vec<Position>,
        direction: Direction,
        color: Color,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            body: body.into(),
            direction,
            pending_growth: 0,
            is_dead: false,
            color,
        }
    }

    pub fn from_state(player_id: impl Into<String>, state: &SnakeState) -> Self {
        let mut snake =
            Self::with_body(player_id, state.body.clone(), state.direction, state.color);
        snake.is_dead = state.is_dead;
        snake
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn head(&self) -> Option<Position> {
        self.body.front().copied()
    }

    pub fn body(&self) -> &VecDeque<Position> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn pending_growth(&self) -> u32 {
        self.pending_growth
    }

    /// Turns the snake unless `direction` would reverse it in place.
    /// Returns whether the direction was accepted.
    pub fn change_direction(&mut self, direction: Direction) -> bool {
        if direction == self.direction.opposite() {
            return false;
        }
        self.direction = direction;
        true
    }

    /// Keeps the tail on the next move.
    pub fn grow(&mut self) {
        self.pending_growth += 1;
    }

    /// Where the head will be after the next move.
    pub fn next_head(&self, grid_size: i32) -> Option<Position> {
        self.head().map(|head| head.offset(self.direction, grid_size))
    }

    /// Moves one cell in the current direction and returns the new head.
    pub fn advance(&mut self, grid_size: i32) -> Option<Position> {
        let new_head = self.next_head(grid_size)?;
        self.body.push_front(new_head);

        if self.pending_growth == 0 {
            self.body.pop_back();
        } else {
            self.pending_growth -= 1;
        }

        Some(new_head)
    }

    /// True when the head overlaps any other segment of this snake.
    pub fn hits_itself(&self) -> bool {
        match self.head() {
            Some(head) => self.body.iter().skip(1).any(|segment| *segment == head),
            None => false,
        }
    }

    pub fn kill(&mut self) {
        self.is_dead = true;
    }

    /// Replaces the body, e.g. when respawning or seeding a test position.
    pub fn set_body(&mut self, body: impl IntoIterator<Item = Position>) {
        self.body = body.into_iter().collect();
    }

    pub fn to_state(&self) -> SnakeState {
        SnakeState {
            body: self.body.iter().copied().collect(),
            direction: self.direction,
            is_dead: self.is_dead,
            color: self.color,
        }
    }

    /// Last-writer-wins replacement from snapshot data.
    pub fn overwrite(&mut self, state: &SnakeState) {
        self.body = state.body.iter().copied().collect();
        self.direction = state.direction;
        self.is_dead = state.is_dead;
        self.color = state.color;
        self.pending_growth = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: i32 = 20;

    fn snake_at(x: i32, y: i32, direction: Direction) -> Snake {
        Snake::new("player1", Position::new(x, y), direction, Color(0, 255, 0))
    }

    #[test]
    fn test_snake_creation() {
        let snake = snake_at(100, 200, Direction::Right);
        assert_eq!(snake.player_id(), "player1");
        assert_eq!(snake.head(), Some(Position::new(100, 200)));
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.direction(), Direction::Right);
        assert!(!snake.is_dead());
        assert_eq!(snake.pending_growth(), 0);
    }

    #[test]
    fn test_reversal_is_rejected_for_every_direction() {
        for current in Direction::ALL {
            for requested in Direction::ALL {
                let mut snake = snake_at(100, 100, current);
                let accepted = snake.change_direction(requested);

                if requested == current.opposite() {
                    assert!(!accepted);
                    assert_eq!(snake.direction(), current);
                } else {
                    assert!(accepted);
                    assert_eq!(snake.direction(), requested);
                }
            }
        }
    }

    #[test]
    fn test_move_up_keeps_old_head_as_neck() {
        let mut snake = Snake::with_body(
            "player1",
            vec![Position::new(100, 100), Position::new(100, 120)],
            Direction::Up,
            Color(0, 255, 0),
        );

        let head = snake.advance(GRID);

        assert_eq!(head, Some(Position::new(100, 80)));
        assert_eq!(
            snake.body().iter().copied().collect::<Vec<_>>(),
            vec![Position::new(100, 80), Position::new(100, 100)]
        );
    }

    #[test]
    fn test_growth_keeps_tail_once() {
        let mut snake = snake_at(100, 100, Direction::Right);
        snake.grow();

        snake.advance(GRID);
        assert_eq!(snake.len(), 2);
        assert_eq!(snake.pending_growth(), 0);

        snake.advance(GRID);
        assert_eq!(snake.len(), 2);
    }

    #[test]
    fn test_stacked_growth() {
        let mut snake = snake_at(100, 100, Direction::Down);
        snake.grow();
        snake.grow();

        snake.advance(GRID);
        snake.advance(GRID);
        snake.advance(GRID);
        assert_eq!(snake.len(), 3);
    }

    #[test]
    fn test_self_collision() {
        let mut snake = Snake::with_body(
            "player1",
            vec![
                Position::new(2 * GRID, 0),
                Position::new(GRID, 0),
                Position::new(GRID, GRID),
                Position::new(2 * GRID, GRID),
                Position::new(3 * GRID, GRID),
            ],
            Direction::Down,
            Color(0, 255, 0),
        );
        assert!(!snake.hits_itself());

        snake.advance(GRID);
        assert!(snake.hits_itself());
    }

    #[test]
    fn test_state_roundtrip_preserves_fields() {
        let mut snake = snake_at(40, 40, Direction::Left);
        snake.kill();

        let state = snake.to_state();
        let rebuilt = Snake::from_state("player1", &state);
        assert_eq!(rebuilt, snake);
    }

    #[test]
    fn test_overwrite_replaces_everything() {
        let mut snake = snake_at(40, 40, Direction::Left);
        snake.grow();

        let state = SnakeState {
            body: vec![Position::new(200, 200), Position::new(200, 220)],
            direction: Direction::Up,
            is_dead: true,
            color: Color(1, 2, 3),
        };
        snake.overwrite(&state);

        assert_eq!(snake.to_state(), state);
        assert_eq!(snake.pending_growth(), 0);
    }

    #[test]
    fn test_empty_body_does_not_move() {
        let mut snake = Snake::with_body("ghost", Vec::new(), Direction::Up, Color(0, 0, 0));
        assert_eq!(snake.advance(GRID), None);
        assert!(!snake.hits_itself());
    }
}
