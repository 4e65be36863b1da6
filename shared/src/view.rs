use crate::{Position, Snake};

/// Read-only access to match state for presentation layers.
///
/// Implemented by the authoritative match and by the client mirror, so a
/// renderer draws single-player, host and client matches the same way.
pub trait MatchView {
    /// Known players in join order.
    fn player_ids(&self) -> &[String];

    fn snake(&self, player_id: &str) -> Option<&Snake>;

    fn food(&self) -> Position;

    fn score(&self) -> u32;

    fn is_game_over(&self) -> bool;

    /// Snakes in roster order.
    fn snakes(&self) -> Vec<&Snake> {
        self.player_ids()
            .iter()
            .filter_map(|id| self.snake(id))
            .collect()
    }

    /// One-line status for logs and text front ends.
    fn summary(&self) -> String {
        let lengths: Vec<String> = self
            .snakes()
            .iter()
            .map(|snake| format!("{}={}", snake.player_id(), snake.len()))
            .collect();
        format!(
            "score {} | food {} | {}{}",
            self.score(),
            self.food(),
            lengths.join(" "),
            if self.is_game_over() { " | GAME OVER" } else { "" }
        )
    }
}
