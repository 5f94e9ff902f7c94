//! Client-side world model rebuilt from the server's Turn events.

use log::{debug, warn};
use shared::{
    explosion_cells, Bomb, BombId, Event, GameParameters, Player, PlayerId, Position, Score,
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    pub turn: u16,
    pub player_positions: BTreeMap<PlayerId, Position>,
    pub players: BTreeMap<PlayerId, Player>,
    pub blocks: BTreeSet<Position>,
    pub bombs: BTreeMap<BombId, Bomb>,
    pub explosions: BTreeSet<Position>,
    pub scores: BTreeMap<PlayerId, Score>,
}

impl GameState {
    /// Fresh state for a game between `players`. Every player starts with a
    /// zero score at (0, 0) until the server reports a position.
    pub fn new(players: BTreeMap<PlayerId, Player>) -> Self {
        let scores = players.keys().map(|id| (*id, 0)).collect();
        let player_positions = players.keys().map(|id| (*id, Position::default())).collect();

        Self {
            turn: 0,
            player_positions,
            players,
            blocks: BTreeSet::new(),
            bombs: BTreeMap::new(),
            explosions: BTreeSet::new(),
            scores,
        }
    }

    /// Applies one Turn.
    ///
    /// Bomb timers tick first, then events replay in order. Robots and
    /// blocks destroyed by explosions are collected into sets and only
    /// settled after the last event, so a victim hit by several bombs in one
    /// turn scores once and later blasts in the same turn still see blocks
    /// destroyed by earlier ones.
    pub fn apply_turn(&mut self, turn: u16, events: &[Event], parameters: &GameParameters) {
        for bomb in self.bombs.values_mut() {
            bomb.timer = bomb.timer.wrapping_sub(1);
        }

        self.turn = turn;

        let mut robots_destroyed = BTreeSet::new();
        let mut blocks_destroyed = BTreeSet::new();

        for event in events {
            match event {
                Event::BombPlaced { bomb_id, position } => {
                    self.bombs
                        .insert(*bomb_id, Bomb::new(*position, parameters.bomb_timer));
                }
                Event::BombExploded {
                    bomb_id,
                    robots_destroyed: robots,
                    blocks_destroyed: blocks,
                } => {
                    match self.bombs.remove(bomb_id) {
                        Some(bomb) => self.explosions.extend(explosion_cells(
                            bomb.position,
                            parameters.explosion_radius,
                            parameters.size_x,
                            parameters.size_y,
                            &self.blocks,
                        )),
                        None => warn!("Explosion of unknown bomb {}", bomb_id),
                    }
                    robots_destroyed.extend(robots.iter().copied());
                    blocks_destroyed.extend(blocks.iter().copied());
                }
                Event::PlayerMoved {
                    player_id,
                    position,
                } => {
                    self.player_positions.insert(*player_id, *position);
                }
                Event::BlockPlaced { position } => {
                    self.blocks.insert(*position);
                }
            }
        }

        for id in robots_destroyed {
            *self.scores.entry(id).or_insert(0) += 1;
        }
        for block in &blocks_destroyed {
            self.blocks.remove(block);
        }

        debug!(
            "Turn {}: {} bombs, {} blocks, {} explosion cells",
            self.turn,
            self.bombs.len(),
            self.blocks.len(),
            self.explosions.len()
        );
    }

    /// Players whose locally aggregated score differs from `reported`, as
    /// `(id, local, reported)`.
    pub fn score_mismatches(
        &self,
        reported: &BTreeMap<PlayerId, Score>,
    ) -> Vec<(PlayerId, Option<Score>, Option<Score>)> {
        let ids: BTreeSet<PlayerId> = self.scores.keys().chain(reported.keys()).copied().collect();

        ids.into_iter()
            .filter_map(|id| {
                let local = self.scores.get(&id).copied();
                let remote = reported.get(&id).copied();
                (local != remote).then_some((id, local, remote))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameters() -> GameParameters {
        GameParameters {
            server_name: "S".to_string(),
            players_count: 2,
            size_x: 10,
            size_y: 10,
            game_length: 100,
            explosion_radius: 2,
            bomb_timer: 5,
        }
    }

    fn roster() -> BTreeMap<PlayerId, Player> {
        [(0, Player::new("A", "a")), (1, Player::new("B", "b"))]
            .into_iter()
            .collect()
    }

    fn exploded(bomb_id: BombId, robots: Vec<PlayerId>, blocks: Vec<Position>) -> Event {
        Event::BombExploded {
            bomb_id,
            robots_destroyed: robots,
            blocks_destroyed: blocks,
        }
    }

    #[test]
    fn test_new_state_defaults() {
        let state = GameState::new(roster());
        assert_eq!(state.turn, 0);
        assert_eq!(state.scores.values().copied().collect::<Vec<_>>(), vec![0, 0]);
        assert!(state
            .player_positions
            .values()
            .all(|p| *p == Position::new(0, 0)));
        assert!(state.bombs.is_empty() && state.blocks.is_empty());
    }

    #[test]
    fn test_bomb_placed_uses_configured_timer() {
        let mut state = GameState::new(roster());
        let events = [Event::BombPlaced {
            bomb_id: 7,
            position: Position::new(3, 3),
        }];
        state.apply_turn(1, &events, &parameters());

        assert_eq!(state.turn, 1);
        assert_eq!(state.bombs.len(), 1);
        assert_eq!(state.bombs[&7], Bomb::new(Position::new(3, 3), 5));
    }

    #[test]
    fn test_timers_tick_once_per_turn() {
        let mut state = GameState::new(roster());
        let place = [Event::BombPlaced {
            bomb_id: 1,
            position: Position::new(0, 0),
        }];
        state.apply_turn(1, &place, &parameters());
        state.apply_turn(2, &[], &parameters());
        state.apply_turn(3, &[], &parameters());

        assert_eq!(state.bombs[&1].timer, 3);
    }

    #[test]
    fn test_player_moved_replaces_position() {
        let mut state = GameState::new(roster());
        let events = [Event::PlayerMoved {
            player_id: 1,
            position: Position::new(4, 2),
        }];
        state.apply_turn(1, &events, &parameters());

        assert_eq!(state.player_positions[&1], Position::new(4, 2));
        assert_eq!(state.player_positions[&0], Position::new(0, 0));
    }

    #[test]
    fn test_explosion_marks_cells_and_removes_bomb() {
        let mut state = GameState::new(roster());
        state.bombs.insert(1, Bomb::new(Position::new(5, 5), 1));
        state.apply_turn(2, &[exploded(1, vec![], vec![])], &parameters());

        assert!(state.bombs.is_empty());
        assert_eq!(state.explosions.len(), 4 * 2 + 1);
    }

    #[test]
    fn test_double_kill_in_one_turn_scores_once() {
        let mut state = GameState::new(roster());
        state.bombs.insert(1, Bomb::new(Position::new(1, 1), 1));
        state.bombs.insert(2, Bomb::new(Position::new(2, 2), 1));

        let events = [exploded(1, vec![0], vec![]), exploded(2, vec![0, 1], vec![])];
        state.apply_turn(3, &events, &parameters());

        assert_eq!(state.scores[&0], 1);
        assert_eq!(state.scores[&1], 1);
    }

    #[test]
    fn test_block_destroyed_twice_removed_once() {
        let mut state = GameState::new(roster());
        let block = Position::new(3, 4);
        let other = Position::new(9, 9);
        state.blocks.insert(block);
        state.blocks.insert(other);
        state.bombs.insert(1, Bomb::new(Position::new(3, 3), 1));
        state.bombs.insert(2, Bomb::new(Position::new(3, 5), 1));

        let events = [exploded(1, vec![], vec![block]), exploded(2, vec![], vec![block])];
        state.apply_turn(3, &events, &parameters());

        assert_eq!(state.blocks.len(), 1);
        assert!(state.blocks.contains(&other));
    }

    #[test]
    fn test_blocks_removed_after_all_events() {
        // Bomb 1 destroys the block, yet it still stops bomb 2's downward
        // arm because removal only happens once the turn is replayed.
        let mut state = GameState::new(roster());
        let block = Position::new(5, 6);
        state.blocks.insert(block);
        state.bombs.insert(1, Bomb::new(Position::new(4, 6), 1));
        state.bombs.insert(2, Bomb::new(Position::new(5, 7), 1));

        let events = [exploded(1, vec![], vec![block]), exploded(2, vec![], vec![])];
        state.apply_turn(3, &events, &parameters());

        assert!(!state.blocks.contains(&block));
        assert!(state.explosions.contains(&block));
        assert!(!state.explosions.contains(&Position::new(5, 5)));
    }

    #[test]
    fn test_explosions_accumulate_within_state() {
        let mut state = GameState::new(roster());
        state.bombs.insert(1, Bomb::new(Position::new(0, 0), 1));
        state.apply_turn(1, &[exploded(1, vec![], vec![])], &parameters());
        let first = state.explosions.len();

        state.apply_turn(2, &[], &parameters());
        assert_eq!(state.explosions.len(), first);
    }

    #[test]
    fn test_unknown_bomb_still_counts_victims() {
        let mut state = GameState::new(roster());
        let block = Position::new(1, 1);
        state.blocks.insert(block);
        state.apply_turn(1, &[exploded(42, vec![1], vec![block])], &parameters());

        assert!(state.explosions.is_empty());
        assert_eq!(state.scores[&1], 1);
        assert!(state.blocks.is_empty());
    }

    #[test]
    fn test_block_placed() {
        let mut state = GameState::new(roster());
        let events = [Event::BlockPlaced {
            position: Position::new(2, 2),
        }];
        state.apply_turn(1, &events, &parameters());
        assert!(state.blocks.contains(&Position::new(2, 2)));
    }

    #[test]
    fn test_score_mismatches() {
        let mut state = GameState::new(roster());
        state.scores.insert(0, 2);

        let matching: BTreeMap<_, _> = [(0, 2), (1, 0)].into_iter().collect();
        assert!(state.score_mismatches(&matching).is_empty());

        let differing: BTreeMap<_, _> = [(0, 1), (1, 0)].into_iter().collect();
        assert_eq!(state.score_mismatches(&differing), vec![(0, Some(2), Some(1))]);

        let missing: BTreeMap<_, _> = [(0, 2)].into_iter().collect();
        assert_eq!(state.score_mismatches(&missing), vec![(1, Some(0), None)]);
    }
}
