use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    explosion_cells, Bomb, BombId, ClientMessage, Event, GameParameters, PlayerId, Position,
    Score, ServerMessage,
};
use std::collections::{BTreeMap, BTreeSet};

/// Id handed to the only peer.
pub const PLAYER_ID: PlayerId = 0;

/// Authoritative state of a single-player game.
pub struct ServerGame {
    parameters: GameParameters,
    initial_blocks: u16,
    rng: StdRng,
    turn: u16,
    position: Position,
    blocks: BTreeSet<Position>,
    bombs: BTreeMap<BombId, Bomb>,
    next_bomb_id: BombId,
    pending: Option<ClientMessage>,
    score: Score,
}

impl ServerGame {
    pub fn new(parameters: GameParameters, initial_blocks: u16, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            parameters,
            initial_blocks,
            rng,
            turn: 0,
            position: Position::default(),
            blocks: BTreeSet::new(),
            bombs: BTreeMap::new(),
            next_bomb_id: 0,
            pending: None,
            score: 0,
        }
    }

    pub fn turn(&self) -> u16 {
        self.turn
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn blocks(&self) -> &BTreeSet<Position> {
        &self.blocks
    }

    fn random_position(&mut self) -> Position {
        Position::new(
            self.rng.gen_range(0..self.parameters.size_x),
            self.rng.gen_range(0..self.parameters.size_y),
        )
    }

    /// Resets the board and returns turn 0: the player's spawn followed by
    /// the initial blocks. Draws landing on an existing block are skipped.
    pub fn start(&mut self) -> ServerMessage {
        self.turn = 0;
        self.blocks.clear();
        self.bombs.clear();
        self.next_bomb_id = 0;
        self.pending = None;
        self.score = 0;

        self.position = self.random_position();
        let mut events = vec![Event::PlayerMoved {
            player_id: PLAYER_ID,
            position: self.position,
        }];

        for _ in 0..self.initial_blocks {
            let position = self.random_position();
            if self.blocks.insert(position) {
                events.push(Event::BlockPlaced { position });
            }
        }

        info!(
            "Game started: player at {:?}, {} blocks",
            self.position,
            self.blocks.len()
        );

        ServerMessage::Turn { turn: 0, events }
    }

    /// Remembers the peer's latest action; only the last one per turn counts.
    pub fn record_action(&mut self, message: ClientMessage) {
        if !matches!(message, ClientMessage::Join { .. }) {
            self.pending = Some(message);
        }
    }

    /// Advances one turn and returns its events.
    pub fn next_turn(&mut self) -> ServerMessage {
        self.turn = self.turn.wrapping_add(1);
        let mut events = Vec::new();

        for bomb in self.bombs.values_mut() {
            bomb.timer = bomb.timer.saturating_sub(1);
        }

        let exploding: Vec<BombId> = self
            .bombs
            .iter()
            .filter(|(_, bomb)| bomb.timer == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut robot_destroyed = false;
        let mut blocks_destroyed = BTreeSet::new();

        for bomb_id in exploding {
            let Some(bomb) = self.bombs.remove(&bomb_id) else {
                continue;
            };
            let cells = explosion_cells(
                bomb.position,
                self.parameters.explosion_radius,
                self.parameters.size_x,
                self.parameters.size_y,
                &self.blocks,
            );

            let robots: Vec<PlayerId> = if cells.contains(&self.position) {
                robot_destroyed = true;
                vec![PLAYER_ID]
            } else {
                Vec::new()
            };
            let blocks: Vec<Position> = cells.intersection(&self.blocks).copied().collect();
            blocks_destroyed.extend(blocks.iter().copied());

            events.push(Event::BombExploded {
                bomb_id,
                robots_destroyed: robots,
                blocks_destroyed: blocks,
            });
        }

        for block in &blocks_destroyed {
            self.blocks.remove(block);
        }

        let action = self.pending.take();
        if robot_destroyed {
            self.score += 1;
            self.position = self.random_position();
            events.push(Event::PlayerMoved {
                player_id: PLAYER_ID,
                position: self.position,
            });
        } else if let Some(action) = action {
            self.apply_action(action, &mut events);
        }

        debug!("Turn {}: {} events", self.turn, events.len());

        ServerMessage::Turn {
            turn: self.turn,
            events,
        }
    }

    fn apply_action(&mut self, action: ClientMessage, events: &mut Vec<Event>) {
        match action {
            ClientMessage::PlaceBomb => {
                let bomb_id = self.next_bomb_id;
                self.next_bomb_id = self.next_bomb_id.wrapping_add(1);
                self.bombs
                    .insert(bomb_id, Bomb::new(self.position, self.parameters.bomb_timer));
                events.push(Event::BombPlaced {
                    bomb_id,
                    position: self.position,
                });
            }
            ClientMessage::PlaceBlock => {
                if self.blocks.insert(self.position) {
                    events.push(Event::BlockPlaced {
                        position: self.position,
                    });
                }
            }
            ClientMessage::Move { direction } => {
                let target =
                    self.position
                        .step(direction, self.parameters.size_x, self.parameters.size_y);
                if let Some(target) = target.filter(|p| !self.blocks.contains(p)) {
                    self.position = target;
                    events.push(Event::PlayerMoved {
                        player_id: PLAYER_ID,
                        position: target,
                    });
                }
            }
            ClientMessage::Join { .. } => {}
        }
    }

    pub fn is_finished(&self) -> bool {
        self.turn >= self.parameters.game_length
    }

    /// Times the player's robot was destroyed.
    pub fn scores(&self) -> BTreeMap<PlayerId, Score> {
        [(PLAYER_ID, self.score)].into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Direction;

    fn game(initial_blocks: u16) -> ServerGame {
        let parameters = GameParameters {
            server_name: "test".to_string(),
            players_count: 1,
            size_x: 8,
            size_y: 8,
            game_length: 20,
            explosion_radius: 2,
            bomb_timer: 2,
        };
        ServerGame::new(parameters, initial_blocks, Some(42))
    }

    fn events(message: ServerMessage) -> Vec<Event> {
        match message {
            ServerMessage::Turn { events, .. } => events,
            other => panic!("expected a Turn, got {:?}", other),
        }
    }

    #[test]
    fn test_start_places_player_then_blocks() {
        let mut game = game(5);
        let events = events(game.start());

        assert!(matches!(events[0], Event::PlayerMoved { player_id: 0, .. }));
        assert!(events.len() <= 6);
        assert_eq!(events.len() - 1, game.blocks().len());
        for block in game.blocks() {
            assert!(block.x < 8 && block.y < 8);
        }
    }

    #[test]
    fn test_same_seed_same_board() {
        let mut first = game(10);
        let mut second = game(10);
        assert_eq!(first.start(), second.start());
    }

    #[test]
    fn test_bomb_explodes_after_timer() {
        let mut game = game(0);
        game.start();
        game.position = Position::new(4, 4);

        game.record_action(ClientMessage::PlaceBomb);
        let placed = events(game.next_turn());
        assert_eq!(
            placed,
            vec![Event::BombPlaced {
                bomb_id: 0,
                position: Position::new(4, 4)
            }]
        );

        game.record_action(ClientMessage::Move {
            direction: Direction::Right,
        });
        events(game.next_turn());
        assert_eq!(game.position(), Position::new(5, 4));

        let exploded = events(game.next_turn());
        match &exploded[0] {
            Event::BombExploded {
                bomb_id,
                robots_destroyed,
                ..
            } => {
                assert_eq!(*bomb_id, 0);
                assert_eq!(robots_destroyed, &vec![PLAYER_ID]);
            }
            other => panic!("expected an explosion, got {:?}", other),
        }
        assert!(matches!(exploded[1], Event::PlayerMoved { .. }));
        assert_eq!(game.scores()[&PLAYER_ID], 1);
    }

    #[test]
    fn test_explosion_destroys_blocks() {
        let mut game = game(0);
        game.start();
        game.position = Position::new(0, 0);
        game.blocks.insert(Position::new(3, 5));
        game.bombs.insert(9, Bomb::new(Position::new(3, 4), 1));

        let events = events(game.next_turn());
        assert_eq!(
            events,
            vec![Event::BombExploded {
                bomb_id: 9,
                robots_destroyed: vec![],
                blocks_destroyed: vec![Position::new(3, 5)],
            }]
        );
        assert!(game.blocks().is_empty());
    }

    #[test]
    fn test_move_blocked_by_edge_and_block() {
        let mut game = game(0);
        game.start();
        game.position = Position::new(0, 0);

        game.record_action(ClientMessage::Move {
            direction: Direction::Left,
        });
        assert!(events(game.next_turn()).is_empty());

        game.blocks.insert(Position::new(0, 1));
        game.record_action(ClientMessage::Move {
            direction: Direction::Up,
        });
        assert!(events(game.next_turn()).is_empty());
        assert_eq!(game.position(), Position::new(0, 0));
    }

    #[test]
    fn test_place_block_once() {
        let mut game = game(0);
        game.start();

        game.record_action(ClientMessage::PlaceBlock);
        assert_eq!(events(game.next_turn()).len(), 1);
        game.record_action(ClientMessage::PlaceBlock);
        assert!(events(game.next_turn()).is_empty());
    }

    #[test]
    fn test_only_latest_action_counts() {
        let mut game = game(0);
        game.start();
        game.position = Position::new(2, 2);

        game.record_action(ClientMessage::PlaceBomb);
        game.record_action(ClientMessage::Move {
            direction: Direction::Down,
        });
        let events = events(game.next_turn());
        assert_eq!(
            events,
            vec![Event::PlayerMoved {
                player_id: PLAYER_ID,
                position: Position::new(2, 1)
            }]
        );
    }

    #[test]
    fn test_finishes_after_game_length() {
        let mut game = game(0);
        game.start();
        for _ in 0..19 {
            game.next_turn();
            assert!(!game.is_finished());
        }
        game.next_turn();
        assert!(game.is_finished());
        assert_eq!(game.turn(), 20);
    }
}
