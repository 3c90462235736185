//! Moves the user sent that the server has neither echoed nor rejected yet.

use std::collections::{HashMap, VecDeque};

use cozy_chess::Move;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMove {
    pub mv: Move,
    /// The text that went out on the wire.
    pub text: String,
}

#[derive(Debug, Default)]
pub struct UnechoedMoves {
    queues: HashMap<u32, VecDeque<SentMove>>,
}

impl UnechoedMoves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&mut self, game: u32, mv: Move, text: String) {
        self.queues
            .entry(game)
            .or_default()
            .push_back(SentMove { mv, text });
    }

    /// The server echoed `mv`. Returns whether it was the oldest move we sent.
    pub fn confirm(&mut self, game: u32, mv: &Move) -> bool {
        let Some(queue) = self.queues.get_mut(&game) else {
            return false;
        };
        if queue.front().map(|sent| &sent.mv) != Some(mv) {
            return false;
        }
        queue.pop_front();
        if queue.is_empty() {
            self.queues.remove(&game);
        }
        true
    }

    /// The server rejected `text`. When it was our oldest pending move the
    /// whole queue is dropped, since every later move was played on a
    /// position the server never had.
    pub fn reject(&mut self, game: u32, text: &str) -> bool {
        let matches = self
            .queues
            .get(&game)
            .and_then(VecDeque::front)
            .is_some_and(|sent| sent.text.eq_ignore_ascii_case(text.trim()));
        if matches {
            self.queues.remove(&game);
        }
        matches
    }

    pub fn drop_game(&mut self, game: u32) {
        self.queues.remove(&game);
    }

    pub fn pending(&self, game: u32) -> usize {
        self.queues.get(&game).map_or(0, VecDeque::len)
    }

    pub fn clear(&mut self) {
        self.queues.clear();
    }
}
