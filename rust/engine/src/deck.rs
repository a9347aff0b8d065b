use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::errors::GameError;

/// The pool of cards not yet dealt this round.
///
/// Draws remove uniformly random cards without replacement, so deck order is
/// irrelevant. Invariant: `deck ∪ player hand ∪ dealer hand` is exactly the
/// 52-card set for the duration of a round.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    rng: ChaCha20Rng,
}

impl Deck {
    pub fn new() -> Self {
        Self {
            cards: full_deck(),
            rng: ChaCha20Rng::from_os_rng(),
        }
    }

    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            cards: full_deck(),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards,
            rng: ChaCha20Rng::seed_from_u64(0),
        }
    }

    /// Restore the full 52-card set.
    pub fn reset(&mut self) {
        self.cards = full_deck();
    }

    /// Draw `count` distinct cards chosen uniformly at random.
    ///
    /// Never reachable with a correctly reset deck servicing one round, but
    /// checked anyway: requesting more cards than remain fails with
    /// [`GameError::DeckExhausted`] and leaves the deck untouched.
    pub fn draw(&mut self, count: usize) -> Result<Vec<Card>, GameError> {
        if count > self.cards.len() {
            return Err(GameError::DeckExhausted {
                requested: count,
                remaining: self.cards.len(),
            });
        }
        let mut drawn = Vec::with_capacity(count);
        for _ in 0..count {
            let idx = self.rng.random_range(0..self.cards.len());
            drawn.push(self.cards.swap_remove(idx));
        }
        Ok(drawn)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_deck_is_full() {
        let deck = Deck::new_with_seed(7);
        assert_eq!(deck.remaining(), 52);
    }

    #[test]
    fn draw_zero_is_a_no_op() {
        let mut deck = Deck::new_with_seed(7);
        let drawn = deck.draw(0).expect("draw zero");
        assert!(drawn.is_empty());
        assert_eq!(deck.remaining(), 52);
    }

    #[test]
    fn overdraw_fails_and_preserves_deck() {
        let mut deck = Deck::new_with_seed(7);
        let err = deck.draw(53).unwrap_err();
        assert_eq!(
            err,
            GameError::DeckExhausted {
                requested: 53,
                remaining: 52
            }
        );
        assert_eq!(deck.remaining(), 52);
    }

    #[test]
    fn reset_restores_all_cards() {
        let mut deck = Deck::new_with_seed(7);
        deck.draw(10).expect("draw");
        deck.reset();
        assert_eq!(deck.remaining(), 52);
    }
}
