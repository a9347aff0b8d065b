use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::deck::Deck;
use crate::errors::GameError;
use crate::hand::{hand_value, BLACKJACK};
use crate::rules::run_dealer;

/// Where a round is in its lifecycle. `Resolved` transitions back to
/// `InProgress` on the next deal; `AwaitingStart` only exists before the
/// first deal (or after a forced reset).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingStart,
    InProgress,
    Resolved,
}

/// Terminal result of a round. Ordinary state, never an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    PlayerBlackjack,
    PlayerBust,
    DealerBust,
    DealerBlackjack,
    PlayerWins,
    DealerWins,
    Push,
}

impl Outcome {
    /// Score change for the player: +100 win, -100 loss, 0 push.
    pub fn score_delta(self) -> i64 {
        match self {
            Outcome::PlayerBlackjack
            | Outcome::DealerBust
            | Outcome::PlayerWins => 100,
            Outcome::PlayerBust | Outcome::DealerBlackjack | Outcome::DealerWins => -100,
            Outcome::Push => 0,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Outcome::PlayerBlackjack => "Blackjack! Player wins!",
            Outcome::PlayerBust => "Bust! Player loses!",
            Outcome::DealerBust => "Dealer bust! Player wins!",
            Outcome::DealerBlackjack => "Dealer blackjack! Player loses!",
            Outcome::PlayerWins => "Player wins!",
            Outcome::DealerWins => "Player loses!",
            Outcome::Push => "Draw!",
        }
    }
}

/// One blackjack round: the deck plus both hands and the phase.
///
/// Hands only grow within a round; `deal` is the sole reset point. The round
/// itself knows nothing about scores or players, it just reports outcomes.
#[derive(Debug)]
pub struct Round {
    deck: Deck,
    player_hand: Vec<Card>,
    dealer_hand: Vec<Card>,
    phase: Phase,
    outcome: Option<Outcome>,
}

impl Round {
    pub fn new() -> Self {
        Self::with_deck(Deck::new())
    }

    pub fn new_with_seed(seed: u64) -> Self {
        Self::with_deck(Deck::new_with_seed(seed))
    }

    fn with_deck(deck: Deck) -> Self {
        Self {
            deck,
            player_hand: Vec::new(),
            dealer_hand: Vec::new(),
            phase: Phase::AwaitingStart,
            outcome: None,
        }
    }

    /// Start or reset the round: full deck, two cards to the player, then two
    /// to the dealer. Valid from any phase.
    ///
    /// A natural 21 on the deal resolves immediately as
    /// [`Outcome::PlayerBlackjack`]; otherwise the round is in progress and
    /// the returned outcome is `None`.
    pub fn deal(&mut self) -> Result<Option<Outcome>, GameError> {
        self.deck.reset();
        self.player_hand = self.deck.draw(2)?;
        self.dealer_hand = self.deck.draw(2)?;
        self.outcome = None;
        self.phase = Phase::InProgress;

        if hand_value(&self.player_hand) == BLACKJACK {
            Ok(Some(self.resolve(Outcome::PlayerBlackjack)))
        } else {
            Ok(None)
        }
    }

    /// Draw one card for the player. Resolves on 21 or bust, otherwise the
    /// round stays in progress.
    pub fn hit(&mut self) -> Result<Option<Outcome>, GameError> {
        self.ensure_in_progress()?;
        self.player_hand.extend(self.deck.draw(1)?);

        let value = hand_value(&self.player_hand);
        if value == BLACKJACK {
            Ok(Some(self.resolve(Outcome::PlayerBlackjack)))
        } else if value > BLACKJACK {
            Ok(Some(self.resolve(Outcome::PlayerBust)))
        } else {
            Ok(None)
        }
    }

    /// End the player's turn: run the dealer policy, then compare totals.
    /// Always resolves.
    pub fn stand(&mut self) -> Result<Outcome, GameError> {
        self.ensure_in_progress()?;
        run_dealer(&mut self.deck, &mut self.dealer_hand)?;

        let dealer = hand_value(&self.dealer_hand);
        let outcome = if dealer > BLACKJACK {
            Outcome::DealerBust
        } else if dealer == BLACKJACK {
            Outcome::DealerBlackjack
        } else {
            let player = hand_value(&self.player_hand);
            if player > dealer {
                Outcome::PlayerWins
            } else if player < dealer {
                Outcome::DealerWins
            } else {
                Outcome::Push
            }
        };
        Ok(self.resolve(outcome))
    }

    /// Abandon the round after a broken invariant; the next deal starts over.
    pub fn abort(&mut self) {
        self.deck.reset();
        self.player_hand.clear();
        self.dealer_hand.clear();
        self.outcome = None;
        self.phase = Phase::AwaitingStart;
    }

    fn ensure_in_progress(&self) -> Result<(), GameError> {
        match self.phase {
            Phase::InProgress => Ok(()),
            Phase::AwaitingStart => Err(GameError::NoRoundInProgress),
            Phase::Resolved => Err(GameError::RoundResolved),
        }
    }

    fn resolve(&mut self, outcome: Outcome) -> Outcome {
        self.outcome = Some(outcome);
        self.phase = Phase::Resolved;
        outcome
    }

    pub fn player_hand(&self) -> &[Card] {
        &self.player_hand
    }

    pub fn dealer_hand(&self) -> &[Card] {
        &self.dealer_hand
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.remaining()
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Round {
    /// Build a round mid-flight with a fixed deck, for scenario tests.
    pub(crate) fn fixture(deck: Deck, player_hand: Vec<Card>, dealer_hand: Vec<Card>) -> Self {
        Self {
            deck,
            player_hand,
            dealer_hand,
            phase: Phase::InProgress,
            outcome: None,
        }
    }
}
