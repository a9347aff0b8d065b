//! # blackjack-engine: Blackjack Game Engine Core
//!
//! A server-authoritative two-party blackjack engine: deck management, hand
//! evaluation, the hit-until-17 dealer policy, and the per-round state
//! machine. The engine is pure game logic; authentication, score persistence,
//! and transport live in the `blackjack-web` crate.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and deck construction
//! - [`deck`] - Uniform random draws without replacement, ChaCha20 RNG
//! - [`hand`] - Blackjack hand value with Ace soft/hard resolution
//! - [`rules`] - Dealer drawing policy (stand on 17)
//! - [`round`] - Round state machine (deal / hit / stand) and outcomes
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use blackjack_engine::cards::{Card, Rank, Suit};
//! use blackjack_engine::hand::hand_value;
//!
//! let hand = [
//!     Card { suit: Suit::Spades, rank: Rank::Ace },
//!     Card { suit: Suit::Hearts, rank: Rank::King },
//! ];
//! assert_eq!(hand_value(&hand), 21);
//! ```
//!
//! ## Deterministic Gameplay
//!
//! Draws are reproducible with a seeded RNG:
//!
//! ```rust
//! use blackjack_engine::deck::Deck;
//!
//! let mut deck1 = Deck::new_with_seed(42);
//! let mut deck2 = Deck::new_with_seed(42);
//! assert_eq!(deck1.draw(4).unwrap(), deck2.draw(4).unwrap());
//! ```

pub mod cards;
pub mod deck;
pub mod errors;
pub mod hand;
pub mod round;
pub mod rules;
