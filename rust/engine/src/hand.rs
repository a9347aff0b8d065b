use crate::cards::{Card, Rank};

/// The target total; a hand above this value is bust.
pub const BLACKJACK: u32 = 21;

/// Blackjack value of a hand with Ace soft/hard resolution.
///
/// Sums base values (face cards 10, Ace 11 provisionally), then reinterprets
/// Aces as 1 one at a time while the total exceeds 21 and soft Aces remain.
/// Pure and order-independent; the empty hand is 0. The result may still
/// exceed 21 once every Ace is hard.
pub fn hand_value(hand: &[Card]) -> u32 {
    let mut value = 0;
    let mut soft_aces = 0;
    for card in hand {
        value += card.rank.base_value();
        if card.rank == Rank::Ace {
            soft_aces += 1;
        }
    }
    while value > BLACKJACK && soft_aces > 0 {
        value -= 10;
        soft_aces -= 1;
    }
    value
}

pub fn is_bust(hand: &[Card]) -> bool {
    hand_value(hand) > BLACKJACK
}
