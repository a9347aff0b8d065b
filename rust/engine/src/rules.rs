use crate::cards::Card;
use crate::deck::Deck;
use crate::errors::GameError;
use crate::hand::hand_value;

/// Dealer stands at this total or above.
pub const DEALER_STAND_MIN: u32 = 17;

/// The hit-until-17 rule: the dealer keeps drawing while below 17.
pub fn dealer_must_draw(dealer_hand: &[Card]) -> bool {
    hand_value(dealer_hand) < DEALER_STAND_MIN
}

/// Runs the dealer policy to completion, appending each drawn card.
///
/// Terminates because every draw raises the total by at least 1 and the deck
/// is finite. Ends with the dealer at 17 or more, possibly bust.
pub fn run_dealer(deck: &mut Deck, dealer_hand: &mut Vec<Card>) -> Result<(), GameError> {
    while dealer_must_draw(dealer_hand) {
        dealer_hand.extend(deck.draw(1)?);
    }
    Ok(())
}
