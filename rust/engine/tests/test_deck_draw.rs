use std::collections::HashSet;

use blackjack_engine::cards::{full_deck, Card};
use blackjack_engine::deck::Deck;
use blackjack_engine::errors::GameError;

#[test]
fn drawn_plus_remaining_reproduce_the_deck() {
    for n in [0usize, 1, 4, 26, 52] {
        let mut deck = Deck::new_with_seed(99);
        let drawn = deck.draw(n).expect("draw");
        assert_eq!(drawn.len(), n);
        assert_eq!(deck.remaining(), 52 - n);

        let mut union: HashSet<Card> = drawn.into_iter().collect();
        union.extend(deck.cards().iter().copied());
        let full: HashSet<Card> = full_deck().into_iter().collect();
        assert_eq!(union, full);
    }
}

#[test]
fn draws_are_distinct_across_calls() {
    let mut deck = Deck::new_with_seed(5);
    let first = deck.draw(2).expect("draw");
    let second = deck.draw(2).expect("draw");
    let all: HashSet<Card> = first.iter().chain(second.iter()).copied().collect();
    assert_eq!(all.len(), 4);
}

#[test]
fn overdraw_is_checked_not_assumed() {
    let mut deck = Deck::new_with_seed(5);
    deck.draw(52).expect("empty the deck");
    let err = deck.draw(1).unwrap_err();
    assert_eq!(
        err,
        GameError::DeckExhausted {
            requested: 1,
            remaining: 0
        }
    );
}

#[test]
fn seeded_decks_draw_identically() {
    let mut a = Deck::new_with_seed(1234);
    let mut b = Deck::new_with_seed(1234);
    assert_eq!(a.draw(10).unwrap(), b.draw(10).unwrap());
}
