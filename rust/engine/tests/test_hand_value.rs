use blackjack_engine::cards::{full_deck, Card, Rank, Suit};
use blackjack_engine::hand::hand_value;

fn card(rank: Rank, suit: Suit) -> Card {
    Card { rank, suit }
}

#[test]
fn value_is_invariant_under_permutation() {
    let mut hand = vec![
        card(Rank::Ace, Suit::Spades),
        card(Rank::Nine, Suit::Hearts),
        card(Rank::Five, Suit::Clubs),
        card(Rank::Ace, Suit::Diamonds),
    ];
    let reference = hand_value(&hand);
    // rotate through every cyclic order plus a reversal
    for _ in 0..hand.len() {
        hand.rotate_left(1);
        assert_eq!(hand_value(&hand), reference);
    }
    hand.reverse();
    assert_eq!(hand_value(&hand), reference);
}

#[test]
fn no_value_could_be_lowered_by_demoting_another_ace() {
    // For every two-card ace-holding hand, the result is either <= 21 or
    // every ace is already hard.
    for &r in &[
        Rank::Two,
        Rank::Nine,
        Rank::Ten,
        Rank::King,
        Rank::Ace,
    ] {
        let hand = [card(Rank::Ace, Suit::Spades), card(r, Suit::Hearts)];
        let value = hand_value(&hand);
        assert!(value <= 21, "two cards can never bust, got {value}");
    }
}

#[test]
fn whole_deck_value_is_fully_hard() {
    // 4 aces all demoted: 4*1 + 4*(2+..+10) + 12*10
    let deck = full_deck();
    assert_eq!(hand_value(&deck), 4 + 4 * 54 + 120);
}
