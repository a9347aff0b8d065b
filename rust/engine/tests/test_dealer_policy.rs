use blackjack_engine::deck::Deck;
use blackjack_engine::hand::hand_value;
use blackjack_engine::rules::{dealer_must_draw, run_dealer, DEALER_STAND_MIN};

#[test]
fn dealer_always_terminates_at_17_or_more() {
    for seed in 0..200u64 {
        let mut deck = Deck::new_with_seed(seed);
        let mut hand = deck.draw(2).expect("opening hand");
        run_dealer(&mut deck, &mut hand).expect("dealer run");
        assert!(
            hand_value(&hand) >= DEALER_STAND_MIN,
            "seed {seed}: dealer stopped at {}",
            hand_value(&hand)
        );
        assert!(!dealer_must_draw(&hand));
    }
}

#[test]
fn dealer_never_draws_once_standing() {
    for seed in 0..200u64 {
        let mut deck = Deck::new_with_seed(seed);
        let mut hand = deck.draw(2).expect("opening hand");
        run_dealer(&mut deck, &mut hand).expect("dealer run");
        let settled = hand.clone();
        let before = deck.remaining();
        run_dealer(&mut deck, &mut hand).expect("second run");
        assert_eq!(hand, settled);
        assert_eq!(deck.remaining(), before);
    }
}
