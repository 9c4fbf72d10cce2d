//! 牌靴：抽牌與自動回洗

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::cards::{shuffled_shoe_cards, Card};
use super::constants::RESHUFFLE_THRESHOLD;

/// 當前遭遇的抽牌堆與棄牌堆
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shoe {
    pub cards: Vec<Card>,
    pub discard: Vec<Card>,
}

impl Shoe {
    pub fn fresh(rng: &mut StdRng) -> Self {
        Self {
            cards: shuffled_shoe_cards(rng),
            discard: Vec::new(),
        }
    }

    /// 抽一張牌
    ///
    /// 牌靴張數低於門檻時先將棄牌堆洗回；若棄牌堆也是空的，
    /// 重建一副全新牌靴。抽牌因此永不失敗。
    pub fn draw(&mut self, rng: &mut StdRng) -> Card {
        if self.cards.len() < RESHUFFLE_THRESHOLD {
            self.reshuffle_from_discard(rng);
        }
        match self.cards.pop() {
            Some(card) => card,
            None => {
                self.cards = shuffled_shoe_cards(rng);
                self.cards.pop().unwrap_or_else(|| Card::new(2, 0))
            }
        }
    }

    fn reshuffle_from_discard(&mut self, rng: &mut StdRng) {
        if self.discard.is_empty() {
            if self.cards.is_empty() {
                self.cards = shuffled_shoe_cards(rng);
            }
            return;
        }
        self.cards.append(&mut self.discard);
        self.cards.shuffle(rng);
    }

    /// 把整手牌收進棄牌堆
    pub fn discard_all(&mut self, hand: &mut Vec<Card>) {
        self.discard.append(hand);
    }

    pub fn discard_card(&mut self, card: Card) {
        self.discard.push(card);
    }
}

// ============================================================================
// 單元測試
// ============================================================================
