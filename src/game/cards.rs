//! 卡牌定義與牌靴構建

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::constants::DECKS_PER_SHOE;

/// 一張撲克牌
///
/// `rank`/`suit` 在發出後不可變；`dealt_at` 記錄發牌時刻，
/// 只供渲染端做入場動畫，核心邏輯不讀取。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Card {
    pub rank: u8, // 1..=13 (Ace = 1)
    pub suit: u8, // 0..=3
    pub dealt_at: f32,
}

impl Card {
    pub fn new(rank: u8, suit: u8) -> Self {
        Self {
            rank,
            suit,
            dealt_at: 0.0,
        }
    }

    /// 21 點面值：Ace 先以 11 計，軟硬調整由手牌評估處理
    pub fn blackjack_value(&self) -> u32 {
        match self.rank {
            1 => 11,            // Ace
            11 | 12 | 13 => 10, // J, Q, K
            n => n as u32,
        }
    }

    pub fn is_ace(&self) -> bool {
        self.rank == 1
    }

    /// rank/suit 是否在合法範圍（載入清洗用）
    pub fn is_well_formed(rank: u8, suit: u8) -> bool {
        (1..=13).contains(&rank) && suit <= 3
    }
}

/// 建立未洗牌的多副牌靴牌堆
pub fn shoe_cards() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECKS_PER_SHOE * 52);
    for _ in 0..DECKS_PER_SHOE {
        for suit in 0..4 {
            for rank in 1..=13 {
                cards.push(Card::new(rank, suit));
            }
        }
    }
    cards
}

/// 建立洗好的牌靴牌堆
pub fn shuffled_shoe_cards(rng: &mut StdRng) -> Vec<Card> {
    let mut cards = shoe_cards();
    cards.shuffle(rng);
    cards
}

// ============================================================================
// 單元測試
// ============================================================================
