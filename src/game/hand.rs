//! 手牌評估：21 點計分、爆牌與天生 21 點判定

use super::cards::Card;
use super::constants::BLACKJACK_TARGET;

/// 手牌點數
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandValue {
    pub total: u32,
    /// 是否仍有一張 Ace 以 11 計（軟牌）
    pub soft: bool,
}

/// 計算手牌點數
///
/// 所有 Ace 先以 11 計，超過 21 時逐張降為 1。
pub fn hand_value(cards: &[Card]) -> HandValue {
    let mut total: u32 = cards.iter().map(|c| c.blackjack_value()).sum();
    let mut soft_aces = cards.iter().filter(|c| c.is_ace()).count();

    while total > BLACKJACK_TARGET && soft_aces > 0 {
        total -= 10;
        soft_aces -= 1;
    }

    HandValue {
        total,
        soft: soft_aces > 0,
    }
}

pub fn is_bust(cards: &[Card]) -> bool {
    hand_value(cards).total > BLACKJACK_TARGET
}

/// 天生 21 點：恰好兩張牌合計 21
pub fn is_blackjack(cards: &[Card]) -> bool {
    cards.len() == 2 && hand_value(cards).total == BLACKJACK_TARGET
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(ranks: &[u8]) -> Vec<Card> {
        ranks.iter().map(|&r| Card::new(r, 0)).collect()
    }

    #[test]
    fn test_hard_totals() {
        assert_eq!(hand_value(&cards(&[10, 7])).total, 17);
        assert!(!hand_value(&cards(&[10, 7])).soft);
        assert_eq!(hand_value(&cards(&[13, 12])).total, 20);
    }

    #[test]
    fn test_soft_ace_adjustment() {
        let value = hand_value(&cards(&[1, 6]));
        assert_eq!(value.total, 17);
        assert!(value.soft);

        // A + 6 + 9 = 16 硬牌
        let value = hand_value(&cards(&[1, 6, 9]));
        assert_eq!(value.total, 16);
        assert!(!value.soft);

        // 雙 Ace 只有一張以 11 計
        let value = hand_value(&cards(&[1, 1]));
        assert_eq!(value.total, 12);
        assert!(value.soft);
    }

    #[test]
    fn test_bust_detection() {
        assert!(is_bust(&cards(&[10, 9, 5])));
        assert!(!is_bust(&cards(&[1, 10, 10])));
        assert_eq!(hand_value(&cards(&[1, 10, 10])).total, 21);
    }

    #[test]
    fn test_blackjack_requires_two_cards() {
        assert!(is_blackjack(&cards(&[1, 13])));
        assert!(!is_blackjack(&cards(&[7, 7, 7])));
        assert!(!is_blackjack(&cards(&[10, 10])));
    }
}
