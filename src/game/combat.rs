//! 戰鬥結算數學：手牌結果到傷害/金幣的映射
//!
//! 這一層是純函數：輸入數值修正與當手情境，輸出傷害拆解。
//! 實際套用落點（HP 變動、連勝歸零、勝敗重查）在 service 層的
//! `apply_impact_damage`。

use rand::rngs::StdRng;
use rand::Rng;

use super::cards::Card;
use super::constants::CRIT_MULTIPLIER;
use super::encounter::PlayerAction;
use super::hand::{hand_value, is_bust};
use super::stats::PlayerStats;

/// 單手結果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandOutcome {
    Win { blackjack: bool, dealer_bust: bool },
    Loss { bust: bool },
    Push,
}

/// 判定玩家手對莊家手的勝負
pub fn hand_outcome(player: &[Card], dealer: &[Card], player_blackjack: bool) -> HandOutcome {
    if is_bust(player) {
        return HandOutcome::Loss { bust: true };
    }
    let dealer_bust = is_bust(dealer);
    if dealer_bust {
        return HandOutcome::Win {
            blackjack: player_blackjack,
            dealer_bust: true,
        };
    }

    let p = hand_value(player).total;
    let d = hand_value(dealer).total;
    if p > d {
        HandOutcome::Win {
            blackjack: player_blackjack,
            dealer_bust: false,
        }
    } else if p < d {
        HandOutcome::Loss { bust: false }
    } else {
        HandOutcome::Push
    }
}

/// 當手情境（條件加成的輸入）
#[derive(Clone, Copy, Debug)]
pub struct HandContext {
    pub action: Option<PlayerAction>,
    pub doubled: bool,
    pub first_hand: bool,
    pub low_hp: bool,
    pub vs_elite: bool,
}

/// 勝利手的傷害拆解
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinDamage {
    pub amount: i32,
    pub crit: bool,
}

/// 計算勝利手傷害
///
/// 基礎傷害加上行動別與條件加成；暴擊每手擲一次，
/// 中了整段乘上倍率。
pub fn win_damage(
    stats: &PlayerStats,
    ctx: &HandContext,
    blackjack: bool,
    dealer_bust: bool,
    rng: &mut StdRng,
) -> WinDamage {
    let mut amount = stats.flat_damage;

    match ctx.action {
        Some(PlayerAction::Stand) => amount += stats.stand_win_damage,
        Some(PlayerAction::Split) => amount += stats.split_win_damage,
        _ => {}
    }
    if ctx.doubled {
        amount += stats.double_win_damage;
    }
    if blackjack {
        amount += stats.blackjack_bonus_damage;
    }
    if ctx.first_hand {
        amount += stats.first_hand_damage;
    }
    if ctx.low_hp {
        amount += stats.low_hp_damage;
    }
    if ctx.vs_elite {
        amount += stats.elite_damage;
    }
    if dealer_bust {
        amount += stats.dealer_bust_bonus_damage;
    }

    let crit = rng.gen::<f32>() < stats.crit_chance;
    if crit {
        amount *= CRIT_MULTIPLIER;
    }

    WinDamage { amount, crit }
}

/// 敗北時的傷害減免（block 疊加；落點處仍保證至少 1 點）
pub fn loss_reduction(stats: &PlayerStats, busted: bool, doubled: bool) -> i32 {
    let mut reduction = stats.block;
    if busted {
        reduction += stats.bust_block;
    }
    if doubled {
        reduction += stats.double_loss_block;
    }
    reduction
}

/// 勝利金幣：(敵人基礎 + 勝手加成) × 倍率，無條件下取整
pub fn win_gold(stats: &PlayerStats, enemy_gold: i64) -> i64 {
    let raw = (enemy_gold + stats.chips_on_win_hand) as f64 * stats.gold_multiplier as f64;
    (raw.floor() as i64).max(0)
}

// ============================================================================
// 單元測試
// ============================================================================
