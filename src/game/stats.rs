//! 玩家數值修正系統
//!
//! 遺物效果全部累加進這個結構；有上限的欄位在每次套用遺物後
//! 以 `clamp_caps` 重新夾緊。

use serde::{Deserialize, Serialize};

use super::constants::{
    BLOCK_CAP, CRIT_CHANCE_CAP, FLAT_DAMAGE_CAP, GOLD_MULTIPLIER_MAX, GOLD_MULTIPLIER_MIN,
};

/// 遺物累積出的玩家修正值
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    // 基礎攻防
    pub flat_damage: i32,     // 勝利手的基礎傷害
    pub block: i32,           // 敗北傷害減免
    pub crit_chance: f32,     // 每手暴擊機率
    pub gold_multiplier: f32, // 勝利金幣倍率

    // 發牌與防爆
    pub lucky_start: u32,            // 起手前 N 張重抽低點數牌
    pub bust_guard_per_encounter: u32, // 每場遭遇的防爆次數

    // 回復
    pub heal_on_win_hand: i32,
    pub heal_on_encounter_start: i32,
    pub blackjack_heal: i32,

    // 行動別勝利加成
    pub stand_win_damage: i32,
    pub double_win_damage: i32,
    pub split_win_damage: i32,
    pub blackjack_bonus_damage: i32,

    // 條件加成
    pub first_hand_damage: i32,       // 遭遇的第一手
    pub low_hp_damage: i32,           // hp < max_hp / 2 時
    pub elite_damage: i32,            // 對精英/頭目
    pub dealer_bust_bonus_damage: i32, // 莊家爆牌時

    // 金幣
    pub chips_on_win_hand: i64,
    pub chips_on_push: i64,

    // 敗北減免
    pub bust_block: i32,
    pub double_loss_block: i32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            flat_damage: 5,
            block: 0,
            crit_chance: 0.05,
            gold_multiplier: 1.0,
            lucky_start: 0,
            bust_guard_per_encounter: 0,
            heal_on_win_hand: 0,
            heal_on_encounter_start: 0,
            blackjack_heal: 0,
            stand_win_damage: 0,
            double_win_damage: 0,
            split_win_damage: 0,
            blackjack_bonus_damage: 0,
            first_hand_damage: 0,
            low_hp_damage: 0,
            elite_damage: 0,
            dealer_bust_bonus_damage: 0,
            chips_on_win_hand: 0,
            chips_on_push: 0,
            bust_block: 0,
            double_loss_block: 0,
        }
    }
}

impl PlayerStats {
    /// 夾緊所有有全域上限的欄位
    pub fn clamp_caps(&mut self) {
        self.crit_chance = self.crit_chance.clamp(0.0, CRIT_CHANCE_CAP);
        self.flat_damage = self.flat_damage.min(FLAT_DAMAGE_CAP);
        self.block = self.block.min(BLOCK_CAP);
        self.gold_multiplier = self
            .gold_multiplier
            .clamp(GOLD_MULTIPLIER_MIN, GOLD_MULTIPLIER_MAX);
    }

    /// 上限不變式是否成立（測試與載入清洗用）
    pub fn within_caps(&self) -> bool {
        self.crit_chance <= CRIT_CHANCE_CAP
            && self.flat_damage <= FLAT_DAMAGE_CAP
            && self.block <= BLOCK_CAP
            && (GOLD_MULTIPLIER_MIN..=GOLD_MULTIPLIER_MAX).contains(&self.gold_multiplier)
    }
}

// ============================================================================
// 單元測試
// ============================================================================
