//! Run 狀態：一次完整闖關的進度與玩家數值

use std::collections::BTreeMap;

use super::constants::{MAX_FLOOR, ROOMS_PER_FLOOR, STARTING_GOLD, STARTING_MAX_HP};
use super::relics::RelicId;
use super::stats::PlayerStats;

/// Run 期間的玩家
///
/// 不變式：`0 <= hp <= max_hp`、`gold >= 0`。
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub hp: i32,
    pub max_hp: i32,
    pub gold: i64,
    pub streak: u32,
    pub total_damage_dealt: i64,
    pub total_damage_taken: i64,
    pub bust_guards_left: u32,
    pub relics: BTreeMap<RelicId, u32>,
    pub stats: PlayerStats,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            hp: STARTING_MAX_HP,
            max_hp: STARTING_MAX_HP,
            gold: STARTING_GOLD,
            streak: 0,
            total_damage_dealt: 0,
            total_damage_taken: 0,
            bust_guards_left: 0,
            relics: BTreeMap::new(),
            stats: PlayerStats::default(),
        }
    }
}

impl Player {
    pub fn heal(&mut self, amount: i32) {
        if amount <= 0 {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    pub fn is_low_hp(&self) -> bool {
        self.hp < self.max_hp / 2
    }

    pub fn relic_count(&self, id: RelicId) -> u32 {
        self.relics.get(&id).copied().unwrap_or(0)
    }

    /// 夾緊 hp/gold 不變式（遺物套用與載入清洗後呼叫）
    pub fn clamp_invariants(&mut self) {
        self.max_hp = self.max_hp.max(1);
        self.hp = self.hp.clamp(0, self.max_hp);
        self.gold = self.gold.max(0);
        self.stats.clamp_caps();
    }
}

/// 一次闖關
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub floor: u32,
    pub room: u32,
    pub max_floor: u32,
    pub rooms_per_floor: u32,
    /// 本次營地是否已消費（每次進營地重置）
    pub shop_purchase_made: bool,
    pub player: Player,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            floor: 1,
            room: 1,
            max_floor: MAX_FLOOR,
            rooms_per_floor: ROOMS_PER_FLOOR,
            shop_purchase_made: false,
            player: Player::default(),
        }
    }
}

impl Run {
    pub fn new() -> Self {
        Self::default()
    }

    /// 套用遺物：擁有數 +1、執行效果、重新夾緊上限與 hp
    pub fn apply_relic(&mut self, id: RelicId) {
        *self.player.relics.entry(id).or_insert(0) += 1;
        id.apply(self);
        self.player.clamp_invariants();
    }

    /// 前進到下一間房；回傳 `true` 表示已通關整個 Run
    pub fn advance_room(&mut self) -> bool {
        if self.room < self.rooms_per_floor {
            self.room += 1;
            return false;
        }
        if self.floor < self.max_floor {
            self.floor += 1;
            self.room = 1;
            return false;
        }
        true
    }

    pub fn is_boss_room(&self) -> bool {
        self.room >= self.rooms_per_floor
    }
}

// ============================================================================
// 單元測試
// ============================================================================
