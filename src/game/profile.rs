//! Profile：跨 Run 的收藏與生涯統計

use std::collections::BTreeMap;

use super::constants::RUN_HISTORY_LIMIT;
use super::relics::RelicId;
use super::run::Run;

/// Run 結束原因
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Victory,
    Defeat,
}

/// 歸檔的單次 Run 摘要
#[derive(Clone, Debug, PartialEq)]
pub struct RunRecord {
    pub outcome: RunOutcome,
    pub floor: u32,
    pub room: u32,
    pub gold: i64,
    pub relic_count: u32,
}

/// 生涯檔案
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    pub relic_collection: BTreeMap<RelicId, u32>,
    pub runs_started: u64,
    pub runs_won: u64,
    pub hands_played: u64,
    pub blackjacks: u64,
    pub enemies_defeated: u64,
    pub chips_earned: u64,
    pub damage_taken: u64,
    pub pushes: u64,
    pub splits_used: u64,
    pub doubles_won: u64,
    pub best_floor: u32,
    pub history: Vec<RunRecord>,
}

impl Profile {
    pub fn record_relic(&mut self, id: RelicId) {
        *self.relic_collection.entry(id).or_insert(0) += 1;
    }

    /// 將結束的 Run 歸檔；歷史有上限，最舊的先淘汰
    pub fn archive_run(&mut self, run: &Run, outcome: RunOutcome) {
        if outcome == RunOutcome::Victory {
            self.runs_won += 1;
        }
        self.best_floor = self.best_floor.max(run.floor);

        self.history.push(RunRecord {
            outcome,
            floor: run.floor,
            room: run.room,
            gold: run.player.gold,
            relic_count: run.player.relics.values().sum(),
        });
        if self.history.len() > RUN_HISTORY_LIMIT {
            let overflow = self.history.len() - RUN_HISTORY_LIMIT;
            self.history.drain(..overflow);
        }
    }
}

// ============================================================================
// 單元測試
// ============================================================================
