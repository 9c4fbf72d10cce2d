//! 敵人目錄與遭遇選擇
//!
//! 每層樓有自己的敵人池；樓層最後一間固定是頭目，越深的房間
//! 精英出現的權重越高。開場對白從敵人定義中隨機挑一句。

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use serde::{Deserialize, Serialize};

/// 敵人類別
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Normal,
    Elite,
    Boss,
}

/// 一場遭遇中的敵人
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub kind: EnemyKind,
    pub avatar_key: String,
    pub attack: i32,
    pub gold: i64, // 每手勝利的基礎金幣
}

impl Enemy {
    pub fn is_elite_or_boss(&self) -> bool {
        matches!(self.kind, EnemyKind::Elite | EnemyKind::Boss)
    }
}

/// 敵人靜態定義
struct EnemyDef {
    name: &'static str,
    avatar_key: &'static str,
    kind: EnemyKind,
    base_hp: i32,
    base_attack: i32,
    base_gold: i64,
    dialogue: &'static [&'static str],
}

const FLOOR_1_NORMALS: &[EnemyDef] = &[
    EnemyDef {
        name: "Back-Alley Gambler",
        avatar_key: "gambler",
        kind: EnemyKind::Normal,
        base_hp: 24,
        base_attack: 5,
        base_gold: 4,
        dialogue: &[
            "Fresh meat at my table.",
            "Cards don't lie. I do.",
        ],
    },
    EnemyDef {
        name: "Pit Rat",
        avatar_key: "pit_rat",
        kind: EnemyKind::Normal,
        base_hp: 20,
        base_attack: 6,
        base_gold: 4,
        dialogue: &["Squeak. Deal. Squeak.", "The house feeds me your chips."],
    },
    EnemyDef {
        name: "Tipsy Bouncer",
        avatar_key: "bouncer",
        kind: EnemyKind::Normal,
        base_hp: 28,
        base_attack: 4,
        base_gold: 5,
        dialogue: &["No card counting. I count instead.", "You look... beatable."],
    },
];

const FLOOR_2_NORMALS: &[EnemyDef] = &[
    EnemyDef {
        name: "Velvet Hustler",
        avatar_key: "hustler",
        kind: EnemyKind::Normal,
        base_hp: 30,
        base_attack: 7,
        base_gold: 6,
        dialogue: &["Double or nothing. Always nothing.", "I shuffle fates, not cards."],
    },
    EnemyDef {
        name: "Cage Clerk",
        avatar_key: "clerk",
        kind: EnemyKind::Normal,
        base_hp: 26,
        base_attack: 8,
        base_gold: 6,
        dialogue: &["Withdrawals are final.", "Your balance: dwindling."],
    },
];

const FLOOR_3_NORMALS: &[EnemyDef] = &[
    EnemyDef {
        name: "Hollow Croupier",
        avatar_key: "croupier",
        kind: EnemyKind::Normal,
        base_hp: 34,
        base_attack: 9,
        base_gold: 8,
        dialogue: &["The table remembers every loss.", "Place your health on the felt."],
    },
    EnemyDef {
        name: "Marble Statue",
        avatar_key: "statue",
        kind: EnemyKind::Normal,
        base_hp: 40,
        base_attack: 7,
        base_gold: 8,
        dialogue: &["...", "The stone plays patiently."],
    },
];

const ELITES: &[EnemyDef] = &[
    EnemyDef {
        name: "Floor Enforcer",
        avatar_key: "enforcer",
        kind: EnemyKind::Elite,
        base_hp: 38,
        base_attack: 9,
        base_gold: 10,
        dialogue: &["Management sent me.", "Your streak ends here."],
    },
    EnemyDef {
        name: "Twin Shark",
        avatar_key: "shark",
        kind: EnemyKind::Elite,
        base_hp: 34,
        base_attack: 11,
        base_gold: 11,
        dialogue: &["Two hands. Twice the teeth.", "Split? I invented splitting."],
    },
];

const BOSSES: &[EnemyDef] = &[
    EnemyDef {
        name: "The Pit Boss",
        avatar_key: "pit_boss",
        kind: EnemyKind::Boss,
        base_hp: 55,
        base_attack: 10,
        base_gold: 16,
        dialogue: &["Nobody leaves my floor ahead.", "The house edge is me."],
    },
    EnemyDef {
        name: "Madame Vig",
        avatar_key: "vig",
        kind: EnemyKind::Boss,
        base_hp: 50,
        base_attack: 12,
        base_gold: 16,
        dialogue: &["Interest accrues in blood.", "Every debt comes due, darling."],
    },
    EnemyDef {
        name: "The House",
        avatar_key: "house",
        kind: EnemyKind::Boss,
        base_hp: 64,
        base_attack: 13,
        base_gold: 20,
        dialogue: &["I always win. Eventually.", "Welcome to the final table."],
    },
];

fn normals_for_floor(floor: u32) -> &'static [EnemyDef] {
    match floor {
        1 => FLOOR_1_NORMALS,
        2 => FLOOR_2_NORMALS,
        _ => FLOOR_3_NORMALS,
    }
}

fn scale(def: &EnemyDef, floor: u32) -> Enemy {
    let bump = floor.saturating_sub(1) as i32;
    let hp = def.base_hp + bump * 8;
    Enemy {
        name: def.name.to_string(),
        hp,
        max_hp: hp,
        kind: def.kind,
        avatar_key: def.avatar_key.to_string(),
        attack: def.base_attack + bump * 2,
        gold: def.base_gold + bump as i64 * 3,
    }
}

/// 依樓層/房間挑選敵人與開場對白
///
/// 樓層最後一間是頭目；其餘房間以隨房號上升的權重混入精英。
pub fn pick_enemy(
    floor: u32,
    room: u32,
    rooms_per_floor: u32,
    rng: &mut StdRng,
) -> (Enemy, String) {
    let def = if room >= rooms_per_floor {
        let idx = (floor.saturating_sub(1) as usize).min(BOSSES.len() - 1);
        &BOSSES[idx]
    } else {
        let elite_chance = 0.10 + 0.07 * room.saturating_sub(1) as f64;
        if rng.gen_bool(elite_chance.min(0.5)) {
            ELITES.choose(rng).expect("elite pool is non-empty")
        } else {
            normals_for_floor(floor)
                .choose(rng)
                .expect("floor pool is non-empty")
        }
    };

    let dialogue = def
        .dialogue
        .choose(rng)
        .copied()
        .unwrap_or("...")
        .to_string();

    (scale(def, floor), dialogue)
}

// ============================================================================
// 單元測試
// ============================================================================
