//! 遺物系統
//!
//! 遺物是 Run 期間永久的數值修正，來源為獎勵選單或營地商店。
//! 目錄本身是宣告式內容：`apply` 只改動 `run.player` 的
//! stats / hp / max_hp，擁有數量的變動由呼叫端負責。

use serde::{Deserialize, Serialize};

use super::run::Run;

/// 遺物稀有度（抽取權重與商店加價依此排序）
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl Rarity {
    pub const ORDER: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Legendary,
    ];

    /// 商店的稀有度加價
    pub fn shop_markup(&self) -> i64 {
        match self {
            Rarity::Common => 0,
            Rarity::Uncommon => 2,
            Rarity::Rare => 4,
            Rarity::Legendary => 7,
        }
    }
}

/// 遺物 ID
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RelicId {
    // Common
    RustyKnuckles,
    OakShield,
    LoadedDie,
    GreasyChips,
    BentHorseshoe,
    TravelFlask,
    PaddedVest,
    // Uncommon
    IronResolve,
    DoublersRing,
    TwinBlades,
    FirstBlood,
    BerserkerSalt,
    GildedTooth,
    SafetyNet,
    FieldRations,
    HedgedBet,
    // Rare
    GiantSlayer,
    DealersCurse,
    RoyalSeal,
    VelvetGlove,
    MarkedDeck,
    IronHeart,
    // Legendary（頭目獎勵池）
    CrownOfTheHouse,
    MidasHandshake,
    Phylactery,
}

/// 遺物靜態定義
#[derive(Clone, Copy, Debug)]
pub struct RelicDef {
    pub name: &'static str,
    pub rarity: Rarity,
    pub description: &'static str,
    pub shop_cost: i64,
}

impl RelicId {
    /// 全目錄（抽取池的來源）
    pub fn all() -> &'static [RelicId] {
        use RelicId::*;
        &[
            RustyKnuckles,
            OakShield,
            LoadedDie,
            GreasyChips,
            BentHorseshoe,
            TravelFlask,
            PaddedVest,
            IronResolve,
            DoublersRing,
            TwinBlades,
            FirstBlood,
            BerserkerSalt,
            GildedTooth,
            SafetyNet,
            FieldRations,
            HedgedBet,
            GiantSlayer,
            DealersCurse,
            RoyalSeal,
            VelvetGlove,
            MarkedDeck,
            IronHeart,
            CrownOfTheHouse,
            MidasHandshake,
            Phylactery,
        ]
    }

    /// 頭目獎勵強制包含的遺物池
    pub fn boss_pool() -> &'static [RelicId] {
        use RelicId::*;
        &[CrownOfTheHouse, MidasHandshake, Phylactery]
    }

    pub fn def(&self) -> RelicDef {
        use Rarity::*;
        use RelicId::*;
        match self {
            RustyKnuckles => RelicDef {
                name: "Rusty Knuckles",
                rarity: Common,
                description: "+2 damage on winning hands",
                shop_cost: 14,
            },
            OakShield => RelicDef {
                name: "Oak Shield",
                rarity: Common,
                description: "+2 block against losses",
                shop_cost: 13,
            },
            LoadedDie => RelicDef {
                name: "Loaded Die",
                rarity: Common,
                description: "+5% crit chance",
                shop_cost: 15,
            },
            GreasyChips => RelicDef {
                name: "Greasy Chips",
                rarity: Common,
                description: "+2 gold per winning hand",
                shop_cost: 12,
            },
            BentHorseshoe => RelicDef {
                name: "Bent Horseshoe",
                rarity: Common,
                description: "+2 gold on pushes",
                shop_cost: 11,
            },
            TravelFlask => RelicDef {
                name: "Travel Flask",
                rarity: Common,
                description: "Heal 3 HP when an encounter starts",
                shop_cost: 13,
            },
            PaddedVest => RelicDef {
                name: "Padded Vest",
                rarity: Common,
                description: "+2 block when you bust",
                shop_cost: 12,
            },
            IronResolve => RelicDef {
                name: "Iron Resolve",
                rarity: Uncommon,
                description: "+3 damage when winning by standing",
                shop_cost: 22,
            },
            DoublersRing => RelicDef {
                name: "Doubler's Ring",
                rarity: Uncommon,
                description: "+4 damage when winning a double down",
                shop_cost: 24,
            },
            TwinBlades => RelicDef {
                name: "Twin Blades",
                rarity: Uncommon,
                description: "+3 damage per winning split hand",
                shop_cost: 22,
            },
            FirstBlood => RelicDef {
                name: "First Blood",
                rarity: Uncommon,
                description: "+4 damage on the first hand of an encounter",
                shop_cost: 21,
            },
            BerserkerSalt => RelicDef {
                name: "Berserker Salt",
                rarity: Uncommon,
                description: "+4 damage while below half HP",
                shop_cost: 23,
            },
            GildedTooth => RelicDef {
                name: "Gilded Tooth",
                rarity: Uncommon,
                description: "+15% gold from wins",
                shop_cost: 25,
            },
            SafetyNet => RelicDef {
                name: "Safety Net",
                rarity: Uncommon,
                description: "+1 bust guard per encounter",
                shop_cost: 26,
            },
            FieldRations => RelicDef {
                name: "Field Rations",
                rarity: Uncommon,
                description: "Heal 1 HP per winning hand",
                shop_cost: 20,
            },
            HedgedBet => RelicDef {
                name: "Hedged Bet",
                rarity: Uncommon,
                description: "+3 block when losing a double down",
                shop_cost: 21,
            },
            GiantSlayer => RelicDef {
                name: "Giant Slayer",
                rarity: Rare,
                description: "+6 damage against elites and bosses",
                shop_cost: 36,
            },
            DealersCurse => RelicDef {
                name: "Dealer's Curse",
                rarity: Rare,
                description: "+5 damage when the dealer busts",
                shop_cost: 33,
            },
            RoyalSeal => RelicDef {
                name: "Royal Seal",
                rarity: Rare,
                description: "+6 damage on blackjack wins",
                shop_cost: 35,
            },
            VelvetGlove => RelicDef {
                name: "Velvet Glove",
                rarity: Rare,
                description: "Heal 3 HP on blackjack wins",
                shop_cost: 32,
            },
            MarkedDeck => RelicDef {
                name: "Marked Deck",
                rarity: Rare,
                description: "First card redraws until it ranks 8 or higher",
                shop_cost: 38,
            },
            IronHeart => RelicDef {
                name: "Iron Heart",
                rarity: Rare,
                description: "+10 max HP, heal 10 HP",
                shop_cost: 34,
            },
            CrownOfTheHouse => RelicDef {
                name: "Crown of the House",
                rarity: Legendary,
                description: "+4 damage, +10% crit chance",
                shop_cost: 60,
            },
            MidasHandshake => RelicDef {
                name: "Midas Handshake",
                rarity: Legendary,
                description: "+35% gold from wins",
                shop_cost: 58,
            },
            Phylactery => RelicDef {
                name: "Phylactery",
                rarity: Legendary,
                description: "+15 max HP, +1 bust guard per encounter",
                shop_cost: 65,
            },
        }
    }

    pub fn rarity(&self) -> Rarity {
        self.def().rarity
    }

    /// 套用遺物效果
    ///
    /// 只改動 stats / hp / max_hp；上限夾緊由 `Run::apply_relic` 統一執行。
    pub fn apply(&self, run: &mut Run) {
        use RelicId::*;
        let stats = &mut run.player.stats;
        match self {
            RustyKnuckles => stats.flat_damage += 2,
            OakShield => stats.block += 2,
            LoadedDie => stats.crit_chance += 0.05,
            GreasyChips => stats.chips_on_win_hand += 2,
            BentHorseshoe => stats.chips_on_push += 2,
            TravelFlask => stats.heal_on_encounter_start += 3,
            PaddedVest => stats.bust_block += 2,
            IronResolve => stats.stand_win_damage += 3,
            DoublersRing => stats.double_win_damage += 4,
            TwinBlades => stats.split_win_damage += 3,
            FirstBlood => stats.first_hand_damage += 4,
            BerserkerSalt => stats.low_hp_damage += 4,
            GildedTooth => stats.gold_multiplier += 0.15,
            SafetyNet => stats.bust_guard_per_encounter += 1,
            FieldRations => stats.heal_on_win_hand += 1,
            HedgedBet => stats.double_loss_block += 3,
            GiantSlayer => stats.elite_damage += 6,
            DealersCurse => stats.dealer_bust_bonus_damage += 5,
            RoyalSeal => stats.blackjack_bonus_damage += 6,
            VelvetGlove => stats.blackjack_heal += 3,
            MarkedDeck => stats.lucky_start += 1,
            IronHeart => {
                run.player.max_hp += 10;
                run.player.hp += 10;
            }
            CrownOfTheHouse => {
                stats.flat_damage += 4;
                stats.crit_chance += 0.10;
            }
            MidasHandshake => stats.gold_multiplier += 0.35,
            Phylactery => {
                run.player.max_hp += 15;
                stats.bust_guard_per_encounter += 1;
            }
        }
    }

    /// 持久化鍵（存檔中以字串引用遺物）
    pub fn as_key(&self) -> &'static str {
        use RelicId::*;
        match self {
            RustyKnuckles => "rusty_knuckles",
            OakShield => "oak_shield",
            LoadedDie => "loaded_die",
            GreasyChips => "greasy_chips",
            BentHorseshoe => "bent_horseshoe",
            TravelFlask => "travel_flask",
            PaddedVest => "padded_vest",
            IronResolve => "iron_resolve",
            DoublersRing => "doublers_ring",
            TwinBlades => "twin_blades",
            FirstBlood => "first_blood",
            BerserkerSalt => "berserker_salt",
            GildedTooth => "gilded_tooth",
            SafetyNet => "safety_net",
            FieldRations => "field_rations",
            HedgedBet => "hedged_bet",
            GiantSlayer => "giant_slayer",
            DealersCurse => "dealers_curse",
            RoyalSeal => "royal_seal",
            VelvetGlove => "velvet_glove",
            MarkedDeck => "marked_deck",
            IronHeart => "iron_heart",
            CrownOfTheHouse => "crown_of_the_house",
            MidasHandshake => "midas_handshake",
            Phylactery => "phylactery",
        }
    }

    /// 從持久化鍵還原；目錄中不存在的鍵回傳 `None`（載入時丟棄）
    pub fn from_key(key: &str) -> Option<RelicId> {
        RelicId::all().iter().copied().find(|id| id.as_key() == key)
    }
}

// ============================================================================
// 單元測試
// ============================================================================
