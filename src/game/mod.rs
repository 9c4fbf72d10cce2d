//! 遊戲規則層：牌、遭遇、戰鬥數學、經濟與存檔
//!
//! 這一層不碰編排與 IO。回合推進、轉場、收藏持久化都在
//! `service` 層。

pub mod cards;
pub mod combat;
pub mod constants;
pub mod encounter;
pub mod enemies;
pub mod hand;
pub mod profile;
pub mod relics;
pub mod reward;
pub mod run;
pub mod save;
pub mod shoe;
pub mod shop;
pub mod stats;

pub use cards::Card;
pub use combat::{hand_outcome, loss_reduction, win_damage, win_gold, HandContext, HandOutcome};
pub use encounter::{Encounter, FinishedHand, HandPhase, PlayerAction, ResultTone};
pub use enemies::{pick_enemy, Enemy, EnemyKind};
pub use hand::{hand_value, is_blackjack, is_bust, HandValue};
pub use profile::{Profile, RunOutcome, RunRecord};
pub use relics::{Rarity, RelicDef, RelicId};
pub use reward::{generate_reward_options, RelicSource};
pub use run::{Player, Run};
pub use shoe::Shoe;
pub use shop::{ShopItem, ShopItemKind, ShopStock};
pub use stats::PlayerStats;
