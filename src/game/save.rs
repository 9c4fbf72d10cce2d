//! 存檔序列化與防禦性載入清洗
//!
//! 寫入端走版本化信封 `{ version, data }`；載入端對任意 JSON 做
//! 逐欄位清洗：數值用帶後備值的夾緊、卡牌清單過濾到合法的
//! `{rank, suit}`、目錄中不存在的遺物鍵直接丟棄。清洗本身永不
//! 失敗——只有信封層（壞 JSON、版本不符）回傳錯誤，呼叫端據此
//! 重新開始。
//!
//! 玩家數值不直接信任存檔：從遺物清單重放 `apply_relic` 重建
//! stats 與 max_hp，再以清洗過的純量覆蓋 hp/gold/進度。這讓
//! stats 永遠和擁有的遺物一致，上限不變式天然成立。

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::cards::Card;
use super::encounter::{Encounter, HandPhase, IntroState};
use super::enemies::{Enemy, EnemyKind};
use super::profile::{Profile, RunOutcome, RunRecord};
use super::relics::RelicId;
use super::run::Run;
use super::shoe::Shoe;
use super::shop::{relic_price, ShopItem, ShopItemKind, ShopStock};

pub const SAVE_VERSION: u32 = 1;

/// 存檔鍵（交給 Storage 收藏）
pub const KEY_RUN: &str = "run";
pub const KEY_PROFILE: &str = "profile";

/// 信封層錯誤；清洗層沒有錯誤可言
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported save version {0}")]
    Version(u32),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    data: Value,
}

/// 包上版本信封並序列化
pub fn encode(data: Value) -> String {
    let envelope = Envelope {
        version: SAVE_VERSION,
        data,
    };
    serde_json::to_string(&envelope).unwrap_or_else(|_| "{}".to_string())
}

/// 拆信封；壞 JSON 或版本不符回傳錯誤，呼叫端重新開始
pub fn decode(raw: &str) -> Result<Value, SaveError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    if envelope.version != SAVE_VERSION {
        return Err(SaveError::Version(envelope.version));
    }
    Ok(envelope.data)
}

// ============================================================================
// 清洗輔助：帶後備值的夾緊讀取
// ============================================================================

fn field<'a>(value: &'a Value, key: &str) -> &'a Value {
    value.get(key).unwrap_or(&Value::Null)
}

fn i64_in(value: &Value, min: i64, max: i64, fallback: i64) -> i64 {
    match value.as_f64() {
        Some(n) if n.is_finite() => (n.floor() as i64).clamp(min, max),
        _ => fallback,
    }
}

fn u32_in(value: &Value, min: u32, max: u32, fallback: u32) -> u32 {
    i64_in(value, min as i64, max as i64, fallback as i64) as u32
}

fn i32_in(value: &Value, min: i32, max: i32, fallback: i32) -> i32 {
    i64_in(value, min as i64, max as i64, fallback as i64) as i32
}

fn bool_or(value: &Value, fallback: bool) -> bool {
    value.as_bool().unwrap_or(fallback)
}

fn str_or(value: &Value, fallback: &str) -> String {
    value.as_str().unwrap_or(fallback).to_string()
}

// ============================================================================
// 卡牌
// ============================================================================

fn card_to_value(card: &Card) -> Value {
    json!({ "rank": card.rank, "suit": card.suit })
}

fn cards_to_value(cards: &[Card]) -> Value {
    Value::Array(cards.iter().map(card_to_value).collect())
}

/// 過濾到合法的 {rank, suit}；其餘一概丟棄
fn sanitize_cards(value: &Value) -> Vec<Card> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let rank = i64_in(field(entry, "rank"), 0, 255, 0) as u8;
            let suit = i64_in(field(entry, "suit"), 0, 255, 255) as u8;
            Card::is_well_formed(rank, suit).then(|| Card::new(rank, suit))
        })
        .collect()
}

// ============================================================================
// Run
// ============================================================================

pub fn serialize_run(run: &Run) -> Value {
    let relics: Value = run
        .player
        .relics
        .iter()
        .map(|(id, count)| (id.as_key().to_string(), json!(count)))
        .collect::<serde_json::Map<String, Value>>()
        .into();

    json!({
        "floor": run.floor,
        "room": run.room,
        "max_floor": run.max_floor,
        "rooms_per_floor": run.rooms_per_floor,
        "shop_purchase_made": run.shop_purchase_made,
        "player": {
            "hp": run.player.hp,
            "max_hp": run.player.max_hp,
            "gold": run.player.gold,
            "streak": run.player.streak,
            "total_damage_dealt": run.player.total_damage_dealt,
            "total_damage_taken": run.player.total_damage_taken,
            "bust_guards_left": run.player.bust_guards_left,
            "relics": relics,
        },
    })
}

/// 從任意 JSON 重建 Run；永不失敗
///
/// stats/max_hp 由遺物重放生成，存檔裡的純量只拿來覆蓋進度。
pub fn sanitize_run(value: &Value) -> Run {
    let mut run = Run::new();

    // 先重放遺物：stats 與 max_hp 跟著長出來
    if let Some(map) = field(field(value, "player"), "relics").as_object() {
        for (key, count_value) in map {
            let Some(id) = RelicId::from_key(key) else {
                continue; // 目錄中不存在的鍵丟棄
            };
            let count = u32_in(count_value, 0, 99, 0);
            for _ in 0..count {
                run.apply_relic(id);
            }
        }
    }

    run.max_floor = u32_in(field(value, "max_floor"), 1, 9, run.max_floor);
    run.rooms_per_floor = u32_in(field(value, "rooms_per_floor"), 1, 9, run.rooms_per_floor);
    run.floor = u32_in(field(value, "floor"), 1, run.max_floor, 1);
    run.room = u32_in(field(value, "room"), 1, run.rooms_per_floor, 1);
    run.shop_purchase_made = bool_or(field(value, "shop_purchase_made"), false);

    let player = field(value, "player");
    let p = &mut run.player;
    p.hp = i32_in(field(player, "hp"), 1, p.max_hp, p.max_hp);
    p.gold = i64_in(field(player, "gold"), 0, i64::MAX, p.gold);
    p.streak = u32_in(field(player, "streak"), 0, u32::MAX, 0);
    p.total_damage_dealt = i64_in(field(player, "total_damage_dealt"), 0, i64::MAX, 0);
    p.total_damage_taken = i64_in(field(player, "total_damage_taken"), 0, i64::MAX, 0);
    p.bust_guards_left = u32_in(field(player, "bust_guards_left"), 0, 99, 0);
    p.clamp_invariants();

    run
}

// ============================================================================
// Encounter
// ============================================================================

fn kind_to_str(kind: EnemyKind) -> &'static str {
    match kind {
        EnemyKind::Normal => "normal",
        EnemyKind::Elite => "elite",
        EnemyKind::Boss => "boss",
    }
}

fn kind_from_str(raw: &str) -> EnemyKind {
    match raw {
        "elite" => EnemyKind::Elite,
        "boss" => EnemyKind::Boss,
        _ => EnemyKind::Normal,
    }
}

/// 只序列化可恢復的欄位；打字機、計時器、結算文字都是瞬態
pub fn serialize_encounter(enc: &Encounter) -> Value {
    json!({
        "enemy": {
            "name": enc.enemy.name,
            "hp": enc.enemy.hp,
            "max_hp": enc.enemy.max_hp,
            "kind": kind_to_str(enc.enemy.kind),
            "avatar_key": enc.enemy.avatar_key,
            "attack": enc.enemy.attack,
            "gold": enc.enemy.gold,
        },
        "player_hand": cards_to_value(&enc.player_hand),
        "dealer_hand": cards_to_value(&enc.dealer_hand),
        "shoe": cards_to_value(&enc.shoe.cards),
        "discard": cards_to_value(&enc.shoe.discard),
        "phase": match enc.phase { HandPhase::Player => "player", HandPhase::Resolve => "resolve" },
        "split_queue": enc.split_queue.iter().map(|h| cards_to_value(h)).collect::<Vec<_>>(),
        "split_hands_total": enc.split_hands_total,
        "split_hands_resolved": enc.split_hands_resolved,
        "split_used": enc.split_used,
        "hide_dealer_hole": enc.hide_dealer_hole,
        "double_down": enc.double_down,
        "hands_resolved": enc.hands_resolved,
    })
}

/// 重建 Encounter；敵人資料不完整時回傳 `None`（呼叫端開新遭遇）
pub fn sanitize_encounter(value: &Value) -> Option<Encounter> {
    let enemy_value = field(value, "enemy");
    let name = str_or(field(enemy_value, "name"), "");
    if name.is_empty() {
        return None;
    }
    let max_hp = i32_in(field(enemy_value, "max_hp"), 1, 9999, 0);
    if max_hp == 0 {
        return None;
    }

    let enemy = Enemy {
        name,
        max_hp,
        hp: i32_in(field(enemy_value, "hp"), 1, max_hp, max_hp),
        kind: kind_from_str(&str_or(field(enemy_value, "kind"), "normal")),
        avatar_key: str_or(field(enemy_value, "avatar_key"), "unknown"),
        attack: i32_in(field(enemy_value, "attack"), 1, 99, 5),
        gold: i64_in(field(enemy_value, "gold"), 0, 999, 4),
    };

    let mut enc = Encounter {
        enemy,
        player_hand: sanitize_cards(field(value, "player_hand")),
        dealer_hand: sanitize_cards(field(value, "dealer_hand")),
        shoe: Shoe {
            cards: sanitize_cards(field(value, "shoe")),
            discard: sanitize_cards(field(value, "discard")),
        },
        phase: match str_or(field(value, "phase"), "resolve").as_str() {
            "player" => HandPhase::Player,
            _ => HandPhase::Resolve,
        },
        // 開場對白是瞬態：恢復的遭遇直接進牌桌
        intro: IntroState {
            active: false,
            ready: true,
            dialogue: String::new(),
            visible_chars: 0,
            type_timer: 0.0,
        },
        split_queue: field(value, "split_queue")
            .as_array()
            .map(|hands| hands.iter().map(sanitize_cards).collect())
            .unwrap_or_default(),
        // 攤牌中斷的存檔不還原待攤牌手，回到結算階段重新發牌
        finished_hands: Vec::new(),
        split_hands_total: u32_in(field(value, "split_hands_total"), 0, 8, 0),
        split_hands_resolved: u32_in(field(value, "split_hands_resolved"), 0, 8, 0),
        split_used: bool_or(field(value, "split_used"), false),
        hide_dealer_hole: bool_or(field(value, "hide_dealer_hole"), true),
        resolve_timer: 0.0,
        next_deal_prompted: false,
        double_down: bool_or(field(value, "double_down"), false),
        bust_guard_triggered: false,
        crit_triggered: false,
        last_player_action: None,
        result_text: String::new(),
        result_tone: super::encounter::ResultTone::Info,
        hands_resolved: u32_in(field(value, "hands_resolved"), 0, 999, 0),
        clock: 0.0,
    };

    // 手牌不完整就回到結算階段等待重新發牌
    if enc.phase == HandPhase::Player
        && (enc.player_hand.len() < 2 || enc.dealer_hand.len() < 2)
    {
        enc.discard_table();
        enc.phase = HandPhase::Resolve;
    }

    Some(enc)
}

// ============================================================================
// ShopStock
// ============================================================================

pub fn serialize_shop(stock: &ShopStock) -> Value {
    let items: Vec<Value> = stock
        .items
        .iter()
        .map(|item| match item.kind {
            ShopItemKind::Relic(id) => json!({
                "type": "relic",
                "relic": id.as_key(),
                "cost": item.cost,
                "sold": item.sold,
            }),
            ShopItemKind::Heal => json!({
                "type": "heal",
                "cost": item.cost,
                "sold": item.sold,
            }),
        })
        .collect();
    json!({ "items": items })
}

/// 重建庫存；未知遺物鍵或未知種類的格子直接丟棄
pub fn sanitize_shop(value: &Value, floor: u32) -> ShopStock {
    let Some(entries) = field(value, "items").as_array() else {
        return ShopStock::default();
    };

    let items = entries
        .iter()
        .filter_map(|entry| {
            let kind = match str_or(field(entry, "type"), "").as_str() {
                "relic" => {
                    let id = RelicId::from_key(&str_or(field(entry, "relic"), ""))?;
                    ShopItemKind::Relic(id)
                }
                "heal" => ShopItemKind::Heal,
                _ => return None,
            };
            let fallback_cost = match kind {
                ShopItemKind::Relic(id) => relic_price(id, floor),
                ShopItemKind::Heal => super::shop::heal_price(floor),
            };
            Some(ShopItem {
                kind,
                cost: i64_in(field(entry, "cost"), 0, 9999, fallback_cost),
                sold: bool_or(field(entry, "sold"), false),
            })
        })
        .collect();

    ShopStock { items }
}

// ============================================================================
// Profile
// ============================================================================

pub fn serialize_profile(profile: &Profile) -> Value {
    let collection: Value = profile
        .relic_collection
        .iter()
        .map(|(id, count)| (id.as_key().to_string(), json!(count)))
        .collect::<serde_json::Map<String, Value>>()
        .into();
    let history: Vec<Value> = profile
        .history
        .iter()
        .map(|record| {
            json!({
                "outcome": match record.outcome {
                    RunOutcome::Victory => "victory",
                    RunOutcome::Defeat => "defeat",
                },
                "floor": record.floor,
                "room": record.room,
                "gold": record.gold,
                "relic_count": record.relic_count,
            })
        })
        .collect();

    json!({
        "relic_collection": collection,
        "runs_started": profile.runs_started,
        "runs_won": profile.runs_won,
        "hands_played": profile.hands_played,
        "blackjacks": profile.blackjacks,
        "enemies_defeated": profile.enemies_defeated,
        "chips_earned": profile.chips_earned,
        "damage_taken": profile.damage_taken,
        "pushes": profile.pushes,
        "splits_used": profile.splits_used,
        "doubles_won": profile.doubles_won,
        "best_floor": profile.best_floor,
        "history": history,
    })
}

pub fn sanitize_profile(value: &Value) -> Profile {
    let mut profile = Profile::default();

    if let Some(map) = field(value, "relic_collection").as_object() {
        for (key, count_value) in map {
            if let Some(id) = RelicId::from_key(key) {
                let count = u32_in(count_value, 0, 9999, 0);
                if count > 0 {
                    profile.relic_collection.insert(id, count);
                }
            }
        }
    }

    let counter = |key: &str| i64_in(field(value, key), 0, i64::MAX, 0) as u64;
    profile.runs_started = counter("runs_started");
    profile.runs_won = counter("runs_won");
    profile.hands_played = counter("hands_played");
    profile.blackjacks = counter("blackjacks");
    profile.enemies_defeated = counter("enemies_defeated");
    profile.chips_earned = counter("chips_earned");
    profile.damage_taken = counter("damage_taken");
    profile.pushes = counter("pushes");
    profile.splits_used = counter("splits_used");
    profile.doubles_won = counter("doubles_won");
    profile.best_floor = u32_in(field(value, "best_floor"), 0, 99, 0);

    if let Some(entries) = field(value, "history").as_array() {
        for entry in entries.iter().take(super::constants::RUN_HISTORY_LIMIT) {
            let outcome = match str_or(field(entry, "outcome"), "").as_str() {
                "victory" => RunOutcome::Victory,
                "defeat" => RunOutcome::Defeat,
                _ => continue,
            };
            profile.history.push(RunRecord {
                outcome,
                floor: u32_in(field(entry, "floor"), 1, 99, 1),
                room: u32_in(field(entry, "room"), 1, 99, 1),
                gold: i64_in(field(entry, "gold"), 0, i64::MAX, 0),
                relic_count: u32_in(field(entry, "relic_count"), 0, 9999, 0),
            });
        }
    }

    profile
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let raw = encode(json!({"hello": 1}));
        let data = decode(&raw).unwrap();
        assert_eq!(data["hello"], json!(1));
    }

    #[test]
    fn test_decode_rejects_garbage_and_bad_version() {
        assert!(decode("not json at all").is_err());
        assert!(matches!(
            decode(r#"{"version": 99, "data": {}}"#),
            Err(SaveError::Version(99))
        ));
    }

    #[test]
    fn test_run_round_trip() {
        let mut run = Run::new();
        run.apply_relic(RelicId::OakShield);
        run.apply_relic(RelicId::GildedTooth);
        run.floor = 2;
        run.room = 3;
        run.player.hp = 17;
        run.player.gold = 88;

        let restored = sanitize_run(&serialize_run(&run));
        assert_eq!(restored.floor, 2);
        assert_eq!(restored.room, 3);
        assert_eq!(restored.player.hp, 17);
        assert_eq!(restored.player.gold, 88);
        assert_eq!(restored.player.relic_count(RelicId::OakShield), 1);
        assert_eq!(restored.player.stats.block, run.player.stats.block);
    }

    #[test]
    fn test_sanitize_run_survives_non_numeric_hp() {
        let value = json!({
            "floor": 2,
            "player": { "hp": "not-a-number", "gold": -50 },
        });
        let run = sanitize_run(&value);
        assert!(run.player.hp >= 1 && run.player.hp <= run.player.max_hp);
        assert_eq!(run.player.gold, 0);
        assert!(run.player.stats.within_caps());
    }

    #[test]
    fn test_sanitize_run_drops_unknown_relic_keys() {
        let value = json!({
            "player": { "relics": { "oak_shield": 2, "hacked_relic": 5, "loaded_die": "x" } },
        });
        let run = sanitize_run(&value);
        assert_eq!(run.player.relic_count(RelicId::OakShield), 2);
        assert_eq!(run.player.relics.len(), 1);
        // 重放的遺物效果存在
        assert_eq!(run.player.stats.block, 4);
    }

    #[test]
    fn test_sanitize_run_on_garbage_inputs_never_panics() {
        for value in [
            json!(null),
            json!(42),
            json!("corrupt"),
            json!([1, 2, 3]),
            json!({"player": "nope"}),
            json!({"floor": -5, "room": 9999}),
        ] {
            let run = sanitize_run(&value);
            assert!(run.player.hp >= 1);
            assert!(run.floor >= 1 && run.floor <= run.max_floor);
        }
    }

    #[test]
    fn test_encounter_round_trip_filters_bad_cards() {
        use crate::game::enemies::{Enemy, EnemyKind};
        use rand::SeedableRng;

        let mut rng = rand::rngs::StdRng::seed_from_u64(2);
        let enemy = Enemy {
            name: "Pit Rat".into(),
            hp: 12,
            max_hp: 20,
            kind: EnemyKind::Normal,
            avatar_key: "pit_rat".into(),
            attack: 6,
            gold: 4,
        };
        let mut enc = Encounter::new(enemy, "squeak".into(), &mut rng);
        enc.deal_initial(0, &mut rng);

        let mut value = serialize_encounter(&enc);
        // 汙染一張牌
        value["player_hand"][0] = json!({"rank": 77, "suit": 0});

        let restored = sanitize_encounter(&value).expect("encounter should restore");
        assert_eq!(restored.enemy.hp, 12);
        // 壞牌被過濾後手牌不完整，回到結算階段
        assert_eq!(restored.phase, HandPhase::Resolve);
        assert!(!restored.intro.active);
    }

    #[test]
    fn test_sanitize_encounter_without_enemy_is_none() {
        assert!(sanitize_encounter(&json!({})).is_none());
        assert!(sanitize_encounter(&json!({"enemy": {"name": ""}})).is_none());
    }

    #[test]
    fn test_shop_round_trip_drops_unknown_relics() {
        let stock = ShopStock::from_reward_options(&[RelicId::RoyalSeal], 2);
        let mut value = serialize_shop(&stock);
        value["items"]
            .as_array_mut()
            .unwrap()
            .push(json!({"type": "relic", "relic": "missing_relic", "cost": 5}));
        value["items"]
            .as_array_mut()
            .unwrap()
            .push(json!({"type": "heal", "cost": 12, "sold": true}));

        let restored = sanitize_shop(&value, 2);
        assert_eq!(restored.items.len(), 2);
        assert!(matches!(
            restored.items[0].kind,
            ShopItemKind::Relic(RelicId::RoyalSeal)
        ));
        assert!(restored.items[1].sold);
    }

    #[test]
    fn test_profile_round_trip() {
        let mut profile = Profile::default();
        profile.runs_started = 4;
        profile.blackjacks = 9;
        profile.best_floor = 3;
        profile.record_relic(RelicId::Phylactery);
        let run = Run::new();
        profile.archive_run(&run, RunOutcome::Victory);

        let restored = sanitize_profile(&serialize_profile(&profile));
        assert_eq!(restored.runs_started, 4);
        assert_eq!(restored.blackjacks, 9);
        assert_eq!(restored.runs_won, 1);
        assert_eq!(restored.relic_collection[&RelicId::Phylactery], 1);
        assert_eq!(restored.history.len(), 1);
    }
}
