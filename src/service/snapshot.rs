//! 渲染快照：每個模式一個純函數建構器
//!
//! 模式不符回傳 `None`，渲染端不用自己防呆。DTO 裡的數字都
//! 已經算好（點數、可用行動、轉場進度），渲染端只負責畫。

use crate::game::constants::LOG_SNAPSHOT_LINES;
use crate::game::{hand_value, Card, EnemyKind, HandPhase, Rarity, RelicId, ResultTone};

use super::state::{Mode, SimulationState, TransitionTarget};

// ============================================================================
// DTO
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct CardView {
    pub rank: u8,
    pub suit: u8,
    pub hidden: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HandView {
    pub cards: Vec<CardView>,
    /// 只計入可見牌；蓋著的暗牌不洩漏點數
    pub total: u32,
    pub soft: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransitionView {
    pub target: TransitionTarget,
    pub duration: f32,
    pub remaining: f32,
    pub waiting: bool,
    /// 0.0 ..= 1.0
    pub progress: f32,
}

/// 預先算好的行動可用旗標
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub can_hit: bool,
    pub can_stand: bool,
    pub can_double: bool,
    pub can_split: bool,
    pub can_deal: bool,
    pub can_ack: bool,
    pub intro_active: bool,
    pub intro_ready: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerView {
    pub hp: i32,
    pub max_hp: i32,
    pub gold: i64,
    pub streak: u32,
    pub bust_guards_left: u32,
    pub relic_count: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnemyView {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub kind: EnemyKind,
    pub avatar_key: String,
    pub attack: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntroView {
    /// 打字機目前可見的前綴
    pub text: String,
    pub done: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayingSnapshot {
    pub floor: u32,
    pub room: u32,
    pub player: PlayerView,
    pub enemy: EnemyView,
    pub player_hand: HandView,
    pub dealer_hand: HandView,
    pub intro: Option<IntroView>,
    pub result_text: String,
    pub result_tone: ResultTone,
    pub split_hands_total: u32,
    pub split_hands_resolved: u32,
    pub transition: Option<TransitionView>,
    pub status: StatusFlags,
    pub announcement: Option<String>,
    pub log: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelicOptionView {
    pub id: RelicId,
    pub name: &'static str,
    pub rarity: Rarity,
    pub description: &'static str,
    pub owned_count: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RewardSnapshot {
    pub options: Vec<RelicOptionView>,
    pub selected_index: usize,
    pub player: PlayerView,
    pub floor: u32,
    pub room: u32,
    pub log: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShopItemView {
    pub name: &'static str,
    pub description: &'static str,
    pub cost: i64,
    pub sold: bool,
    pub affordable: bool,
    pub is_heal: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShopSnapshot {
    pub items: Vec<ShopItemView>,
    pub selected_index: usize,
    pub purchase_made: bool,
    pub player: PlayerView,
    pub floor: u32,
    pub log: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameOverSnapshot {
    pub victory: bool,
    pub floor: u32,
    pub room: u32,
    pub gold: i64,
    pub relic_count: u32,
    pub total_damage_dealt: i64,
    pub total_damage_taken: i64,
    pub announcement: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MenuSnapshot {
    pub has_saved_run: bool,
    pub runs_started: u64,
    pub runs_won: u64,
    pub best_floor: u32,
    pub collection_size: usize,
}

// ============================================================================
// 建構器
// ============================================================================

fn card_view(card: &Card, hidden: bool) -> CardView {
    CardView {
        rank: card.rank,
        suit: card.suit,
        hidden,
    }
}

fn hand_view(cards: &[Card], hidden_index: Option<usize>) -> HandView {
    let views: Vec<CardView> = cards
        .iter()
        .enumerate()
        .map(|(i, card)| card_view(card, hidden_index == Some(i)))
        .collect();
    let visible: Vec<Card> = cards
        .iter()
        .enumerate()
        .filter(|(i, _)| hidden_index != Some(*i))
        .map(|(_, c)| *c)
        .collect();
    let value = hand_value(&visible);
    HandView {
        cards: views,
        total: value.total,
        soft: value.soft,
    }
}

fn player_view(state: &SimulationState) -> PlayerView {
    let p = &state.run.player;
    PlayerView {
        hp: p.hp,
        max_hp: p.max_hp,
        gold: p.gold,
        streak: p.streak,
        bust_guards_left: p.bust_guards_left,
        relic_count: p.relics.values().sum(),
    }
}

fn log_tail(state: &SimulationState) -> Vec<String> {
    let skip = state.log.len().saturating_sub(LOG_SNAPSHOT_LINES);
    state.log.iter().skip(skip).cloned().collect()
}

fn status_flags(state: &SimulationState) -> StatusFlags {
    let can_act = state.can_act();
    let enc = state.encounter.as_ref();
    let can_deal = state.mode == Mode::Playing
        && state.pending_transition.is_none()
        && enc.is_some_and(|e| {
            !e.intro.active && e.phase == HandPhase::Resolve && e.next_deal_prompted
        });
    StatusFlags {
        can_hit: can_act,
        can_stand: can_act,
        can_double: can_act && enc.is_some_and(|e| e.can_double()),
        can_split: can_act && enc.is_some_and(|e| e.can_split()),
        can_deal,
        can_ack: state
            .pending_transition
            .as_ref()
            .is_some_and(|p| p.waiting),
        intro_active: enc.is_some_and(|e| e.intro.active),
        intro_ready: enc.is_some_and(|e| e.intro.ready),
    }
}

pub fn playing_snapshot(state: &SimulationState) -> Option<PlayingSnapshot> {
    if state.mode != Mode::Playing {
        return None;
    }
    let enc = state.encounter.as_ref()?;

    let hole = if enc.hide_dealer_hole && enc.dealer_hand.len() > 1 {
        Some(1)
    } else {
        None
    };
    let intro = enc.intro.active.then(|| {
        let total = enc.intro.dialogue.chars().count();
        IntroView {
            text: enc
                .intro
                .dialogue
                .chars()
                .take(enc.intro.visible_chars)
                .collect(),
            done: enc.intro.visible_chars >= total,
        }
    });
    let transition = state.pending_transition.as_ref().map(|p| TransitionView {
        target: p.target,
        duration: p.duration,
        remaining: (p.duration - p.timer).max(0.0),
        waiting: p.waiting,
        progress: if p.duration > 0.0 {
            (p.timer / p.duration).clamp(0.0, 1.0)
        } else {
            1.0
        },
    });

    Some(PlayingSnapshot {
        floor: state.run.floor,
        room: state.run.room,
        player: player_view(state),
        enemy: EnemyView {
            name: enc.enemy.name.clone(),
            hp: enc.enemy.hp,
            max_hp: enc.enemy.max_hp,
            kind: enc.enemy.kind,
            avatar_key: enc.enemy.avatar_key.clone(),
            attack: enc.enemy.attack,
        },
        player_hand: hand_view(&enc.player_hand, None),
        dealer_hand: hand_view(&enc.dealer_hand, hole),
        intro,
        result_text: enc.result_text.clone(),
        result_tone: enc.result_tone,
        split_hands_total: enc.split_hands_total,
        split_hands_resolved: enc.split_hands_resolved,
        transition,
        status: status_flags(state),
        announcement: state.announcement.as_ref().map(|a| a.text.clone()),
        log: log_tail(state),
    })
}

pub fn reward_snapshot(state: &SimulationState) -> Option<RewardSnapshot> {
    if state.mode != Mode::Reward {
        return None;
    }
    let options = state
        .reward_options
        .iter()
        .map(|&id| {
            let def = id.def();
            RelicOptionView {
                id,
                name: def.name,
                rarity: def.rarity,
                description: def.description,
                owned_count: state.run.player.relic_count(id),
            }
        })
        .collect();
    Some(RewardSnapshot {
        options,
        selected_index: state.selected_index,
        player: player_view(state),
        floor: state.run.floor,
        room: state.run.room,
        log: log_tail(state),
    })
}

pub fn shop_snapshot(state: &SimulationState) -> Option<ShopSnapshot> {
    if state.mode != Mode::Shop {
        return None;
    }
    let gold = state.run.player.gold;
    let items = state
        .shop
        .items
        .iter()
        .map(|item| {
            let description = match item.kind {
                crate::game::ShopItemKind::Relic(id) => id.def().description,
                crate::game::ShopItemKind::Heal => "Restores 10 HP on the spot",
            };
            ShopItemView {
                name: item.name(),
                description,
                cost: item.cost,
                sold: item.sold,
                affordable: !item.sold && gold >= item.cost,
                is_heal: item.kind == crate::game::ShopItemKind::Heal,
            }
        })
        .collect();
    Some(ShopSnapshot {
        items,
        selected_index: state.selected_index,
        purchase_made: state.run.shop_purchase_made,
        player: player_view(state),
        floor: state.run.floor,
        log: log_tail(state),
    })
}

pub fn game_over_snapshot(state: &SimulationState) -> Option<GameOverSnapshot> {
    if state.mode != Mode::GameOver {
        return None;
    }
    Some(GameOverSnapshot {
        victory: state.victory,
        floor: state.run.floor,
        room: state.run.room,
        gold: state.run.player.gold,
        relic_count: state.run.player.relics.values().sum(),
        total_damage_dealt: state.run.player.total_damage_dealt,
        total_damage_taken: state.run.player.total_damage_taken,
        announcement: state.announcement.as_ref().map(|a| a.text.clone()),
    })
}

pub fn menu_snapshot(state: &SimulationState) -> Option<MenuSnapshot> {
    if state.mode != Mode::Menu {
        return None;
    }
    Some(MenuSnapshot {
        has_saved_run: state.has_saved_run(),
        runs_started: state.profile.runs_started,
        runs_won: state.profile.runs_won,
        best_floor: state.profile.best_floor,
        collection_size: state.profile.relic_collection.len(),
    })
}

// ============================================================================
// 單元測試
// ============================================================================
