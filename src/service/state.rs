//! 模擬狀態管理
//!
//! `SimulationState` 是唯一的可變會話狀態：模式機、遭遇編排、
//! 戰鬥結算落點、計時器推進、存檔觸發。所有玩家入口都是模式
//! 閘門方法：模式不對就安靜回傳 `false`，不會恐慌也不改狀態。
//!
//! 時間由宿主的 `update(dt)` 餵進來；這裡沒有執行緒也沒有
//! 系統時鐘。

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tracing::{debug, warn};

use crate::game::constants::{
    ANNOUNCE_DURATION, ENEMY_DEFEAT_DURATION, INTRO_CHAR_INTERVAL, LOG_CAPACITY,
    PLAYER_DEFEAT_DURATION, RESOLVE_PROMPT_DELAY, SHOP_STOCK_COUNT,
};
use crate::game::save::{self, KEY_PROFILE, KEY_RUN};
use crate::game::shop::heal_amount;
use crate::game::{
    generate_reward_options, hand_outcome, is_blackjack, is_bust, loss_reduction, pick_enemy,
    win_damage, win_gold, Card, Encounter, FinishedHand, HandContext, HandOutcome, HandPhase,
    PlayerAction, Profile, RelicId, ResultTone, Run, RunOutcome, ShopItemKind, ShopStock,
};

use super::hooks::{AudioSink, EffectsSink, MemoryStorage, NullAudio, NullEffects, Storage};

/// 頂層模式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Menu,
    Playing,
    Reward,
    Shop,
    GameOver,
}

/// 轉場目的地
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionTarget {
    EnemyDefeat,
    PlayerDefeat,
}

/// 進行中的轉場
///
/// `waiting` 表示計時走完、等渲染端 `ack_transition`；
/// 無渲染端的宿主計時一到直接完成。
#[derive(Clone, Debug, PartialEq)]
pub struct PendingTransition {
    pub target: TransitionTarget,
    pub duration: f32,
    pub timer: f32,
    pub waiting: bool,
}

/// 短暫公告（大字橫幅）
#[derive(Clone, Debug, PartialEq)]
pub struct Announcement {
    pub text: String,
    pub remaining: f32,
}

/// 一個完整會話
pub struct SimulationState {
    pub rng: StdRng,
    pub mode: Mode,
    pub run: Run,
    pub profile: Profile,
    pub encounter: Option<Encounter>,
    pub reward_options: Vec<RelicId>,
    pub shop: ShopStock,
    pub selected_index: usize,
    pub pending_transition: Option<PendingTransition>,
    pub announcement: Option<Announcement>,
    pub log: VecDeque<String>,
    pub has_renderer: bool,
    pub victory: bool,

    storage: Box<dyn Storage>,
    audio: Box<dyn AudioSink>,
    effects: Box<dyn EffectsSink>,
}

fn push_log(log: &mut VecDeque<String>, line: String) {
    if log.len() >= LOG_CAPACITY {
        log.pop_front();
    }
    log.push_back(line);
}

impl SimulationState {
    pub fn new(
        seed: u64,
        storage: Box<dyn Storage>,
        audio: Box<dyn AudioSink>,
        effects: Box<dyn EffectsSink>,
    ) -> Self {
        let profile = match storage.load(KEY_PROFILE) {
            Some(raw) => match save::decode(&raw) {
                Ok(data) => save::sanitize_profile(&data),
                Err(err) => {
                    warn!(%err, "discarding unreadable profile save");
                    Profile::default()
                }
            },
            None => Profile::default(),
        };

        Self {
            rng: StdRng::seed_from_u64(seed),
            mode: Mode::Menu,
            run: Run::new(),
            profile,
            encounter: None,
            reward_options: Vec::new(),
            shop: ShopStock::default(),
            selected_index: 0,
            pending_transition: None,
            announcement: None,
            log: VecDeque::new(),
            has_renderer: true,
            victory: false,
            storage,
            audio,
            effects,
        }
    }

    /// 無渲染端的會話（模擬與測試用）：記憶體存檔、空音效，
    /// 轉場計時一到直接完成。
    pub fn headless(seed: u64) -> Self {
        let mut state = Self::new(
            seed,
            Box::new(MemoryStorage::new()),
            Box::new(NullAudio),
            Box::new(NullEffects),
        );
        state.has_renderer = false;
        state
    }

    pub fn has_saved_run(&self) -> bool {
        self.storage.load(KEY_RUN).is_some()
    }

    // ========================================================================
    // Run 生命週期
    // ========================================================================

    /// 開新 Run；只在主選單或結算畫面有效
    pub fn start_run(&mut self) -> bool {
        if self.mode != Mode::Menu && self.mode != Mode::GameOver {
            return false;
        }
        self.run = Run::new();
        self.victory = false;
        self.reward_options.clear();
        self.shop = ShopStock::default();
        self.profile.runs_started += 1;
        push_log(&mut self.log, "You step onto the casino floor.".to_string());
        self.begin_encounter();
        self.persist_run();
        self.persist_profile();
        true
    }

    /// 從存檔恢復 Run；存檔壞掉或不存在回傳 `false`
    pub fn resume_run(&mut self) -> bool {
        if self.mode != Mode::Menu {
            return false;
        }
        let Some(raw) = self.storage.load(KEY_RUN) else {
            return false;
        };
        let data = match save::decode(&raw) {
            Ok(data) => data,
            Err(err) => {
                warn!(%err, "discarding unreadable run save");
                self.storage.remove(KEY_RUN);
                return false;
            }
        };

        self.run = save::sanitize_run(data.get("run").unwrap_or(&serde_json::Value::Null));
        self.victory = false;
        self.pending_transition = None;
        self.reward_options.clear();
        self.shop = ShopStock::default();
        self.encounter = None;
        self.selected_index = 0;

        let hint = data.get("mode").and_then(|v| v.as_str()).unwrap_or("playing");
        match hint {
            "reward" => {
                if let Some(keys) = data.get("reward").and_then(|v| v.as_array()) {
                    self.reward_options = keys
                        .iter()
                        .filter_map(|k| k.as_str().and_then(RelicId::from_key))
                        .collect();
                }
                if self.reward_options.is_empty() {
                    let boss = self.run.is_boss_room();
                    self.reward_options =
                        generate_reward_options(&self.run, boss, &mut self.rng);
                }
                self.mode = Mode::Reward;
            }
            "shop" => {
                if let Some(value) = data.get("shop") {
                    self.shop = save::sanitize_shop(value, self.run.floor);
                }
                if self.shop.is_empty() {
                    self.shop = ShopStock::generate(SHOP_STOCK_COUNT, &self.run, &mut self.rng);
                    self.run.shop_purchase_made = false;
                }
                self.mode = Mode::Shop;
            }
            _ => {
                let restored = data.get("encounter").and_then(save::sanitize_encounter);
                match restored {
                    Some(enc) => {
                        self.encounter = Some(enc);
                        self.mode = Mode::Playing;
                    }
                    None => self.begin_encounter(),
                }
            }
        }

        push_log(&mut self.log, "Run resumed.".to_string());
        debug!(floor = self.run.floor, room = self.run.room, mode = ?self.mode, "run resumed");
        true
    }

    /// 結算畫面回主選單
    pub fn go_home(&mut self) -> bool {
        if self.mode != Mode::GameOver {
            return false;
        }
        self.mode = Mode::Menu;
        self.announcement = None;
        true
    }

    fn finalize_run(&mut self, outcome: RunOutcome) {
        self.victory = outcome == RunOutcome::Victory;
        self.profile.archive_run(&self.run, outcome);
        self.pending_transition = None;
        self.encounter = None;
        self.reward_options.clear();
        self.shop = ShopStock::default();
        self.mode = Mode::GameOver;
        match outcome {
            RunOutcome::Victory => {
                push_log(&mut self.log, "The House falls. You walk out rich.".to_string());
                self.audio.play("run_victory");
            }
            RunOutcome::Defeat => {
                push_log(&mut self.log, "The house always wins.".to_string());
                self.audio.play("run_defeat");
            }
        }
        self.announce(if self.victory { "VICTORY" } else { "DEFEAT" });
        self.storage.remove(KEY_RUN);
        self.persist_profile();
    }

    // ========================================================================
    // 遭遇編排
    // ========================================================================

    fn begin_encounter(&mut self) {
        let (enemy, dialogue) = pick_enemy(
            self.run.floor,
            self.run.room,
            self.run.rooms_per_floor,
            &mut self.rng,
        );
        push_log(&mut self.log, format!("{} sits down across the felt.", enemy.name));
        debug!(enemy = %enemy.name, floor = self.run.floor, room = self.run.room, "encounter begins");

        self.run.player.bust_guards_left = self.run.player.stats.bust_guard_per_encounter;
        let heal = self.run.player.stats.heal_on_encounter_start;
        if heal > 0 {
            self.run.player.heal(heal);
            push_log(&mut self.log, format!("You patch up for {heal} HP before the deal."));
        }

        self.encounter = Some(Encounter::new(enemy, dialogue, &mut self.rng));
        self.pending_transition = None;
        self.selected_index = 0;
        self.mode = Mode::Playing;
        self.audio.play("encounter_start");
    }

    /// 開場對白的兩段確認
    ///
    /// 對白尚未開始顯示時按下 → 拒絕並播錯誤音；第一次有效按下
    /// 把剩餘文字全部攤開；第二次關閉對白並發第一手牌。
    pub fn advance_encounter_intro(&mut self) -> bool {
        if self.mode != Mode::Playing {
            return false;
        }
        let Some(enc) = self.encounter.as_mut() else {
            return false;
        };
        if !enc.intro.active {
            return false;
        }
        if !enc.intro.ready {
            self.audio.play("error");
            return false;
        }
        if enc.intro.visible_chars < enc.intro.dialogue.chars().count() {
            enc.intro.reveal_all();
            self.audio.play("confirm");
            return true;
        }
        enc.intro.active = false;
        self.deal_new_hand();
        self.persist_run();
        true
    }

    fn deal_new_hand(&mut self) {
        let lucky = self.run.player.stats.lucky_start;
        let Some(enc) = self.encounter.as_mut() else {
            return;
        };
        enc.deal_initial(lucky, &mut self.rng);
        let player_natural = enc.player_has_blackjack();
        let dealer_natural = enc.dealer_has_blackjack();
        self.audio.play("deal");

        // 任一邊天生 21 點：跳過玩家回合直接攤牌，莊家不補牌
        if player_natural || dealer_natural {
            if let Some(enc) = self.encounter.as_mut() {
                enc.last_player_action = None;
                enc.stash_current_hand(None, false, false);
            }
            self.showdown(true);
        }
    }

    /// 結算停頓後由玩家要求下一手
    pub fn next_hand(&mut self) -> bool {
        if self.mode != Mode::Playing || self.pending_transition.is_some() {
            return false;
        }
        let ready = self.encounter.as_ref().is_some_and(|enc| {
            !enc.intro.active && enc.phase == HandPhase::Resolve && enc.next_deal_prompted
        });
        if !ready {
            return false;
        }
        self.deal_new_hand();
        self.persist_run();
        true
    }

    /// 玩家回合行動是否可用（快照的狀態旗標也用這個）
    pub fn can_act(&self) -> bool {
        self.mode == Mode::Playing
            && self.pending_transition.is_none()
            && self
                .encounter
                .as_ref()
                .is_some_and(|enc| !enc.intro.active && enc.phase == HandPhase::Player)
    }

    // ========================================================================
    // 玩家行動
    // ========================================================================

    pub fn hit(&mut self) -> bool {
        if !self.can_act() {
            return false;
        }
        let Some(enc) = self.encounter.as_mut() else {
            return false;
        };
        let card = enc.draw_card(&mut self.rng);
        enc.player_hand.push(card);
        self.audio.play("card");

        if is_bust(&enc.player_hand) {
            let guard_available =
                self.run.player.bust_guards_left > 0 && !enc.bust_guard_triggered;
            if guard_available {
                // 防爆：棄掉引爆的那張牌，回合繼續
                self.run.player.bust_guards_left -= 1;
                enc.bust_guard_triggered = true;
                if let Some(burned) = enc.player_hand.pop() {
                    enc.shoe.discard_card(burned);
                }
                push_log(&mut self.log, "Bust Guard burns the card before it lands.".to_string());
                self.audio.play("guard");
            } else {
                self.end_player_hand(Some(PlayerAction::Hit), false, true);
            }
        }
        self.persist_run();
        true
    }

    pub fn stand(&mut self) -> bool {
        if !self.can_act() {
            return false;
        }
        self.end_player_hand(Some(PlayerAction::Stand), false, false);
        self.persist_run();
        true
    }

    pub fn double_down(&mut self) -> bool {
        if !self.can_act() {
            return false;
        }
        let Some(enc) = self.encounter.as_mut() else {
            return false;
        };
        if !enc.can_double() {
            return false;
        }
        enc.double_down = true;
        let card = enc.draw_card(&mut self.rng);
        enc.player_hand.push(card);
        self.audio.play("card");

        let mut busted = is_bust(&enc.player_hand);
        if busted && self.run.player.bust_guards_left > 0 && !enc.bust_guard_triggered {
            self.run.player.bust_guards_left -= 1;
            enc.bust_guard_triggered = true;
            if let Some(burned) = enc.player_hand.pop() {
                enc.shoe.discard_card(burned);
            }
            push_log(&mut self.log, "Bust Guard saves the double.".to_string());
            self.audio.play("guard");
            busted = false;
        }
        // 雙倍注只拿一張牌，手到此為止
        self.end_player_hand(Some(PlayerAction::DoubleDown), true, busted);
        self.persist_run();
        true
    }

    pub fn split(&mut self) -> bool {
        if !self.can_act() {
            return false;
        }
        let Some(enc) = self.encounter.as_mut() else {
            return false;
        };
        if !enc.can_split() {
            return false;
        }
        enc.split(&mut self.rng);
        self.profile.splits_used += 1;
        push_log(&mut self.log, "You split the pair into two hands.".to_string());
        self.audio.play("split");
        self.persist_run();
        true
    }

    // ========================================================================
    // 攤牌與戰鬥結算
    // ========================================================================

    fn end_player_hand(&mut self, action: Option<PlayerAction>, doubled: bool, busted: bool) {
        let Some(enc) = self.encounter.as_mut() else {
            return;
        };
        // 分牌後所有手都以分牌加成結算
        let action = if enc.split_used {
            Some(PlayerAction::Split)
        } else {
            action
        };
        enc.last_player_action = action;
        enc.stash_current_hand(action, doubled, busted);

        if enc.split_used && enc.begin_next_split_hand(&mut self.rng) {
            self.audio.play("deal");
            return;
        }
        self.showdown(false);
    }

    /// 莊家回合加逐手結算
    ///
    /// 所有玩家手都收攤後才進來。`natural` 表示這次攤牌由天生
    /// 21 點觸發：莊家翻牌後站著不補。其餘情況莊家只在還有存活
    /// （未爆）的玩家手時補到 17；任一方倒下後剩餘的手不再結算。
    fn showdown(&mut self, natural: bool) {
        let (dealer_cards, hand_count, split_used) = {
            let Some(enc) = self.encounter.as_mut() else {
                return;
            };
            enc.phase = HandPhase::Resolve;
            enc.resolve_timer = 0.0;
            enc.next_deal_prompted = false;
            let stand_pat = natural || enc.dealer_has_blackjack();
            let any_live = enc.finished_hands.iter().any(|h| !h.busted);
            enc.hide_dealer_hole = false;
            if any_live {
                enc.dealer_play(stand_pat, &mut self.rng);
            }
            (enc.dealer_hand.clone(), enc.finished_hands.len(), enc.split_used)
        };

        for i in 0..hand_count {
            if self.pending_transition.is_some() {
                break;
            }
            let Some(hand) = self
                .encounter
                .as_ref()
                .and_then(|enc| enc.finished_hands.get(i).cloned())
            else {
                break;
            };
            self.resolve_finished_hand(hand, &dealer_cards, split_used);
        }
    }

    fn resolve_finished_hand(&mut self, hand: FinishedHand, dealer: &[Card], split_used: bool) {
        let blackjack_eligible = !split_used && is_blackjack(&hand.cards);
        let outcome = if hand.busted {
            HandOutcome::Loss { bust: true }
        } else {
            hand_outcome(&hand.cards, dealer, blackjack_eligible)
        };

        let (first_hand, enemy_attack, enemy_gold, vs_elite) = {
            let Some(enc) = self.encounter.as_mut() else {
                return;
            };
            let first = enc.hands_resolved == 0;
            enc.hands_resolved += 1;
            (first, enc.enemy.attack, enc.enemy.gold, enc.enemy.is_elite_or_boss())
        };
        self.profile.hands_played += 1;
        debug!(?outcome, first_hand, "hand resolved");

        match outcome {
            HandOutcome::Win { blackjack, dealer_bust } => {
                let ctx = HandContext {
                    action: hand.action,
                    doubled: hand.doubled,
                    first_hand,
                    low_hp: self.run.player.is_low_hp(),
                    vs_elite,
                };
                let dmg = win_damage(&self.run.player.stats, &ctx, blackjack, dealer_bust, &mut self.rng);
                let gold = win_gold(&self.run.player.stats, enemy_gold);
                self.run.player.gold += gold;
                self.profile.chips_earned += gold.max(0) as u64;
                self.run.player.streak += 1;
                if hand.doubled {
                    self.profile.doubles_won += 1;
                }
                let mut heal = self.run.player.stats.heal_on_win_hand;
                if blackjack {
                    self.profile.blackjacks += 1;
                    heal += self.run.player.stats.blackjack_heal;
                }
                self.run.player.heal(heal);

                let text = if blackjack {
                    format!("Blackjack! {} damage, +{gold} chips.", dmg.amount)
                } else if dmg.crit {
                    format!("Critical hit! {} damage, +{gold} chips.", dmg.amount)
                } else {
                    format!("You take the hand. {} damage, +{gold} chips.", dmg.amount)
                };
                self.set_result(&text, ResultTone::Win, dmg.crit);
                self.apply_impact_damage(false, dmg.amount, dmg.crit);
            }
            HandOutcome::Loss { bust } => {
                let reduction = loss_reduction(&self.run.player.stats, bust, hand.doubled);
                let incoming = enemy_attack - reduction;
                let text = if bust {
                    format!("Bust! You take {} damage.", incoming.max(1))
                } else {
                    format!("The dealer takes the hand. {} damage.", incoming.max(1))
                };
                self.set_result(&text, ResultTone::Loss, false);
                self.apply_impact_damage(true, incoming, false);
            }
            HandOutcome::Push => {
                let chips = self.run.player.stats.chips_on_push.max(0);
                self.run.player.gold += chips;
                self.profile.chips_earned += chips as u64;
                self.profile.pushes += 1;
                let text = if chips > 0 {
                    format!("Push. +{chips} chips for the tie.")
                } else {
                    "Push. Nobody bleeds.".to_string()
                };
                self.set_result(&text, ResultTone::Push, false);
                // 無傷害落點，直接重查勝敗
                self.finalize_resolve_state();
            }
        }
    }

    fn set_result(&mut self, text: &str, tone: ResultTone, crit: bool) {
        if let Some(enc) = self.encounter.as_mut() {
            enc.result_text = text.to_string();
            enc.result_tone = tone;
            enc.crit_triggered = crit;
        }
        self.effects.result_banner(text, tone);
        push_log(&mut self.log, text.to_string());
    }

    /// 傷害落點
    ///
    /// 至少 1 點、HP 觸底為 0；玩家受傷就清連勝。最後無條件
    /// 呼叫 `finalize_resolve_state`。
    fn apply_impact_damage(&mut self, on_player: bool, amount: i32, crit: bool) {
        let dmg = amount.max(1);
        if on_player {
            self.run.player.hp = (self.run.player.hp - dmg).max(0);
            self.run.player.streak = 0;
            self.run.player.total_damage_taken += dmg as i64;
            self.profile.damage_taken += dmg as u64;
            self.audio.play("player_hit");
        } else {
            if let Some(enc) = self.encounter.as_mut() {
                enc.enemy.hp = (enc.enemy.hp - dmg).max(0);
            }
            self.run.player.total_damage_dealt += dmg as i64;
            self.audio.play(if crit { "crit" } else { "enemy_hit" });
        }
        self.effects.damage_number(dmg, on_player, crit);
        self.finalize_resolve_state();
    }

    /// 勝敗重查
    ///
    /// 已有轉場排程就整個跳過（重入保護）；雙方同時歸零時
    /// 玩家倒下優先。
    fn finalize_resolve_state(&mut self) {
        if self.pending_transition.is_some() {
            return;
        }
        if self.run.player.hp <= 0 {
            self.pending_transition = Some(PendingTransition {
                target: TransitionTarget::PlayerDefeat,
                duration: PLAYER_DEFEAT_DURATION,
                timer: 0.0,
                waiting: false,
            });
            push_log(&mut self.log, "You collapse at the table.".to_string());
            self.audio.play("player_down");
            return;
        }
        let enemy_down = self
            .encounter
            .as_ref()
            .is_some_and(|enc| enc.enemy.hp <= 0);
        if enemy_down {
            self.profile.enemies_defeated += 1;
            self.pending_transition = Some(PendingTransition {
                target: TransitionTarget::EnemyDefeat,
                duration: ENEMY_DEFEAT_DURATION,
                timer: 0.0,
                waiting: false,
            });
            let name = self
                .encounter
                .as_ref()
                .map(|enc| enc.enemy.name.clone())
                .unwrap_or_default();
            push_log(&mut self.log, format!("{name} slumps off the chair."));
            self.audio.play("enemy_down");
        }
    }

    fn complete_transition(&mut self) {
        let Some(pending) = self.pending_transition.take() else {
            return;
        };
        match pending.target {
            TransitionTarget::EnemyDefeat => {
                let boss = self.run.is_boss_room();
                self.reward_options = generate_reward_options(&self.run, boss, &mut self.rng);
                self.selected_index = 0;
                self.mode = Mode::Reward;
                push_log(&mut self.log, "Pick your spoils.".to_string());
                self.persist_run();
            }
            TransitionTarget::PlayerDefeat => self.finalize_run(RunOutcome::Defeat),
        }
    }

    /// 渲染端確認轉場播完
    pub fn ack_transition(&mut self) -> bool {
        let waiting = self
            .pending_transition
            .as_ref()
            .is_some_and(|p| p.waiting);
        if !waiting {
            return false;
        }
        self.complete_transition();
        true
    }

    // ========================================================================
    // 獎勵與商店
    // ========================================================================

    /// 上下移動當前清單的游標
    pub fn move_selection(&mut self, delta: i32) -> bool {
        let len = match self.mode {
            Mode::Reward => self.reward_options.len(),
            Mode::Shop => self.shop.items.len(),
            _ => return false,
        };
        if len == 0 {
            return false;
        }
        let current = self.selected_index as i32;
        self.selected_index = (current + delta).rem_euclid(len as i32) as usize;
        self.audio.play("cursor");
        true
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        let len = match self.mode {
            Mode::Reward => self.reward_options.len(),
            Mode::Shop => self.shop.items.len(),
            _ => return false,
        };
        if index >= len {
            return false;
        }
        self.selected_index = index;
        true
    }

    /// 領取游標上的遺物獎勵，帶著剩下的獎池進營地
    pub fn claim_reward(&mut self) -> bool {
        if self.mode != Mode::Reward || self.selected_index >= self.reward_options.len() {
            return false;
        }
        let id = self.reward_options.remove(self.selected_index);
        self.run.apply_relic(id);
        self.profile.record_relic(id);
        push_log(&mut self.log, format!("Took {}.", id.def().name));
        self.audio.play("pickup");
        let leftover = std::mem::take(&mut self.reward_options);
        self.enter_camp(&leftover);
        true
    }

    /// 放棄免費獎勵；整組獎池改上營地貨架
    pub fn skip_reward(&mut self) -> bool {
        if self.mode != Mode::Reward {
            return false;
        }
        push_log(&mut self.log, "You leave the spoils on the table.".to_string());
        let leftover = std::mem::take(&mut self.reward_options);
        self.enter_camp(&leftover);
        true
    }

    /// 進營地：沒領走的獎池直接上架（同一套定價、不預設
    /// `sold`），獎池空了就整組生成。最後一間房結束則直接勝利。
    fn enter_camp(&mut self, leftover: &[RelicId]) {
        if self.run.advance_room() {
            self.finalize_run(RunOutcome::Victory);
            return;
        }
        self.shop = if leftover.is_empty() {
            ShopStock::generate(SHOP_STOCK_COUNT, &self.run, &mut self.rng)
        } else {
            ShopStock::from_reward_options(leftover, self.run.floor)
        };
        self.run.shop_purchase_made = false;
        self.selected_index = 0;
        self.mode = Mode::Shop;
        push_log(&mut self.log, "The camp shop opens its crates.".to_string());
        self.persist_run();
    }

    /// 買下游標上的商店品項；每個營地只能買一次
    pub fn buy_selected(&mut self) -> bool {
        if self.mode != Mode::Shop {
            return false;
        }
        if self.run.shop_purchase_made {
            self.audio.play("error");
            return false;
        }
        let index = self.selected_index;
        let Some(item) = self.shop.items.get(index) else {
            return false;
        };
        if item.sold || self.run.player.gold < item.cost {
            self.audio.play("error");
            return false;
        }
        let kind = item.kind;
        let cost = item.cost;
        let name = item.name();

        self.run.player.gold -= cost;
        match kind {
            ShopItemKind::Relic(id) => {
                self.run.apply_relic(id);
                self.profile.record_relic(id);
            }
            ShopItemKind::Heal => {
                self.run.player.heal(heal_amount());
            }
        }
        if let Some(item) = self.shop.items.get_mut(index) {
            item.sold = true;
        }
        self.run.shop_purchase_made = true;
        push_log(&mut self.log, format!("Bought {name} for {cost} chips."));
        self.audio.play("buy");
        self.persist_run();
        true
    }

    /// 離開營地，走向本樓層第一場遭遇
    pub fn leave_shop(&mut self) -> bool {
        if self.mode != Mode::Shop {
            return false;
        }
        self.shop = ShopStock::default();
        self.begin_encounter();
        self.persist_run();
        true
    }

    // ========================================================================
    // 時間推進
    // ========================================================================

    /// 宿主每幀餵 dt（秒）；推進公告、轉場、打字機與結算停頓
    pub fn update(&mut self, dt: f32) {
        if let Some(announcement) = self.announcement.as_mut() {
            announcement.remaining -= dt;
            if announcement.remaining <= 0.0 {
                self.announcement = None;
            }
        }
        if self.mode != Mode::Playing {
            return;
        }

        let mut complete = false;
        if let Some(pending) = self.pending_transition.as_mut() {
            if !pending.waiting {
                pending.timer += dt;
                if pending.timer >= pending.duration {
                    if self.has_renderer {
                        pending.waiting = true;
                    } else {
                        complete = true;
                    }
                }
            }
        }
        if complete {
            self.complete_transition();
            return;
        }
        if self.pending_transition.is_some() {
            return;
        }

        let Some(enc) = self.encounter.as_mut() else {
            return;
        };
        enc.clock += dt;
        if enc.intro.active {
            let intro = &mut enc.intro;
            intro.type_timer += dt;
            let total = intro.dialogue.chars().count();
            while intro.type_timer >= INTRO_CHAR_INTERVAL && intro.visible_chars < total {
                intro.type_timer -= INTRO_CHAR_INTERVAL;
                intro.visible_chars += 1;
            }
            if intro.visible_chars > 0 || total == 0 {
                intro.ready = true;
            }
            return;
        }
        if enc.phase == HandPhase::Resolve && !enc.next_deal_prompted {
            enc.resolve_timer += dt;
            if enc.resolve_timer >= RESOLVE_PROMPT_DELAY {
                enc.next_deal_prompted = true;
            }
        }
    }

    fn announce(&mut self, text: &str) {
        self.announcement = Some(Announcement {
            text: text.to_string(),
            remaining: ANNOUNCE_DURATION,
        });
    }

    // ========================================================================
    // 持久化觸發
    // ========================================================================

    fn persist_run(&mut self) {
        let mode = match self.mode {
            Mode::Playing => "playing",
            Mode::Reward => "reward",
            Mode::Shop => "shop",
            _ => return,
        };
        let mut data = json!({
            "mode": mode,
            "run": save::serialize_run(&self.run),
        });
        if let Some(enc) = self.encounter.as_ref() {
            data["encounter"] = save::serialize_encounter(enc);
        }
        if !self.shop.is_empty() {
            data["shop"] = save::serialize_shop(&self.shop);
        }
        if !self.reward_options.is_empty() {
            data["reward"] = json!(self
                .reward_options
                .iter()
                .map(|id| id.as_key())
                .collect::<Vec<_>>());
        }
        let payload = save::encode(data);
        self.storage.store(KEY_RUN, &payload);
    }

    fn persist_profile(&mut self) {
        let payload = save::encode(save::serialize_profile(&self.profile));
        self.storage.store(KEY_PROFILE, &payload);
    }
}
