//! 遭遇狀態：一場戰鬥的牌桌資料
//!
//! 這裡只放資料與小步驟操作；回合編排（誰何時呼叫莊家、結算、
//! 轉場）屬於 service 層的 `SimulationState`。

use rand::rngs::StdRng;

use super::cards::Card;
use super::constants::{
    DEALER_STAND_TOTAL, LUCKY_START_ATTEMPTS, LUCKY_START_MIN_RANK,
};
use super::enemies::Enemy;
use super::hand::{hand_value, is_blackjack};
use super::shoe::Shoe;

/// 手牌階段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPhase {
    Player,
    Resolve,
}

/// 玩家最後的行動（決定勝利加成的種類）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    Hit,
    Stand,
    DoubleDown,
    Split,
}

/// 結算文字的語氣（渲染端據此上色）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultTone {
    Win,
    Loss,
    Push,
    Info,
}

/// 開場對白狀態（打字機由 update(dt) 推進）
#[derive(Clone, Debug, PartialEq)]
pub struct IntroState {
    pub active: bool,
    pub ready: bool,
    pub dialogue: String,
    pub visible_chars: usize,
    pub type_timer: f32,
}

impl IntroState {
    pub fn new(dialogue: String) -> Self {
        Self {
            active: true,
            ready: false,
            dialogue,
            visible_chars: 0,
            type_timer: 0.0,
        }
    }

    /// 立即顯示剩餘對白
    pub fn reveal_all(&mut self) {
        self.visible_chars = self.dialogue.chars().count();
        self.ready = true;
    }
}

/// 打完等待攤牌的一手（分牌時會累積多手）
#[derive(Clone, Debug, PartialEq)]
pub struct FinishedHand {
    pub cards: Vec<Card>,
    pub action: Option<PlayerAction>,
    pub doubled: bool,
    pub busted: bool,
}

/// 一場遭遇
#[derive(Clone, Debug, PartialEq)]
pub struct Encounter {
    pub enemy: Enemy,
    pub player_hand: Vec<Card>,
    pub dealer_hand: Vec<Card>,
    pub shoe: Shoe,
    pub phase: HandPhase,
    pub intro: IntroState,

    // 分牌
    pub split_queue: Vec<Vec<Card>>,
    pub finished_hands: Vec<FinishedHand>,
    pub split_hands_total: u32,
    pub split_hands_resolved: u32,
    pub split_used: bool,

    // 手牌顯示與結算
    pub hide_dealer_hole: bool,
    pub resolve_timer: f32,
    pub next_deal_prompted: bool,
    pub double_down: bool,
    pub bust_guard_triggered: bool,
    pub crit_triggered: bool,
    pub last_player_action: Option<PlayerAction>,
    pub result_text: String,
    pub result_tone: ResultTone,

    /// 本場遭遇已結算的手數（第一手加成判定用）
    pub hands_resolved: u32,

    /// 牌桌時鐘（秒），由 update(dt) 推進；發牌時蓋在
    /// `Card::dealt_at` 上供渲染端做入場動畫
    pub clock: f32,
}

impl Encounter {
    pub fn new(enemy: Enemy, dialogue: String, rng: &mut StdRng) -> Self {
        Self {
            enemy,
            player_hand: Vec::new(),
            dealer_hand: Vec::new(),
            shoe: Shoe::fresh(rng),
            phase: HandPhase::Resolve,
            intro: IntroState::new(dialogue),
            split_queue: Vec::new(),
            finished_hands: Vec::new(),
            split_hands_total: 0,
            split_hands_resolved: 0,
            split_used: false,
            hide_dealer_hole: true,
            resolve_timer: 0.0,
            next_deal_prompted: false,
            double_down: false,
            bust_guard_triggered: false,
            crit_triggered: false,
            last_player_action: None,
            result_text: String::new(),
            result_tone: ResultTone::Info,
            hands_resolved: 0,
            clock: 0.0,
        }
    }

    /// 從牌靴抽一張並蓋上發牌時刻
    pub fn draw_card(&mut self, rng: &mut StdRng) -> Card {
        let mut card = self.shoe.draw(rng);
        card.dealt_at = self.clock;
        card
    }

    /// 發起手牌：玩家、莊家、玩家、莊家
    ///
    /// Lucky Start：玩家前 `lucky_start` 張若點數低於 8，
    /// 棄掉重抽，最多嘗試 `LUCKY_START_ATTEMPTS` 次。
    pub fn deal_initial(&mut self, lucky_start: u32, rng: &mut StdRng) {
        self.discard_table();
        self.split_queue.clear();
        self.split_hands_total = 0;
        self.split_hands_resolved = 0;
        self.split_used = false;
        self.double_down = false;
        self.bust_guard_triggered = false;
        self.crit_triggered = false;
        self.last_player_action = None;
        self.result_text.clear();
        self.result_tone = ResultTone::Info;
        self.next_deal_prompted = false;
        self.resolve_timer = 0.0;
        self.hide_dealer_hole = true;

        for i in 0..2 {
            let card = if (i as u32) < lucky_start {
                self.draw_lucky(rng)
            } else {
                self.draw_card(rng)
            };
            self.player_hand.push(card);
            let dealer_card = self.draw_card(rng);
            self.dealer_hand.push(dealer_card);
        }
        self.phase = HandPhase::Player;
    }

    fn draw_lucky(&mut self, rng: &mut StdRng) -> Card {
        let mut card = self.shoe.draw(rng);
        let mut attempts = 0;
        while card.rank < LUCKY_START_MIN_RANK && attempts < LUCKY_START_ATTEMPTS {
            self.shoe.discard_card(card);
            card = self.shoe.draw(rng);
            attempts += 1;
        }
        card.dealt_at = self.clock;
        card
    }

    pub fn player_total(&self) -> u32 {
        hand_value(&self.player_hand).total
    }

    pub fn dealer_total(&self) -> u32 {
        hand_value(&self.dealer_hand).total
    }

    pub fn player_has_blackjack(&self) -> bool {
        !self.split_used && is_blackjack(&self.player_hand)
    }

    pub fn dealer_has_blackjack(&self) -> bool {
        is_blackjack(&self.dealer_hand)
    }

    /// 兩張同點數、尚未分過牌才能分牌
    pub fn can_split(&self) -> bool {
        self.phase == HandPhase::Player
            && !self.split_used
            && self.player_hand.len() == 2
            && self.player_hand[0].rank == self.player_hand[1].rank
    }

    pub fn can_double(&self) -> bool {
        self.phase == HandPhase::Player && self.player_hand.len() == 2 && !self.double_down
    }

    /// 分牌：第二張排進佇列，當前手補一張
    pub fn split(&mut self, rng: &mut StdRng) {
        let second = self.player_hand.pop().expect("split requires two cards");
        self.split_queue.push(vec![second]);
        self.split_used = true;
        self.split_hands_total = 2;
        let draw = self.draw_card(rng);
        self.player_hand.push(draw);
    }

    /// 收起當前手：進入待攤牌清單，桌上換成空手
    pub fn stash_current_hand(&mut self, action: Option<PlayerAction>, doubled: bool, busted: bool) {
        let cards = std::mem::take(&mut self.player_hand);
        self.finished_hands.push(FinishedHand {
            cards,
            action,
            doubled,
            busted,
        });
        if self.split_used {
            self.split_hands_resolved += 1;
        }
    }

    /// 換下一個分牌手上桌並補一張牌；佇列空了回傳 `false`
    pub fn begin_next_split_hand(&mut self, rng: &mut StdRng) -> bool {
        let Some(mut next) = self.split_queue.pop() else {
            return false;
        };
        let draw = self.draw_card(rng);
        next.push(draw);
        self.player_hand = next;
        self.double_down = false;
        self.bust_guard_triggered = false;
        true
    }

    /// 莊家回合：翻開暗牌，補到 17 點（對天生 21 點不補牌）
    pub fn dealer_play(&mut self, natural: bool, rng: &mut StdRng) {
        self.hide_dealer_hole = false;
        if natural {
            return;
        }
        while self.dealer_total() < DEALER_STAND_TOTAL {
            let card = self.draw_card(rng);
            self.dealer_hand.push(card);
        }
    }

    /// 把桌面上的牌全部收進棄牌堆
    pub fn discard_table(&mut self) {
        let mut player = std::mem::take(&mut self.player_hand);
        let mut dealer = std::mem::take(&mut self.dealer_hand);
        self.shoe.discard_all(&mut player);
        self.shoe.discard_all(&mut dealer);
        for mut queued in self.split_queue.drain(..) {
            self.shoe.discard.append(&mut queued);
        }
        for mut finished in self.finished_hands.drain(..) {
            self.shoe.discard.append(&mut finished.cards);
        }
    }
}

// ============================================================================
// 單元測試
// ============================================================================
