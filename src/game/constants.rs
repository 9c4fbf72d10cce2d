//! 遊戲常量定義

// ============================================================================
// 牌靴規則常量
// ============================================================================

pub const DECKS_PER_SHOE: usize = 4; // 牌靴牌組數
pub const RESHUFFLE_THRESHOLD: usize = 6; // 低於此張數時將棄牌堆洗回牌靴
pub const BLACKJACK_TARGET: u32 = 21; // 目標點數
pub const DEALER_STAND_TOTAL: u32 = 17; // 莊家停牌點數（軟硬 17 皆停）

// Lucky Start：前 N 張玩家起手牌重抽，直到點數 >= 8 或嘗試耗盡
pub const LUCKY_START_MIN_RANK: u8 = 8;
pub const LUCKY_START_ATTEMPTS: u32 = 7;

// ============================================================================
// 玩家數值上限（每次購買遺物後重新夾緊）
// ============================================================================

pub const CRIT_CHANCE_CAP: f32 = 0.6;
pub const FLAT_DAMAGE_CAP: i32 = 14;
pub const BLOCK_CAP: i32 = 10;
pub const GOLD_MULTIPLIER_MIN: f32 = 0.5;
pub const GOLD_MULTIPLIER_MAX: f32 = 2.35;

pub const CRIT_MULTIPLIER: i32 = 2; // 暴擊倍率（套用在結算映射，不在傷害落點）

// ============================================================================
// Run 進度常量
// ============================================================================

pub const MAX_FLOOR: u32 = 3;
pub const ROOMS_PER_FLOOR: u32 = 5;
pub const STARTING_MAX_HP: i32 = 50;
pub const STARTING_GOLD: i64 = 15;

// ============================================================================
// 獎勵與商店常量
// ============================================================================

pub const REWARD_OPTION_COUNT: usize = 3;
pub const SHOP_STOCK_COUNT: usize = 3;
// 未擁有優先偏好只作用在前 N 個抽取
pub const REWARD_UNOWNED_BIAS: usize = 3;
pub const SHOP_UNOWNED_BIAS: usize = 2;

pub const HEAL_ITEM_NAME: &str = "Patch Kit";
pub const HEAL_ITEM_HP: i32 = 10;
pub const HEAL_ITEM_BASE_COST: i64 = 10;
pub const SHOP_FLOOR_MARKUP: i64 = 2; // 每層樓的加價

// ============================================================================
// 計時常量（由宿主的 update(dt) 推進，單位秒）
// ============================================================================

pub const INTRO_CHAR_INTERVAL: f32 = 0.03; // 開場對白打字機速度
pub const RESOLVE_PROMPT_DELAY: f32 = 0.9; // 結算後提示下一手的延遲
pub const ENEMY_DEFEAT_DURATION: f32 = 1.1; // 敵人倒下轉場時長
pub const PLAYER_DEFEAT_DURATION: f32 = 1.4; // 玩家倒下轉場時長
pub const ANNOUNCE_DURATION: f32 = 2.5; // 短暫公告的存活時間

// ============================================================================
// 記錄常量
// ============================================================================

pub const LOG_CAPACITY: usize = 200; // 內部保留的記錄行數
pub const LOG_SNAPSHOT_LINES: usize = 120; // 快照輸出的最近行數
pub const RUN_HISTORY_LIMIT: usize = 20; // Profile 保留的 Run 歷史上限
