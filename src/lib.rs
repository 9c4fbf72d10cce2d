//! Relic Blackjack 模擬核心
//!
//! 單人 21 點爬塔的規則引擎：`game` 層是純規則內容（牌、手牌
//! 評估、遺物、敵人、經濟、存檔清洗），`service` 層持有會話
//! 狀態並對渲染端提供快照/行動橋接。沒有渲染、沒有輸入裝置、
//! 沒有傳輸層；宿主每幀呼叫 `update(dt)` 並透過模式閘門方法
//! 餵玩家行動。

pub mod game;
pub mod service;

pub use game::{Card, Profile, RelicId, Run};
pub use service::{Mode, SimulationState};
