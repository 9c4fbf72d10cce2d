//! 會話層：狀態機、快照橋接與協作者接線

pub mod hooks;
pub mod snapshot;
pub mod state;
pub mod storage;

#[cfg(test)]
mod integration_tests;

pub use hooks::{
    AudioSink, EffectsSink, MemoryStorage, NullAudio, NullEffects, RecordingAudio,
    RecordingEffects, Storage,
};
pub use snapshot::{
    game_over_snapshot, menu_snapshot, playing_snapshot, reward_snapshot, shop_snapshot,
    GameOverSnapshot, MenuSnapshot, PlayingSnapshot, RewardSnapshot, ShopSnapshot, StatusFlags,
};
pub use state::{Mode, PendingTransition, SimulationState, TransitionTarget};
pub use storage::FileStorage;
