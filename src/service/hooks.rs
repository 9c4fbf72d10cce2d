//! 協作者介面：存檔、音效、視覺回饋
//!
//! 核心透過這三個 trait 對外說話，不直接碰檔案系統或渲染端。
//! 生產環境接 `FileStorage` 與真正的播放器；測試與無渲染宿主
//! 用這裡的空實作與記錄型假件。

use crate::game::ResultTone;

/// 鍵值存檔
///
/// 失敗由實作自行記錄（`tracing::warn!`），不往上傳；
/// 玩家可達的路徑永遠不因存檔失敗而中斷。
pub trait Storage {
    fn load(&self, key: &str) -> Option<String>;
    fn store(&mut self, key: &str, payload: &str);
    fn remove(&mut self, key: &str);
}

/// 具名音效提示，射後不理
pub trait AudioSink {
    fn play(&mut self, cue: &str);
}

/// 戰鬥視覺回饋（浮動傷害數字、震動）
pub trait EffectsSink {
    fn damage_number(&mut self, amount: i32, on_player: bool, crit: bool);
    fn result_banner(&mut self, text: &str, tone: ResultTone);
}

// ============================================================================
// 空實作與測試假件
// ============================================================================

/// 不做事的音效端
#[derive(Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: &str) {}
}

/// 不做事的視覺端
#[derive(Default)]
pub struct NullEffects;

impl EffectsSink for NullEffects {
    fn damage_number(&mut self, _amount: i32, _on_player: bool, _crit: bool) {}
    fn result_banner(&mut self, _text: &str, _tone: ResultTone) {}
}

/// 記憶體存檔（測試與嵌入式宿主用）
#[derive(Default)]
pub struct MemoryStorage {
    entries: std::collections::HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn store(&mut self, key: &str, payload: &str) {
        self.entries.insert(key.to_string(), payload.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// 記錄收到的音效提示（測試用）
#[derive(Default)]
pub struct RecordingAudio {
    pub cues: Vec<String>,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: &str) {
        self.cues.push(cue.to_string());
    }
}

/// 記錄收到的視覺回饋（測試用）
#[derive(Default)]
pub struct RecordingEffects {
    pub damage_numbers: Vec<(i32, bool, bool)>,
    pub banners: Vec<String>,
}

impl EffectsSink for RecordingEffects {
    fn damage_number(&mut self, amount: i32, on_player: bool, crit: bool) {
        self.damage_numbers.push((amount, on_player, crit));
    }

    fn result_banner(&mut self, text: &str, _tone: ResultTone) {
        self.banners.push(text.to_string());
    }
}

// ============================================================================
// 單元測試
// ============================================================================
