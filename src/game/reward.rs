//! 獎勵生成：稀有度權重抽樣與反重複偏好
//!
//! 所有抽樣都吃注入的 `StdRng`，同種子同輸入必得同結果。

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::constants::{REWARD_OPTION_COUNT, REWARD_UNOWNED_BIAS, SHOP_UNOWNED_BIAS};
use super::relics::{Rarity, RelicId};
use super::run::Run;

/// 抽樣來源（商店在高樓層比獎勵更偏稀有）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelicSource {
    Reward,
    Shop,
}

/// 每個 {來源, 樓層} 的固定權重表
/// 順序對應 `Rarity::ORDER`：common / uncommon / rare / legendary
pub fn rarity_weights(source: RelicSource, floor: u32) -> [u32; 4] {
    match (source, floor) {
        (RelicSource::Reward, 1) => [62, 28, 9, 1],
        (RelicSource::Reward, 2) => [45, 35, 16, 4],
        (RelicSource::Reward, _) => [30, 38, 24, 8],
        (RelicSource::Shop, 1) => [55, 30, 12, 3],
        (RelicSource::Shop, 2) => [35, 35, 22, 8],
        (RelicSource::Shop, _) => [20, 35, 30, 15],
    }
}

/// 權重抽一個稀有度；全零權重退回 Common
pub fn sample_rarity(weights: &[u32; 4], rng: &mut StdRng) -> Rarity {
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return Rarity::Common;
    }
    let mut roll = rng.gen_range(0..total);
    for (rarity, &weight) in Rarity::ORDER.iter().zip(weights.iter()) {
        if roll < weight {
            return *rarity;
        }
        roll -= weight;
    }
    Rarity::Common
}

/// 從池中抽 `count` 個不重複的遺物
///
/// 每個名額先擲目標稀有度；前 N 個名額（商店 2、獎勵 3）優先給
/// 玩家一件都沒有的遺物，之後允許重複擁有。目標稀有度在池中
/// 無貨時退回整個剩餘池（仍然未擁有優先）。
pub fn sample_relics(
    pool: &[RelicId],
    count: usize,
    source: RelicSource,
    floor: u32,
    run: &Run,
    rng: &mut StdRng,
) -> Vec<RelicId> {
    let weights = rarity_weights(source, floor);
    let unowned_bias = match source {
        RelicSource::Reward => REWARD_UNOWNED_BIAS,
        RelicSource::Shop => SHOP_UNOWNED_BIAS,
    };

    let mut working: Vec<RelicId> = pool.to_vec();
    let mut picks = Vec::with_capacity(count);

    for slot in 0..count {
        if working.is_empty() {
            break;
        }
        let target = sample_rarity(&weights, rng);
        let prefer_unowned = slot < unowned_bias;

        let pick = pick_from(&working, target, prefer_unowned, run, rng);
        if let Some(id) = pick {
            working.retain(|&w| w != id);
            picks.push(id);
        }
    }

    picks
}

fn pick_from(
    working: &[RelicId],
    target: Rarity,
    prefer_unowned: bool,
    run: &Run,
    rng: &mut StdRng,
) -> Option<RelicId> {
    let by_rarity: Vec<RelicId> = working
        .iter()
        .copied()
        .filter(|id| id.rarity() == target)
        .collect();
    // 目標稀有度無貨時退回整個剩餘池
    let candidates = if by_rarity.is_empty() {
        working.to_vec()
    } else {
        by_rarity
    };

    if prefer_unowned {
        let unowned: Vec<RelicId> = candidates
            .iter()
            .copied()
            .filter(|id| run.player.relic_count(*id) == 0)
            .collect();
        if let Some(&id) = unowned.choose(rng) {
            return Some(id);
        }
    }
    candidates.choose(rng).copied()
}

/// 生成擊敗敵人後的獎勵選項
///
/// 頭目戰先強制塞入一個頭目池遺物（不走稀有度抽樣），
/// 其餘名額用一般抽樣補滿，已在場的 id 跳過。
pub fn generate_reward_options(run: &Run, boss: bool, rng: &mut StdRng) -> Vec<RelicId> {
    let mut options: Vec<RelicId> = Vec::with_capacity(REWARD_OPTION_COUNT);

    if boss {
        if let Some(&id) = RelicId::boss_pool().choose(rng) {
            options.push(id);
        }
    }

    let pool: Vec<RelicId> = RelicId::all()
        .iter()
        .copied()
        .filter(|id| !options.contains(id))
        .collect();
    let remaining = REWARD_OPTION_COUNT.saturating_sub(options.len());
    options.extend(sample_relics(
        &pool,
        remaining,
        RelicSource::Reward,
        run.floor,
        run,
        rng,
    ));

    options
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_sample_rarity_zero_weights_is_common() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample_rarity(&[0, 0, 0, 0], &mut rng), Rarity::Common);
    }

    #[test]
    fn test_sample_rarity_single_weight() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(sample_rarity(&[0, 0, 0, 9], &mut rng), Rarity::Legendary);
        }
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let run = Run::new();
        let pool = RelicId::all();

        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(
            sample_relics(pool, 3, RelicSource::Shop, 2, &run, &mut a),
            sample_relics(pool, 3, RelicSource::Shop, 2, &run, &mut b),
        );

        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(
            generate_reward_options(&run, true, &mut a),
            generate_reward_options(&run, true, &mut b),
        );
    }

    #[test]
    fn test_no_duplicates_within_a_call() {
        let run = Run::new();
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picks = sample_relics(RelicId::all(), 5, RelicSource::Reward, 3, &run, &mut rng);
            let mut dedup = picks.clone();
            dedup.sort();
            dedup.dedup();
            assert_eq!(picks.len(), dedup.len());
        }
    }

    #[test]
    fn test_unowned_bias_prefers_new_relics() {
        let mut run = Run::new();
        // 擁有除了兩件以外的全部遺物
        for id in RelicId::all() {
            if !matches!(id, RelicId::OakShield | RelicId::RustyKnuckles) {
                run.player.relics.insert(*id, 1);
            }
        }
        // 前幾個名額應該幾乎總是落在未擁有的那兩件
        let mut hit = 0;
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picks = sample_relics(RelicId::all(), 1, RelicSource::Reward, 1, &run, &mut rng);
            if matches!(picks[0], RelicId::OakShield | RelicId::RustyKnuckles) {
                hit += 1;
            }
        }
        assert_eq!(hit, 30);
    }

    #[test]
    fn test_boss_reward_includes_boss_relic() {
        let run = Run::new();
        let mut rng = StdRng::seed_from_u64(11);
        let options = generate_reward_options(&run, true, &mut rng);
        assert_eq!(options.len(), REWARD_OPTION_COUNT);
        assert!(RelicId::boss_pool().contains(&options[0]));
        // 不得重複
        let mut dedup = options.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), options.len());
    }
}
