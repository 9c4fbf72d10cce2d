//! 營地商店：庫存生成與定價

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::constants::{
    HEAL_ITEM_BASE_COST, HEAL_ITEM_HP, HEAL_ITEM_NAME, SHOP_FLOOR_MARKUP,
};
use super::relics::RelicId;
use super::reward::{sample_relics, RelicSource};
use super::run::Run;

/// 商店品項種類
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShopItemKind {
    Relic(RelicId),
    Heal,
}

/// 商店品項；`sold` 一旦為真就不再回復
#[derive(Clone, Debug, PartialEq)]
pub struct ShopItem {
    pub kind: ShopItemKind,
    pub cost: i64,
    pub sold: bool,
}

impl ShopItem {
    pub fn name(&self) -> &'static str {
        match self.kind {
            ShopItemKind::Relic(id) => id.def().name,
            ShopItemKind::Heal => HEAL_ITEM_NAME,
        }
    }
}

/// 營地的庫存
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShopStock {
    pub items: Vec<ShopItem>,
}

/// 遺物定價：目錄價 + 樓層加價 + 稀有度加價
pub fn relic_price(id: RelicId, floor: u32) -> i64 {
    let def = id.def();
    def.shop_cost + floor as i64 * SHOP_FLOOR_MARKUP + def.rarity.shop_markup()
}

pub fn heal_price(floor: u32) -> i64 {
    HEAL_ITEM_BASE_COST + floor as i64 * SHOP_FLOOR_MARKUP
}

pub fn heal_amount() -> i32 {
    HEAL_ITEM_HP
}

impl ShopStock {
    /// 生成 `count` 格庫存：`count - 1` 件商店抽樣的遺物加一件
    /// 固定的治療品，整體洗勻後截到 `count`。
    pub fn generate(count: usize, run: &Run, rng: &mut StdRng) -> Self {
        let relic_count = count.saturating_sub(1);
        let picks = sample_relics(
            RelicId::all(),
            relic_count,
            RelicSource::Shop,
            run.floor,
            run,
            rng,
        );

        let mut items: Vec<ShopItem> = picks
            .into_iter()
            .map(|id| ShopItem {
                kind: ShopItemKind::Relic(id),
                cost: relic_price(id, run.floor),
                sold: false,
            })
            .collect();
        items.push(ShopItem {
            kind: ShopItemKind::Heal,
            cost: heal_price(run.floor),
            sold: false,
        });

        items.shuffle(rng);
        items.truncate(count);
        Self { items }
    }

    /// 把已領取的獎勵池轉成營地庫存（同一套定價，不預設 sold）
    pub fn from_reward_options(options: &[RelicId], floor: u32) -> Self {
        let items = options
            .iter()
            .map(|&id| ShopItem {
                kind: ShopItemKind::Relic(id),
                cost: relic_price(id, floor),
                sold: false,
            })
            .collect();
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::SHOP_STOCK_COUNT;
    use crate::game::relics::Rarity;
    use rand::SeedableRng;

    #[test]
    fn test_generate_has_exactly_one_heal() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let run = Run::new();
            let stock = ShopStock::generate(SHOP_STOCK_COUNT, &run, &mut rng);
            assert_eq!(stock.items.len(), SHOP_STOCK_COUNT);
            let heals = stock
                .items
                .iter()
                .filter(|i| i.kind == ShopItemKind::Heal)
                .count();
            assert_eq!(heals, 1);
            assert!(stock.items.iter().all(|i| !i.sold));
        }
    }

    #[test]
    fn test_pricing_adds_floor_and_rarity_markup() {
        let id = RelicId::GiantSlayer;
        assert_eq!(id.rarity(), Rarity::Rare);
        let base = id.def().shop_cost;
        assert_eq!(relic_price(id, 1), base + 2 + 4);
        assert_eq!(relic_price(id, 3), base + 6 + 4);
        assert_eq!(heal_price(2), HEAL_ITEM_BASE_COST + 4);
    }

    #[test]
    fn test_from_reward_options_keeps_all_relics() {
        let options = [RelicId::OakShield, RelicId::RoyalSeal];
        let stock = ShopStock::from_reward_options(&options, 2);
        assert_eq!(stock.items.len(), 2);
        assert!(stock
            .items
            .iter()
            .all(|i| matches!(i.kind, ShopItemKind::Relic(_)) && !i.sold));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let run = Run::new();
        let mut a = StdRng::seed_from_u64(4);
        let mut b = StdRng::seed_from_u64(4);
        assert_eq!(
            ShopStock::generate(SHOP_STOCK_COUNT, &run, &mut a),
            ShopStock::generate(SHOP_STOCK_COUNT, &run, &mut b)
        );
    }
}
