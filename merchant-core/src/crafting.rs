//! Crafting: the timed production queue, item derivation and leveling.
//!
//! A queue entry is either queued or completed. Accepted crafts cannot fail
//! or be cancelled; a refused craft leaves the state untouched.

use crate::catalog::{RecipeDef, element_def, magic_tier_def, recipe_def};
use crate::config;
use crate::error::Rejection;
use crate::state::{GameState, InventoryItem, QueueEntry, Signal};
use crate::types::{MagicTier, RecipeId};

// === LEVEL CURVE ===

/// `floor(sqrt(exp / 100))`
pub fn level_for_exp(exp: u64) -> u32 {
    (exp / config::EXP_PER_LEVEL_UNIT).isqrt() as u32
}

/// Experience at which `level` begins: `level^2 * 100`, saturating at `u64::MAX`
pub fn level_exp_floor(level: u32) -> u64 {
    let level = level as u64;
    level
        .saturating_mul(level)
        .saturating_mul(config::EXP_PER_LEVEL_UNIT)
}

/// Percentage of the way from the current level to the next
pub fn level_progress(exp: u64) -> f64 {
    let level = level_for_exp(exp);
    let floor = level_exp_floor(level);
    let next = level_exp_floor(level + 1);
    (exp - floor) as f64 / (next - floor) as f64 * 100.0
}

// === DERIVED VALUES ===

/// Crafting time multiplier, 5% faster per level down to half time
pub fn time_reduction_factor(level: u32) -> f64 {
    (1.0 - level as f64 * config::TIME_REDUCTION_PER_LEVEL).max(config::MIN_TIME_FACTOR)
}

pub fn effective_duration(recipe: &RecipeDef, level: u32) -> u64 {
    (recipe.crafting_time as f64 * time_reduction_factor(level)).round() as u64
}

pub fn quality_tier(level: u32) -> u32 {
    level / config::QUALITY_LEVEL_STEP
}

pub fn quality_for_tier(tier: u32) -> f64 {
    1.0 + tier as f64 * config::QUALITY_PER_STEP
}

/// Experience granted for completing one craft
pub fn completion_exp(recipe: &RecipeDef) -> u64 {
    recipe.base_power.floor() as u64 * 2
}

/// Book produced by a recipe at the given player level
pub fn derive_item(recipe: &RecipeDef, level: u32) -> InventoryItem {
    let tier = quality_tier(level);
    let quality = quality_for_tier(tier);
    let element = element_def(recipe.element);
    let power = (recipe.base_power * element.base_power * quality).floor();
    let base_price = (power * config::PRICE_PER_POWER * quality).floor();

    InventoryItem {
        recipe: recipe.id,
        element: recipe.element,
        quality_tier: tier,
        quality,
        level,
        power: power as u32,
        base_price: base_price as u64,
        quantity: 1,
        crafted: true,
    }
}

// === QUEUE OPERATIONS ===

/// Consume materials and queue a craft
pub fn start_crafting(state: &mut GameState, recipe_id: RecipeId) -> Result<(), Rejection> {
    let recipe = recipe_def(recipe_id);
    let level = state.level();

    if level < recipe.level_required {
        return Err(Rejection::LevelTooLow {
            recipe: recipe_id,
            required: recipe.level_required,
            level,
        });
    }
    if !state.materials.consume_all(recipe.materials) {
        return Err(Rejection::InsufficientMaterials(recipe_id));
    }

    let duration = effective_duration(&recipe, level);
    state.crafting_queue.push(QueueEntry {
        recipe: recipe_id,
        started_at: state.clock_ms,
        duration,
    });

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "craft_start",
        clock_ms = state.clock_ms,
        recipe = ?recipe_id,
        level = level,
        duration = duration,
    );

    Ok(())
}

/// Complete every queued craft whose duration has elapsed at `now`.
///
/// Unfinished entries keep their original start time. Returns the recipes
/// completed this tick, in queue order.
pub fn complete_due(state: &mut GameState, now: u64, signals: &mut Vec<Signal>) -> Vec<RecipeId> {
    let (completed, remaining): (Vec<QueueEntry>, Vec<QueueEntry>) = state
        .crafting_queue
        .iter()
        .partition(|entry| entry.is_done(now));
    if completed.is_empty() {
        return Vec::new();
    }
    state.crafting_queue = remaining;

    let mut finished = Vec::with_capacity(completed.len());
    for entry in completed {
        let recipe = recipe_def(entry.recipe);
        add_experience(state, completion_exp(&recipe), signals);
        signals.push(Signal::CraftingComplete {
            recipe: entry.recipe,
        });

        let item = derive_item(&recipe, state.level());

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "craft_complete",
            clock_ms = now,
            recipe = ?entry.recipe,
            quality = item.quality,
            power = item.power,
            base_price = item.base_price,
        );

        state.inventory.merge(item);
        finished.push(entry.recipe);
    }
    finished
}

/// Grant experience, signalling level-ups and newly unlocked magic tiers
pub fn add_experience(state: &mut GameState, amount: u64, signals: &mut Vec<Signal>) {
    let before = state.level();
    state.experience = state.experience.saturating_add(amount);
    let after = state.level();
    if after <= before {
        return;
    }

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "level_up",
        clock_ms = state.clock_ms,
        from = before,
        to = after,
        experience = state.experience,
    );

    signals.push(Signal::LevelUp { level: after });
    for tier in MagicTier::ALL {
        let def = magic_tier_def(tier);
        if before < def.level && def.level <= after {
            signals.push(Signal::NewUnlock {
                tier,
                elements: def.elements.to_vec(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Element, MaterialId};

    fn stock_fire_materials(state: &mut GameState, sets: u32) {
        state.materials.add(MaterialId::MagicInk, sets);
        state.materials.add(MaterialId::EnchantedPaper, 2 * sets);
        state.materials.add(MaterialId::FlameEssence, sets);
    }

    #[test]
    fn test_level_curve() {
        assert_eq!(level_for_exp(0), 0);
        assert_eq!(level_for_exp(99), 0);
        assert_eq!(level_for_exp(100), 1);
        assert_eq!(level_for_exp(399), 1);
        assert_eq!(level_for_exp(400), 2);
        assert_eq!(level_for_exp(2500), 5);
        assert_eq!(level_for_exp(10_000), 10);

        assert_eq!(level_progress(0), 0.0);
        // Level 1 spans 100..400
        assert!((level_progress(250) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_reduction_floors_at_half() {
        assert_eq!(time_reduction_factor(0), 1.0);
        assert!((time_reduction_factor(4) - 0.8).abs() < 1e-9);
        assert_eq!(time_reduction_factor(10), 0.5);
        assert_eq!(time_reduction_factor(30), 0.5);

        let fire = recipe_def(RecipeId::FireBasic);
        assert_eq!(effective_duration(&fire, 0), 5000);
        assert_eq!(effective_duration(&fire, 4), 4000);
        assert_eq!(effective_duration(&fire, 12), 2500);
    }

    #[test]
    fn test_derive_item_formulas() {
        let fire = recipe_def(RecipeId::FireBasic);

        // Level 0: quality 1.0, power floor(5 * 1.2) = 6, price 6 * 20 = 120
        let item = derive_item(&fire, 0);
        assert_eq!(item.quality, 1.0);
        assert_eq!(item.power, 6);
        assert_eq!(item.base_price, 120);

        // Level 5: quality 1.2, power floor(5 * 1.2 * 1.2) = 7, price floor(7 * 20 * 1.2) = 168
        let item = derive_item(&fire, 5);
        assert!((item.quality - 1.2).abs() < 1e-12);
        assert_eq!(item.power, 7);
        assert_eq!(item.base_price, 168);
        assert_eq!(item.element, Element::Fire);
    }

    #[test]
    fn test_start_crafting_consumes_materials() {
        let mut state = GameState::new();
        stock_fire_materials(&mut state, 1);

        start_crafting(&mut state, RecipeId::FireBasic).unwrap();
        assert_eq!(state.crafting_queue.len(), 1);
        assert_eq!(state.materials.get(MaterialId::MagicInk), 0);
        assert_eq!(state.materials.get(MaterialId::EnchantedPaper), 0);
        assert_eq!(state.materials.get(MaterialId::FlameEssence), 0);

        let err = start_crafting(&mut state, RecipeId::FireBasic).unwrap_err();
        assert_eq!(err, Rejection::InsufficientMaterials(RecipeId::FireBasic));
        assert_eq!(state.crafting_queue.len(), 1);
    }

    #[test]
    fn test_level_gate_leaves_state_untouched() {
        let mut state = GameState::new();
        state.materials.add(MaterialId::MagicInk, 1);
        state.materials.add(MaterialId::EnchantedPaper, 2);
        state.materials.add(MaterialId::ThunderShard, 1);
        let before = state.clone();

        let err = start_crafting(&mut state, RecipeId::LightningBasic).unwrap_err();
        assert!(matches!(err, Rejection::LevelTooLow { required: 10, .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_queue_completes_on_exact_duration() {
        let mut state = GameState::new();
        stock_fire_materials(&mut state, 1);
        start_crafting(&mut state, RecipeId::FireBasic).unwrap();

        let mut signals = Vec::new();
        assert!(complete_due(&mut state, 4000, &mut signals).is_empty());
        assert_eq!(state.crafting_queue.len(), 1);

        let done = complete_due(&mut state, 5000, &mut signals);
        assert_eq!(done, vec![RecipeId::FireBasic]);
        assert!(state.crafting_queue.is_empty());
        assert_eq!(state.experience, 10);
        assert_eq!(state.inventory.total_quantity(), 1);
        assert!(signals.contains(&Signal::CraftingComplete {
            recipe: RecipeId::FireBasic
        }));
    }

    #[test]
    fn test_remaining_entries_keep_start_time() {
        let mut state = GameState::new();
        stock_fire_materials(&mut state, 2);
        start_crafting(&mut state, RecipeId::FireBasic).unwrap();
        state.clock_ms = 3000;
        start_crafting(&mut state, RecipeId::FireBasic).unwrap();

        let mut signals = Vec::new();
        assert_eq!(complete_due(&mut state, 5000, &mut signals).len(), 1);
        assert_eq!(state.crafting_queue[0].started_at, 3000);
        assert!(complete_due(&mut state, 7999, &mut signals).is_empty());
        assert_eq!(complete_due(&mut state, 8000, &mut signals).len(), 1);
        assert_eq!(state.inventory.items().len(), 1);
        assert_eq!(state.inventory.items()[0].quantity, 2);
    }

    #[test]
    fn test_stack_refreshes_to_newest_values() {
        let mut state = GameState::new();
        let fire = recipe_def(RecipeId::FireBasic);

        let mut first = derive_item(&fire, 0);
        first.level = 0;
        state.inventory.merge(first);
        // Level 4 is still quality tier 0, so the same stack takes the new level
        state.inventory.merge(derive_item(&fire, 4));

        assert_eq!(state.inventory.items().len(), 1);
        assert_eq!(state.inventory.items()[0].quantity, 2);
        assert_eq!(state.inventory.items()[0].level, 4);

        // A new quality tier gets its own stack
        state.inventory.merge(derive_item(&fire, 5));
        assert_eq!(state.inventory.items().len(), 2);
    }

    #[test]
    fn test_level_up_signals_unlocks() {
        let mut state = GameState::new();
        let mut signals = Vec::new();

        add_experience(&mut state, 50, &mut signals);
        assert!(signals.is_empty());

        // 0 -> 10 crosses both the intermediate and advanced tiers
        add_experience(&mut state, 9_950, &mut signals);
        assert_eq!(state.level(), 10);
        assert_eq!(signals[0], Signal::LevelUp { level: 10 });
        let unlocked: Vec<MagicTier> = signals
            .iter()
            .filter_map(|s| match s {
                Signal::NewUnlock { tier, .. } => Some(*tier),
                _ => None,
            })
            .collect();
        assert_eq!(unlocked, vec![MagicTier::Intermediate, MagicTier::Advanced]);
    }

    #[test]
    fn test_experience_saturates_at_max() {
        assert_eq!(level_exp_floor(u32::MAX), u64::MAX);

        let mut state = GameState::new();
        let mut signals = Vec::new();
        add_experience(&mut state, u64::MAX - 5, &mut signals);
        add_experience(&mut state, 10, &mut signals);
        assert_eq!(state.experience, u64::MAX);

        let level = state.level();
        assert!(level_exp_floor(level) <= state.experience);
        assert!(level_exp_floor(level + 1) >= state.experience);
        assert!((0.0..=100.0).contains(&level_progress(state.experience)));
    }
}
