//! Auto-production slots.
//!
//! From level 5 the player can hand a recipe to a slot. An active slot
//! periodically buys whatever single units it is short, starts a craft and
//! sells one stocked copy of the same book to a random faction. Automation
//! runs at 80% efficiency, so a slot waits `crafting_time / 0.8` between
//! runs, and only recipes two levels below the player's are allowed.

use rand::Rng;

use crate::catalog::recipe_def;
use crate::config;
use crate::crafting;
use crate::economy;
use crate::error::Rejection;
use crate::state::GameState;
use crate::types::{Faction, RecipeId};

/// Level at which the slot unlocks, `None` if there is no such slot
pub fn slot_unlock_level(index: usize) -> Option<u32> {
    config::AUTO_PRODUCTION_SLOT_LEVELS.get(index).copied()
}

pub fn is_slot_unlocked(index: usize, level: u32) -> bool {
    level >= config::AUTO_PRODUCTION_UNLOCK_LEVEL
        && slot_unlock_level(index).is_some_and(|required| level >= required)
}

/// Recipes a slot may be given at the player's level
pub fn allowed_recipes(level: u32) -> Vec<RecipeId> {
    RecipeId::all()
        .filter(|&recipe| is_recipe_allowed(recipe, level))
        .collect()
}

pub fn is_recipe_allowed(recipe: RecipeId, level: u32) -> bool {
    level >= config::AUTO_PRODUCTION_UNLOCK_LEVEL
        && recipe_def(recipe).level_required + config::AUTO_PRODUCTION_LEVEL_PENALTY <= level
}

/// Minimum gap between two runs of a slot producing `recipe`
pub fn run_interval(recipe: RecipeId) -> u64 {
    (recipe_def(recipe).crafting_time as f64 / config::AUTO_PRODUCTION_EFFICIENCY).round() as u64
}

fn unlocked_slot(state: &GameState, index: usize) -> Result<(), Rejection> {
    if slot_unlock_level(index).is_none() {
        return Err(Rejection::NoSuchSlot(index));
    }
    if !is_slot_unlocked(index, state.level()) {
        return Err(Rejection::SlotLocked(index));
    }
    Ok(())
}

/// Give a slot a recipe. The slot keeps its on/off state.
pub fn assign_recipe(state: &mut GameState, index: usize, recipe: RecipeId) -> Result<(), Rejection> {
    unlocked_slot(state, index)?;
    if !is_recipe_allowed(recipe, state.level()) {
        return Err(Rejection::RecipeNotAllowed(recipe));
    }
    state.auto_production[index].recipe = Some(recipe);
    Ok(())
}

/// Switch a slot on or off, returning whether it is now active
pub fn toggle_slot(state: &mut GameState, index: usize) -> Result<bool, Rejection> {
    unlocked_slot(state, index)?;
    let slot = &mut state.auto_production[index];
    if slot.recipe.is_none() {
        return Err(Rejection::SlotUnassigned(index));
    }
    slot.active = !slot.active;
    Ok(slot.active)
}

/// What one slot did during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRun {
    pub index: usize,
    pub recipe: RecipeId,
    pub bought: u32,
    pub crafted: bool,
    pub sold: Option<(Faction, u64)>,
}

/// Run every active slot whose interval has elapsed at `now`
pub fn tick<R: Rng>(state: &mut GameState, now: u64, rng: &mut R) -> Vec<SlotRun> {
    let level = state.level();
    if level < config::AUTO_PRODUCTION_UNLOCK_LEVEL {
        return Vec::new();
    }

    let mut runs = Vec::new();
    for index in 0..state.auto_production.len() {
        // A decided war ends the game before the next slot runs
        if state.balance.is_decided() {
            break;
        }
        let slot = state.auto_production[index];
        let Some(recipe) = slot.recipe else {
            continue;
        };
        if !slot.active || !is_slot_unlocked(index, level) {
            continue;
        }
        if let Some(last_run) = slot.last_run {
            if now.saturating_sub(last_run) < run_interval(recipe) {
                continue;
            }
        }

        let run = run_slot(state, index, recipe, rng);
        state.auto_production[index].last_run = Some(now);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "auto_production",
            clock_ms = now,
            slot = index,
            recipe = recipe_def(recipe).name,
            bought = run.bought,
            crafted = run.crafted,
            proceeds = run.sold.map(|(_, gold)| gold).unwrap_or(0),
        );

        runs.push(run);
    }
    runs
}

fn run_slot<R: Rng>(state: &mut GameState, index: usize, recipe: RecipeId, rng: &mut R) -> SlotRun {
    let def = recipe_def(recipe);
    let mut run = SlotRun {
        index,
        recipe,
        bought: 0,
        crafted: false,
        sold: None,
    };

    for &(material, required) in def.materials {
        if state.materials.get(material) < required
            && economy::buy_material(state, material).is_ok()
        {
            run.bought += 1;
        }
    }

    if !state.materials.has_all(def.materials) {
        return run;
    }
    run.crafted = crafting::start_crafting(state, recipe).is_ok();
    if !run.crafted {
        return run;
    }

    let stocked = state
        .inventory
        .in_stock()
        .find(|item| item.recipe == recipe)
        .map(|item| item.key());
    if let Some(key) = stocked {
        let faction = if rng.random_bool(0.5) {
            Faction::Human
        } else {
            Faction::Monster
        };
        if let Ok(proceeds) = economy::sell_item(state, key, faction) {
            run.sold = Some((faction, proceeds));
        }
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crafting::level_exp_floor;
    use crate::types::MaterialId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn state_at_level(level: u32) -> GameState {
        let mut state = GameState::new();
        state.experience = level_exp_floor(level);
        state
    }

    #[test]
    fn test_slot_unlock_levels() {
        assert!(!is_slot_unlocked(0, 4));
        assert!(is_slot_unlocked(0, 5));
        assert!(!is_slot_unlocked(1, 9));
        assert!(is_slot_unlocked(1, 10));
        assert!(is_slot_unlocked(2, 15));
        assert!(!is_slot_unlocked(3, 99));
    }

    #[test]
    fn test_allowed_recipes_lag_two_levels() {
        assert!(allowed_recipes(4).is_empty());
        assert_eq!(allowed_recipes(5), vec![RecipeId::FireBasic, RecipeId::IceBasic]);
        assert_eq!(allowed_recipes(6), vec![RecipeId::FireBasic, RecipeId::IceBasic]);
        assert!(allowed_recipes(7).contains(&RecipeId::EarthImproved));
        assert!(!allowed_recipes(11).contains(&RecipeId::LightningBasic));
        assert!(allowed_recipes(12).contains(&RecipeId::LightningBasic));
    }

    #[test]
    fn test_assign_and_toggle_rules() {
        let mut state = state_at_level(4);
        assert_eq!(
            assign_recipe(&mut state, 0, RecipeId::FireBasic),
            Err(Rejection::SlotLocked(0))
        );

        let mut state = state_at_level(5);
        assert_eq!(toggle_slot(&mut state, 0), Err(Rejection::SlotUnassigned(0)));
        assert_eq!(
            assign_recipe(&mut state, 0, RecipeId::WindBasic),
            Err(Rejection::RecipeNotAllowed(RecipeId::WindBasic))
        );
        assert_eq!(
            assign_recipe(&mut state, 1, RecipeId::FireBasic),
            Err(Rejection::SlotLocked(1))
        );
        assert_eq!(
            assign_recipe(&mut state, 3, RecipeId::FireBasic),
            Err(Rejection::NoSuchSlot(3))
        );

        assign_recipe(&mut state, 0, RecipeId::FireBasic).unwrap();
        assert_eq!(toggle_slot(&mut state, 0), Ok(true));
        assert_eq!(toggle_slot(&mut state, 0), Ok(false));
    }

    #[test]
    fn test_run_interval_accounts_for_efficiency() {
        assert_eq!(run_interval(RecipeId::FireBasic), 6_250);
        assert_eq!(run_interval(RecipeId::LightningImproved), 15_000);
    }

    #[test]
    fn test_tick_buys_crafts_and_waits() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = state_at_level(5);
        assign_recipe(&mut state, 0, RecipeId::FireBasic).unwrap();
        toggle_slot(&mut state, 0).unwrap();

        // Nothing owned: one unit of each material is bought, which leaves
        // paper short, so no craft starts
        let runs = tick(&mut state, 1_000, &mut rng);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].bought, 3);
        assert!(!runs[0].crafted);
        assert_eq!(state.gold, 1000 - 40 - 20 - 80);
        assert_eq!(state.auto_production[0].last_run, Some(1_000));

        // Too soon for another run
        assert!(tick(&mut state, 7_249, &mut rng).is_empty());

        let runs = tick(&mut state, 7_250, &mut rng);
        assert_eq!(runs[0].bought, 1);
        assert!(runs[0].crafted);
        // Nothing in stock yet to sell
        assert_eq!(runs[0].sold, None);
        assert_eq!(state.crafting_queue.len(), 1);
        assert_eq!(state.materials.get(MaterialId::EnchantedPaper), 0);
    }

    #[test]
    fn test_tick_sells_stocked_copy() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut state = state_at_level(5);
        state.materials.add(MaterialId::MagicInk, 1);
        state.materials.add(MaterialId::EnchantedPaper, 2);
        state.materials.add(MaterialId::FlameEssence, 1);
        state
            .inventory
            .merge(crafting::derive_item(&recipe_def(RecipeId::FireBasic), 5));
        assign_recipe(&mut state, 0, RecipeId::FireBasic).unwrap();
        toggle_slot(&mut state, 0).unwrap();

        let gold_before = state.gold;
        let runs = tick(&mut state, 0, &mut rng);
        assert_eq!(runs[0].bought, 0);
        assert!(runs[0].crafted);
        let (_, proceeds) = runs[0].sold.unwrap();
        assert!(proceeds > 0);
        assert_eq!(state.gold, gold_before + proceeds);
        assert_eq!(state.inventory.total_quantity(), 0);
    }

    #[test]
    fn test_tick_stops_once_war_is_decided() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = state_at_level(40);
        state.balance.set_human(50.0);

        // A sale of this book ends the war whichever side buys it
        let book = crafting::derive_item(&recipe_def(RecipeId::LightningImproved), 40);
        assert!(book.power >= 50);
        state.inventory.merge(book);
        state.materials.add(MaterialId::MagicInk, 3);
        state.materials.add(MaterialId::EnchantedPaper, 5);
        state.materials.add(MaterialId::ThunderShard, 2);
        state.materials.add(MaterialId::FrostCrystal, 1);

        assign_recipe(&mut state, 0, RecipeId::LightningImproved).unwrap();
        toggle_slot(&mut state, 0).unwrap();
        assign_recipe(&mut state, 1, RecipeId::IceBasic).unwrap();
        toggle_slot(&mut state, 1).unwrap();

        let runs = tick(&mut state, 0, &mut rng);
        assert!(state.balance.is_decided());
        assert_eq!(runs.len(), 1);
        assert!(runs[0].sold.is_some());
        assert_eq!(state.auto_production[1].last_run, None);
        assert_eq!(state.materials.get(MaterialId::FrostCrystal), 1);
        assert_eq!(state.crafting_queue.len(), 1);
    }

    #[test]
    fn test_inactive_below_unlock_level() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = GameState::new();
        state.auto_production[0].recipe = Some(RecipeId::FireBasic);
        state.auto_production[0].active = true;

        assert!(tick(&mut state, 10_000, &mut rng).is_empty());
        assert_eq!(state.gold, 1000);
    }
}
