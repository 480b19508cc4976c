use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::catalog::RecipeDef;
use crate::config;
use crate::types::{
    Element, Faction, GameStatus, MagicTier, MaterialId, Rank, RecipeId, Season,
    SeasonalEventId, WorldEventKind,
};

// ============================================================================
// Faction balance - human and monster power always sum to 100
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactionBalance {
    human_power: f64,
    monster_power: f64,
}

impl FactionBalance {
    pub fn new(human_power: f64) -> Self {
        let mut balance = Self {
            human_power: 0.0,
            monster_power: 0.0,
        };
        balance.set_human(human_power);
        balance
    }

    pub fn human(&self) -> f64 {
        self.human_power
    }

    pub fn monster(&self) -> f64 {
        self.monster_power
    }

    pub fn power(&self, faction: Faction) -> f64 {
        match faction {
            Faction::Human => self.human_power,
            Faction::Monster => self.monster_power,
        }
    }

    /// Set human power (saturating) and derive monster power from it
    pub fn set_human(&mut self, human_power: f64) {
        self.human_power = human_power.clamp(config::POWER_MIN, config::POWER_MAX);
        self.monster_power = config::POWER_MAX - self.human_power;
    }

    /// Move `amount` of power to `faction` from the other side
    pub fn shift_toward(&mut self, faction: Faction, amount: f64) {
        match faction {
            Faction::Human => self.set_human(self.human_power + amount),
            Faction::Monster => self.set_human(self.human_power - amount),
        }
    }

    /// Either side has been wiped out or has won outright
    pub fn is_decided(&self) -> bool {
        self.human_power <= config::POWER_MIN || self.human_power >= config::POWER_MAX
    }
}

// ============================================================================
// Market - trend and volatility
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Market {
    trend: f64,
    volatility: f64,
}

impl Market {
    pub fn new(trend: f64, volatility: f64) -> Self {
        let mut market = Self {
            trend: 0.0,
            volatility: config::VOLATILITY_MIN,
        };
        market.set_trend(trend);
        market.set_volatility(volatility);
        market
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn set_trend(&mut self, trend: f64) {
        self.trend = trend.clamp(config::TREND_MIN, config::TREND_MAX);
    }

    pub fn set_volatility(&mut self, volatility: f64) {
        self.volatility = volatility.clamp(config::VOLATILITY_MIN, config::VOLATILITY_MAX);
    }
}

// ============================================================================
// Reputation - per faction, in [0, 100]
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    human: f64,
    monster: f64,
}

impl Reputation {
    pub fn new(initial: f64) -> Self {
        let initial = initial.clamp(0.0, config::REPUTATION_MAX);
        Self {
            human: initial,
            monster: initial,
        }
    }

    pub fn get(&self, faction: Faction) -> f64 {
        match faction {
            Faction::Human => self.human,
            Faction::Monster => self.monster,
        }
    }

    pub fn raise(&mut self, faction: Faction, amount: f64) {
        let slot = match faction {
            Faction::Human => &mut self.human,
            Faction::Monster => &mut self.monster,
        };
        *slot = (*slot + amount).clamp(0.0, config::REPUTATION_MAX);
    }

    /// Both sides pulled back into [0, 100]
    pub fn clamped(self) -> Self {
        Self {
            human: self.human.clamp(0.0, config::REPUTATION_MAX),
            monster: self.monster.clamp(0.0, config::REPUTATION_MAX),
        }
    }
}

// ============================================================================
// Calendar
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Calendar {
    pub season: Season,
    pub day: u32,
    pub year: u32,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            season: Season::Spring,
            day: 0,
            year: config::INITIAL_YEAR,
        }
    }
}

// ============================================================================
// Materials - owned counts, never negative
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Materials {
    counts: BTreeMap<MaterialId, u32>,
}

impl Materials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, material: MaterialId) -> u32 {
        self.counts.get(&material).copied().unwrap_or(0)
    }

    pub fn add(&mut self, material: MaterialId, amount: u32) {
        *self.counts.entry(material).or_insert(0) += amount;
    }

    /// Check if every requirement is covered
    pub fn has_all(&self, required: &[(MaterialId, u32)]) -> bool {
        required
            .iter()
            .all(|(material, needed)| self.get(*material) >= *needed)
    }

    /// Remove every requirement, or nothing at all if any is short
    pub fn consume_all(&mut self, required: &[(MaterialId, u32)]) -> bool {
        if !self.has_all(required) {
            return false;
        }
        for (material, needed) in required {
            if let Some(count) = self.counts.get_mut(material) {
                *count -= needed;
            }
        }
        true
    }
}

// ============================================================================
// Inventory - crafted books
// ============================================================================

/// Identifies one stack of books in the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ItemKey {
    pub recipe: RecipeId,
    pub element: Element,
    /// `floor(level / 5)` at crafting time; quality is derived from it
    pub quality_tier: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub recipe: RecipeId,
    pub element: Element,
    pub quality_tier: u32,
    pub quality: f64,
    /// Player level when the stack was last refreshed
    pub level: u32,
    pub power: u32,
    pub base_price: u64,
    pub quantity: u32,
    pub crafted: bool,
}

impl InventoryItem {
    pub fn key(&self) -> ItemKey {
        ItemKey {
            recipe: self.recipe,
            element: self.element,
            quality_tier: self.quality_tier,
        }
    }
}

/// Stacks of books. Sold-out stacks keep a row with quantity 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    /// Stacks that still have stock
    pub fn in_stock(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().filter(|item| item.quantity > 0)
    }

    pub fn get(&self, key: ItemKey) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.key() == key)
    }

    /// Add one freshly crafted book. A stack with the same key is bumped and
    /// takes the new item's level, quality, power and price.
    pub fn merge(&mut self, item: InventoryItem) {
        match self.items.iter_mut().find(|i| i.key() == item.key()) {
            Some(existing) => {
                existing.quantity += item.quantity;
                existing.level = item.level;
                existing.quality = item.quality;
                existing.power = item.power;
                existing.base_price = item.base_price;
            }
            None => self.items.push(item),
        }
    }

    /// Take one book from a stack, returning its state before removal
    pub fn take_one(&mut self, key: ItemKey) -> Option<InventoryItem> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.key() == key && i.quantity > 0)?;
        let before = item.clone();
        item.quantity -= 1;
        Some(before)
    }

    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// ============================================================================
// Crafting queue
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub recipe: RecipeId,
    /// Game clock (ms) when crafting started
    pub started_at: u64,
    /// Effective duration after the level time reduction
    pub duration: u64,
}

impl QueueEntry {
    pub fn is_done(&self, now: u64) -> bool {
        now.saturating_sub(self.started_at) >= self.duration
    }

    /// Completion percentage in [0, 100]
    pub fn progress(&self, now: u64) -> f64 {
        if self.duration == 0 {
            return 100.0;
        }
        let elapsed = now.saturating_sub(self.started_at) as f64;
        (elapsed / self.duration as f64 * 100.0).min(100.0)
    }
}

// ============================================================================
// Seasonal and world events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSeasonalEvent {
    pub id: SeasonalEventId,
    pub start_day: u32,
    pub end_day: u32,
}

/// Stage of the world event pipeline currently visible to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldEventStage {
    Idle,
    Precursor {
        kind: WorldEventKind,
        message: String,
    },
    Active {
        kind: WorldEventKind,
    },
}

// ============================================================================
// Auto-production slots
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoProductionSlot {
    pub recipe: Option<RecipeId>,
    pub active: bool,
    /// Game clock (ms) of the last production attempt
    pub last_run: Option<u64>,
}

// ============================================================================
// Game State - The complete game record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub status: GameStatus,
    pub gold: u64,
    pub materials: Materials,
    pub crafting_queue: Vec<QueueEntry>,
    pub experience: u64,
    pub balance: FactionBalance,
    pub market: Market,
    pub inventory: Inventory,
    /// Seconds of play, advanced by the time tick
    pub elapsed_time: u64,
    /// Game clock in ms, the time base for every timer
    pub clock_ms: u64,
    pub calendar: Calendar,
    pub active_seasonal_events: Vec<ActiveSeasonalEvent>,
    pub world_event: WorldEventStage,
    pub reputation: Reputation,
    pub auto_production: [AutoProductionSlot; 3],
}

impl GameState {
    pub fn new() -> Self {
        Self {
            status: GameStatus::NotStarted,
            gold: config::INITIAL_GOLD,
            materials: Materials::new(),
            crafting_queue: Vec::new(),
            experience: 0,
            balance: FactionBalance::new(config::INITIAL_HUMAN_POWER),
            market: Market::new(config::INITIAL_MARKET_TREND, config::INITIAL_VOLATILITY),
            inventory: Inventory::new(),
            elapsed_time: 0,
            clock_ms: 0,
            calendar: Calendar::default(),
            active_seasonal_events: Vec::new(),
            world_event: WorldEventStage::Idle,
            reputation: Reputation::new(config::INITIAL_REPUTATION),
            auto_production: [AutoProductionSlot::default(); 3],
        }
    }

    pub fn level(&self) -> u32 {
        crate::crafting::level_for_exp(self.experience)
    }

    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Started
    }

    pub fn can_craft(&self, recipe: &RecipeDef) -> bool {
        self.level() >= recipe.level_required && self.materials.has_all(recipe.materials)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Restore a saved state. Bounded values are re-clamped on the way in.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut state: GameState = serde_json::from_str(json)?;
        state.balance.set_human(state.balance.human());
        let market = state.market;
        state.market = Market::new(market.trend(), market.volatility());
        state.reputation = state.reputation.clamped();
        Ok(state)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Signals - transient notifications for the presentation layer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(tag = "type")]
pub enum Signal {
    CraftingComplete {
        recipe: RecipeId,
    },
    LevelUp {
        level: u32,
    },
    NewUnlock {
        tier: MagicTier,
        elements: Vec<Element>,
    },
    SeasonalEventStarted {
        event: SeasonalEventId,
    },
    SeasonChanged {
        season: Season,
        year: u32,
    },
    WorldEventPrecursor {
        kind: WorldEventKind,
        message: String,
    },
    WorldEventStarted {
        kind: WorldEventKind,
    },
    WorldEventEnded {
        kind: WorldEventKind,
    },
    Notification {
        message: String,
    },
    GameOver {
        human_power: f64,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct SignalBatch {
    pub signals: Vec<Signal>,
}

// ============================================================================
// Serializable State Snapshot for JS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StateSnapshot {
    pub status: GameStatus,
    pub gold: u64,
    pub human_power: f64,
    pub monster_power: f64,
    pub market_trend: f64,
    pub volatility: f64,
    pub elapsed_time: u64,
    pub calendar: Calendar,
    pub level: u32,
    pub experience: u64,
    pub progress: f64,
    pub next_level_exp: u64,
    pub human_reputation: f64,
    pub monster_reputation: f64,
    pub materials: Vec<MaterialSnapshot>,
    pub recipes: Vec<RecipeSnapshot>,
    pub crafting_queue: Vec<QueueSnapshot>,
    pub inventory: Vec<ItemSnapshot>,
    pub seasonal_events: Vec<SeasonalEventSnapshot>,
    pub world_event: Option<WorldEventSnapshot>,
    pub auto_production: Vec<SlotSnapshot>,
    /// Recipes an auto-production slot may be given right now
    pub auto_production_recipes: Vec<RecipeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct MaterialSnapshot {
    pub id: MaterialId,
    pub name: String,
    pub owned: u32,
    pub price: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct RecipeSnapshot {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub element: Element,
    /// What the element is good for, shown alongside the recipe
    pub element_description: String,
    pub rank: Rank,
    pub level_required: u32,
    pub crafting_time: u64,
    pub materials: Vec<(MaterialId, u32)>,
    pub unlocked: bool,
    pub craftable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct QueueSnapshot {
    pub recipe: RecipeId,
    pub progress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub enum DemandRating {
    High,
    Normal,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ItemSnapshot {
    pub key: ItemKey,
    pub name: String,
    pub quality: f64,
    pub level: u32,
    pub power: u32,
    pub quantity: u32,
    pub human_price: u64,
    pub monster_price: u64,
    pub human_demand: DemandRating,
    pub monster_demand: DemandRating,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct SeasonalEventSnapshot {
    pub id: SeasonalEventId,
    pub name: String,
    pub description: String,
    pub start_day: u32,
    pub end_day: u32,
    pub price_modifier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct WorldEventSnapshot {
    pub kind: WorldEventKind,
    pub name: String,
    /// Precursor message while foreshadowed, description once it fires
    pub text: String,
    pub is_precursor: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct SlotSnapshot {
    pub index: usize,
    pub unlock_level: u32,
    pub unlocked: bool,
    pub recipe: Option<RecipeId>,
    pub active: bool,
}
