use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

// ============================================================================
// Elements - The magic affinities books are written in
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Element {
    Fire,
    Ice,
    Wind,
    Earth,
    Lightning,
}

impl Element {
    /// Returns an iterator over all elements
    pub fn all() -> impl Iterator<Item = Element> {
        [
            Element::Fire,
            Element::Ice,
            Element::Wind,
            Element::Earth,
            Element::Lightning,
        ]
        .into_iter()
    }
}

// ============================================================================
// Materials - Bought from the market, consumed by recipes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum MaterialId {
    // Basic
    MagicInk,
    EnchantedPaper,
    // Elemental
    FlameEssence,
    FrostCrystal,
    WindFeather,
    EarthCrystal,
    ThunderShard,
}

impl MaterialId {
    pub fn all() -> impl Iterator<Item = MaterialId> {
        [
            MaterialId::MagicInk,
            MaterialId::EnchantedPaper,
            MaterialId::FlameEssence,
            MaterialId::FrostCrystal,
            MaterialId::WindFeather,
            MaterialId::EarthCrystal,
            MaterialId::ThunderShard,
        ]
        .into_iter()
    }
}

// ============================================================================
// Recipes - One per craftable book
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum RecipeId {
    FireBasic,
    IceBasic,
    WindBasic,
    WindImproved,
    EarthBasic,
    EarthImproved,
    LightningBasic,
    LightningImproved,
}

impl RecipeId {
    pub fn all() -> impl Iterator<Item = RecipeId> {
        [
            RecipeId::FireBasic,
            RecipeId::IceBasic,
            RecipeId::WindBasic,
            RecipeId::WindImproved,
            RecipeId::EarthBasic,
            RecipeId::EarthImproved,
            RecipeId::LightningBasic,
            RecipeId::LightningImproved,
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Rank {
    Basic,
    Improved,
}

// ============================================================================
// Factions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Faction {
    Human,
    Monster,
}

impl Faction {
    pub fn other(self) -> Faction {
        match self {
            Faction::Human => Faction::Monster,
            Faction::Monster => Faction::Human,
        }
    }
}

// ============================================================================
// Calendar
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Next season in the fixed cycle
    pub fn next(self) -> Season {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum SeasonalEventId {
    SpringFestival,
    HeatWave,
    HarvestFestival,
    Blizzard,
}

// ============================================================================
// World events - Non-seasonal shocks with a precursor stage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum WorldEventKind {
    HeroArrival,
    DragonAttack,
    MarketBoom,
}

impl WorldEventKind {
    pub const ALL: [WorldEventKind; 3] = [
        WorldEventKind::HeroArrival,
        WorldEventKind::DragonAttack,
        WorldEventKind::MarketBoom,
    ];
}

// ============================================================================
// Magic tiers - Level thresholds that unlock elements
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum MagicTier {
    Beginner,
    Intermediate,
    Advanced,
}

impl MagicTier {
    pub const ALL: [MagicTier; 3] = [
        MagicTier::Beginner,
        MagicTier::Intermediate,
        MagicTier::Advanced,
    ];
}

// ============================================================================
// Game lifecycle
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum GameStatus {
    NotStarted,
    Started,
    GameOver,
}
