//! Static game data: elements, materials, recipes, seasons and events.
//!
//! Every id is an enum and every table is an exhaustive `match`, so a
//! lookup can never miss.

use crate::types::{
    Element, Faction, MagicTier, MaterialId, Rank, RecipeId, Season, SeasonalEventId,
    WorldEventKind,
};

use MaterialId::{
    EarthCrystal, EnchantedPaper, FlameEssence, FrostCrystal, MagicInk, ThunderShard, WindFeather,
};

// ============================================================================
// Elements
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ElementDef {
    pub id: Element,
    pub name: &'static str,
    pub base_power: f64,
    pub human_demand: f64,
    pub monster_demand: f64,
    pub description: &'static str,
}

impl ElementDef {
    pub fn demand(&self, faction: Faction) -> f64 {
        match faction {
            Faction::Human => self.human_demand,
            Faction::Monster => self.monster_demand,
        }
    }
}

pub fn element_def(element: Element) -> ElementDef {
    match element {
        Element::Fire => ElementDef {
            id: element,
            name: "Fire",
            base_power: 1.2,
            human_demand: 0.6,
            monster_demand: 1.2,
            description: "Offensive magic, popular with the monsters",
        },
        Element::Ice => ElementDef {
            id: element,
            name: "Ice",
            base_power: 1.0,
            human_demand: 1.0,
            monster_demand: 1.0,
            description: "Defensive magic with steady demand",
        },
        Element::Wind => ElementDef {
            id: element,
            name: "Wind",
            base_power: 0.9,
            human_demand: 1.3,
            monster_demand: 0.7,
            description: "Mobile magic, prized by the humans",
        },
        Element::Earth => ElementDef {
            id: element,
            name: "Earth",
            base_power: 1.1,
            human_demand: 1.1,
            monster_demand: 1.1,
            description: "Solid magic with stable demand on both sides",
        },
        Element::Lightning => ElementDef {
            id: element,
            name: "Lightning",
            base_power: 1.4,
            human_demand: 1.2,
            monster_demand: 1.2,
            description: "Destructive magic, expensive and in demand",
        },
    }
}

// ============================================================================
// Materials
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct MaterialDef {
    pub id: MaterialId,
    pub name: &'static str,
    pub base_price: f64,
    pub market_influence: f64,
    pub element: Option<Element>,
}

pub fn material_def(material: MaterialId) -> MaterialDef {
    let (name, base_price, market_influence, element) = match material {
        MaterialId::MagicInk => ("Magic Ink", 40.0, 0.8, None),
        MaterialId::EnchantedPaper => ("Enchanted Paper", 20.0, 0.5, None),
        MaterialId::FlameEssence => ("Flame Essence", 80.0, 1.2, Some(Element::Fire)),
        MaterialId::FrostCrystal => ("Frost Crystal", 60.0, 1.0, Some(Element::Ice)),
        MaterialId::WindFeather => ("Wind Feather", 80.0, 0.9, Some(Element::Wind)),
        MaterialId::EarthCrystal => ("Earth Crystal", 95.0, 1.1, Some(Element::Earth)),
        MaterialId::ThunderShard => ("Thunder Shard", 120.0, 1.3, Some(Element::Lightning)),
    };
    MaterialDef {
        id: material,
        name,
        base_price,
        market_influence,
        element,
    }
}

// ============================================================================
// Recipes
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct RecipeDef {
    pub id: RecipeId,
    pub name: &'static str,
    pub element: Element,
    pub rank: Rank,
    /// (material, quantity) pairs, all required
    pub materials: &'static [(MaterialId, u32)],
    /// Base crafting duration in ms
    pub crafting_time: u64,
    pub base_power: f64,
    pub level_required: u32,
    pub description: &'static str,
}

pub fn recipe_def(recipe: RecipeId) -> RecipeDef {
    match recipe {
        RecipeId::FireBasic => RecipeDef {
            id: recipe,
            name: "Basic Tome of Flame",
            element: Element::Fire,
            rank: Rank::Basic,
            materials: &[(MagicInk, 1), (EnchantedPaper, 2), (FlameEssence, 1)],
            crafting_time: 5000,
            base_power: 5.0,
            level_required: 0,
            description: "Records the fundamentals of fire magic",
        },
        RecipeId::IceBasic => RecipeDef {
            id: recipe,
            name: "Basic Tome of Frost",
            element: Element::Ice,
            rank: Rank::Basic,
            materials: &[(MagicInk, 1), (EnchantedPaper, 2), (FrostCrystal, 1)],
            crafting_time: 5000,
            base_power: 5.0,
            level_required: 0,
            description: "Records the fundamentals of ice magic",
        },
        RecipeId::WindBasic => RecipeDef {
            id: recipe,
            name: "Basic Tome of Gales",
            element: Element::Wind,
            rank: Rank::Basic,
            materials: &[(MagicInk, 1), (EnchantedPaper, 2), (WindFeather, 1)],
            crafting_time: 4500,
            base_power: 4.0,
            level_required: 5,
            description: "Records the fundamentals of wind magic",
        },
        RecipeId::WindImproved => RecipeDef {
            id: recipe,
            name: "Intermediate Tome of Tornadoes",
            element: Element::Wind,
            rank: Rank::Improved,
            materials: &[(MagicInk, 2), (EnchantedPaper, 3), (WindFeather, 2)],
            crafting_time: 9000,
            base_power: 12.0,
            level_required: 5,
            description: "Commands the strength of the storm",
        },
        RecipeId::EarthBasic => RecipeDef {
            id: recipe,
            name: "Basic Tome of Stone",
            element: Element::Earth,
            rank: Rank::Basic,
            materials: &[(MagicInk, 1), (EnchantedPaper, 2), (EarthCrystal, 1)],
            crafting_time: 5500,
            base_power: 6.0,
            level_required: 5,
            description: "Records the fundamentals of earth magic",
        },
        RecipeId::EarthImproved => RecipeDef {
            id: recipe,
            name: "Intermediate Tome of Quakes",
            element: Element::Earth,
            rank: Rank::Improved,
            materials: &[(MagicInk, 2), (EnchantedPaper, 3), (EarthCrystal, 2)],
            crafting_time: 11000,
            base_power: 18.0,
            level_required: 5,
            description: "Shakes the ground itself",
        },
        RecipeId::LightningBasic => RecipeDef {
            id: recipe,
            name: "Basic Tome of Thunder",
            element: Element::Lightning,
            rank: Rank::Basic,
            materials: &[(MagicInk, 1), (EnchantedPaper, 2), (ThunderShard, 1)],
            crafting_time: 6000,
            base_power: 7.0,
            level_required: 10,
            description: "Records the fundamentals of lightning magic",
        },
        RecipeId::LightningImproved => RecipeDef {
            id: recipe,
            name: "Intermediate Tome of Storms",
            element: Element::Lightning,
            rank: Rank::Improved,
            materials: &[(MagicInk, 2), (EnchantedPaper, 3), (ThunderShard, 2)],
            crafting_time: 12000,
            base_power: 21.0,
            level_required: 10,
            description: "Calls down the sky's fury",
        },
    }
}

// ============================================================================
// Seasons
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct SeasonDef {
    pub id: Season,
    pub name: &'static str,
    pub event_chance: f64,
    fire: f64,
    ice: f64,
    wind: f64,
    earth: f64,
    lightning: f64,
}

impl SeasonDef {
    /// Demand multiplier for an element during this season
    pub fn element_modifier(&self, element: Element) -> f64 {
        match element {
            Element::Fire => self.fire,
            Element::Ice => self.ice,
            Element::Wind => self.wind,
            Element::Earth => self.earth,
            Element::Lightning => self.lightning,
        }
    }
}

pub fn season_def(season: Season) -> SeasonDef {
    let (name, [fire, ice, wind, earth, lightning], event_chance) = match season {
        Season::Spring => ("Spring", [0.8, 0.7, 1.5, 1.2, 1.0], 0.3),
        Season::Summer => ("Summer", [1.3, 1.4, 0.9, 0.8, 1.2], 0.4),
        Season::Autumn => ("Autumn", [1.1, 0.9, 1.1, 1.4, 1.0], 0.3),
        Season::Winter => ("Winter", [1.4, 1.5, 0.7, 0.8, 1.1], 0.3),
    };
    SeasonDef {
        id: season,
        name,
        event_chance,
        fire,
        ice,
        wind,
        earth,
        lightning,
    }
}

// ============================================================================
// Seasonal events
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct SeasonalEventDef {
    pub id: SeasonalEventId,
    pub name: &'static str,
    pub description: &'static str,
    /// Length in in-game days
    pub duration: u32,
    pub element_bonus: &'static [(Element, f64)],
    /// Shown on the event banner; not part of sale pricing
    pub price_modifier: f64,
}

impl SeasonalEventDef {
    pub fn bonus_for(&self, element: Element) -> Option<f64> {
        self.element_bonus
            .iter()
            .find(|(e, _)| *e == element)
            .map(|(_, bonus)| *bonus)
    }
}

pub fn seasonal_event_def(event: SeasonalEventId) -> SeasonalEventDef {
    match event {
        SeasonalEventId::SpringFestival => SeasonalEventDef {
            id: event,
            name: "Spring Festival",
            description: "The festival sends demand for wind tomes soaring",
            duration: 5,
            element_bonus: &[(Element::Wind, 2.0)],
            price_modifier: 1.3,
        },
        SeasonalEventId::HeatWave => SeasonalEventDef {
            id: event,
            name: "Heat Wave",
            description: "Record heat has ice tomes flying off the shelves",
            duration: 3,
            element_bonus: &[(Element::Ice, 2.5)],
            price_modifier: 1.5,
        },
        SeasonalEventId::HarvestFestival => SeasonalEventDef {
            id: event,
            name: "Harvest Festival",
            description: "The harvest raises demand for earth tomes",
            duration: 4,
            element_bonus: &[(Element::Earth, 1.8)],
            price_modifier: 1.4,
        },
        SeasonalEventId::Blizzard => SeasonalEventDef {
            id: event,
            name: "Blizzard",
            description: "Bitter cold makes fire tomes a necessity",
            duration: 3,
            element_bonus: &[(Element::Fire, 2.0)],
            price_modifier: 1.6,
        },
    }
}

/// Events that can fire during a season
pub fn seasonal_events(season: Season) -> &'static [SeasonalEventId] {
    match season {
        Season::Spring => &[SeasonalEventId::SpringFestival],
        Season::Summer => &[SeasonalEventId::HeatWave],
        Season::Autumn => &[SeasonalEventId::HarvestFestival],
        Season::Winter => &[SeasonalEventId::Blizzard],
    }
}

// ============================================================================
// World events
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct WorldEventDef {
    pub kind: WorldEventKind,
    pub name: &'static str,
    pub description: &'static str,
    pub precursor_chance: f64,
    pub event_chance: f64,
    pub precursor_messages: &'static [&'static str],
}

pub fn world_event_def(kind: WorldEventKind) -> WorldEventDef {
    match kind {
        WorldEventKind::HeroArrival => WorldEventDef {
            kind,
            name: "A Hero Appears",
            description: "A hero rises and the human side grows stronger",
            precursor_chance: 0.7,
            event_chance: 0.6,
            precursor_messages: &[
                "Rumors of a hero are spreading through town...",
                "A strange gleam of a sword was seen far away...",
            ],
        },
        WorldEventKind::DragonAttack => WorldEventDef {
            kind,
            name: "Dragon Attack",
            description: "A dragon descends and the monster side grows stronger",
            precursor_chance: 0.6,
            event_chance: 0.5,
            precursor_messages: &[
                "An eerie roar echoes from the sky...",
                "Livestock is vanishing from the nearby villages...",
            ],
        },
        WorldEventKind::MarketBoom => WorldEventDef {
            kind,
            name: "Market Boom",
            description: "Tome prices climb for a while",
            precursor_chance: 0.5,
            event_chance: 0.4,
            precursor_messages: &[
                "Demand for tomes is rising fast...",
                "Merchants from neighboring lands are gathering...",
            ],
        },
    }
}

// ============================================================================
// Magic tiers
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct MagicTierDef {
    pub tier: MagicTier,
    pub level: u32,
    pub elements: &'static [Element],
}

pub fn magic_tier_def(tier: MagicTier) -> MagicTierDef {
    match tier {
        MagicTier::Beginner => MagicTierDef {
            tier,
            level: 0,
            elements: &[Element::Fire, Element::Ice],
        },
        MagicTier::Intermediate => MagicTierDef {
            tier,
            level: 5,
            elements: &[Element::Wind, Element::Earth],
        },
        MagicTier::Advanced => MagicTierDef {
            tier,
            level: 10,
            elements: &[Element::Lightning],
        },
    }
}
