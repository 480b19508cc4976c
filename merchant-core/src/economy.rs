//! Price formulas for materials and crafted books.
//!
//! Everything here is a pure function of its inputs. Sale prices are a
//! product of independent multipliers, so the factors can be inspected one
//! at a time through [`SalePriceFactors`].

use crate::catalog::{MaterialDef, element_def, material_def, season_def, seasonal_event_def};
use crate::error::Rejection;
use crate::state::{ActiveSeasonalEvent, DemandRating, GameState, InventoryItem, ItemKey};
use crate::types::{Element, Faction, MaterialId, Season};

/// Reputation gained with a faction per point of item quality sold to it
pub const REPUTATION_PER_QUALITY: f64 = 0.1;

/// Price of one unit of material under the current market trend
pub fn material_price(material: &MaterialDef, market_trend: f64) -> u64 {
    let price = (material.base_price * (1.0 + market_trend * material.market_influence)).round();
    price.max(0.0) as u64
}

/// Balance- and element-dependent demand multiplier.
///
/// The losing side pays a 20% premium; each element then reacts to how
/// lopsided the war is.
pub fn situational_demand(element: Element, faction: Faction, human_power: f64) -> f64 {
    let mut demand = 1.0;

    let losing_side = match faction {
        Faction::Human => human_power < 40.0,
        Faction::Monster => human_power > 60.0,
    };
    if losing_side {
        demand *= 1.2;
    }

    let imbalance = (human_power - 50.0).abs();
    demand *= match element {
        Element::Fire => {
            if human_power < 50.0 {
                1.3
            } else {
                0.8
            }
        }
        Element::Ice => {
            if imbalance < 20.0 {
                1.2
            } else {
                0.9
            }
        }
        Element::Wind => {
            if human_power > 60.0 {
                1.4
            } else {
                1.0
            }
        }
        Element::Earth => {
            if imbalance < 30.0 {
                1.2
            } else {
                1.1
            }
        }
        Element::Lightning => {
            if imbalance > 40.0 {
                1.5
            } else {
                1.1
            }
        }
    };

    demand
}

/// Product of the element bonuses of every active event naming the element
pub fn event_bonus(element: Element, active_events: &[ActiveSeasonalEvent]) -> f64 {
    active_events
        .iter()
        .filter_map(|event| seasonal_event_def(event.id).bonus_for(element))
        .product()
}

/// Maps reputation in [0, 100] onto a price multiplier in [0.8, 1.2]
pub fn reputation_modifier(reputation: f64) -> f64 {
    0.8 + reputation / 250.0
}

/// Coarse demand label for a faction's base appetite for an element
pub fn demand_rating(element: Element, faction: Faction) -> DemandRating {
    let demand = element_def(element).demand(faction);
    if demand >= 1.2 {
        DemandRating::High
    } else if demand <= 0.8 {
        DemandRating::Low
    } else {
        DemandRating::Normal
    }
}

/// Market conditions a sale is priced against
#[derive(Debug, Clone, Copy)]
pub struct MarketConditions<'a> {
    pub human_power: f64,
    pub market_trend: f64,
    pub season: Season,
    pub active_events: &'a [ActiveSeasonalEvent],
    pub reputation: f64,
}

impl<'a> MarketConditions<'a> {
    pub fn for_faction(state: &'a GameState, faction: Faction) -> Self {
        Self {
            human_power: state.balance.human(),
            market_trend: state.market.trend(),
            season: state.calendar.season,
            active_events: &state.active_seasonal_events,
            reputation: state.reputation.get(faction),
        }
    }
}

/// Individual multipliers that make up a sale price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalePriceFactors {
    pub base_price: f64,
    pub faction_demand: f64,
    pub situational_demand: f64,
    pub seasonal: f64,
    pub event_bonus: f64,
    pub reputation: f64,
    pub quality: f64,
    pub trend: f64,
}

impl SalePriceFactors {
    pub fn compute(item: &InventoryItem, faction: Faction, market: &MarketConditions) -> Self {
        Self {
            base_price: item.base_price as f64,
            faction_demand: element_def(item.element).demand(faction),
            situational_demand: situational_demand(item.element, faction, market.human_power),
            seasonal: season_def(market.season).element_modifier(item.element),
            event_bonus: event_bonus(item.element, market.active_events),
            reputation: reputation_modifier(market.reputation),
            quality: item.quality,
            trend: 1.0 + market.market_trend,
        }
    }

    pub fn price(&self) -> f64 {
        self.base_price
            * self.faction_demand
            * self.situational_demand
            * self.seasonal
            * self.event_bonus
            * self.reputation
            * self.quality
            * self.trend
    }
}

/// Unrounded sale price of one book to a faction
pub fn item_sale_price(item: &InventoryItem, faction: Faction, market: &MarketConditions) -> f64 {
    SalePriceFactors::compute(item, faction, market).price()
}

/// Gold credited for a sale: the sale price rounded down
pub fn sale_proceeds(item: &InventoryItem, faction: Faction, market: &MarketConditions) -> u64 {
    item_sale_price(item, faction, market).floor().max(0.0) as u64
}

// === TRADES ===

/// Buy one unit of a material at the current market price
pub fn buy_material(state: &mut GameState, material: MaterialId) -> Result<u64, Rejection> {
    let price = material_price(&material_def(material), state.market.trend());
    if state.gold < price {
        return Err(Rejection::InsufficientGold {
            price,
            gold: state.gold,
        });
    }
    state.gold -= price;
    state.materials.add(material, 1);

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "purchase",
        clock_ms = state.clock_ms,
        material = material_def(material).name,
        price = price,
        gold_after = state.gold,
    );

    Ok(price)
}

/// Sell one book from a stack to a faction.
///
/// The buyer gains power equal to the book's power and a little reputation
/// scaled by its quality. Returns the gold credited.
pub fn sell_item(state: &mut GameState, key: ItemKey, faction: Faction) -> Result<u64, Rejection> {
    let item = state.inventory.take_one(key).ok_or(Rejection::OutOfStock)?;
    let proceeds = sale_proceeds(&item, faction, &MarketConditions::for_faction(state, faction));

    state.gold += proceeds;
    state.balance.shift_toward(faction, item.power as f64);
    state
        .reputation
        .raise(faction, item.quality * REPUTATION_PER_QUALITY);

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "sale",
        clock_ms = state.clock_ms,
        element = element_def(item.element).name,
        faction = ?faction,
        power = item.power,
        proceeds = proceeds,
        human_power = state.balance.human(),
    );

    Ok(proceeds)
}
