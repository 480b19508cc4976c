use thiserror::Error;

use crate::types::RecipeId;

/// Why a player action was refused. A refused action never changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("the game is not running")]
    GameNotRunning,

    #[error("not enough gold: costs {price}G, have {gold}G")]
    InsufficientGold { price: u64, gold: u64 },

    #[error("not enough materials for {0:?}")]
    InsufficientMaterials(RecipeId),

    #[error("{recipe:?} needs level {required}, current level is {level}")]
    LevelTooLow {
        recipe: RecipeId,
        required: u32,
        level: u32,
    },

    #[error("out of stock")]
    OutOfStock,

    #[error("no auto-production slot {0}")]
    NoSuchSlot(usize),

    #[error("auto-production slot {0} is locked")]
    SlotLocked(usize),

    #[error("{0:?} cannot be auto-produced at the current level")]
    RecipeNotAllowed(RecipeId),

    #[error("auto-production slot {0} has no recipe")]
    SlotUnassigned(usize),
}
