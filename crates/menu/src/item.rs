use serde::{Deserialize, Serialize};

use bistro_core::{Cents, DomainError, RecordId};

/// Category name that receives drink-specific pricing advice.
pub const DRINKS_CATEGORY: &str = "Drinks";

/// Menu item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuItemId(pub RecordId);

impl MenuItemId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for MenuItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One ingredient line of a recipe: how much of an ingredient one portion
/// consumes and what a unit of that ingredient costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeLine {
    pub ingredient: String,
    pub quantity: f64,
    /// Price per ingredient unit in smallest currency unit (e.g., cents).
    pub unit_price: Cents,
}

/// Menu item as consumed by profitability analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub category_name: String,
    /// Production cost of one portion in smallest currency unit.
    pub unit_cost: Cents,
}

impl MenuItem {
    pub fn new(
        id: MenuItemId,
        name: impl Into<String>,
        category_name: impl Into<String>,
        unit_cost: Cents,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category_name: category_name.into(),
            unit_cost,
        }
    }

    /// Build a menu item whose unit cost is priced from its recipe:
    /// Σ ingredient quantity × ingredient unit price, rounded to the nearest cent.
    pub fn from_recipe(
        id: MenuItemId,
        name: impl Into<String>,
        category_name: impl Into<String>,
        recipe: &[RecipeLine],
    ) -> Result<Self, DomainError> {
        let mut total = 0.0_f64;
        for line in recipe {
            if !(line.quantity.is_finite() && line.quantity >= 0.0) {
                return Err(DomainError::validation(format!(
                    "ingredient '{}' has invalid quantity {}",
                    line.ingredient, line.quantity
                )));
            }
            total += line.quantity * line.unit_price.get() as f64;
        }
        Ok(Self::new(id, name, category_name, Cents(total.round() as u64)))
    }

    pub fn is_drink(&self) -> bool {
        self.category_name.eq_ignore_ascii_case(DRINKS_CATEGORY)
    }
}
