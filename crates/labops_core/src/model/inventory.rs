//! Inventory item model.

use super::user::UserId;
use super::validation::{require_text, ModelValidationError};
use super::Scoped;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type InventoryItemId = Uuid;

/// Persisted inventory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub name: String,
    pub quantity: i64,
    pub adder: UserId,
    /// Epoch ms.
    pub created_at: i64,
}

impl InventoryItem {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("name", &self.name)?;
        if self.quantity < 0 {
            return Err(ModelValidationError::NegativeQuantity(self.quantity));
        }
        Ok(())
    }
}

impl Scoped for InventoryItem {
    fn scope_owner(&self) -> UserId {
        self.adder
    }
}

/// Input for adding an inventory item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryItem {
    pub name: String,
    pub quantity: i64,
}
