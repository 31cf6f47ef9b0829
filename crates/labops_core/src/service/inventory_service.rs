//! Inventory use-cases.

use super::{with_store_retry, ServiceContext, ServiceError, ServiceResult};
use crate::access::{resolve_scope, ResourceKind};
use crate::model::audit::ActivityAction;
use crate::model::inventory::{InventoryItem, NewInventoryItem};
use crate::model::user::Caller;
use crate::repo::inventory_repo::{InventoryRepository, SqliteInventoryRepository};
use log::info;
use uuid::Uuid;

pub struct InventoryService<'a> {
    ctx: ServiceContext<'a>,
    items: SqliteInventoryRepository<'a>,
}

impl<'a> InventoryService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self {
            ctx,
            items: SqliteInventoryRepository::new(ctx.conn),
        }
    }

    /// Lists items visible to `caller`, newest first.
    pub fn list_inventory(&self, caller: &Caller) -> ServiceResult<Vec<InventoryItem>> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::Inventory);
        let items = with_store_retry(self.ctx.config, "inventory_list", || {
            self.items.list_items(&scope.visibility)
        })?;
        Ok(items)
    }

    /// Records a new item added by `caller`.
    pub fn add_inventory_item(
        &self,
        caller: &Caller,
        input: NewInventoryItem,
    ) -> ServiceResult<InventoryItem> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::Inventory);
        if !scope.may_create {
            return Err(ServiceError::forbidden(ResourceKind::Inventory, "create"));
        }

        let item = InventoryItem {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            quantity: input.quantity,
            adder: caller.user_id,
            created_at: self.ctx.clock.now_ms(),
        };
        item.validate()?;

        with_store_retry(self.ctx.config, "inventory_add", || self.items.insert_item(&item))?;
        info!(
            "event=inventory_add module=inventory_service status=ok item_id={} quantity={} adder={}",
            item.id, item.quantity, item.adder
        );
        self.ctx.record_activity(caller, ActivityAction::InventoryAdded);
        Ok(item)
    }
}
