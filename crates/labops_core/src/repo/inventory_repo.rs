//! Inventory repository. Insert and scoped reads only.

use super::{parse_uuid, scope_filter, RepoResult};
use crate::access::Visibility;
use crate::model::inventory::{InventoryItem, InventoryItemId};
use rusqlite::{params, params_from_iter, Connection, Row};

pub trait InventoryRepository {
    fn insert_item(&self, item: &InventoryItem) -> RepoResult<InventoryItemId>;
    fn list_items(&self, visibility: &Visibility) -> RepoResult<Vec<InventoryItem>>;
    fn count_items(&self, visibility: &Visibility) -> RepoResult<u64>;
}

pub struct SqliteInventoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInventoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl InventoryRepository for SqliteInventoryRepository<'_> {
    fn insert_item(&self, item: &InventoryItem) -> RepoResult<InventoryItemId> {
        item.validate()?;
        self.conn.execute(
            "INSERT INTO inventory_items (id, name, quantity, adder_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                item.id.to_string(),
                item.name.as_str(),
                item.quantity,
                item.adder.to_string(),
                item.created_at,
            ],
        )?;
        Ok(item.id)
    }

    fn list_items(&self, visibility: &Visibility) -> RepoResult<Vec<InventoryItem>> {
        let Some(filter) = scope_filter(visibility, "adder_id") else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT id, name, quantity, adder_id, created_at
             FROM inventory_items{}
             ORDER BY created_at DESC, id ASC;",
            filter.clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(filter.binds))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn count_items(&self, visibility: &Visibility) -> RepoResult<u64> {
        let Some(filter) = scope_filter(visibility, "adder_id") else {
            return Ok(0);
        };
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM inventory_items{};", filter.clause),
            params_from_iter(filter.binds),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<InventoryItem> {
    let id_text: String = row.get("id")?;
    let adder_text: String = row.get("adder_id")?;
    Ok(InventoryItem {
        id: parse_uuid(&id_text, "inventory_items.id")?,
        name: row.get("name")?,
        quantity: row.get("quantity")?,
        adder: parse_uuid(&adder_text, "inventory_items.adder_id")?,
        created_at: row.get("created_at")?,
    })
}
