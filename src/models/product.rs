use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ALERT_THRESHOLD: i32 = 5;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub supplier_id: Option<i32>,
    /// Unit purchase price (Lei)
    pub purchase_price: Option<f64>,
    /// Running total, bumped by stock entries and editable by hand.
    pub stock_quantity: i32,
    pub stock_alert_threshold: i32,
    pub image_path: Option<String>,
    pub dimensions: Option<String>,
    pub weight: Option<f64>,
    pub technical_specs: Option<String>,
    pub last_purchase_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Supplier,
    #[sea_orm(has_many = "super::stock_entry::Entity")]
    StockEntries,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::stock_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.stock_alert_threshold
    }
}
