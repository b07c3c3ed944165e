use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Categories offered by the upload form
pub const CATEGORIES: &[&str] = &[
    "Factură",
    "Certificare",
    "Specificații",
    "Declarație Vamală",
    "Altele",
];

pub const DEFAULT_CATEGORY: &str = "Altele";

/// Metadata for a file stored under the documents directory.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    /// Name on disk (timestamp prefixed)
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub category: String,
    pub supplier_id: Option<i32>,
    pub product_id: Option<i32>,
    pub upload_date: String,
    pub uploaded_by: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Supplier,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UploadedBy",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
