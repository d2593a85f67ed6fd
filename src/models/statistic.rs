use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Time-series data point recorded against a sector. Append-only;
/// `extra_data` holds free-form JSON serialized to TEXT.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "statistics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sector_id: i32,
    pub metric_name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub recorded_at: String,
    pub extra_data: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sector::Entity",
        from = "Column::SectorId",
        to = "super::sector::Column::Id"
    )]
    Sector,
}

impl Related<super::sector::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sector.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
