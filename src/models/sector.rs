use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sectors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub sector_type: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::goal::Entity")]
    Goals,
    #[sea_orm(has_many = "super::message::Entity")]
    Messages,
    #[sea_orm(has_many = "super::statistic::Entity")]
    Statistics,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::goal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl Related<super::statistic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Statistics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Closed set of life domains a sector can belong to.
///
/// Request bodies carry these as snake_case strings; unknown values are
/// rejected at deserialization instead of being stored verbatim.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorType {
    Health,
    Finance,
    Career,
    Relationships,
    Learning,
    Creativity,
    Fitness,
    MentalHealth,
}

impl SectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectorType::Health => "health",
            SectorType::Finance => "finance",
            SectorType::Career => "career",
            SectorType::Relationships => "relationships",
            SectorType::Learning => "learning",
            SectorType::Creativity => "creativity",
            SectorType::Fitness => "fitness",
            SectorType::MentalHealth => "mental_health",
        }
    }
}

impl FromStr for SectorType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "health" => Ok(SectorType::Health),
            "finance" => Ok(SectorType::Finance),
            "career" => Ok(SectorType::Career),
            "relationships" => Ok(SectorType::Relationships),
            "learning" => Ok(SectorType::Learning),
            "creativity" => Ok(SectorType::Creativity),
            "fitness" => Ok(SectorType::Fitness),
            "mental_health" => Ok(SectorType::MentalHealth),
            _ => Err(()),
        }
    }
}
