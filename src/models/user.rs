use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub human_level: i32,
    pub total_points: i32,
    pub streak_days: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sector::Entity")]
    Sectors,
    #[sea_orm(has_many = "super::user_badge::Entity")]
    UserBadges,
    #[sea_orm(has_many = "super::conversation::Entity")]
    Conversations,
    #[sea_orm(has_many = "super::saved_news::Entity")]
    SavedNews,
}

impl Related<super::sector::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sectors.def()
    }
}

impl Related<super::user_badge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserBadges.def()
    }
}

impl Related<super::conversation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conversations.def()
    }
}

impl Related<super::saved_news::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavedNews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// API representation of a user. The password hash never leaves the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub human_level: i32,
    pub total_points: i32,
    pub streak_days: i32,
    pub created_at: String,
}

impl From<Model> for UserDto {
    fn from(m: Model) -> Self {
        UserDto {
            id: m.id,
            email: m.email,
            full_name: m.full_name,
            human_level: m.human_level,
            total_points: m.total_points,
            streak_days: m.streak_days,
            created_at: m.created_at,
        }
    }
}
