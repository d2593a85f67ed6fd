use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set};

use crate::models::badge;

struct BadgeDef {
    name: &'static str,
    description: &'static str,
    badge_type: &'static str,
    icon: &'static str,
    criteria: &'static str,
    points_value: i32,
}

const BADGE_CATALOG: [BadgeDef; 7] = [
    BadgeDef {
        name: "First Step",
        description: "Create your first sector",
        badge_type: "bronze",
        icon: "👣",
        criteria: "sectors_created:1",
        points_value: 10,
    },
    BadgeDef {
        name: "Goal Setter",
        description: "Set 5 goals",
        badge_type: "bronze",
        icon: "🎯",
        criteria: "goals_created:5",
        points_value: 25,
    },
    BadgeDef {
        name: "Achiever",
        description: "Complete 10 goals",
        badge_type: "silver",
        icon: "✓",
        criteria: "goals_completed:10",
        points_value: 50,
    },
    BadgeDef {
        name: "Consistent",
        description: "7 day streak",
        badge_type: "silver",
        icon: "🔥",
        criteria: "streak_days:7",
        points_value: 25,
    },
    BadgeDef {
        name: "Dedicated",
        description: "30 day streak",
        badge_type: "gold",
        icon: "💪",
        criteria: "streak_days:30",
        points_value: 100,
    },
    BadgeDef {
        name: "Deep Thinker",
        description: "Hold a conversation with 5 or more messages",
        badge_type: "silver",
        icon: "💬",
        criteria: "conversations_deep:1",
        points_value: 25,
    },
    BadgeDef {
        name: "Level 5",
        description: "Reach level 5",
        badge_type: "platinum",
        icon: "⭐",
        criteria: "human_level:5",
        points_value: 200,
    },
];

/// Insert the badge catalog, skipping entries that already exist.
/// Safe to run on every startup.
pub async fn seed_badges(db: &DatabaseConnection) -> Result<(), DbErr> {
    for def in &BADGE_CATALOG {
        let model = badge::ActiveModel {
            name: Set(def.name.to_owned()),
            description: Set(def.description.to_owned()),
            badge_type: Set(def.badge_type.to_owned()),
            icon: Set(def.icon.to_owned()),
            criteria: Set(def.criteria.to_owned()),
            points_value: Set(def.points_value),
            ..Default::default()
        };

        let result = badge::Entity::insert(model)
            .on_conflict(
                OnConflict::column(badge::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
