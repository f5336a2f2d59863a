use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Game account linked to a site user for the launcher.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GameAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub game: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewGameAccount {
    pub user_id: Uuid,
    pub username: String,
    pub game: String,
}
