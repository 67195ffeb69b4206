use crate::schema::book_credits;
use crate::schema::discount_codes;
use crate::schema::leaderboard;
use crate::schema::submissions;
use crate::schema::user_badges;
use crate::schema::user_points;
use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Insertable, Debug)]
#[diesel(table_name = submissions)]
pub struct NewSubmission {
    pub game_id: i64,
    pub player_id: i64,
    pub answers: JsonValue,
    pub score: Option<i32>,
    // is_winner defaults to false in DB
    // submitted_at has a DB default
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = user_badges)]
pub struct NewUserBadge {
    pub player_id: i64,
    pub badge_id: i64,
    pub game_id: Option<i64>,
    // awarded_at has a DB default
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = user_points)]
pub struct NewUserPoints {
    pub player_id: i64,
    pub points: i32,
    pub source: String,
    pub game_id: Option<i64>,
    pub description: String,
    // awarded_at has a DB default
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = discount_codes)]
pub struct NewDiscountCode {
    pub player_id: i64,
    pub game_id: Option<i64>,
    pub code: String,
    pub percentage: i32,
    pub expires_at: DateTime<Utc>,
    // used_at is nullable, created_at has a DB default
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = book_credits)]
pub struct NewBookCredit {
    pub player_id: i64,
    pub game_id: Option<i64>,
    pub amount: i32,
    pub expires_at: DateTime<Utc>,
    // used_at is nullable, created_at has a DB default
}

#[derive(Insertable, Queryable, Debug, Clone)]
#[diesel(table_name = leaderboard)]
pub struct LeaderboardRow {
    pub player_id: i64,
    pub total_points: i64,
    pub total_wins: i64,
    pub total_participation: i64,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub rank: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct PublishedGame {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub game_type: String,
    pub difficulty: String,
    pub config: JsonValue,
    pub expires_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SubmitEntryResponse {
    pub submission_id: i64,
    /// Auto-computed for quizzes; `None` for entries awaiting manual review.
    pub score: Option<i32>,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct LeaderboardEntry {
    pub rank: i32,
    pub player_id: i64,
    pub display_name: String,
    pub total_points: i64,
    pub total_wins: i64,
    pub total_participation: i64,
    pub last_activity_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LeaderboardPageResponse {
    pub entries: Vec<LeaderboardEntry>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct PlayerBadge {
    pub badge_id: i64,
    pub name: String,
    pub icon: String,
    pub badge_type: String,
    pub rarity: String,
    pub game_id: Option<i64>,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct PlayerDiscountCode {
    pub code: String,
    pub percentage: i32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct PlayerBookCredit {
    pub amount: i32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PlayerRewardsResponse {
    pub total_points: i64,
    pub badges: Vec<PlayerBadge>,
    pub discount_codes: Vec<PlayerDiscountCode>,
    pub book_credits: Vec<PlayerBookCredit>,
}
