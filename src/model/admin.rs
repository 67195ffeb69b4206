use crate::schema::badges;
use crate::schema::games;
use crate::schema::questions;
use crate::schema::reward_rules;
use crate::schema::submissions;
use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Insertable, Debug)]
#[diesel(table_name = games)]
pub struct NewGame {
    pub title: String,
    pub description: String,
    pub game_type: String,
    pub difficulty: String,
    pub status: String,
    pub config: JsonValue,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    // published_at stays NULL until the game is published
    // created_at, updated_at have DB defaults
}

#[derive(Insertable, Debug)]
#[diesel(table_name = questions)]
pub struct NewQuestion {
    pub game_id: i64,
    pub question_type: String,
    pub question_text: String,
    pub options: Option<JsonValue>,
    pub correct_answer: JsonValue,
    pub points: i32,
    pub order: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = reward_rules)]
pub struct NewRewardRule {
    pub game_id: i64,
    pub reward_type: String,
    pub reward_value: JsonValue,
    pub for_winner: bool,
    pub for_participation: bool,
    // created_at has a DB default
}

#[derive(Insertable, Debug)]
#[diesel(table_name = badges)]
pub struct NewBadge {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub badge_type: String,
    pub rarity: String,
    pub criteria: Option<JsonValue>,
    // created_at, updated_at have DB defaults
}

/// Sparse patch for a game: `None` means "field not sent", never "clear".
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = games)]
pub struct GameChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub game_type: Option<String>,
    pub difficulty: Option<String>,
    pub status: Option<String>,
    pub config: Option<JsonValue>,
    pub expires_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = badges)]
pub struct BadgeChangeset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub badge_type: Option<String>,
    pub rarity: Option<String>,
    pub criteria: Option<JsonValue>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = submissions)]
pub struct SubmissionReviewChangeset {
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct Game {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub game_type: String,
    pub difficulty: String,
    pub status: String,
    pub config: JsonValue,
    pub expires_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct QuestionData {
    pub id: i64,
    pub question_type: String,
    pub question_text: String,
    pub options: Option<JsonValue>,
    pub correct_answer: JsonValue,
    pub points: i32,
    pub order: i32,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct RewardRuleData {
    pub id: i64,
    pub reward_type: String,
    pub reward_value: JsonValue,
    pub for_winner: bool,
    pub for_participation: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GameSummary {
    pub id: i64,
    pub title: String,
    pub game_type: String,
    pub difficulty: String,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submission_count: i64,
    pub winner_count: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GamesPageResponse {
    pub games: Vec<GameSummary>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GameDetailResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub game_type: String,
    pub difficulty: String,
    pub status: String,
    pub config: JsonValue,
    pub expires_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub rewards: Vec<RewardRuleData>,
    /// Present for quizzes only, sorted ascending by `order`.
    pub questions: Option<Vec<QuestionData>>,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct SubmissionData {
    pub id: i64,
    pub game_id: i64,
    pub player_id: i64,
    pub answers: JsonValue,
    pub score: Option<i32>,
    pub is_winner: bool,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct BadgeData {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub badge_type: String,
    pub rarity: String,
    pub criteria: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BadgeSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub badge_type: String,
    pub rarity: String,
    pub criteria: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub usage_count: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BadgesPageResponse {
    pub badges: Vec<BadgeSummary>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SelectWinnersResponse {
    pub winners_marked: i64,
    pub rewards_granted: i64,
    pub players_ranked: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AwardRewardsResponse {
    pub submissions_processed: i64,
    pub rewards_granted: i64,
    pub players_ranked: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RefreshLeaderboardResponse {
    pub players_ranked: i64,
}
