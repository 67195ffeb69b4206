use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Deserialize, Debug)]
pub struct GetGamesParams {
    pub admin_id: i64,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<String>,
    pub game_type: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct GetGameParams {
    pub admin_id: i64,
    pub game_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct QuestionPayload {
    pub question_type: String,
    pub question_text: String,
    pub options: Option<JsonValue>,
    /// A single string or an array of accepted strings.
    pub correct_answer: JsonValue,
    pub points: i32,
    pub order: i32,
}

#[derive(Deserialize, Debug)]
pub struct RewardRulePayload {
    pub reward_type: String,
    #[serde(default)]
    pub reward_value: JsonValue,
    #[serde(default)]
    pub for_winner: bool,
    #[serde(default)]
    pub for_participation: bool,
}

#[derive(Deserialize, Debug)]
pub struct CreateGamePayload {
    pub admin_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub game_type: String,
    pub difficulty: String,
    pub config: Option<JsonValue>,
    pub expires_at: Option<DateTime<Utc>>,
    pub questions: Option<Vec<QuestionPayload>>,
    pub rewards: Option<Vec<RewardRulePayload>>,
}

#[derive(Deserialize, Debug)]
pub struct ModifyGamePayload {
    pub admin_id: i64,
    pub game_id: i64,

    pub title: Option<String>,
    pub description: Option<String>,
    pub game_type: Option<String>,
    pub difficulty: Option<String>,
    pub status: Option<String>,
    pub config: Option<JsonValue>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Full replacement of the question set when present.
    pub questions: Option<Vec<QuestionPayload>>,
    /// Full replacement of the reward rules when present.
    pub rewards: Option<Vec<RewardRulePayload>>,
}

#[derive(Deserialize, Debug)]
pub struct DeleteGamePayload {
    pub admin_id: i64,
    pub game_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct GetGameSubmissionsParams {
    pub admin_id: i64,
    pub game_id: i64,
    #[serde(default)]
    pub winners_only: bool,
}

#[derive(Deserialize, Debug)]
pub struct ReviewSubmissionPayload {
    pub admin_id: i64,
    pub submission_id: i64,
    pub score: Option<i32>,
    pub feedback: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SelectWinnersPayload {
    pub admin_id: i64,
    pub game_id: i64,
    pub submission_ids: Vec<i64>,
}

#[derive(Deserialize, Debug)]
pub struct AwardRewardsPayload {
    pub admin_id: i64,
    pub game_id: i64,
    /// Defaults to every submission of the game when omitted.
    pub submission_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub is_participation: bool,
}

#[derive(Deserialize, Debug)]
pub struct RefreshLeaderboardPayload {
    pub admin_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct GetBadgesParams {
    pub admin_id: i64,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub badge_type: Option<String>,
    pub rarity: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateBadgePayload {
    pub admin_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub badge_type: String,
    pub rarity: String,
    pub criteria: Option<JsonValue>,
}

#[derive(Deserialize, Debug)]
pub struct ModifyBadgePayload {
    pub admin_id: i64,
    pub badge_id: i64,

    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub badge_type: Option<String>,
    pub rarity: Option<String>,
    pub criteria: Option<JsonValue>,
}

#[derive(Deserialize, Debug)]
pub struct DeleteBadgePayload {
    pub admin_id: i64,
    pub badge_id: i64,
}
