use serde::Deserialize;
use serde_json::Value as JsonValue;

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Deserialize, Debug)]
pub struct SubmitEntryPayload {
    pub player_id: i64,
    pub game_id: i64,
    /// For quizzes: an object keyed by question id, e.g. `{"42": "blue"}`.
    /// For other game types: free-form entry content.
    pub answers: JsonValue,
}

#[derive(Deserialize, Debug)]
pub struct GetLeaderboardParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Deserialize, Debug)]
pub struct GetPlayerRewardsParams {
    pub player_id: i64,
}
