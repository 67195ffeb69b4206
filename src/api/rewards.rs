use crate::errors::AppError;
use crate::model::player::{NewBookCredit, NewDiscountCode, NewUserBadge, NewUserPoints};
use crate::schema::{
    book_credits, discount_codes, reward_rules::dsl as rr_dsl, submissions::dsl as sub_dsl,
    user_badges, user_points,
};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

const DISCOUNT_CODE_VALIDITY_DAYS: i64 = 30;
const BOOK_CREDIT_VALIDITY_DAYS: i64 = 90;
const DEFAULT_DISCOUNT_PERCENTAGE: i32 = 10;

pub(super) struct GrantOutcome {
    pub submissions_processed: i64,
    pub rewards_granted: i64,
}

/// Applies every matching reward rule of a game to the target submissions.
///
/// Targets are the given submission ids (filtered to the game) or every
/// submission of the game when `submission_ids` is `None`. In winner mode a
/// submission is eligible only when `is_winner` is set; in participation mode
/// every target is eligible. Each rule is evaluated independently per
/// eligible submission, and grants accumulate across calls: re-running the
/// same grant duplicates ledger rows. The caller decides when to dispense.
///
/// Runs on the caller's connection so the whole grant shares the caller's
/// transaction.
pub(super) fn grant_rewards(
    conn: &mut PgConnection,
    game_id: i64,
    game_title: &str,
    submission_ids: Option<&[i64]>,
    is_participation: bool,
) -> Result<GrantOutcome, AppError> {
    let rules: Vec<(String, JsonValue, bool, bool)> = rr_dsl::reward_rules
        .filter(rr_dsl::game_id.eq(game_id))
        .select((
            rr_dsl::reward_type,
            rr_dsl::reward_value,
            rr_dsl::for_winner,
            rr_dsl::for_participation,
        ))
        .load(conn)?;

    let mut target_query = sub_dsl::submissions
        .filter(sub_dsl::game_id.eq(game_id))
        .select((sub_dsl::id, sub_dsl::player_id, sub_dsl::is_winner))
        .into_boxed();
    if let Some(ids) = submission_ids {
        target_query = target_query.filter(sub_dsl::id.eq_any(ids.to_vec()));
    }
    let targets: Vec<(i64, i64, bool)> = target_query.load(conn)?;

    debug!(
        "Dispensing rewards for game {}: {} rules, {} target submissions, participation={}",
        game_id,
        rules.len(),
        targets.len(),
        is_participation
    );

    let mut rewards_granted = 0i64;

    for (submission_id, player_id, is_winner) in &targets {
        let eligible = if is_participation { true } else { *is_winner };
        if !eligible {
            debug!(
                "Submission {} is not a winner; skipping winner rewards",
                submission_id
            );
            continue;
        }

        for (reward_type, reward_value, for_winner, for_participation) in &rules {
            let rule_matches = if is_participation {
                *for_participation
            } else {
                *for_winner
            };
            if !rule_matches {
                continue;
            }

            match reward_type.as_str() {
                "badge" => {
                    // A rule without a badge id grants nothing.
                    let Some(badge_id) = reward_value.get("badge_id").and_then(JsonValue::as_i64)
                    else {
                        warn!(
                            "Badge rule for game {} has no badge_id; skipping",
                            game_id
                        );
                        continue;
                    };
                    let grant = NewUserBadge {
                        player_id: *player_id,
                        badge_id,
                        game_id: Some(game_id),
                    };
                    diesel::insert_into(user_badges::table)
                        .values(&grant)
                        .execute(conn)?;
                    rewards_granted += 1;
                }
                "points" => {
                    let Some(points) = reward_value
                        .get("points")
                        .and_then(JsonValue::as_i64)
                        .and_then(|p| i32::try_from(p).ok())
                    else {
                        warn!(
                            "Points rule for game {} has no usable points value; skipping",
                            game_id
                        );
                        continue;
                    };
                    let description = if is_participation {
                        format!("Participation reward for {}", game_title)
                    } else {
                        format!("Winner reward for {}", game_title)
                    };
                    let grant = NewUserPoints {
                        player_id: *player_id,
                        points,
                        source: "game_win".to_string(),
                        game_id: Some(game_id),
                        description,
                    };
                    diesel::insert_into(user_points::table)
                        .values(&grant)
                        .execute(conn)?;
                    rewards_granted += 1;
                }
                "discount_code" => {
                    let percentage = reward_value
                        .get("discount_percentage")
                        .and_then(JsonValue::as_i64)
                        .and_then(|p| i32::try_from(p).ok())
                        .unwrap_or(DEFAULT_DISCOUNT_PERCENTAGE);
                    let grant = NewDiscountCode {
                        player_id: *player_id,
                        game_id: Some(game_id),
                        code: generate_discount_code(),
                        percentage,
                        expires_at: Utc::now() + Duration::days(DISCOUNT_CODE_VALIDITY_DAYS),
                    };
                    diesel::insert_into(discount_codes::table)
                        .values(&grant)
                        .execute(conn)?;
                    rewards_granted += 1;
                }
                "book_credit" => {
                    let Some(amount) = reward_value
                        .get("book_credit_amount")
                        .and_then(JsonValue::as_i64)
                        .and_then(|a| i32::try_from(a).ok())
                    else {
                        warn!(
                            "Book credit rule for game {} has no usable amount; skipping",
                            game_id
                        );
                        continue;
                    };
                    let grant = NewBookCredit {
                        player_id: *player_id,
                        game_id: Some(game_id),
                        amount,
                        expires_at: Utc::now() + Duration::days(BOOK_CREDIT_VALIDITY_DAYS),
                    };
                    diesel::insert_into(book_credits::table)
                        .values(&grant)
                        .execute(conn)?;
                    rewards_granted += 1;
                }
                other => {
                    warn!(
                        "Unknown reward type '{}' stored for game {}; skipping",
                        other, game_id
                    );
                }
            }
        }
    }

    info!(
        "Granted {} rewards across {} submissions for game {}",
        rewards_granted,
        targets.len(),
        game_id
    );

    Ok(GrantOutcome {
        submissions_processed: targets.len() as i64,
        rewards_granted,
    })
}

/// `DISCOUNT` + millisecond timestamp + 5 base-36 characters of entropy.
fn generate_discount_code() -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut entropy = u128::from_le_bytes(*Uuid::new_v4().as_bytes());
    let mut suffix = String::with_capacity(5);
    for _ in 0..5 {
        suffix.push(ALPHABET[(entropy % 36) as usize] as char);
        entropy /= 36;
    }
    format!("DISCOUNT{}{}", Utc::now().timestamp_millis(), suffix)
}
