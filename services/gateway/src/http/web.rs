//! The in-game leaderboard: `GET /v1/web/osu-osz2-getscores.php`.
//!
//! osu! requests this from the song-select screen. The response is the
//! legacy pipe-delimited text format; any failure at all is reported as
//! `-1|false`, which the client renders as "no leaderboard".

use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::collections::HashMap;

use bancho_models::{Score, game_mode_name};

use crate::context::RequestContext;
use crate::svc::scores::ScoresQuery;
use crate::svc::{BeatmapsClient, ScoresClient, UsersClient};

const MAX_LEADERBOARD_SCORES: usize = 50;

/// Query names are the single-letter aliases the client has always used.
#[derive(Debug, Deserialize)]
pub struct GetScoresQuery {
    #[serde(rename = "us")]
    pub username: String,
    #[serde(rename = "ha")]
    pub password_md5: String,
    #[serde(rename = "s")]
    pub editor: i32,
    #[serde(rename = "vv")]
    pub leaderboard_version: i32,
    #[serde(rename = "v")]
    pub leaderboard_type: i32,
    #[serde(rename = "c")]
    pub beatmap_md5: String,
    #[serde(rename = "f")]
    pub filename: String,
    #[serde(rename = "m")]
    pub mode: u8,
    #[serde(rename = "i")]
    pub set_id: i32,
    pub mods: i32,
    #[serde(rename = "h")]
    pub map_package_hash: Option<String>,
    #[serde(rename = "a")]
    pub aqn: Option<i32>,
}

impl GetScoresQuery {
    fn is_valid(&self) -> bool {
        (0..=4).contains(&self.leaderboard_type)
            && self.beatmap_md5.len() == 32
            && self.mode <= 3
            && self.set_id >= -1
    }
}

/// Client-facing ranked status. The client's enum disagrees with the
/// backend's; unranked-ish states all collapse to 0.
fn client_ranked_status(ranked_status: i32) -> i32 {
    match ranked_status {
        1 => 2, // ranked
        2 => 3, // approved
        3 => 4, // qualified
        4 => 5, // loved
        _ => 0, // graveyard / wip / pending
    }
}

fn score_line(score: &Score, username: &str, rank: usize) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|1",
        score.score_id,
        username,
        score.score,
        score.max_combo,
        score.count_50s,
        score.count_100s,
        score.count_300s,
        score.count_misses,
        score.count_katus,
        score.count_gekis,
        i32::from(score.perfect),
        score.mods,
        score.account_id,
        rank,
        score.created_at.timestamp(),
    )
}

fn leaderboard_failure() -> Response {
    "-1|false".into_response()
}

pub async fn get_scores(
    ctx: RequestContext,
    query: Result<Query<GetScoresQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return leaderboard_failure();
    };
    if !query.is_valid() {
        return leaderboard_failure();
    }
    let Some(mode) = game_mode_name(query.mode) else {
        return leaderboard_failure();
    };

    let beatmaps_client = BeatmapsClient::new(&ctx);
    let Ok(beatmaps) = beatmaps_client
        .get_beatmaps(Some(&query.beatmap_md5), None)
        .await
    else {
        return leaderboard_failure();
    };
    let [beatmap] = beatmaps.as_slice() else {
        return leaderboard_failure();
    };
    let Ok(beatmapset) = beatmaps_client.get_beatmapset(beatmap.set_id).await else {
        return leaderboard_failure();
    };

    let Ok(mut scores) = ScoresClient::new(&ctx)
        .get_scores(&ScoresQuery {
            beatmap_md5: Some(&query.beatmap_md5),
            mode: Some(mode),
            passed: Some(true),
            mods: None,
        })
        .await
    else {
        return leaderboard_failure();
    };
    scores.sort_by(|a, b| b.score.cmp(&a.score));
    scores.truncate(MAX_LEADERBOARD_SCORES);

    let users = UsersClient::new(&ctx);
    let mut usernames: HashMap<i32, String> = HashMap::new();
    for score in &scores {
        if usernames.contains_key(&score.account_id) {
            continue;
        }
        let Ok(account) = users.get_account(score.account_id).await else {
            return leaderboard_failure();
        };
        usernames.insert(score.account_id, account.username);
    }

    let mut lines = Vec::with_capacity(5 + scores.len());
    lines.push(format!(
        "{}|false|{}|{}|{}|0|",
        client_ranked_status(beatmap.ranked_status),
        beatmap.beatmap_id,
        beatmap.set_id,
        scores.len(),
    ));
    lines.push("0".to_owned()); // offset
    lines.push(format!(
        "{} - {} [{}]",
        beatmapset.artist, beatmapset.title, beatmap.version
    ));
    lines.push(beatmap.difficulty_rating.to_string());

    // Personal best for the requesting user, empty line when they have none.
    let personal_best = scores
        .iter()
        .position(|score| usernames[&score.account_id] == query.username);
    lines.push(match personal_best {
        Some(index) => score_line(&scores[index], &query.username, index + 1),
        None => String::new(),
    });

    for (index, score) in scores.iter().enumerate() {
        lines.push(score_line(score, &usernames[&score.account_id], index + 1));
    }

    lines.join("\n").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_score() -> Score {
        Score {
            score_id: 901,
            beatmap_md5: "d".repeat(32),
            account_id: 3,
            mode: "osu".to_owned(),
            mods: 64,
            score: 7_654_321,
            accuracy: 99.1,
            max_combo: 1204,
            count_50s: 1,
            count_100s: 12,
            count_300s: 940,
            count_gekis: 200,
            count_katus: 9,
            count_misses: 0,
            grade: "SH".to_owned(),
            passed: true,
            perfect: true,
            status: "best".to_owned(),
            created_at: Utc.with_ymd_and_hms(2022, 9, 18, 12, 25, 4).unwrap(),
        }
    }

    #[test]
    fn ranked_status_collapses_unranked_states() {
        assert_eq!(client_ranked_status(-2), 0);
        assert_eq!(client_ranked_status(-1), 0);
        assert_eq!(client_ranked_status(0), 0);
        assert_eq!(client_ranked_status(1), 2);
        assert_eq!(client_ranked_status(2), 3);
        assert_eq!(client_ranked_status(3), 4);
        assert_eq!(client_ranked_status(4), 5);
    }

    #[test]
    fn score_line_layout() {
        let line = score_line(&sample_score(), "whitecat", 1);
        assert_eq!(
            line,
            format!(
                "901|whitecat|7654321|1204|1|12|940|0|9|200|1|64|3|1|{}|1",
                sample_score().created_at.timestamp()
            )
        );
    }
}
