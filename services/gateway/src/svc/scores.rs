//! Client for the scores service.

use bancho_models::Score;
use serde::Serialize;

use super::{ServiceResult, get_with_query};
use crate::context::RequestContext;

pub struct ScoresClient<'a> {
    ctx: &'a RequestContext,
}

#[derive(Debug, Default, Serialize)]
pub struct ScoresQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beatmap_md5: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mods: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

impl<'a> ScoresClient<'a> {
    pub fn new(ctx: &'a RequestContext) -> ScoresClient<'a> {
        ScoresClient { ctx }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.ctx.services.scores)
    }

    pub async fn get_scores(&self, query: &ScoresQuery<'_>) -> ServiceResult<Vec<Score>> {
        get_with_query(self.ctx, self.url("/v1/scores"), query).await
    }
}
