//! Client for the beatmaps service.

use bancho_models::{Beatmap, Beatmapset};
use serde::Serialize;

use super::{ServiceResult, get, get_with_query};
use crate::context::RequestContext;

pub struct BeatmapsClient<'a> {
    ctx: &'a RequestContext,
}

#[derive(Serialize)]
struct BeatmapsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    md5_hash: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'a str>,
}

impl<'a> BeatmapsClient<'a> {
    pub fn new(ctx: &'a RequestContext) -> BeatmapsClient<'a> {
        BeatmapsClient { ctx }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.ctx.services.beatmaps)
    }

    pub async fn get_beatmaps(
        &self,
        md5_hash: Option<&str>,
        mode: Option<&str>,
    ) -> ServiceResult<Vec<Beatmap>> {
        get_with_query(
            self.ctx,
            self.url("/v1/beatmaps"),
            &BeatmapsQuery { md5_hash, mode },
        )
        .await
    }

    pub async fn get_beatmapset(&self, set_id: i32) -> ServiceResult<Beatmapset> {
        get(self.ctx, self.url(&format!("/v1/beatmapsets/{set_id}"))).await
    }
}
