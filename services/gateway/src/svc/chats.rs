//! Client for the chats service: chats and their members.

use bancho_models::{Chat, Member};
use serde::Serialize;
use uuid::Uuid;

use super::{ServiceResult, delete_unit, get, get_with_query, post_json_unit};
use crate::context::RequestContext;

pub struct ChatsClient<'a> {
    ctx: &'a RequestContext,
}

#[derive(Serialize)]
struct ChatsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct NewMember<'a> {
    session_id: Uuid,
    account_id: i32,
    username: &'a str,
    privileges: i32,
}

impl<'a> ChatsClient<'a> {
    pub fn new(ctx: &'a RequestContext) -> ChatsClient<'a> {
        ChatsClient { ctx }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.ctx.services.chats)
    }

    /// All chats, optionally filtered by exact name.
    pub async fn get_chats(&self, name: Option<&str>) -> ServiceResult<Vec<Chat>> {
        get_with_query(self.ctx, self.url("/v1/chats"), &ChatsQuery { name }).await
    }

    pub async fn get_chat(&self, chat_id: i64) -> ServiceResult<Chat> {
        get(self.ctx, self.url(&format!("/v1/chats/{chat_id}"))).await
    }

    pub async fn get_members(&self, chat_id: i64) -> ServiceResult<Vec<Member>> {
        get(self.ctx, self.url(&format!("/v1/chats/{chat_id}/members"))).await
    }

    pub async fn join_chat(
        &self,
        chat_id: i64,
        session_id: Uuid,
        account_id: i32,
        username: &str,
        privileges: i32,
    ) -> ServiceResult<()> {
        let body = NewMember {
            session_id,
            account_id,
            username,
            privileges,
        };
        post_json_unit(
            self.ctx,
            self.url(&format!("/v1/chats/{chat_id}/members")),
            &body,
        )
        .await
    }

    pub async fn leave_chat(&self, chat_id: i64, session_id: Uuid) -> ServiceResult<()> {
        delete_unit(
            self.ctx,
            self.url(&format!("/v1/chats/{chat_id}/members/{session_id}")),
        )
        .await
    }
}
