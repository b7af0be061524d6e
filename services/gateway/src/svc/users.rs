//! Client for the users service: accounts, stats, sessions, presences,
//! queued packets, and the spectator graph.

use bancho_models::{Account, Presence, QueuedPacket, Session, Spectator, Stats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{
    ServiceResult, delete_unit, get, get_with_query, patch_json, patch_json_unit, post_json,
    post_json_unit,
};
use crate::context::RequestContext;

pub struct UsersClient<'a> {
    ctx: &'a RequestContext,
}

/// Fields for a presence create; the full row the users service stores.
#[derive(Debug, Serialize)]
pub struct NewPresence<'a> {
    pub session_id: Uuid,
    pub account_id: i32,
    pub username: &'a str,
    pub game_mode: u8,
    pub country_code: u8,
    pub privileges: i32,
    pub latitude: f32,
    pub longitude: f32,
    pub action: u8,
    pub info_text: &'a str,
    pub map_md5: &'a str,
    pub map_id: i32,
    pub mods: u32,
    pub osu_version: &'a str,
    pub utc_offset: i8,
    pub display_city: bool,
    pub pm_private: bool,
}

/// The six fields CHANGE_ACTION is allowed to touch.
#[derive(Debug, Serialize)]
pub struct PresenceUpdate<'a> {
    pub action: u8,
    pub info_text: &'a str,
    pub map_md5: &'a str,
    pub mods: u32,
    pub game_mode: u8,
    pub map_id: i32,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    identifier: &'a str,
    passphrase: &'a str,
    user_agent: &'a str,
}

#[derive(Serialize)]
struct SessionUpdate {
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct EnqueueBody<'a> {
    data: &'a [u8],
}

#[derive(Serialize)]
struct NewSpectator {
    session_id: Uuid,
    account_id: i32,
}

#[derive(Serialize)]
struct SessionsQuery {
    account_id: i32,
}

#[derive(Serialize)]
struct PresencesQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

impl<'a> UsersClient<'a> {
    pub fn new(ctx: &'a RequestContext) -> UsersClient<'a> {
        UsersClient { ctx }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.ctx.services.users)
    }

    // accounts

    pub async fn get_account(&self, account_id: i32) -> ServiceResult<Account> {
        get(self.ctx, self.url(&format!("/v1/accounts/{account_id}"))).await
    }

    pub async fn get_stats(&self, account_id: i32, game_mode: u8) -> ServiceResult<Stats> {
        get(
            self.ctx,
            self.url(&format!("/v1/accounts/{account_id}/stats/{game_mode}")),
        )
        .await
    }

    // sessions

    pub async fn log_in(
        &self,
        identifier: &str,
        passphrase: &str,
        user_agent: &str,
    ) -> ServiceResult<Session> {
        let body = LoginBody {
            identifier,
            passphrase,
            user_agent,
        };
        post_json(self.ctx, self.url("/v1/sessions"), &body).await
    }

    pub async fn log_out(&self, session_id: Uuid) -> ServiceResult<()> {
        delete_unit(self.ctx, self.url(&format!("/v1/sessions/{session_id}"))).await
    }

    /// Refreshes the session's expiry; the users service answers with the
    /// updated session, or non-2xx when it is unknown or already expired.
    pub async fn partial_update_session(
        &self,
        session_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> ServiceResult<Session> {
        let body = SessionUpdate { expires_at };
        patch_json(
            self.ctx,
            self.url(&format!("/v1/sessions/{session_id}")),
            &body,
        )
        .await
    }

    pub async fn get_sessions(&self, account_id: i32) -> ServiceResult<Vec<Session>> {
        get_with_query(
            self.ctx,
            self.url("/v1/sessions"),
            &SessionsQuery { account_id },
        )
        .await
    }

    // presences

    pub async fn create_presence(&self, presence: &NewPresence<'_>) -> ServiceResult<Presence> {
        post_json(self.ctx, self.url("/v1/presences"), presence).await
    }

    pub async fn get_presence(&self, session_id: Uuid) -> ServiceResult<Presence> {
        get(self.ctx, self.url(&format!("/v1/presences/{session_id}"))).await
    }

    /// All live presences, optionally filtered by exact username.
    pub async fn get_all_presences(&self, username: Option<&str>) -> ServiceResult<Vec<Presence>> {
        get_with_query(
            self.ctx,
            self.url("/v1/presences"),
            &PresencesQuery { username },
        )
        .await
    }

    pub async fn partial_update_presence(
        &self,
        session_id: Uuid,
        update: &PresenceUpdate<'_>,
    ) -> ServiceResult<()> {
        patch_json_unit(
            self.ctx,
            self.url(&format!("/v1/presences/{session_id}")),
            update,
        )
        .await
    }

    pub async fn delete_presence(&self, session_id: Uuid) -> ServiceResult<()> {
        delete_unit(self.ctx, self.url(&format!("/v1/presences/{session_id}"))).await
    }

    // queued packets

    /// Drops bytes into the session's mailbox; the owning session picks them
    /// up on its next poll. At-least-once once the service acks.
    pub async fn enqueue_packet(&self, session_id: Uuid, data: &[u8]) -> ServiceResult<()> {
        let body = EnqueueBody { data };
        post_json_unit(
            self.ctx,
            self.url(&format!("/v1/sessions/{session_id}/queued-packets")),
            &body,
        )
        .await
    }

    pub async fn dequeue_all_packets(&self, session_id: Uuid) -> ServiceResult<Vec<QueuedPacket>> {
        get(
            self.ctx,
            self.url(&format!("/v1/sessions/{session_id}/queued-packets")),
        )
        .await
    }

    // spectators

    pub async fn create_spectator(
        &self,
        host_session_id: Uuid,
        session_id: Uuid,
        account_id: i32,
    ) -> ServiceResult<()> {
        let body = NewSpectator {
            session_id,
            account_id,
        };
        post_json_unit(
            self.ctx,
            self.url(&format!("/v1/sessions/{host_session_id}/spectators")),
            &body,
        )
        .await
    }

    pub async fn delete_spectator(
        &self,
        host_session_id: Uuid,
        session_id: Uuid,
    ) -> ServiceResult<()> {
        delete_unit(
            self.ctx,
            self.url(&format!(
                "/v1/sessions/{host_session_id}/spectators/{session_id}"
            )),
        )
        .await
    }

    pub async fn get_spectators(&self, host_session_id: Uuid) -> ServiceResult<Vec<Spectator>> {
        get(
            self.ctx,
            self.url(&format!("/v1/sessions/{host_session_id}/spectators")),
        )
        .await
    }

    /// The edge from this session to the host it is watching, if any.
    pub async fn get_spectating(&self, session_id: Uuid) -> ServiceResult<Spectator> {
        get(
            self.ctx,
            self.url(&format!("/v1/sessions/{session_id}/spectating")),
        )
        .await
    }
}
