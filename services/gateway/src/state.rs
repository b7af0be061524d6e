use std::time::Duration;

/// Base URLs of the backend constellation.
///
/// Injectable so integration tests can point the gateway at a mock backend.
#[derive(Debug, Clone)]
pub struct ServiceUrls {
    pub users: String,
    pub chats: String,
    pub beatmaps: String,
    pub scores: String,
}

impl Default for ServiceUrls {
    fn default() -> ServiceUrls {
        ServiceUrls {
            users: "http://users-service".to_owned(),
            chats: "http://chat-service".to_owned(),
            beatmaps: "http://beatmaps-service".to_owned(),
            scores: "http://scores-service".to_owned(),
        }
    }
}

/// Main menu icon shown by the client, emitted at login when configured.
#[derive(Debug, Clone)]
pub struct MenuIcon {
    pub icon_url: String,
    pub onclick_url: String,
}

#[derive(Clone)]
pub struct AppState {
    /// Shared outbound HTTP client; holds the connection pool.
    pub http: reqwest::Client,
    pub services: ServiceUrls,
    pub welcome_message: String,
    pub menu_icon: Option<MenuIcon>,
}

impl AppState {
    pub fn new(services: ServiceUrls) -> AppState {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build http client");
        AppState {
            http,
            services,
            welcome_message: "Welcome to osu!".to_owned(),
            menu_icon: None,
        }
    }
}
