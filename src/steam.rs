use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

const OPENID_ENDPOINT: &str = "https://steamcommunity.com/openid/login";
const OPENID_NS: &str = "http://specs.openid.net/auth/2.0";
const IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";
const CLAIMED_ID_PREFIX: &str = "https://steamcommunity.com/openid/id/";
const PLAYER_SUMMARIES_ENDPOINT: &str =
    "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v0002/";

/// What a successful Steam login yields; the stable key is `steam_id`.
#[derive(Debug, Clone)]
pub struct SteamProfile {
    pub steam_id: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum SteamError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("steam rejected the login assertion")]
    AssertionRejected,

    #[error("malformed openid response")]
    Malformed,

    #[error("steam profile unavailable")]
    ProfileUnavailable,
}

/// Steam OpenID 2.0 client: builds the login redirect, verifies the
/// returning assertion with a check_authentication round-trip, and enriches
/// the identity via GetPlayerSummaries.
#[derive(Clone)]
pub struct SteamClient {
    http: reqwest::Client,
    api_key: String,
    server_url: String,
}

impl SteamClient {
    pub fn new(api_key: String, server_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            server_url,
        }
    }

    /// URL the browser is redirected to for login.
    pub fn login_url(&self) -> String {
        let return_to = format!("{}/auth/steam/return", self.server_url);
        let url = reqwest::Url::parse_with_params(
            OPENID_ENDPOINT,
            &[
                ("openid.ns", OPENID_NS),
                ("openid.mode", "checkid_setup"),
                ("openid.return_to", return_to.as_str()),
                ("openid.realm", self.server_url.as_str()),
                ("openid.identity", IDENTIFIER_SELECT),
                ("openid.claimed_id", IDENTIFIER_SELECT),
            ],
        )
        .expect("static openid endpoint is a valid url");
        url.to_string()
    }

    /// Verify the assertion Steam sent back to the return URL. The received
    /// parameters are replayed to Steam with mode=check_authentication;
    /// only an `is_valid:true` response is accepted. Returns the steam id.
    pub async fn verify_assertion(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<String, SteamError> {
        let claimed_id = params.get("openid.claimed_id").ok_or(SteamError::Malformed)?;
        let steam_id = extract_steam_id(claimed_id).ok_or(SteamError::Malformed)?;

        let mut form: Vec<(&str, &str)> = params
            .iter()
            .filter(|(key, _)| key.as_str() != "openid.mode")
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        form.push(("openid.mode", "check_authentication"));

        let body = self
            .http
            .post(OPENID_ENDPOINT)
            .form(&form)
            .send()
            .await?
            .text()
            .await?;

        if body.lines().any(|line| line.trim() == "is_valid:true") {
            Ok(steam_id)
        } else {
            Err(SteamError::AssertionRejected)
        }
    }

    /// Fetch display name, avatar and profile URL for a verified steam id.
    pub async fn player_summary(&self, steam_id: &str) -> Result<SteamProfile, SteamError> {
        let response: PlayerSummariesResponse = self
            .http
            .get(PLAYER_SUMMARIES_ENDPOINT)
            .query(&[("key", self.api_key.as_str()), ("steamids", steam_id)])
            .send()
            .await?
            .json()
            .await?;

        let player = response
            .response
            .players
            .into_iter()
            .next()
            .ok_or(SteamError::ProfileUnavailable)?;

        Ok(SteamProfile {
            steam_id: player.steamid,
            display_name: player.personaname,
            avatar: player.avatarfull,
            profile_url: player.profileurl,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PlayerSummariesResponse {
    response: PlayerSummaries,
}

#[derive(Debug, Deserialize)]
struct PlayerSummaries {
    #[serde(default)]
    players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
struct PlayerSummary {
    steamid: String,
    personaname: String,
    avatarfull: Option<String>,
    profileurl: Option<String>,
}

/// The claimed id looks like `https://steamcommunity.com/openid/id/7656...`.
fn extract_steam_id(claimed_id: &str) -> Option<String> {
    let id = claimed_id.strip_prefix(CLAIMED_ID_PREFIX)?;
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_steam_id_from_claimed_id() {
        assert_eq!(
            extract_steam_id("https://steamcommunity.com/openid/id/76561198012345678"),
            Some("76561198012345678".to_string())
        );
        assert_eq!(extract_steam_id("https://steamcommunity.com/openid/id/"), None);
        assert_eq!(
            extract_steam_id("https://steamcommunity.com/openid/id/not-a-number"),
            None
        );
        assert_eq!(extract_steam_id("https://evil.example/openid/id/765"), None);
    }

    #[test]
    fn login_url_targets_the_return_route() {
        let client = SteamClient::new(String::new(), "http://localhost:5000".into());
        let url = client.login_url();
        assert!(url.starts_with(OPENID_ENDPOINT));
        assert!(url.contains("openid.mode=checkid_setup"));
        assert!(url.contains("steam%2Freturn"));
    }
}
