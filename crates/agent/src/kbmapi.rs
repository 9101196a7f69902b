use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::engine::{Operation, RecoveryCredentials, SigningEngine};

/// Registration document for a PIV token, sent on enroll and replace:
/// the token's GUID, the compute node it lives in, and its per-slot public
/// keys (base64 SSH wire blobs keyed by slot id).
#[derive(Debug, Clone, Serialize)]
pub struct PivtokenRegistration {
    pub guid: String,
    pub cn_uuid: String,
    pub pubkeys: BTreeMap<String, String>,
}

/// What KBMAPI grants for an enrolled or replaced token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenGrant {
    pub pin: Option<String>,
    #[serde(default)]
    pub recovery_tokens: Vec<RecoveryToken>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecoveryToken {
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    pin: String,
}

/// Client for the Key Backup and Management API.
///
/// Each method obtains signed headers from the engine before opening any
/// connection, so a signing failure never reaches the network. Exactly one
/// request is issued per call; transport failures and non-2xx statuses
/// surface as a single error with no retry.
pub struct KbmapiClient {
    base_url: String,
    http: reqwest::Client,
}

impl KbmapiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn pivtokens_url(&self) -> String {
        format!("{}/pivtokens", self.base_url)
    }

    fn pin_url(&self, guid: &str) -> String {
        format!("{}/pivtokens/{guid}/pin", self.base_url)
    }

    fn replace_url(&self, guid: &str) -> String {
        format!("{}/pivtokens/{guid}/replace", self.base_url)
    }

    fn recover_url(&self, guid: &str) -> String {
        format!("{}/pivtokens/{guid}/recover", self.base_url)
    }

    /// Enroll a PIV token. The grant carries the assigned PIN and the
    /// initial recovery token.
    pub async fn register_pivtoken(
        &self,
        engine: &SigningEngine,
        registration: &PivtokenRegistration,
    ) -> Result<TokenGrant> {
        let headers = engine.request_headers(Operation::RegisterPivtoken, None)?;
        let url = self.pivtokens_url();
        tracing::info!(%url, guid = %registration.guid, "registering pivtoken");
        let response = self
            .http
            .post(&url)
            .header("Date", &headers.date)
            .header("Authorization", &headers.authorization)
            .json(registration)
            .send()
            .await
            .context("sending register-pivtoken request")?;
        Self::decode(response).await
    }

    /// Fetch the PIN of an enrolled token.
    pub async fn get_pin(&self, engine: &SigningEngine, guid: &str) -> Result<String> {
        let headers = engine.request_headers(Operation::GetPin, None)?;
        let url = self.pin_url(guid);
        tracing::info!(%url, "fetching pin");
        let response = self
            .http
            .get(&url)
            .header("Date", &headers.date)
            .header("Authorization", &headers.authorization)
            .send()
            .await
            .context("sending get-pin request")?;
        let body: PinResponse = Self::decode(response).await?;
        Ok(body.pin)
    }

    /// Replace an enrolled token with a new one, authenticated by the old
    /// token's recovery token.
    pub async fn replace_pivtoken(
        &self,
        engine: &SigningEngine,
        credentials: &RecoveryCredentials,
        replacement: &PivtokenRegistration,
    ) -> Result<TokenGrant> {
        let headers = engine.request_headers(Operation::ReplacePivtoken, Some(credentials))?;
        let url = self.replace_url(&credentials.guid);
        tracing::info!(%url, new_guid = %replacement.guid, "replacing pivtoken");
        let response = self
            .http
            .post(&url)
            .header("Date", &headers.date)
            .header("Authorization", &headers.authorization)
            .json(replacement)
            .send()
            .await
            .context("sending replace-pivtoken request")?;
        Self::decode(response).await
    }

    /// Ask KBMAPI to mint a fresh recovery token. Returns the newest token.
    pub async fn new_rtoken(&self, engine: &SigningEngine, guid: &str) -> Result<String> {
        let headers = engine.request_headers(Operation::NewRtoken, None)?;
        let url = self.recover_url(guid);
        tracing::info!(%url, "requesting new recovery token");
        let response = self
            .http
            .post(&url)
            .header("Date", &headers.date)
            .header("Authorization", &headers.authorization)
            .send()
            .await
            .context("sending new-rtoken request")?;
        let grant: TokenGrant = Self::decode(response).await?;
        grant
            .recovery_tokens
            .last()
            .map(|t| t.token.clone())
            .context("KBMAPI response contained no recovery tokens")
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("KBMAPI returned {status}: {}", body.trim());
        }
        response
            .json()
            .await
            .context("decoding KBMAPI response body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_interpolate_the_guid() {
        let client = KbmapiClient::new("http://kbmapi.example.com");
        let guid = "75CA077A14C5E45037D7A0740D5602A5";
        assert_eq!(
            client.pin_url(guid),
            "http://kbmapi.example.com/pivtokens/75CA077A14C5E45037D7A0740D5602A5/pin"
        );
        assert_eq!(
            client.replace_url(guid),
            "http://kbmapi.example.com/pivtokens/75CA077A14C5E45037D7A0740D5602A5/replace"
        );
        assert_eq!(
            client.recover_url(guid),
            "http://kbmapi.example.com/pivtokens/75CA077A14C5E45037D7A0740D5602A5/recover"
        );
        assert_eq!(
            client.pivtokens_url(),
            "http://kbmapi.example.com/pivtokens"
        );
    }

    #[test]
    fn trailing_slash_in_base_url_is_trimmed() {
        let client = KbmapiClient::new("http://kbmapi.example.com/");
        assert_eq!(
            client.pivtokens_url(),
            "http://kbmapi.example.com/pivtokens"
        );
    }

    #[test]
    fn registration_serializes_slot_keyed_pubkeys() {
        let mut pubkeys = BTreeMap::new();
        pubkeys.insert("9e".to_string(), "QUFBQQ==".to_string());
        let registration = PivtokenRegistration {
            guid: "75CA077A14C5E45037D7A0740D5602A5".into(),
            cn_uuid: "564d5535-8965-4572-a766-bc1decd6d1a8".into(),
            pubkeys,
        };
        let json = serde_json::to_value(&registration).unwrap();
        assert_eq!(json["pubkeys"]["9e"], "QUFBQQ==");
        assert_eq!(json["guid"], "75CA077A14C5E45037D7A0740D5602A5");
    }
}
