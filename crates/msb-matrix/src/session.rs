//! Account credentials and the saved login session.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context as _, Result};
use matrix_sdk::{
    authentication::{matrix::MatrixSession, SessionTokens},
    Client, SessionMeta,
};
use serde::{Deserialize, Serialize};

/// Contents of the credentials file (`credentials_path` in the settings).
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub homeserver: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub device_name: String,
    pub session_path: PathBuf,
    pub store_path: PathBuf,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("homeserver", &self.homeserver)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("device_name", &self.device_name)
            .field("session_path", &self.session_path)
            .field("store_path", &self.store_path)
            .finish()
    }
}

impl Credentials {
    /// Read the credentials file. `MATRIX_PASSWORD` overrides the stored
    /// password.
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("reading credentials file at {}", path.display()))?;
        let mut creds: Credentials =
            serde_json::from_str(&txt).context("parsing credentials JSON")?;
        if let Some(password) = env::var("MATRIX_PASSWORD")
            .ok()
            .filter(|p| !p.trim().is_empty())
        {
            creds.password = password;
        }
        Ok(creds)
    }
}

/// Access token and device of a previous login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    pub homeserver: String,
    pub user_id: String,
    pub device_id: String,
    pub access_token: String,
}

pub fn load_session(path: &Path) -> Result<Option<SavedSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading session file at {}", path.display()))?;
    let session = serde_json::from_str(&data).context("parsing session JSON")?;
    Ok(Some(session))
}

pub fn save_session(path: &Path, session: &SavedSession) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(session)?;
    fs::write(path, data)
        .with_context(|| format!("writing session file at {}", path.display()))?;
    Ok(())
}

/// Build a client with a persistent SQLite store and either restore the saved
/// session or log in with the password and save the new session.
pub async fn connect(creds: &Credentials) -> Result<Client> {
    fs::create_dir_all(&creds.store_path).with_context(|| {
        format!("creating store directory at {}", creds.store_path.display())
    })?;

    let saved = load_session(&creds.session_path)?;
    let homeserver = saved
        .as_ref()
        .map_or(creds.homeserver.as_str(), |s| s.homeserver.as_str());

    let client = Client::builder()
        .homeserver_url(homeserver)
        .sqlite_store(&creds.store_path, None)
        .build()
        .await
        .context("building matrix client")?;

    match saved {
        Some(session) => {
            tracing::info!(user = %session.user_id, device = %session.device_id, "restoring session");
            let matrix_session = MatrixSession {
                meta: SessionMeta {
                    user_id: session.user_id.parse().context("invalid stored user_id")?,
                    device_id: session.device_id.into(),
                },
                tokens: SessionTokens {
                    access_token: session.access_token,
                    refresh_token: None,
                },
            };
            client
                .restore_session(matrix_session)
                .await
                .context("restoring session")?;
        }
        None => {
            if creds.password.is_empty() {
                return Err(anyhow!(
                    "no saved session at {} and no password (set it in the credentials file or MATRIX_PASSWORD)",
                    creds.session_path.display()
                ));
            }

            tracing::info!(user = %creds.user, "logging in");
            let response = client
                .matrix_auth()
                .login_username(&creds.user, &creds.password)
                .initial_device_display_name(&creds.device_name)
                .send()
                .await
                .context("login failed")?;

            let session = SavedSession {
                homeserver: creds.homeserver.clone(),
                user_id: response.user_id.to_string(),
                device_id: response.device_id.to_string(),
                access_token: response.access_token,
            };
            save_session(&creds.session_path, &session)?;
            tracing::info!(user = %session.user_id, device = %session.device_id, "logged in, session saved");
        }
    }

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_file_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/session.json");
        assert_eq!(load_session(&path).unwrap(), None);

        let session = SavedSession {
            homeserver: "https://matrix.example.org".to_string(),
            user_id: "@me:example.org".to_string(),
            device_id: "ABCDEF".to_string(),
            access_token: "secret".to_string(),
        };
        save_session(&path, &session).unwrap();
        assert_eq!(load_session(&path).unwrap(), Some(session));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(
            &path,
            r#"{
                "homeserver": "https://matrix.example.org",
                "user": "me",
                "password": "hunter2",
                "device_name": "selfbot",
                "session_path": "./data/session.json",
                "store_path": "./data/store"
            }"#,
        )
        .unwrap();

        let creds = Credentials::load(&path).unwrap();
        assert_eq!(creds.device_name, "selfbot");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
