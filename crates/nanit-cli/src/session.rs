//! Session file location and the client objects every command shares.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use tracing::debug;

use nanit_core::{ApiUrl, Authenticator, SessionStore};
use nanit_file::FileStorage;
use nanit_http::{ClientConfig, NanitClient};

use crate::cli::ConnectionArgs;

pub type CliSession = SessionStore<FileStorage>;

/// Get the session file path, creating its directory.
pub fn session_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    let dirs = ProjectDirs::from("", "", "nanit").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("session.json"))
}

/// Translate the global flags into a client configuration.
pub fn client_config(args: &ConnectionArgs) -> Result<ClientConfig> {
    let base_url = ApiUrl::new(&args.api_url).context("Invalid API URL")?;
    let config = if args.proxy {
        ClientConfig::proxy(base_url)
    } else {
        ClientConfig::upstream(base_url)
    };

    Ok(config
        .with_timeout(Duration::from_secs(args.timeout_secs.max(1)))
        .with_accept_invalid_certs(args.insecure))
}

/// The API client and stored session for one CLI invocation.
pub struct Context {
    pub api: Arc<NanitClient>,
    pub session: Arc<CliSession>,
    pub session_path: PathBuf,
}

impl Context {
    pub fn new(args: &ConnectionArgs) -> Result<Self> {
        let api = NanitClient::new(client_config(args)?).context("Failed to build HTTP client")?;
        let session_path = session_path(args.session_file.clone())?;
        let session = SessionStore::new(FileStorage::new(&session_path));
        debug!(api = %api.base_url(), session = %session_path.display(), "Using session file");

        Ok(Self {
            api: Arc::new(api),
            session: Arc::new(session),
            session_path,
        })
    }

    pub fn authenticator(&self) -> Authenticator<NanitClient, FileStorage> {
        Authenticator::new(Arc::clone(&self.api), Arc::clone(&self.session))
    }

    /// Fail early with a login hint when no token is stored.
    pub fn require_session(&self) -> Result<()> {
        let authenticated = self
            .session
            .is_authenticated()
            .context("Failed to read session")?;
        anyhow::ensure!(authenticated, "No active session. Run 'nanit login' first.");
        Ok(())
    }
}
