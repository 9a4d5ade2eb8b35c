//! Client-side voter token persistence.
//!
//! A voter token is created once per client and reused for every like it
//! sends. It is stored in a plain file; deleting the file gives the client a
//! new identity.

use std::path::{Path, PathBuf};

use memento_common::{AppResult, IdGenerator, config::EngagementConfig};

/// File-backed voter token.
#[derive(Debug, Clone)]
pub struct VoterTokenStore {
    path: PathBuf,
}

impl VoterTokenStore {
    /// Store the token at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the token at the configured location.
    #[must_use]
    pub fn from_config(config: &EngagementConfig) -> Self {
        Self::new(config.voter_token_path.clone())
    }

    /// Location of the token file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted token, creating and saving a new one when there is
    /// none yet.
    pub async fn load_or_create(&self) -> AppResult<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                if !token.is_empty() {
                    return Ok(token.to_string());
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let token = IdGenerator::new().generate_token();

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, &token).await?;

        tracing::debug!(path = %self.path.display(), "Created voter token");
        Ok(token)
    }
}
