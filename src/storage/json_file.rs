use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

use crate::models::TokenRecord;

use super::{upsert_by_slug, TokenRepository, TokenScope};

/// JSON file-based token repository.
///
/// Directory structure:
/// ```text
/// data/
///   tokens/
///     {chain_id}/
///       {account}/
///         asset.json
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileTokenRepository {
    base_path: PathBuf,
}

impl JsonFileTokenRepository {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn scope_file(&self, scope: &TokenScope) -> PathBuf {
        self.base_path
            .join("tokens")
            .join(scope.chain_id.to_string())
            .join(scope.account.to_checksum(None))
            .join(format!("{}.json", scope.token_type.as_str()))
    }

    async fn read_records(&self, path: &Path) -> Result<Vec<TokenRecord>> {
        match fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse token records from {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).context("Failed to read token records"),
        }
    }

    /// Write through a sibling temp file so readers never see a partial file.
    async fn write_records(&self, path: &Path, records: &[TokenRecord]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create directory")?;
        }

        let content =
            serde_json::to_string_pretty(records).context("Failed to serialize token records")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .await
            .context("Failed to write token records")?;
        fs::rename(&tmp, path)
            .await
            .context("Failed to replace token records")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenRepository for JsonFileTokenRepository {
    async fn load_tokens(&self, scope: &TokenScope) -> Result<Vec<TokenRecord>> {
        self.read_records(&self.scope_file(scope)).await
    }

    async fn commit_tokens(&self, scope: &TokenScope, records: &[TokenRecord]) -> Result<()> {
        let path = self.scope_file(scope);
        let mut current = self.read_records(&path).await?;
        upsert_by_slug(&mut current, records);
        self.write_records(&path, &current).await
    }
}
