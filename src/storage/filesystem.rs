//! Artifact store writing documents into a directory
//!
//! Documents are written to a temporary file first and renamed into place,
//! so a failed write never leaves a truncated artifact under its final name.

use crate::core::error::StoreError;
use crate::core::store::{ArtifactStore, artifact_name};
use crate::render::RenderedDocument;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const BACKEND: &str = "filesystem";

/// Stores artifacts as files named `invoice-{id}.{ext}`
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Use `root` as artifact directory. It is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference to a path inside the root.
    ///
    /// Only plain file names are accepted.
    fn resolve(&self, document_ref: &str) -> Option<PathBuf> {
        let plain = !document_ref.is_empty()
            && !document_ref.starts_with('.')
            && !document_ref.contains(['/', '\\']);
        plain.then(|| self.root.join(document_ref))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(
        &self,
        invoice_id: &Uuid,
        document: &RenderedDocument,
    ) -> Result<String, StoreError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            StoreError::backend(
                BACKEND,
                format!("failed to prepare artifact directory: {}", e),
            )
        })?;

        let name = artifact_name(invoice_id, document);
        let path = self.root.join(&name);
        let temp_path = self
            .root
            .join(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));

        if let Err(e) = tokio::fs::write(&temp_path, &document.bytes).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::backend(
                BACKEND,
                format!("failed to write artifact: {}", e),
            ));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::backend(
                BACKEND,
                format!("failed to finalize artifact: {}", e),
            ));
        }

        tracing::debug!(path = %path.display(), size = document.bytes.len(), "artifact written");
        Ok(name)
    }

    async fn get(&self, document_ref: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(path) = self.resolve(document_ref) else {
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::backend(
                BACKEND,
                format!("failed to read artifact: {}", e),
            )),
        }
    }
}
