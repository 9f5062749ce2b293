use anyhow::{anyhow, Context, Result};
use async_nats::jetstream;
use async_nats::jetstream::object_store::InfoErrorKind;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tracing::debug;

use assina_domain::{ArtifactStore, DomainError, DomainResult};

/// PDF artifact store on a JetStream object store bucket.
pub struct NatsArtifactStore {
    store: jetstream::object_store::ObjectStore,
}

impl NatsArtifactStore {
    pub async fn new(jetstream: &jetstream::Context, bucket_name: &str) -> Result<Self> {
        debug!(bucket = %bucket_name, "initializing artifact store");

        let store = match jetstream.get_object_store(bucket_name).await {
            Ok(store) => {
                debug!(bucket = %bucket_name, "artifact bucket already exists");
                store
            }
            Err(_) => {
                debug!(bucket = %bucket_name, "creating artifact bucket");
                jetstream
                    .create_object_store(jetstream::object_store::Config {
                        bucket: bucket_name.to_string(),
                        ..Default::default()
                    })
                    .await
                    .context("failed to create artifact bucket")?
            }
        };

        Ok(Self { store })
    }
}

#[async_trait]
impl ArtifactStore for NatsArtifactStore {
    async fn upload(&self, key: &str, content: Bytes) -> DomainResult<()> {
        debug!(key = %key, size_bytes = content.len(), "Uploading artifact");

        // put overwrites an existing object under the same key
        let mut reader = &content[..];
        self.store
            .put(key, &mut reader)
            .await
            .map_err(|e| DomainError::Storage(anyhow!("failed to upload artifact: {e}")))?;

        Ok(())
    }

    async fn download(&self, key: &str) -> DomainResult<Bytes> {
        debug!(key = %key, "Downloading artifact");

        let mut object = self
            .store
            .get(key)
            .await
            .map_err(|e| DomainError::Storage(anyhow!("failed to get artifact: {e}")))?;

        let mut buf = Vec::new();
        object
            .read_to_end(&mut buf)
            .await
            .map_err(|e| DomainError::Storage(anyhow!("failed to read artifact content: {e}")))?;

        Ok(Bytes::from(buf))
    }

    async fn exists(&self, key: &str) -> DomainResult<bool> {
        match self.store.info(key).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == InfoErrorKind::NotFound => Ok(false),
            Err(err) => Err(DomainError::Storage(anyhow!(
                "failed to check artifact existence: {err}"
            ))),
        }
    }
}
