use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// One catalog page: provider name plus the request fingerprint
    CatalogSearch {
        provider: &'static str,
        fingerprint: String,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::CatalogSearch {
                provider,
                fingerprint,
            } => write!(f, "catalog:{}:{}", provider, fingerprint),
        }
    }
}

/// Pending write handed to the background writer
struct CacheWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed cache for catalog responses
///
/// Reads go straight to Redis. Writes are queued and applied by a background
/// task so a slow Redis never delays a response.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
    write_tx: mpsc::UnboundedSender<CacheWrite>,
}

/// Handle used to flush queued writes on shutdown
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    writer: tokio::task::JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer, then waits until the queued writes are flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.writer.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
        tracing::info!("Cache writer stopped");
    }
}

impl Cache {
    /// Connects to Redis and spawns the background writer
    pub async fn connect(redis_url: &str) -> AppResult<(Self, CacheWriterHandle)> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer = tokio::spawn(Self::run_writer(
            connection.clone(),
            write_rx,
            shutdown_rx,
        ));

        tracing::info!("Connected to Redis catalog cache");

        Ok((
            Self {
                connection,
                write_tx,
            },
            CacheWriterHandle {
                shutdown_tx,
                writer,
            },
        ))
    }

    async fn run_writer(
        mut connection: ConnectionManager,
        mut write_rx: mpsc::UnboundedReceiver<CacheWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    Self::apply(&mut connection, write).await;
                }
                _ = shutdown_rx.recv() => {
                    let mut flushed = 0usize;
                    // Senders live in every Cache clone, so drain without waiting
                    while let Ok(write) = write_rx.try_recv() {
                        Self::apply(&mut connection, write).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Flushed pending cache writes");
                    break;
                }
            }
        }
    }

    async fn apply(connection: &mut ConnectionManager, write: CacheWrite) {
        let result: redis::RedisResult<()> =
            connection.set_ex(&write.key, write.value, write.ttl).await;
        if let Err(e) = result {
            tracing::warn!(key = %write.key, error = %e, "Failed to write catalog cache entry");
        }
    }

    /// Reads and deserializes a cached value; `Ok(None)` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut connection = self.connection.clone();
        let cached: Option<String> = connection.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    /// Queues a value for writing; never blocks and never fails the caller
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let write = CacheWrite {
            key: key.to_string(),
            value,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer is gone, dropping write");
        }
    }
}
