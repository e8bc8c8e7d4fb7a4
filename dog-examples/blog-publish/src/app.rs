use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dog_blob::{BlobAdapter, MemoryBlobStore};
use dog_publish::{
    DraftHandle, DraftSession, JwtGate, MemoryPostStore, PostStore, PublishCoordinator, PublishService,
    SessionGate, StaticTokenGate,
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::ApiError;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PublishService>,
    pub posts: Arc<dyn PostStore>,
    pub blobs: Arc<BlobAdapter>,
    drafts: Arc<RwLock<HashMap<String, DraftSlot>>>,
    draft_idle: Duration,
}

struct DraftSlot {
    handle: Arc<DraftHandle>,
    last_activity: Instant,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let blobs = Arc::new(BlobAdapter::new(MemoryBlobStore::new(), config.blob_config()));
        let posts: Arc<dyn PostStore> = Arc::new(MemoryPostStore::new());
        let coordinator = PublishCoordinator::new(Arc::clone(&blobs), Arc::clone(&posts), config.publish_config());

        Self {
            service: Arc::new(PublishService::new(gate(config), Arc::new(coordinator))),
            posts,
            blobs,
            drafts: Arc::new(RwLock::new(HashMap::new())),
            draft_idle: config.draft_idle_ttl(),
        }
    }

    /// Open a session. Drafts idle past the configured TTL are reaped first.
    pub async fn open_draft(&self) -> String {
        self.sweep_idle(self.draft_idle).await;

        let handle = DraftHandle::new(DraftSession::new());
        let id = handle.id().to_string();
        let slot = DraftSlot {
            handle: Arc::new(handle),
            last_activity: Instant::now(),
        };
        self.drafts.write().await.insert(id.clone(), slot);
        id
    }

    pub async fn draft(&self, id: &str) -> Result<Arc<DraftHandle>, ApiError> {
        let mut drafts = self.drafts.write().await;
        let slot = drafts
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found(format!("No draft found for id '{id}'")))?;
        slot.last_activity = Instant::now();
        Ok(Arc::clone(&slot.handle))
    }

    /// End a session. Its staged media goes with the last handle.
    pub async fn close_draft(&self, id: &str) -> Option<Arc<DraftHandle>> {
        self.drafts.write().await.remove(id).map(|slot| slot.handle)
    }

    /// Drop drafts untouched for `ttl`. A draft with a publish running is kept.
    pub async fn sweep_idle(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut drafts = self.drafts.write().await;
        let before = drafts.len();
        drafts.retain(|_, slot| slot.handle.is_pending() || now.duration_since(slot.last_activity) < ttl);
        let reaped = before - drafts.len();
        if reaped > 0 {
            debug!(reaped, "idle drafts released");
        }
        reaped
    }

    pub async fn open_drafts(&self) -> usize {
        self.drafts.read().await.len()
    }
}

fn gate(config: &AppConfig) -> Arc<dyn SessionGate> {
    if let Some(secret) = &config.jwt_secret {
        let mut jwt = JwtGate::new(secret).with_role(config.jwt_role.as_str());
        if let Some(issuer) = &config.jwt_issuer {
            jwt = jwt.with_issuer(issuer);
        }
        return Arc::new(jwt);
    }
    let tokens = StaticTokenGate::from_pairs(&config.auth_tokens);
    if tokens.is_empty() {
        warn!("no BLOG_AUTH_TOKENS or BLOG_JWT_SECRET configured; editing is disabled");
    }
    Arc::new(tokens)
}
