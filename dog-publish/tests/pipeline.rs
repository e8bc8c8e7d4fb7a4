use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dog_blob::store::{GetResult, ObjectHead, PutResult};
use dog_blob::{BlobAdapter, BlobConfig, BlobError, BlobResult, BlobStore, MemoryBlobStore};
use dog_content::is_placeholder;
use dog_publish::prelude::*;
use dog_publish::{ErrorReport, FailureKind, PublishState, PublishStatus, UploadCause};
use serde_json::{json, Value};

const TOKEN: &str = "editor-token";

struct Harness {
    service: PublishService,
    posts: MemoryPostStore,
    media: MemoryBlobStore,
}

fn harness() -> Harness {
    let media = MemoryBlobStore::new();
    harness_with(media.clone(), media)
}

fn harness_with<S: BlobStore + 'static>(store: S, media: MemoryBlobStore) -> Harness {
    let posts = MemoryPostStore::new();
    let blobs = BlobAdapter::new(
        store,
        BlobConfig::new().with_public_base_url("https://media.example.com"),
    );
    let coordinator = PublishCoordinator::new(Arc::new(blobs), Arc::new(posts.clone()), PublishConfig::default());
    let gate = StaticTokenGate::new().with_token(TOKEN, "ada");
    Harness {
        service: PublishService::new(Arc::new(gate), Arc::new(coordinator)),
        posts,
        media,
    }
}

fn auth() -> AuthRequest {
    AuthRequest::bearer(TOKEN)
}

fn image_doc(src: &str) -> Value {
    json!({ "type": "doc", "content": [{ "type": "image", "attrs": { "src": src } }] })
}

#[tokio::test]
async fn hello_world_with_staged_image() {
    let h = harness();
    let draft = DraftHandle::new(DraftSession::new());
    draft
        .session()
        .await
        .stage_with_key("tmp:abc123", Bytes::from_static(b"\x89PNG\r\n"), "image/png")
        .unwrap();

    let result = h
        .service
        .submit_draft(&auth(), &draft, DraftInput::new("Hello World", image_doc("tmp:abc123")))
        .await;

    assert_eq!(result.status, PublishStatus::Published);
    let doc = result.document.unwrap();
    assert_eq!(doc.slug, "hello-world");

    let src = doc.localized("en").unwrap().content.images()[0].src().unwrap().to_string();
    assert!(src.starts_with(&format!("https://media.example.com/posts/{}/", doc.id)), "{src}");
    assert!(src.ends_with(".png"));
    assert!(!is_placeholder(&src));

    assert!(draft.session().await.registry().is_empty());
    assert_eq!(h.media.len().await, 1);
    assert_eq!(h.posts.find_by_slug("hello-world").await.unwrap(), Some(doc));
}

#[tokio::test]
async fn unauthorized_submit_has_no_side_effects() {
    let h = harness();
    let draft = DraftHandle::new(DraftSession::new());
    let key = draft
        .session()
        .await
        .stage(Bytes::from_static(b"img"), "image/png")
        .unwrap();

    let result = h
        .service
        .submit_draft(
            &AuthRequest::bearer("stolen"),
            &draft,
            DraftInput::new("", json!("not even a tree")),
        )
        .await;

    assert_eq!(result.status, PublishStatus::Rejected);
    assert_eq!(result.error.as_ref().map(|e| e.reason), Some("unauthorized"));
    assert_eq!(result.state, PublishState::Draft);
    assert!(h.media.is_empty().await);
    assert!(h.posts.is_empty().await);
    assert!(draft.session().await.registry().contains(key.as_str()));
}

#[tokio::test]
async fn validation_errors_name_the_offending_node() {
    let h = harness();
    let draft = DraftHandle::new(DraftSession::new());
    let content = json!({ "type": "doc", "content": [
        { "type": "paragraph", "content": [{ "type": "text", "text": "ok" }] },
        { "type": "table" }
    ]});

    let result = h
        .service
        .submit_draft(&auth(), &draft, DraftInput::new("Title", content))
        .await;

    assert_eq!(result.status, PublishStatus::Failed);
    assert_eq!(result.state, PublishState::Failed(FailureKind::Validation));
    let report: ErrorReport = result.error.unwrap();
    assert_eq!(report.reason, "unknown-node-type");
    assert_eq!(report.path.as_deref(), Some("$.content.content[1]"));
}

struct BrokenStore;

#[async_trait]
impl BlobStore for BrokenStore {
    async fn put(&self, _key: &str, _content_type: &str, _body: Bytes) -> BlobResult<PutResult> {
        Err(BlobError::unavailable("bucket unreachable"))
    }

    async fn get(&self, key: &str) -> BlobResult<GetResult> {
        Err(BlobError::not_found(key))
    }

    async fn head(&self, _key: &str) -> BlobResult<Option<ObjectHead>> {
        Ok(None)
    }

    async fn delete(&self, _key: &str) -> BlobResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn failed_upload_persists_nothing_and_keeps_staged_media() {
    let h = harness_with(BrokenStore, MemoryBlobStore::new());
    let draft = DraftHandle::new(DraftSession::new());
    let key = draft
        .session()
        .await
        .stage(Bytes::from_static(b"img"), "image/png")
        .unwrap();

    let result = h
        .service
        .submit_draft(&auth(), &draft, DraftInput::new("Hello World", image_doc(key.as_str())))
        .await;

    assert_eq!(result.state, PublishState::Failed(FailureKind::Upload));
    let cause = result.clone().into_result().unwrap_err();
    assert!(matches!(
        cause,
        PublishError::Upload(ref err) if err.key == key.as_str() && matches!(err.cause, UploadCause::Storage(_))
    ));
    assert!(h.posts.find_by_slug("hello-world").await.unwrap().is_none());
    assert_eq!(draft.session().await.registry().len(), 1);
}

struct SlowStore {
    inner: MemoryBlobStore,
    delay: Duration,
}

#[async_trait]
impl BlobStore for SlowStore {
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> BlobResult<PutResult> {
        tokio::time::sleep(self.delay).await;
        self.inner.put(key, content_type, body).await
    }

    async fn get(&self, key: &str) -> BlobResult<GetResult> {
        self.inner.get(key).await
    }

    async fn head(&self, key: &str) -> BlobResult<Option<ObjectHead>> {
        self.inner.head(key).await
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.inner.delete(key).await
    }
}

#[tokio::test]
async fn resubmit_after_an_interrupted_publish() {
    let media = MemoryBlobStore::new();
    let slow = SlowStore {
        inner: media.clone(),
        delay: Duration::from_millis(200),
    };
    let h = harness_with(slow, media);
    let draft = DraftHandle::new(DraftSession::new());
    let key = draft
        .session()
        .await
        .stage(Bytes::from_static(b"img"), "image/png")
        .unwrap();
    let input = DraftInput::new("Hello World", image_doc(key.as_str()));

    let interrupted = tokio::time::timeout(
        Duration::from_millis(20),
        h.service.submit_draft(&auth(), &draft, input.clone()),
    )
    .await;
    assert!(interrupted.is_err());
    assert!(!draft.is_pending());
    {
        let session = draft.session().await;
        assert_eq!(session.state(), PublishState::ResolvingMedia);
        assert_eq!(session.registry().len(), 1);
    }
    assert!(h.posts.is_empty().await);

    let result = h.service.submit_draft(&auth(), &draft, input).await;
    assert_eq!(result.status, PublishStatus::Published);
    assert_eq!(result.state, PublishState::Published);
    assert!(draft.session().await.registry().is_empty());
    assert_eq!(h.posts.len().await, 1);
}

#[tokio::test]
async fn unsafe_post_ids_fail_validation_before_upload() {
    let h = harness();
    let draft = DraftHandle::new(DraftSession::new());
    let key = draft
        .session()
        .await
        .stage(Bytes::from_static(b"img"), "image/png")
        .unwrap();

    for id in ["my post", "../../etc"] {
        let input = DraftInput::new("Hello World", image_doc(key.as_str())).with_id(id);
        let result = h.service.submit_draft(&auth(), &draft, input).await;

        assert_eq!(result.state, PublishState::Failed(FailureKind::Validation), "{id}");
        let report = result.error.unwrap();
        assert_eq!(report.reason, "invalid-field");
        assert_eq!(report.path.as_deref(), Some("$.id"));
    }
    assert!(h.media.is_empty().await);
    assert!(h.posts.is_empty().await);
}

#[tokio::test]
async fn resubmitting_a_session_updates_the_same_post() {
    let h = harness();
    let draft = DraftHandle::new(DraftSession::new());
    let body = json!({ "type": "doc", "content": [] });

    let first = h
        .service
        .submit_draft(&auth(), &draft, DraftInput::new("Hello World", body.clone()))
        .await
        .into_result()
        .unwrap();
    let second = h
        .service
        .submit_draft(&auth(), &draft, DraftInput::new("Hello World, revised", body))
        .await
        .into_result()
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.slug, "hello-world");
    assert_eq!(second.title(), "Hello World, revised");
    assert_eq!(h.posts.len().await, 1);
}

#[tokio::test]
async fn separate_drafts_with_the_same_title_get_distinct_slugs() {
    let h = harness();
    let body = json!({ "type": "doc", "content": [] });
    let mut slugs = Vec::new();
    for title in ["Hello World", "hello   world!"] {
        let draft = DraftHandle::new(DraftSession::new());
        let doc = h
            .service
            .submit_draft(&auth(), &draft, DraftInput::new(title, body.clone()))
            .await
            .into_result()
            .unwrap();
        slugs.push(doc.slug);
    }
    assert_eq!(slugs, vec!["hello-world", "hello-world-2"]);
}

#[tokio::test]
async fn translations_share_one_upload() {
    let h = harness();
    let draft = DraftHandle::new(DraftSession::new());
    let key = draft
        .session()
        .await
        .stage(Bytes::from_static(b"shared"), "image/webp")
        .unwrap();

    let input = DraftInput::new("Hello", image_doc(key.as_str()))
        .with_translation("fr", LocaleDraft::new("Bonjour", image_doc(key.as_str())))
        .with_cover_image(key.as_str());
    let doc = h
        .service
        .submit_draft(&auth(), &draft, input)
        .await
        .into_result()
        .unwrap();

    assert_eq!(h.media.write_count(), 1);
    let urls = doc.media_urls();
    assert_eq!(urls.len(), 3);
    assert!(urls.iter().all(|url| *url == urls[0]));
    assert!(!doc.has_placeholders());
}

#[tokio::test]
async fn overlapping_submit_is_refused_not_queued() {
    let h = harness();
    let draft = DraftHandle::new(DraftSession::new());
    let _running = draft.begin_publish().unwrap();

    let result = h
        .service
        .submit_draft(&auth(), &draft, DraftInput::new("Hi", json!({ "type": "doc" })))
        .await;

    assert_eq!(result.status, PublishStatus::Rejected);
    assert_eq!(result.error.unwrap().reason, "publish-in-flight");
    assert!(h.posts.is_empty().await);
}

#[tokio::test]
async fn cancel_releases_media_and_requires_the_gate() {
    let h = harness();
    let draft = DraftHandle::new(DraftSession::new());
    h.service
        .stage_media(&auth(), &draft, Bytes::from_static(b"a"), "image/png")
        .await
        .unwrap();
    h.service
        .stage_media(&auth(), &draft, Bytes::from_static(b"b"), "image/png")
        .await
        .unwrap();

    assert_eq!(
        h.service.cancel_draft(&AuthRequest::new(), &draft).await,
        Err(PublishError::Unauthorized)
    );
    assert_eq!(h.service.cancel_draft(&auth(), &draft).await, Ok(2));
    assert!(draft.session().await.registry().is_empty());
    assert!(h.media.is_empty().await);
}

#[tokio::test]
async fn serialized_result_matches_the_editor_contract() {
    let h = harness();
    let draft = DraftHandle::new(DraftSession::new());
    let result = h
        .service
        .submit_draft(&auth(), &draft, DraftInput::new("", json!({ "type": "doc" })))
        .await;

    let body = serde_json::to_value(&result).unwrap();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["state"], json!({ "failed": "validation" }));
    assert_eq!(body["error"]["reason"], "invalid-field");
    assert_eq!(body["error"]["path"], "$.title");
    assert!(body.get("document").is_none());
    assert!(body.get("cause").is_none());
}
