use std::sync::Arc;
use std::time::Duration;

use facekeep_vecstore::EmbeddingIndex;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::descriptions::DescriptionStore;
use crate::identity::Person;
use crate::model::{Extraction, FaceEmbedder};
use crate::policy::ConfidencePolicy;
use crate::resolver::{Candidate, Resolution, Resolver, DEFAULT_TOP_K};
use crate::FaceIdError;

/// Configuration for [`IdentityService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Neighbors consulted per recognition (default: 1).
    pub top_k: usize,
    /// Upper bound for a single index operation (default: 5s).
    pub timeout: Duration,
    pub policy: ConfidencePolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            timeout: Duration::from_secs(5),
            policy: ConfidencePolicy::default(),
        }
    }
}

/// Recognizes and registers faces against a persistent embedding index
/// and a description store.
///
/// Index work runs on the blocking pool under the configured timeout.
/// Registrations are serialized, so two concurrent requests for the same
/// new face cannot both mint an identity.
pub struct IdentityService {
    index: Arc<EmbeddingIndex>,
    resolver: Resolver<EmbeddingIndex>,
    descriptions: Arc<dyn DescriptionStore>,
    timeout: Duration,
    register_lock: Mutex<()>,
}

impl IdentityService {
    pub fn new(
        index: Arc<EmbeddingIndex>,
        descriptions: Arc<dyn DescriptionStore>,
        cfg: ServiceConfig,
    ) -> Result<Self, FaceIdError> {
        let resolver = Resolver::new(Arc::clone(&index), cfg.policy)?.with_top_k(cfg.top_k);
        Ok(Self {
            index,
            resolver,
            descriptions,
            timeout: cfg.timeout,
            register_lock: Mutex::new(()),
        })
    }

    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        &self.index
    }

    pub fn descriptions(&self) -> &Arc<dyn DescriptionStore> {
        &self.descriptions
    }

    pub fn policy(&self) -> &ConfidencePolicy {
        self.resolver.policy()
    }

    /// Number of stored identities' embeddings.
    pub fn total_count(&self) -> usize {
        self.index.total_count()
    }

    /// Scores the `k` nearest identities, keeping only accepted ones.
    pub async fn search(&self, embedding: Vec<f32>, k: usize) -> Result<Vec<Candidate>, FaceIdError> {
        let resolver = self.resolver.clone();
        self.run_blocking("search", move || resolver.resolve(&embedding, k))
            .await
    }

    /// Looks up the identity of an embedding.
    pub async fn recognize(&self, embedding: Vec<f32>) -> Result<Person, FaceIdError> {
        match self.identify(embedding).await? {
            Resolution::Recognized(c) => {
                let description = self.description(c.id).await?;
                info!(id = c.id, confidence = c.confidence, "face recognized");
                Ok(Person::recognized(c.id, description, c.confidence))
            }
            Resolution::Unknown => {
                info!("face not recognized");
                Ok(Person::unknown(self.policy().low_confidence))
            }
        }
    }

    /// Registers an embedding with a description unless it is already
    /// known, in which case the existing identity is returned unchanged.
    pub async fn register(
        &self,
        embedding: Vec<f32>,
        description: String,
    ) -> Result<Person, FaceIdError> {
        let _guard = self.register_lock.lock().await;

        if let Resolution::Recognized(c) = self.identify(embedding.clone()).await? {
            let stored = self.description(c.id).await?;
            info!(id = c.id, confidence = c.confidence, "face already registered");
            return Ok(Person::recognized(c.id, stored, c.confidence));
        }

        let index = Arc::clone(&self.index);
        let id = self
            .run_blocking("insert", move || index.append(&embedding).map_err(FaceIdError::from))
            .await?;

        let store = Arc::clone(&self.descriptions);
        let text = description.clone();
        let stored = self
            .run_blocking("add description", move || store.add(id, &text))
            .await;
        if let Err(e) = stored {
            warn!(id, error = %e, "embedding stored without description");
            return Err(e);
        }

        info!(id, total = self.index.total_count(), "face registered");
        Ok(Person::registered(id, description, self.policy().low_confidence))
    }

    /// Runs the embedder on an image and recognizes the face.
    pub async fn recognize_image(
        &self,
        embedder: &dyn FaceEmbedder,
        image: &[u8],
    ) -> Result<Person, FaceIdError> {
        let embedding = extract(embedder, image)?;
        self.recognize(embedding).await
    }

    /// Runs the embedder on an image and registers the face.
    pub async fn register_image(
        &self,
        embedder: &dyn FaceEmbedder,
        image: &[u8],
        description: String,
    ) -> Result<Person, FaceIdError> {
        let embedding = extract(embedder, image)?;
        self.register(embedding, description).await
    }

    async fn identify(&self, embedding: Vec<f32>) -> Result<Resolution, FaceIdError> {
        let resolver = self.resolver.clone();
        self.run_blocking("search", move || resolver.identify(&embedding))
            .await
    }

    async fn description(&self, id: u64) -> Result<Option<String>, FaceIdError> {
        let store = Arc::clone(&self.descriptions);
        self.run_blocking("get description", move || store.get(id))
            .await
    }

    async fn run_blocking<T, F>(&self, op: &'static str, f: F) -> Result<T, FaceIdError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, FaceIdError> + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(f);
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(res)) => res,
            Ok(Err(e)) => Err(FaceIdError::Task(e.to_string())),
            Err(_) => {
                warn!(op, timeout = ?self.timeout, "index operation timed out");
                Err(FaceIdError::Timeout {
                    op,
                    after: self.timeout,
                })
            }
        }
    }
}

fn extract(embedder: &dyn FaceEmbedder, image: &[u8]) -> Result<Vec<f32>, FaceIdError> {
    match embedder.embed(image)? {
        Extraction::NoFace => {
            warn!("no face detected in the image");
            Err(FaceIdError::NoFace)
        }
        Extraction::NotAligned => {
            warn!("failed to align the face");
            Err(FaceIdError::AlignmentFailed)
        }
        Extraction::Embedded(v) if v.len() != embedder.dimension() => {
            Err(FaceIdError::Embedding(format!(
                "embedder returned {} values, want {}",
                v.len(),
                embedder.dimension()
            )))
        }
        Extraction::Embedded(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptions::MemoryDescriptions;
    use crate::identity::{PersonStatus, NEW_USER_NAME, NO_DESCRIPTION, UNKNOWN_PROMPT};
    use facekeep_vecstore::DEFAULT_DIM;
    use tempfile::{tempdir, TempDir};

    fn axis(axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; DEFAULT_DIM];
        v[axis] = 1.0;
        v
    }

    fn service(dir: &TempDir) -> IdentityService {
        let index = Arc::new(EmbeddingIndex::open(dir.path().join("faces.index"), DEFAULT_DIM));
        IdentityService::new(
            index,
            Arc::new(MemoryDescriptions::new()),
            ServiceConfig::default(),
        )
        .unwrap()
    }

    /// Embedder that maps the first image byte to an outcome.
    struct FakeEmbedder;

    impl FaceEmbedder for FakeEmbedder {
        fn embed(&self, image: &[u8]) -> Result<Extraction, FaceIdError> {
            match image.first().copied() {
                None => Err(FaceIdError::Embedding("empty image".into())),
                Some(0) => Ok(Extraction::NoFace),
                Some(1) => Ok(Extraction::NotAligned),
                Some(n) => Ok(Extraction::Embedded(axis(n as usize))),
            }
        }

        fn dimension(&self) -> usize {
            DEFAULT_DIM
        }
    }

    #[tokio::test]
    async fn recognize_unknown() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);

        let p = svc.recognize(axis(0)).await.unwrap();
        assert_eq!(p.status, PersonStatus::Unknown);
        assert_eq!(p.name, NEW_USER_NAME);
        assert_eq!(p.description.as_deref(), Some(UNKNOWN_PROMPT));
        assert_eq!(p.confidence, 0.5);
    }

    #[tokio::test]
    async fn register_then_recognize() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);

        let p = svc.register(axis(0), "first".into()).await.unwrap();
        assert_eq!(p.status, PersonStatus::Registered);
        assert_eq!(p.id, Some(0));
        assert_eq!(p.name, NEW_USER_NAME);
        assert_eq!(p.confidence, 0.5);

        let p = svc.register(axis(1), "second".into()).await.unwrap();
        assert_eq!(p.id, Some(1));
        assert_eq!(svc.total_count(), 2);

        let p = svc.recognize(axis(1)).await.unwrap();
        assert_eq!(p.status, PersonStatus::Recognized);
        assert_eq!(p.name, "User 1");
        assert_eq!(p.description.as_deref(), Some("second"));
        assert_eq!(p.confidence, 1.0);
    }

    #[tokio::test]
    async fn register_known_face_does_not_insert() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);

        svc.register(axis(0), "original".into()).await.unwrap();
        let p = svc.register(axis(0), "again".into()).await.unwrap();
        assert_eq!(p.status, PersonStatus::Recognized);
        assert_eq!(p.id, Some(0));
        assert_eq!(p.description.as_deref(), Some("original"));
        assert_eq!(svc.total_count(), 1);
    }

    #[tokio::test]
    async fn recognized_without_description() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        svc.index().append(&axis(4)).unwrap();

        let p = svc.recognize(axis(4)).await.unwrap();
        assert_eq!(p.description.as_deref(), Some(NO_DESCRIPTION));
    }

    #[tokio::test]
    async fn concurrent_registrations_get_distinct_ids() {
        let dir = tempdir().unwrap();
        let svc = Arc::new(service(&dir));

        let mut handles = Vec::new();
        for i in 0..16 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.register(axis(i), format!("person {i}")).await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().id.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (0..16).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn concurrent_registrations_of_same_face_mint_once() {
        let dir = tempdir().unwrap();
        let svc = Arc::new(service(&dir));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.register(axis(9), "same".into()).await.unwrap()
            }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap().id, Some(0));
        }
        assert_eq!(svc.total_count(), 1);
    }

    #[tokio::test]
    async fn search_filters_candidates() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        svc.register(axis(0), "a".into()).await.unwrap();
        svc.register(axis(1), "b".into()).await.unwrap();

        let found = svc.search(axis(0), 2).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 0);
    }

    #[tokio::test]
    async fn survives_restart() {
        let dir = tempdir().unwrap();
        {
            let svc = service(&dir);
            svc.register(axis(2), "kept".into()).await.unwrap();
        }
        let svc = service(&dir);
        let p = svc.recognize(axis(2)).await.unwrap();
        assert_eq!(p.id, Some(0));
    }

    #[tokio::test]
    async fn malformed_embedding_is_an_error() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let err = svc.recognize(vec![1.0, 2.0]).await.unwrap_err();
        assert!(matches!(err, FaceIdError::Index(_)));
        let err = svc.register(vec![1.0], "bad".into()).await.unwrap_err();
        assert!(matches!(err, FaceIdError::Index(_)));
        assert_eq!(svc.total_count(), 0);
    }

    #[tokio::test]
    async fn image_pipeline_rejections() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);

        let err = svc.recognize_image(&FakeEmbedder, &[0]).await.unwrap_err();
        assert!(matches!(err, FaceIdError::NoFace));
        assert!(err.is_rejection());

        let err = svc
            .register_image(&FakeEmbedder, &[1], "x".into())
            .await
            .unwrap_err();
        assert!(matches!(err, FaceIdError::AlignmentFailed));
        assert_eq!(svc.total_count(), 0);

        let err = svc.recognize_image(&FakeEmbedder, &[]).await.unwrap_err();
        assert!(!err.is_rejection());
    }

    #[tokio::test]
    async fn image_pipeline_registers() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);

        let p = svc
            .register_image(&FakeEmbedder, &[7], "from image".into())
            .await
            .unwrap();
        assert_eq!(p.status, PersonStatus::Registered);

        let p = svc.recognize_image(&FakeEmbedder, &[7]).await.unwrap();
        assert_eq!(p.status, PersonStatus::Recognized);
        assert_eq!(p.description.as_deref(), Some("from image"));
    }
}
