//! Terminal storage stage: chunk, embed, upsert.

use counterlens_index::{EmbeddingService, VectorStore, chunk_pipeline_output, embed_chunks};
use counterlens_shared::{PipelineState, Stage, Status};
use tracing::{info, instrument, warn};

/// Chunk the run output, embed every chunk, and upsert the vectors.
///
/// The three steps are strictly ordered; a failure in any of them
/// leaves the index untouched beyond what was already upserted and
/// marks the state as failed at `store_and_send`.
#[instrument(skip_all, fields(run_id = %state.run_id))]
pub async fn run_store_and_send<E, V>(
    embedder: &E,
    store: &V,
    namespace: &str,
    mut state: PipelineState,
) -> PipelineState
where
    E: EmbeddingService,
    V: VectorStore,
{
    let result = async {
        let chunks = chunk_pipeline_output(&state)?;
        let records = embed_chunks(embedder, &chunks).await?;
        store.upsert(&records, namespace).await?;
        Ok::<usize, counterlens_shared::CounterlensError>(records.len())
    }
    .await;

    match result {
        Ok(count) => {
            info!(vectors = count, namespace, "run output stored");
            state.status = Status::Success;
            state
        }
        Err(e) => {
            warn!(error = %e, "store and send failed");
            let message = e.stage_message().to_string();
            state.fail(Stage::StoreAndSend, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counterlens_index::VectorRecord;
    use counterlens_shared::{CounterlensError, PerspectiveResult, Result, Verdict, Verification};
    use std::sync::Mutex;

    struct FixedEmbedder {
        dims: usize,
    }

    impl EmbeddingService for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.25; self.dims]).collect())
        }
    }

    struct RecordingStore {
        upserts: Mutex<Vec<(Vec<VectorRecord>, String)>>,
        fail: bool,
    }

    impl RecordingStore {
        fn new(fail: bool) -> Self {
            Self {
                upserts: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    impl VectorStore for RecordingStore {
        async fn upsert(&self, records: &[VectorRecord], namespace: &str) -> Result<()> {
            if self.fail {
                return Err(CounterlensError::VectorStore(
                    "upsert failed: HTTP 503".into(),
                ));
            }
            self.upserts
                .lock()
                .unwrap()
                .push((records.to_vec(), namespace.to_string()));
            Ok(())
        }
    }

    fn complete_state() -> PipelineState {
        let mut state = PipelineState::new("Article body");
        state.sentiment = Some("Positive".into());
        state.facts = vec![Verification {
            original_claim: "Company X doubled profits".into(),
            verdict: Verdict::False,
            explanation: "Profits were flat.".into(),
            source_link: "https://example.com/r".into(),
        }];
        state.perspective = Some(PerspectiveResult {
            reasoning: "The profit claim is false.".into(),
            perspective: "The growth story is overstated.".into(),
        });
        state.score = Some(85);
        state
    }

    #[tokio::test]
    async fn upserts_perspective_and_fact_chunks() {
        let embedder = FixedEmbedder { dims: 3 };
        let store = RecordingStore::new(false);

        let state = run_store_and_send(&embedder, &store, "default", complete_state()).await;
        assert_eq!(state.status, Status::Success);

        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        let (records, namespace) = &upserts[0];
        assert_eq!(namespace, "default");
        assert_eq!(records.len(), 2);
        assert!(records[0].id.ends_with("-perspective"));
        assert!(records[1].id.ends_with("-fact-0"));
    }

    #[tokio::test]
    async fn upsert_failure_becomes_stage_error() {
        let embedder = FixedEmbedder { dims: 3 };
        let store = RecordingStore::new(true);

        let state = run_store_and_send(&embedder, &store, "default", complete_state()).await;
        assert_eq!(state.status, Status::Error);
        let err = state.error.expect("error set");
        assert_eq!(err.source, Stage::StoreAndSend);
        assert!(err.message.contains("upsert failed"));
    }

    #[tokio::test]
    async fn incomplete_state_fails_before_embedding() {
        let embedder = FixedEmbedder { dims: 3 };
        let store = RecordingStore::new(false);

        // No perspective: the chunker must refuse the state.
        let mut state = complete_state();
        state.perspective = None;

        let state = run_store_and_send(&embedder, &store, "default", state).await;
        assert_eq!(state.status, Status::Error);
        assert!(store.upserts.lock().unwrap().is_empty());
    }
}
