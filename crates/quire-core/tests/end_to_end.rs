use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quire_core::{
    build_index, Assistant, CapabilityError, ChunkerConfig, GenerationRequest, Generator,
    HashEmbedder, RetrieveOptions, FALLBACK_ANSWER,
};

const DELAYS: &str = "Construction delays are handled through a penalty clause: when the \
handover date slips, the builder compensates the homeowner for every week of delay until \
the keys are handed over.";

const PAYMENTS: &str = "Customer money sits in an escrow account and is released to \
contractors only after each milestone is verified on site by an independent engineer, \
protecting owners against misuse.";

#[derive(Default)]
struct Capture(Mutex<Vec<String>>);

#[async_trait]
impl Generator for Capture {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CapabilityError> {
        self.0.lock().unwrap().push(request.prompt.clone());
        Ok(FALLBACK_ANSWER.to_string())
    }

    fn name(&self) -> &str {
        "capture"
    }
}

fn write_docs() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("delays.md"),
        format!("# Delays\n\n{DELAYS}\n"),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("payments.md"),
        format!("{PAYMENTS}\n\nLast reviewed 2024.\n"),
    )
    .unwrap();
    dir
}

#[tokio::test]
async fn two_documents_two_chunks_ranked_by_relevance() {
    let dir = write_docs();
    let embedder = HashEmbedder::new(1024);
    let corpus = build_index(dir.path(), &embedder, &ChunkerConfig::default())
        .await
        .unwrap();

    let ids: Vec<_> = corpus.chunks().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["delays_1", "payments_0"]);
    assert_eq!(corpus.chunks()[0].text, DELAYS);

    let results = corpus
        .retrieve(
            "How are construction delays handled?",
            &embedder,
            RetrieveOptions::top(2),
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.source, "delays.md");
    assert_eq!(results[1].chunk.source, "payments.md");
    assert!(results[0].score > results[1].score);
}

#[tokio::test]
async fn ask_grounds_prompt_in_retrieved_text() {
    let dir = write_docs();
    let embedder = HashEmbedder::new(1024);
    let corpus = build_index(dir.path(), &embedder, &ChunkerConfig::default())
        .await
        .unwrap();
    let assistant = Assistant::new(Arc::new(corpus), embedder, Capture::default())
        .with_retrieve_options(RetrieveOptions::top(1));

    let answer = assistant
        .ask("Who verifies milestones before contractors get paid from escrow?")
        .await
        .unwrap();
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].chunk_id, "payments_0");
    assert_eq!(answer.text, FALLBACK_ANSWER);
}
