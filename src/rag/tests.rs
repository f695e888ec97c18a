//! End-to-end pipeline tests over scripted backends.
//!
//! These drive `RagEngine` against a real SQLite index with a scripted
//! model provider and a recording embedder, so every degradation path of
//! the pipeline is observable without a live backend. The live Ollama
//! test at the bottom is `#[ignore]`d.

#[cfg(test)]
mod pipeline_tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::embedding::{EmbedError, EmbeddingProvider};
    use crate::index::{DocChunk, DocumentIndex, SqliteVectorStore};
    use crate::llm::{ModelProvider, ProviderError};
    use crate::rag::prompts::{
        FALLBACK_ANSWER, META_QUESTION_CONTEXT, NO_DOCUMENTS_CONTEXT, REFUSAL_SENTENCE,
    };
    use crate::rag::{ChatTurn, RagEngine, ResponseEvaluator};

    /// Replays canned completions in order and records every prompt.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            prompt: &str,
            _system_prompt: Option<&str>,
        ) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("out of script".to_string()))
        }
    }

    fn scripted_failure() -> ProviderError {
        ProviderError::Api {
            status: 500,
            body: "scripted failure".to_string(),
        }
    }

    /// Records every query and embeds everything to the same vector, so
    /// any stored chunk matches any search.
    #[derive(Default)]
    struct RecordingEmbedder {
        queries: Mutex<Vec<String>>,
    }

    impl RecordingEmbedder {
        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingEmbedder {
        fn name(&self) -> &str {
            "recording"
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            self.queries.lock().unwrap().push(text.to_string());
            Ok(vec![1.0])
        }
    }

    fn chunk(id: &str, text: &str, source: &str) -> DocChunk {
        DocChunk {
            id: id.to_string(),
            text: text.to_string(),
            source: Some(source.to_string()),
            page: 0,
        }
    }

    fn travel_history() -> Vec<ChatTurn> {
        vec![
            ChatTurn::user("What does an economy fare include?"),
            ChatTurn::assistant("One carry-on bag.", vec!["fares.md".to_string()]),
        ]
    }

    async fn scripted_engine(
        replies: Vec<Result<String, ProviderError>>,
        seeds: Vec<DocChunk>,
    ) -> (RagEngine, Arc<ScriptedProvider>, Arc<RecordingEmbedder>) {
        let provider = ScriptedProvider::new(replies);
        let embedder = Arc::new(RecordingEmbedder::default());

        let tmp = std::env::temp_dir().join(format!(
            "groundcrew-pipeline-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let store = Arc::new(SqliteVectorStore::with_path(tmp).await.unwrap());
        let index = Arc::new(DocumentIndex::new(store, embedder.clone()));

        if !seeds.is_empty() {
            index.add_documents(seeds).await.unwrap();
            // Seeding goes through the embedder too; drop those recordings
            // so tests only see retrieval-time queries.
            embedder.queries.lock().unwrap().clear();
        }

        let engine = RagEngine::new(provider.clone(), index, 3);
        (engine, provider, embedder)
    }

    #[tokio::test]
    async fn meta_question_short_circuits_retrieval() {
        let (engine, provider, embedder) = scripted_engine(
            vec![
                Ok("what were my previous questions".to_string()),
                Ok("You asked about baggage fees.".to_string()),
            ],
            Vec::new(),
        )
        .await;

        let reply = engine
            .generate_response("What did I ask before?", &travel_history())
            .await;

        assert_eq!(reply.answer, "You asked about baggage fees.");
        assert_eq!(reply.sources, vec!["System Memory"]);
        assert!(embedder.queries().is_empty());

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains(META_QUESTION_CONTEXT));
        assert!(prompts[1].contains("What did I ask before?"));
    }

    #[tokio::test]
    async fn condensed_query_searches_but_prompt_keeps_original() {
        let (engine, provider, embedder) = scripted_engine(
            vec![
                Ok("checked bag fee economy".to_string()),
                Ok("It costs $30.".to_string()),
            ],
            vec![chunk(
                "c1",
                "Checked bag fees start at $30 for economy fares.",
                "docs/fees.md",
            )],
        )
        .await;

        let reply = engine
            .generate_response("how much is it?", &travel_history())
            .await;

        // Retrieval used the rewrite, the answer prompt did not.
        assert_eq!(embedder.queries(), vec!["checked bag fee economy"]);
        let prompts = provider.prompts();
        assert!(prompts[1].contains("how much is it?"));
        assert!(!prompts[1].contains("checked bag fee economy"));

        assert_eq!(reply.answer, "It costs $30.");
        assert_eq!(reply.sources, vec!["fees.md"]);
    }

    #[tokio::test]
    async fn first_turn_skips_condensation() {
        let (engine, provider, embedder) =
            scripted_engine(vec![Ok("Welcome aboard.".to_string())], Vec::new()).await;

        let reply = engine
            .generate_response("What is the carry-on limit?", &[])
            .await;

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("What is the carry-on limit?"));
        assert_eq!(embedder.queries(), vec!["What is the carry-on limit?"]);
        assert_eq!(reply.answer, "Welcome aboard.");
    }

    #[tokio::test]
    async fn condensation_failure_falls_back_to_raw_question() {
        let (engine, provider, embedder) = scripted_engine(
            vec![Err(scripted_failure()), Ok("Recovered fine.".to_string())],
            Vec::new(),
        )
        .await;

        let reply = engine
            .generate_response("And for business class?", &travel_history())
            .await;

        assert_eq!(embedder.queries(), vec!["And for business class?"]);
        assert_eq!(provider.prompts().len(), 2);
        assert_eq!(reply.answer, "Recovered fine.");
    }

    #[tokio::test]
    async fn generation_failure_yields_apology_without_sources() {
        let (engine, _provider, _embedder) = scripted_engine(
            vec![Err(scripted_failure())],
            vec![chunk(
                "c1",
                "Checked bag fees start at $30.",
                "docs/fees.md",
            )],
        )
        .await;

        let reply = engine
            .generate_response("How much is a checked bag?", &[])
            .await;

        assert_eq!(reply.answer, FALLBACK_ANSWER);
        assert!(reply.sources.is_empty());
    }

    #[tokio::test]
    async fn empty_index_prompts_with_the_no_documents_marker() {
        let (engine, provider, _embedder) =
            scripted_engine(vec![Ok(REFUSAL_SENTENCE.to_string())], Vec::new()).await;

        let reply = engine
            .generate_response("What routes do you fly?", &[])
            .await;

        let prompts = provider.prompts();
        assert!(prompts[0].contains(NO_DOCUMENTS_CONTEXT));
        assert!(reply.sources.is_empty());
        assert_eq!(reply.answer, REFUSAL_SENTENCE);
    }

    #[tokio::test]
    async fn first_question_is_answered_from_retrieved_documents() {
        let (engine, provider, _embedder) = scripted_engine(
            vec![Ok("The maximum checked baggage allowance is 23kg.".to_string())],
            vec![
                chunk("c1", "Checked baggage up to 23kg per passenger.", "docs/policy.pdf"),
                chunk("c2", "See the baggage section for weight limits.", "docs/faq.pdf"),
            ],
        )
        .await;

        let reply = engine
            .generate_response("What is the maximum baggage allowance?", &[])
            .await;

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Checked baggage up to 23kg per passenger."));
        assert_eq!(reply.answer, "The maximum checked baggage allowance is 23kg.");
        assert_eq!(reply.sources, vec!["faq.pdf", "policy.pdf"]);
    }

    #[tokio::test]
    async fn sources_are_deduplicated_and_sorted() {
        let (engine, _provider, _embedder) = scripted_engine(
            vec![Ok("Combined answer.".to_string())],
            vec![
                chunk("c1", "Refunds take 7 days.", "docs/b.pdf"),
                chunk("c2", "Refunds need a booking reference.", "docs/b.pdf"),
                chunk("c3", "Changes cost $50.", "archive/a.pdf"),
            ],
        )
        .await;

        let reply = engine.generate_response("Refund policy?", &[]).await;

        assert_eq!(reply.sources, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn evaluator_reads_wrapped_verdicts() {
        let provider = ScriptedProvider::new(vec![Ok(
            r#"Here you go: {"score": 4, "reasoning": "grounded"} cheers"#.to_string(),
        )]);
        let judge = ResponseEvaluator::new(provider.clone());

        let verdict = judge
            .evaluate("Refund policy?", "Refunds take 7 days.", "Refunds take 7 days.")
            .await;

        assert_eq!(verdict.score, 4);
        assert_eq!(verdict.reasoning, "grounded");
        assert!(provider.prompts()[0].contains("Refund policy?"));
    }

    #[tokio::test]
    async fn evaluator_degrades_when_the_judge_call_fails() {
        let provider = ScriptedProvider::new(vec![Err(scripted_failure())]);
        let judge = ResponseEvaluator::new(provider);

        let verdict = judge.evaluate("q", "a", "ctx").await;

        assert_eq!(verdict.score, 0);
        assert!(verdict.reasoning.starts_with("Evaluation failed:"));
    }
}

#[cfg(test)]
mod live_tests {
    use std::sync::Arc;

    use crate::embedding::{OllamaEmbedder, TokenBudget};
    use crate::index::{DocChunk, DocumentIndex, SqliteVectorStore};
    use crate::llm::OllamaProvider;
    use crate::rag::{RagEngine, ResponseEvaluator};

    // Needs a running Ollama with `llama3` and `nomic-embed-text` pulled.
    #[tokio::test]
    #[ignore]
    async fn live_ollama_answers_from_indexed_documents() {
        let url = "http://127.0.0.1:11434".to_string();
        let provider = Arc::new(OllamaProvider::new(url.clone(), "llama3".to_string()));
        let embedder = Arc::new(OllamaEmbedder::new(
            url,
            "nomic-embed-text".to_string(),
            TokenBudget::new(8000, None),
        ));

        let tmp = std::env::temp_dir().join(format!(
            "groundcrew-live-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let store = Arc::new(SqliteVectorStore::with_path(tmp).await.unwrap());
        let index = Arc::new(DocumentIndex::new(store, embedder));

        index
            .add_documents(vec![DocChunk {
                id: "live-1".to_string(),
                text: "Economy passengers may check one bag of up to 23kg free of charge."
                    .to_string(),
                source: Some("baggage-policy.md".to_string()),
                page: 1,
            }])
            .await
            .unwrap();

        let engine = RagEngine::new(provider.clone(), index, 3);
        let reply = engine
            .generate_response("How much checked baggage is free in economy?", &[])
            .await;

        println!("live answer: {}", reply.answer);
        assert_eq!(reply.sources, vec!["baggage-policy.md"]);

        let judge = ResponseEvaluator::new(provider);
        let verdict = judge
            .evaluate(
                "How much checked baggage is free in economy?",
                &reply.answer,
                "Economy passengers may check one bag of up to 23kg free of charge.",
            )
            .await;
        println!("live verdict: {} ({})", verdict.score, verdict.reasoning);
        assert!(verdict.score >= 3);
    }
}
