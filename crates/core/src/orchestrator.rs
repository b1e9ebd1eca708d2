use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::analyzer::{ChunkRequest, analyze_chunk};
use crate::chunk::{ChunkLimits, split_transcript};
use crate::error::{AnalysisError, Result};
use crate::merge::merge_results;
use crate::progress::{ProgressRecord, ProgressTracker};
use crate::provider::TextGenerator;
use crate::types::{AnalysisResult, Transcript};

/// Drives the full analysis of one transcript: validate, split, fan out one
/// task per chunk, merge, finalize progress. Cheap to clone; clones share the
/// generator and the progress store.
#[derive(Clone)]
pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    progress: ProgressTracker,
    limits: ChunkLimits,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, progress: ProgressTracker) -> Self {
        Self {
            generator,
            progress,
            limits: ChunkLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ChunkLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Current progress for an operation, if it exists and has not been
    /// swept.
    pub async fn get_progress(&self, operation_id: &str) -> Option<ProgressRecord> {
        self.progress.get(operation_id).await
    }

    /// Analyze a whole transcript and return the merged report.
    ///
    /// Never returns an error: structural failures surface as an `error`
    /// progress record plus a minimal result whose summary states the cause,
    /// and per-chunk failures become placeholder sections in the merged
    /// report. When `operation_id` is `None` a fresh id is generated; pass
    /// one in to poll progress concurrently.
    pub async fn analyze_transcription(
        &self,
        title: &str,
        transcript: &Transcript,
        output_language: &str,
        operation_id: Option<&str>,
    ) -> AnalysisResult {
        let operation_id = operation_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        self.progress.create(&operation_id).await;

        match self
            .run(title, transcript, output_language, &operation_id)
            .await
        {
            Ok(result) => {
                self.progress
                    .complete(&operation_id, "analysis completed")
                    .await;
                result
            }
            Err(err) => {
                error!(%operation_id, %err, "analysis failed");
                self.progress.fail(&operation_id, &err.to_string()).await;
                AnalysisResult::minimal(title, &format!("Analysis failed: {}", err))
            }
        }
    }

    async fn run(
        &self,
        title: &str,
        transcript: &Transcript,
        output_language: &str,
        operation_id: &str,
    ) -> Result<AnalysisResult> {
        if transcript.segments.is_empty() {
            return Err(AnalysisError::EmptyTranscript);
        }

        let mut chunks = split_transcript(transcript, &self.limits);
        if chunks.is_empty() {
            return Err(AnalysisError::NoChunks);
        }
        let total_chunks = chunks.len() as u32;
        info!(%operation_id, total_chunks, "starting transcript analysis");

        let outcomes = if total_chunks == 1 {
            let request = ChunkRequest {
                title: title.to_string(),
                chunk: chunks.remove(0),
                output_language: output_language.to_string(),
                operation_id: operation_id.to_string(),
                chunk_number: 1,
                total_chunks: 1,
            };
            vec![analyze_chunk(self.generator.as_ref(), &self.progress, &request).await]
        } else {
            // One task per chunk. Handles are awaited in spawn order, so the
            // outcomes stay indexed by chunk number whatever order the tasks
            // finish in.
            let mut handles = Vec::with_capacity(chunks.len());
            for (index, chunk) in chunks.into_iter().enumerate() {
                let generator = Arc::clone(&self.generator);
                let progress = self.progress.clone();
                let request = ChunkRequest {
                    title: title.to_string(),
                    chunk,
                    output_language: output_language.to_string(),
                    operation_id: operation_id.to_string(),
                    chunk_number: index as u32 + 1,
                    total_chunks,
                };
                handles.push(tokio::spawn(async move {
                    analyze_chunk(generator.as_ref(), &progress, &request).await
                }));
            }

            let mut outcomes = Vec::with_capacity(handles.len());
            for (index, handle) in handles.into_iter().enumerate() {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(join_error) => {
                        error!(chunk = index + 1, %join_error, "analysis task panicked");
                        Err(AnalysisError::TaskFailed {
                            reason: join_error.to_string(),
                        })
                    }
                };
                outcomes.push(outcome);
            }
            outcomes
        };

        debug!(
            succeeded = outcomes.iter().filter(|o| o.is_ok()).count(),
            failed = outcomes.iter().filter(|o| o.is_err()).count(),
            "merging chunk results"
        );
        Ok(merge_results(title, outcomes))
    }
}
