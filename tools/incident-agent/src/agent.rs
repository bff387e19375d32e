use crate::classifier::{ClassificationOutcome, Classifier};
use crate::knowledge_base::KnowledgeBase;
use crate::logging::append_run_log;
use crate::recorder::IncidentRecorder;
use crate::report::{diagnose, recommend, DiagnosisRow};
use crate::types::Category;
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub classified: usize,
    pub failed: usize,
}

/// Classifies logs one at a time and keeps the results for a single run.
pub struct IncidentAgent {
    classifier: Classifier,
    knowledge_base: KnowledgeBase,
    recurring_threshold: usize,
    recorder: IncidentRecorder,
}

impl IncidentAgent {
    pub fn new(
        classifier: Classifier,
        knowledge_base: KnowledgeBase,
        recurring_threshold: usize,
    ) -> Self {
        Self {
            classifier,
            knowledge_base,
            recurring_threshold,
            recorder: IncidentRecorder::new(),
        }
    }

    pub fn parse_logs<I, S>(&mut self, logs: I) -> RunSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = RunSummary::default();
        for log in logs {
            let log = log.as_ref();
            let outcome = self.classifier.classify(log);
            let note = match &outcome {
                ClassificationOutcome::Classified { .. } => {
                    summary.classified += 1;
                    None
                }
                ClassificationOutcome::Failed { reason } => {
                    summary.failed += 1;
                    Some(format!("classification failed: {reason}"))
                }
            };
            self.recorder
                .record(log, outcome.category(), &self.knowledge_base, note);
            summary.processed += 1;
        }

        append_run_log(
            "info",
            "run.complete",
            json!({
                "processed": summary.processed,
                "classified": summary.classified,
                "failed": summary.failed,
            }),
        );
        summary
    }

    pub fn diagnose(&self) -> Vec<DiagnosisRow> {
        diagnose(self.recorder.records())
    }

    pub fn recommend(&self) -> BTreeMap<Category, String> {
        recommend(self.recorder.index(), self.recurring_threshold)
    }

    pub fn recorder(&self) -> &IncidentRecorder {
        &self.recorder
    }
}
