use crate::knowledge_base::KnowledgeBase;
use crate::types::Category;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentRecord {
    pub log: String,
    pub category: Category,
    pub suggested_solution: String,
    pub note: Option<String>,
}

/// Category -> logs assigned to it, in processing order.
pub type CategorizedIndex = BTreeMap<Category, Vec<String>>;

#[derive(Debug, Clone, Default)]
pub struct IncidentRecorder {
    records: Vec<IncidentRecord>,
    index: CategorizedIndex,
}

impl IncidentRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        log: &str,
        category: Category,
        knowledge_base: &KnowledgeBase,
        note: Option<String>,
    ) {
        self.records.push(IncidentRecord {
            log: log.to_string(),
            category,
            suggested_solution: knowledge_base.solution_for(category).to_string(),
            note,
        });
        self.index
            .entry(category)
            .or_default()
            .push(log.to_string());
    }

    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    pub fn index(&self) -> &CategorizedIndex {
        &self.index
    }

    pub fn bucket(&self, category: Category) -> &[String] {
        self.index
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::IncidentRecorder;
    use crate::knowledge_base::{KnowledgeBase, NO_PREDEFINED_SOLUTION};
    use crate::types::Category;

    #[test]
    fn records_keep_processing_order_and_fill_buckets() {
        let kb = KnowledgeBase::from_entries([(Category::High, "scale out")]);
        let mut recorder = IncidentRecorder::new();
        recorder.record("a", Category::High, &kb, None);
        recorder.record("b", Category::Critical, &kb, None);
        recorder.record("c", Category::High, &kb, None);

        let logs = recorder
            .records()
            .iter()
            .map(|record| record.log.as_str())
            .collect::<Vec<_>>();
        assert_eq!(logs, ["a", "b", "c"]);
        assert_eq!(recorder.bucket(Category::High), ["a", "c"]);
        assert_eq!(recorder.bucket(Category::Critical), ["b"]);
        assert!(recorder.bucket(Category::Medium).is_empty());
        assert_eq!(recorder.len(), 3);
    }

    #[test]
    fn solution_comes_from_knowledge_base_with_default() {
        let kb = KnowledgeBase::from_entries([(Category::High, "scale out")]);
        let mut recorder = IncidentRecorder::new();
        recorder.record("a", Category::High, &kb, None);
        recorder.record(
            "b",
            Category::Unknown,
            &kb,
            Some("classification failed: boom".to_string()),
        );

        let records = recorder.records();
        assert_eq!(records[0].suggested_solution, "scale out");
        assert_eq!(records[1].suggested_solution, NO_PREDEFINED_SOLUTION);
        assert_eq!(
            records[1].note.as_deref(),
            Some("classification failed: boom")
        );
    }
}
