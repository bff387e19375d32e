use crate::errors::IncidentError;
use crate::types::Category;
use std::collections::BTreeMap;

pub const NO_PREDEFINED_SOLUTION: &str = "No predefined solution.";

/// Static remediation table. Built once per run and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    solutions: BTreeMap<Category, String>,
}

impl KnowledgeBase {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Category, S)>,
        S: Into<String>,
    {
        Self {
            solutions: entries
                .into_iter()
                .map(|(category, solution)| (category, solution.into()))
                .collect(),
        }
    }

    pub fn from_config(table: &BTreeMap<String, String>) -> Result<Self, IncidentError> {
        let mut solutions = BTreeMap::new();
        for (key, solution) in table {
            let category = Category::from_name(key).ok_or_else(|| {
                IncidentError::InvalidConfig(format!(
                    "knowledge_base key `{key}` is not a known category"
                ))
            })?;
            if solutions.insert(category, solution.clone()).is_some() {
                return Err(IncidentError::InvalidConfig(format!(
                    "knowledge_base lists category {category} more than once (key `{key}`)"
                )));
            }
        }
        Ok(Self { solutions })
    }

    pub fn get(&self, category: Category) -> Option<&str> {
        self.solutions.get(&category).map(String::as_str)
    }

    pub fn solution_for(&self, category: Category) -> &str {
        self.get(category).unwrap_or(NO_PREDEFINED_SOLUTION)
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}
