use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    ClassSchema, EqualityFilter, NearTextQuery, Properties, SchemaStatus, SearchHit,
};
use crate::store::DocumentStore;

struct StoredObject {
    class_name: String,
    properties: Properties,
}

/// Process-local store for development and tests.
///
/// Search has no vectorizer: certainty is the share of concept words found among the
/// object's string property words. Objects without any shared word are not returned.
#[derive(Default)]
pub struct InMemoryStore {
    classes: Mutex<HashSet<String>>,
    objects: Mutex<Vec<StoredObject>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        let objects = self.objects.lock().map_err(lock_poisoned)?;
        Ok(objects.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

fn overlap_certainty(concepts: &HashSet<String>, properties: &Properties) -> f64 {
    if concepts.is_empty() {
        return 0.0;
    }
    let object_words: HashSet<String> = properties
        .values()
        .filter_map(Value::as_str)
        .flat_map(words)
        .collect();
    let matched = concepts.intersection(&object_words).count();
    matched as f64 / concepts.len() as f64
}

fn lock_poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("In-memory store lock poisoned")
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn ensure_schema(&self, schema: &ClassSchema) -> Result<SchemaStatus> {
        let mut classes = self.classes.lock().map_err(lock_poisoned)?;
        if classes.insert(schema.class_name.clone()) {
            Ok(SchemaStatus::Created)
        } else {
            Ok(SchemaStatus::AlreadyExists)
        }
    }

    async fn insert(
        &self,
        class_name: &str,
        _vector: Vec<f32>,
        properties: Properties,
    ) -> Result<Uuid> {
        let mut objects = self.objects.lock().map_err(lock_poisoned)?;
        objects.push(StoredObject {
            class_name: class_name.to_string(),
            properties,
        });
        Ok(Uuid::new_v4())
    }

    async fn search(&self, query: &NearTextQuery) -> Result<Vec<SearchHit>> {
        let concepts: HashSet<String> = query.concepts.iter().flat_map(|c| words(c)).collect();
        let objects = self.objects.lock().map_err(lock_poisoned)?;

        let mut hits: Vec<SearchHit> = objects
            .iter()
            .filter(|object| object.class_name == query.class_name)
            .filter_map(|object| {
                let certainty = overlap_certainty(&concepts, &object.properties);
                if certainty <= 0.0 {
                    return None;
                }
                let properties = query
                    .properties
                    .iter()
                    .filter_map(|name| {
                        object
                            .properties
                            .get(name)
                            .map(|value| (name.clone(), value.clone()))
                    })
                    .collect();
                Some(SearchHit::new(properties, certainty))
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        hits.sort_by(|a, b| b.certainty.total_cmp(&a.certainty));
        hits.truncate(query.limit);
        Ok(hits)
    }

    async fn delete_where(&self, class_name: &str, filter: &EqualityFilter) -> Result<u64> {
        let mut objects = self.objects.lock().map_err(lock_poisoned)?;
        let before = objects.len();
        objects.retain(|object| {
            object.class_name != class_name
                || object.properties.get(&filter.path).and_then(Value::as_str)
                    != Some(filter.value.as_str())
        });
        Ok((before - objects.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn properties(text: &str, document_id: &str) -> Properties {
        let mut properties = Properties::new();
        properties.insert("text".to_string(), json!(text));
        properties.insert("document_id".to_string(), json!(document_id));
        properties
    }

    fn query(concepts: &[&str], limit: usize) -> NearTextQuery {
        NearTextQuery {
            class_name: "Document".to_string(),
            properties: vec!["text".to_string(), "document_id".to_string()],
            concepts: concepts.iter().map(|c| c.to_string()).collect(),
            limit,
        }
    }

    #[tokio::test]
    async fn should_find_inserted_object_by_shared_words() {
        let store = InMemoryStore::new();
        store
            .insert("Document", vec![], properties("alpha widgets", "d1"))
            .await
            .unwrap();
        store
            .insert("Document", vec![], properties("beta gadgets", "d2"))
            .await
            .unwrap();

        let hits = store.search(&query(&["Alpha", "pricing"], 4)).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text_property("document_id"), Some("d1"));
        assert_eq!(hits[0].certainty, 0.5);
    }

    #[tokio::test]
    async fn should_rank_by_certainty_and_apply_limit() {
        let store = InMemoryStore::new();
        store
            .insert("Document", vec![], properties("alpha", "d1"))
            .await
            .unwrap();
        store
            .insert("Document", vec![], properties("alpha widgets", "d2"))
            .await
            .unwrap();
        store
            .insert("Document", vec![], properties("alpha widgets sale", "d3"))
            .await
            .unwrap();

        let hits = store
            .search(&query(&["alpha widgets", "sale"], 2))
            .await
            .unwrap();

        let ids: Vec<_> = hits
            .iter()
            .map(|h| h.text_property("document_id").unwrap())
            .collect();
        assert_eq!(ids, vec!["d3", "d2"]);
        assert!(hits[0].certainty > hits[1].certainty);
    }

    #[tokio::test]
    async fn should_only_return_requested_properties() {
        let store = InMemoryStore::new();
        store
            .insert("Document", vec![], properties("alpha", "d1"))
            .await
            .unwrap();

        let mut text_only = query(&["alpha"], 4);
        text_only.properties = vec!["text".to_string()];

        let hits = store.search(&text_only).await.unwrap();
        assert_eq!(hits[0].text_property("document_id"), None);
        assert_eq!(hits[0].text_property("text"), Some("alpha"));
    }

    #[tokio::test]
    async fn should_delete_all_matching_objects() {
        let store = InMemoryStore::new();
        store
            .insert("Document", vec![], properties("alpha", "d1"))
            .await
            .unwrap();
        store
            .insert("Document", vec![], properties("beta", "d1"))
            .await
            .unwrap();
        store
            .insert("Document", vec![], properties("gamma", "d2"))
            .await
            .unwrap();

        let filter = EqualityFilter::new("document_id", "d1");
        assert_eq!(store.delete_where("Document", &filter).await.unwrap(), 2);
        assert_eq!(store.delete_where("Document", &filter).await.unwrap(), 0);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn should_scope_operations_to_class() {
        let store = InMemoryStore::new();
        store
            .insert("Article", vec![], properties("alpha", "d1"))
            .await
            .unwrap();

        assert!(store.search(&query(&["alpha"], 4)).await.unwrap().is_empty());
        let filter = EqualityFilter::new("document_id", "d1");
        assert_eq!(store.delete_where("Document", &filter).await.unwrap(), 0);
        assert!(!store.is_empty().unwrap());
    }

    #[test]
    fn should_report_poisoned_lock_when_counting() {
        let store = std::sync::Arc::new(InMemoryStore::new());

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.objects.lock().unwrap();
            panic!("panic while holding the object lock");
        })
        .join();

        let error = store.len().unwrap_err();
        assert!(error.to_string().contains("lock poisoned"));
        assert!(store.is_empty().is_err());
    }
}
