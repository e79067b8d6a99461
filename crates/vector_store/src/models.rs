use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field values of one stored object, keyed by property name.
pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokenization: Option<String>,
}

impl PropertyDefinition {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: vec![data_type.to_string()],
            tokenization: None,
        }
    }

    pub fn with_tokenization(mut self, tokenization: &str) -> Self {
        self.tokenization = Some(tokenization.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSchema {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectorizer: Option<String>,
    pub properties: Vec<PropertyDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Created,
    AlreadyExists,
}

/// Similarity search driven by the store's own vectorizer.
#[derive(Debug, Clone, PartialEq)]
pub struct NearTextQuery {
    pub class_name: String,
    pub properties: Vec<String>,
    pub concepts: Vec<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub properties: Properties,
    pub certainty: f64,
}

impl SearchHit {
    pub fn new(properties: Properties, certainty: f64) -> Self {
        Self {
            properties,
            certainty,
        }
    }

    pub fn text_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }
}

/// Exact match of a text property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityFilter {
    pub path: String,
    pub value: String,
}

impl EqualityFilter {
    pub fn new(path: &str, value: &str) -> Self {
        Self {
            path: path.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_serialize_class_schema_in_weaviate_format() {
        let schema = ClassSchema {
            class_name: "Document".to_string(),
            vectorizer: Some("text2vec-openai".to_string()),
            properties: vec![
                PropertyDefinition::new("text", "text"),
                PropertyDefinition::new("document_id", "text").with_tokenization("field"),
            ],
        };

        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            json,
            json!({
                "class": "Document",
                "vectorizer": "text2vec-openai",
                "properties": [
                    {"name": "text", "dataType": ["text"]},
                    {"name": "document_id", "dataType": ["text"], "tokenization": "field"}
                ]
            })
        );
    }

    #[test]
    fn should_read_text_property_from_search_hit() {
        let mut properties = Properties::new();
        properties.insert("text".to_string(), json!("alpha widgets"));
        properties.insert("rank".to_string(), json!(3));

        let hit = SearchHit::new(properties, 0.9);

        assert_eq!(hit.text_property("text"), Some("alpha widgets"));
        assert_eq!(hit.text_property("rank"), None);
        assert_eq!(hit.text_property("document_id"), None);
    }
}
