//! Language-model abstraction used for taste analysis and ranking
//!
//! A single-turn call: system instruction plus user prompt in, freeform text out.
//! Callers expect JSON somewhere in the reply and extract it themselves, see
//! [`extract_json_object`] and [`extract_index_array`].
use crate::error::AppResult;

pub mod gemini;

pub use gemini::GeminiClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> AppResult<String>;

    fn name(&self) -> &'static str;
}

/// First well-formed JSON object embedded in `text`
///
/// Models like to wrap JSON in prose or markdown fences; every `{` is tried as
/// a starting point until one parses.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    text.match_indices('{').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<serde_json::Value>()
            .next()
            .and_then(Result::ok)
            .filter(serde_json::Value::is_object)
    })
}

/// First bracketed array of non-negative integers embedded in `text`
pub fn extract_index_array(text: &str) -> Option<Vec<usize>> {
    text.match_indices('[').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<Vec<usize>>()
            .next()
            .and_then(Result::ok)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_object_from_fenced_reply() {
        let reply = "Sure! Here is the analysis:\n```json\n{\"userProfile\": \"Loves {space}\", \"topGenres\": [\"Sci-Fi\"]}\n```\nEnjoy.";
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value["userProfile"], "Loves {space}");
        assert_eq!(value["topGenres"], json!(["Sci-Fi"]));
    }

    #[test]
    fn test_extract_object_skips_broken_candidates() {
        let reply = "{not json} then {\"ok\": true}";
        assert_eq!(extract_json_object(reply), Some(json!({"ok": true})));
    }

    #[test]
    fn test_extract_object_none_without_json() {
        assert_eq!(extract_json_object("I cannot help with that."), None);
        assert_eq!(extract_json_object("{\"truncated\": "), None);
    }

    #[test]
    fn test_extract_index_array() {
        let reply = "Ranking [by relevance]: [3, 0, 12, 7]\nThat's all.";
        assert_eq!(extract_index_array(reply), Some(vec![3, 0, 12, 7]));
    }

    #[test]
    fn test_extract_index_array_rejects_non_integers() {
        assert_eq!(extract_index_array("[\"a\", \"b\"] and [-1]"), None);
        assert_eq!(extract_index_array("no brackets"), None);
    }
}
