//! In-memory store client: JSON rows in maps, brute-force similarity RPC.

use crate::client::StoreClient;
use async_trait::async_trait;
use chrono::Utc;
use recall_types::AdapterError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let na: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

fn inner_product(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum()
}

fn euclidean_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dist: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| ((*x as f64) - (*y as f64)).powi(2))
        .sum::<f64>()
        .sqrt();
    1.0 / (1.0 + dist)
}

/// In-memory implementation of [`StoreClient`].
///
/// Rows live in per-collection vectors; inserts assign a UUID when the row
/// carries no id. The `match_memory_notes` procedure is served by a
/// brute-force scan over stored embeddings, so the semantic search path can
/// be exercised without an external store. Built `without_rpc`, every
/// procedure call reports `RpcUnsupported`.
pub struct InMemoryStoreClient {
    tables: Arc<RwLock<HashMap<String, Vec<Value>>>>,
    rpc_enabled: bool,
}

impl InMemoryStoreClient {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            rpc_enabled: true,
        }
    }

    /// A client with no procedure support, for exercising fallback paths.
    pub fn without_rpc() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            rpc_enabled: false,
        }
    }

    fn matches_eq(row: &Value, column: &str, value: &Value) -> bool {
        row.get(column) == Some(value)
    }

    async fn match_memory_notes(&self, args: &Value) -> Result<Value, AdapterError> {
        let embedding: Vec<f32> = args
            .get("embedding")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .ok_or_else(|| AdapterError::Provider("match_memory_notes: missing embedding".to_string()))?;
        let top_k = args.get("top_k").and_then(Value::as_u64).unwrap_or(10) as usize;
        let min_score = args.get("min_score").and_then(Value::as_f64).unwrap_or(0.0);
        let metric = args.get("metric").and_then(Value::as_str).unwrap_or("cosine");
        let capsule_id = args.get("capsule_id").and_then(Value::as_str);
        let user_id = args.get("user_id").and_then(Value::as_str);

        let score_fn: fn(&[f32], &[f32]) -> f64 = match metric {
            "cosine" => cosine_similarity,
            "inner_product" => inner_product,
            "euclidean" => euclidean_similarity,
            other => {
                return Err(AdapterError::Provider(format!(
                    "match_memory_notes: unknown metric {other}"
                )))
            }
        };

        let guard = self.tables.read().await;
        let rows = guard
            .get(crate::NOTES_COLLECTION)
            .cloned()
            .unwrap_or_default();
        drop(guard);

        let mut scored: Vec<(Value, f64)> = Vec::new();
        for row in rows {
            if let Some(cid) = capsule_id {
                if row.get("capsule_id").and_then(Value::as_str) != Some(cid) {
                    continue;
                }
            }
            if let Some(uid) = user_id {
                if row.get("user_id").and_then(Value::as_str) != Some(uid) {
                    continue;
                }
            }
            let stored: Option<Vec<f32>> = row
                .get("embedding")
                .and_then(|v| serde_json::from_value(v.clone()).ok());
            let Some(stored) = stored else { continue };
            if stored.len() != embedding.len() {
                continue;
            }
            let score = score_fn(&embedding, &stored);
            if score < min_score {
                continue;
            }
            scored.push((row, score));
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let hits: Vec<Value> = scored
            .into_iter()
            .map(|(mut row, score)| {
                if let Some(obj) = row.as_object_mut() {
                    obj.insert("score".to_string(), json!(score));
                }
                row
            })
            .collect();
        Ok(Value::Array(hits))
    }
}

impl Default for InMemoryStoreClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreClient for InMemoryStoreClient {
    async fn insert(
        &self,
        collection: &str,
        rows: Vec<Value>,
    ) -> Result<Vec<Value>, AdapterError> {
        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            let obj = row
                .as_object_mut()
                .ok_or_else(|| AdapterError::Provider("insert: row is not an object".to_string()))?;
            let needs_id = obj
                .get("id")
                .and_then(Value::as_str)
                .map(str::is_empty)
                .unwrap_or(true);
            if needs_id {
                obj.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
            }
            if !obj.contains_key("created_at") && collection == crate::NOTES_COLLECTION {
                obj.insert("created_at".to_string(), json!(Utc::now()));
            }
            stored.push(row);
        }
        let mut guard = self.tables.write().await;
        let table = guard.entry(collection.to_string()).or_default();
        table.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn delete_eq(
        &self,
        collection: &str,
        column: &str,
        value: &Value,
    ) -> Result<(), AdapterError> {
        let mut guard = self.tables.write().await;
        if let Some(table) = guard.get_mut(collection) {
            table.retain(|row| !Self::matches_eq(row, column, value));
        }
        Ok(())
    }

    async fn select_eq(
        &self,
        collection: &str,
        column: &str,
        value: &Value,
    ) -> Result<Vec<Value>, AdapterError> {
        let guard = self.tables.read().await;
        Ok(guard
            .get(collection)
            .map(|table| {
                table
                    .iter()
                    .filter(|row| Self::matches_eq(row, column, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn select_in(
        &self,
        collection: &str,
        column: &str,
        values: &[Value],
    ) -> Result<Vec<Value>, AdapterError> {
        let guard = self.tables.read().await;
        Ok(guard
            .get(collection)
            .map(|table| {
                table
                    .iter()
                    .filter(|row| {
                        row.get(column)
                            .map(|v| values.contains(v))
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn select_all(&self, collection: &str) -> Result<Vec<Value>, AdapterError> {
        let guard = self.tables.read().await;
        Ok(guard.get(collection).cloned().unwrap_or_default())
    }

    async fn rpc(&self, name: &str, args: Value) -> Result<Value, AdapterError> {
        if !self.rpc_enabled {
            return Err(AdapterError::RpcUnsupported(name.to_string()));
        }
        match name {
            crate::SIMILARITY_RPC => self.match_memory_notes(&args).await,
            other => Err(AdapterError::RpcUnsupported(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_ids_and_returns_stored_rows() {
        let client = InMemoryStoreClient::new();
        let stored = client
            .insert("memory_notes", vec![json!({"title": "a", "created_at": Utc::now()})])
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        let id = stored[0]["id"].as_str().unwrap();
        assert!(!id.is_empty());

        let found = client
            .select_eq("memory_notes", "id", &json!(id))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn select_in_matches_any_of_the_values() {
        let client = InMemoryStoreClient::new();
        client
            .insert(
                "memory_links",
                vec![
                    json!({"id": "e1", "source_id": "a", "target_id": "b"}),
                    json!({"id": "e2", "source_id": "b", "target_id": "c"}),
                ],
            )
            .await
            .unwrap();
        let rows = client
            .select_in("memory_links", "source_id", &[json!("a"), json!("c")])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "e1");
    }

    #[tokio::test]
    async fn delete_eq_removes_matching_rows() {
        let client = InMemoryStoreClient::new();
        client
            .insert("memory_notes", vec![json!({"id": "n1", "title": "t", "created_at": Utc::now()})])
            .await
            .unwrap();
        client
            .delete_eq("memory_notes", "id", &json!("n1"))
            .await
            .unwrap();
        let rows = client.select_all("memory_notes").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn rpc_ranks_by_similarity_and_respects_top_k() {
        let client = InMemoryStoreClient::new();
        client
            .insert(
                "memory_notes",
                vec![
                    json!({"id": "n1", "title": "a", "created_at": Utc::now(), "embedding": [1.0, 0.0]}),
                    json!({"id": "n2", "title": "b", "created_at": Utc::now(), "embedding": [0.0, 1.0]}),
                    json!({"id": "n3", "title": "c", "created_at": Utc::now(), "embedding": [0.9, 0.1]}),
                ],
            )
            .await
            .unwrap();
        let out = client
            .rpc(
                "match_memory_notes",
                json!({"embedding": [1.0, 0.0], "top_k": 2, "metric": "cosine"}),
            )
            .await
            .unwrap();
        let hits = out.as_array().unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["id"], "n1");
        assert_eq!(hits[1]["id"], "n3");
        assert!(hits[0]["score"].as_f64().unwrap() >= hits[1]["score"].as_f64().unwrap());
    }

    #[tokio::test]
    async fn rpc_disabled_reports_unsupported() {
        let client = InMemoryStoreClient::without_rpc();
        let err = client
            .rpc("match_memory_notes", json!({"embedding": [1.0]}))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::RpcUnsupported(_)));
    }
}
