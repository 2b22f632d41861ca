//! Generic store client boundary.

use async_trait::async_trait;
use recall_types::AdapterError;
use serde_json::Value;

/// Table-like access over named collections of JSON rows, plus an optional
/// named remote procedure.
///
/// This is the transport seam: implementations translate these calls into a
/// managed document/row store. Retries and timeouts, if any, belong below
/// this boundary.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Insert rows and return them as stored (the store assigns ids).
    async fn insert(
        &self,
        collection: &str,
        rows: Vec<Value>,
    ) -> Result<Vec<Value>, AdapterError>;

    /// Delete every row whose `column` equals `value`.
    async fn delete_eq(
        &self,
        collection: &str,
        column: &str,
        value: &Value,
    ) -> Result<(), AdapterError>;

    /// Select rows whose `column` equals `value`.
    async fn select_eq(
        &self,
        collection: &str,
        column: &str,
        value: &Value,
    ) -> Result<Vec<Value>, AdapterError>;

    /// Select rows whose `column` is one of `values`.
    async fn select_in(
        &self,
        collection: &str,
        column: &str,
        values: &[Value],
    ) -> Result<Vec<Value>, AdapterError>;

    /// Select every row in the collection.
    async fn select_all(&self, collection: &str) -> Result<Vec<Value>, AdapterError>;

    /// Invoke a named server-side procedure. Clients without procedure
    /// support return [`AdapterError::RpcUnsupported`].
    async fn rpc(&self, name: &str, args: Value) -> Result<Value, AdapterError>;
}
