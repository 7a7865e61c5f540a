//! Tenant (virtual cluster) resolution from the configuration store.
//!
//! The tenant name lives in a well-known record,
//! `kube-system/virtualcluster-info`, under the `VirtualClusterName` key.
//! Resolution is best effort: any failure is logged and collapses to the
//! empty string, which callers treat as "no tenant identified".

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::Context;

/// Request header carrying the resolved tenant name.
pub const VIRTUAL_CLUSTER_NAME_HEADER: &str = "virtualcluster-name";

/// Field of the info record holding the tenant name.
pub const VIRTUAL_CLUSTER_NAME_KEY: &str = "VirtualClusterName";

pub const VIRTUAL_CLUSTER_INFO_NAMESPACE: &str = "kube-system";
pub const VIRTUAL_CLUSTER_INFO_NAME: &str = "virtualcluster-info";

/// Errors returned by a configuration lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("record {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("configuration backend error: {0}")]
    Backend(String),
}

/// A named record of string data, addressed by namespace and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl TenantRecord {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            data: HashMap::new(),
        }
    }

    /// Add a data entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Get-by-name access to configuration records.
///
/// Implement this over whatever store holds cluster configuration.
#[async_trait]
pub trait ConfigLookup: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<TenantRecord, LookupError>;
}

/// In-memory [`ConfigLookup`].
#[derive(Debug, Default)]
pub struct StaticConfigLookup {
    records: RwLock<HashMap<(String, String), TenantRecord>>,
}

impl StaticConfigLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load records from a JSON array of `{namespace, name, data}` objects.
    ///
    /// # Example
    /// ```
    /// use locstream::tenant::StaticConfigLookup;
    ///
    /// let lookup = StaticConfigLookup::from_json(r#"[
    ///     {"namespace": "kube-system", "name": "virtualcluster-info",
    ///      "data": {"VirtualClusterName": "tenant-a"}}
    /// ]"#).unwrap();
    /// assert_eq!(lookup.len(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<TenantRecord> = serde_json::from_str(json)?;
        let lookup = Self::new();
        for record in records {
            lookup.insert(record);
        }
        Ok(lookup)
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: TenantRecord) {
        let key = (record.namespace.clone(), record.name.clone());
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, record);
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConfigLookup for StaticConfigLookup {
    async fn get(&self, namespace: &str, name: &str) -> Result<TenantRecord, LookupError> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

/// Look up the tenant name, returning an empty string on any failure.
///
/// The lookup is bounded by `ctx`; if the context ends first the lookup is
/// abandoned and the empty string returned.
pub async fn resolve_tenant(ctx: &Context, lookup: &dyn ConfigLookup) -> String {
    tracing::debug!(
        namespace = VIRTUAL_CLUSTER_INFO_NAMESPACE,
        name = VIRTUAL_CLUSTER_INFO_NAME,
        "resolving virtual cluster name"
    );

    let result = tokio::select! {
        reason = ctx.done() => {
            tracing::warn!("virtual cluster lookup abandoned: {}", reason);
            return String::new();
        }
        result = lookup.get(VIRTUAL_CLUSTER_INFO_NAMESPACE, VIRTUAL_CLUSTER_INFO_NAME) => result,
    };

    let record = match result {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(
                "failed to get {}/{}: {}",
                VIRTUAL_CLUSTER_INFO_NAMESPACE,
                VIRTUAL_CLUSTER_INFO_NAME,
                e
            );
            return String::new();
        }
    };

    match record.data.get(VIRTUAL_CLUSTER_NAME_KEY) {
        Some(name) => {
            tracing::info!(virtual_cluster = %name, "found virtual cluster name");
            name.clone()
        }
        None => {
            tracing::error!(
                "no {} entry in {}/{}",
                VIRTUAL_CLUSTER_NAME_KEY,
                VIRTUAL_CLUSTER_INFO_NAMESPACE,
                VIRTUAL_CLUSTER_INFO_NAME
            );
            String::new()
        }
    }
}
