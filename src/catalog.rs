use std::collections::HashMap;

use serde_json::Value;

use crate::domain::{CatalogEntry, CatalogKind, RefetchPolicy};
use crate::error::Dhis2Error;
use crate::transport::Transport;

/// Query used for every full catalog pull.
pub const CATALOG_QUERY: [(&str, &str); 2] = [("paging", "false"), ("fields", "id,name")];

/// Bidirectional id/name index built from a single catalog response.
///
/// Both maps are rebuilt together. Names are assumed unique; when two ids share
/// a name the later entry wins in `by_name`, so `by_id[by_name[n]] == n` only
/// holds for names that did not collide.
#[derive(Debug, Clone, Default)]
pub struct CatalogTable {
    by_id: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl CatalogTable {
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let mut by_id = HashMap::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len());
        for entry in entries {
            by_id.insert(entry.id.clone(), entry.name.clone());
            by_name.insert(entry.name.clone(), entry.id.clone());
        }
        Self { by_id, by_name }
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn by_id(&self) -> &HashMap<String, String> {
        &self.by_id
    }

    pub fn by_name(&self) -> &HashMap<String, String> {
        &self.by_name
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Lazily populated lookup tables for one catalog kind.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    kind: CatalogKind,
    policy: RefetchPolicy,
    populated: bool,
    table: CatalogTable,
}

enum Index {
    Id,
    Name,
}

impl CatalogCache {
    pub fn with_policy(kind: CatalogKind, policy: RefetchPolicy) -> Self {
        Self {
            kind,
            policy,
            populated: false,
            table: CatalogTable::default(),
        }
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn table(&self) -> &CatalogTable {
        &self.table
    }

    /// Pulls the whole catalog and replaces both indexes. On failure the
    /// previous tables are left as they were.
    pub fn fetch_all(
        &mut self,
        transport: &dyn Transport,
    ) -> Result<Vec<CatalogEntry>, Dhis2Error> {
        let entries = fetch_entries(transport, self.kind.endpoint(), self.kind.response_key())
            .map_err(|err| Dhis2Error::CatalogFetch {
                kind: self.kind,
                cause: Box::new(err),
            })?;
        self.table = CatalogTable::from_entries(&entries);
        self.populated = true;
        tracing::info!(catalog = %self.kind, entries = entries.len(), "catalog populated");
        Ok(entries)
    }

    pub fn name_by_id(
        &mut self,
        transport: &dyn Transport,
        id: &str,
    ) -> Result<Option<String>, Dhis2Error> {
        if self.needs_fetch(Index::Id) {
            self.fetch_all(transport)?;
        }
        Ok(self.table.name_of(id).map(str::to_string))
    }

    pub fn id_by_name(
        &mut self,
        transport: &dyn Transport,
        name: &str,
    ) -> Result<Option<String>, Dhis2Error> {
        if self.needs_fetch(Index::Name) {
            self.fetch_all(transport)?;
        }
        Ok(self.table.id_of(name).map(str::to_string))
    }

    fn needs_fetch(&self, index: Index) -> bool {
        match self.policy {
            RefetchPolicy::WhileEmpty => match index {
                Index::Id => self.table.by_id.is_empty(),
                Index::Name => self.table.by_name.is_empty(),
            },
            RefetchPolicy::Once => !self.populated,
        }
    }
}

/// Fetches `endpoint` with paging disabled and decodes the `key` array.
pub fn fetch_entries(
    transport: &dyn Transport,
    endpoint: &str,
    key: &str,
) -> Result<Vec<CatalogEntry>, Dhis2Error> {
    let response = transport.get(endpoint, &CATALOG_QUERY)?;
    parse_entries(endpoint, key, response)
}

fn parse_entries(
    endpoint: &str,
    key: &str,
    mut response: Value,
) -> Result<Vec<CatalogEntry>, Dhis2Error> {
    let items = response
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| Dhis2Error::malformed(endpoint, format!("missing `{key}` key")))?;
    serde_json::from_value(items).map_err(|err| Dhis2Error::malformed(endpoint, err.to_string()))
}
