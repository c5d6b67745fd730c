use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::fetch_entries;
use crate::domain::{CatalogEntry, DataValue};
use crate::error::Dhis2Error;
use crate::transport::Transport;

pub const DATA_VALUE_SETS_ENDPOINT: &str = "dataValueSets";
pub const DATA_SETS_ENDPOINT: &str = "dataSets";

/// Body of a `dataValueSets` response, kept exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawDataValueSet(Value);

impl RawDataValueSet {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    /// Decodes the `dataValues` array. A body without it is malformed.
    pub fn data_values(&self) -> Result<Vec<DataValue>, Dhis2Error> {
        let values = self.0.get("dataValues").ok_or_else(|| {
            Dhis2Error::malformed(DATA_VALUE_SETS_ENDPOINT, "missing `dataValues` key")
        })?;
        Vec::<DataValue>::deserialize(values)
            .map_err(|err| Dhis2Error::malformed(DATA_VALUE_SETS_ENDPOINT, err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchKey {
    pub dataset_id: String,
    pub period: String,
    #[serde(rename = "orgUnit")]
    pub org_unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    Data(RawDataValueSet),
    Error(String),
}

/// One cell of a batch fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    #[serde(flatten)]
    pub key: FetchKey,
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

impl FetchResult {
    pub fn data(&self) -> Option<&RawDataValueSet> {
        match &self.outcome {
            FetchOutcome::Data(data) => Some(data),
            FetchOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Data(_) => None,
            FetchOutcome::Error(message) => Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Data(_))
    }
}

pub fn fetch_one(
    transport: &dyn Transport,
    dataset_id: &str,
    period: &str,
    org_unit: Option<&str>,
) -> Result<RawDataValueSet, Dhis2Error> {
    let mut query = vec![("dataSet", dataset_id), ("period", period)];
    if let Some(org_unit) = org_unit.filter(|value| !value.is_empty()) {
        query.push(("orgUnit", org_unit));
    }

    transport
        .get(DATA_VALUE_SETS_ENDPOINT, &query)
        .map(RawDataValueSet::new)
        .map_err(|err| Dhis2Error::DatasetFetch {
            dataset_id: dataset_id.to_string(),
            period: period.to_string(),
            cause: Box::new(err),
        })
}

/// Fetches every (dataset, period, org unit) combination in that nesting
/// order. A failed combination is recorded and the loop moves on.
pub fn fetch_many<D, P, O>(
    transport: &dyn Transport,
    dataset_ids: &[D],
    periods: &[P],
    org_units: &[O],
) -> Vec<FetchResult>
where
    D: AsRef<str>,
    P: AsRef<str>,
    O: AsRef<str>,
{
    let mut results = Vec::with_capacity(dataset_ids.len() * periods.len() * org_units.len());
    for dataset_id in dataset_ids {
        for period in periods {
            for org_unit in org_units {
                let (dataset_id, period, org_unit) =
                    (dataset_id.as_ref(), period.as_ref(), org_unit.as_ref());
                let outcome = match fetch_one(transport, dataset_id, period, Some(org_unit)) {
                    Ok(data) => FetchOutcome::Data(data),
                    Err(err) => {
                        tracing::warn!(dataset_id, period, org_unit, error = %err, "dataset fetch failed");
                        FetchOutcome::Error(err.to_string())
                    }
                };
                results.push(FetchResult {
                    key: FetchKey {
                        dataset_id: dataset_id.to_string(),
                        period: period.to_string(),
                        org_unit: org_unit.to_string(),
                    },
                    outcome,
                });
            }
        }
    }
    results
}

/// Lists the datasets defined on the server. Not cached.
pub fn fetch_dataset_catalog(transport: &dyn Transport) -> Result<Vec<CatalogEntry>, Dhis2Error> {
    fetch_entries(transport, DATA_SETS_ENDPOINT, DATA_SETS_ENDPOINT).map_err(|err| {
        Dhis2Error::DatasetListFetch {
            cause: Box::new(err),
        }
    })
}
