use serde::Serialize;

use crate::catalog::CatalogTable;
use crate::dataset::FetchResult;
use crate::error::Dhis2Error;

/// A data value with its identifiers replaced by catalog names. A name is
/// `None` when the id is absent from the table it was looked up in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRow {
    pub data_element_name: Option<String>,
    pub category_option_combo_name: Option<String>,
    pub period: String,
    pub org_unit_name: Option<String>,
    pub value: String,
}

/// Joins the successful batch results against the given tables.
///
/// Failed results contribute no rows. A successful result whose body lacks
/// `dataValues` aborts the whole join. Tables are read as they are; nothing is
/// fetched here, so unpopulated catalogs resolve every name to `None`.
pub fn resolve(
    results: &[FetchResult],
    data_elements: &CatalogTable,
    category_option_combos: &CatalogTable,
    org_units: &CatalogTable,
) -> Result<Vec<ResolvedRow>, Dhis2Error> {
    let mut rows = Vec::new();
    for result in results {
        let Some(data) = result.data() else {
            continue;
        };
        for value in data.data_values()? {
            let lookup = |table: &CatalogTable, id: Option<&str>| {
                id.and_then(|id| table.name_of(id)).map(str::to_string)
            };
            rows.push(ResolvedRow {
                data_element_name: lookup(data_elements, value.data_element.as_deref()),
                category_option_combo_name: lookup(
                    category_option_combos,
                    value.category_option_combo.as_deref(),
                ),
                org_unit_name: lookup(org_units, value.org_unit.as_deref()),
                period: value.period,
                value: value.value,
            });
        }
    }
    Ok(rows)
}
