use crate::catalog::CatalogCache;
use crate::config::ClientConfig;
use crate::dataset::{self, FetchResult, RawDataValueSet};
use crate::domain::{CatalogEntry, CatalogKind, RefetchPolicy};
use crate::error::Dhis2Error;
use crate::resolve::{self, ResolvedRow};
use crate::transport::{Dhis2HttpClient, Transport};

/// A session against one DHIS2 instance. Each client owns its own catalog
/// caches; they are filled on first use and kept for the client's lifetime.
pub struct Dhis2Client<T: Transport = Dhis2HttpClient> {
    transport: T,
    data_elements: CatalogCache,
    category_option_combos: CatalogCache,
    org_units: CatalogCache,
}

impl Dhis2Client<Dhis2HttpClient> {
    pub fn connect(config: &ClientConfig) -> Result<Self, Dhis2Error> {
        Ok(Self::new(Dhis2HttpClient::new(config)?))
    }
}

impl<T: Transport> Dhis2Client<T> {
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, RefetchPolicy::default())
    }

    pub fn with_policy(transport: T, policy: RefetchPolicy) -> Self {
        Self {
            transport,
            data_elements: CatalogCache::with_policy(CatalogKind::DataElements, policy),
            category_option_combos: CatalogCache::with_policy(
                CatalogKind::CategoryOptionCombos,
                policy,
            ),
            org_units: CatalogCache::with_policy(CatalogKind::OrganisationUnits, policy),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn catalog(&self, kind: CatalogKind) -> &CatalogCache {
        match kind {
            CatalogKind::DataElements => &self.data_elements,
            CatalogKind::CategoryOptionCombos => &self.category_option_combos,
            CatalogKind::OrganisationUnits => &self.org_units,
        }
    }

    fn split(&mut self, kind: CatalogKind) -> (&T, &mut CatalogCache) {
        let cache = match kind {
            CatalogKind::DataElements => &mut self.data_elements,
            CatalogKind::CategoryOptionCombos => &mut self.category_option_combos,
            CatalogKind::OrganisationUnits => &mut self.org_units,
        };
        (&self.transport, cache)
    }

    pub fn fetch_catalog(&mut self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, Dhis2Error> {
        let (transport, cache) = self.split(kind);
        cache.fetch_all(transport)
    }

    pub fn name_by_id(&mut self, kind: CatalogKind, id: &str) -> Result<Option<String>, Dhis2Error> {
        let (transport, cache) = self.split(kind);
        cache.name_by_id(transport, id)
    }

    pub fn id_by_name(
        &mut self,
        kind: CatalogKind,
        name: &str,
    ) -> Result<Option<String>, Dhis2Error> {
        let (transport, cache) = self.split(kind);
        cache.id_by_name(transport, name)
    }

    /// Eagerly populates all three catalogs, stopping at the first failure.
    pub fn fetch_all_catalogs(&mut self) -> Result<(), Dhis2Error> {
        for kind in CatalogKind::ALL {
            self.fetch_catalog(kind)?;
        }
        Ok(())
    }

    pub fn fetch_data_elements(&mut self) -> Result<Vec<CatalogEntry>, Dhis2Error> {
        self.fetch_catalog(CatalogKind::DataElements)
    }

    pub fn data_element_name(&mut self, id: &str) -> Result<Option<String>, Dhis2Error> {
        self.name_by_id(CatalogKind::DataElements, id)
    }

    pub fn data_element_id(&mut self, name: &str) -> Result<Option<String>, Dhis2Error> {
        self.id_by_name(CatalogKind::DataElements, name)
    }

    pub fn fetch_category_option_combos(&mut self) -> Result<Vec<CatalogEntry>, Dhis2Error> {
        self.fetch_catalog(CatalogKind::CategoryOptionCombos)
    }

    pub fn category_option_combo_name(&mut self, id: &str) -> Result<Option<String>, Dhis2Error> {
        self.name_by_id(CatalogKind::CategoryOptionCombos, id)
    }

    pub fn category_option_combo_id(&mut self, name: &str) -> Result<Option<String>, Dhis2Error> {
        self.id_by_name(CatalogKind::CategoryOptionCombos, name)
    }

    pub fn fetch_org_units(&mut self) -> Result<Vec<CatalogEntry>, Dhis2Error> {
        self.fetch_catalog(CatalogKind::OrganisationUnits)
    }

    pub fn org_unit_name(&mut self, id: &str) -> Result<Option<String>, Dhis2Error> {
        self.name_by_id(CatalogKind::OrganisationUnits, id)
    }

    pub fn org_unit_id(&mut self, name: &str) -> Result<Option<String>, Dhis2Error> {
        self.id_by_name(CatalogKind::OrganisationUnits, name)
    }

    pub fn fetch_datasets(&self) -> Result<Vec<CatalogEntry>, Dhis2Error> {
        dataset::fetch_dataset_catalog(&self.transport)
    }

    pub fn fetch_dataset(
        &self,
        dataset_id: &str,
        period: &str,
        org_unit: Option<&str>,
    ) -> Result<RawDataValueSet, Dhis2Error> {
        dataset::fetch_one(&self.transport, dataset_id, period, org_unit)
    }

    pub fn fetch_multiple_datasets<D, P, O>(
        &self,
        dataset_ids: &[D],
        periods: &[P],
        org_units: &[O],
    ) -> Vec<FetchResult>
    where
        D: AsRef<str>,
        P: AsRef<str>,
        O: AsRef<str>,
    {
        dataset::fetch_many(&self.transport, dataset_ids, periods, org_units)
    }

    /// Resolves against whatever the caches hold right now; call
    /// [`Self::fetch_all_catalogs`] first to get names.
    pub fn resolve_dataset_values(
        &self,
        results: &[FetchResult],
    ) -> Result<Vec<ResolvedRow>, Dhis2Error> {
        resolve::resolve(
            results,
            self.data_elements.table(),
            self.category_option_combos.table(),
            self.org_units.table(),
        )
    }
}
