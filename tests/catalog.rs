use std::sync::Mutex;

use assert_matches::assert_matches;
use serde_json::{Value, json};

use dhis2_client::client::Dhis2Client;
use dhis2_client::domain::{CatalogKind, RefetchPolicy};
use dhis2_client::error::Dhis2Error;
use dhis2_client::transport::Transport;

type Responder = Box<dyn Fn(&str) -> Result<Value, Dhis2Error> + Send + Sync>;

struct MockTransport {
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    responder: Mutex<Responder>,
}

impl MockTransport {
    fn new(responder: impl Fn(&str) -> Result<Value, Dhis2Error> + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Mutex::new(Box::new(responder)),
        }
    }

    fn respond_with(
        &self,
        responder: impl Fn(&str) -> Result<Value, Dhis2Error> + Send + Sync + 'static,
    ) {
        *self.responder.lock().unwrap() = Box::new(responder);
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, Dhis2Error> {
        self.calls.lock().unwrap().push((
            endpoint.to_string(),
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        (self.responder.lock().unwrap())(endpoint)
    }
}

fn elements() -> Value {
    json!({
        "dataElements": [
            {"id": "abc123", "name": "Test Element A"},
            {"id": "def456", "name": "Test Element B"}
        ]
    })
}

#[test]
fn fetch_data_elements_populates_both_indexes() {
    let transport = MockTransport::new(|_| Ok(elements()));
    let mut client = Dhis2Client::new(&transport);

    let entries = client.fetch_data_elements().unwrap();
    assert_eq!(entries.len(), 2);

    let table = client.catalog(CatalogKind::DataElements).table();
    assert_eq!(table.by_id().len(), 2);
    assert_eq!(table.by_name().len(), 2);
    assert_eq!(table.name_of("abc123"), Some("Test Element A"));

    assert_eq!(
        client.data_element_name("abc123").unwrap().as_deref(),
        Some("Test Element A")
    );
    assert_eq!(
        client.data_element_id("Test Element B").unwrap().as_deref(),
        Some("def456")
    );
    assert_eq!(transport.call_count(), 1);
}

#[test]
fn catalog_request_disables_paging() {
    let transport = MockTransport::new(|_| Ok(json!({"organisationUnits": []})));
    let mut client = Dhis2Client::new(&transport);
    client.fetch_org_units().unwrap();

    let calls = transport.calls.lock().unwrap();
    assert_eq!(calls[0].0, "organisationUnits");
    assert_eq!(
        calls[0].1,
        vec![
            ("paging".to_string(), "false".to_string()),
            ("fields".to_string(), "id,name".to_string())
        ]
    );
}

#[test]
fn lazy_lookup_fetches_once() {
    let transport = MockTransport::new(|endpoint| {
        assert_eq!(endpoint, "categoryOptionCombos");
        Ok(json!({
            "categoryOptionCombos": [
                {"id": "coc123", "name": "Option A"},
                {"id": "coc456", "name": "Option B"}
            ]
        }))
    });
    let mut client = Dhis2Client::new(&transport);

    assert_eq!(
        client.category_option_combo_name("coc123").unwrap().as_deref(),
        Some("Option A")
    );
    assert_eq!(transport.call_count(), 1);

    assert_eq!(
        client.category_option_combo_id("Option B").unwrap().as_deref(),
        Some("coc456")
    );
    assert_eq!(client.category_option_combo_name("missing").unwrap(), None);
    assert_eq!(transport.call_count(), 1);
}

#[test]
fn empty_catalog_refetches_on_every_lookup() {
    let transport = MockTransport::new(|_| Ok(json!({"dataElements": []})));
    let mut client = Dhis2Client::new(&transport);

    assert!(client.fetch_data_elements().unwrap().is_empty());
    assert!(client.catalog(CatalogKind::DataElements).table().is_empty());
    assert_eq!(client.data_element_name("nonexistent").unwrap(), None);
    assert_eq!(client.data_element_id("nonexistent").unwrap(), None);
    assert_eq!(transport.call_count(), 3);
}

#[test]
fn once_policy_treats_empty_catalog_as_populated() {
    let transport = MockTransport::new(|_| Ok(json!({"dataElements": []})));
    let mut client = Dhis2Client::with_policy(&transport, RefetchPolicy::Once);

    assert_eq!(client.data_element_name("nonexistent").unwrap(), None);
    assert_eq!(client.data_element_id("nonexistent").unwrap(), None);
    assert_eq!(transport.call_count(), 1);
    assert!(client.catalog(CatalogKind::DataElements).is_populated());
}

#[test]
fn duplicate_names_keep_last_entry() {
    let transport = MockTransport::new(|_| {
        Ok(json!({
            "organisationUnits": [
                {"id": "ou1", "name": "Clinic"},
                {"id": "ou2", "name": "Clinic"}
            ]
        }))
    });
    let mut client = Dhis2Client::new(&transport);

    assert_eq!(client.org_unit_id("Clinic").unwrap().as_deref(), Some("ou2"));
    assert_eq!(client.org_unit_name("ou1").unwrap().as_deref(), Some("Clinic"));
}

#[test]
fn unauthorized_is_wrapped_with_context() {
    let transport = MockTransport::new(|_| Err(Dhis2Error::Unauthorized));
    let mut client = Dhis2Client::new(&transport);

    let err = client.fetch_data_elements().unwrap_err();
    assert_matches!(
        err,
        Dhis2Error::CatalogFetch {
            kind: CatalogKind::DataElements,
            ..
        }
    );
    assert_matches!(err.root_cause(), Dhis2Error::Unauthorized);
    let message = err.to_string();
    assert!(message.contains("Failed to fetch data elements"));
    assert!(message.contains("Unauthorized"));
}

#[test]
fn server_error_and_timeout_keep_their_class() {
    let transport = MockTransport::new(|_| Err(Dhis2Error::ServerUnavailable { status: 503 }));
    let mut client = Dhis2Client::new(&transport);
    let err = client.fetch_category_option_combos().unwrap_err();
    assert_matches!(err.root_cause(), Dhis2Error::ServerUnavailable { status: 503 });
    assert!(err.to_string().contains("Server error"));

    transport.respond_with(|endpoint| {
        Err(Dhis2Error::RequestTimedOut {
            url: format!("https://dhis2.example/api/{endpoint}"),
        })
    });
    let err = client.fetch_org_units().unwrap_err();
    assert_matches!(err.root_cause(), Dhis2Error::RequestTimedOut { .. });
    assert!(err.to_string().contains("timed out"));
}

#[test]
fn failed_refresh_keeps_previous_tables() {
    let transport = MockTransport::new(|_| Ok(elements()));
    let mut client = Dhis2Client::new(&transport);
    client.fetch_data_elements().unwrap();

    transport.respond_with(|_| {
        Err(Dhis2Error::ConnectionFailed {
            url: "https://dhis2.example/api/dataElements".to_string(),
            message: "connection refused".to_string(),
        })
    });
    let err = client.fetch_data_elements().unwrap_err();
    assert!(err.to_string().contains("Failed to connect"));
    assert_eq!(
        client.data_element_name("abc123").unwrap().as_deref(),
        Some("Test Element A")
    );
    assert_eq!(transport.call_count(), 2);
}

#[test]
fn missing_catalog_key_is_malformed() {
    let transport = MockTransport::new(|_| Ok(json!({"pager": {"page": 1}})));
    let mut client = Dhis2Client::new(&transport);

    let err = client.fetch_org_units().unwrap_err();
    assert_matches!(err.root_cause(), Dhis2Error::MalformedResponse { .. });
}

#[test]
fn eager_fetch_fills_every_catalog() {
    let transport = MockTransport::new(|endpoint| {
        Ok(json!({ (endpoint): [{"id": format!("{endpoint}-1"), "name": format!("{endpoint} one")}] }))
    });
    let mut client = Dhis2Client::new(&transport);
    client.fetch_all_catalogs().unwrap();

    for kind in CatalogKind::ALL {
        assert_eq!(client.catalog(kind).table().len(), 1);
    }
    assert_eq!(transport.call_count(), 3);
}

#[test]
fn sessions_do_not_share_catalogs() {
    let transport = MockTransport::new(|_| Ok(elements()));
    let mut first = Dhis2Client::new(&transport);
    let mut second = Dhis2Client::new(&transport);

    first.fetch_data_elements().unwrap();
    assert!(second.catalog(CatalogKind::DataElements).table().is_empty());
    second.data_element_name("abc123").unwrap();
    assert_eq!(transport.call_count(), 2);
}
