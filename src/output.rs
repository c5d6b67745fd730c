use std::io::{self, Write};

use serde::Serialize;

use crate::dataset::FetchResult;
use crate::domain::CatalogEntry;
use crate::resolve::ResolvedRow;

/// Timestamped envelope for anything printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct Report<T: Serialize> {
    pub generated_at: String,
    pub items: T,
}

impl<T: Serialize> Report<T> {
    pub fn new(items: T) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            items,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[FetchResult]) -> Self {
        let succeeded = results.iter().filter(|result| result.is_ok()).count();
        Self {
            requested: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_entries(entries: &[CatalogEntry]) -> io::Result<()> {
        Self::print_json(&Report::new(entries))
    }

    pub fn print_lookup(value: Option<&str>) -> io::Result<()> {
        Self::print_json(&Report::new(value))
    }

    pub fn print_fetch(results: &[FetchResult]) -> io::Result<()> {
        Self::print_json(&Report::new(results))
    }

    pub fn print_rows(rows: &[ResolvedRow]) -> io::Result<()> {
        Self::print_json(&Report::new(rows))
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
