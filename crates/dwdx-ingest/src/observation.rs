//! Observation pipeline: DWD POI CSV reports -> flat entries
//!
//! The report layout is taken as fixed: the field names are on line 2, the
//! newest measurements on line 3, older hours below. If the provider ever
//! adds or removes a preamble line every field shifts; this is only
//! reported as a warning.

use std::sync::Arc;

use dwdx_config::ObservationConfig;
use dwdx_core::{
    join_path, station_alias, EntryMeta, EntryUpdate, StateValue, StateWriter, ValueKind,
    WriteStats,
};
use tracing::{debug, info, warn};

use crate::{observation_timestamp, observation_url, Fetcher, IngestError, IngestResult};

pub const HEADER_ROW: usize = 2;
pub const DATA_ROW: usize = 3;
/// First row scanned for a replacement when a data cell is missing
pub const FALLBACK_START: usize = 4;
pub const DELIMITER: char = ';';

pub const LOCAL_DATETIME_FIELD: &str = "LocalDateTime";
pub const LOCAL_DATETIME_NAME: &str = "Datum und Uhrzeit (Lokal)";

pub struct ObservationPipeline {
    root: String,
    config: ObservationConfig,
    fetcher: Arc<dyn Fetcher>,
    writer: StateWriter,
}

impl ObservationPipeline {
    pub fn new(
        root: impl Into<String>,
        config: ObservationConfig,
        fetcher: Arc<dyn Fetcher>,
        writer: StateWriter,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            fetcher,
            writer,
        }
    }

    /// Process every identifier in turn. A failing identifier is logged and
    /// skipped; nothing is returned as an error.
    pub async fn run(&self) -> WriteStats {
        let mut stats = WriteStats::default();
        if self.config.station_identifiers.is_empty() {
            warn!("no station identifiers configured, skipping observation update");
            return stats;
        }

        for identifier in &self.config.station_identifiers {
            match self.update_station(identifier).await {
                Ok(station_stats) => stats.merge(station_stats),
                Err(e) => warn!(identifier = %identifier, error = %e, "skipping station"),
            }
        }

        info!(
            written = stats.written,
            unchanged = stats.unchanged,
            failed = stats.failed,
            "observation update finished"
        );
        stats
    }

    async fn update_station(&self, identifier: &str) -> IngestResult<WriteStats> {
        let url = observation_url(&self.config.base_url, identifier);
        let body = self.fetcher.fetch(&url).await?.into_success_body(&url)?;
        let updates = normalize_report(&self.root, identifier, &body, &self.config.missing_value)?;
        debug!(identifier, entries = updates.len(), "normalized observations");
        Ok(self.writer.apply_all(&updates).await)
    }
}

/// Turn one CSV report into entry updates under `{root}.{alias}`.
pub fn normalize_report(
    root: &str,
    identifier: &str,
    text: &str,
    missing_value: &str,
) -> IngestResult<Vec<EntryUpdate>> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= DATA_ROW {
        return Err(IngestError::Malformed(format!(
            "expected at least {} lines, got {}",
            DATA_ROW + 1,
            lines.len()
        )));
    }

    let header: Vec<&str> = lines[HEADER_ROW].split(DELIMITER).collect();
    let row: Vec<&str> = lines[DATA_ROW].split(DELIMITER).collect();
    if row.len() < 2 {
        return Err(IngestError::Malformed("data row has no date/time".into()));
    }
    if !looks_like_header(&header) {
        warn!(identifier, line = HEADER_ROW, "field name row does not look like a header");
    }

    let base = join_path([root, station_alias(identifier).as_str()]);
    let mut updates = Vec::with_capacity(row.len());

    match observation_timestamp(row[0], row[1]) {
        Ok(local) => updates.push(EntryUpdate::new(
            join_path([base.as_str(), LOCAL_DATETIME_FIELD]),
            EntryMeta::datetime(LOCAL_DATETIME_NAME),
            StateValue::Text(local),
        )),
        Err(e) => warn!(identifier, error = %e, "skipping local date/time"),
    }

    let fallback = lines.get(FALLBACK_START..).unwrap_or_default();
    for (column, &cell) in row.iter().enumerate().skip(2) {
        let name = match header.get(column).map(|n| n.trim()) {
            Some(name) if !name.is_empty() => name,
            _ => {
                warn!(identifier, column, "no field name for column, skipping");
                continue;
            }
        };

        let raw = if cell == missing_value {
            resolve_missing(fallback, column, missing_value).unwrap_or(cell)
        } else {
            cell
        };
        let value = raw.replacen(',', ".", 1);
        let kind = if is_numeric(&value) {
            ValueKind::Number
        } else {
            ValueKind::String
        };

        updates.push(EntryUpdate::new(
            join_path([base.as_str(), name]),
            EntryMeta::value(name, kind),
            StateValue::Text(value),
        ));
    }

    Ok(updates)
}

/// First non-missing cell in `column`, scanning `rows` top to bottom.
/// Rows too short to have the column are passed over.
pub fn resolve_missing<'a>(
    rows: &[&'a str],
    column: usize,
    missing_value: &str,
) -> Option<&'a str> {
    rows.iter()
        .filter_map(|line| line.split(DELIMITER).nth(column))
        .find(|cell| *cell != missing_value)
}

fn is_numeric(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

fn looks_like_header(cells: &[&str]) -> bool {
    cells
        .first()
        .is_some_and(|c| c.chars().any(char::is_alphabetic))
}
