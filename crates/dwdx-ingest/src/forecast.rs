//! Forecast pipeline: DWD station overview JSON -> flat entries
//!
//! Payload shape (one object per requested station id):
//!
//! ```text
//! { "N7075": { "forecast1": {..}, "forecast2": {..}, "days": [{..}, {..}] } }
//! ```
//!
//! `days` entries are addressed by position, so a shorter sequence on a
//! later run leaves the entries of the trailing days in place.

use std::sync::Arc;

use dwdx_config::ForecastConfig;
use dwdx_core::{
    join_path, EntryMeta, EntryUpdate, StateValue, StateWriter, ValueKind, WriteStats,
};
use futures::future::try_join_all;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::{format_epoch_millis, forecast_url, Fetcher, IngestError, IngestResult};

/// Fields holding epoch milliseconds that are rendered as local date strings
pub const DATE_FIELDS: [&str; 5] = ["sunrise", "sunset", "moonrise", "moonset", "start"];

pub struct ForecastPipeline {
    root: String,
    config: ForecastConfig,
    fetcher: Arc<dyn Fetcher>,
    writer: StateWriter,
}

impl ForecastPipeline {
    pub fn new(
        root: impl Into<String>,
        config: ForecastConfig,
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

    /// One update cycle. Errors are logged, never returned.
    pub async fn run(&self) -> WriteStats {
        if self.config.station_ids.is_empty() {
            warn!("no forecast station ids configured, skipping forecast update");
            return WriteStats::default();
        }

        match self.try_run().await {
            Ok(stats) => {
                info!(
                    written = stats.written,
                    unchanged = stats.unchanged,
                    failed = stats.failed,
                    "forecast update finished"
                );
                stats
            }
            Err(e) => {
                error!(error = %e, "forecast update failed");
                WriteStats::default()
            }
        }
    }

    async fn try_run(&self) -> IngestResult<WriteStats> {
        let payloads = self.fetch_all().await?;

        let mut stats = WriteStats::default();
        for (station, payload) in self.config.station_ids.iter().zip(payloads.iter()) {
            match normalize_station(&self.root, station, payload, &self.config) {
                Ok(updates) => {
                    debug!(station = %station, entries = updates.len(), "normalized forecast");
                    stats.merge(self.writer.apply_all(&updates).await);
                }
                Err(e) => error!(station = %station, error = %e, "skipping station"),
            }
        }
        Ok(stats)
    }

    /// Fetch every station concurrently; a single failure fails the whole cycle.
    async fn fetch_all(&self) -> IngestResult<Vec<Value>> {
        let requests = self.config.station_ids.iter().map(|station| async move {
            let url = forecast_url(&self.config.base_url, station);
            let body = self.fetcher.fetch(&url).await?.into_success_body(&url)?;
            Ok::<_, IngestError>(serde_json::from_str::<Value>(&body)?)
        });
        try_join_all(requests).await
    }
}

/// Normalize one station's part of the payload.
///
/// Fails only if the payload has no object for `station`; a missing or
/// malformed sub-structure is logged and skipped.
pub fn normalize_station(
    root: &str,
    station: &str,
    payload: &Value,
    config: &ForecastConfig,
) -> IngestResult<Vec<EntryUpdate>> {
    let data = payload
        .get(station)
        .ok_or_else(|| IngestError::Malformed(format!("no data for station id {}", station)))?;

    let mut updates = Vec::new();

    for (key, enabled) in [
        ("forecast1", config.enable_forecast1),
        ("forecast2", config.enable_forecast2),
    ] {
        if !enabled {
            continue;
        }
        match data.get(key) {
            Some(Value::Object(fields)) => {
                let base = join_path([root, station, key]);
                flatten_fields(&base, fields, config.split_arrays, &mut updates);
            }
            Some(_) => warn!(station, key, "expected an object, skipping"),
            None => debug!(station, key, "not present in payload"),
        }
    }

    match data.get("days") {
        Some(Value::Array(days)) => {
            for (index, day) in days.iter().enumerate() {
                let Value::Object(fields) = day else {
                    warn!(station, index, "day is not an object, skipping");
                    continue;
                };
                let base = join_path([root, station, "days", index.to_string().as_str()]);
                flatten_fields(&base, fields, config.split_arrays, &mut updates);
            }
        }
        _ => error!(station, "no usable \"days\" sequence in payload"),
    }

    Ok(updates)
}

/// Flatten one field -> value mapping under `base`.
pub fn flatten_fields(
    base: &str,
    fields: &Map<String, Value>,
    split_arrays: bool,
    out: &mut Vec<EntryUpdate>,
) {
    for (key, value) in fields {
        match value {
            Value::Array(items) if split_arrays => {
                for (j, item) in items.iter().enumerate() {
                    out.push(EntryUpdate::new(
                        join_path([base, key.as_str(), j.to_string().as_str()]),
                        EntryMeta::value(format!("{} {}", key, j), ValueKind::of_json(item)),
                        StateValue::from(item),
                    ));
                }
            }
            _ if DATE_FIELDS.contains(&key.as_str()) => {
                out.push(EntryUpdate::new(
                    join_path([base, key.as_str()]),
                    EntryMeta::value(key.clone(), ValueKind::String),
                    format_epoch_millis(&StateValue::from(value)),
                ));
            }
            _ => {
                out.push(EntryUpdate::new(
                    join_path([base, key.as_str()]),
                    EntryMeta::value(key.clone(), ValueKind::of_json(value)),
                    StateValue::from(value),
                ));
            }
        }
    }
}
