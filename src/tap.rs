use crate::client::EcbClient;
use crate::config::TapConfig;
use crate::errors::AppResult;
use crate::singer::{Catalog, CatalogEntry, Message, SingerWriter, State};
use crate::stream::ExchangeRatesStream;
use crate::utils::format_duration;
use chrono::{NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::io::Write;
use std::time::Instant;
use tracing::info;

/// ECB exchange rates tap: discovery and sync over the configured currencies.
pub struct Tap {
    config: TapConfig,
    state: State,
    catalog: Option<Catalog>,
}

impl Tap {
    pub fn new(config: TapConfig, state: State, catalog: Option<Catalog>) -> Self {
        Self {
            config,
            state,
            catalog,
        }
    }

    /// Returns the catalog of every stream this tap can extract.
    pub fn discover() -> Catalog {
        Catalog {
            streams: vec![ExchangeRatesStream::catalog_entry()],
        }
    }

    /// State as updated by the last sync.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Catalog entry governing `stream`: the provided one, or the discovered default.
    fn stream_entry(&self, stream: &str) -> Option<CatalogEntry> {
        match &self.catalog {
            Some(catalog) => catalog.get_stream(stream).cloned(),
            None => Self::discover().get_stream(stream).cloned(),
        }
    }

    /// Syncs every selected stream, writing SCHEMA, RECORD and finally STATE messages.
    ///
    /// `today` bounds the window when no `end_date` is configured.
    ///
    /// # Errors
    ///
    /// Fails on the first request, parse or write error; no STATE is emitted then.
    pub async fn sync<W: Write>(
        &mut self,
        client: &EcbClient,
        writer: &mut SingerWriter<W>,
        today: NaiveDate,
    ) -> AppResult<()> {
        let started = Instant::now();
        let name = ExchangeRatesStream::NAME;

        match self.stream_entry(name).filter(CatalogEntry::is_selected) {
            None => info!(stream = name, "Stream not selected, skipping"),
            Some(entry) => {
                let stream = ExchangeRatesStream::new(&self.config);
                let schema = project_schema(&entry);
                writer.write_message(&Message::Schema {
                    stream: name.to_string(),
                    schema,
                    key_properties: ExchangeRatesStream::primary_keys(),
                })?;

                let rates = stream.get_records(client, &mut self.state, today).await?;
                let time_extracted = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false);
                for rate in &rates {
                    let record = project_record(&entry, serde_json::to_value(rate)?);
                    writer.write_message(&Message::Record {
                        stream: name.to_string(),
                        record,
                        time_extracted: time_extracted.clone(),
                    })?;
                }
                info!(stream = name, records = rates.len(), "Stream synced");
            }
        }

        writer.write_message(&Message::State {
            value: self.state.value().clone(),
        })?;

        info!(
            records = writer.records_written(),
            elapsed = format_duration(started.elapsed()),
            "Sync completed"
        );
        Ok(())
    }
}

/// Drops deselected properties from the schema.
fn project_schema(entry: &CatalogEntry) -> Value {
    let mut schema = entry.schema.clone();
    if let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) {
        properties.retain(|name, _| entry.is_property_selected(name));
    }
    schema
}

/// Drops deselected properties from a record.
fn project_record(entry: &CatalogEntry, record: Value) -> Value {
    match record {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(name, _)| entry.is_property_selected(name))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}
