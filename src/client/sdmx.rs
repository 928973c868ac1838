use crate::errors::{AppError, AppResult};
use crate::models::ResponseFormat;
use chrono::NaiveDate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Deserialize;
use std::collections::BTreeMap;

/// A dated value of a single series.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
struct SdmxMessage {
    #[serde(rename = "dataSets", default)]
    data_sets: Vec<DataSet>,
    structure: Structure,
}

#[derive(Debug, Deserialize)]
struct DataSet {
    #[serde(default)]
    series: BTreeMap<String, Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    observations: BTreeMap<String, Vec<Option<serde_json::Value>>>,
}

#[derive(Debug, Deserialize)]
struct Structure {
    dimensions: Dimensions,
}

#[derive(Debug, Deserialize)]
struct Dimensions {
    #[serde(default)]
    observation: Vec<Dimension>,
}

#[derive(Debug, Deserialize)]
struct Dimension {
    #[serde(default)]
    id: String,
    #[serde(default)]
    values: Vec<DimensionValue>,
}

#[derive(Debug, Deserialize)]
struct DimensionValue {
    id: String,
}

/// Parses a response body in the given wire format.
pub fn parse_observations(body: &str, format: ResponseFormat) -> AppResult<Vec<Observation>> {
    match format {
        ResponseFormat::JsonData => parse_sdmx_json(body),
        ResponseFormat::StructureSpecificData => parse_structure_specific_xml(body),
    }
}

/// Parses an SDMX-JSON data message holding a single series.
///
/// Observation keys are positions in the `TIME_PERIOD` dimension; the first value of
/// each observation array is the rate. Null values are skipped. A message without data
/// sets or series yields no observations.
pub fn parse_sdmx_json(body: &str) -> AppResult<Vec<Observation>> {
    let message: SdmxMessage = serde_json::from_str(body)
        .map_err(|e| AppError::ParseError(format!("Invalid SDMX-JSON message: {e}")))?;

    let dimensions = &message.structure.dimensions.observation;
    let time_dimension = dimensions
        .iter()
        .find(|d| d.id == "TIME_PERIOD")
        .or_else(|| dimensions.first())
        .ok_or_else(|| AppError::ParseError("Message has no observation dimension".into()))?;

    let Some(series) = message
        .data_sets
        .first()
        .and_then(|data_set| data_set.series.values().next())
    else {
        return Ok(Vec::new());
    };

    let mut result = Vec::with_capacity(series.observations.len());
    for (key, values) in &series.observations {
        let index: usize = key
            .parse()
            .map_err(|_| AppError::ParseError(format!("Invalid observation key: {key}")))?;
        let period = time_dimension.values.get(index).ok_or_else(|| {
            AppError::ParseError(format!("Observation {index} has no matching time period"))
        })?;
        let Some(value) = values.first().and_then(|v| v.as_ref()).and_then(|v| v.as_f64()) else {
            continue;
        };
        result.push(Observation {
            date: parse_period(&period.id)?,
            value,
        });
    }

    result.sort_by_key(|o| o.date);
    Ok(result)
}

/// Parses an SDMX-ML structure-specific data message.
///
/// Every `Obs` element contributes its `TIME_PERIOD` and `OBS_VALUE` attributes.
/// Observations without a value (or with `NaN`) are skipped.
pub fn parse_structure_specific_xml(body: &str) -> AppResult<Vec<Observation>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut result = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Obs" => {
                if let Some(observation) = observation_from_element(&e)? {
                    result.push(observation);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    result.sort_by_key(|o| o.date);
    Ok(result)
}

fn observation_from_element(element: &BytesStart) -> AppResult<Option<Observation>> {
    let mut period: Option<String> = None;
    let mut value: Option<String> = None;

    for attr in element.attributes().filter_map(|a| a.ok()) {
        match attr.key.local_name().as_ref() {
            b"TIME_PERIOD" => period = Some(String::from_utf8_lossy(&attr.value).into_owned()),
            b"OBS_VALUE" => value = Some(String::from_utf8_lossy(&attr.value).into_owned()),
            _ => {}
        }
    }

    let period = period.ok_or_else(|| AppError::ParseError("Obs without TIME_PERIOD".into()))?;
    let Some(value) = value.filter(|v| !v.eq_ignore_ascii_case("nan")) else {
        return Ok(None);
    };
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| AppError::ParseError(format!("Invalid OBS_VALUE {value:?} for {period}")))?;

    Ok(Some(Observation {
        date: parse_period(&period)?,
        value,
    }))
}

fn parse_period(period: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(period, "%Y-%m-%d")
        .map_err(|e| AppError::ParseError(format!("Invalid time period {period:?}: {e}")))
}
