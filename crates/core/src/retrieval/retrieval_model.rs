//! Retrieval request and response models.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::analytics::{Interval, StatisticKind};
use crate::constants::ALL_COLUMNS;
use crate::errors::Result;
use crate::source::SourceSpec;
use crate::table::Table;

/// Column projection of a request: the `"All"` sentinel or explicit names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "RawColumnRequest")]
pub enum ColumnRequest {
    #[default]
    All,
    Named(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawColumnRequest {
    Sentinel(String),
    Names(Vec<String>),
}

impl TryFrom<RawColumnRequest> for ColumnRequest {
    type Error = String;

    fn try_from(raw: RawColumnRequest) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawColumnRequest::Sentinel(s) if s == ALL_COLUMNS => Ok(ColumnRequest::All),
            RawColumnRequest::Sentinel(s) => Err(format!(
                "columns must be \"{}\" or a list of names, got \"{}\"",
                ALL_COLUMNS, s
            )),
            RawColumnRequest::Names(names) => Ok(ColumnRequest::Named(names)),
        }
    }
}

impl Serialize for ColumnRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ColumnRequest::All => serializer.serialize_str(ALL_COLUMNS),
            ColumnRequest::Named(names) => names.serialize(serializer),
        }
    }
}

/// A data request over one or more sources.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataRequest {
    #[serde(rename = "db_tables", alias = "sources")]
    pub sources: Vec<SourceSpec>,
    #[serde(default)]
    pub columns: ColumnRequest,
    #[serde(default, alias = "id")]
    pub ids: Vec<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Name of the date column (`Time`, `Date`, `Month` or `Year`).
    #[serde(default)]
    pub date_type: Option<String>,
    #[serde(default)]
    pub interval: Interval,
    #[serde(default, alias = "method")]
    pub statistics: Vec<String>,
}

impl DataRequest {
    pub fn date_column(&self) -> Option<&str> {
        self.date_type.as_deref().filter(|d| !d.is_empty())
    }

    /// Both ends of the date window, when given.
    pub fn date_window(&self) -> Option<(&str, &str)> {
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => Some((start, end)),
            _ => None,
        }
    }

    pub fn statistic_kinds(&self) -> Result<Vec<StatisticKind>> {
        StatisticKind::parse_list(&self.statistics)
    }
}

/// Result of a data request: the merged rows and the optional statistics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataResponse {
    pub data: Table,
    pub stats: Option<Table>,
}

impl Serialize for DataResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let empty = Table::default();
        let stats = self.stats.as_ref().unwrap_or(&empty);
        let mut state = serializer.serialize_struct("DataResponse", 3)?;
        state.serialize_field("data", &self.data.records())?;
        state.serialize_field("stats", &stats.records())?;
        state.serialize_field("statsColumns", &stats.column_names())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnType, Value};
    use serde_json::json;

    #[test]
    fn test_request_accepts_original_field_names() {
        let request: DataRequest = serde_json::from_value(json!({
            "db_tables": [{"db": "hydro.db3", "table": "Flow"}],
            "columns": "All",
            "id": ["1", "2"],
            "date_type": "Time",
            "interval": "seasonally",
            "method": ["Average"]
        }))
        .unwrap();

        assert_eq!(request.sources, vec![SourceSpec::new("hydro.db3", "Flow")]);
        assert_eq!(request.columns, ColumnRequest::All);
        assert_eq!(request.ids, vec!["1", "2"]);
        assert_eq!(request.interval, Interval::Seasonal);
        assert_eq!(request.statistic_kinds().unwrap(), vec![StatisticKind::Average]);
        assert_eq!(request.date_window(), None);
    }

    #[test]
    fn test_column_request_forms() {
        let named: ColumnRequest = serde_json::from_value(json!(["Flow-Temperature"])).unwrap();
        assert_eq!(named, ColumnRequest::Named(vec!["Flow-Temperature".to_string()]));
        assert!(serde_json::from_value::<ColumnRequest>(json!("Some")).is_err());
    }

    #[test]
    fn test_response_shape() {
        let data = Table::from_rows(
            vec![
                Column::new("Time", ColumnType::Text),
                Column::new("Flow", ColumnType::Real),
            ],
            vec![vec![Value::from("2020-01-01"), Value::Real(1.5)]],
        );
        let response = DataResponse { data, stats: None };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "data": [{"Time": "2020-01-01", "Flow": 1.5}],
                "stats": [],
                "statsColumns": []
            })
        );
    }
}
