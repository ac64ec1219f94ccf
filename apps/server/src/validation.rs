//! Query-string validation for the retrieval routes.
//!
//! Every route takes its arguments as strings; list arguments are JSON
//! encoded. Values are checked here before they reach the engine.

use std::collections::HashMap;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use watershed_core::analytics::Interval;
use watershed_core::retrieval::ColumnRequest;
use watershed_core::source::SourceSpec;
use watershed_core::DataRequest;

use crate::error::{ApiError, ApiResult};

pub type Params = HashMap<String, String>;

const DATE_TYPES: [&str; 5] = ["Time", "Date", "Month", "Year", ""];

lazy_static! {
    static ref ID_LIST_REGEX: Regex =
        Regex::new(r#"^(\["\d+"(,\s*"\d+")*\]|\[\])$"#).expect("Invalid regex pattern");
    static ref DATE_REGEX: Regex =
        Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid regex pattern");
    static ref ALPHABETIC_REGEX: Regex =
        Regex::new(r"^[a-zA-Z]+$").expect("Invalid regex pattern");
    static ref TRAVERSAL_REGEX: Regex =
        Regex::new(r"(\.\./|\.\.\\)").expect("Invalid regex pattern");
    static ref SQL_REGEX: Regex = Regex::new(
        r"(?i)(\bSELECT\b|\bINSERT\b|\bDELETE\b|\bUPDATE\b|\bDROP\b|;|--|\bEXEC\b|\bUNION\b)"
    )
    .expect("Invalid regex pattern");
}

/// Collects per-field problems so one response reports all of them.
#[derive(Default)]
struct Problems(Vec<String>);

impl Problems {
    fn add(&mut self, field: &str, message: &str) {
        self.0.push(format!("{}: {}", field, message));
    }

    fn into_result(self) -> ApiResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::BadRequest(format!(
                "Invalid parameters: {}",
                self.0.join(", ")
            )))
        }
    }
}

/// Rejects values that look like path traversal or SQL fragments.
fn check_injection(params: &Params, keys: &[&str]) -> ApiResult<()> {
    for key in keys {
        let Some(value) = params.get(*key) else {
            continue;
        };
        if TRAVERSAL_REGEX.is_match(value) {
            return Err(ApiError::BadRequest(format!(
                "Potential path traversal detected in parameter: {}",
                key
            )));
        }
        if SQL_REGEX.is_match(value) {
            return Err(ApiError::BadRequest(format!(
                "Potential SQL injection detected in parameter: {}",
                key
            )));
        }
    }
    Ok(())
}

fn required<'a>(params: &'a Params, key: &str) -> ApiResult<&'a str> {
    params
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid parameters: {}: required field", key)))
}

fn parse_sources(raw: &str) -> ApiResult<Vec<SourceSpec>> {
    serde_json::from_str(raw).map_err(|e| {
        ApiError::BadRequest(format!("Invalid parameters: db_tables: {}", e))
    })
}

/// Reads a list argument. JSON lists are preferred; the bracketed bare form
/// (`[Average, Sum]`) is accepted too.
fn parse_list(raw: &str) -> Vec<String> {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
        return items;
    }
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_columns(raw: Option<&str>) -> ApiResult<ColumnRequest> {
    match raw {
        None => Ok(ColumnRequest::All),
        Some(raw) => serde_json::from_str(raw)
            .or_else(|_| serde_json::from_value(serde_json::Value::String(raw.to_string())))
            .map_err(|e| ApiError::BadRequest(format!("Invalid parameters: columns: {}", e))),
    }
}

/// `/api/list_files`: the folder to scan, if any.
pub fn list_files_args(params: &Params) -> ApiResult<Option<String>> {
    check_injection(params, &["folder_path"])?;
    Ok(params.get("folder_path").cloned())
}

/// `/api/get_tables`: the database path.
pub fn get_tables_args(params: &Params) -> ApiResult<String> {
    let db_path = required(params, "db_path")?.to_string();
    check_injection(params, &["db_path"])?;
    Ok(db_path)
}

/// `/api/get_table_details`: either a `db_tables` list or a single
/// `db_path` + `table_name` pair.
pub enum DetailsArgs {
    Single(SourceSpec),
    Multi(Vec<SourceSpec>),
}

pub fn get_table_details_args(params: &Params) -> ApiResult<DetailsArgs> {
    if let Some(raw) = params.get("db_tables") {
        check_injection(params, &["db_tables"])?;
        return parse_sources(raw).map(DetailsArgs::Multi);
    }
    let db_path = required(params, "db_path")?;
    let table_name = required(params, "table_name")?;
    check_injection(params, &["db_path", "table_name"])?;
    Ok(DetailsArgs::Single(SourceSpec::new(db_path, table_name)))
}

/// `/api/get_data`: builds the engine request.
pub fn get_data_args(params: &Params) -> ApiResult<DataRequest> {
    let mut problems = Problems::default();

    if !params.contains_key("db_tables") {
        problems.add("db_tables", "required field");
    }
    if let Some(id) = params.get("id") {
        if !ID_LIST_REGEX.is_match(id) {
            problems.add(
                "id",
                "should be quoted numbers enclosed in square brackets (e.g., [\"1\",\"2\",\"3\"]).",
            );
        }
    }
    for field in ["start_date", "end_date"] {
        if let Some(date) = params.get(field).filter(|d| !d.is_empty()) {
            if !DATE_REGEX.is_match(date) {
                problems.add(field, "should be in the format YYYY-MM-DD (e.g., 2024-01-01).");
            }
        }
    }
    if let Some(date_type) = params.get("date_type") {
        if !DATE_TYPES.contains(&date_type.as_str()) {
            problems.add("date_type", &format!("unallowed value {}", date_type));
        }
    }
    if let Some(interval) = params.get("interval") {
        if !ALPHABETIC_REGEX.is_match(interval) {
            problems.add("interval", "should only contain alphabetic characters.");
        }
    }
    problems.into_result()?;

    check_injection(
        params,
        &[
            "db_tables",
            "columns",
            "id",
            "start_date",
            "end_date",
            "date_type",
            "interval",
            "method",
            "statistics",
        ],
    )?;

    let sources = parse_sources(required(params, "db_tables")?)?;
    let columns = parse_columns(params.get("columns").map(String::as_str))?;
    let ids = params
        .get("id")
        .map(|raw| parse_list(raw))
        .unwrap_or_default();
    let interval = match params.get("interval") {
        Some(raw) => Interval::from_str(&raw.to_ascii_lowercase())?,
        None => Interval::Daily,
    };
    let mut statistics = params
        .get("method")
        .map(|raw| parse_list(raw))
        .unwrap_or_default();
    if let Some(raw) = params.get("statistics") {
        statistics.extend(parse_list(raw));
    }

    Ok(DataRequest {
        sources,
        columns,
        ids,
        start_date: params.get("start_date").cloned(),
        end_date: params.get("end_date").cloned(),
        date_type: params.get("date_type").cloned(),
        interval,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn data_params() -> Vec<(&'static str, &'static str)> {
        vec![
            ("db_tables", r#"[{"db": "Creek/hydro.db3", "table": "Flow"}]"#),
            ("columns", r#"["Discharge"]"#),
            ("id", r#"["1", "2"]"#),
            ("start_date", "2020-01-01"),
            ("end_date", "2020-03-31"),
            ("date_type", "Time"),
            ("interval", "monthly"),
            ("method", "[Equal]"),
            ("statistics", r#"["Average", "Maximum"]"#),
        ]
    }

    fn message(result: ApiResult<impl Sized>) -> String {
        match result {
            Err(e) => e.to_string(),
            Ok(_) => panic!("expected a validation error"),
        }
    }

    #[test]
    fn test_get_data_builds_request() {
        let request = get_data_args(&params(&data_params())).unwrap();

        assert_eq!(request.sources, vec![SourceSpec::new("Creek/hydro.db3", "Flow")]);
        assert_eq!(request.columns, ColumnRequest::Named(vec!["Discharge".to_string()]));
        assert_eq!(request.ids, vec!["1", "2"]);
        assert_eq!(request.interval, Interval::Monthly);
        assert_eq!(request.statistics, vec!["Equal", "Average", "Maximum"]);
        assert_eq!(request.statistic_kinds().unwrap().len(), 2);
    }

    #[test]
    fn test_get_data_defaults() {
        let request = get_data_args(&params(&[(
            "db_tables",
            r#"[{"db": "a.db3", "table": "Flow"}]"#,
        )]))
        .unwrap();

        assert_eq!(request.columns, ColumnRequest::All);
        assert!(request.ids.is_empty());
        assert_eq!(request.interval, Interval::Daily);
        assert!(request.statistics.is_empty());
    }

    #[test]
    fn test_bare_all_sentinel() {
        let mut pairs = data_params();
        pairs[1] = ("columns", "All");
        let request = get_data_args(&params(&pairs)).unwrap();
        assert_eq!(request.columns, ColumnRequest::All);
    }

    #[test]
    fn test_field_problems_are_reported_together() {
        let mut pairs = data_params();
        pairs[2] = ("id", "[1, 2]");
        pairs[3] = ("start_date", "01/01/2020");
        pairs[5] = ("date_type", "Week");
        pairs[6] = ("interval", "month1y");

        let msg = message(get_data_args(&params(&pairs)));

        assert!(msg.starts_with("Invalid parameters: id: should be quoted numbers"));
        assert!(msg.contains("start_date: should be in the format YYYY-MM-DD"));
        assert!(msg.contains("date_type: unallowed value Week"));
        assert!(msg.contains("interval: should only contain alphabetic characters."));
    }

    #[test]
    fn test_missing_db_tables() {
        let msg = message(get_data_args(&params(&[("id", "[]")])));
        assert_eq!(msg, "Invalid parameters: db_tables: required field");
    }

    #[test]
    fn test_injection_checks() {
        let mut pairs = data_params();
        pairs[1] = ("columns", r#"["Flow; DROP TABLE x"]"#);
        assert_eq!(
            message(get_data_args(&params(&pairs))),
            "Potential SQL injection detected in parameter: columns"
        );

        assert_eq!(
            message(get_tables_args(&params(&[("db_path", "../secret.db3")]))),
            "Potential path traversal detected in parameter: db_path"
        );
        assert_eq!(
            message(list_files_args(&params(&[("folder_path", "..\\up")]))),
            "Potential path traversal detected in parameter: folder_path"
        );

        // Column names with single dashes are legitimate.
        let mut pairs = data_params();
        pairs[1] = ("columns", r#"["Flow-Temperature", "Precip-Temperature"]"#);
        assert!(get_data_args(&params(&pairs)).is_ok());
    }

    #[test]
    fn test_unknown_interval_is_rejected() {
        let mut pairs = data_params();
        pairs[6] = ("interval", "hourly");
        assert!(get_data_args(&params(&pairs)).is_err());
    }

    #[test]
    fn test_table_details_forms() {
        let single = get_table_details_args(&params(&[
            ("db_path", "a.db3"),
            ("table_name", "Flow"),
        ]))
        .unwrap();
        assert!(matches!(single, DetailsArgs::Single(s) if s == SourceSpec::new("a.db3", "Flow")));

        let multi = get_table_details_args(&params(&[(
            "db_tables",
            r#"[{"db": "a.db3", "table": "Flow"}, {"db": "a.db3", "table": "Precip"}]"#,
        )]))
        .unwrap();
        assert!(matches!(multi, DetailsArgs::Multi(s) if s.len() == 2));

        assert!(get_table_details_args(&params(&[("db_path", "a.db3")])).is_err());
    }

    #[test]
    fn test_parse_list_forms() {
        assert_eq!(parse_list(r#"["Average","Sum"]"#), vec!["Average", "Sum"]);
        assert_eq!(parse_list("[Average, Sum]"), vec!["Average", "Sum"]);
        assert!(parse_list("[]").is_empty());
    }
}
