/// Decimal places kept on every numeric value leaving the engine
pub const NUMERIC_PRECISION: u32 = 3;

/// Substring marking a column as an identifier (join key)
pub const ID_MARKER: &str = "ID";

/// Column selection sentinel meaning "every column of the table"
pub const ALL_COLUMNS: &str = "All";

/// Label column of the statistics table
pub const STATISTICS_COLUMN: &str = "Statistics";

/// Column added by seasonal resampling
pub const SEASON_COLUMN: &str = "Season";

/// Separator between a table name and a column name in disambiguated columns
pub const TABLE_COLUMN_SEPARATOR: char = '-';

/// Placeholder entries the UI sends in statistics lists to mean "none"
pub const STATISTIC_PLACEHOLDERS: [&str; 2] = ["Equal", "None"];
