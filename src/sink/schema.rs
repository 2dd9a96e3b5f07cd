//! Destination tables and the positional binding of rows into them.

use rusqlite::ToSql;

use crate::record::{CountryTotal, Record};

/// A destination table: its name and `(column, SQL type)` list in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [(&'static str, &'static str)],
}

const RECORD_COLUMNS: &[(&str, &str)] = &[
    ("Region_Code", "NVARCHAR(50)"),
    ("Region_Name", "NVARCHAR(50)"),
    ("Country_Code", "NVARCHAR(50)"),
    ("Country_Name", "NVARCHAR(50)"),
    ("Year", "INT"),
    ("Sex", "NVARCHAR(10)"),
    ("Age_Group_Code", "NVARCHAR(50)"),
    ("Age_Group", "NVARCHAR(50)"),
    ("Number", "INT"),
    ("Percentage of cause-specific deaths out of total deaths", "FLOAT"),
    ("Age-standardized death rate per 100 000 standard population", "FLOAT"),
    ("Death rate per 100 000 population", "FLOAT"),
];

const AGGREGATED_COLUMNS: &[(&str, &str)] =
    &[("Country_Name", "NVARCHAR(50)"), ("Total_Deaths", "INT")];

pub const NO_NULLS: TableSpec = TableSpec {
    name: "CleanedData_NoNulls",
    columns: RECORD_COLUMNS,
};
pub const YEAR_2020: TableSpec = TableSpec {
    name: "CleanedData_2020",
    columns: RECORD_COLUMNS,
};
pub const AGE_GROUP: TableSpec = TableSpec {
    name: "CleanedData_AgeGroup",
    columns: RECORD_COLUMNS,
};
pub const WITHOUT_OUTLIERS: TableSpec = TableSpec {
    name: "CleanedData_WithoutOutliers",
    columns: RECORD_COLUMNS,
};
pub const AGGREGATED: TableSpec = TableSpec {
    name: "CleanedData_Aggregated",
    columns: AGGREGATED_COLUMNS,
};

impl TableSpec {
    /// Plain `CREATE TABLE`, so a second creation of the same table fails.
    pub fn create_sql(&self) -> String {
        let cols = self
            .columns
            .iter()
            .map(|(name, ty)| format!("[{name}] {ty}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE [{}] ({cols})", self.name)
    }

    pub fn insert_sql(&self) -> String {
        let names = self
            .columns
            .iter()
            .map(|(name, _)| format!("[{name}]"))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO [{}] ({names}) VALUES ({placeholders})",
            self.name
        )
    }
}

/// A row whose cells bind positionally to a [`TableSpec`]'s columns.
pub trait SqlRow {
    fn sql_params(&self) -> Vec<&dyn ToSql>;
}

impl SqlRow for Record {
    fn sql_params(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.region_code as &dyn ToSql,
            &self.region_name,
            &self.country_code,
            &self.country_name,
            &self.year,
            &self.sex,
            &self.age_group_code,
            &self.age_group,
            &self.number,
            &self.percentage_of_deaths,
            &self.age_standardized_rate,
            &self.death_rate,
        ]
    }
}

impl SqlRow for CountryTotal {
    fn sql_params(&self) -> Vec<&dyn ToSql> {
        vec![&self.country_name as &dyn ToSql, &self.total_deaths]
    }
}
