//! Row types for the mortality dataset and its aggregated form.

use serde::{Deserialize, Deserializer, Serialize};

/// Column names of the record table, in storage order.
pub const COLUMNS: [&str; 12] = [
    "Region_Code",
    "Region_Name",
    "Country_Code",
    "Country_Name",
    "Year",
    "Sex",
    "Age_Group_Code",
    "Age_Group",
    "Number",
    "Percentage of cause-specific deaths out of total deaths",
    "Age-standardized death rate per 100 000 standard population",
    "Death rate per 100 000 population",
];

/// One row of the mortality dataset. Every cell may be missing.
///
/// Headers are matched in either the underscore form used by the database
/// schema or the spaced form of the published CSV.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Record {
    #[serde(rename = "Region_Code", alias = "Region Code")]
    pub region_code: Option<String>,
    #[serde(rename = "Region_Name", alias = "Region Name")]
    pub region_name: Option<String>,
    #[serde(rename = "Country_Code", alias = "Country Code")]
    pub country_code: Option<String>,
    #[serde(rename = "Country_Name", alias = "Country Name")]
    pub country_name: Option<String>,
    #[serde(rename = "Year", default, deserialize_with = "de_opt_int")]
    pub year: Option<i64>,
    #[serde(rename = "Sex")]
    pub sex: Option<String>,
    #[serde(
        rename = "Age_Group_Code",
        alias = "Age Group Code",
        alias = "Age group code"
    )]
    pub age_group_code: Option<String>,
    #[serde(rename = "Age_Group", alias = "Age Group")]
    pub age_group: Option<String>,
    #[serde(rename = "Number", default, deserialize_with = "de_opt_int")]
    pub number: Option<i64>,
    #[serde(
        rename = "Percentage of cause-specific deaths out of total deaths",
        alias = "Percentage_of_deaths",
        default,
        deserialize_with = "de_opt_f64"
    )]
    pub percentage_of_deaths: Option<f64>,
    #[serde(
        rename = "Age-standardized death rate per 100 000 standard population",
        alias = "Age_standardized_rate",
        default,
        deserialize_with = "de_opt_f64"
    )]
    pub age_standardized_rate: Option<f64>,
    #[serde(
        rename = "Death rate per 100 000 population",
        alias = "Death_rate",
        default,
        deserialize_with = "de_opt_f64"
    )]
    pub death_rate: Option<f64>,
}

pub type RecordTable = Vec<Record>;

impl Record {
    /// True when all twelve cells hold a value.
    pub fn is_complete(&self) -> bool {
        self.region_code.is_some()
            && self.region_name.is_some()
            && self.country_code.is_some()
            && self.country_name.is_some()
            && self.year.is_some()
            && self.sex.is_some()
            && self.age_group_code.is_some()
            && self.age_group.is_some()
            && self.number.is_some()
            && self.percentage_of_deaths.is_some()
            && self.age_standardized_rate.is_some()
            && self.death_rate.is_some()
    }

    /// Cells rendered for display, in [`COLUMNS`] order. Missing cells are `NaN`.
    pub fn cells(&self) -> [String; 12] {
        fn s(v: &Option<String>) -> String {
            v.clone().unwrap_or_else(|| "NaN".into())
        }
        fn n<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map_or_else(|| "NaN".into(), T::to_string)
        }

        [
            s(&self.region_code),
            s(&self.region_name),
            s(&self.country_code),
            s(&self.country_name),
            n(&self.year),
            s(&self.sex),
            s(&self.age_group_code),
            s(&self.age_group),
            n(&self.number),
            n(&self.percentage_of_deaths),
            n(&self.age_standardized_rate),
            n(&self.death_rate),
        ]
    }
}

/// One row of the per-country aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryTotal {
    pub country_name: String,
    pub total_deaths: i64,
}

/// Cell spellings read as missing, as pandas' `read_csv` does by default.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Trimmed cell text, or `None` for an empty or missing-marker cell.
fn present_cell<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|r| r.trim().to_string())
        .filter(|r| !MISSING_TOKENS.contains(&r.as_str())))
}

/// Accepts integral cells written either as `2020` or `2020.0`.
/// Values outside the `i64` range are rejected.
fn de_opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = present_cell(deserializer)? else {
        return Ok(None);
    };

    if let Ok(v) = raw.parse::<i64>() {
        return Ok(Some(v));
    }
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    match raw.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
            Ok(Some(v as i64))
        }
        _ => Err(serde::de::Error::custom(format!(
            "expected an integer, found '{raw}'"
        ))),
    }
}

/// Float cells; `NaN` and the other missing markers become `None`.
fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = present_cell(deserializer)? else {
        return Ok(None);
    };

    match raw.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(serde::de::Error::custom(format!(
            "expected a number, found '{raw}'"
        ))),
    }
}
