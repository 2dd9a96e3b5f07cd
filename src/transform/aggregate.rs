use std::collections::HashMap;

use crate::error::{EtlError, Result};
use crate::record::{CountryTotal, Record};

/// Sums `Number` per country and orders the totals from largest to smallest.
///
/// Rows without a country are skipped; a missing `Number` adds nothing.
/// Equal totals keep the order in which their countries first appeared.
/// A country total that would overflow `i64` is a [`EtlError::Statistics`].
pub fn aggregate_by_country(rows: &[Record]) -> Result<Vec<CountryTotal>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<CountryTotal> = Vec::new();

    for row in rows {
        let Some(country) = row.country_name.as_deref() else {
            continue;
        };
        let slot = *index.entry(country).or_insert_with(|| {
            totals.push(CountryTotal {
                country_name: country.to_string(),
                total_deaths: 0,
            });
            totals.len() - 1
        });
        let entry = &mut totals[slot];
        entry.total_deaths = entry
            .total_deaths
            .checked_add(row.number.unwrap_or(0))
            .ok_or_else(|| {
                EtlError::Statistics(format!("total deaths for '{country}' overflows"))
            })?;
    }

    // stable: ties stay in discovery order
    totals.sort_by(|a, b| b.total_deaths.cmp(&a.total_deaths));
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;

    fn total(name: &str, deaths: i64) -> CountryTotal {
        CountryTotal {
            country_name: name.into(),
            total_deaths: deaths,
        }
    }

    #[test]
    fn test_groups_and_sorts_descending() {
        let rows = vec![
            record("A", 2020, 10, 1.0),
            record("B", 2020, 5, 1.0),
            record("A", 2020, 20, 1.0),
        ];
        assert_eq!(
            aggregate_by_country(&rows).unwrap(),
            vec![total("A", 30), total("B", 5)]
        );
    }

    #[test]
    fn test_totals_preserve_overall_sum() {
        let rows = vec![
            record("Chile", 2019, 7, 1.0),
            record("Peru", 2020, 13, 1.0),
            record("Chile", 2021, 1, 1.0),
            record("Cuba", 2020, 40, 1.0),
            record("Peru", 2021, 2, 1.0),
        ];
        let totals = aggregate_by_country(&rows).unwrap();

        let input_sum: i64 = rows.iter().filter_map(|r| r.number).sum();
        let output_sum: i64 = totals.iter().map(|t| t.total_deaths).sum();
        assert_eq!(input_sum, output_sum);
        assert_eq!(totals.len(), 3);
        assert!(totals.windows(2).all(|w| w[0].total_deaths >= w[1].total_deaths));
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let rows = vec![
            record("Zambia", 2020, 5, 1.0),
            record("Angola", 2020, 5, 1.0),
        ];
        let names: Vec<_> = aggregate_by_country(&rows)
            .unwrap()
            .into_iter()
            .map(|t| t.country_name)
            .collect();
        assert_eq!(names, ["Zambia", "Angola"]);
    }

    #[test]
    fn test_missing_country_skipped_and_missing_number_counts_zero() {
        let mut no_country = record("X", 2020, 100, 1.0);
        no_country.country_name = None;
        let mut no_number = record("B", 2020, 0, 1.0);
        no_number.number = None;

        let rows = vec![no_country, no_number, record("B", 2020, 3, 1.0)];
        assert_eq!(aggregate_by_country(&rows).unwrap(), vec![total("B", 3)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_by_country(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_overflowing_total_is_reported() {
        let rows = vec![
            record("A", 2020, i64::MAX, 1.0),
            record("A", 2020, 1, 1.0),
        ];
        let err = aggregate_by_country(&rows).unwrap_err();
        assert!(matches!(err, EtlError::Statistics(ref msg) if msg.contains("'A'")));
    }
}
