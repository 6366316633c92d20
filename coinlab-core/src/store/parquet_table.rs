//! Parquet encoding of the feature table.
//!
//! `date` is stored as `Datetime(ms)`, derived columns as nullable f64.
//! Non-finite values are written as the IEEE values themselves.

use super::schema::{COLUMNS, DERIVED, RAW_NUMERIC};
use super::StoreError;
use crate::domain::{FeatureRow, FeatureValue};
use chrono::DateTime;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

fn derived_column(name: &str, rows: &[FeatureRow], get: fn(&FeatureRow) -> FeatureValue) -> Column {
    let values: Vec<Option<f64>> = rows.iter().map(|r| get(r).as_f64()).collect();
    Column::new(name.into(), values)
}

pub fn rows_to_dataframe(rows: &[FeatureRow]) -> Result<DataFrame, StoreError> {
    let dates: Vec<i64> = rows.iter().map(|r| r.date.timestamp_millis()).collect();
    let assets: Vec<String> = rows.iter().map(|r| r.asset_id.clone()).collect();
    let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
    let volumes: Vec<f64> = rows.iter().map(|r| r.volume).collect();
    let caps: Vec<f64> = rows.iter().map(|r| r.market_cap).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .map_err(|e| StoreError::Parquet(format!("date cast: {e}")))?,
        Column::new("asset_id".into(), assets),
        Column::new("price".into(), prices),
        Column::new("volume".into(), volumes),
        Column::new("market_cap".into(), caps),
        derived_column("daily_return", rows, |r| r.daily_return),
        derived_column("ma_7", rows, |r| r.ma_7),
        derived_column("ma_30", rows, |r| r.ma_30),
        derived_column("volatility_30d", rows, |r| r.volatility_30d),
        derived_column("cumulative_return", rows, |r| r.cumulative_return),
    ])
    .map_err(|e| StoreError::Parquet(format!("dataframe creation: {e}")))
}

pub fn write_parquet(path: &Path, rows: &[FeatureRow]) -> Result<(), StoreError> {
    let mut df = rows_to_dataframe(rows)?;
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| StoreError::Parquet(format!("write parquet: {e}")))?;
    Ok(())
}

pub fn read_parquet(path: &Path) -> Result<Vec<FeatureRow>, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| StoreError::Parquet(format!("read: {e}")))?;
    dataframe_to_rows(&df)
}

pub fn dataframe_to_rows(df: &DataFrame) -> Result<Vec<FeatureRow>, StoreError> {
    for name in COLUMNS {
        if df.column(name).is_err() {
            return Err(StoreError::MissingColumn {
                column: name.to_string(),
            });
        }
    }

    let type_err = |name: &str, e: PolarsError| StoreError::Parquet(format!("{name} column type: {e}"));
    let column = |name: &str| {
        df.column(name).map_err(|_| StoreError::MissingColumn {
            column: name.to_string(),
        })
    };

    let dates = column("date")?
        .cast(&DataType::Int64)
        .map_err(|e| type_err("date", e))?;
    let dates = dates.i64().map_err(|e| type_err("date", e))?;
    let assets = column("asset_id")?;
    let assets = assets.str().map_err(|e| type_err("asset_id", e))?;

    let mut raw = Vec::with_capacity(RAW_NUMERIC.len());
    for name in RAW_NUMERIC {
        raw.push(column(name)?.f64().map_err(|e| type_err(name, e))?);
    }
    let mut derived = Vec::with_capacity(DERIVED.len());
    for name in DERIVED {
        derived.push(column(name)?.f64().map_err(|e| type_err(name, e))?);
    }

    let parse_err = |row: usize, name: &str| StoreError::Parse {
        row,
        column: name.to_string(),
        value: "null".to_string(),
    };

    (0..df.height())
        .map(|i| {
            let date = dates
                .get(i)
                .and_then(DateTime::from_timestamp_millis)
                .ok_or_else(|| parse_err(i, "date"))?;
            let asset_id = assets.get(i).ok_or_else(|| parse_err(i, "asset_id"))?;
            let raw_at = |k: usize| raw[k].get(i).ok_or_else(|| parse_err(i, RAW_NUMERIC[k]));
            let derived_at = |k: usize| FeatureValue::from(derived[k].get(i));

            Ok(FeatureRow {
                date,
                asset_id: asset_id.to_string(),
                price: raw_at(0)?,
                volume: raw_at(1)?,
                market_cap: raw_at(2)?,
                daily_return: derived_at(0),
                ma_7: derived_at(1),
                ma_30: derived_at(2),
                volatility_30d: derived_at(3),
                cumulative_return: derived_at(4),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<FeatureRow> {
        vec![
            FeatureRow {
                date: DateTime::from_timestamp_millis(1_704_067_200_123).unwrap(),
                asset_id: "bitcoin".into(),
                price: 0.0,
                volume: 1.0,
                market_cap: 2.0,
                daily_return: FeatureValue::Null,
                ma_7: FeatureValue::Finite(0.0),
                ma_30: FeatureValue::Finite(0.0),
                volatility_30d: FeatureValue::Null,
                cumulative_return: FeatureValue::Finite(1.0),
            },
            FeatureRow {
                date: DateTime::from_timestamp_millis(1_704_153_600_000).unwrap(),
                asset_id: "bitcoin".into(),
                price: 5.0,
                volume: 1.0,
                market_cap: 2.0,
                daily_return: FeatureValue::NonFinite(f64::INFINITY),
                ma_7: FeatureValue::Finite(2.5),
                ma_30: FeatureValue::Finite(2.5),
                volatility_30d: FeatureValue::Null,
                cumulative_return: FeatureValue::NonFinite(f64::INFINITY),
            },
        ]
    }

    #[test]
    fn dataframe_keeps_nulls_distinct_from_non_finite() {
        let df = rows_to_dataframe(&rows()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), COLUMNS.len());
        assert_eq!(df.column("daily_return").unwrap().null_count(), 1);

        let back = dataframe_to_rows(&df).unwrap();
        assert_eq!(back, rows());
    }

    #[test]
    fn missing_column_is_rejected() {
        let df = rows_to_dataframe(&rows()).unwrap().drop("ma_30").unwrap();
        match dataframe_to_rows(&df) {
            Err(StoreError::MissingColumn { column }) => assert_eq!(column, "ma_30"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }
}
