//! CSV encoding of the feature table.

use super::schema::{format_date, parse_date, COLUMNS};
use super::StoreError;
use crate::domain::{FeatureRow, FeatureValue};
use std::collections::HashMap;
use std::io::{Read, Write};

fn raw_cell(v: f64) -> String {
    FeatureValue::from_f64(v).to_cell()
}

pub fn write_rows<W: Write>(writer: W, rows: &[FeatureRow]) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(COLUMNS)?;

    for r in rows {
        wtr.write_record([
            format_date(&r.date),
            r.asset_id.clone(),
            raw_cell(r.price),
            raw_cell(r.volume),
            raw_cell(r.market_cap),
            r.daily_return.to_cell(),
            r.ma_7.to_cell(),
            r.ma_30.to_cell(),
            r.volatility_30d.to_cell(),
            r.cumulative_return.to_cell(),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<FeatureRow>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let position: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
    let mut index = [0usize; COLUMNS.len()];
    for (slot, name) in index.iter_mut().zip(COLUMNS) {
        *slot = *position.get(name).ok_or_else(|| StoreError::MissingColumn {
            column: name.to_string(),
        })?;
    }

    let mut rows = Vec::new();
    for (row_idx, record) in rdr.records().enumerate() {
        let record = record?;
        let cell = |col: usize| record.get(index[col]).unwrap_or("");
        let parse_err = |col: usize| StoreError::Parse {
            row: row_idx,
            column: COLUMNS[col].to_string(),
            value: cell(col).to_string(),
        };
        let derived = |col: usize| FeatureValue::parse_cell(cell(col)).map_err(|_| parse_err(col));
        let raw = |col: usize| match derived(col)? {
            FeatureValue::Null => Err(parse_err(col)),
            v => Ok(v.as_f64().unwrap_or(f64::NAN)),
        };

        rows.push(FeatureRow {
            date: parse_date(cell(0)).ok_or_else(|| parse_err(0))?,
            asset_id: cell(1).to_string(),
            price: raw(2)?,
            volume: raw(3)?,
            market_cap: raw(4)?,
            daily_return: derived(5)?,
            ma_7: derived(6)?,
            ma_30: derived(7)?,
            volatility_30d: derived(8)?,
            cumulative_return: derived(9)?,
        });
    }

    Ok(rows)
}
