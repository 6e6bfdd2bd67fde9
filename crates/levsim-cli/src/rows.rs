use anyhow::{Context, Result};
use levsim_broker::MarketRow;

/// Market rows plus the optional per-row action column pulled out of them.
#[derive(Debug, Clone)]
pub struct LoadedRows {
    pub rows: Vec<MarketRow>,
    pub actions: Option<Vec<f64>>,
}

pub fn load_rows_csv(path: &str, action_column: Option<&str>) -> Result<LoadedRows> {
    let rdr = csv::Reader::from_path(path).with_context(|| format!("open rows csv: {path}"))?;
    read_rows(rdr, action_column).with_context(|| format!("read rows csv: {path}"))
}

/// Every column whose cell parses as a float becomes a market field.
/// Non-numeric cells (timestamps, symbols) are skipped per row.
pub fn read_rows<R: std::io::Read>(
    mut rdr: csv::Reader<R>,
    action_column: Option<&str>,
) -> Result<LoadedRows> {
    let headers = rdr.headers().context("read csv header")?.clone();
    let action_idx = match action_column {
        Some(col) => Some(
            headers
                .iter()
                .position(|h| h.trim() == col)
                .with_context(|| format!("csv missing action column '{col}'"))?,
        ),
        None => None,
    };

    let mut rows = Vec::new();
    let mut actions = Vec::new();
    for (n, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("csv row {}", n + 1))?;
        let mut row = MarketRow::default();
        for (i, (name, cell)) in headers.iter().zip(rec.iter()).enumerate() {
            let value = cell.trim().parse::<f64>().ok();
            if Some(i) == action_idx {
                // Unparseable action cells decode as hold downstream.
                actions.push(value.unwrap_or(f64::NAN));
                continue;
            }
            if let Some(v) = value {
                row.insert(name.trim(), v);
            }
        }
        rows.push(row);
    }

    Ok(LoadedRows {
        rows,
        actions: action_idx.map(|_| actions),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(text.as_bytes())
    }

    #[test]
    fn numeric_columns_become_fields() {
        let loaded = read_rows(reader("ts,close,SMA5\n2024-01-01,100.5,99\n"), None).unwrap();
        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.rows[0].get("close"), Some(100.5));
        assert_eq!(loaded.rows[0].get("SMA5"), Some(99.0));
        assert_eq!(loaded.rows[0].get("ts"), None);
        assert!(loaded.actions.is_none());
    }

    #[test]
    fn action_column_is_split_out() {
        let loaded = read_rows(reader("close,action\n100,0\n101,x\n"), Some("action")).unwrap();
        assert_eq!(loaded.rows[0].get("action"), None);
        let actions = loaded.actions.unwrap();
        assert_eq!(actions[0], 0.0);
        assert!(actions[1].is_nan());
    }

    #[test]
    fn missing_action_column_is_an_error() {
        let err = read_rows(reader("close\n100\n"), Some("action")).unwrap_err();
        assert!(err.to_string().contains("action"));
    }
}
