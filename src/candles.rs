//! OHLCV candle ingestion for the backtest simulator (Section 4.7 input).
//!
//! Follows this codebase's usual CSV-parsing style (`ReaderBuilder`,
//! `reader.deserialize()`, tolerant-of-malformed-row skipping) adapted to
//! `Candle` rows instead of orderbook/trade rows.

use crate::error::{CoreError, Result};
use crate::types::Candle;
use csv::ReaderBuilder;
use std::path::Path;
use tracing::warn;

/// Parse a candle CSV file (columns: `ts,open,high,low,close,volume`).
/// Malformed rows are logged and skipped rather than aborting the whole load
/// — a single bad line in a multi-month candle file shouldn't sink the run.
pub fn load_candles<P: AsRef<Path>>(path: P) -> Result<Vec<Candle>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut candles = Vec::new();
    for (line, result) in reader.deserialize::<Candle>().enumerate() {
        match result {
            Ok(candle) => candles.push(candle),
            Err(e) => {
                warn!(line = line + 2, error = %e, "skipping malformed candle row");
                continue;
            }
        }
    }

    if candles.is_empty() {
        return Err(CoreError::InvalidParameters("candle file produced zero usable rows".into()));
    }

    validate_monotone(&candles)?;
    Ok(candles)
}

/// Timestamps must be non-decreasing; out-of-order candles would break the
/// tick simulator's sequencing assumptions.
fn validate_monotone(candles: &[Candle]) -> Result<()> {
    for w in candles.windows(2) {
        if w[1].ts < w[0].ts {
            return Err(CoreError::InvalidParameters(format!(
                "candle timestamps out of order: {} followed by {}",
                w[0].ts, w[1].ts
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    struct TempCsv {
        path: PathBuf,
    }

    impl TempCsv {
        fn new(contents: &str) -> Self {
            let id = COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut path = std::env::temp_dir();
            path.push(format!("glft_candles_test_{}_{}.csv", std::process::id(), id));
            let mut f = File::create(&path).unwrap();
            f.write_all(contents.as_bytes()).unwrap();
            Self { path }
        }
    }

    impl Drop for TempCsv {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    #[test]
    fn parses_well_formed_rows() {
        let csv = "ts,open,high,low,close,volume\n0,100.0,101.0,99.0,100.5,10.0\n1,100.5,102.0,100.0,101.5,12.0\n";
        let tmp = TempCsv::new(csv);
        let candles = load_candles(&tmp.path).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, 101.5);
    }

    #[test]
    fn skips_malformed_rows_without_aborting() {
        let csv = "ts,open,high,low,close,volume\n0,100.0,101.0,99.0,100.5,10.0\nnot,a,valid,row,at,all\n1,100.5,102.0,100.0,101.5,12.0\n";
        let tmp = TempCsv::new(csv);
        let candles = load_candles(&tmp.path).unwrap();
        assert_eq!(candles.len(), 2);
    }

    #[test]
    fn rejects_out_of_order_timestamps() {
        let csv = "ts,open,high,low,close,volume\n5,100.0,101.0,99.0,100.5,10.0\n1,100.5,102.0,100.0,101.5,12.0\n";
        let tmp = TempCsv::new(csv);
        assert!(load_candles(&tmp.path).is_err());
    }

    #[test]
    fn empty_file_is_an_error() {
        let csv = "ts,open,high,low,close,volume\n";
        let tmp = TempCsv::new(csv);
        assert!(load_candles(&tmp.path).is_err());
    }
}
