use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One row of the time series
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub category: String,
    pub year: i32,
    pub count: f64,
}

#[derive(Debug, Deserialize)]
struct Row {
    country: String,
    year: String,
    counts: String,
}

/// Four-digit year
fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

fn parse_count(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|c| c.is_finite())
}

/// Parse `country,year,counts` CSV. The first malformed row is an error.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for result in rdr.deserialize::<Row>() {
        let row = result.context("Malformed CSV row")?;
        // Header is line 1
        let line = records.len() + 2;
        let year = parse_year(&row.year)
            .ok_or_else(|| anyhow!("line {line}: unparseable year {:?}", row.year))?;
        let count = parse_count(&row.counts)
            .ok_or_else(|| anyhow!("line {line}: non-numeric count {:?}", row.counts))?;
        records.push(Record {
            category: row.country,
            year,
            count,
        });
    }

    Ok(records)
}

pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    parse_records(file).with_context(|| format!("Failed to load {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows() {
        let csv = "country,year,counts\nIraq,2013,10\nSyria,2014, 3\n";
        let records = parse_records(csv.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                Record { category: "Iraq".into(), year: 2013, count: 10.0 },
                Record { category: "Syria".into(), year: 2014, count: 3.0 },
            ]
        );
    }

    #[test]
    fn test_bad_count_names_line() {
        let csv = "country,year,counts\nIraq,2013,10\nSyria,2014,many\n";
        let err = parse_records(csv.as_bytes()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 3"), "{msg}");
        assert!(msg.contains("many"), "{msg}");
    }

    #[test]
    fn test_bad_year_rejected() {
        let csv = "country,year,counts\nIraq,13,10\n";
        assert!(parse_records(csv.as_bytes()).is_err());
        let csv = "country,year,counts\nIraq,20x3,10\n";
        assert!(parse_records(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_column_rejected() {
        let csv = "country,year\nIraq,2013\n";
        assert!(parse_records(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_records(Path::new("/nonexistent/linechart.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("linechart.csv"));
    }
}
