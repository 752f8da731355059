/// Match table loading: CSV → (winner, loser) name pairs.
///
/// Cells are trimmed and rows with a blank or missing winner/loser are
/// skipped. Everything else (self-matches and so on) is left for the engine
/// to reject.
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, warn};
use std::io::Read;
use std::path::Path;

pub const DEFAULT_WINNER_COL: &str = "winner";
pub const DEFAULT_LOSER_COL: &str = "loser";

/// Which CSV column holds a field: a header name or a zero-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    Name(String),
    Index(usize),
}

impl ColumnSpec {
    /// Without a header row every column must be an index.
    pub fn parse(raw: &str, has_headers: bool) -> Result<Self> {
        let raw = raw.trim();
        match raw.parse::<usize>() {
            Ok(index) if !has_headers => Ok(ColumnSpec::Index(index)),
            _ if !has_headers => bail!("Column \"{raw}\" must be a zero-based index when the CSV has no header"),
            _ => Ok(ColumnSpec::Name(raw.to_string())),
        }
    }

    fn resolve(&self, headers: Option<&csv::StringRecord>) -> Result<usize> {
        match (self, headers) {
            (ColumnSpec::Index(i), _) => Ok(*i),
            (ColumnSpec::Name(name), Some(headers)) => headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow!("Column \"{name}\" not found in CSV header ({})", join(headers))),
            (ColumnSpec::Name(name), None) => bail!("Column \"{name}\" given by name but the CSV has no header"),
        }
    }
}

fn join(headers: &csv::StringRecord) -> String {
    headers.iter().collect::<Vec<_>>().join(", ")
}

/// Read (winner, loser) pairs from CSV data.
pub fn read_matches<R: Read>(
    reader: R,
    has_headers: bool,
    winner: &ColumnSpec,
    loser: &ColumnSpec,
) -> Result<Vec<(String, String)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = if has_headers {
        Some(rdr.headers().context("Failed to read CSV header")?.clone())
    } else {
        None
    };
    let winner_idx = winner.resolve(headers.as_ref())?;
    let loser_idx = loser.resolve(headers.as_ref())?;

    let mut pairs = Vec::new();
    let mut skipped = 0usize;

    for (row, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse CSV row {}", row + 1))?;
        match (record.get(winner_idx), record.get(loser_idx)) {
            (Some(w), Some(l)) if !w.is_empty() && !l.is_empty() => {
                pairs.push((w.to_string(), l.to_string()));
            }
            _ => {
                debug!("skipping CSV row {}: blank winner or loser", row + 1);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("skipped {skipped} rows with a blank winner or loser");
    }
    if pairs.is_empty() {
        bail!("No matches found in CSV");
    }
    Ok(pairs)
}

/// Read (winner, loser) pairs from a CSV file.
pub fn load_matches(
    path: &Path,
    has_headers: bool,
    winner: &ColumnSpec,
    loser: &ColumnSpec,
) -> Result<Vec<(String, String)>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_matches(file, has_headers, winner, loser)
        .with_context(|| format!("Failed to load matches from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn named(w: &str, l: &str) -> (ColumnSpec, ColumnSpec) {
        (ColumnSpec::Name(w.into()), ColumnSpec::Name(l.into()))
    }

    #[test]
    fn test_column_spec_parse() {
        assert_eq!(ColumnSpec::parse("winner", true).unwrap(), ColumnSpec::Name("winner".into()));
        assert_eq!(ColumnSpec::parse("2", true).unwrap(), ColumnSpec::Name("2".into()));
        assert_eq!(ColumnSpec::parse(" 1 ", false).unwrap(), ColumnSpec::Index(1));
        assert!(ColumnSpec::parse("winner", false).is_err());
    }

    #[test]
    fn test_reads_named_columns_in_any_order() {
        let data = "date,loser,winner\n2024-01-01, Bob ,Alice\n2024-01-02,Alice,Carol\n";
        let (w, l) = named("winner", "loser");
        let pairs = read_matches(data.as_bytes(), true, &w, &l).unwrap();
        assert_eq!(
            pairs,
            vec![("Alice".to_string(), "Bob".to_string()), ("Carol".to_string(), "Alice".to_string())]
        );
    }

    #[test]
    fn test_blank_rows_skipped() {
        let data = "winner,loser\nAlice,Bob\n,Bob\nCarol,\nBob\nCarol,Alice\n";
        let (w, l) = named("winner", "loser");
        let pairs = read_matches(data.as_bytes(), true, &w, &l).unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let data = "home,away\nAlice,Bob\n";
        let (w, l) = named("winner", "loser");
        let err = read_matches(data.as_bytes(), true, &w, &l).unwrap_err();
        assert!(err.to_string().contains("winner"));
    }

    #[test]
    fn test_no_rows_is_an_error() {
        let (w, l) = named("winner", "loser");
        assert!(read_matches("winner,loser\n".as_bytes(), true, &w, &l).is_err());
    }

    #[test]
    fn test_headerless_indices() {
        let data = "Alice,Bob\nBob,Carol\n";
        let pairs = read_matches(data.as_bytes(), false, &ColumnSpec::Index(0), &ColumnSpec::Index(1)).unwrap();
        assert_eq!(pairs[1], ("Bob".to_string(), "Carol".to_string()));

        let swapped = read_matches(data.as_bytes(), false, &ColumnSpec::Index(1), &ColumnSpec::Index(0)).unwrap();
        assert_eq!(swapped[0], ("Bob".to_string(), "Alice".to_string()));
    }

    #[test]
    fn test_self_match_rows_pass_through() {
        let (w, l) = named("winner", "loser");
        let pairs = read_matches("winner,loser\nAlice,Alice\n".as_bytes(), true, &w, &l).unwrap();
        assert_eq!(pairs, vec![("Alice".to_string(), "Alice".to_string())]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "winner,loser").unwrap();
        writeln!(file, "Alice,Bob").unwrap();
        file.flush().unwrap();

        let (w, l) = named("winner", "loser");
        let pairs = load_matches(file.path(), true, &w, &l).unwrap();
        assert_eq!(pairs.len(), 1);

        assert!(load_matches(Path::new("/definitely/not/here.csv"), true, &w, &l).is_err());
    }
}
