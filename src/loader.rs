use crate::error::ReportError;
use crate::types::RawTable;
use csv::{ReaderBuilder, Trim};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Read a delimited table with a header row.
///
/// Cells are kept as text exactly as written (headers are trimmed). Records
/// shorter than the header are padded with blank cells and longer ones are
/// cut, so a ragged line never stops the load. Invalid UTF-8 is replaced
/// rather than rejected for the same reason.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable, ReportError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ReportError::MissingHeader);
    }

    let width = headers.len();
    let mut records = Vec::new();
    let mut ragged = 0usize;
    for result in rdr.byte_records() {
        let record = result?;
        if record.len() != width {
            ragged += 1;
        }
        let mut cells: Vec<String> = record
            .iter()
            .take(width)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect();
        cells.resize(width, String::new());
        records.push(cells);
    }
    if ragged > 0 {
        warn!(ragged, width, "records with a different field count than the header were padded or cut");
    }
    Ok(RawTable::new(headers, records))
}

pub fn load_table(path: &Path) -> Result<RawTable, ReportError> {
    let file = File::open(path)?;
    let table = read_table(file)?;
    info!(path = %path.display(), rows = table.len(), columns = table.headers.len(), "loaded table");
    Ok(table)
}

/// Most recently modified `.csv` file directly inside `dir`.
pub fn latest_csv_in(dir: &Path) -> Result<PathBuf, ReportError> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv || !entry.file_type()?.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        debug!(path = %path.display(), "candidate input");
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }
    newest
        .map(|(_, path)| path)
        .ok_or_else(|| ReportError::NoInputFound(dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_cells_verbatim() {
        let table = read_table(" Likes , Impressions\n 3 ,10\n".as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Likes", "Impressions"]);
        assert_eq!(table.records, vec![vec![" 3 ".to_string(), "10".to_string()]]);
        let record = table.record(0).unwrap();
        assert_eq!(record.get("Impressions"), Some("10"));
        assert_eq!(record.get("Views"), None);
        assert!(table.record(1).is_none());
    }

    #[test]
    fn ragged_records_are_padded_or_cut() {
        let table = read_table("a,b,c\n1\n1,2,3,4\n".as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0], vec!["1", "", ""]);
        assert_eq!(table.records[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = read_table("".as_bytes()).unwrap_err();
        assert!(matches!(err, ReportError::MissingHeader));
    }

    #[test]
    fn header_only_is_an_empty_table() {
        let table = read_table("likes,impressions\n".as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("engagement-report-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn latest_csv_picks_newest_and_skips_others() {
        let dir = scratch_dir("latest");
        fs::write(dir.join("a.csv"), "likes\n1\n").unwrap();
        fs::write(dir.join("b.CSV"), "likes\n2\n").unwrap();
        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(120);
        File::options()
            .write(true)
            .open(dir.join("b.CSV"))
            .unwrap()
            .set_modified(later)
            .unwrap();
        fs::write(dir.join("notes.txt"), "not a table").unwrap();
        fs::create_dir(dir.join("x.csv")).unwrap();

        let picked = latest_csv_in(&dir).unwrap();
        assert_eq!(picked.file_name().and_then(|n| n.to_str()), Some("b.CSV"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn directory_without_csv_is_no_input() {
        let dir = scratch_dir("no-csv");
        fs::write(dir.join("notes.txt"), "not a table").unwrap();

        let err = latest_csv_in(&dir).unwrap_err();
        assert!(matches!(err, ReportError::NoInputFound(ref p) if p == &dir));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = latest_csv_in(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }
}
