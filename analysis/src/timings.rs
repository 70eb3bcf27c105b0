use crate::{error::ReportError, stats::Measurement};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};
use tracing::debug;

/// Append-only CSV timing series, one file per index case
#[derive(Debug, Clone)]
pub struct TimingLog {
    dir: PathBuf,
}

impl TimingLog {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, case: &str) -> PathBuf {
        self.dir.join(format!("{case}.csv"))
    }

    /// append a single row, the header is only written when the file is new or empty
    pub fn append(&self, case: &str, measurement: &Measurement) -> Result<(), ReportError> {
        let path = self.path(case);
        let write_header = fs::metadata(&path)
            .map(|metadata| metadata.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);

        writer.serialize(measurement)?;
        writer.flush()?;

        debug!(path = ?path, "Appended timing row");

        Ok(())
    }

    pub fn read(&self, case: &str) -> Result<Vec<Measurement>, ReportError> {
        csv::Reader::from_path(self.path(case))?
            .deserialize()
            .collect::<Result<Vec<_>, _>>()
            .map_err(ReportError::from)
    }

    /// names of all cases with a timing file, sorted
    pub fn cases(&self) -> Result<Vec<String>, ReportError> {
        let mut cases = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();

            if path.extension().is_some_and(|extension| extension == "csv") {
                if let Some(stem) = path.file_stem() {
                    cases.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        cases.sort();

        Ok(cases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = TimingLog::new(dir.path().join("timings")).unwrap();

        log.append("idx_a", &Measurement::new("1,000 orders", 0.2, 0.1))
            .unwrap();
        log.append("idx_a", &Measurement::new("2,000 orders", 0.4, 0.1))
            .unwrap();

        let content = fs::read_to_string(log.path("idx_a")).unwrap();
        let lines = content.lines().collect_vec();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "volume,unindexed_s,indexed_s,improvement_pct");
        assert!(lines[1].starts_with("\"1,000 orders\",0.2,0.1,"));
    }

    #[test]
    fn rows_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = TimingLog::new(dir.path()).unwrap();

        log.append("idx_b", &Measurement::new("small", 1.0, 0.5))
            .unwrap();
        log.append("idx_b", &Measurement::new("large", 2.0, 0.5))
            .unwrap();

        let rows = log.read("idx_b").unwrap();

        assert_eq!(
            rows.iter().map(|row| row.volume.as_str()).collect_vec(),
            ["small", "large"]
        );
        assert_eq!(rows[1].improvement, 75.0);
    }

    #[test]
    fn cases_lists_csv_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let log = TimingLog::new(dir.path()).unwrap();

        log.append("idx_z", &Measurement::new("v", 1.0, 1.0)).unwrap();
        log.append("idx_a", &Measurement::new("v", 1.0, 1.0)).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(log.cases().unwrap(), ["idx_a", "idx_z"]);
    }
}
