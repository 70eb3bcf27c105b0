use crate::error::ReportError;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Explain output as returned by the engine, headers included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Unindexed,
    Indexed,
}

impl IndexState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unindexed => "unindexed",
            Self::Indexed => "indexed",
        }
    }
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes one CSV file per (case, volume tier, index state)
#[derive(Debug, Clone)]
pub struct PlanWriter {
    dir: PathBuf,
}

impl PlanWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `tier` identifies the volume tier, e.g., `10000x50000`
    pub fn path(&self, case: &str, tier: &str, state: IndexState) -> PathBuf {
        self.dir.join(format!("{case}_{tier}_{state}.csv"))
    }

    pub fn write(
        &self,
        case: &str,
        tier: &str,
        state: IndexState,
        plan: &PlanSnapshot,
    ) -> Result<PathBuf, ReportError> {
        let path = self.path(case, tier, state);
        // explain rows may be ragged (e.g., sqlite detail rows), so don't enforce a width
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;

        writer.write_record(&plan.headers)?;
        for row in plan.rows.iter() {
            writer.write_record(row)?;
        }
        writer.flush()?;

        debug!(path = ?path, rows = plan.rows.len(), "Stored query plan");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_is_written_with_engine_headers() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PlanWriter::new(dir.path().join("plans")).unwrap();
        let plan = PlanSnapshot {
            headers: vec!["id".into(), "detail".into()],
            rows: vec![vec!["2".into(), "SCAN orders".into()]],
        };

        let path = writer
            .write("idx_ord_status", "1000x5000", IndexState::Unindexed, &plan)
            .unwrap();

        assert!(path.ends_with("idx_ord_status_1000x5000_unindexed.csv"));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "id,detail\n2,SCAN orders\n"
        );
    }

    #[test]
    fn rewriting_a_plan_replaces_it() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PlanWriter::new(dir.path()).unwrap();
        let plan = PlanSnapshot {
            headers: vec!["detail".into()],
            rows: vec![vec!["SEARCH orders USING INDEX idx".into()]],
        };

        writer.write("idx", "1x1", IndexState::Indexed, &plan).unwrap();
        let path = writer.write("idx", "1x1", IndexState::Indexed, &plan).unwrap();

        assert_eq!(
            fs::read_to_string(path).unwrap().lines().count(),
            2,
            "plan files are replaced, not appended"
        );
    }

    #[test]
    fn tiers_with_equal_order_counts_keep_separate_plans() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PlanWriter::new(dir.path()).unwrap();
        let plan = PlanSnapshot::default();

        let small = writer.write("idx", "100x500", IndexState::Indexed, &plan).unwrap();
        let large = writer.write("idx", "400x500", IndexState::Indexed, &plan).unwrap();

        assert_ne!(small, large);
        assert!(small.is_file() && large.is_file());
    }
}
