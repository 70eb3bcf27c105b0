use crate::{
    cases::{IndexCase, Probe},
    config::Volume,
    database::{ConnectionAdapters, ConnectionError},
};
use idxbench_analysis::{
    mean_excluding_warmup, IndexState, Measurement, PlanWriter, ReportError, TimingLog,
};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Failed to store benchmark artifacts: {0}")]
    Report(#[from] ReportError),
    #[error("At least two timed runs are required, got {0}")]
    TooFewRuns(usize),
}

/// Times index cases against the currently loaded data set and records the results
pub struct Harness<'a> {
    connection: &'a mut ConnectionAdapters,
    runs: usize,
    timings: &'a TimingLog,
    plans: &'a PlanWriter,
}

impl<'a> Harness<'a> {
    pub fn new(
        connection: &'a mut ConnectionAdapters,
        runs: usize,
        timings: &'a TimingLog,
        plans: &'a PlanWriter,
    ) -> Self {
        Self {
            connection,
            runs,
            timings,
            plans,
        }
    }

    /// Benchmark one case on one volume tier.
    ///
    /// Failures are logged and yield `None`, the index is dropped afterwards
    /// in every case.
    #[instrument(skip_all, fields(case = %case.name, orders = volume.orders), level = "info")]
    pub fn measure(&mut self, case: &IndexCase, volume: &Volume) -> Option<Measurement> {
        let result = self.run_case(case, volume);

        match self.drop_index(case) {
            Err(error) => error!(error = ?error, "Failed to drop index {}: {error}", case.name),
            Ok(()) => {
                if let Ok(true) = self.connection.index_exists(&case.table, &case.name) {
                    warn!("Index {} is still present after dropping it", case.name);
                }
            }
        }

        let result = result.and_then(|measurement| {
            self.timings.append(&case.name, &measurement)?;
            Ok(measurement)
        });

        match result {
            Ok(measurement) => {
                info!(
                    unindexed = measurement.unindexed,
                    indexed = measurement.indexed,
                    "{} on {}: {:.2}% improvement",
                    case.label(),
                    measurement.volume,
                    measurement.improvement
                );

                Some(measurement)
            }
            Err(HarnessError::Connection(error @ ConnectionError::UnsupportedIndex { .. })) => {
                warn!("Skipping {}: {error}", case.name);

                None
            }
            Err(error) => {
                error!(error = ?error, "Case {} failed on {}: {error}", case.name, volume.label());

                None
            }
        }
    }

    fn run_case(&mut self, case: &IndexCase, volume: &Volume) -> Result<Measurement, HarnessError> {
        let create = case.create_statement(self.connection.dialect())?;

        self.drop_index(case)?;

        let unindexed = self.time_probe(case.probe_for(IndexState::Unindexed))?;
        self.capture_plan(case, volume, IndexState::Unindexed)?;

        self.connection.execute(&create)?;
        debug!(statement = %create, "Created index");

        let indexed = self.time_probe(case.probe_for(IndexState::Indexed))?;
        self.capture_plan(case, volume, IndexState::Indexed)?;

        Ok(Measurement::new(volume.label(), unindexed, indexed))
    }

    /// a missing index is fine, anything else is reported
    fn drop_index(&mut self, case: &IndexCase) -> Result<(), ConnectionError> {
        let statement = case.drop_statement(self.connection.dialect());

        match self.connection.execute(&statement) {
            Ok(_) => {
                debug!(statement = %statement, "Dropped index");
                Ok(())
            }
            Err(error) if error.is_missing_index() => Ok(()),
            Err(error) => Err(error),
        }
    }

    /// mean seconds of the timed runs, the priming run and the first timed run are left out
    fn time_probe(&mut self, probe: &Probe) -> Result<f64, HarnessError> {
        if self.runs < 2 {
            return Err(HarnessError::TooFewRuns(self.runs));
        }

        self.connection.fetch_all(probe)?;

        let mut samples = Vec::with_capacity(self.runs);
        let mut rows = 0;
        for _ in 0..self.runs {
            let start = Instant::now();
            rows = self.connection.fetch_all(probe)?;
            samples.push(start.elapsed());
        }

        let mean = mean_excluding_warmup(&samples).ok_or(HarnessError::TooFewRuns(self.runs))?;
        debug!(rows, mean, "Timed probe");

        Ok(mean)
    }

    fn capture_plan(
        &mut self,
        case: &IndexCase,
        volume: &Volume,
        state: IndexState,
    ) -> Result<(), HarnessError> {
        let plan = self.connection.explain(case.probe_for(state))?;
        self.plans.write(&case.name, &volume.key(), state, &plan)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cases::IndexKind,
        config::ConnectionConfig,
        database::Param,
        generator::{populate, Generator},
        schema,
    };
    use idxbench_analysis::improvement_percent;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        connection: ConnectionAdapters,
        timings: TimingLog,
        plans: PlanWriter,
        _dir: TempDir,
    }

    fn fixture(volume: &Volume) -> Fixture {
        let mut connection = ConnectionAdapters::load(&ConnectionConfig::SQLite {
            path: PathBuf::from(":memory:"),
        })
        .unwrap();
        schema::reset_schema(&mut connection).unwrap();
        populate(
            &mut connection,
            &mut Generator::new(Some(5)),
            volume.customers,
            volume.orders,
            1000,
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();

        Fixture {
            connection,
            timings: TimingLog::new(dir.path().join("timings")).unwrap(),
            plans: PlanWriter::new(dir.path().join("plans")).unwrap(),
            _dir: dir,
        }
    }

    fn default_case(name: &str) -> IndexCase {
        IndexCase::defaults()
            .into_iter()
            .find(|case| case.name == name)
            .unwrap()
    }

    #[test]
    fn measure_records_timing_and_plans() {
        let volume = Volume::new(200, 1000);
        let mut fixture = fixture(&volume);
        let case = default_case("idx_ord_status");

        let measurement = Harness::new(&mut fixture.connection, 3, &fixture.timings, &fixture.plans)
            .measure(&case, &volume)
            .unwrap();

        assert_eq!(measurement.volume, "1,000 orders");
        assert_eq!(
            fixture.timings.read("idx_ord_status").unwrap(),
            [measurement]
        );
        for state in [IndexState::Unindexed, IndexState::Indexed] {
            assert!(fixture.plans.path("idx_ord_status", "200x1000", state).is_file());
        }

        let indexed_plan =
            std::fs::read_to_string(fixture.plans.path("idx_ord_status", "200x1000", IndexState::Indexed))
                .unwrap();
        assert!(indexed_plan.contains("idx_ord_status"));

        assert!(!fixture
            .connection
            .index_exists("orders", "idx_ord_status")
            .unwrap());
    }

    #[test]
    fn index_is_dropped_after_a_failed_case() {
        let volume = Volume::new(50, 100);
        let mut fixture = fixture(&volume);
        let case = IndexCase::new(
            "idx_broken",
            "orders",
            &["total"],
            IndexKind::BTree,
            Probe::new("select * from orders where total > ?", vec![Param::Int(10)]),
        )
        .with_indexed_probe(Probe::new("select * from no_such_table", vec![]));

        let result = Harness::new(&mut fixture.connection, 2, &fixture.timings, &fixture.plans)
            .measure(&case, &volume);

        assert!(result.is_none());
        assert!(!fixture
            .connection
            .index_exists("orders", "idx_broken")
            .unwrap());
        assert!(!fixture.timings.path("idx_broken").exists());
    }

    #[test]
    fn tiers_with_equal_order_counts_keep_their_plans() {
        let small = Volume::new(100, 500);
        let large = Volume::new(400, 500);
        let mut fixture = fixture(&small);
        let case = default_case("idx_cust_email");

        Harness::new(&mut fixture.connection, 2, &fixture.timings, &fixture.plans)
            .measure(&case, &small)
            .unwrap();
        populate(
            &mut fixture.connection,
            &mut Generator::new(Some(6)),
            large.customers,
            large.orders,
            1000,
        )
        .unwrap();
        Harness::new(&mut fixture.connection, 2, &fixture.timings, &fixture.plans)
            .measure(&case, &large)
            .unwrap();

        let plans = std::fs::read_dir(fixture.plans.dir()).unwrap().count();
        assert_eq!(plans, 4);
        for volume in [small, large] {
            for state in [IndexState::Unindexed, IndexState::Indexed] {
                assert!(fixture
                    .plans
                    .path("idx_cust_email", &volume.key(), state)
                    .is_file());
            }
        }
    }

    #[test]
    fn leftover_index_is_replaced() {
        let volume = Volume::new(50, 100);
        let mut fixture = fixture(&volume);
        let case = default_case("idx_ord_total");
        fixture
            .connection
            .execute("create index idx_ord_total on orders(total)")
            .unwrap();

        let result = Harness::new(&mut fixture.connection, 2, &fixture.timings, &fixture.plans)
            .measure(&case, &volume);

        assert!(result.is_some());
        assert!(!fixture
            .connection
            .index_exists("orders", "idx_ord_total")
            .unwrap());
    }

    #[test]
    fn unsupported_kinds_are_skipped() {
        let volume = Volume::new(50, 100);
        let mut fixture = fixture(&volume);
        let mut harness =
            Harness::new(&mut fixture.connection, 2, &fixture.timings, &fixture.plans);

        assert!(harness
            .measure(&default_case("idx_ord_status_hash"), &volume)
            .is_none());
        assert!(harness
            .measure(&default_case("idx_ord_desc"), &volume)
            .is_none());

        assert!(fixture.timings.cases().unwrap().is_empty());
    }

    #[test]
    fn single_run_is_rejected() {
        let volume = Volume::new(50, 100);
        let mut fixture = fixture(&volume);

        let result = Harness::new(&mut fixture.connection, 1, &fixture.timings, &fixture.plans)
            .measure(&default_case("idx_ord_status"), &volume);

        assert!(result.is_none());
        assert!(!fixture
            .connection
            .index_exists("orders", "idx_ord_status")
            .unwrap());
    }

    #[test]
    fn end_to_end_on_one_tier() {
        let volume = Volume::new(1000, 5000);
        let mut fixture = fixture(&volume);
        let cases = IndexCase::defaults();

        let mut harness =
            Harness::new(&mut fixture.connection, 3, &fixture.timings, &fixture.plans);
        let measured = cases
            .iter()
            .filter_map(|case| harness.measure(case, &volume))
            .count();

        assert_eq!(measured, 5);
        assert_eq!(fixture.connection.count("orders").unwrap(), 5000);

        let rows = fixture.timings.read("idx_cust_email").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].improvement,
            improvement_percent(rows[0].unindexed, rows[0].indexed)
        );

        for case in cases.iter() {
            assert!(!fixture
                .connection
                .index_exists(&case.table, &case.name)
                .unwrap());
        }
    }
}
