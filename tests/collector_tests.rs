//! Integration tests for the gcutil collector.
//!
//! These tests drive the collector through stub samplers and check the gauge
//! values, the scrape-scoped error handling and the exposition output.

use jstat_gcutil_exporter::{
    CollectorOptions, ColumnLayout, FileSampler, GcUtilCollector, GcUtilField, HealthStats,
    SampleError, Sampler, ScrapeError, ScrapeOutcome, StaticSampler,
};
use prometheus::{Encoder, Registry, TextEncoder};
use std::collections::{BTreeSet, VecDeque};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const SAMPLE: &str = "S0 S1 E O M CCS YGC YGCT FGC FGCT GCT\n0.00 50.00 10.50 20.25 95.10 93.00 5 0.050 1 0.200 0.250\n";
const LATER_SAMPLE: &str = "S0 S1 E O M CCS YGC YGCT FGC FGCT GCT\n25.00 0.00 60.00 21.00 95.20 93.10 6 0.061 1 0.200 0.261\n";

const EXPECTED_NAMES: [&str; 11] = [
    "jstat_s0",
    "jstat_s1",
    "jstat_eden",
    "jstat_old",
    "jstat_meta",
    "jstat_ccs",
    "jstat_ygc",
    "jstat_ygct",
    "jstat_fgc",
    "jstat_fgct",
    "jstat_gct",
];

/// Returns queued results in order, then repeats the last one.
struct ScriptedSampler {
    queue: Mutex<VecDeque<Result<String, SampleError>>>,
}

impl ScriptedSampler {
    fn new(results: Vec<Result<String, SampleError>>) -> Self {
        Self {
            queue: Mutex::new(results.into()),
        }
    }
}

impl Sampler for ScriptedSampler {
    fn sample(&self) -> Result<String, SampleError> {
        let mut queue = self.queue.lock().unwrap();
        if queue.len() > 1 {
            return queue.pop_front().unwrap();
        }
        match queue.front() {
            Some(Ok(text)) => Ok(text.clone()),
            _ => Err(timeout_error()),
        }
    }

    fn source(&self) -> String {
        "scripted".to_string()
    }
}

fn timeout_error() -> SampleError {
    SampleError::Timeout {
        path: PathBuf::from("/usr/bin/jstat"),
        timeout: Duration::from_secs(5),
    }
}

fn collector_with(sampler: impl Sampler + 'static, options: CollectorOptions) -> GcUtilCollector {
    GcUtilCollector::new(Box::new(sampler), options, Arc::new(HealthStats::new()))
        .expect("collector creation failed")
}

fn exposition(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .expect("encoding failed");
    String::from_utf8(buffer).expect("exposition is not UTF-8")
}

fn metric_names(text: &str) -> BTreeSet<String> {
    text.lines()
        .filter_map(|l| l.strip_prefix("# TYPE "))
        .filter_map(|l| l.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

#[test]
fn test_round_trip_legacy_layout() {
    let collector = collector_with(StaticSampler::new(SAMPLE), CollectorOptions::default());
    assert!(matches!(collector.scrape(), ScrapeOutcome::Published(_)));

    let m = collector.metrics();
    assert_eq!(m.s0.get(), 0.00);
    assert_eq!(m.s1.get(), 50.00);
    assert_eq!(m.eden.get(), 10.50);
    assert_eq!(m.old.get(), 20.25);
    assert_eq!(m.meta.get(), 95.10);
    // meta and ccs share field 4 in the legacy layout
    assert_eq!(m.ccs.get(), 95.10);
    assert_eq!(m.ygc.get(), 93.00);
    assert_eq!(m.ygct.get(), 5.0);
    assert_eq!(m.fgc.get(), 0.050);
    assert_eq!(m.fgct.get(), 1.0);
    assert_eq!(m.gct.get(), 0.200);
}

#[test]
fn test_round_trip_header_layout() {
    let options = CollectorOptions {
        layout: ColumnLayout::Header,
        ..Default::default()
    };
    let collector = collector_with(StaticSampler::new(SAMPLE), options);
    assert!(matches!(collector.scrape(), ScrapeOutcome::Published(_)));

    let m = collector.metrics();
    assert_eq!(m.meta.get(), 95.10);
    assert_eq!(m.ccs.get(), 93.00);
    assert_eq!(m.ygc.get(), 5.0);
    assert_eq!(m.ygct.get(), 0.050);
    assert_eq!(m.fgc.get(), 1.0);
    assert_eq!(m.fgct.get(), 0.200);
    assert_eq!(m.gct.get(), 0.250);
}

#[test]
fn test_header_only_output_keeps_prior_values() {
    let sampler = ScriptedSampler::new(vec![
        Ok(SAMPLE.to_string()),
        Ok("S0 S1 E O M CCS YGC YGCT FGC FGCT GCT\n".to_string()),
        Ok(String::new()),
    ]);
    let collector = collector_with(sampler, CollectorOptions::default());

    assert!(matches!(collector.scrape(), ScrapeOutcome::Published(_)));
    let before = collector.metrics().values();

    assert!(matches!(collector.scrape(), ScrapeOutcome::NoDataRow));
    assert_eq!(collector.metrics().values(), before);

    assert!(matches!(collector.scrape(), ScrapeOutcome::NoDataRow));
    assert_eq!(collector.metrics().values(), before);
}

#[test]
fn test_non_numeric_field_is_all_or_nothing() {
    let sampler = ScriptedSampler::new(vec![
        Ok(SAMPLE.to_string()),
        // Every field but the last one differs from SAMPLE
        Ok("h\n1 2 3 4 5 6 7 8 9 x\n".to_string()),
    ]);
    let collector = collector_with(sampler, CollectorOptions::default());

    collector.scrape();
    let before = collector.metrics().values();

    match collector.scrape() {
        ScrapeOutcome::Failed(ScrapeError::Parse(e)) => {
            assert!(e.to_string().contains("\"x\""), "unexpected error: {}", e);
        }
        other => panic!("expected parse failure, got {:?}", other),
    }
    assert_eq!(collector.metrics().values(), before);
}

#[test]
fn test_sample_failure_keeps_stale_values() {
    let sampler = ScriptedSampler::new(vec![Ok(SAMPLE.to_string()), Err(timeout_error())]);
    let health_stats = Arc::new(HealthStats::new());
    let collector = GcUtilCollector::new(
        Box::new(sampler),
        CollectorOptions::default(),
        health_stats.clone(),
    )
    .unwrap();

    collector.scrape();
    let before = collector.metrics().values();

    let outcome = collector.scrape();
    assert!(outcome.is_failure());
    assert!(matches!(outcome, ScrapeOutcome::Failed(ScrapeError::Sample(_))));
    assert_eq!(collector.metrics().values(), before);
    assert!(health_stats.last_scrape_failed());
    assert_eq!(health_stats.sample_failures.load(Ordering::Relaxed), 1);
}

#[test]
fn test_collect_twice_is_idempotent() {
    let collector = collector_with(StaticSampler::new(SAMPLE), CollectorOptions::default());
    let registry = Registry::new();
    registry.register(Box::new(collector.clone())).unwrap();

    let first = exposition(&registry);
    let first_values = collector.metrics().values();
    let second = exposition(&registry);

    assert_eq!(first, second);
    assert_eq!(first_values, collector.metrics().values());
}

#[test]
fn test_exposition_has_exactly_the_eleven_gauges() {
    let collector = collector_with(StaticSampler::new(SAMPLE), CollectorOptions::default());
    let registry = Registry::new();
    registry.register(Box::new(collector)).unwrap();

    let text = exposition(&registry);
    let expected: BTreeSet<String> = EXPECTED_NAMES.iter().map(|s| s.to_string()).collect();
    assert_eq!(metric_names(&text), expected);

    assert!(text.contains("# TYPE jstat_eden gauge"));
    assert!(text.contains("jstat_eden 10.5\n"));
    assert!(text.contains("jstat_s1 50\n"));
}

#[test]
fn test_no_series_before_first_success() {
    let sampler = ScriptedSampler::new(vec![Err(timeout_error()), Ok(SAMPLE.to_string())]);
    let collector = collector_with(sampler, CollectorOptions::default());
    let registry = Registry::new();
    registry.register(Box::new(collector.clone())).unwrap();

    let text = exposition(&registry);
    assert!(metric_names(&text).is_empty(), "unexpected output: {}", text);
    assert!(!collector.has_published());

    let text = exposition(&registry);
    assert_eq!(metric_names(&text).len(), 11);
    assert!(collector.has_published());
}

#[test]
fn test_telemetry_metrics_when_enabled() {
    let sampler = ScriptedSampler::new(vec![
        Ok(SAMPLE.to_string()),
        Ok("h\n1 2 3\n".to_string()),
    ]);
    let options = CollectorOptions {
        telemetry: true,
        ..Default::default()
    };
    let collector = collector_with(sampler, options);
    let registry = Registry::new();
    registry.register(Box::new(collector)).unwrap();

    let text = exposition(&registry);
    assert!(text.contains("gcutil_exporter_last_scrape_success 1\n"));
    assert!(text.contains("gcutil_exporter_scrape_errors_total{kind=\"parse\"} 0\n"));

    let text = exposition(&registry);
    assert!(text.contains("gcutil_exporter_last_scrape_success 0\n"));
    assert!(text.contains("gcutil_exporter_scrape_errors_total{kind=\"parse\"} 1\n"));
    assert!(text.contains("gcutil_exporter_scrape_errors_total{kind=\"sample\"} 0\n"));
    // Stale gauges are still exported after the failed scrape
    assert!(text.contains("jstat_eden 10.5\n"));
}

#[test]
fn test_file_sampler_picks_up_new_content() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", SAMPLE).unwrap();

    let collector = collector_with(FileSampler::new(file.path()), CollectorOptions::default());
    collector.scrape();
    assert_eq!(collector.metrics().gauge(GcUtilField::Eden).get(), 10.50);

    std::fs::write(file.path(), LATER_SAMPLE).unwrap();
    collector.scrape();
    assert_eq!(collector.metrics().gauge(GcUtilField::Eden).get(), 60.00);
}

/// Records how many samples run at the same time.
struct SlowSampler {
    in_flight: AtomicUsize,
    max_in_flight: Arc<AtomicUsize>,
}

impl Sampler for SlowSampler {
    fn sample(&self) -> Result<String, SampleError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(SAMPLE.to_string())
    }

    fn source(&self) -> String {
        "slow".to_string()
    }
}

#[test]
fn test_concurrent_scrapes_are_serialized() {
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let sampler = SlowSampler {
        in_flight: AtomicUsize::new(0),
        max_in_flight: max_in_flight.clone(),
    };
    let collector = collector_with(sampler, CollectorOptions::default());
    let registry = Arc::new(Registry::new());
    registry.register(Box::new(collector.clone())).unwrap();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || exposition(&registry))
        })
        .collect();

    for h in handles {
        let text = h.join().unwrap();
        assert_eq!(metric_names(&text).len(), 11);
    }

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
}

/// Blocks inside `sample()` until `hold` has elapsed.
struct StallingSampler {
    hold: Duration,
}

impl Sampler for StallingSampler {
    fn sample(&self) -> Result<String, SampleError> {
        thread::sleep(self.hold);
        Ok(SAMPLE.to_string())
    }

    fn source(&self) -> String {
        "stalling".to_string()
    }
}

#[test]
fn test_has_published_does_not_wait_for_running_scrape() {
    let health_stats = Arc::new(HealthStats::new());
    let collector = GcUtilCollector::new(
        Box::new(StallingSampler {
            hold: Duration::from_secs(2),
        }),
        CollectorOptions::default(),
        health_stats.clone(),
    )
    .unwrap();

    let scraping = collector.clone();
    let handle = thread::spawn(move || scraping.scrape());
    thread::sleep(Duration::from_millis(100));

    let start = std::time::Instant::now();
    let published = collector.has_published();
    let waited = start.elapsed();

    assert!(!published);
    assert!(
        waited < Duration::from_millis(500),
        "has_published() blocked for {:?}",
        waited
    );
    // Reading the flag is not a lock acquisition
    assert!(health_stats.lock_wait_duration_ms.snapshot().max < 500.0);

    assert!(matches!(handle.join().unwrap(), ScrapeOutcome::Published(_)));
    assert!(collector.has_published());
}
