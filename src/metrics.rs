//! Prometheus metric definitions for jstat-gcutil-exporter.
//!
//! `GcUtilMetrics` holds the eleven `jstat_*` gauges that mirror one gcutil
//! sample. `ExporterTelemetry` holds the optional self metrics describing the
//! scrapes themselves.

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, IntCounterVec, Opts};

use crate::gcutil::{GcUtilField, GcUtilSample, FIELD_COUNT, NAMESPACE};

/// The published GC utilization gauges, one per [`GcUtilField`].
#[derive(Clone)]
pub struct GcUtilMetrics {
    pub s0: Gauge,
    pub s1: Gauge,
    pub eden: Gauge,
    pub old: Gauge,
    pub meta: Gauge,
    pub ccs: Gauge,
    pub ygc: Gauge,
    pub ygct: Gauge,
    pub fgc: Gauge,
    pub fgct: Gauge,
    pub gct: Gauge,
}

fn gauge(field: GcUtilField) -> prometheus::Result<Gauge> {
    Gauge::with_opts(Opts::new(field.name(), field.help()).namespace(NAMESPACE))
}

impl GcUtilMetrics {
    /// Creates all gauges. They start at zero and are not registered anywhere;
    /// the collector exposes them.
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            s0: gauge(GcUtilField::S0)?,
            s1: gauge(GcUtilField::S1)?,
            eden: gauge(GcUtilField::Eden)?,
            old: gauge(GcUtilField::Old)?,
            meta: gauge(GcUtilField::Meta)?,
            ccs: gauge(GcUtilField::Ccs)?,
            ygc: gauge(GcUtilField::Ygc)?,
            ygct: gauge(GcUtilField::Ygct)?,
            fgc: gauge(GcUtilField::Fgc)?,
            fgct: gauge(GcUtilField::Fgct)?,
            gct: gauge(GcUtilField::Gct)?,
        })
    }

    pub fn gauge(&self, field: GcUtilField) -> &Gauge {
        match field {
            GcUtilField::S0 => &self.s0,
            GcUtilField::S1 => &self.s1,
            GcUtilField::Eden => &self.eden,
            GcUtilField::Old => &self.old,
            GcUtilField::Meta => &self.meta,
            GcUtilField::Ccs => &self.ccs,
            GcUtilField::Ygc => &self.ygc,
            GcUtilField::Ygct => &self.ygct,
            GcUtilField::Fgc => &self.fgc,
            GcUtilField::Fgct => &self.fgct,
            GcUtilField::Gct => &self.gct,
        }
    }

    /// Assigns every value of a decoded sample, in publish order.
    pub fn publish(&self, sample: &GcUtilSample) {
        for (field, value) in sample.iter() {
            self.gauge(field).set(value);
        }
    }

    /// Current gauge values, in publish order.
    pub fn values(&self) -> [f64; FIELD_COUNT] {
        GcUtilField::ALL.map(|f| self.gauge(f).get())
    }

    pub fn descs(&self) -> Vec<&Desc> {
        GcUtilField::ALL
            .iter()
            .flat_map(|f| self.gauge(*f).desc())
            .collect()
    }

    pub fn families(&self) -> Vec<MetricFamily> {
        GcUtilField::ALL
            .iter()
            .flat_map(|f| self.gauge(*f).collect())
            .collect()
    }
}

/// Self metrics about scrape cycles, exported only when telemetry is enabled.
#[derive(Clone)]
pub struct ExporterTelemetry {
    pub scrape_duration: Gauge,
    pub last_scrape_success: Gauge,
    pub scrape_errors_total: IntCounterVec,
}

impl ExporterTelemetry {
    pub fn new() -> prometheus::Result<Self> {
        let scrape_duration = Gauge::new(
            "gcutil_exporter_scrape_duration_seconds",
            "Time spent sampling and decoding jstat output in the last scrape",
        )?;
        let last_scrape_success = Gauge::new(
            "gcutil_exporter_last_scrape_success",
            "Whether the last scrape published a sample (1) or failed (0)",
        )?;
        let scrape_errors_total = IntCounterVec::new(
            Opts::new(
                "gcutil_exporter_scrape_errors_total",
                "Total scrape failures by kind (sample, parse)",
            ),
            &["kind"],
        )?;
        for kind in ["sample", "parse"] {
            scrape_errors_total.with_label_values(&[kind]);
        }

        Ok(Self {
            scrape_duration,
            last_scrape_success,
            scrape_errors_total,
        })
    }

    pub fn descs(&self) -> Vec<&Desc> {
        let mut descs = self.scrape_duration.desc();
        descs.extend(self.last_scrape_success.desc());
        descs.extend(self.scrape_errors_total.desc());
        descs
    }

    pub fn families(&self) -> Vec<MetricFamily> {
        let mut families = self.scrape_duration.collect();
        families.extend(self.last_scrape_success.collect());
        families.extend(self.scrape_errors_total.collect());
        families
    }
}
