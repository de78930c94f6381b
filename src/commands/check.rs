//! Check command implementation.
//!
//! Validates runtime requirements and configuration, then takes one sample.

use std::sync::Arc;

use jstat_gcutil_exporter::{HealthStats, ScrapeOutcome};

use crate::commands::print_sample;
use crate::config::{validate_effective_config, Config};
use crate::startup_checks;
use crate::state::build_collector;

/// Validates requirements and configuration and runs one scrape.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 jstat GC Utilization Exporter - System Check");
    println!("===============================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n☕ Checking jstat and target JVM...");
    match startup_checks::validate_requirements(config) {
        Ok(_) => println!("   ✅ Runtime requirements met"),
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    println!("\n📊 Taking one sample...");
    let collector = build_collector(config, Arc::new(HealthStats::new()))?;
    println!("   Source: {}", collector.source());
    match collector.scrape() {
        ScrapeOutcome::Published(sample) => {
            println!("   ✅ Sample decoded ({:?} layout):", collector.layout());
            print_sample(&sample);
        }
        ScrapeOutcome::NoDataRow => {
            println!("   ⚠️  Output contained no data row, nothing to publish");
        }
        ScrapeOutcome::Failed(e) => {
            println!("   ❌ Scrape failed: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - exporter is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
