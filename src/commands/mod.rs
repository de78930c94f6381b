//! CLI command implementations for jstat-gcutil-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Runtime requirement validation plus one sample
//! - `config`: Configuration file generation
//! - `test`: Repeated scrape cycles with decoded values

pub mod check;
pub mod config;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;

use jstat_gcutil_exporter::GcUtilSample;

/// Prints a decoded sample as a two-column table.
pub(crate) fn print_sample(sample: &GcUtilSample) {
    for (field, value) in sample.iter() {
        println!("      jstat_{:<6} {:>12.3}", field.name(), value);
    }
}
