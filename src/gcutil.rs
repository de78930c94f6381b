//! Decoding of `jstat -gcutil` output.
//!
//! jstat prints one header line followed by data rows of whitespace separated
//! columns. Only the first data row is decoded. The mapping from columns to
//! metric slots is an explicit [`ColumnSchema`], checked against the number of
//! fields before any value is read.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Metric namespace for all GC utilization gauges.
pub const NAMESPACE: &str = "jstat";

/// Number of metric slots decoded from one sample.
pub const FIELD_COUNT: usize = 11;

/// One metric slot of a gcutil sample, in publish order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcUtilField {
    S0,
    S1,
    Eden,
    Old,
    Meta,
    Ccs,
    Ygc,
    Ygct,
    Fgc,
    Fgct,
    Gct,
}

impl GcUtilField {
    pub const ALL: [GcUtilField; FIELD_COUNT] = [
        GcUtilField::S0,
        GcUtilField::S1,
        GcUtilField::Eden,
        GcUtilField::Old,
        GcUtilField::Meta,
        GcUtilField::Ccs,
        GcUtilField::Ygc,
        GcUtilField::Ygct,
        GcUtilField::Fgc,
        GcUtilField::Fgct,
        GcUtilField::Gct,
    ];

    /// Metric name without namespace.
    pub const fn name(self) -> &'static str {
        match self {
            GcUtilField::S0 => "s0",
            GcUtilField::S1 => "s1",
            GcUtilField::Eden => "eden",
            GcUtilField::Old => "old",
            GcUtilField::Meta => "meta",
            GcUtilField::Ccs => "ccs",
            GcUtilField::Ygc => "ygc",
            GcUtilField::Ygct => "ygct",
            GcUtilField::Fgc => "fgc",
            GcUtilField::Fgct => "fgct",
            GcUtilField::Gct => "gct",
        }
    }

    /// Column title as printed in the jstat header line.
    pub const fn column(self) -> &'static str {
        match self {
            GcUtilField::S0 => "S0",
            GcUtilField::S1 => "S1",
            GcUtilField::Eden => "E",
            GcUtilField::Old => "O",
            GcUtilField::Meta => "M",
            GcUtilField::Ccs => "CCS",
            GcUtilField::Ygc => "YGC",
            GcUtilField::Ygct => "YGCT",
            GcUtilField::Fgc => "FGC",
            GcUtilField::Fgct => "FGCT",
            GcUtilField::Gct => "GCT",
        }
    }

    pub const fn help(self) -> &'static str {
        match self {
            GcUtilField::S0 => "Survivor space 0 utilization as a percentage of capacity",
            GcUtilField::S1 => "Survivor space 1 utilization as a percentage of capacity",
            GcUtilField::Eden => "Eden space utilization as a percentage of capacity",
            GcUtilField::Old => "Old space utilization as a percentage of capacity",
            GcUtilField::Meta => "Metaspace utilization as a percentage of capacity",
            GcUtilField::Ccs => "Compressed class space utilization as a percentage",
            GcUtilField::Ygc => "Number of young generation GC events",
            GcUtilField::Ygct => "Young generation garbage collection time in seconds",
            GcUtilField::Fgc => "Number of full GC events",
            GcUtilField::Fgct => "Full garbage collection time in seconds",
            GcUtilField::Gct => "Total garbage collection time in seconds",
        }
    }

    /// Field index read by the legacy positional layout.
    ///
    /// `meta` and `ccs` both read field 4 and field 5 is never read, so every
    /// slot after `ccs` reads the column to the left of its own title.
    pub const fn legacy_index(self) -> usize {
        match self {
            GcUtilField::S0 => 0,
            GcUtilField::S1 => 1,
            GcUtilField::Eden => 2,
            GcUtilField::Old => 3,
            GcUtilField::Meta => 4,
            GcUtilField::Ccs => 4,
            GcUtilField::Ygc => 5,
            GcUtilField::Ygct => 6,
            GcUtilField::Fgc => 7,
            GcUtilField::Fgct => 8,
            GcUtilField::Gct => 9,
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// How data row fields are mapped to metric slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColumnLayout {
    /// Fixed positions, including the duplicated `meta`/`ccs` index.
    #[default]
    Legacy,
    /// Positions resolved by column title from the header line.
    Header,
}

/// Ordered `(field, index)` pairs used to decode one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: [(GcUtilField, usize); FIELD_COUNT],
}

impl ColumnSchema {
    pub fn legacy() -> Self {
        Self {
            columns: GcUtilField::ALL.map(|f| (f, f.legacy_index())),
        }
    }

    /// Resolves each field's position from a jstat header line.
    ///
    /// Columns the exporter does not publish (e.g. `CGC`, `CGCT` on newer JDKs)
    /// are skipped.
    pub fn from_header(header: &str) -> Result<Self, ParseError> {
        let titles: Vec<&str> = header.split_whitespace().collect();
        let mut columns = [(GcUtilField::S0, 0usize); FIELD_COUNT];

        for (slot, field) in GcUtilField::ALL.into_iter().enumerate() {
            let index = titles
                .iter()
                .position(|t| *t == field.column())
                .ok_or(ParseError::MissingColumn {
                    column: field.column(),
                })?;
            columns[slot] = (field, index);
        }

        Ok(Self { columns })
    }

    pub fn for_layout(layout: ColumnLayout, header: &str) -> Result<Self, ParseError> {
        match layout {
            ColumnLayout::Legacy => Ok(Self::legacy()),
            ColumnLayout::Header => Self::from_header(header),
        }
    }

    pub fn index_of(&self, field: GcUtilField) -> usize {
        self.columns[field.slot()].1
    }

    /// Minimum number of fields a data row must have.
    pub fn required_fields(&self) -> usize {
        self.columns.iter().map(|(_, i)| i + 1).max().unwrap_or(0)
    }

    /// Decodes one data row. Either every slot is converted or none is.
    pub fn decode_row(&self, row: &str) -> Result<GcUtilSample, ParseError> {
        let fields: Vec<&str> = row.split_whitespace().collect();

        let expected = self.required_fields();
        if fields.len() < expected {
            return Err(ParseError::TooFewFields {
                expected,
                found: fields.len(),
            });
        }

        let mut values = [0.0f64; FIELD_COUNT];
        for (field, index) in self.columns {
            let raw = fields[index];
            values[field.slot()] = raw.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                column: field.name(),
                index,
                value: raw.to_string(),
            })?;
        }

        Ok(GcUtilSample { values })
    }
}

/// Decoded values of one gcutil sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcUtilSample {
    values: [f64; FIELD_COUNT],
}

impl GcUtilSample {
    pub fn from_values(values: [f64; FIELD_COUNT]) -> Self {
        Self { values }
    }

    pub fn get(&self, field: GcUtilField) -> f64 {
        self.values[field.slot()]
    }

    /// Values in publish order.
    pub fn iter(&self) -> impl Iterator<Item = (GcUtilField, f64)> + '_ {
        GcUtilField::ALL.into_iter().map(|f| (f, self.get(f)))
    }
}

/// Decodes the first data row of raw jstat output.
///
/// Returns `Ok(None)` when the text has no data row (fewer than two lines).
pub fn decode(text: &str, layout: ColumnLayout) -> Result<Option<GcUtilSample>, ParseError> {
    let mut lines = text.lines();
    let (Some(header), Some(row)) = (lines.next(), lines.next()) else {
        return Ok(None);
    };

    let schema = ColumnSchema::for_layout(layout, header)?;
    schema.decode_row(row).map(Some)
}
