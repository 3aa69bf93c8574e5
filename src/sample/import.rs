//! CSV import of measured print samples.
//!
//! Columns are matched case-insensitively, with common aliases. At minimum a
//! file needs an ink mode, a quality, width and height, and at least one
//! `<channel>_ml` column. Blank cells are treated as absent values.
//!
//! ```text
//! id,ink_mode,quality,width,height,unit,coverage,cyan_ml,white_ml,white_coverage
//! a1,CMYK+W,standard,10,8,in,35,0.12,0.95,100
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use inkcal::sample::{SampleImporter, SampleSchema};
//!
//! let schema = SampleSchema::builder()
//!     .ink_mode_column("mode")
//!     .default_unit(LengthUnit::Millimeters)
//!     .build();
//!
//! let samples = SampleImporter::new(schema).import("samples.csv")?;
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use super::MeasuredSample;
use crate::error::{Error, Result};
use crate::ink::Channel;
use crate::model::{LengthUnit, PrintSize};
use crate::params::Quality;

/// Schema for sample CSV import.
#[derive(Debug, Clone, Default)]
pub struct SampleSchema {
    /// Column name for the sample id.
    pub id_column: Option<String>,
    /// Column name for the ink mode.
    pub ink_mode_column: Option<String>,
    /// Column name for the quality tier.
    pub quality_column: Option<String>,
    /// Column name for width.
    pub width_column: Option<String>,
    /// Column name for height.
    pub height_column: Option<String>,
    /// Column name for the length unit.
    pub unit_column: Option<String>,
    /// Column name for overall coverage.
    pub coverage_column: Option<String>,
    /// Unit used when the file has no unit column or the cell is blank.
    pub default_unit: LengthUnit,
}

impl SampleSchema {
    /// Create a schema builder.
    #[must_use]
    pub fn builder() -> SampleSchemaBuilder {
        SampleSchemaBuilder::default()
    }

    /// Create a schema that auto-detects columns from common names.
    #[must_use]
    pub fn auto_detect() -> Self {
        Self::default()
    }

    fn find_column(&self, headers: &[&str], primary: Option<&str>, aliases: &[&str]) -> Option<usize> {
        if let Some(name) = primary {
            if let Some(idx) = find_header_index(headers, name) {
                return Some(idx);
            }
        }
        aliases.iter().find_map(|alias| find_header_index(headers, alias))
    }
}

/// Builder for [`SampleSchema`].
#[derive(Debug, Default)]
pub struct SampleSchemaBuilder {
    schema: SampleSchema,
}

impl SampleSchemaBuilder {
    /// Set the id column name.
    #[must_use]
    pub fn id_column(mut self, name: impl Into<String>) -> Self {
        self.schema.id_column = Some(name.into());
        self
    }

    /// Set the ink mode column name.
    #[must_use]
    pub fn ink_mode_column(mut self, name: impl Into<String>) -> Self {
        self.schema.ink_mode_column = Some(name.into());
        self
    }

    /// Set the quality column name.
    #[must_use]
    pub fn quality_column(mut self, name: impl Into<String>) -> Self {
        self.schema.quality_column = Some(name.into());
        self
    }

    /// Set the width column name.
    #[must_use]
    pub fn width_column(mut self, name: impl Into<String>) -> Self {
        self.schema.width_column = Some(name.into());
        self
    }

    /// Set the height column name.
    #[must_use]
    pub fn height_column(mut self, name: impl Into<String>) -> Self {
        self.schema.height_column = Some(name.into());
        self
    }

    /// Set the unit column name.
    #[must_use]
    pub fn unit_column(mut self, name: impl Into<String>) -> Self {
        self.schema.unit_column = Some(name.into());
        self
    }

    /// Set the overall coverage column name.
    #[must_use]
    pub fn coverage_column(mut self, name: impl Into<String>) -> Self {
        self.schema.coverage_column = Some(name.into());
        self
    }

    /// Set the unit assumed when none is given.
    #[must_use]
    pub fn default_unit(mut self, unit: LengthUnit) -> Self {
        self.schema.default_unit = unit;
        self
    }

    /// Build the schema.
    #[must_use]
    pub fn build(self) -> SampleSchema {
        self.schema
    }
}

/// Column positions resolved from a header row.
struct Columns {
    id: Option<usize>,
    ink_mode: usize,
    quality: usize,
    width: usize,
    height: usize,
    unit: Option<usize>,
    coverage: Option<usize>,
    measured: Vec<(Channel, usize)>,
    channel_coverage: Vec<(Channel, usize)>,
}

/// CSV importer for measured samples.
pub struct SampleImporter {
    schema: SampleSchema,
}

impl SampleImporter {
    /// Create a new importer with the given schema.
    #[must_use]
    pub fn new(schema: SampleSchema) -> Self {
        Self { schema }
    }

    /// Create an importer that auto-detects columns.
    #[must_use]
    pub fn auto_detect() -> Self {
        Self::new(SampleSchema::auto_detect())
    }

    /// Import samples from a CSV file.
    pub fn import(&self, path: impl AsRef<Path>) -> Result<Vec<MeasuredSample>> {
        let reader = csv::Reader::from_path(path.as_ref())?;
        self.import_reader(reader)
    }

    /// Import samples from any reader producing CSV text.
    pub fn import_from<R: std::io::Read>(&self, rdr: R) -> Result<Vec<MeasuredSample>> {
        self.import_reader(csv::Reader::from_reader(rdr))
    }

    fn import_reader<R: std::io::Read>(&self, mut reader: csv::Reader<R>) -> Result<Vec<MeasuredSample>> {
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let columns = self.resolve_columns(&header_refs)?;

        let mut samples = Vec::new();
        for (line_num, record) in reader.records().enumerate() {
            // +2 for 1-based and header
            let line = line_num + 2;
            let record = record.map_err(|e| Error::CsvImport {
                line,
                reason: e.to_string(),
            })?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            samples.push(self.parse_record(&record, &columns, line)?);
        }
        Ok(samples)
    }

    fn resolve_columns(&self, headers: &[&str]) -> Result<Columns> {
        let s = &self.schema;
        let required = |idx: Option<usize>, what: &str| {
            idx.ok_or_else(|| Error::CsvImport {
                line: 1,
                reason: format!("Could not find {what} column"),
            })
        };

        let ink_mode = required(
            s.find_column(headers, s.ink_mode_column.as_deref(), &["ink_mode", "mode", "inkmode", "ink"]),
            "ink_mode",
        )?;
        let quality = required(
            s.find_column(headers, s.quality_column.as_deref(), &["quality", "print_quality", "q"]),
            "quality",
        )?;
        let width = required(
            s.find_column(headers, s.width_column.as_deref(), &["width", "w", "width_in"]),
            "width",
        )?;
        let height = required(
            s.find_column(headers, s.height_column.as_deref(), &["height", "h", "height_in"]),
            "height",
        )?;

        let mut measured = Vec::new();
        let mut channel_coverage = Vec::new();
        for channel in Channel::ALL {
            let name = channel.as_str();
            let ml_aliases = [format!("{name}_ml"), format!("{name}_volume"), format!("ml_{name}")];
            let cov_aliases = [format!("{name}_coverage"), format!("{name}_cov"), format!("coverage_{name}")];
            if let Some(idx) = ml_aliases.iter().find_map(|a| find_header_index(headers, a)) {
                measured.push((channel, idx));
            }
            if let Some(idx) = cov_aliases.iter().find_map(|a| find_header_index(headers, a)) {
                channel_coverage.push((channel, idx));
            }
        }
        if measured.is_empty() {
            return Err(Error::CsvImport {
                line: 1,
                reason: "Could not find any <channel>_ml column".to_string(),
            });
        }

        Ok(Columns {
            id: s.find_column(headers, s.id_column.as_deref(), &["id", "sample", "sample_id", "job"]),
            ink_mode,
            quality,
            width,
            height,
            unit: s.find_column(headers, s.unit_column.as_deref(), &["unit", "units"]),
            coverage: s.find_column(
                headers,
                s.coverage_column.as_deref(),
                &["coverage", "coverage_percent", "overall_coverage"],
            ),
            measured,
            channel_coverage,
        })
    }

    fn parse_record(&self, record: &csv::StringRecord, columns: &Columns, line: usize) -> Result<MeasuredSample> {
        let cell = |idx: usize| record.get(idx).map(str::trim).filter(|s| !s.is_empty());
        let bad = |reason: String| Error::CsvImport { line, reason };
        let number = |idx: usize, what: &str| -> Result<Option<f64>> {
            cell(idx)
                .map(|s| {
                    s.parse::<f64>()
                        .map_err(|_| bad(format!("{what}: '{s}' is not a number")))
                })
                .transpose()
        };

        let ink_mode = cell(columns.ink_mode)
            .ok_or_else(|| bad("ink_mode is empty".to_string()))?
            .to_string();
        let quality_text = cell(columns.quality).ok_or_else(|| bad("quality is empty".to_string()))?;
        let quality = Quality::from_str_loose(quality_text)
            .ok_or_else(|| bad(format!("unknown quality '{quality_text}'")))?;
        let width = number(columns.width, "width")?.ok_or_else(|| bad("width is empty".to_string()))?;
        let height = number(columns.height, "height")?.ok_or_else(|| bad("height is empty".to_string()))?;
        let unit = match columns.unit.and_then(cell) {
            Some(text) => LengthUnit::from_str_loose(text).ok_or_else(|| bad(format!("unknown unit '{text}'")))?,
            None => self.schema.default_unit,
        };
        let coverage_percent = match columns.coverage {
            Some(idx) => number(idx, "coverage")?,
            None => None,
        };

        let mut measured_ml = BTreeMap::new();
        for &(channel, idx) in &columns.measured {
            if let Some(ml) = number(idx, &format!("{channel}_ml"))? {
                measured_ml.insert(channel, ml);
            }
        }
        let mut channel_coverage = BTreeMap::new();
        for &(channel, idx) in &columns.channel_coverage {
            if let Some(c) = number(idx, &format!("{channel}_coverage"))? {
                channel_coverage.insert(channel, c);
            }
        }

        Ok(MeasuredSample {
            id: columns.id.and_then(cell).map(String::from),
            ink_mode,
            quality,
            size: PrintSize::new(width, height, unit),
            coverage_percent,
            channel_coverage,
            measured_ml,
        })
    }
}

/// Find a header index by name (case-insensitive).
fn find_header_index(headers: &[&str], name: &str) -> Option<usize> {
    let name_lower = name.to_lowercase();
    headers.iter().position(|h| h.trim().to_lowercase() == name_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
ID,Mode,Quality,Width,Height,Unit,Coverage,cyan_ml,Black_ML,white_ml,white_coverage
a1,CMYK+W,standard,10,8,in,35,0.12,,0.95,100
a2,cmyk,high,254,127,mm,20,0.05,0.07,,
";

    #[test]
    fn test_import_auto_detect() {
        let samples = SampleImporter::auto_detect().import_from(CSV.as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);

        let a1 = &samples[0];
        assert_eq!(a1.id.as_deref(), Some("a1"));
        assert_eq!(a1.ink_mode, "CMYK+W");
        assert_eq!(a1.quality, Quality::Standard);
        assert_eq!(a1.coverage_percent, Some(35.0));
        assert_eq!(a1.measured_ml.get(&Channel::Cyan), Some(&0.12));
        assert_eq!(a1.measured_ml.get(&Channel::Black), None);
        assert_eq!(a1.channel_coverage.get(&Channel::White), Some(&100.0));

        let a2 = &samples[1];
        assert_eq!(a2.size.unit, LengthUnit::Millimeters);
        assert_eq!(a2.measured_ml.len(), 2);
    }

    #[test]
    fn test_custom_columns_and_default_unit() {
        let csv = "sheet,tier,w_mm,h_mm,magenta_ml\nCMYK,draft,100,100,0.03\n";
        let schema = SampleSchema::builder()
            .ink_mode_column("sheet")
            .quality_column("tier")
            .width_column("w_mm")
            .height_column("h_mm")
            .default_unit(LengthUnit::Millimeters)
            .build();
        let samples = SampleImporter::new(schema).import_from(csv.as_bytes()).unwrap();
        assert_eq!(samples[0].size.unit, LengthUnit::Millimeters);
        assert_eq!(samples[0].quality, Quality::Draft);
        assert_eq!(samples[0].coverage_percent, None);
    }

    #[test]
    fn test_bad_number_reports_line() {
        let csv = "ink_mode,quality,width,height,cyan_ml\nCMYK,standard,4,4,0.1\nCMYK,standard,four,4,0.1\n";
        let err = SampleImporter::auto_detect().import_from(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::CsvImport { line: 3, .. }));
    }

    #[test]
    fn test_missing_measurement_columns() {
        let csv = "ink_mode,quality,width,height\nCMYK,standard,4,4\n";
        let err = SampleImporter::auto_detect().import_from(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::CsvImport { line: 1, .. }));
    }

    #[test]
    fn test_find_header_index() {
        let headers = ["Ink_Mode", "Quality", " Width "];
        assert_eq!(find_header_index(&headers, "ink_mode"), Some(0));
        assert_eq!(find_header_index(&headers, "width"), Some(2));
        assert_eq!(find_header_index(&headers, "unknown"), None);
    }
}
