use std::io::{self, Write};

use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use serde::Serialize;

use crate::spot::types::{PricePoint, RegionDirectory};

/// Formats a price as `#,###.###`: comma thousands separators and exactly
/// three decimals.
pub fn format_price(price: f64) -> String {
    let fixed = format!("{:.3}", price);
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "000"));
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", whole),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}{grouped}.{fraction}")
}

#[derive(Debug, Serialize)]
pub struct ReportRow<'a> {
    pub price: f64,
    pub region: &'a str,
    pub region_description: &'a str,
    pub zone: &'a str,
    pub instance_type: &'a str,
    pub timestamp: String,
}

/// Renders sorted price points, one per line, stamped with the report time.
pub struct Reporter<'a> {
    regions: &'a RegionDirectory,
    generated_at: DateTime<FixedOffset>,
}

impl<'a> Reporter<'a> {
    pub fn new(regions: &'a RegionDirectory) -> Self {
        Self::with_timestamp(regions, Local::now().fixed_offset())
    }

    pub fn with_timestamp(regions: &'a RegionDirectory, generated_at: DateTime<FixedOffset>) -> Self {
        Self {
            regions,
            generated_at,
        }
    }

    fn timestamp(&self) -> String {
        self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn line(&self, point: &PricePoint) -> String {
        format!(
            "${} [{}] {} {} {} {}",
            format_price(point.price),
            self.regions.description(&point.region),
            point.region,
            point.zone,
            point.instance_type,
            self.timestamp()
        )
    }

    pub fn rows<'p>(&'p self, points: &'p [PricePoint]) -> Vec<ReportRow<'p>> {
        let timestamp = self.timestamp();
        points
            .iter()
            .map(|point| ReportRow {
                price: point.price,
                region: &point.region,
                region_description: self.regions.description(&point.region),
                zone: &point.zone,
                instance_type: &point.instance_type,
                timestamp: timestamp.clone(),
            })
            .collect()
    }

    pub fn write_text<W: Write>(&self, out: &mut W, points: &[PricePoint]) -> io::Result<()> {
        for point in points {
            writeln!(out, "{}", self.line(point))?;
        }
        out.flush()
    }

    pub fn write_json<W: Write>(&self, out: &mut W, points: &[PricePoint]) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.rows(points))?;
        writeln!(out)?;
        out.flush()
    }
}
