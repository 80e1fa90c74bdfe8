use crate::constants::*;
use crate::errors::{AppError, AppResult};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use tracing::{info, warn};

/// Regional Internet Registry publishing a delegation-statistics file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Registry {
    Apnic,
    Afrinic,
    Arin,
    Lacnic,
    RipeNcc,
}

impl Registry {
    /// Returns the lowercase label used in the upstream file format.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Apnic => "apnic",
            Self::Afrinic => "afrinic",
            Self::Arin => "arin",
            Self::Lacnic => "lacnic",
            Self::RipeNcc => "ripencc",
        }
    }

    /// Returns a human-readable name for the registry.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Apnic => "APNIC",
            Self::Afrinic => "AFRINIC",
            Self::Arin => "ARIN",
            Self::Lacnic => "LACNIC",
            Self::RipeNcc => "RIPE NCC",
        }
    }
}

impl FromStr for Registry {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "apnic" => Ok(Self::Apnic),
            "afrinic" => Ok(Self::Afrinic),
            "arin" => Ok(Self::Arin),
            "lacnic" => Ok(Self::Lacnic),
            "ripencc" | "ripe-ncc" | "ripe" => Ok(Self::RipeNcc),
            other => Err(AppError::Parse(format!("unknown registry: {other}"))),
        }
    }
}

/// Kind of number resource a delegation record covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    Asn,
    Ipv4,
    Ipv6,
}

impl DataType {
    /// Returns the label used in output file names and upstream records.
    pub fn file_label(&self) -> &'static str {
        match self {
            Self::Asn => "asn",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
        }
    }

    /// Returns a human-readable name for the data type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Asn => "ASN",
            Self::Ipv4 => "IPv4",
            Self::Ipv6 => "IPv6",
        }
    }

    /// Parses the CLI data-type selector into the list of requested types.
    ///
    /// Accepts `asn`, `ipv4`, `ipv6` (plus short aliases) and `all`, case
    /// insensitively.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the selector matches none of the known
    /// aliases.
    pub fn parse_selector(selector: &str) -> AppResult<Vec<DataType>> {
        let lower = selector.trim().to_lowercase();

        if lower == ALL_ALIAS {
            return Ok(vec![Self::Asn, Self::Ipv4, Self::Ipv6]);
        }
        if ASN_ALIASES.contains(&lower.as_str()) {
            Ok(vec![Self::Asn])
        } else if IPV4_ALIASES.contains(&lower.as_str()) {
            Ok(vec![Self::Ipv4])
        } else if IPV6_ALIASES.contains(&lower.as_str()) {
            Ok(vec![Self::Ipv6])
        } else {
            Err(AppError::InvalidInput(format!(
                "Unknown data type '{selector}'. Valid choices: asn, ipv4, ipv6, all"
            )))
        }
    }
}

/// Delegation status as reported by the registries.
///
/// Only `Allocated` and `Assigned` records make it into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Allocated,
    Assigned,
    Available,
    Reserved,
}

impl Status {
    /// Whether records with this status are retained by the pipeline.
    pub fn is_retained(&self) -> bool {
        matches!(self, Self::Allocated | Self::Assigned)
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allocated" => Ok(Self::Allocated),
            "assigned" => Ok(Self::Assigned),
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            other => Err(AppError::Parse(format!("unknown status: {other}"))),
        }
    }
}

/// The number resource carried by a single delegation record.
///
/// ASN and IPv4 delegations are counts of consecutive units starting at
/// `start`; IPv6 delegations are prefix-based and keep their CIDR form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Asn { start: u32, count: u64 },
    Ipv4 { start: Ipv4Addr, count: u64 },
    Ipv6 { addr: Ipv6Addr, prefix_len: u8 },
}

impl Resource {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Asn { .. } => DataType::Asn,
            Self::Ipv4 { .. } => DataType::Ipv4,
            Self::Ipv6 { .. } => DataType::Ipv6,
        }
    }
}

/// One parsed line of a delegation-statistics file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRecord {
    pub registry: Registry,
    /// Uppercase ISO 3166-1 alpha-2 country code.
    pub country: String,
    pub resource: Resource,
    pub date: Option<String>,
    pub status: Status,
}

/// Validated parameters for one pipeline run. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Uppercase country codes, deduplicated, input order preserved.
    pub countries: Vec<String>,
    pub data_types: Vec<DataType>,
    pub max_workers: usize,
}

impl RunRequest {
    pub fn wants_country(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c == country)
    }

    pub fn wants_type(&self, data_type: DataType) -> bool {
        self.data_types.contains(&data_type)
    }
}

/// Per-run summary of source outcomes and record counts.
///
/// Collected while the pipeline runs and logged once at the end, so every
/// invocation reports which sources succeeded, which failed and why, and how
/// many records each requested country matched.
#[derive(Debug, Default)]
pub struct RunStats {
    pub sources_ok: Vec<String>,
    pub sources_failed: Vec<(String, String)>,
    pub skipped_lines: usize,
    pub country_counts: BTreeMap<String, usize>,
}

impl RunStats {
    pub fn record_source_ok(&mut self, source: &str) {
        self.sources_ok.push(source.to_string());
    }

    pub fn record_source_failed(&mut self, source: &str, reason: String) {
        self.sources_failed.push((source.to_string(), reason));
    }

    pub fn add_skipped(&mut self, lines: usize) {
        self.skipped_lines += lines;
    }

    pub fn record_country_count(&mut self, country: &str, count: usize) {
        self.country_counts.insert(country.to_string(), count);
    }

    /// True when at least one source was attempted and none succeeded.
    pub fn all_sources_failed(&self) -> bool {
        self.sources_ok.is_empty() && !self.sources_failed.is_empty()
    }

    /// Joins per-source failure reasons into one reportable string.
    pub fn failure_summary(&self) -> String {
        self.sources_failed
            .iter()
            .map(|(source, reason)| format!("{source}: {reason}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Logs the end-of-run summary: source outcomes, skipped line count and
    /// per-country record totals.
    pub fn log_summary(&self) {
        info!(
            succeeded = %self.sources_ok.join(", "),
            failed = self.sources_failed.len(),
            "Source fetch summary"
        );
        for (source, reason) in &self.sources_failed {
            warn!(source = source.as_str(), reason = reason.as_str(), "Source fetch failed");
        }
        if self.skipped_lines > 0 {
            info!(lines = self.skipped_lines, "Skipped malformed delegation lines");
        }
        for (country, count) in &self.country_counts {
            if *count == 0 {
                info!(country = country.as_str(), "No matching records for country");
            } else {
                info!(country = country.as_str(), records = *count, "Country records aggregated");
            }
        }
    }
}
