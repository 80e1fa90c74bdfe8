use crate::models::{DelegationRecord, Registry, Resource, Status};
use crate::sources::{Ipv6ValueConvention, SourceDescriptor};
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// ASN and IPv4 number spaces are 32 bits wide; `start + count` may not
/// exceed this.
const UNIT_SPACE: u64 = 1 << 32;

const VERSION_FIELD_PATTERN: &str = r"^\d+(?:\.\d+)?$";

/// Cached regex matching a bare version number in the first field of a
/// header line (e.g. `2.3|apnic|20240101|...`).
static VERSION_FIELD: OnceLock<Regex> = OnceLock::new();

fn version_field() -> &'static Regex {
    VERSION_FIELD.get_or_init(|| {
        Regex::new(VERSION_FIELD_PATTERN).expect("VERSION_FIELD_PATTERN is a valid regex pattern")
    })
}

/// Result of parsing one delegation file.
#[derive(Debug)]
pub struct ParseOutcome {
    pub records: Vec<DelegationRecord>,
    /// Malformed lines that were skipped rather than parsed.
    pub skipped: usize,
}

/// Parses the raw text of a delegation file into typed records.
///
/// Comment (`#`), blank, version-header and summary lines are ignored. Each
/// remaining line is split on the source dialect's delimiter and parsed as
/// `registry|cc|type|start|value|date|status`, tolerating extra trailing
/// fields. Records whose status is not allocated/assigned are dropped
/// silently; malformed lines are skipped and counted in
/// [`ParseOutcome::skipped`]. Empty input produces zero records and no error.
///
/// # Arguments
///
/// * `raw` - Raw delegation file content
/// * `source` - Descriptor of the source the content came from; supplies the
///   dialect and the fallback registry tag
pub fn parse(raw: &str, source: &SourceDescriptor) -> ParseOutcome {
    let mut records = Vec::new();
    let mut skipped = 0;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line, source) {
            Ok(Some(record)) => records.push(record),
            // Header, summary, or a status the pipeline does not retain
            Ok(None) => {}
            Err(reason) => {
                skipped += 1;
                debug!(
                    source = source.id(),
                    reason = reason.as_str(),
                    line = line,
                    "Skipping malformed delegation line"
                );
            }
        }
    }

    ParseOutcome { records, skipped }
}

/// Parses a single non-comment line.
///
/// Returns `Ok(None)` for lines that are valid but carry no delegation
/// record (version headers, summaries, filtered statuses), and `Err` with a
/// reason for malformed lines.
fn parse_line(line: &str, source: &SourceDescriptor) -> Result<Option<DelegationRecord>, String> {
    let fields: Vec<&str> = line
        .split(source.dialect.delimiter)
        .map(str::trim)
        .collect();

    // Version header: the first field is a bare version number
    if version_field().is_match(fields[0]) {
        return Ok(None);
    }
    // Summary lines close with a literal "summary" marker and carry no
    // per-country data
    if fields.contains(&"summary") {
        return Ok(None);
    }

    if fields.len() < source.dialect.min_fields {
        return Err(format!(
            "expected at least {} fields, got {}",
            source.dialect.min_fields,
            fields.len()
        ));
    }

    // The in-file registry label wins when it parses; drifted or renamed
    // labels fall back to the registry the file was fetched from.
    let registry = Registry::from_str(fields[0]).unwrap_or(source.registry);

    // Status first: available/reserved lines legitimately carry an empty
    // country code and must be dropped, not counted as malformed.
    let status = Status::from_str(fields[6])
        .map_err(|_| format!("unrecognized status '{}'", fields[6]))?;
    if !status.is_retained() {
        return Ok(None);
    }

    let country = parse_country_code(fields[1])?;

    let resource = parse_resource(fields[2], fields[3], fields[4], source)?;

    let date = match fields[5] {
        "" => None,
        d => Some(d.to_string()),
    };

    Ok(Some(DelegationRecord {
        registry,
        country,
        resource,
        date,
        status,
    }))
}

/// Normalizes and validates a two-letter country code.
fn parse_country_code(raw: &str) -> Result<String, String> {
    if raw.len() == 2 && raw.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(raw.to_uppercase())
    } else {
        Err(format!("country code '{raw}' is not two letters"))
    }
}

/// Parses the type/start/value triple into a typed resource.
fn parse_resource(
    type_str: &str,
    start_str: &str,
    value_str: &str,
    source: &SourceDescriptor,
) -> Result<Resource, String> {
    match type_str {
        "asn" => {
            let start: u32 = start_str
                .parse()
                .map_err(|_| format!("invalid ASN start '{start_str}'"))?;
            let count = parse_unit_count(value_str)?;
            if start as u64 + count > UNIT_SPACE {
                return Err(format!("ASN range {start}+{count} exceeds the 32-bit ASN space"));
            }
            Ok(Resource::Asn { start, count })
        }
        "ipv4" => {
            let start: Ipv4Addr = start_str
                .parse()
                .map_err(|_| format!("invalid IPv4 address '{start_str}'"))?;
            let count = parse_unit_count(value_str)?;
            if u32::from(start) as u64 + count > UNIT_SPACE {
                return Err(format!(
                    "IPv4 range {start}+{count} exceeds the address space"
                ));
            }
            Ok(Resource::Ipv4 { start, count })
        }
        "ipv6" => {
            let addr: Ipv6Addr = start_str
                .parse()
                .map_err(|_| format!("invalid IPv6 address '{start_str}'"))?;
            let prefix_len = parse_ipv6_value(value_str, source)?;
            Ok(Resource::Ipv6 { addr, prefix_len })
        }
        other => Err(format!("unrecognized record type '{other}'")),
    }
}

/// Parses the value field of an ASN or IPv4 record as a unit count.
fn parse_unit_count(value_str: &str) -> Result<u64, String> {
    let count: u64 = value_str
        .parse()
        .map_err(|_| format!("invalid unit count '{value_str}'"))?;
    if count == 0 {
        return Err("unit count must be at least 1".to_string());
    }
    Ok(count)
}

/// Parses the value field of an IPv6 record per the source dialect.
///
/// All current registries publish a prefix length; a dialect declared as
/// `AddressCount` converts exact powers of two and skips anything ambiguous.
fn parse_ipv6_value(value_str: &str, source: &SourceDescriptor) -> Result<u8, String> {
    match source.dialect.ipv6_value {
        Ipv6ValueConvention::PrefixLength => {
            let prefix_len: u8 = value_str
                .parse()
                .map_err(|_| format!("invalid IPv6 prefix length '{value_str}'"))?;
            if prefix_len > 128 {
                return Err(format!("IPv6 prefix length {prefix_len} out of range"));
            }
            Ok(prefix_len)
        }
        Ipv6ValueConvention::AddressCount => {
            let count: u128 = value_str
                .parse()
                .map_err(|_| format!("invalid IPv6 address count '{value_str}'"))?;
            if count == 0 || !count.is_power_of_two() {
                warn!(
                    source = source.id(),
                    count = value_str,
                    "Ambiguous IPv6 address count, skipping record"
                );
                return Err(format!(
                    "IPv6 address count {count} has no exact prefix equivalent"
                ));
            }
            Ok(128 - count.trailing_zeros() as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{list_sources, Dialect};

    fn apnic() -> SourceDescriptor {
        list_sources()[0]
    }

    fn parse_one(line: &str) -> Result<Option<DelegationRecord>, String> {
        parse_line(line, &apnic())
    }

    #[test]
    fn test_parse_asn_line() {
        let record = parse_one("apnic|KR|asn|1000|10|20020801|allocated")
            .unwrap()
            .unwrap();
        assert_eq!(record.registry, Registry::Apnic);
        assert_eq!(record.country, "KR");
        assert_eq!(
            record.resource,
            Resource::Asn {
                start: 1000,
                count: 10
            }
        );
        assert_eq!(record.date.as_deref(), Some("20020801"));
        assert_eq!(record.status, Status::Allocated);
    }

    #[test]
    fn test_parse_ipv4_line() {
        let record = parse_one("apnic|JP|ipv4|133.0.0.0|1024|19870101|allocated")
            .unwrap()
            .unwrap();
        assert_eq!(
            record.resource,
            Resource::Ipv4 {
                start: "133.0.0.0".parse().unwrap(),
                count: 1024
            }
        );
    }

    #[test]
    fn test_parse_ipv6_line_value_is_prefix_length() {
        let record = parse_one("apnic|JP|ipv6|2001:200::|35|19990813|allocated")
            .unwrap()
            .unwrap();
        assert_eq!(
            record.resource,
            Resource::Ipv6 {
                addr: "2001:200::".parse().unwrap(),
                prefix_len: 35
            }
        );
    }

    #[test]
    fn test_extended_format_extra_fields_tolerated() {
        // delegated-extended appends an opaque registration id
        let record = parse_one("apnic|KR|asn|1000|10|20020801|assigned|A9173591")
            .unwrap()
            .unwrap();
        assert_eq!(record.status, Status::Assigned);
    }

    #[test]
    fn test_version_header_is_ignored() {
        let result =
            parse_one("2.3|apnic|20240101|54321|19830705|20240101|+1000").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_summary_line_is_ignored() {
        let result = parse_one("apnic|*|asn|*|10000|summary").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_available_and_reserved_are_dropped_silently() {
        assert!(parse_one("apnic|KR|asn|1000|10|20020801|available")
            .unwrap()
            .is_none());
        assert!(parse_one("apnic||ipv4|203.0.0.0|256||reserved")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_country_code_is_uppercased() {
        let record = parse_one("apnic|kr|asn|1000|1|20020801|allocated")
            .unwrap()
            .unwrap();
        assert_eq!(record.country, "KR");
    }

    #[test]
    fn test_bad_country_code_is_an_error() {
        assert!(parse_one("apnic|KOR|asn|1000|1|20020801|allocated").is_err());
        assert!(parse_one("apnic|K1|asn|1000|1|20020801|allocated").is_err());
    }

    #[test]
    fn test_unknown_registry_label_falls_back_to_source() {
        let record = parse_one("apnic-ap|KR|asn|1000|1|20020801|allocated")
            .unwrap()
            .unwrap();
        assert_eq!(record.registry, Registry::Apnic);
    }

    #[test]
    fn test_zero_count_rejected() {
        assert!(parse_one("apnic|KR|asn|1000|0|20020801|allocated").is_err());
    }

    #[test]
    fn test_count_beyond_address_space_rejected() {
        assert!(parse_one("apnic|KR|asn|4294967295|2|20020801|allocated").is_err());
        assert!(
            parse_one("apnic|KR|ipv4|255.255.255.254|4|20020801|allocated").is_err()
        );
    }

    #[test]
    fn test_prefix_length_out_of_range_rejected() {
        assert!(parse_one("apnic|JP|ipv6|2001:200::|129|19990813|allocated").is_err());
    }

    #[test]
    fn test_unrecognized_type_rejected() {
        assert!(parse_one("apnic|KR|asn16|1000|1|20020801|allocated").is_err());
    }

    #[test]
    fn test_empty_input_yields_no_records_and_no_skips() {
        let outcome = parse("", &apnic());
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_parse_counts_malformed_lines() {
        let raw = "\
# comment line
2.3|apnic|20240101|2|19830705|20240101|+1000
apnic|*|asn|*|1|summary
apnic|KR|asn|1000|10|20020801|allocated
not a delegation line at all
apnic|KR|asn|bogus|10|20020801|allocated
";
        let outcome = parse(raw, &apnic());
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_address_count_dialect_converts_powers_of_two() {
        let mut source = apnic();
        source.dialect = Dialect {
            ipv6_value: crate::sources::Ipv6ValueConvention::AddressCount,
            ..source.dialect
        };

        // 2^96 addresses is exactly a /32
        let record = parse_line(
            "apnic|JP|ipv6|2001:200::|79228162514264337593543950336|19990813|allocated",
            &source,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            record.resource,
            Resource::Ipv6 {
                addr: "2001:200::".parse().unwrap(),
                prefix_len: 32
            }
        );

        // A non-power-of-two count is ambiguous and skipped
        assert!(parse_line(
            "apnic|JP|ipv6|2001:200::|100|19990813|allocated",
            &source
        )
        .is_err());
    }

    #[test]
    fn test_whitespace_around_fields_tolerated() {
        let record = parse_one("apnic| KR |asn| 1000 | 10 |20020801| allocated ")
            .unwrap()
            .unwrap();
        assert_eq!(record.country, "KR");
        assert_eq!(
            record.resource,
            Resource::Asn {
                start: 1000,
                count: 10
            }
        );
    }
}
