//! Common test utilities for integration tests

use rirstat_cli::models::{DataType, Registry, RunRequest};
use rirstat_cli::sources::{list_sources, SourceDescriptor};

/// Returns the configured source descriptor for a registry
#[allow(dead_code)]
pub fn source(registry: Registry) -> SourceDescriptor {
    list_sources()
        .into_iter()
        .find(|s| s.registry == registry)
        .expect("registry is configured")
}

/// Builds a run request for the given countries and data types
#[allow(dead_code)]
pub fn request(countries: &[&str], data_types: Vec<DataType>) -> RunRequest {
    RunRequest {
        countries: countries.iter().map(|c| c.to_string()).collect(),
        data_types,
        max_workers: 5,
    }
}

/// Synthetic APNIC delegated-extended file: version header, summary lines,
/// allocated/assigned records for KR and JP, plus available/reserved lines
/// that must never surface in output
#[allow(dead_code)]
pub const SAMPLE_APNIC_FILE: &str = "\
2.3|apnic|20240105|14|19830613|20240104|+1000
# delegated-extended test fixture
apnic|*|asn|*|4|summary
apnic|*|ipv4|*|5|summary
apnic|*|ipv6|*|2|summary
apnic|KR|asn|1000|10|20020801|allocated|A91A7381
apnic|KR|asn|1010|5|20020802|allocated|A91A7381
apnic|JP|asn|2500|26|19950403|allocated|A918EDB2
apnic|KR|asn|9318|1|19970810|assigned|A9186214
apnic|KR|ipv4|1.11.0.0|65536|20110411|allocated|A91A7381
apnic|KR|ipv4|1.16.0.0|16384|20110411|allocated|A91A7381
apnic|JP|ipv4|1.0.16.0|4096|20110412|allocated|A918EDB2
apnic|KR|ipv6|2001:220::|32|19990922|allocated|A91A7381
apnic|JP|ipv6|2001:200::|35|19990813|allocated|A918EDB2
apnic|KR|ipv4|203.233.0.0|65536||available
apnic||ipv4|203.0.113.0|256||reserved
";

/// Synthetic RIPE NCC file; carries FR and DE records plus one IPv6 prefix
/// that duplicates an APNIC record for cross-registry dedup tests
#[allow(dead_code)]
pub const SAMPLE_RIPENCC_FILE: &str = "\
2|ripencc|20240105|5|19830705|20240104|+0100
ripencc|FR|asn|3215|1|19930901|allocated
ripencc|FR|ipv4|2.0.0.0|1048576|20100712|allocated
ripencc|KR|ipv6|2001:220::|32|19990922|allocated
ripencc|FR|ipv6|2001:660::|32|19950101|assigned
ripencc|DE|asn|3320|1|19930901|allocated
";
