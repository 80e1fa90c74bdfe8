//! Static registry of upstream delegation-statistics sources.
//!
//! Adding a new source means adding one [`SourceDescriptor`] here; parsing and
//! aggregation pick up the dialect metadata without further changes.

use crate::models::Registry;

/// How a dialect encodes the `value` field of IPv6 records.
///
/// Every RIR currently publishes IPv6 delegations with a CIDR prefix length in
/// the value column, but the convention is kept per-dialect so a divergent
/// source can be described without touching the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ipv6ValueConvention {
    /// The value field is a prefix length (0..=128).
    PrefixLength,
    /// The value field is a count of addresses; only exact powers of two can
    /// be converted to a prefix, anything else is skipped with a warning.
    AddressCount,
}

/// Field layout metadata for one registry's delegation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: char,
    pub ipv6_value: Ipv6ValueConvention,
    /// Minimum populated fields for a delegation line
    /// (`registry|cc|type|start|value|date|status`).
    pub min_fields: usize,
}

impl Dialect {
    const fn delegated_extended() -> Self {
        Self {
            delimiter: '|',
            ipv6_value: Ipv6ValueConvention::PrefixLength,
            min_fields: 7,
        }
    }
}

/// One upstream delegation file: which registry it belongs to, where to fetch
/// it, and how to parse it.
#[derive(Debug, Clone, Copy)]
pub struct SourceDescriptor {
    pub registry: Registry,
    pub url: &'static str,
    pub dialect: Dialect,
}

impl SourceDescriptor {
    pub fn id(&self) -> &'static str {
        self.registry.label()
    }
}

/// Returns the configured delegation sources in stable order.
///
/// The order is fixed: it determines which record wins when two registries
/// report the same block, and it is the order fetch results are returned in.
pub fn list_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor {
            registry: Registry::Apnic,
            url: "https://ftp.apnic.net/stats/apnic/delegated-apnic-extended-latest",
            dialect: Dialect::delegated_extended(),
        },
        SourceDescriptor {
            registry: Registry::Afrinic,
            url: "https://ftp.afrinic.net/pub/stats/afrinic/delegated-afrinic-extended-latest",
            dialect: Dialect::delegated_extended(),
        },
        SourceDescriptor {
            registry: Registry::Arin,
            url: "https://ftp.arin.net/pub/stats/arin/delegated-arin-extended-latest",
            dialect: Dialect::delegated_extended(),
        },
        SourceDescriptor {
            registry: Registry::Lacnic,
            url: "https://ftp.lacnic.net/pub/stats/lacnic/delegated-lacnic-extended-latest",
            dialect: Dialect::delegated_extended(),
        },
        SourceDescriptor {
            registry: Registry::RipeNcc,
            url: "https://ftp.ripe.net/pub/stats/ripencc/delegated-ripencc-extended-latest",
            dialect: Dialect::delegated_extended(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sources_has_all_five_registries() {
        let sources = list_sources();
        assert_eq!(sources.len(), 5);

        let ids: Vec<&str> = sources.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["apnic", "afrinic", "arin", "lacnic", "ripencc"]);
    }

    #[test]
    fn test_list_sources_order_is_stable() {
        let first = list_sources();
        let second = list_sources();
        let first_ids: Vec<&str> = first.iter().map(|s| s.id()).collect();
        let second_ids: Vec<&str> = second.iter().map(|s| s.id()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_source_urls_are_parseable() {
        for source in list_sources() {
            let parsed = url::Url::parse(source.url);
            assert!(parsed.is_ok(), "source URL should parse: {}", source.url);
            assert_eq!(parsed.unwrap().scheme(), "https");
        }
    }

    #[test]
    fn test_dialects_use_pipe_delimiter_and_prefix_convention() {
        for source in list_sources() {
            assert_eq!(source.dialect.delimiter, '|');
            assert_eq!(source.dialect.ipv6_value, Ipv6ValueConvention::PrefixLength);
            assert_eq!(source.dialect.min_fields, 7);
        }
    }
}
