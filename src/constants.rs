// HTTP client identification
pub const USER_AGENT: &str = concat!("rirstat-cli/", env!("CARGO_PKG_VERSION"));

// Pipeline defaults
pub const DEFAULT_OUTPUT_DIR: &str = "output_data";
pub const DEFAULT_MAX_WORKERS: usize = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// Data type aliases accepted on the command line
pub const ASN_ALIASES: &[&str] = &["asn", "as"];
pub const IPV4_ALIASES: &[&str] = &["ipv4", "v4", "4"];
pub const IPV6_ALIASES: &[&str] = &["ipv6", "v6", "6"];
pub const ALL_ALIAS: &str = "all";
