//! Pure rendering functions over aggregated datasets.
//!
//! Every function here is deterministic over its input and performs no I/O,
//! so formatting is testable without touching the filesystem. Ordering always
//! follows the merged dataset ordering, which keeps CSV rows, range lists and
//! router scripts consistent with each other.

use crate::aggregator::{AsnRange, Ipv4Range, Ipv6Block};
use crate::errors::{AppError, AppResult};

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> AppResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Io(format!("Failed to flush CSV buffer: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AppError::Io(format!("CSV output is not UTF-8: {e}")))
}

/// Renders merged ASN ranges as CSV with a `start,end,count` header.
///
/// An empty input still produces the header row, so a country with no
/// matching records yields a well-formed empty file.
pub fn asn_csv(ranges: &[AsnRange]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["start", "end", "count"])?;
    for range in ranges {
        writer.write_record([
            range.start.to_string(),
            range.last().to_string(),
            range.count.to_string(),
        ])?;
    }
    finish_csv(writer)
}

/// Renders merged IPv4 ranges as CSV with a `first,last,cidrs,count` header.
///
/// The `cidrs` column carries the minimal covering networks joined with
/// `;` since a merged range is often not CIDR-aligned.
pub fn ipv4_csv(ranges: &[Ipv4Range]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["first", "last", "cidrs", "count"])?;
    for range in ranges {
        let cidrs = range
            .cidrs()
            .iter()
            .map(|net| net.to_string())
            .collect::<Vec<_>>()
            .join(";");
        writer.write_record([
            range.first().to_string(),
            range.last().to_string(),
            cidrs,
            range.count.to_string(),
        ])?;
    }
    finish_csv(writer)
}

/// Renders IPv6 blocks as CSV with a `prefix,prefix_length,slash64_count`
/// header.
pub fn ipv6_csv(blocks: &[Ipv6Block]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["prefix", "prefix_length", "slash64_count"])?;
    for block in blocks {
        writer.write_record([
            block.addr.to_string(),
            block.prefix_len.to_string(),
            block.slash64_count().to_string(),
        ])?;
    }
    finish_csv(writer)
}

/// Renders ASN ranges one per line: `1000-1014`, or `1000` for a single ASN.
pub fn asn_range_lines(ranges: &[AsnRange]) -> String {
    let mut out = String::new();
    for range in ranges {
        if range.count == 1 {
            out.push_str(&format!("{}\n", range.start));
        } else {
            out.push_str(&format!("{}-{}\n", range.start, range.last()));
        }
    }
    out
}

/// Renders IPv4 ranges as covering CIDR networks, one per line.
pub fn ipv4_range_lines(ranges: &[Ipv4Range]) -> String {
    let mut out = String::new();
    for range in ranges {
        for net in range.cidrs() {
            out.push_str(&format!("{net}\n"));
        }
    }
    out
}

/// Renders IPv6 blocks as `prefix/length`, one per line.
pub fn ipv6_range_lines(blocks: &[Ipv6Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        out.push_str(&format!("{}\n", block.net()));
    }
    out
}

/// Renders a MikroTik RouterOS address-list script for IPv4 ranges.
///
/// One statement per covering CIDR, ordered exactly like the CSV rows. The
/// list name is `<country>-ipv4` in lowercase.
pub fn ipv4_router_script(country: &str, ranges: &[Ipv4Range]) -> String {
    let list = format!("{}-ipv4", country.to_lowercase());
    let mut out = String::new();
    for range in ranges {
        for net in range.cidrs() {
            out.push_str(&format!(
                "/ip firewall address-list add list={list} address={net}\n"
            ));
        }
    }
    out
}

/// Renders a MikroTik RouterOS address-list script for IPv6 blocks.
pub fn ipv6_router_script(country: &str, blocks: &[Ipv6Block]) -> String {
    let list = format!("{}-ipv6", country.to_lowercase());
    let mut out = String::new();
    for block in blocks {
        out.push_str(&format!(
            "/ipv6 firewall address-list add list={list} address={}\n",
            block.net()
        ));
    }
    out
}
