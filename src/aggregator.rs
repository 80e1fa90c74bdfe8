//! Filtering, sorting and range merging of parsed delegation records.
//!
//! Records are partitioned into per-country datasets for the requested
//! countries and data types. ASN and IPv4 delegations are unit ranges and get
//! merged when adjacent or overlapping; IPv6 delegations keep their prefix
//! form and are deduplicated exactly. The merge is a stable sort followed by
//! a single sweep, so the result is independent of input order.

use crate::models::{DataType, DelegationRecord, Resource, RunRequest};
use ipnet::{Ipv4Net, Ipv4Subnets, Ipv6Net};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A merged, inclusive run of consecutive ASNs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsnRange {
    pub start: u32,
    pub count: u64,
}

impl AsnRange {
    /// Last ASN covered by the range.
    pub fn last(&self) -> u64 {
        self.start as u64 + self.count - 1
    }
}

/// A merged run of consecutive IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Range {
    pub start: Ipv4Addr,
    pub count: u64,
}

impl Ipv4Range {
    pub fn first(&self) -> Ipv4Addr {
        self.start
    }

    /// Last address covered by the range.
    pub fn last(&self) -> Ipv4Addr {
        Ipv4Addr::from((u32::from(self.start) as u64 + self.count - 1) as u32)
    }

    /// Minimal set of CIDR networks exactly covering the range.
    ///
    /// RIR delegations are frequently not CIDR-aligned (counts like 768), so
    /// one merged range can decompose into several networks.
    pub fn cidrs(&self) -> Vec<Ipv4Net> {
        Ipv4Subnets::new(self.first(), self.last(), 0).collect()
    }
}

/// An IPv6 delegation in prefix form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ipv6Block {
    pub addr: Ipv6Addr,
    pub prefix_len: u8,
}

impl Ipv6Block {
    pub fn net(&self) -> Ipv6Net {
        Ipv6Net::new(self.addr, self.prefix_len)
            .expect("prefix length is validated during parsing")
    }

    /// Number of /64 networks the block spans; prefixes longer than /64
    /// cover less than one unit and report zero.
    pub fn slash64_count(&self) -> u128 {
        if self.prefix_len <= 64 {
            1u128 << (64 - self.prefix_len)
        } else {
            0
        }
    }
}

/// All retained allocations of one country, merged and ordered.
///
/// Built once per run and treated as read-only by the formatting stage.
#[derive(Debug, Clone, Default)]
pub struct CountryDataset {
    pub country: String,
    pub asn: Vec<AsnRange>,
    pub ipv4: Vec<Ipv4Range>,
    pub ipv6: Vec<Ipv6Block>,
}

impl CountryDataset {
    fn new(country: String) -> Self {
        Self {
            country,
            ..Self::default()
        }
    }

    /// Total merged entries across all data types.
    pub fn record_count(&self) -> usize {
        self.asn.len() + self.ipv4.len() + self.ipv6.len()
    }
}

/// Sorts and merges `(start, count)` unit ranges.
///
/// Adjacent or overlapping ranges (`prev_start + prev_count >= next_start`)
/// collapse into `[min(starts), max(ends))`. Ranges with identical starts are
/// resolved in favor of the larger count; the smaller one is subsumed. The
/// operation is idempotent and independent of input order.
fn merge_unit_ranges(mut ranges: Vec<(u64, u64)>) -> Vec<(u64, u64)> {
    ranges.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(ranges.len());
    for (start, count) in ranges {
        if let Some(last) = merged.last_mut() {
            let last_end = last.0 + last.1;
            if start <= last_end {
                let end = (start + count).max(last_end);
                last.1 = end - last.0;
                continue;
            }
        }
        merged.push((start, count));
    }
    merged
}

/// Deduplicates IPv6 blocks by exact `(address, prefix_length)` equality.
///
/// The same prefix reported by two registries is kept once; under the stable
/// source ordering the first occurrence wins and the duplicate is not an
/// error.
fn dedup_blocks(mut blocks: Vec<Ipv6Block>) -> Vec<Ipv6Block> {
    blocks.sort();
    blocks.dedup();
    blocks
}

/// Partitions records into per-country datasets for the requested countries
/// and data types.
///
/// Every requested country gets an entry, empty when nothing matched; the
/// caller surfaces the zero-result notice. Records for countries or types
/// outside the request are discarded.
pub fn aggregate(
    records: &[DelegationRecord],
    request: &RunRequest,
) -> BTreeMap<String, CountryDataset> {
    let mut asn_buckets: BTreeMap<&str, Vec<(u64, u64)>> = BTreeMap::new();
    let mut ipv4_buckets: BTreeMap<&str, Vec<(u64, u64)>> = BTreeMap::new();
    let mut ipv6_buckets: BTreeMap<&str, Vec<Ipv6Block>> = BTreeMap::new();

    for record in records {
        if !request.wants_country(&record.country)
            || !request.wants_type(record.resource.data_type())
        {
            continue;
        }
        match record.resource {
            Resource::Asn { start, count } => asn_buckets
                .entry(record.country.as_str())
                .or_default()
                .push((start as u64, count)),
            Resource::Ipv4 { start, count } => ipv4_buckets
                .entry(record.country.as_str())
                .or_default()
                .push((u32::from(start) as u64, count)),
            Resource::Ipv6 { addr, prefix_len } => ipv6_buckets
                .entry(record.country.as_str())
                .or_default()
                .push(Ipv6Block { addr, prefix_len }),
        }
    }

    let mut datasets = BTreeMap::new();
    for country in &request.countries {
        let mut dataset = CountryDataset::new(country.clone());

        if let Some(ranges) = asn_buckets.remove(country.as_str()) {
            dataset.asn = merge_unit_ranges(ranges)
                .into_iter()
                .map(|(start, count)| AsnRange {
                    start: start as u32,
                    count,
                })
                .collect();
        }
        if let Some(ranges) = ipv4_buckets.remove(country.as_str()) {
            dataset.ipv4 = merge_unit_ranges(ranges)
                .into_iter()
                .map(|(start, count)| Ipv4Range {
                    start: Ipv4Addr::from(start as u32),
                    count,
                })
                .collect();
        }
        if let Some(blocks) = ipv6_buckets.remove(country.as_str()) {
            dataset.ipv6 = dedup_blocks(blocks);
        }

        datasets.insert(country.clone(), dataset);
    }

    datasets
}

/// Merges the ASN ranges of all countries into one global ordered list.
pub fn global_asn_ranges(datasets: &BTreeMap<String, CountryDataset>) -> Vec<AsnRange> {
    let combined = datasets
        .values()
        .flat_map(|d| d.asn.iter().map(|r| (r.start as u64, r.count)))
        .collect();
    merge_unit_ranges(combined)
        .into_iter()
        .map(|(start, count)| AsnRange {
            start: start as u32,
            count,
        })
        .collect()
}

/// Merges the IPv4 ranges of all countries into one global ordered list.
pub fn global_ipv4_ranges(datasets: &BTreeMap<String, CountryDataset>) -> Vec<Ipv4Range> {
    let combined = datasets
        .values()
        .flat_map(|d| d.ipv4.iter().map(|r| (u32::from(r.start) as u64, r.count)))
        .collect();
    merge_unit_ranges(combined)
        .into_iter()
        .map(|(start, count)| Ipv4Range {
            start: Ipv4Addr::from(start as u32),
            count,
        })
        .collect()
}

/// Deduplicates the IPv6 blocks of all countries into one global ordered
/// list.
pub fn global_ipv6_blocks(datasets: &BTreeMap<String, CountryDataset>) -> Vec<Ipv6Block> {
    let combined = datasets
        .values()
        .flat_map(|d| d.ipv6.iter().copied())
        .collect();
    dedup_blocks(combined)
}
