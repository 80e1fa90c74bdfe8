//! Integration tests for output rendering and file writing

#[path = "common/mod.rs"]
mod common;

use common::*;
use rirstat_cli::aggregator;
use rirstat_cli::models::{DataType, Registry};
use rirstat_cli::output::writer;
use rirstat_cli::parser;
use std::fs;
use tempfile::TempDir;

fn all_types() -> Vec<DataType> {
    vec![DataType::Asn, DataType::Ipv4, DataType::Ipv6]
}

#[tokio::test]
async fn test_write_country_files_produces_all_outputs() {
    let temp_dir = TempDir::new().unwrap();
    let records = parser::parse(SAMPLE_APNIC_FILE, &source(Registry::Apnic)).records;
    let request = request(&["KR"], all_types());
    let datasets = aggregator::aggregate(&records, &request);

    writer::write_country_files(temp_dir.path(), &request, &datasets)
        .await
        .unwrap();

    for name in [
        "KR_asn_list.csv",
        "KR_ipv4_list.csv",
        "KR_ipv6_list.csv",
        "KR_ipv4.rsc",
        "KR_ipv6.rsc",
    ] {
        assert!(temp_dir.path().join(name).exists(), "missing {name}");
    }

    let asn_csv = fs::read_to_string(temp_dir.path().join("KR_asn_list.csv")).unwrap();
    let lines: Vec<&str> = asn_csv.lines().collect();
    assert_eq!(lines[0], "start,end,count");
    assert_eq!(lines[1], "1000,1014,15");

    let rsc = fs::read_to_string(temp_dir.path().join("KR_ipv4.rsc")).unwrap();
    assert!(rsc.contains("/ip firewall address-list add list=kr-ipv4 address="));
}

#[tokio::test]
async fn test_empty_country_still_gets_well_formed_files() {
    let temp_dir = TempDir::new().unwrap();
    let records = parser::parse(SAMPLE_APNIC_FILE, &source(Registry::Apnic)).records;
    let request = request(&["ZZ"], all_types());
    let datasets = aggregator::aggregate(&records, &request);

    writer::write_country_files(temp_dir.path(), &request, &datasets)
        .await
        .unwrap();
    writer::write_range_files(temp_dir.path(), &request, &datasets)
        .await
        .unwrap();

    // Header-only CSV, empty script and empty range files rather than
    // missing files
    let asn_csv = fs::read_to_string(temp_dir.path().join("ZZ_asn_list.csv")).unwrap();
    assert_eq!(asn_csv, "start,end,count\n");

    let rsc = fs::read_to_string(temp_dir.path().join("ZZ_ipv4.rsc")).unwrap();
    assert!(rsc.is_empty());

    let ranges = fs::read_to_string(temp_dir.path().join("asn_ranges.txt")).unwrap();
    assert!(ranges.is_empty());
}

#[tokio::test]
async fn test_range_files_are_global_and_merged() {
    let temp_dir = TempDir::new().unwrap();
    let mut records = parser::parse(SAMPLE_APNIC_FILE, &source(Registry::Apnic)).records;
    records.extend(parser::parse(SAMPLE_RIPENCC_FILE, &source(Registry::RipeNcc)).records);
    let request = request(&["KR", "FR"], all_types());
    let datasets = aggregator::aggregate(&records, &request);

    writer::write_range_files(temp_dir.path(), &request, &datasets)
        .await
        .unwrap();

    let asn_ranges = fs::read_to_string(temp_dir.path().join("asn_ranges.txt")).unwrap();
    let lines: Vec<&str> = asn_ranges.lines().collect();
    assert!(lines.contains(&"1000-1014"));
    assert!(lines.contains(&"3215"));

    // The cross-registry duplicate IPv6 prefix appears exactly once
    let ipv6_ranges = fs::read_to_string(temp_dir.path().join("ipv6_ranges.txt")).unwrap();
    let dup_count = ipv6_ranges
        .lines()
        .filter(|l| *l == "2001:220::/32")
        .count();
    assert_eq!(dup_count, 1);
}

#[tokio::test]
async fn test_available_records_never_reach_output() {
    let temp_dir = TempDir::new().unwrap();
    let records = parser::parse(SAMPLE_APNIC_FILE, &source(Registry::Apnic)).records;
    let request = request(&["KR"], all_types());
    let datasets = aggregator::aggregate(&records, &request);

    writer::write_country_files(temp_dir.path(), &request, &datasets)
        .await
        .unwrap();
    writer::write_range_files(temp_dir.path(), &request, &datasets)
        .await
        .unwrap();

    // 203.233.0.0 only occurs in an `available` fixture line
    for entry in fs::read_dir(temp_dir.path()).unwrap() {
        let path = entry.unwrap().path();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(
            !contents.contains("203.233"),
            "available range leaked into {}",
            path.display()
        );
    }
}

#[tokio::test]
async fn test_only_requested_types_are_written() {
    let temp_dir = TempDir::new().unwrap();
    let records = parser::parse(SAMPLE_APNIC_FILE, &source(Registry::Apnic)).records;
    let request = request(&["KR"], vec![DataType::Asn]);
    let datasets = aggregator::aggregate(&records, &request);

    writer::write_country_files(temp_dir.path(), &request, &datasets)
        .await
        .unwrap();
    writer::write_range_files(temp_dir.path(), &request, &datasets)
        .await
        .unwrap();

    assert!(temp_dir.path().join("KR_asn_list.csv").exists());
    assert!(temp_dir.path().join("asn_ranges.txt").exists());
    assert!(!temp_dir.path().join("KR_ipv4_list.csv").exists());
    assert!(!temp_dir.path().join("ipv4_ranges.txt").exists());
}
