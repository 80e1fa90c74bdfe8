use crate::aggregator::{self, CountryDataset};
use crate::errors::{AppError, AppResult};
use crate::models::{DataType, RunRequest};
use crate::output::format;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

async fn write_file(path: PathBuf, contents: String) -> AppResult<()> {
    fs::write(&path, contents).await.map_err(|e| {
        AppError::Io(format!("Failed to write {}: {e}", path.display()))
    })?;
    debug!(file = %path.display(), "Wrote output file");
    Ok(())
}

async fn ensure_output_dir(output_dir: &Path) -> AppResult<()> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir)
            .await
            .map_err(|e| AppError::Io(format!("Failed to create output directory: {e}")))?;
    }
    Ok(())
}

/// Writes the per-country output files for every requested data type.
///
/// For each country this produces `{COUNTRY}_{type}_list.csv` and, for the IP
/// types, a `{COUNTRY}_{type}.rsc` RouterOS script. Countries with no
/// matching records still get their files, with a header-only CSV and an
/// empty script.
///
/// # Errors
///
/// Returns `Io` if the output directory cannot be created or a file cannot
/// be written.
pub async fn write_country_files(
    output_dir: &Path,
    request: &RunRequest,
    datasets: &BTreeMap<String, CountryDataset>,
) -> AppResult<()> {
    ensure_output_dir(output_dir).await?;

    for (country, dataset) in datasets {
        for data_type in &request.data_types {
            let csv_name = format!("{country}_{}_list.csv", data_type.file_label());
            match data_type {
                DataType::Asn => {
                    write_file(output_dir.join(csv_name), format::asn_csv(&dataset.asn)?).await?;
                }
                DataType::Ipv4 => {
                    write_file(output_dir.join(csv_name), format::ipv4_csv(&dataset.ipv4)?)
                        .await?;
                    write_file(
                        output_dir.join(format!("{country}_ipv4.rsc")),
                        format::ipv4_router_script(country, &dataset.ipv4),
                    )
                    .await?;
                }
                DataType::Ipv6 => {
                    write_file(output_dir.join(csv_name), format::ipv6_csv(&dataset.ipv6)?)
                        .await?;
                    write_file(
                        output_dir.join(format!("{country}_ipv6.rsc")),
                        format::ipv6_router_script(country, &dataset.ipv6),
                    )
                    .await?;
                }
            }
        }
    }

    info!(
        countries = datasets.len(),
        directory = %output_dir.display(),
        "Country output files written"
    );
    Ok(())
}

/// Writes the global `{type}_ranges.txt` files for the requested data types.
///
/// Each file holds the ranges of all requested countries combined, merged
/// across countries with the same algorithm used per country. Files are
/// rewritten from scratch on every run; an empty result produces an empty
/// file rather than no file.
pub async fn write_range_files(
    output_dir: &Path,
    request: &RunRequest,
    datasets: &BTreeMap<String, CountryDataset>,
) -> AppResult<()> {
    ensure_output_dir(output_dir).await?;

    for data_type in &request.data_types {
        let contents = match data_type {
            DataType::Asn => format::asn_range_lines(&aggregator::global_asn_ranges(datasets)),
            DataType::Ipv4 => format::ipv4_range_lines(&aggregator::global_ipv4_ranges(datasets)),
            DataType::Ipv6 => format::ipv6_range_lines(&aggregator::global_ipv6_blocks(datasets)),
        };
        let name = format!("{}_ranges.txt", data_type.file_label());
        write_file(output_dir.join(name), contents).await?;
    }

    Ok(())
}
