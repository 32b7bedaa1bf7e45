#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;

use aero_ssdt_topology::{build_ssdt, InMemoryStore, PlatformDescription, SsdtConfig};
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Generate an SSDT with processor devices and their power management objects")]
struct Args {
    /// Platform description (JSON) listing processors and the records they link to.
    #[arg(long)]
    input: PathBuf,

    /// Where to write the SSDT blob.
    #[arg(long)]
    output: PathBuf,

    /// OEM ID (at most 6 ASCII characters, space padded).
    #[arg(long, default_value = "AERO")]
    oem_id: String,

    /// OEM table ID (at most 8 ASCII characters, space padded).
    #[arg(long, default_value = "AEROCPUT")]
    oem_table_id: String,

    #[arg(long, default_value_t = 1)]
    oem_revision: u32,
}

fn padded<const N: usize>(value: &str, flag: &str) -> Result<[u8; N]> {
    if !value.is_ascii() || value.len() > N {
        bail!("{flag} must be at most {N} ASCII characters, got {value:?}");
    }
    let mut out = [b' '; N];
    out[..value.len()].copy_from_slice(value.as_bytes());
    Ok(out)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let desc = PlatformDescription::from_json(&json)
        .with_context(|| format!("invalid platform description {}", args.input.display()))?;
    let store = InMemoryStore::from_description(desc)?;

    let cfg = SsdtConfig {
        oem_id: padded(&args.oem_id, "--oem-id")?,
        oem_table_id: padded(&args.oem_table_id, "--oem-table-id")?,
        oem_revision: args.oem_revision,
        ..Default::default()
    };
    let table = build_ssdt(&store, &cfg).context("SSDT generation failed")?;

    fs::write(&args.output, &table.bytes)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    tracing::info!(
        "wrote {} ({} bytes, {} processors, {} C-state groups, {} warnings)",
        args.output.display(),
        table.bytes.len(),
        table.report.processor_count,
        table.report.cstate_group_count,
        table.report.warnings.len()
    );
    Ok(())
}
