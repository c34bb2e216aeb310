//! Packs the station list into every published artifact.
//!
//! Reads `intensity-points.json` and writes the V1 exports, the V2 KMOP
//! container and a copy of the source file into the output directory.

mod export;
mod source;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use kmop::{
    encode_v1, encode_v1_lz4, validate_stations, write_container, CompressionMode,
    ContainerHeader, StationV1, StationV2, Timestamp,
};

const DEFAULT_SOURCE: &str = "https://github.com/ingen084/kyoshin-monitor-observation-points";
const SOURCE_FILE_NAME: &str = "intensity-points.json";

/// Payload compression for the KMOP container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Compression {
    None,
    Lz4BlockArray,
    #[value(name = "gzip")]
    GZip,
    Brotli,
}

impl From<Compression> for CompressionMode {
    fn from(c: Compression) -> Self {
        match c {
            Compression::None => CompressionMode::None,
            Compression::Lz4BlockArray => CompressionMode::Lz4BlockArray,
            Compression::GZip => CompressionMode::GZip,
            Compression::Brotli => CompressionMode::Brotli,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "kmop-packer", version, about = "Packs observation station metadata")]
struct Args {
    /// Version label recorded in the container header (e.g. v1.0.0)
    data_version: String,

    /// Directory the artifacts are written to; created if missing
    output_dir: PathBuf,

    /// Source station list
    #[arg(long, default_value = SOURCE_FILE_NAME)]
    input: PathBuf,

    /// Provenance recorded in the container header
    #[arg(long, default_value = DEFAULT_SOURCE)]
    source: String,

    #[arg(long, value_enum, default_value_t = Compression::Lz4BlockArray)]
    compression: Compression,

    /// Pack time recorded in the header as RFC 3339; defaults to now
    #[arg(long, value_parser = parse_packed_at)]
    packed_at: Option<Timestamp>,
}

fn parse_packed_at(s: &str) -> Result<Timestamp, String> {
    Timestamp::parse_rfc3339(s).map_err(|e| e.to_string())
}

fn write_artifact(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn write_kmop(dir: &Path, header: &ContainerHeader, stations: &[StationV2]) -> Result<()> {
    let path = dir.join("intensity-points-v2.kmop");
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_container(&mut out, header, stations)
        .with_context(|| format!("failed to encode {}", path.display()))?;
    out.flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        "wrote {} ({:?}, {} stations)",
        path.display(),
        header.compression_mode,
        stations.len()
    );
    Ok(())
}

/// Copies the source list next to the artifacts unless it already is there.
fn copy_source(input: &Path, dir: &Path) -> Result<()> {
    let dest = dir.join(SOURCE_FILE_NAME);
    if let (Ok(a), Ok(b)) = (input.canonicalize(), dest.canonicalize()) {
        if a == b {
            info!("{} is already in the output directory", input.display());
            return Ok(());
        }
    }
    fs::copy(input, &dest)
        .with_context(|| format!("failed to copy {} to {}", input.display(), dest.display()))?;
    info!("copied {} to {}", input.display(), dest.display());
    Ok(())
}

fn run(args: Args) -> Result<()> {
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create {}", args.output_dir.display()))?;

    let json = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let stations = source::parse_stations(&json)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    info!("loaded {} stations from {}", stations.len(), args.input.display());

    let issues = validate_stations(&stations);
    for issue in &issues {
        warn!("{}", issue);
    }
    if !issues.is_empty() {
        warn!("{} validation issues; packing anyway", issues.len());
    }

    let v1: Vec<StationV1> = stations.iter().map(|s| s.to_v1()).collect();
    let v2: Vec<StationV2> = stations.iter().map(|s| s.to_v2()).collect();
    let dir = args.output_dir.as_path();

    write_artifact(dir, "intensity-points-v1.mpk", &encode_v1(&v1)?)?;
    write_artifact(dir, "intensity-points-v1.mpk.lz4", &encode_v1_lz4(&v1)?)?;
    let json = export::to_json(&v1).context("failed to render V1 JSON")?;
    write_artifact(dir, "intensity-points-v1.json", json.as_bytes())?;
    write_artifact(dir, "intensity-points-v1.csv", export::to_csv(&v1).as_bytes())?;

    let header = ContainerHeader::new(
        args.data_version,
        args.packed_at.unwrap_or_else(Timestamp::now),
        args.source,
        args.compression.into(),
    );
    write_kmop(dir, &header, &v2)?;

    copy_source(&args.input, dir)?;
    info!("packed {} stations into {}", stations.len(), dir.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Args::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["kmop-packer", "v1.0.0", "out"]).unwrap();
        assert_eq!(args.data_version, "v1.0.0");
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(args.input, PathBuf::from(SOURCE_FILE_NAME));
        assert_eq!(args.source, DEFAULT_SOURCE);
        assert_eq!(args.compression, Compression::Lz4BlockArray);
        assert_eq!(args.packed_at, None);
    }

    #[test]
    fn test_args_packed_at() {
        let args = Args::try_parse_from([
            "kmop-packer",
            "v",
            "out",
            "--packed-at",
            "2024-01-01T09:00:00+09:00",
        ])
        .unwrap();
        assert_eq!(args.packed_at, Some(Timestamp::new(1_704_067_200, 0)));

        assert!(
            Args::try_parse_from(["kmop-packer", "v", "out", "--packed-at", "yesterday"]).is_err()
        );
    }

    #[test]
    fn test_args_compression_names() {
        for (name, mode) in [
            ("none", CompressionMode::None),
            ("lz4-block-array", CompressionMode::Lz4BlockArray),
            ("gzip", CompressionMode::GZip),
            ("brotli", CompressionMode::Brotli),
        ] {
            let args =
                Args::try_parse_from(["kmop-packer", "v", "out", "--compression", name]).unwrap();
            assert_eq!(CompressionMode::from(args.compression), mode);
        }
    }

    #[test]
    fn test_args_require_positionals() {
        assert!(Args::try_parse_from(["kmop-packer", "v1.0.0"]).is_err());
    }
}
