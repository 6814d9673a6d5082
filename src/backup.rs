use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const UNITS_ENTRY: &str = "tables/units.csv";
const TARGETS_ENTRY: &str = "tables/targets.csv";
pub const BUNDLE_FORMAT_V1: &str = "iqac-workspace-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub bundle_id: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub tables_restored: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Zips whichever of the two tables exist, with a manifest of their digests.
pub fn export_workspace_bundle(
    units_path: &Path,
    targets_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }

    let mut tables = Vec::new();
    for (key, entry, path) in [
        ("units", UNITS_ENTRY, units_path),
        ("targets", TARGETS_ENTRY, targets_path),
    ] {
        if !path.is_file() {
            continue;
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read table {}", path.to_string_lossy()))?;
        tables.push((key, entry, bytes));
    }

    let bundle_id = Uuid::new_v4().to_string();
    let mut table_meta = serde_json::Map::new();
    for (key, entry, bytes) in &tables {
        table_meta.insert(
            key.to_string(),
            json!({ "entry": entry, "sha256": sha256_hex(bytes), "bytes": bytes.len() }),
        );
    }
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "bundleId": bundle_id,
        "tables": table_meta,
    });

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (_, entry, bytes) in &tables {
        zip.start_file(*entry, opts)
            .with_context(|| format!("failed to start entry {}", entry))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write entry {}", entry))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;

    tracing::info!(
        out = %out_path.display(),
        bundle_id = %bundle_id,
        tables = tables.len(),
        "workspace bundle exported"
    );
    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        bundle_id,
        entry_count: tables.len() + 1,
    })
}

/// Restores both tables from a bundle. Every digest is checked before any
/// table is replaced; a table absent from the bundle is removed.
pub fn import_workspace_bundle(
    in_path: &Path,
    units_path: &Path,
    targets_path: &Path,
) -> anyhow::Result<ImportSummary> {
    if !is_zip_file(in_path)? {
        return Err(anyhow!(
            "not a workspace bundle: {}",
            in_path.to_string_lossy()
        ));
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut restored: Vec<(&Path, Option<Vec<u8>>)> = Vec::new();
    for (key, entry, dst) in [
        ("units", UNITS_ENTRY, units_path),
        ("targets", TARGETS_ENTRY, targets_path),
    ] {
        let Some(meta) = manifest.get("tables").and_then(|t| t.get(key)) else {
            restored.push((dst, None));
            continue;
        };
        let expected = meta
            .get("sha256")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("manifest missing sha256 for {}", key))?;
        let mut bytes = Vec::new();
        archive
            .by_name(entry)
            .with_context(|| format!("bundle missing {}", entry))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read {}", entry))?;
        if sha256_hex(&bytes) != expected {
            return Err(anyhow!("checksum mismatch for {}", entry));
        }
        restored.push((dst, Some(bytes)));
    }

    let mut tables_restored = 0usize;
    for (dst, bytes) in restored {
        match bytes {
            Some(bytes) => {
                replace_file(dst, &bytes)?;
                tables_restored += 1;
            }
            None if dst.exists() => {
                std::fs::remove_file(dst).with_context(|| {
                    format!("failed to remove table {}", dst.to_string_lossy())
                })?;
            }
            None => {}
        }
    }

    tracing::info!(
        bundle = %in_path.display(),
        tables_restored,
        "workspace bundle imported"
    );
    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        tables_restored,
    })
}

fn replace_file(dst: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }
    let mut tmp_name = dst.as_os_str().to_owned();
    tmp_name.push(".importing");
    let tmp_dst = std::path::PathBuf::from(tmp_name);
    if tmp_dst.exists() {
        let _ = std::fs::remove_file(&tmp_dst);
    }

    let mut out = File::create(&tmp_dst).with_context(|| {
        format!("failed to create temp table {}", tmp_dst.to_string_lossy())
    })?;
    out.write_all(bytes)
        .context("failed to write extracted table")?;
    out.flush().context("failed to flush extracted table")?;
    drop(out);

    std::fs::rename(&tmp_dst, dst).with_context(|| {
        format!(
            "failed to move extracted table to {}",
            dst.to_string_lossy()
        )
    })
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    fn write_bundle_with(path: &Path, manifest: serde_json::Value, units: &[u8]) {
        let mut zip = ZipWriter::new(File::create(path).expect("create zip"));
        let opts = FileOptions::default();
        zip.start_file(MANIFEST_ENTRY, opts).expect("manifest");
        zip.write_all(manifest.to_string().as_bytes()).expect("write manifest");
        zip.start_file(UNITS_ENTRY, opts).expect("units");
        zip.write_all(units).expect("write units");
        zip.finish().expect("finish");
    }

    #[test]
    fn export_only_includes_existing_tables() {
        let src = temp_dir("iqacd-backup-partial");
        let units = src.join("units.csv");
        std::fs::write(&units, "School,Department\nArts,History\n").expect("write");
        let out = src.join("out.zip");
        let summary =
            export_workspace_bundle(&units, &src.join("targets.csv"), &out).expect("export");
        assert_eq!(summary.entry_count, 2);
        assert_eq!(summary.bundle_format, BUNDLE_FORMAT_V1);

        let mut archive = ZipArchive::new(File::open(&out).expect("open")).expect("zip");
        assert!(archive.by_name(UNITS_ENTRY).is_ok());
        assert!(archive.by_name(TARGETS_ENTRY).is_err());
    }

    #[test]
    fn tampered_table_is_rejected_before_anything_is_replaced() {
        let dir = temp_dir("iqacd-backup-tampered");
        let bundle = dir.join("bad.zip");
        write_bundle_with(
            &bundle,
            json!({
                "format": BUNDLE_FORMAT_V1,
                "tables": { "units": { "entry": UNITS_ENTRY, "sha256": sha256_hex(b"stored") } }
            }),
            b"tampered",
        );
        let units = dir.join("units.csv");
        std::fs::write(&units, "keep me").expect("write");
        let err = import_workspace_bundle(&bundle, &units, &dir.join("targets.csv")).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
        assert_eq!(std::fs::read_to_string(&units).expect("read"), "keep me");
    }

    #[test]
    fn wrong_format_and_non_zip_inputs_are_rejected() {
        let dir = temp_dir("iqacd-backup-format");
        let bundle = dir.join("other.zip");
        write_bundle_with(&bundle, json!({ "format": "iqac-workspace-v0" }), b"");
        let err = import_workspace_bundle(&bundle, &dir.join("u.csv"), &dir.join("t.csv"))
            .unwrap_err();
        assert!(err.to_string().contains("unsupported bundle format"));

        let plain = dir.join("plain.csv");
        std::fs::write(&plain, "School,Department\n").expect("write");
        assert!(import_workspace_bundle(&plain, &dir.join("u.csv"), &dir.join("t.csv")).is_err());
    }
}
