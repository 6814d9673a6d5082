use crate::backup;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{config, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::path::PathBuf;

fn handle_export_workspace_bundle(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let out_path = required_str(req, "outPath")?;
    let cfg = config(state)?;
    let export = backup::export_workspace_bundle(
        &cfg.units_path,
        &cfg.targets_path,
        &PathBuf::from(&out_path),
    )
    .map_err(|e| {
        HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": out_path }))
    })?;
    Ok(json!({
        "path": out_path,
        "bundleFormat": export.bundle_format,
        "bundleId": export.bundle_id,
        "entryCount": export.entry_count,
    }))
}

fn handle_import_workspace_bundle(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let in_path = required_str(req, "inPath")?;
    let cfg = config(state)?;
    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return Err(HandlerErr::new("not_found", "bundle file not found")
            .with_details(json!({ "path": in_path })));
    }
    let import = backup::import_workspace_bundle(&src, &cfg.units_path, &cfg.targets_path)
        .map_err(|e| {
            HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": in_path }))
        })?;
    Ok(json!({
        "bundleFormatDetected": import.bundle_format_detected,
        "tablesRestored": import.tables_restored,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "backup.exportWorkspaceBundle" => handle_export_workspace_bundle(state, req),
        "backup.importWorkspaceBundle" => handle_import_workspace_bundle(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
