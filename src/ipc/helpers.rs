use crate::config::Config;
use crate::edit::{apply_edits, RowEdit};
use crate::ipc::error::HandlerErr;
use crate::ipc::types::{AppState, Request};
use crate::table::write_text_file;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::PathBuf;

pub fn config<'a>(state: &'a AppState) -> Result<&'a Config, HandlerErr> {
    state
        .config
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn opt_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Deserializes `params[key]`; absent or null yields `None`.
pub fn opt_param<T: DeserializeOwned>(req: &Request, key: &str) -> Result<Option<T>, HandlerErr> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| HandlerErr::bad_params(format!("invalid {}: {}", key, e))),
    }
}

/// Shared body of the `*.edit` methods: start from `params.rows` (the in-view
/// table) or from `current`, then apply `params.ops`.
pub fn edit_rows<R: DeserializeOwned>(
    req: &Request,
    current: impl FnOnce() -> anyhow::Result<Vec<R>>,
) -> Result<Vec<R>, HandlerErr> {
    let rows = match opt_param::<Vec<R>>(req, "rows")? {
        Some(rows) => rows,
        None => current().map_err(HandlerErr::storage)?,
    };
    let ops = opt_param::<Vec<RowEdit<R>>>(req, "ops")?.unwrap_or_default();
    apply_edits(rows, ops).map_err(|e| {
        HandlerErr::bad_params(e.to_string()).with_details(json!({
            "step": e.step,
            "index": e.index,
            "len": e.len,
        }))
    })
}

/// Download payload for `*.export`: written to `params.outPath` when given,
/// returned inline otherwise.
pub fn export_result(req: &Request, file_name: &str, csv: String) -> Result<Value, HandlerErr> {
    match opt_str(req, "outPath") {
        Some(out_path) => {
            write_text_file(&PathBuf::from(&out_path), &csv).map_err(|e| {
                HandlerErr::new("export_failed", format!("{e:#}"))
                    .with_details(json!({ "path": out_path }))
            })?;
            Ok(json!({
                "fileName": file_name,
                "mimeType": "text/csv",
                "path": out_path,
                "bytes": csv.len(),
            }))
        }
        None => Ok(json!({
            "fileName": file_name,
            "mimeType": "text/csv",
            "content": csv,
        })),
    }
}
