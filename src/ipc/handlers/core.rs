use crate::config::Config;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "unitsPath": state.config.as_ref().map(|c| c.units_path.to_string_lossy().to_string()),
            "targetsPath": state.config.as_ref().map(|c| c.targets_path.to_string_lossy().to_string()),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(required_str(req, "path")?);
    std::fs::create_dir_all(&path).map_err(|e| {
        HandlerErr::new("workspace_open_failed", e.to_string())
            .with_details(json!({ "path": path.to_string_lossy() }))
    })?;
    let cfg = Config::for_workspace(&path);
    tracing::info!(workspace = %path.display(), "workspace selected");
    let result = json!({
        "workspacePath": path.to_string_lossy(),
        "unitsPath": cfg.units_path.to_string_lossy(),
        "targetsPath": cfg.targets_path.to_string_lossy(),
    });
    state.config = Some(cfg);
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(
            handle_workspace_select(state, req)
                .map(|v| ok(&req.id, v))
                .unwrap_or_else(|e| e.response(&req.id)),
        ),
        _ => None,
    }
}
