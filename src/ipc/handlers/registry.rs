use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{config, edit_rows, export_result, opt_param};
use crate::ipc::types::{AppState, Request};
use crate::registry::{self, UnitRow, EXPORT_FILE_NAME, UNIT_COLUMNS};
use serde_json::{json, Value};

fn handle_load(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let cfg = config(state)?;
    let units = registry::load(&cfg.units_path).map_err(HandlerErr::storage)?;
    Ok(json!({
        "columns": UNIT_COLUMNS,
        "units": units,
        "schools": registry::schools(&units),
    }))
}

fn handle_edit(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let cfg = config(state)?;
    let rows = edit_rows::<UnitRow>(req, || {
        Ok(registry::load(&cfg.units_path)?
            .into_iter()
            .map(UnitRow::from)
            .collect())
    })?;
    Ok(json!({ "columns": UNIT_COLUMNS, "rows": rows }))
}

fn handle_save(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let cfg = config(state)?;
    let Some(rows) = opt_param::<Vec<UnitRow>>(req, "rows")? else {
        return Err(HandlerErr::bad_params("missing rows"));
    };
    let summary = registry::save(&cfg.units_path, rows).map_err(HandlerErr::storage)?;
    Ok(json!({ "saved": summary.saved, "dropped": summary.dropped }))
}

fn handle_export(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let rows = match opt_param::<Vec<UnitRow>>(req, "rows")? {
        Some(rows) => rows,
        None => {
            let cfg = config(state)?;
            registry::load(&cfg.units_path)
                .map_err(HandlerErr::storage)?
                .into_iter()
                .map(UnitRow::from)
                .collect()
        }
    };
    export_result(req, EXPORT_FILE_NAME, registry::export_csv(&rows))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "registry.load" => handle_load(state, req),
        "registry.edit" => handle_edit(state, req),
        "registry.save" => handle_save(state, req),
        "registry.export" => handle_export(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
