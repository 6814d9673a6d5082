use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{config, edit_rows, export_result, opt_param, opt_str};
use crate::ipc::types::{AppState, Request};
use crate::planner::{self, AddTargetError, NewTarget, TargetRow, EXPORT_FILE_NAME, TARGET_COLUMNS};
use crate::registry;
use serde_json::{json, Value};

impl From<AddTargetError> for HandlerErr {
    fn from(e: AddTargetError) -> Self {
        match e {
            AddTargetError::Storage(e) => HandlerErr::storage(e),
            AddTargetError::RegistryEmpty => HandlerErr::new("registry_empty", e.to_string()),
            AddTargetError::UnknownSchool(ref school) => {
                HandlerErr::new("validation_failed", e.to_string())
                    .with_details(json!({ "field": "school", "value": school }))
            }
            AddTargetError::UnknownDepartment { ref department, .. } => {
                HandlerErr::new("validation_failed", e.to_string())
                    .with_details(json!({ "field": "department", "value": department }))
            }
            AddTargetError::NegativeQuantity(q) => HandlerErr::new("validation_failed", e.to_string())
                .with_details(json!({ "field": "quantity", "value": q })),
            AddTargetError::EmptyField => HandlerErr::new("validation_failed", e.to_string())
                .with_details(json!({ "field": "field" })),
        }
    }
}

fn handle_options(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let cfg = config(state)?;
    let units = registry::load(&cfg.units_path).map_err(HandlerErr::storage)?;
    let school = opt_str(req, "school");
    let sel = planner::selection(&units, school.as_deref());
    Ok(json!({
        "schools": sel.schools,
        "selectedSchool": sel.selected_school,
        "departments": sel.departments,
        "canAdd": sel.can_add,
        "defaultQuantity": 0,
    }))
}

fn handle_add_target(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let cfg = config(state)?;
    let input: NewTarget = serde_json::from_value(req.params.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid target: {}", e)))?;
    let (target, count) = planner::add_target(cfg, &input)?;
    Ok(json!({ "target": target, "count": count }))
}

fn handle_load(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let cfg = config(state)?;
    let targets = planner::load(&cfg.targets_path).map_err(HandlerErr::storage)?;
    Ok(json!({ "columns": TARGET_COLUMNS, "targets": targets }))
}

fn handle_edit(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let cfg = config(state)?;
    let rows = edit_rows::<TargetRow>(req, || {
        planner::load(&cfg.targets_path)
    })?;
    Ok(json!({ "columns": TARGET_COLUMNS, "rows": rows }))
}

fn handle_save(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let cfg = config(state)?;
    let Some(rows) = opt_param::<Vec<TargetRow>>(req, "rows")? else {
        return Err(HandlerErr::bad_params("missing rows"));
    };
    let summary = planner::save(&cfg.targets_path, rows).map_err(HandlerErr::storage)?;
    Ok(json!({ "saved": summary.saved, "dropped": summary.dropped }))
}

fn handle_export(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let rows = match opt_param::<Vec<TargetRow>>(req, "rows")? {
        Some(rows) => rows,
        None => {
            let cfg = config(state)?;
            planner::load(&cfg.targets_path).map_err(HandlerErr::storage)?
        }
    };
    export_result(req, EXPORT_FILE_NAME, planner::export_csv(&rows))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "planner.options" => handle_options(state, req),
        "planner.addTarget" => handle_add_target(state, req),
        "planner.load" => handle_load(state, req),
        "planner.edit" => handle_edit(state, req),
        "planner.save" => handle_save(state, req),
        "planner.export" => handle_export(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
