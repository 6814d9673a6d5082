use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{config, opt_param};
use crate::ipc::types::{AppState, Request};
use crate::progress::{self, ProgressView, MISSING_FILE_MESSAGE, NO_TARGETS_MESSAGE};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

fn handle_view(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let cfg = config(state)?;
    let seed = opt_param::<u64>(req, "seed")?;
    let view = match seed {
        Some(seed) => progress::view(&cfg.targets_path, &mut StdRng::seed_from_u64(seed)),
        None => progress::view(&cfg.targets_path, &mut rand::rng()),
    }
    .map_err(HandlerErr::storage)?;

    Ok(match view {
        ProgressView::Missing => json!({ "state": "missing", "message": MISSING_FILE_MESSAGE }),
        ProgressView::Empty => json!({ "state": "empty", "message": NO_TARGETS_MESSAGE }),
        ProgressView::Ready(records) => {
            let indicators = records
                .iter()
                .map(|r| progress::render(&r.target, r.achieved, r.percent_achieved))
                .collect::<Vec<_>>();
            let (columns, rows) = progress::listing(&records);
            json!({
                "state": "ready",
                "records": records,
                "indicators": indicators,
                "table": { "columns": columns, "rows": rows },
            })
        }
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "progress.view" => Some(match handle_view(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
