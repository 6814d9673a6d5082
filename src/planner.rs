//! Target planning: add-one with picklist validation, and lax bulk edit/save.

use crate::config::Config;
use crate::registry::{self, Unit};
use crate::table::{
    self, non_empty_trimmed, read_table, render_table, write_text_file, SaveSummary,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Department sentinel for a school-wide target.
pub const ALL_DEPARTMENTS: &str = "ALL";
pub const TARGET_COLUMNS: [&str; 4] = ["School", "Department", "Target Field", "Target Quantity"];
pub const EXPORT_FILE_NAME: &str = "iqac_target_plan.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub school: String,
    pub department: String,
    pub field: String,
    pub quantity: i64,
}

/// A stored or in-view target row; cells may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRow {
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    /// Quantity cell text that is not an integer, written back unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_text: Option<String>,
}

impl From<Target> for TargetRow {
    fn from(t: Target) -> Self {
        TargetRow {
            school: Some(t.school),
            department: Some(t.department),
            field: Some(t.field),
            quantity: Some(t.quantity),
            quantity_text: None,
        }
    }
}

impl TargetRow {
    fn from_cells(cells: [Option<String>; 4]) -> Self {
        let [school, department, field, quantity_cell] = cells;
        let quantity = quantity_cell.as_deref().and_then(parse_quantity);
        TargetRow {
            school,
            department,
            field,
            quantity,
            quantity_text: if quantity.is_some() { None } else { quantity_cell },
        }
    }

    fn quantity_cell(&self) -> Option<String> {
        self.quantity
            .map(|q| q.to_string())
            .or_else(|| self.quantity_text.as_deref().and_then(non_empty_trimmed))
    }

    fn cells(&self) -> Vec<Option<String>> {
        vec![
            self.school.clone(),
            self.department.clone(),
            self.field.clone(),
            self.quantity_cell(),
        ]
    }

    /// The row as a usable target: every cell present and an integer quantity.
    pub fn target(&self) -> Option<Target> {
        Some(Target {
            school: self.school.as_deref().and_then(non_empty_trimmed)?,
            department: self.department.as_deref().and_then(non_empty_trimmed)?,
            field: self.field.as_deref().and_then(non_empty_trimmed)?,
            quantity: self.quantity?,
        })
    }

    /// Trimmed copy when no required cell is missing. A quantity kept as raw
    /// text still counts as present.
    fn saved_form(&self) -> Option<TargetRow> {
        let quantity_text = match self.quantity {
            Some(_) => None,
            None => Some(self.quantity_text.as_deref().and_then(non_empty_trimmed)?),
        };
        Some(TargetRow {
            school: Some(self.school.as_deref().and_then(non_empty_trimmed)?),
            department: Some(self.department.as_deref().and_then(non_empty_trimmed)?),
            field: Some(self.field.as_deref().and_then(non_empty_trimmed)?),
            quantity: self.quantity,
            quantity_text,
        })
    }
}

/// Input of the add-one form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTarget {
    pub school: String,
    pub department: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AddTargetError {
    #[error("Target field cannot be empty.")]
    EmptyField,
    #[error("no schools in the registry; add units first")]
    RegistryEmpty,
    #[error("unknown school: {0}")]
    UnknownSchool(String),
    #[error("department {department} is not offered for school {school}")]
    UnknownDepartment { school: String, department: String },
    #[error("target quantity must be >= 0 (got {0})")]
    NegativeQuantity(i64),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Choices offered by the add-one form for the current registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub schools: Vec<String>,
    pub selected_school: Option<String>,
    pub departments: Vec<String>,
    pub can_add: bool,
}

/// Builds the picklists. An unknown or absent `school` falls back to the first one.
pub fn selection(units: &[Unit], school: Option<&str>) -> Selection {
    let schools = registry::schools(units);
    let selected_school = school
        .filter(|s| schools.iter().any(|x| x == s))
        .map(str::to_string)
        .or_else(|| schools.first().cloned());
    let departments = match &selected_school {
        Some(s) => department_choices(units, s),
        None => Vec::new(),
    };
    Selection {
        can_add: selected_school.is_some(),
        schools,
        selected_school,
        departments,
    }
}

fn department_choices(units: &[Unit], school: &str) -> Vec<String> {
    let mut out = vec![ALL_DEPARTMENTS.to_string()];
    out.extend(registry::departments_of(units, school));
    out
}

/// Accepts integers and integral floats such as `5.0`.
pub fn parse_quantity(s: &str) -> Option<i64> {
    let t = s.trim();
    if let Ok(v) = t.parse::<i64>() {
        return Some(v);
    }
    let f = t.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Every stored row, incomplete ones included. A missing file is empty.
pub fn load(path: &Path) -> anyhow::Result<Vec<TargetRow>> {
    Ok(load_rows(path)?.unwrap_or_default())
}

/// Like [`load`], but distinguishes a missing file (`None`) from an empty table.
pub fn load_rows(path: &Path) -> anyhow::Result<Option<Vec<TargetRow>>> {
    let Some(t) = read_table(path)? else {
        return Ok(None);
    };
    let idx = t.column_index();
    let cols = TARGET_COLUMNS.map(|c| table::lookup(&idx, c));
    Ok(Some(
        t.rows
            .iter()
            .map(|r| TargetRow::from_cells(cols.map(|c| table::cell(r, c))))
            .collect(),
    ))
}

/// Complete targets only, for the progress view. Rows that cannot be used
/// are skipped with a warning but stay on disk.
pub fn load_targets(path: &Path) -> anyhow::Result<Option<Vec<Target>>> {
    let Some(rows) = load_rows(path)? else {
        return Ok(None);
    };
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        match row.target() {
            Some(target) => out.push(target),
            None => tracing::warn!(
                path = %path.display(),
                row = i + 1,
                "skipping incomplete target row"
            ),
        }
    }
    Ok(Some(out))
}

fn render_rows(rows: &[TargetRow]) -> String {
    render_table(&TARGET_COLUMNS, rows.iter().map(TargetRow::cells))
}

fn check_new_target(units: &[Unit], input: &NewTarget) -> Result<Target, AddTargetError> {
    let field = input.field.trim();
    if field.is_empty() {
        return Err(AddTargetError::EmptyField);
    }
    let schools = registry::schools(units);
    if schools.is_empty() {
        return Err(AddTargetError::RegistryEmpty);
    }
    let school = input.school.trim();
    if !schools.iter().any(|s| s == school) {
        return Err(AddTargetError::UnknownSchool(school.to_string()));
    }
    let department = input.department.trim();
    if !department_choices(units, school).iter().any(|d| d == department) {
        return Err(AddTargetError::UnknownDepartment {
            school: school.to_string(),
            department: department.to_string(),
        });
    }
    if input.quantity < 0 {
        return Err(AddTargetError::NegativeQuantity(input.quantity));
    }
    Ok(Target {
        school: school.to_string(),
        department: department.to_string(),
        field: field.to_string(),
        quantity: input.quantity,
    })
}

/// Validates against the registry, appends to the stored table and persists it.
/// Existing rows are written back as they were read, incomplete ones included.
/// Returns the new target and the resulting row count.
pub fn add_target(cfg: &Config, input: &NewTarget) -> Result<(Target, usize), AddTargetError> {
    let units = registry::load(&cfg.units_path)?;
    let target = check_new_target(&units, input)?;
    let mut rows = load(&cfg.targets_path)?;
    rows.push(TargetRow::from(target.clone()));
    write_text_file(&cfg.targets_path, &render_rows(&rows))?;
    tracing::info!(
        school = %target.school,
        department = %target.department,
        field = %target.field,
        quantity = target.quantity,
        "target added"
    );
    Ok((target, rows.len()))
}

/// Drops rows missing school, department, field or quantity. Nothing else is
/// checked; a non-integer quantity is kept as written.
pub fn normalize<I>(rows: I) -> (Vec<TargetRow>, usize)
where
    I: IntoIterator<Item = TargetRow>,
{
    let mut out = Vec::new();
    let mut dropped = 0usize;
    for row in rows {
        match row.saved_form() {
            Some(r) => out.push(r),
            None => dropped += 1,
        }
    }
    (out, dropped)
}

pub fn save(path: &Path, proposed: Vec<TargetRow>) -> anyhow::Result<SaveSummary> {
    let (rows, dropped) = normalize(proposed);
    write_text_file(path, &render_rows(&rows))?;
    tracing::info!(
        path = %path.display(),
        saved = rows.len(),
        dropped,
        "target plan saved"
    );
    Ok(SaveSummary {
        saved: rows.len(),
        dropped,
    })
}

pub fn export_csv(rows: &[TargetRow]) -> String {
    render_rows(rows)
}
