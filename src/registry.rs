//! School/department master list.

use crate::table::{
    self, non_empty_trimmed, read_table, render_table, write_text_file, SaveSummary,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

pub const UNIT_COLUMNS: [&str; 2] = ["School", "Department"];
pub const EXPORT_FILE_NAME: &str = "school_department_master.csv";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub school: String,
    pub department: String,
}

/// A unit row as it exists in an edit session; cells may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRow {
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl From<Unit> for UnitRow {
    fn from(u: Unit) -> Self {
        UnitRow {
            school: Some(u.school),
            department: Some(u.department),
        }
    }
}

/// Drops incomplete rows and collapses duplicates, keeping first occurrences.
///
/// Cells are compared after trimming, so `"CS "` and `"CS"` count as the
/// same department and only the first row is kept.
pub fn normalize<I>(rows: I) -> (Vec<Unit>, usize)
where
    I: IntoIterator<Item = UnitRow>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut dropped = 0usize;
    for row in rows {
        let school = row.school.as_deref().and_then(non_empty_trimmed);
        let department = row.department.as_deref().and_then(non_empty_trimmed);
        let (Some(school), Some(department)) = (school, department) else {
            dropped += 1;
            continue;
        };
        let unit = Unit { school, department };
        if seen.insert(unit.clone()) {
            out.push(unit);
        } else {
            dropped += 1;
        }
    }
    (out, dropped)
}

pub fn load(path: &Path) -> anyhow::Result<Vec<Unit>> {
    let Some(t) = read_table(path)? else {
        return Ok(Vec::new());
    };
    let idx = t.column_index();
    let school_col = table::lookup(&idx, UNIT_COLUMNS[0]);
    let dept_col = table::lookup(&idx, UNIT_COLUMNS[1]);
    let rows = t.rows.iter().map(|r| UnitRow {
        school: table::cell(r, school_col),
        department: table::cell(r, dept_col),
    });
    Ok(normalize(rows).0)
}

/// Replaces the registry with the proposed rows after the drop/dedup rules.
pub fn save(path: &Path, proposed: Vec<UnitRow>) -> anyhow::Result<SaveSummary> {
    let (units, dropped) = normalize(proposed);
    let csv = render_table(
        &UNIT_COLUMNS,
        units
            .iter()
            .map(|u| vec![Some(u.school.clone()), Some(u.department.clone())]),
    );
    write_text_file(path, &csv)?;
    tracing::info!(
        path = %path.display(),
        saved = units.len(),
        dropped,
        "unit registry saved"
    );
    Ok(SaveSummary {
        saved: units.len(),
        dropped,
    })
}

/// CSV rendition of in-view rows, unsaved and incomplete ones included.
pub fn export_csv(rows: &[UnitRow]) -> String {
    render_table(
        &UNIT_COLUMNS,
        rows.iter()
            .map(|r| vec![r.school.clone(), r.department.clone()]),
    )
}

pub fn schools(units: &[Unit]) -> Vec<String> {
    units
        .iter()
        .map(|u| u.school.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn departments_of(units: &[Unit], school: &str) -> Vec<String> {
    units
        .iter()
        .filter(|u| u.school == school)
        .map(|u| u.department.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "iqacd-registry-{}-{}",
            name,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir.join("units.csv")
    }

    fn row(school: Option<&str>, department: Option<&str>) -> UnitRow {
        UnitRow {
            school: school.map(str::to_string),
            department: department.map(str::to_string),
        }
    }

    fn unit(school: &str, department: &str) -> Unit {
        Unit {
            school: school.to_string(),
            department: department.to_string(),
        }
    }

    #[test]
    fn save_collapses_duplicates_and_drops_incomplete_rows() {
        let path = temp_path("dedup");
        let summary = save(
            &path,
            vec![
                row(Some("Engineering"), Some("CS")),
                row(Some("Engineering"), Some("CS")),
                row(Some("Engineering"), None),
                row(Some("  "), Some("Physics")),
                row(Some("Law"), Some("Civil")),
            ],
        )
        .expect("save");
        assert_eq!(summary, SaveSummary { saved: 2, dropped: 3 });

        let loaded = load(&path).expect("load");
        assert_eq!(loaded, vec![unit("Engineering", "CS"), unit("Law", "Civil")]);
    }

    #[test]
    fn duplicates_are_compared_after_trimming() {
        let (units, dropped) = normalize(vec![
            row(Some("Engineering"), Some("CS ")),
            row(Some(" Engineering"), Some("CS")),
        ]);
        assert_eq!(units, vec![unit("Engineering", "CS")]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn load_of_missing_file_is_empty() {
        let path = temp_path("missing").with_file_name("nope.csv");
        assert!(load(&path).expect("load").is_empty());
    }

    #[test]
    fn load_drops_incomplete_and_duplicate_rows_from_disk() {
        let path = temp_path("raw");
        std::fs::write(
            &path,
            "School,Department\nArts,History\nArts,\nArts,History\nArts,English\n",
        )
        .expect("write");
        assert_eq!(
            load(&path).expect("load"),
            vec![unit("Arts", "History"), unit("Arts", "English")]
        );
    }

    #[test]
    fn choices_are_distinct_and_sorted() {
        let units = vec![
            unit("Science", "Physics"),
            unit("Arts", "History"),
            unit("Science", "Chemistry"),
            unit("Arts", "English"),
        ];
        assert_eq!(schools(&units), vec!["Arts", "Science"]);
        assert_eq!(departments_of(&units, "Science"), vec!["Chemistry", "Physics"]);
        assert!(departments_of(&units, "Law").is_empty());
    }

    #[test]
    fn export_keeps_unsaved_incomplete_rows() {
        let csv = export_csv(&[row(Some("Arts"), None), row(Some("Law"), Some("Civil"))]);
        assert_eq!(csv, "School,Department\nArts,\nLaw,Civil\n");
    }
}
