use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::api::ApiGateway;
use crate::forms::{AddStudentForm, EntityForm};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based data row, not counting the header.
    pub row: usize,
    pub reasons: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    first_name: String,
    last_name: String,
    email: String,
    #[serde(default)]
    cell_phone: String,
    #[serde(default)]
    date_of_birth: String,
}

impl From<CsvRow> for AddStudentForm {
    fn from(row: CsvRow) -> Self {
        AddStudentForm {
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            cell_phone: row.cell_phone,
            date_of_birth: row.date_of_birth,
        }
    }
}

pub async fn import_students(
    api: &dyn ApiGateway,
    csv_path: &Path,
) -> anyhow::Result<ImportSummary> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    import_from_reader(api, reader).await
}

pub async fn import_from_reader<R: std::io::Read>(
    api: &dyn ApiGateway,
    mut reader: csv::Reader<R>,
) -> anyhow::Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = index + 1;
        let form = AddStudentForm::from(result.with_context(|| format!("malformed row {row}"))?);

        let violations = form.violations();
        if !violations.is_empty() {
            warn!(row, "skipping invalid student row");
            summary.skipped.push(SkippedRow {
                row,
                reasons: violations.messages(),
            });
            continue;
        }

        form.create(api)
            .await
            .with_context(|| format!("failed to create student from row {row}"))?;
        summary.created += 1;
    }

    info!(
        created = summary.created,
        skipped = summary.skipped.len(),
        "student import finished"
    );
    Ok(summary)
}
