//! CSV export of indicator data for spreadsheets.

use thiserror::Error;

use crate::chart::date_sort_key;
use crate::models::{Indicator, StatsResponse};

/// Field separator; spreadsheet locales the platform targets expect `;`.
const SEPARATOR: char = ';';

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExportError {
    #[error("Indicator {0} does not support data export")]
    NotExportable(String),
}

fn escape(field: &str) -> String {
    if field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render `data` as CSV with a `date;profile;module;<metric>` header,
/// rows sorted by date then profile.
pub fn export_csv(indicator: &Indicator, data: &[StatsResponse]) -> Result<String, ExportError> {
    if !indicator.data_exportable {
        return Err(ExportError::NotExportable(indicator.name.clone()));
    }

    let metric = indicator.api_type.as_str();
    let mut rows: Vec<&StatsResponse> = data.iter().collect();
    rows.sort_by_cached_key(|r| (date_sort_key(&r.date), r.profile.clone()));

    let mut out = format!("date{0}profile{0}module{0}{1}\n", SEPARATOR, metric);
    for row in rows {
        let fields = [
            escape(&row.date),
            escape(row.profile.as_deref().unwrap_or("")),
            escape(row.module.as_deref().unwrap_or("")),
            row.metric(metric).to_string(),
        ];
        out.push_str(&fields.join(&SEPARATOR.to_string()));
        out.push('\n');
    }
    Ok(out)
}
