use thiserror::Error;
use crate::models::SizeDistributionRow;

/// Errors that can occur while rendering an export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Buffer error: {0}")]
    BufferError(String),
}

/// Header keys of the distribution export, passed through the translator
pub const EXPORT_COLUMNS: [&str; 4] = ["export.garment", "export.category", "export.size", "export.count"];

/// Render the size distribution as CSV
///
/// `translate` maps header keys and garment/category labels to display
/// strings; pass [`identity_label`] when no translation is wanted.
pub fn render_csv<F>(rows: &[SizeDistributionRow], translate: F) -> Result<Vec<u8>, ExportError>
where
    F: Fn(&str) -> String,
{
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(EXPORT_COLUMNS.iter().map(|key| translate(key)))?;

    for row in rows {
        writer.write_record([
            translate(&row.garment_label),
            translate(&row.category),
            row.size_label.clone(),
            row.count.to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::BufferError(e.to_string()))
}

/// Translator that leaves every key as it is
pub fn identity_label(key: &str) -> String {
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_render_with_translation() {
        let rows = vec![SizeDistributionRow {
            garment_id: Uuid::nil(),
            garment_label: "work_jacket".to_string(),
            category: "outerwear".to_string(),
            size_label: "M".to_string(),
            count: 3,
        }];

        let bytes = render_csv(&rows, |key| match key {
            "export.garment" => "Garment".to_string(),
            "work_jacket" => "Work jacket".to_string(),
            other => other.to_string(),
        })
        .unwrap();

        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Garment,export.category,export.size,export.count");
        assert_eq!(lines[1], "Work jacket,outerwear,M,3");
    }

    #[test]
    fn test_render_empty() {
        let bytes = render_csv(&[], identity_label).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
