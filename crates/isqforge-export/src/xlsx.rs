use std::path::PathBuf;

use chrono::Local;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::debug;

use isqforge_config::Config;
use isqforge_utils::error::ExportError;
use isqforge_wizard::{Isq, IsqBundle, ProductProfile, SheetExporter};

/// Writes both result sets into a timestamped `.xlsx` workbook.
pub struct XlsxExporter {
    output_dir: PathBuf,
    file_stem: String,
}

impl XlsxExporter {
    /// Create an exporter writing under `output_dir` with the given file
    /// name stem.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, file_stem: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_stem: file_stem.into(),
        }
    }

    /// Create an exporter from the `[export]` configuration section.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config
                .export
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            config
                .export
                .file_stem
                .clone()
                .unwrap_or_else(|| "isqforge".to_string()),
        )
    }

    fn write_profile_sheet(
        worksheet: &mut Worksheet,
        profile: &ProductProfile,
        bold: &Format,
    ) -> Result<(), XlsxError> {
        worksheet.set_name("Profile")?;
        worksheet.set_column_width(0, 28)?;
        worksheet.set_column_width(1, 70)?;

        worksheet.write_string_with_format(0, 0, "Summary", bold)?;
        worksheet.write_string(0, 1, &profile.summary)?;

        let mut row: u32 = 2;
        worksheet.write_string_with_format(row, 0, "Field", bold)?;
        worksheet.write_string_with_format(row, 1, "Value", bold)?;
        row += 1;

        for (key, value) in &profile.details {
            worksheet.write_string(row, 0, key)?;
            worksheet.write_string(row, 1, &cell_text(value))?;
            row += 1;
        }

        Ok(())
    }

    fn write_isq_sheet(
        worksheet: &mut Worksheet,
        isqs: &IsqBundle,
        bold: &Format,
    ) -> Result<(), XlsxError> {
        worksheet.set_name("ISQs")?;
        worksheet.set_column_width(0, 28)?;
        worksheet.set_column_width(1, 70)?;

        let mut row: u32 = 0;
        row = Self::write_isq_section(worksheet, bold, row, "Configuration", &isqs.config)?;
        for (index, isq) in isqs.keys.iter().enumerate() {
            row = Self::write_isq_section(
                worksheet,
                bold,
                row,
                &format!("Key {}", index + 1),
                isq,
            )?;
        }
        for (index, isq) in isqs.buyers.iter().enumerate() {
            row = Self::write_isq_section(
                worksheet,
                bold,
                row,
                &format!("Buyer {}", index + 1),
                isq,
            )?;
        }

        Ok(())
    }

    /// Write one ISQ as a titled block of field/value rows; returns the
    /// next free row.
    fn write_isq_section(
        worksheet: &mut Worksheet,
        bold: &Format,
        mut row: u32,
        title: &str,
        isq: &Isq,
    ) -> Result<u32, XlsxError> {
        let heading = match isq.label() {
            Some(label) => format!("{title}: {label}"),
            None => title.to_string(),
        };
        worksheet.write_string_with_format(row, 0, &heading, bold)?;
        row += 1;

        for (key, value) in &isq.fields {
            worksheet.write_string(row, 0, key)?;
            worksheet.write_string(row, 1, &cell_text(value))?;
            row += 1;
        }

        // Blank spacer row between blocks
        Ok(row + 1)
    }
}

impl SheetExporter for XlsxExporter {
    fn export(&self, profile: &ProductProfile, isqs: &IsqBundle) -> Result<PathBuf, ExportError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();

        Self::write_profile_sheet(workbook.add_worksheet(), profile, &bold).map_err(wb_err)?;
        Self::write_isq_sheet(workbook.add_worksheet(), isqs, &bold).map_err(wb_err)?;

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!(
            "{}-{}.xlsx",
            self.file_stem,
            Local::now().format("%Y%m%d-%H%M%S")
        ));

        workbook.save(&path).map_err(wb_err)?;
        debug!(path = %path.display(), "workbook saved");

        Ok(path)
    }
}

fn wb_err(e: XlsxError) -> ExportError {
    ExportError::Workbook(e.to_string())
}

/// Render a service-defined JSON value as readable cell text.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(cell_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
