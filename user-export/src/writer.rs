use crate::error::{ExportError, ExportResult};
use crate::model::{EXPORT_HEADERS, ExportRow};
use chrono::{DateTime, TimeZone};
use config::OutputFormat;
use rust_xlsxwriter::{Format, Workbook};
use std::fmt::{Display, Write as _};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Byte-order mark written ahead of CSV content so spreadsheet tools detect UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Builds `{directory}/{filename}_{timestamp}.{ext}`, creating `directory`
/// when it does not exist yet.
pub fn output_path<Tz>(
    directory: impl AsRef<Path>,
    filename: &str,
    format: OutputFormat,
    timestamp_format: &str,
    now: &DateTime<Tz>
) -> ExportResult<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: Display
{
    let directory = directory.as_ref();
    fs::create_dir_all(directory).map_err(|e| {
        ExportError::WriteError(format!(
            "Cannot create output directory {}: {}",
            directory.display(),
            e
        ))
    })?;

    let mut stamp = String::new();
    write!(stamp, "{}", now.format(timestamp_format)).map_err(|_| {
        ExportError::ConfigError(format!("Invalid timestamp format: {}", timestamp_format))
    })?;

    Ok(directory.join(format!("{}_{}.{}", filename, stamp, format.extension())))
}

/// Writes the header row followed by one line per row, in the given format.
pub fn write_rows(rows: &[ExportRow], format: OutputFormat, path: &Path) -> ExportResult<()> {
    match format {
        OutputFormat::Csv => write_csv(rows, path)?,
        OutputFormat::Excel => write_excel(rows, path)?
    }
    info!(
        path = %path.display(),
        format = %format,
        rows = rows.len(),
        "Wrote export file"
    );
    Ok(())
}

fn write_csv(rows: &[ExportRow], path: &Path) -> ExportResult<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    wtr.write_record(EXPORT_HEADERS)?;
    for row in rows {
        wtr.write_record(row.fields())?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), "Flushed CSV writer");
    Ok(())
}

fn write_excel(rows: &[ExportRow], path: &Path) -> ExportResult<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    for (index, row) in rows.iter().enumerate() {
        let line = (index + 1) as u32;
        for (col, value) in row.fields().iter().enumerate() {
            worksheet.write_string(line, col as u16, *value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}
