use crate::error::{AppError, Result};
use crate::export::sheet::Sheet;

/// Writes a sheet as RFC 4180 CSV. Fields containing separators or quotes
/// are quoted; blanks are empty fields.
pub fn to_csv(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(&sheet.headers)?;
    for row in &sheet.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Export(e.error().to_string()))
}
