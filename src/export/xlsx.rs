use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::Result;
use crate::export::sheet::Sheet;
use crate::table::column::CellValue;

/// Layout options for one worksheet.
#[derive(Debug, Clone, Default)]
pub struct XlsxLayout<'a> {
    /// Worksheet tab name.
    pub name: &'a str,
    /// Column widths in characters, left to right.
    pub widths: &'a [f64],
    /// Column whose `http` values are written as hyperlinks.
    pub link_column: Option<usize>,
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    as_link: bool,
) -> Result<()> {
    if cell.is_blank() {
        return Ok(());
    }
    match cell {
        CellValue::Int(value) => {
            worksheet.write_number(row, col, *value as f64)?;
        }
        CellValue::Float(value) => {
            worksheet.write_number(row, col, *value)?;
        }
        CellValue::Text(text) if as_link && text.starts_with("http") => {
            worksheet.write_url(row, col, text.as_str())?;
        }
        other => {
            worksheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

/// Renders a sheet into an `.xlsx` workbook with a bold header row.
pub fn to_xlsx(sheet: &Sheet, layout: &XlsxLayout<'_>) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    {
        let worksheet = workbook.add_worksheet();
        if !layout.name.is_empty() {
            worksheet.set_name(layout.name)?;
        }
        for (col, width) in layout.widths.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }
        worksheet.set_freeze_panes(1, 0)?;

        for (index, row) in sheet.rows.iter().enumerate() {
            let row_num = index as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let as_link = layout.link_column == Some(col);
                write_cell(worksheet, row_num, col as u16, cell, as_link)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
