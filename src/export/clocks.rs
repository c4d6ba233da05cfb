//! Clock spreadsheets: grouped by employee, or by day then employee.

use std::collections::BTreeMap;

use chrono::{Datelike, FixedOffset, NaiveDate};

use crate::error::{AppError, Result};
use crate::export::sheet::{NO_DATA, Sheet};
use crate::export::xlsx::XlsxLayout;
use crate::models::clock::ClockRecord;
use crate::table::column::CellValue;

pub const HEADERS: [&str; 8] = [
    "Date",
    "Time",
    "Type",
    "Monthly Score",
    "PIN Code",
    "Latitude",
    "Longitude",
    "Maps Link",
];

pub const WIDTHS: [f64; 8] = [20.0, 10.0, 10.0, 12.0, 10.0, 12.0, 12.0, 50.0];

pub const GROUPED_LAYOUT: XlsxLayout<'static> = XlsxLayout {
    name: "Clocks",
    widths: &WIDTHS,
    link_column: Some(7),
};

pub const MONTHLY_LAYOUT: XlsxLayout<'static> = XlsxLayout {
    name: "Monthly clocks",
    widths: &WIDTHS,
    link_column: Some(7),
};

fn blank_row() -> Vec<CellValue> {
    vec![CellValue::Blank; HEADERS.len()]
}

fn employee_header(record: &ClockRecord) -> Vec<CellValue> {
    let mut row = blank_row();
    row[0] = CellValue::Text(format!("👤 {}", record.employee.display_name()));
    if let Some(employee) = record.employee.employee() {
        row[3] = employee.monthly_score.into();
        if !employee.pin_code.is_empty() {
            row[4] = employee.pin_code.as_str().into();
        }
    }
    row
}

fn clock_row(record: &ClockRecord, offset: &FixedOffset) -> Vec<CellValue> {
    let local = record.timestamp.with_timezone(offset);
    let mut row = blank_row();
    row[0] = local.format("%d/%m/%Y").to_string().into();
    row[1] = local.format("%H:%M:%S").to_string().into();
    row[2] = record.clock_type.label().into();
    row[5] = format!("{:.6}", record.location_lat).into();
    row[6] = format!("{:.6}", record.location_lng).into();
    row[7] = record.maps_url().into();
    row
}

/// Appends one block per employee, alphabetical, each chronological.
fn push_employee_groups(rows: &mut Vec<Vec<CellValue>>, clocks: &[&ClockRecord], offset: &FixedOffset) {
    let mut by_employee: BTreeMap<String, Vec<&ClockRecord>> = BTreeMap::new();
    for &record in clocks {
        by_employee
            .entry(record.employee.display_name())
            .or_default()
            .push(record);
    }

    for (index, (_, mut records)) in by_employee.into_iter().enumerate() {
        records.sort_by_key(|record| record.timestamp);
        if index > 0 {
            rows.push(blank_row());
        }
        rows.push(employee_header(records[0]));
        rows.extend(records.iter().map(|record| clock_row(record, offset)));
    }
}

fn headers() -> Vec<String> {
    HEADERS.iter().map(|header| header.to_string()).collect()
}

/// Every clock, grouped by employee.
pub fn grouped_by_employee(clocks: &[ClockRecord], offset: &FixedOffset) -> Result<Sheet> {
    if clocks.is_empty() {
        return Err(AppError::Validation(NO_DATA.to_string()));
    }

    let refs: Vec<&ClockRecord> = clocks.iter().collect();
    let mut rows = Vec::new();
    push_employee_groups(&mut rows, &refs, offset);
    Ok(Sheet {
        headers: headers(),
        rows,
    })
}

/// The clocks of one month, grouped by day and then by employee.
///
/// `month` is any date inside the month; days are local to `offset`.
pub fn monthly(clocks: &[ClockRecord], month: NaiveDate, offset: &FixedOffset) -> Result<Sheet> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&ClockRecord>> = BTreeMap::new();
    for record in clocks {
        let day = record.timestamp.with_timezone(offset).date_naive();
        if day.year() == month.year() && day.month() == month.month() {
            by_day.entry(day).or_default().push(record);
        }
    }

    if by_day.is_empty() {
        return Err(AppError::Validation(NO_DATA.to_string()));
    }

    let mut rows = Vec::new();
    for (index, (day, records)) in by_day.iter().enumerate() {
        if index > 0 {
            rows.push(blank_row());
        }
        let mut header = blank_row();
        header[0] = format!("📅 {}", day.format("%A %d %B %Y")).into();
        rows.push(header);
        push_employee_groups(&mut rows, records, offset);
    }

    Ok(Sheet {
        headers: headers(),
        rows,
    })
}

/// `clocks-<month>-<year>.xlsx`, month in lowercase English.
pub fn monthly_file_name(month: NaiveDate) -> String {
    format!(
        "clocks-{}-{}.xlsx",
        month.format("%B").to_string().to_lowercase(),
        month.year()
    )
}
