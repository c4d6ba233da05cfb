use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::export::clocks::{self as clock_export, GROUPED_LAYOUT, MONTHLY_LAYOUT};
use crate::export::csv::to_csv;
use crate::export::sheet::Sheet;
use crate::export::xlsx::to_xlsx;
use crate::models::clock::{ClockRecord, ClockType};
use crate::models::session::Session;
use crate::repositories::clock as clock_repo;
use crate::state::AppState;
use crate::table::bulk::{BulkOutcome, run_sequential};
use crate::table::column::Column;
use crate::table::pagination::CLOCK_PAGE_SIZES;
use crate::table::selection::RowId;
use crate::table::view::{TableQuery, TableView};

/// A clock record as the table shows it, timed in the site's offset.
#[derive(Debug, Clone, Serialize)]
pub struct ClockRow {
    #[serde(flatten)]
    pub record: ClockRecord,
    pub local_time: DateTime<FixedOffset>,
}

impl ClockRow {
    pub fn new(record: ClockRecord, offset: &FixedOffset) -> Self {
        let local_time = record.timestamp.with_timezone(offset);
        Self { record, local_time }
    }
}

impl RowId for ClockRow {
    fn row_id(&self) -> i64 {
        self.record.id
    }
}

pub const COLUMNS: &[Column<ClockRow>] = &[
    Column::new("id", "ID", |c: &ClockRow| c.record.id.into()).unfilterable(),
    Column::new("employee", "Employee", |c: &ClockRow| c.record.employee.display_name().into()),
    Column::new("clock_type", "Type", |c: &ClockRow| c.record.clock_type.label().into()),
    Column::new("timestamp", "Date", |c: &ClockRow| c.local_time.into()),
    Column::new("pin_code", "PIN code", |c: &ClockRow| {
        c.record
            .pin_code
            .as_deref()
            .or_else(|| c.record.employee.employee().map(|e| e.pin_code.as_str()))
            .filter(|pin| !pin.is_empty())
            .into()
    }),
    Column::new("location", "Location", |c: &ClockRow| {
        format!("{:.6}, {:.6}", c.record.location_lat, c.record.location_lng).into()
    })
    .unsortable(),
    Column::new("maps_link", "Maps link", |c: &ClockRow| c.record.maps_url().into())
        .unsortable()
        .unfilterable(),
];

fn local_rows(clocks: Vec<ClockRecord>, offset: &FixedOffset) -> Vec<ClockRow> {
    clocks.into_iter().map(|clock| ClockRow::new(clock, offset)).collect()
}

/// Counts over a set of clocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClockStats {
    pub total: usize,
    pub clock_ins: usize,
    pub clock_outs: usize,
    pub unique_employees: usize,
}

impl ClockStats {
    pub fn of<'a>(clocks: impl IntoIterator<Item = &'a ClockRecord>) -> Self {
        let mut stats = ClockStats::default();
        let mut employees = HashSet::new();
        for clock in clocks {
            stats.total += 1;
            match clock.clock_type {
                ClockType::In => stats.clock_ins += 1,
                ClockType::Out => stats.clock_outs += 1,
            }
            employees.insert(clock.employee.id());
        }
        stats.unique_employees = employees.len();
        stats
    }
}

/// An employee whose latest clock today is a clock-in.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveEmployee {
    pub employee_id: i64,
    pub name: String,
    pub initials: Option<String>,
    pub phone_number: Option<String>,
    pub clocked_in_at: DateTime<Utc>,
    /// Time since clock-in, `Hh Mm`.
    pub on_site_for: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub maps_url: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub stats: ClockStats,
    /// Most recent clock-in first.
    pub active: Vec<ActiveEmployee>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub employee_id: Option<i64>,
    pub previous_date: NaiveDate,
    /// Absent when `date` is today: the view never moves into the future.
    pub next_date: Option<NaiveDate>,
    pub is_today: bool,
    pub stats: ClockStats,
    /// Newest first.
    pub clocks: Vec<ClockRecord>,
}

/// Formats an elapsed time as `Hh Mm`, truncating seconds.
pub fn format_duration(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn local_day(clock: &ClockRecord, offset: &FixedOffset) -> NaiveDate {
    clock.timestamp.with_timezone(offset).date_naive()
}

/// Today's statistics and who is currently on site.
pub fn dashboard(clocks: &[ClockRecord], now: DateTime<Utc>, offset: &FixedOffset) -> Dashboard {
    let today = now.with_timezone(offset).date_naive();
    let todays: Vec<&ClockRecord> = clocks
        .iter()
        .filter(|clock| local_day(clock, offset) == today)
        .collect();

    let mut latest: HashMap<i64, &ClockRecord> = HashMap::new();
    for &clock in &todays {
        latest
            .entry(clock.employee.id())
            .and_modify(|current| {
                if clock.timestamp > current.timestamp {
                    *current = clock;
                }
            })
            .or_insert(clock);
    }

    let mut active: Vec<ActiveEmployee> = latest
        .into_values()
        .filter(|clock| clock.clock_type == ClockType::In)
        .map(|clock| ActiveEmployee {
            employee_id: clock.employee.id(),
            name: clock.employee.display_name(),
            initials: clock.employee.employee().map(|e| e.initials()),
            phone_number: clock.employee.employee().and_then(|e| e.phone_number.clone()),
            clocked_in_at: clock.timestamp,
            on_site_for: format_duration(now - clock.timestamp),
            location_lat: clock.location_lat,
            location_lng: clock.location_lng,
            maps_url: clock.maps_url(),
            photo: clock.photo.clone(),
        })
        .collect();
    active.sort_by(|a, b| b.clocked_in_at.cmp(&a.clocked_in_at));

    Dashboard {
        date: today,
        stats: ClockStats::of(todays.iter().copied()),
        active,
    }
}

/// The clocks of one local day, optionally for one employee.
pub fn day_view(
    clocks: Vec<ClockRecord>,
    date: NaiveDate,
    employee_id: Option<i64>,
    now: DateTime<Utc>,
    offset: &FixedOffset,
) -> DayView {
    let today = now.with_timezone(offset).date_naive();
    let date = date.min(today);

    let mut selected: Vec<ClockRecord> = clocks
        .into_iter()
        .filter(|clock| local_day(clock, offset) == date)
        .filter(|clock| employee_id.is_none_or(|id| clock.employee.id() == id))
        .collect();
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    DayView {
        date,
        employee_id,
        previous_date: date.pred_opt().unwrap_or(date),
        next_date: (date < today).then(|| date.succ_opt().unwrap_or(date)),
        is_today: date == today,
        stats: ClockStats::of(&selected),
        clocks: selected,
    }
}

/// Parses `YYYY-MM`, defaulting to the current local month.
pub fn parse_month(raw: Option<&str>, now: DateTime<Utc>, offset: &FixedOffset) -> Result<NaiveDate> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
            .map_err(|_| AppError::Validation("Month must be formatted YYYY-MM".to_string())),
        None => {
            let today = now.with_timezone(offset).date_naive();
            NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
                .ok_or_else(|| AppError::Internal("Invalid current month".to_string()))
        }
    }
}

pub async fn table(state: &AppState, session: &Session, query: &TableQuery) -> Result<TableView<ClockRow>> {
    let clocks = clock_repo::list(&state.backend, &session.access_token).await?;
    tracing::debug!("Loaded {} clock records", clocks.len());
    let rows = local_rows(clocks, &state.config.utc_offset);
    Ok(TableView::client(rows, COLUMNS, query, CLOCK_PAGE_SIZES)?)
}

pub async fn get(state: &AppState, session: &Session, id: i64) -> Result<ClockRecord> {
    clock_repo::find(&state.backend, &session.access_token, id).await
}

pub async fn delete(state: &AppState, session: &Session, id: i64) -> Result<()> {
    clock_repo::delete(&state.backend, &session.access_token, id).await?;
    tracing::info!("🗑️ Clock record {} deleted", id);
    Ok(())
}

pub async fn bulk_delete(state: &AppState, session: &Session, ids: &[i64]) -> Result<BulkOutcome> {
    let outcome = run_sequential(ids, |id| delete(state, session, id)).await?;
    if outcome.is_complete() {
        tracing::info!("✅ Bulk delete: {} clock records removed", outcome.completed.len());
    } else {
        tracing::warn!(
            "⚠️ Bulk delete stopped: {}/{} clock records removed",
            outcome.completed.len(),
            outcome.requested
        );
    }
    Ok(outcome)
}

pub async fn load_dashboard(state: &AppState, session: &Session) -> Result<Dashboard> {
    let clocks = clock_repo::list(&state.backend, &session.access_token).await?;
    Ok(dashboard(&clocks, Utc::now(), &state.config.utc_offset))
}

/// Who is on site now, as CSV named after today's date. Columns are the
/// dashboard's own field names.
pub async fn export_present_csv(state: &AppState, session: &Session) -> Result<(String, Vec<u8>)> {
    let dashboard = load_dashboard(state, session).await?;
    let sheet = Sheet::from_records(&dashboard.active)?;
    Ok((format!("present-{}.csv", dashboard.date), to_csv(&sheet)?))
}

pub async fn load_day(
    state: &AppState,
    session: &Session,
    date: Option<NaiveDate>,
    employee_id: Option<i64>,
) -> Result<DayView> {
    let clocks = clock_repo::list(&state.backend, &session.access_token).await?;
    let now = Utc::now();
    let offset = &state.config.utc_offset;
    let date = date.unwrap_or_else(|| now.with_timezone(offset).date_naive());
    Ok(day_view(clocks, date, employee_id, now, offset))
}

async fn arranged(state: &AppState, session: &Session, query: &TableQuery) -> Result<Vec<ClockRow>> {
    let clocks = clock_repo::list(&state.backend, &session.access_token).await?;
    Ok(query.arrange(local_rows(clocks, &state.config.utc_offset), COLUMNS)?)
}

pub async fn export_csv(state: &AppState, session: &Session, query: &TableQuery) -> Result<Vec<u8>> {
    let rows = arranged(state, session, query).await?;
    to_csv(&Sheet::from_columns(&rows, COLUMNS)?)
}

/// The filtered clocks as a workbook grouped by employee.
pub async fn export_xlsx(state: &AppState, session: &Session, query: &TableQuery) -> Result<Vec<u8>> {
    let rows = arranged(state, session, query).await?;
    let clocks: Vec<ClockRecord> = rows.into_iter().map(|row| row.record).collect();
    let sheet = clock_export::grouped_by_employee(&clocks, &state.config.utc_offset)?;
    to_xlsx(&sheet, &GROUPED_LAYOUT)
}

/// The month's clocks grouped by day, with the file name to save under.
pub async fn export_monthly(
    state: &AppState,
    session: &Session,
    month: Option<&str>,
) -> Result<(String, Vec<u8>)> {
    let offset = &state.config.utc_offset;
    let month = parse_month(month, Utc::now(), offset)?;
    let clocks = clock_repo::list(&state.backend, &session.access_token).await?;
    let sheet = clock_export::monthly(&clocks, month, offset)?;
    Ok((clock_export::monthly_file_name(month), to_xlsx(&sheet, &MONTHLY_LAYOUT)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clock::EmployeeRef;
    use crate::models::employee::Employee;
    use chrono::TimeZone;

    fn employee(id: i64, first: &str) -> Employee {
        Employee {
            id,
            first_name: first.into(),
            last_name: "Silva".into(),
            phone_number: Some("0612345678".into()),
            pin_code: format!("{:04}", id),
            monthly_score: None,
        }
    }

    fn clock(id: i64, who: &Employee, clock_type: ClockType, at: DateTime<Utc>) -> ClockRecord {
        ClockRecord {
            id,
            clock_type,
            employee: EmployeeRef::Embedded(who.clone()),
            pin_code: None,
            location_lat: 48.85,
            location_lng: 2.35,
            photo: None,
            timestamp: at,
            created_at: None,
            updated_at: None,
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, minute, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn durations_render_hours_and_minutes() {
        assert_eq!(format_duration(Duration::minutes(135)), "2h 15m");
        assert_eq!(format_duration(Duration::seconds(59)), "0h 0m");
        assert_eq!(format_duration(Duration::minutes(-3)), "0h 0m");
    }

    #[test]
    fn active_employees_have_a_clock_in_as_latest_clock_today() {
        let ana = employee(1, "Ana");
        let bruno = employee(2, "Bruno");
        let carla = employee(3, "Carla");
        let clocks = vec![
            clock(1, &ana, ClockType::In, at(19, 8, 0)),
            clock(2, &bruno, ClockType::In, at(19, 9, 30)),
            clock(3, &bruno, ClockType::Out, at(19, 12, 0)),
            clock(4, &carla, ClockType::In, at(18, 8, 0)),
            clock(5, &ana, ClockType::Out, at(19, 7, 0)),
        ];

        let dashboard = dashboard(&clocks, at(19, 14, 45), &utc());
        assert_eq!(dashboard.active.len(), 1);
        assert_eq!(dashboard.active[0].name, "Ana Silva");
        assert_eq!(dashboard.active[0].on_site_for, "6h 45m");
        assert_eq!(
            dashboard.stats,
            ClockStats { total: 4, clock_ins: 2, clock_outs: 2, unique_employees: 2 }
        );
    }

    #[test]
    fn day_view_is_newest_first_and_never_goes_past_today() {
        let ana = employee(1, "Ana");
        let bruno = employee(2, "Bruno");
        let clocks = vec![
            clock(1, &ana, ClockType::In, at(18, 8, 0)),
            clock(2, &ana, ClockType::Out, at(18, 17, 0)),
            clock(3, &bruno, ClockType::In, at(18, 9, 0)),
            clock(4, &ana, ClockType::In, at(19, 8, 0)),
        ];
        let now = at(19, 12, 0);

        let view = day_view(clocks.clone(), NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), None, now, &utc());
        let ids: Vec<i64> = view.clocks.iter().map(|c| c.id).collect();
        assert_eq!(ids, [2, 3, 1]);
        assert_eq!(view.next_date, NaiveDate::from_ymd_opt(2026, 10, 19));
        assert_eq!(view.stats.unique_employees, 2);

        let only_ana = day_view(clocks.clone(), NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), Some(1), now, &utc());
        assert_eq!(only_ana.stats.total, 2);

        let future = day_view(clocks, NaiveDate::from_ymd_opt(2026, 10, 25).unwrap(), None, now, &utc());
        assert!(future.is_today);
        assert_eq!(future.next_date, None);
        assert_eq!(future.clocks.len(), 1);
    }

    #[test]
    fn table_times_follow_the_site_offset() {
        let ana = employee(1, "Ana");
        let minus_three = FixedOffset::west_opt(3 * 3600).unwrap();
        let rows = local_rows(
            vec![
                clock(1, &ana, ClockType::In, at(19, 1, 30)),
                clock(2, &ana, ClockType::Out, at(19, 12, 0)),
            ],
            &minus_three,
        );

        let sheet = Sheet::from_columns(&rows, COLUMNS).unwrap();
        assert_eq!(sheet.rows[0][3].to_string(), "2026-10-18 22:30:00");
        assert_eq!(sheet.rows[1][3].to_string(), "2026-10-19 09:00:00");

        let pairs = vec![("filter.timestamp".to_string(), "2026-10-18".to_string())];
        let query = TableQuery::from_pairs(&pairs).unwrap();
        let matched = query.arrange(rows, COLUMNS).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].record.id, 1);
    }

    #[test]
    fn months_parse_or_default_to_the_current_one() {
        let now = at(19, 12, 0);
        assert_eq!(
            parse_month(Some("2026-02"), now, &utc()).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
        );
        assert_eq!(
            parse_month(None, now, &utc()).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
        );
        assert!(parse_month(Some("02/2026"), now, &utc()).is_err());
    }
}
