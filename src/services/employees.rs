use garde::Validate;

use crate::error::Result;
use crate::export::csv::to_csv;
use crate::export::sheet::Sheet;
use crate::export::xlsx::{XlsxLayout, to_xlsx};
use crate::models::employee::Employee;
use crate::models::session::Session;
use crate::repositories::employee as employee_repo;
use crate::state::AppState;
use crate::table::bulk::{BulkOutcome, run_sequential};
use crate::table::column::Column;
use crate::table::pagination::EMPLOYEE_PAGE_SIZES;
use crate::table::selection::RowId;
use crate::table::view::{TableQuery, TableView};
use crate::validation::employee::EmployeeForm;

impl RowId for Employee {
    fn row_id(&self) -> i64 {
        self.id
    }
}

pub const COLUMNS: &[Column<Employee>] = &[
    Column::new("id", "ID", |e: &Employee| e.id.into()).unfilterable(),
    Column::new("first_name", "First name", |e: &Employee| e.first_name.as_str().into()),
    Column::new("last_name", "Last name", |e: &Employee| e.last_name.as_str().into()),
    Column::new("phone_number", "Phone number", |e: &Employee| {
        e.phone_number.as_deref().into()
    }),
    Column::new("pin_code", "PIN code", |e: &Employee| e.pin_code.as_str().into()),
    Column::new("monthly_score", "Monthly score", |e: &Employee| e.monthly_score.into())
        .unfilterable(),
];

const XLSX_LAYOUT: XlsxLayout<'static> = XlsxLayout {
    name: "Employees",
    widths: &[8.0, 20.0, 20.0, 16.0, 10.0, 14.0],
    link_column: None,
};

/// One page of the employees table.
pub async fn table(state: &AppState, session: &Session, query: &TableQuery) -> Result<TableView<Employee>> {
    let employees = employee_repo::list(&state.backend, &session.access_token).await?;
    tracing::debug!("Loaded {} employees", employees.len());
    Ok(TableView::client(employees, COLUMNS, query, EMPLOYEE_PAGE_SIZES)?)
}

pub async fn get(state: &AppState, session: &Session, id: i64) -> Result<Employee> {
    employee_repo::find(&state.backend, &session.access_token, id).await
}

pub async fn create(state: &AppState, session: &Session, form: EmployeeForm) -> Result<Employee> {
    let form = form.normalized();
    form.validate()?;
    let employee = employee_repo::create(&state.backend, &session.access_token, &form).await?;
    tracing::info!("✅ Employee {} created", employee.id);
    Ok(employee)
}

pub async fn update(
    state: &AppState,
    session: &Session,
    id: i64,
    form: EmployeeForm,
) -> Result<Employee> {
    let form = form.normalized();
    form.validate()?;
    let employee = employee_repo::update(&state.backend, &session.access_token, id, &form).await?;
    tracing::info!("✅ Employee {} updated", id);
    Ok(employee)
}

pub async fn delete(state: &AppState, session: &Session, id: i64) -> Result<()> {
    employee_repo::delete(&state.backend, &session.access_token, id).await?;
    tracing::info!("🗑️ Employee {} deleted", id);
    Ok(())
}

/// Deletes the selected employees one by one, stopping at the first failure.
pub async fn bulk_delete(state: &AppState, session: &Session, ids: &[i64]) -> Result<BulkOutcome> {
    let outcome = run_sequential(ids, |id| delete(state, session, id)).await?;
    if outcome.is_complete() {
        tracing::info!("✅ Bulk delete: {} employees removed", outcome.completed.len());
    } else {
        tracing::warn!(
            "⚠️ Bulk delete stopped: {}/{} employees removed",
            outcome.completed.len(),
            outcome.requested
        );
    }
    Ok(outcome)
}

async fn export_sheet(state: &AppState, session: &Session, query: &TableQuery) -> Result<Sheet> {
    let employees = employee_repo::list(&state.backend, &session.access_token).await?;
    let employees = query.arrange(employees, COLUMNS)?;
    Sheet::from_columns(&employees, COLUMNS)
}

pub async fn export_csv(state: &AppState, session: &Session, query: &TableQuery) -> Result<Vec<u8>> {
    to_csv(&export_sheet(state, session, query).await?)
}

pub async fn export_xlsx(state: &AppState, session: &Session, query: &TableQuery) -> Result<Vec<u8>> {
    to_xlsx(&export_sheet(state, session, query).await?, &XLSX_LAYOUT)
}
