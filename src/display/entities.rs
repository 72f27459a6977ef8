//! Entity list formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Address, Department, Employee, EmployeeTraining, Training};

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn render<R: Tabled>(rows: Vec<R>, empty: &str) -> String {
    if rows.is_empty() {
        return empty.to_string();
    }
    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

#[derive(Tabled)]
struct EmployeeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Dept")]
    department: String,
    #[tabled(rename = "Addr")]
    address: String,
    #[tabled(rename = "Ver")]
    version: i32,
}

pub fn format_employee_list(employees: &[Employee]) -> String {
    let rows = employees
        .iter()
        .map(|e| EmployeeRow {
            id: opt(&e.id),
            name: e.full_name(),
            email: e.email.clone(),
            phone: opt(&e.phone),
            department: opt(&e.department_id),
            address: opt(&e.address_id),
            version: e.version,
        })
        .collect();
    render(rows, "No employees found.")
}

/// Format a single employee with its bookkeeping fields
pub fn format_employee_details(employee: &Employee) -> String {
    format!(
        "{}\n  ID:         {}\n  Phone:      {}\n  Department: {}\n  Address:    {}\n  Version:    {}\n  Created:    {}\n  Updated:    {} by {}",
        employee,
        opt(&employee.id),
        opt(&employee.phone),
        opt(&employee.department_id),
        opt(&employee.address_id),
        employee.version,
        employee.created_timestamp.format("%Y-%m-%d %H:%M:%S"),
        employee.updated_timestamp.format("%Y-%m-%d %H:%M:%S"),
        employee.updated_by.as_deref().unwrap_or("-"),
    )
}

#[derive(Tabled)]
struct NamedRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Details")]
    details: String,
    #[tabled(rename = "Ver")]
    version: i32,
}

pub fn format_department_list(departments: &[Department]) -> String {
    let rows = departments
        .iter()
        .map(|d| NamedRow {
            id: opt(&d.id),
            name: d.name.clone(),
            details: String::new(),
            version: d.version,
        })
        .collect();
    render(rows, "No departments found.")
}

pub fn format_training_list(trainings: &[Training]) -> String {
    let rows = trainings
        .iter()
        .map(|t| NamedRow {
            id: opt(&t.id),
            name: t.name.clone(),
            details: opt(&t.description),
            version: t.version,
        })
        .collect();
    render(rows, "No trainings found.")
}

pub fn format_address_list(addresses: &[Address]) -> String {
    let rows = addresses
        .iter()
        .map(|a| NamedRow {
            id: opt(&a.id),
            name: a.address_line_1.clone(),
            details: a.to_string(),
            version: a.version,
        })
        .collect();
    render(rows, "No addresses found.")
}

#[derive(Tabled)]
struct EnrollmentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Employee")]
    employee: i64,
    #[tabled(rename = "Training")]
    training: i64,
    #[tabled(rename = "Allocated")]
    allocated: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Ver")]
    version: i32,
}

pub fn format_enrollment_list(enrollments: &[EmployeeTraining]) -> String {
    let rows = enrollments
        .iter()
        .map(|e| EnrollmentRow {
            id: opt(&e.id),
            employee: e.emp_id,
            training: e.training_id,
            allocated: opt(&e.date_of_allocation),
            status: e.status.to_string(),
            version: e.version,
        })
        .collect();
    render(rows, "No enrollments found.")
}
