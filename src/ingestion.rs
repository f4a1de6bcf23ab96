use crate::error::Result;
use crate::schema::{BillingRecord, BillingTable};
use crate::utils::parse_bill_date;
use chrono::NaiveDate;
use log::debug;
use serde_json::{Map, Value};

pub const BILL_DATE_FIELD: &str = "billDate";
pub const DEPARTMENT_FIELD: &str = "orderDepartment";
pub const DOCTOR_FIELD: &str = "orderDoctor";
pub const SERVICE_FIELD: &str = "serviceName";
pub const PATIENT_FIELD: &str = "uhid";
pub const NET_FIELD: &str = "net";

pub type RawRow = Map<String, Value>;

/// Parses the billing endpoint's body: a JSON array of row objects.
///
/// Rows are never rejected one by one. Missing fields become empty strings
/// or zero, and a `billDate` outside day-month-year form becomes `None`.
/// A body that is not an array of objects is an error.
pub fn parse_billing_payload(body: &[u8]) -> Result<BillingTable> {
    let rows: Vec<RawRow> = serde_json::from_slice(body)?;
    Ok(rows_to_table(rows))
}

pub fn rows_to_table(rows: Vec<RawRow>) -> BillingTable {
    let total = rows.len();
    let table: BillingTable = rows.into_iter().map(row_to_record).collect();
    let undated = total - table.dated_len();

    debug!(
        "Parsed {} billing rows ({} without a usable {})",
        total, undated, BILL_DATE_FIELD
    );

    table
}

pub fn row_to_record(mut row: RawRow) -> BillingRecord {
    let bill_date = take_date(&mut row, BILL_DATE_FIELD);
    let order_department = take_text(&mut row, DEPARTMENT_FIELD);
    let order_doctor = take_text(&mut row, DOCTOR_FIELD);
    let service_name = take_text(&mut row, SERVICE_FIELD);
    let uhid = take_text(&mut row, PATIENT_FIELD);
    let net = take_amount(&mut row, NET_FIELD);

    BillingRecord {
        bill_date,
        order_department,
        order_doctor,
        service_name,
        uhid,
        net,
        extra: row,
    }
}

fn take_date(row: &mut RawRow, key: &str) -> Option<NaiveDate> {
    match row.remove(key) {
        Some(Value::String(raw)) => parse_bill_date(&raw),
        _ => None,
    }
}

fn take_text(row: &mut RawRow, key: &str) -> String {
    match row.remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn take_amount(row: &mut RawRow, key: &str) -> f64 {
    match row.remove(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}
