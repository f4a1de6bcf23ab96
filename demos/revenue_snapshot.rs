use anyhow::Context;
use chrono::{Local, NaiveDate};
use revenue_dashboard::*;
use std::env;

/// Fetches the configured billing endpoint and prints the dashboard tables.
///
/// Reads from `.env` / the environment:
/// - `DASHBOARD_CONFIG`: optional path to a JSON `DashboardConfig`
/// - `FROM_DATE`, `TO_DATE`: optional `YYYY-MM-DD` bounds (default: today)
/// - `DEPARTMENT`: optional department to drill into for doctor revenue
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = match env::var("DASHBOARD_CONFIG") {
        Ok(path) => DashboardConfig::from_file(&path).with_context(|| format!("reading {}", path))?,
        Err(_) => DashboardConfig::default(),
    };

    let today = Local::now().date_naive();
    let from = date_from_env("FROM_DATE")?.unwrap_or(today);
    let to = date_from_env("TO_DATE")?.unwrap_or(today);

    let source = RemoteSource::new(&config)?;
    let mut session = DashboardSession::new(config, today)?;
    let frequency = session.set_range(DateRange::new(from, to)?);

    if let Ok(department) = env::var("DEPARTMENT") {
        session.handle_selection(SelectionEvent::DepartmentClicked(department));
    }

    println!("📊 Revenue {} .. {} ({})\n", from, to, frequency.label());

    let report = session
        .render(&source, &DashboardQuery::default(), today)
        .await?;

    if report.notice == Some(Notice::NoData) {
        println!("No data available for the selected criteria.");
        return Ok(());
    }

    for line in report.kpis.display_lines() {
        println!("  {}", line);
    }

    println!("\nRevenue trend:");
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["period_end", "net"])?;
    for point in &report.trend {
        writer.write_record([point.period_end.to_string(), format!("{:.2}", point.total)])?;
    }
    writer.flush()?;

    println!("\nDepartment wise revenue:");
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["department", "net"])?;
    for row in &report.departments {
        writer.write_record([row.key.clone(), format!("{:.2}", row.total)])?;
    }
    writer.flush()?;

    println!("\nDoctor wise revenue:");
    match &report.doctors {
        DoctorView::Prompt => println!("Set DEPARTMENT to view doctor-wise revenue."),
        DoctorView::Chart(rows) => {
            for row in rows {
                println!("  {:<30} {:>14.2}", row.key, row.total);
            }
        }
    }

    println!("\nService-wise revenue summary:");
    for service in &report.services {
        println!(
            "  {:<40} {:>6} patients {:>14.2}",
            service.service_name, service.volume, service.net
        );
    }

    Ok(())
}

fn date_from_env(key: &str) -> anyhow::Result<Option<NaiveDate>> {
    match env::var(key) {
        Ok(raw) => {
            let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .with_context(|| format!("{} must be YYYY-MM-DD, got '{}'", key, raw))?;
            Ok(Some(date))
        }
        Err(_) => Ok(None),
    }
}
