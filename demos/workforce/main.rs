//! Workforce console example: the employees page over mock data

use dashview::entities::Employee;
use dashview::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn employee(name: &str, status: &str, role: &str, department: &str, success_rate: f64) -> Employee {
    Employee::new(
        name.to_string(),
        status.to_string(),
        role.to_string(),
        department.to_string(),
        format!("{} for the {} team", role, department),
        success_rate,
        0,
        Vec::new(),
    )
}

fn mock_employees() -> Vec<Employee> {
    vec![
        employee("Chat Bot", "active", "Customer Support", "Support", 94.5),
        employee("Data Agent", "busy", "Data Analyst", "Analytics", 88.0),
        employee("Mail Bot", "busy", "Email Triage", "Support", 91.2),
        employee("Ledger", "offline", "Bookkeeper", "Finance", 97.8),
    ]
}

fn print_view(page: &PageController<Employee>) {
    let Some(view) = page.view() else {
        println!("   (no view: page is {})", page.status());
        return;
    };

    println!("   criteria: {:?}", page.criteria());
    for e in &view.filtered {
        println!("   - {:<12} {:<8} {}", e.name, e.status, e.role);
    }
    for (name, value) in view.stats.iter() {
        println!("   {} = {}", name, value);
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Workforce console example\n");

    let config = DashboardConfig::default_config();
    let page_config = config.page("employees")?;

    let source = InMemorySource::new(mock_employees())
        .with_latency(Duration::from_millis(50))
        .with_categories(vec!["Support".into(), "Analytics".into(), "Finance".into()]);
    let auth = Arc::new(SessionAuthProvider::new());
    let events = EventBus::default();
    let mut receiver = events.subscribe();

    let page = PageController::from_config(page_config, Arc::new(source), auth.clone())?.with_events(events);

    println!("Activating without a user...");
    println!("   status: {}\n", page.activate().await?);

    auth.sign_in(CurrentUser::new("ops@example.com").with_role("admin"));
    println!("Activating after sign-in...");
    println!("   status: {}", page.activate().await?);
    println!("   categories: {:?}", page.categories());
    print_view(&page);

    println!("Searching for \"bot\"...");
    page.set_search_term("bot");
    print_view(&page);

    println!("Filtering on status = busy...");
    page.set_filter("status", "busy");
    print_view(&page);

    println!("Clearing filters...");
    page.clear_filters();
    print_view(&page);

    println!("Recomputes: {}", page.recompute_count());
    while let Ok(envelope) = receiver.try_recv() {
        println!("   event: {}", envelope.event.name());
    }

    Ok(())
}
