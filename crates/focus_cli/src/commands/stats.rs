//! Progress report.

use crate::app::App;
use crate::error::CliResult;
use focus_core::analytics;

/// Days shown in the per-day chart.
const CHART_DAYS: u32 = 7;

/// Prints today's progress, per-project counts and recent history.
pub fn run(app: &App, json: bool) -> CliResult<()> {
    app.read(|ws| {
        let data = ws.collections();
        let now = focus_core::now();
        let today = now.date_naive();
        let daily = analytics::daily_progress(data, today);
        let projects = analytics::project_stats(data, today);
        let windows = analytics::window_summary(data, now);
        let days = analytics::sessions_per_day(data, today, CHART_DAYS);

        if json {
            let report = serde_json::json!({
                "today": { "sessions": daily.count, "goal": daily.goal, "minutes": daily.minutes },
                "projects": projects.iter().map(|p| serde_json::json!({
                    "id": p.project_id, "name": p.name, "today": p.today,
                    "total": p.total, "goal": p.goal, "archived": p.archived,
                })).collect::<Vec<_>>(),
                "last7Days": windows.last_7_days,
                "last30Days": windows.last_30_days,
                "last90Days": windows.last_90_days,
            });
            println!("{report:#}");
            return;
        }

        println!("=== Today ===");
        println!(
            "{}/{} sessions, {} minutes{}",
            daily.count,
            daily.goal,
            daily.minutes,
            if daily.reached() { " (goal reached)" } else { "" }
        );
        println!();

        println!("=== Projects ===");
        for p in projects.iter().filter(|p| !p.archived) {
            println!(
                "{:<28} today {:>2}/{:<2} total {:>4}",
                p.name, p.today, p.goal, p.total
            );
        }
        println!();

        println!("=== Last {CHART_DAYS} days ===");
        let widest = days.iter().map(|d| d.sessions).max().unwrap_or(0).max(1);
        for day in &days {
            let bar = "#".repeat((day.sessions * 30 / widest) as usize);
            println!("{} {:>3} {bar}", day.date.format("%a %m-%d"), day.sessions);
        }
        println!();
        println!(
            "7 days: {}  30 days: {}  90 days: {}",
            windows.last_7_days, windows.last_30_days, windows.last_90_days
        );
    });
    Ok(())
}
