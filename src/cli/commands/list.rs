use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::session::Session;
use crate::errors::{AppError, AppResult};
use crate::models::Event;
use crate::utils::colors::{RESET, color_for_remote_ref};
use crate::utils::table::{Column, Table};
use crate::utils::time::format_minutes;

pub async fn handle(cmd: &Commands, cfg: &Config, offline: bool) -> AppResult<()> {
    if let Commands::List { event } = cmd {
        let session = Session::open(cfg, offline)?;

        // pull first so the listing reflects other devices
        if session.is_online() {
            session.manager.sync_from_remote().await;
        }

        match event {
            Some(id) => {
                let ev = session
                    .manager
                    .get_event_by_id(*id)
                    .ok_or(AppError::EventNotFound(*id))?;
                print_records(&ev);
            }
            None => print_events(&session.manager.get_all_events()),
        }
    }
    Ok(())
}

fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events.");
        return;
    }

    let mut table = Table::new(vec![
        Column::new("ID", 13),
        Column::new("TITLE", 20),
        Column::new("RECORDS", 7),
        Column::new("TOTAL", 8),
        Column::new("SYNC", 6),
    ]);

    for ev in events {
        table.add_row(vec![
            ev.id.to_string(),
            ev.title.clone(),
            ev.records.len().to_string(),
            format_minutes(ev.total_minutes()),
            if ev.remote_ref.is_some() { "remote" } else { "local" }.to_string(),
        ]);
    }

    print!("{}", table.render());
}

fn print_records(ev: &Event) {
    let color = color_for_remote_ref(ev.remote_ref.as_ref());
    println!("{color}#{} {}{RESET}", ev.id, ev.title);
    if !ev.description.is_empty() {
        println!("   {}", ev.description);
    }
    println!();

    if ev.records.is_empty() {
        println!("No records.");
        return;
    }

    let mut table = Table::new(vec![
        Column::new("ID", 13),
        Column::new("START", 16),
        Column::new("END", 16),
        Column::new("DURATION", 8),
        Column::new("NOTE", 10),
    ]);

    for r in &ev.records {
        table.add_row(vec![
            r.id.to_string(),
            format!("{} {}", r.start_date, r.start_time),
            format!("{} {}", r.end_date, r.end_time),
            format_minutes(u64::from(r.duration_minutes)),
            r.note.clone(),
        ]);
    }

    print!("{}", table.render());
    println!("\nTotal: {}", format_minutes(ev.total_minutes()));
    println!("Longest: {}", format_minutes(ev.longest_minutes()));
    println!("Average: {}", format_minutes(ev.average_minutes()));
}
