use super::ask_confirmation;
use crate::cli::parser::{Commands, EventAction};
use crate::config::Config;
use crate::core::session::Session;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};

pub async fn handle(cmd: &Commands, cfg: &Config, offline: bool) -> AppResult<()> {
    let Commands::Event { action } = cmd else {
        return Ok(());
    };

    let session = Session::open(cfg, offline)?;
    let manager = &session.manager;

    match action {
        EventAction::Add { title, description } => {
            let title = title.trim();
            if title.is_empty() {
                return Err(AppError::EmptyTitle);
            }

            let event = manager.create_event(title, description.trim());
            success(format!("Event #{} \"{}\" created.", event.id, event.title));
            session.log("event_add", &event.id.to_string(), &event.title);
        }

        EventAction::Edit {
            id,
            title,
            description,
        } => {
            let mut event = manager.get_event_by_id(*id).ok_or(AppError::EventNotFound(*id))?;

            if title.is_none() && description.is_none() {
                info("Nothing to change: use --title and/or --description.");
                return Ok(());
            }
            if let Some(t) = title {
                event.title = t.trim().to_string();
            }
            if let Some(d) = description {
                event.description = d.trim().to_string();
            }

            if !manager.update_event(event) {
                return Err(AppError::EventNotFound(*id));
            }
            success(format!("Event #{id} updated."));
            session.log("event_edit", &id.to_string(), "title/description changed");
        }

        EventAction::Del { id, yes } => {
            let event = manager.get_event_by_id(*id).ok_or(AppError::EventNotFound(*id))?;

            let prompt = format!(
                "Delete event #{} \"{}\" and its {} record(s)? This action is irreversible.",
                event.id,
                event.title,
                event.records.len()
            );
            if !*yes && !ask_confirmation(&prompt) {
                info("Operation cancelled.");
                return Ok(());
            }

            if !manager.delete_event(*id) {
                return Err(AppError::EventNotFound(*id));
            }
            success(format!("Event #{id} deleted."));
            session.log("event_del", &id.to_string(), &event.title);
        }
    }

    session.finish().await;
    Ok(())
}
