use crate::cli::parser::{Commands, RecordAction};
use crate::config::Config;
use crate::core::session::Session;
use crate::errors::{AppError, AppResult};
use crate::models::RecordInput;
use crate::ui::messages::{info, success};
use crate::utils::date::{today_str, validate_date};
use crate::utils::time::{format_minutes, validate_time};

pub async fn handle(cmd: &Commands, cfg: &Config, offline: bool) -> AppResult<()> {
    let Commands::Record { action } = cmd else {
        return Ok(());
    };

    let session = Session::open(cfg, offline)?;
    let manager = &session.manager;

    match action {
        RecordAction::Add {
            event_id,
            start,
            end,
            date,
            end_date,
            note,
        } => {
            // 1️⃣ validazione input
            let start_date = match date {
                Some(d) => validate_date(d)?,
                None => today_str(),
            };
            let end_date = match end_date {
                Some(d) => validate_date(d)?,
                None => start_date.clone(),
            };
            let input = RecordInput {
                start_date,
                start_time: validate_time(start)?,
                end_date,
                end_time: validate_time(end)?,
                note: note.trim().to_string(),
            };

            // 2️⃣ inserimento
            let record = manager
                .create_record(*event_id, input)
                .ok_or(AppError::EventNotFound(*event_id))?;

            success(format!(
                "Record #{} added to event #{} ({} → {}, {}).",
                record.id,
                event_id,
                record.start_time,
                record.end_time,
                format_minutes(u64::from(record.duration_minutes))
            ));
            session.log(
                "record_add",
                &format!("{event_id}/{}", record.id),
                &format!("{} {}-{}", record.start_date, record.start_time, record.end_time),
            );
        }

        RecordAction::Edit {
            event_id,
            record_id,
            start,
            end,
            date,
            end_date,
            note,
        } => {
            let event = manager
                .get_event_by_id(*event_id)
                .ok_or(AppError::EventNotFound(*event_id))?;
            let mut record = event
                .record(*record_id)
                .cloned()
                .ok_or(AppError::RecordNotFound {
                    event: *event_id,
                    record: *record_id,
                })?;

            if start.is_none()
                && end.is_none()
                && date.is_none()
                && end_date.is_none()
                && note.is_none()
            {
                info("Nothing to change.");
                return Ok(());
            }

            if let Some(t) = start {
                record.start_time = validate_time(t)?;
            }
            if let Some(t) = end {
                record.end_time = validate_time(t)?;
            }
            if let Some(d) = date {
                record.start_date = validate_date(d)?;
            }
            if let Some(d) = end_date {
                record.end_date = validate_date(d)?;
            }
            if let Some(n) = note {
                record.note = n.trim().to_string();
            }

            if !manager.update_record(*event_id, record) {
                return Err(AppError::RecordNotFound {
                    event: *event_id,
                    record: *record_id,
                });
            }
            success(format!("Record #{record_id} of event #{event_id} updated."));
            session.log("record_edit", &format!("{event_id}/{record_id}"), "record changed");
        }

        RecordAction::Del {
            event_id,
            record_id,
        } => {
            if !manager.delete_record(*event_id, *record_id) {
                return Err(AppError::RecordNotFound {
                    event: *event_id,
                    record: *record_id,
                });
            }
            success(format!("Record #{record_id} of event #{event_id} deleted."));
            session.log("record_del", &format!("{event_id}/{record_id}"), "record deleted");
        }
    }

    session.finish().await;
    Ok(())
}
