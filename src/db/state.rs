//! The single application-state row: view filter and last check-in.

use super::{Database, from_ms};
use crate::error::TreeError;
use crate::types::{AppState, FilterKind, join_labels, parse_labels};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::info;

/// Read the state row, creating it with defaults on first access.
pub(crate) fn get_state_internal(conn: &Connection) -> Result<AppState> {
    conn.execute("INSERT OR IGNORE INTO app_state (id) VALUES (1)", [])?;
    let (show_completed, active_tags, last_checked_in) = conn.query_row(
        "SELECT show_completed, active_tags, last_checked_in FROM app_state WHERE id = 1",
        [],
        |row| {
            Ok((
                row.get::<_, bool>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
            ))
        },
    )?;
    let last_checked_in = last_checked_in
        .map(|ms| from_ms(ms).ok_or_else(|| anyhow!("last_checked_in out of range: {} ms", ms)))
        .transpose()?;
    Ok(AppState {
        show_completed,
        active_tags: parse_labels(&active_tags),
        last_checked_in,
    })
}

fn save_filter_internal(conn: &Connection, state: &AppState) -> Result<()> {
    conn.execute(
        "UPDATE app_state SET show_completed = ?1, active_tags = ?2 WHERE id = 1",
        params![state.show_completed, join_labels(&state.active_tags)],
    )?;
    Ok(())
}

pub(crate) fn stamp_check_in_internal(conn: &Connection, at: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "UPDATE app_state SET last_checked_in = ?1 WHERE id = 1",
        params![at.timestamp_millis()],
    )?;
    Ok(())
}

impl Database {
    /// Current application state.
    pub fn app_state(&self) -> Result<AppState> {
        self.with_transaction(|tx| get_state_internal(tx))
    }

    /// Toggle one filter component. `completed` flips the show-completed flag
    /// (value ignored); `tag` adds the tag when absent and removes it when present.
    pub fn set_filter(&self, kind: FilterKind, value: Option<&str>) -> Result<AppState> {
        let state = self.with_transaction(|tx| {
            let mut state = get_state_internal(tx)?;
            match kind {
                FilterKind::Completed => state.show_completed = !state.show_completed,
                FilterKind::Tag => {
                    let tag = value.map(str::trim).unwrap_or_default();
                    if tag.is_empty() {
                        return Err(TreeError::invalid_value("value", "a tag filter needs a tag").into());
                    }
                    if tag.contains(',') {
                        return Err(
                            TreeError::invalid_value("value", "a tag filter takes a single tag").into(),
                        );
                    }
                    if !state.active_tags.remove(tag) {
                        state.active_tags.insert(tag.to_string());
                    }
                }
            }
            save_filter_internal(tx, &state)?;
            Ok(state)
        })?;
        info!(
            show_completed = state.show_completed,
            active_tags = %join_labels(&state.active_tags),
            "Filter updated"
        );
        Ok(state)
    }
}
