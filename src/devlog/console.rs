//! Terminal rendering of the developer console

use colored::*;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use terminal_size::{Width, terminal_size};

use super::{DiagnosticEvent, EventLog, Subscription};

const DEFAULT_WIDTH: usize = 100;
const MIN_URL_WIDTH: usize = 20;
// time(8) + method(4) + status(3) + ms(6) + gaps
const FIXED_COLUMNS: usize = 8 + 1 + 6 + 1 + 6 + 1 + 7 + 1;

/// Render the console table for a snapshot, newest first
pub fn render_table(events: &[DiagnosticEvent], width: usize) -> String {
    let url_width = width.saturating_sub(FIXED_COLUMNS).max(MIN_URL_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("{}\n", format!("Developer Console ({})", events.len()).bold()));
    out.push_str(&format!(
        "{}\n",
        format!("{:<8} {:<6} {:<6} {:>7} {}", "time", "method", "status", "ms", "url").dimmed()
    ));

    for event in events {
        out.push_str(&format!(
            "{:<8} {:<6} {:<6} {:>7} {}\n",
            event.local_time(),
            event.method.as_str(),
            event.status,
            event.duration_ms.round() as u64,
            truncate(&event.url, url_width)
        ));
    }

    out
}

/// Print the console table for the current contents of `log` to stderr
pub fn print_table(log: &EventLog) {
    let table = render_table(&log.current(), terminal_width());
    let _ = io::stderr().write_all(table.as_bytes());
}

/// Tracks the newest event already printed by the live printer
#[derive(Debug, Default)]
pub struct LiveTracker {
    last: Option<String>,
}

impl LiveTracker {
    /// Start after whatever `events` already holds
    pub fn starting_at(events: &[DiagnosticEvent]) -> Self {
        Self {
            last: events.first().map(|e| e.id.clone()),
        }
    }

    /// Line for the newest event, if it has not been printed yet
    pub fn next_line(&mut self, events: &[DiagnosticEvent]) -> Option<String> {
        let newest = events.first()?;
        if self.last.as_deref() == Some(newest.id.as_str()) {
            return None;
        }
        self.last = Some(newest.id.clone());
        Some(format!("{} {}", "▸".dimmed(), newest.format_display()))
    }
}

/// Subscribe a printer that writes each newly appended event to stderr.
///
/// The immediate call made on subscription prints nothing, so earlier
/// events are not replayed.
pub fn attach_live(log: &Arc<EventLog>) -> Subscription {
    attach_live_to(log, io::stderr())
}

fn attach_live_to<W: Write + Send + 'static>(log: &EventLog, out: W) -> Subscription {
    let state = Mutex::new((LiveTracker::starting_at(&log.current()), out));
    log.subscribe(move |events| {
        let mut state = state.lock().unwrap_or_else(|p| p.into_inner());
        let (tracker, out) = &mut *state;
        if let Some(line) = tracker.next_line(events) {
            let _ = writeln!(out, "{}", line);
        }
    })
}

fn terminal_width() -> usize {
    terminal_size()
        .map(|(Width(w), _)| w as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}
