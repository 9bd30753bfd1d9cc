use crate::controller::{EditBuffer, ViewController};
use crate::filter::CategoryFilter;
use crate::gateway::RemoteGateway;
use crate::models::Counter;
use crate::session::AuthPhase;
use crate::storage::KeyValueStore;
use std::fmt::Write;

const BAR_WIDTH: usize = 20;

pub fn render<S: KeyValueStore, G: RemoteGateway>(view: &ViewController<S, G>) -> String {
    match view.phase() {
        AuthPhase::Undetermined => "Loading...\n".to_string(),
        AuthPhase::SignedOut => {
            render_login(view.is_authenticating(), view.auth_error().as_deref())
        }
        AuthPhase::SignedIn(user) => {
            let counters = view.visible_counters();
            let editing = view.editing();
            let filter = render_filter(&view.selected_category(), &view.categories());
            let mut out = BOARD_HEADER
                .replace("{{USER}}", &user.username)
                .replace("{{FILTER}}", &filter);
            if view.is_loading() {
                out.push_str("  (loading...)\n");
            }
            if counters.is_empty() {
                out.push_str("  No counters yet. Add one with: add <name>|<max>|<category>\n");
            }
            for (index, counter) in counters.iter().enumerate() {
                let row = index + 1;
                match editing.as_ref().filter(|edit| edit.id == counter.local_id) {
                    Some(edit) => out.push_str(&render_edit_row(row, edit)),
                    None => {
                        let menu_open = view.is_menu_expanded(counter.local_id);
                        out.push_str(&render_row(row, counter, menu_open));
                    }
                }
            }
            out
        }
    }
}

pub fn render_login(authenticating: bool, error: Option<&str>) -> String {
    let mut out = LOGIN_HINT.to_string();
    if authenticating {
        out.push_str("Signing in...\n");
    }
    if let Some(error) = error {
        let _ = writeln!(out, "! {error}");
    }
    out
}

fn render_filter(selected: &CategoryFilter, categories: &[String]) -> String {
    let mut options = vec![mark(selected == &CategoryFilter::All, "all")];
    for category in categories {
        let active = matches!(selected, CategoryFilter::Category(name) if name == category);
        options.push(mark(active, category));
    }
    options.join(" ")
}

fn mark(active: bool, label: &str) -> String {
    if active {
        format!("[{label}]")
    } else {
        label.to_string()
    }
}

pub fn render_row(row: usize, counter: &Counter, menu_open: bool) -> String {
    let mut line = format!("{row:>3}. {:<24}", counter.name);
    match counter.max {
        Some(max) => {
            let _ = write!(line, " {:>5} / {:<5} {}", counter.count, max, progress_bar(counter));
        }
        None => {
            let _ = write!(line, " {:>5}", counter.count);
        }
    }
    if counter.is_completed() {
        line.push_str("  done");
    }
    if let Some(category) = &counter.category {
        let _ = write!(line, "  <{category}>");
    }
    line.push('\n');
    if menu_open {
        let updated = counter
            .updated_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            line,
            "       inc {row} | dec {row} | edit {row} | rm {row}   (updated {updated})"
        );
    }
    line
}

fn render_edit_row(row: usize, edit: &EditBuffer) -> String {
    format!(
        "{row:>3}. editing  name=\"{}\" max=\"{}\" category=\"{}\"  (save | cancel)\n",
        edit.name, edit.max, edit.category
    )
}

fn progress_bar(counter: &Counter) -> String {
    let filled = counter
        .progress()
        .map(|fraction| (fraction * BAR_WIDTH as f64).round() as usize)
        .unwrap_or(0)
        .min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

const LOGIN_HINT: &str = "\
Counter App - sign in
  login <email> <password>
  register <username> <email> <password>
";

const BOARD_HEADER: &str = "\
Counter App - welcome, {{USER}}!
Categories: {{FILTER}}
";
