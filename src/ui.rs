use crate::app::{App, DraftFor};
use crate::task::Task;
use crate::validate::{RawTaskInput, TaskDraft};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Terminal,
};
use std::io;

const HELP: &str = "a add  e edit  space toggle  d delete  q quit  (prompts: empty keeps, - clears)";

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![Constraint::Min(3), Constraint::Length(3)])
                .split(f.area());

            let items: Vec<ListItem> = app.tasks.iter().map(task_line).collect();
            let list = List::new(items)
                .block(Block::default().title("Tasks").borders(Borders::ALL))
                .highlight_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                );
            let mut state = ListState::default().with_selected(app.selected_task().map(|_| app.selected));
            f.render_stateful_widget(list, chunks[0], &mut state);

            let status = Paragraph::new(app.status.as_deref().unwrap_or(HELP))
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(status, chunks[1]);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('a') => {
                    let defaults = app.draft_for(&DraftFor::New).cloned().unwrap_or_default();
                    if let Some(raw) = prompt_task(&defaults) {
                        app.add_task(&raw);
                    }
                }
                KeyCode::Char('e') => {
                    let Some(task) = app.selected_task() else {
                        continue;
                    };
                    let defaults = app
                        .draft_for(&DraftFor::Edit(task.id.clone()))
                        .cloned()
                        .unwrap_or_else(|| draft_of(task));
                    if let Some(raw) = prompt_task(&defaults) {
                        app.edit_selected(&raw);
                    }
                }
                KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(),
                KeyCode::Char('d') => app.delete_selected(),
                KeyCode::Up => app.move_selection(-1),
                KeyCode::Down => app.move_selection(1),
                _ => {}
            }
        }
    }
}

fn task_line(t: &Task) -> ListItem<'_> {
    let check = if t.done { "[x] " } else { "[ ] " };
    let title_style = if t.done {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(Color::White)
    };
    let due = t
        .due_date
        .map_or(String::new(), |d| format!(" (Due: {})", d));
    ListItem::new(Line::from(vec![
        Span::raw(check),
        Span::styled(t.title.as_str(), title_style),
        Span::raw(format!(" [{}]", t.priority)),
        Span::raw(due),
    ]))
}

fn draft_of(task: &Task) -> TaskDraft {
    TaskDraft {
        title: task.title.clone(),
        description: task.description.clone(),
        due_date: task.due_date.map(|d| d.to_string()).unwrap_or_default(),
        priority: task.priority.to_string(),
    }
}

/// Asks for every field. An empty answer keeps the value shown in brackets,
/// `-` clears it.
fn prompt_task(defaults: &TaskDraft) -> Option<RawTaskInput> {
    Some(RawTaskInput {
        title: field("Title", &defaults.title)?,
        description: field("Description", &defaults.description)?,
        due_date: field("Due date (YYYY-MM-DD)", &defaults.due_date)?,
        priority: field("Priority (low/medium/high)", &defaults.priority)?,
    })
}

fn field(label: &str, current: &str) -> Option<Option<String>> {
    let answer = prompt(&format!("{} [{}]", label, current))?;
    Some(resolve_answer(answer, current))
}

const CLEAR: &str = "-";

fn resolve_answer(answer: String, current: &str) -> Option<String> {
    if answer == CLEAR {
        Some(String::new())
    } else if !answer.is_empty() {
        Some(answer)
    } else if !current.is_empty() {
        Some(current.to_string())
    } else {
        None
    }
}

fn prompt(message: &str) -> Option<String> {
    disable_raw_mode().ok();
    println!("{}", message);
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        enable_raw_mode().ok();
        Some(input.trim().to_string())
    } else {
        enable_raw_mode().ok();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_answer_keeps_current_value() {
        assert_eq!(resolve_answer(String::new(), "2020-01-01"), Some("2020-01-01".to_string()));
        assert_eq!(resolve_answer(String::new(), ""), None);
    }

    #[test]
    fn dash_clears_the_field() {
        assert_eq!(resolve_answer("-".to_string(), "notes"), Some(String::new()));
        assert_eq!(resolve_answer("-".to_string(), ""), Some(String::new()));
    }

    #[test]
    fn typed_answer_replaces_current_value() {
        assert_eq!(resolve_answer("high".to_string(), "low"), Some("high".to_string()));
    }
}
