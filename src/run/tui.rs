use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::models::ExpenseUpdate;
use crate::ui::app::{App, InputMode, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

pub(crate) fn as_tui(config: &Config, db: &mut Database) -> Result<()> {
    let mut app = App::new(config);
    app.refresh_all(db)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    info!(user = %app.user, "TUI session started");

    let result = run_app(&mut terminal, &mut app, db);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db: &mut Database,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            let content_height = f.area().height.saturating_sub(3) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            handle_key(key, app, db)?;
        }
    }
    Ok(())
}

fn handle_key(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    if app.show_help {
        app.show_help = false;
        return Ok(());
    }
    match app.input_mode {
        InputMode::Normal => handle_normal_input(key, app, db),
        InputMode::Command => handle_command_input(key, app, db),
        InputMode::Search => handle_search_input(key, app, db),
        InputMode::Editing => handle_editing_input(key, app, db),
        InputMode::Confirm => handle_confirm_input(key, app, db),
    }
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Search;
            app.search_input.clear();
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_down(app);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_up(app);
            }
        }
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char(c @ '1'..='9') => {
            let idx = (c as usize) - ('1' as usize);
            if let Some(&screen) = Screen::all().get(idx) {
                switch_screen(app, db, screen)?;
            }
        }
        KeyCode::Tab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let next = (idx + 1) % screens.len();
            switch_screen(app, db, screens[next])?;
        }
        KeyCode::BackTab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let prev = if idx == 0 { screens.len() - 1 } else { idx - 1 };
            switch_screen(app, db, screens[prev])?;
        }
        KeyCode::Char('H') => commands::handle_command("prev-month", app, db)?,
        KeyCode::Char('L') => commands::handle_command("next-month", app, db)?,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('D') => match app.screen {
            Screen::Expenses => commands::handle_command("delete", app, db)?,
            Screen::Budgets => commands::handle_command("delete-budget", app, db)?,
            Screen::Goals => commands::handle_command("delete-goal", app, db)?,
            Screen::Dashboard => {}
        },
        KeyCode::Char('r') if app.screen == Screen::Expenses => {
            commands::handle_command("rename", app, db)?;
        }
        KeyCode::Char('A') if app.screen == Screen::Goals => {
            commands::handle_command("abandon", app, db)?;
        }
        KeyCode::Esc => handle_escape(app, db)?,
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, db)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

/// Live search: every keystroke re-queries the Expenses list.
fn handle_search_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.search_input.clear();
            app.refresh_expenses(db)?;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            requery(app, db)?;
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
            requery(app, db)?;
        }
        _ => {}
    }
    Ok(())
}

fn requery(app: &mut App, db: &mut Database) -> Result<()> {
    app.screen = Screen::Expenses;
    app.expense_index = 0;
    app.expense_scroll = 0;
    app.refresh_expenses(db)
}

fn handle_editing_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let new_name = app.command_input.trim().to_string();
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
            if let Some(id) = app.selected_expense().and_then(|e| e.id) {
                let changes = ExpenseUpdate {
                    description: Some(new_name.clone()),
                    ..Default::default()
                };
                let user = app.user.clone();
                match crate::expenses::update(db, &user, id, &changes) {
                    Ok(_) => {
                        app.refresh_expenses(db)?;
                        app.set_status(format!("Renamed to: {new_name}"));
                    }
                    Err(e) => {
                        warn!(error = %e, "Rename failed");
                        app.set_status(e.to_string());
                    }
                }
            }
        }
        KeyCode::Esc => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
            app.set_status("Edit cancelled");
        }
        KeyCode::Backspace => {
            app.command_input.pop();
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_confirm_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            if let Some(action) = app.pending_action.take() {
                if let Err(e) = commands::run_pending(action, app, db) {
                    warn!(error = %e, "Confirmed action failed");
                    app.set_status(format!("{e}"));
                }
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Ok(())
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, db: &mut Database, screen: Screen) -> Result<()> {
    app.screen = screen;
    match screen {
        Screen::Dashboard => app.refresh_dashboard(db)?,
        Screen::Expenses => app.refresh_expenses(db)?,
        Screen::Budgets => app.refresh_budgets(db)?,
        Screen::Goals => app.refresh_goals(db)?,
    }
    app.set_status(format!("{screen}"));
    Ok(())
}

fn handle_escape(app: &mut App, db: &mut Database) -> Result<()> {
    if app.screen == Screen::Expenses && !app.search_input.is_empty() {
        app.search_input.clear();
        app.refresh_expenses(db)?;
        app.set_status("Search cleared");
    } else {
        app.status_message.clear();
    }
    Ok(())
}

fn handle_move_down(app: &mut App) {
    let page = app.table_page();
    match app.screen {
        Screen::Expenses => scroll_down(
            &mut app.expense_index,
            &mut app.expense_scroll,
            app.expenses.len(),
            page,
        ),
        Screen::Budgets => {
            let len = app.progress.as_ref().map_or(0, |p| p.categories.len());
            scroll_down(&mut app.budget_index, &mut app.budget_scroll, len, page);
        }
        Screen::Goals => scroll_down(
            &mut app.goal_index,
            &mut app.goal_scroll,
            app.goals.len(),
            page,
        ),
        Screen::Dashboard => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Expenses => scroll_up(&mut app.expense_index, &mut app.expense_scroll),
        Screen::Budgets => scroll_up(&mut app.budget_index, &mut app.budget_scroll),
        Screen::Goals => scroll_up(&mut app.goal_index, &mut app.goal_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Expenses => scroll_to_top(&mut app.expense_index, &mut app.expense_scroll),
        Screen::Budgets => scroll_to_top(&mut app.budget_index, &mut app.budget_scroll),
        Screen::Goals => scroll_to_top(&mut app.goal_index, &mut app.goal_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    let page = app.table_page();
    match app.screen {
        Screen::Expenses => scroll_to_bottom(
            &mut app.expense_index,
            &mut app.expense_scroll,
            app.expenses.len(),
            page,
        ),
        Screen::Budgets => {
            let len = app.progress.as_ref().map_or(0, |p| p.categories.len());
            scroll_to_bottom(&mut app.budget_index, &mut app.budget_scroll, len, page);
        }
        Screen::Goals => scroll_to_bottom(
            &mut app.goal_index,
            &mut app.goal_scroll,
            app.goals.len(),
            page,
        ),
        Screen::Dashboard => {}
    }
}

#[cfg(test)]
#[path = "tui_tests.rs"]
mod tests;
