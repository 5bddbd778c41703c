use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders};

use crate::models::{BudgetStatus, GoalStatus};

pub(crate) const HEADER_BG: Color = Color::Rgb(30, 30, 46);
pub(crate) const HEADER_FG: Color = Color::Rgb(205, 214, 244);
pub(crate) const ACCENT: Color = Color::Rgb(137, 180, 250);
pub(crate) const GREEN: Color = Color::Rgb(166, 227, 161);
pub(crate) const RED: Color = Color::Rgb(243, 139, 168);
pub(crate) const YELLOW: Color = Color::Rgb(249, 226, 175);
pub(crate) const SURFACE: Color = Color::Rgb(49, 50, 68);
pub(crate) const TEXT: Color = Color::Rgb(205, 214, 244);
pub(crate) const TEXT_DIM: Color = Color::Rgb(127, 132, 156);
pub(crate) const OVERLAY: Color = Color::Rgb(69, 71, 90);
pub(crate) const COMMAND_BG: Color = Color::Rgb(24, 24, 37);

pub(crate) fn header_style() -> Style {
    Style::default()
        .fg(HEADER_FG)
        .bg(HEADER_BG)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn selected_style() -> Style {
    Style::default().fg(HEADER_BG).bg(ACCENT)
}

pub(crate) fn normal_style() -> Style {
    Style::default().fg(TEXT)
}

pub(crate) fn dim_style() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub(crate) fn amount_style() -> Style {
    Style::default().fg(RED)
}

pub(crate) fn alt_row_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub(crate) fn command_bar_style() -> Style {
    Style::default().fg(TEXT).bg(COMMAND_BG)
}

pub(crate) fn status_bar_style() -> Style {
    Style::default().fg(TEXT_DIM).bg(SURFACE)
}

/// Row style for list position `i`, with the cursor on `cursor`.
pub(crate) fn row_style(i: usize, cursor: usize) -> Style {
    if i == cursor {
        selected_style()
    } else if i % 2 == 1 {
        alt_row_style()
    } else {
        normal_style()
    }
}

pub(crate) fn budget_status_color(status: BudgetStatus) -> Color {
    match status {
        BudgetStatus::Good => GREEN,
        BudgetStatus::Warning => YELLOW,
        BudgetStatus::Exceeded => RED,
    }
}

pub(crate) fn goal_status_color(status: GoalStatus) -> Color {
    match status {
        GoalStatus::Active => ACCENT,
        GoalStatus::Completed => GREEN,
        GoalStatus::Abandoned => TEXT_DIM,
    }
}

/// Bordered panel with a dim bold title.
pub(crate) fn panel(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(OVERLAY))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(TEXT_DIM).add_modifier(Modifier::BOLD),
        ))
}
