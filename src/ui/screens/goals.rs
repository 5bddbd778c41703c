use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, progress_bar, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.goals.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No savings goals yet", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Create one with :goal <target> <YYYY-MM-DD> <title>",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(theme::panel("Goals (0)".into()));
        f.render_widget(msg, area);
        return;
    }

    let header = Row::new(
        ["Title", "Kind", "Priority", "Saved", "Target", "Progress", "Due", "Status"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    )
    .height(1);

    let rows: Vec<Row> = app
        .goals
        .iter()
        .enumerate()
        .skip(app.goal_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, g)| {
            let pct = g.progress_percent();
            let color = theme::goal_status_color(g.status);
            Row::new(vec![
                Cell::from(truncate(&g.title, 28)),
                Cell::from(g.kind.as_str()),
                Cell::from(g.priority.as_str()),
                Cell::from(format_amount(g.current_amount)),
                Cell::from(format_amount(g.target_amount)),
                Cell::from(Span::styled(
                    format!("{} {pct:>3}%", progress_bar(f64::from(pct) / 100.0, 12)),
                    Style::default().fg(color),
                )),
                Cell::from(g.due_date.to_string()),
                Cell::from(Span::styled(g.status.as_str(), Style::default().fg(color))),
            ])
            .style(theme::row_style(i, app.goal_index))
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(13),
        Constraint::Length(13),
        Constraint::Length(20),
        Constraint::Length(11),
        Constraint::Length(10),
    ];

    let s = &app.goal_summary;
    let title = format!(
        "Goals: {} active, {} completed, {} abandoned. Saved {} of {}",
        s.active,
        s.completed,
        s.abandoned,
        format_amount(s.total_saved),
        format_amount(s.total_target)
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(theme::panel(title));
    f.render_widget(table, area);
}
