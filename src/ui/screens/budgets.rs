use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

use crate::models::BudgetProgress;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, percent_ratio, progress_bar, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(progress) = &app.progress else {
        render_empty(f, area, app);
        return;
    };

    let alert_height = if app.alerts.is_empty() {
        0
    } else {
        (app.alerts.len() as u16 + 2).min(8)
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(alert_height)])
        .split(area);

    render_categories(f, chunks[0], app, progress);
    if alert_height > 0 {
        render_alerts(f, chunks[1], app);
    }
}

fn render_categories(f: &mut Frame, area: Rect, app: &App, progress: &BudgetProgress) {
    let items: Vec<ListItem> = progress
        .categories
        .iter()
        .enumerate()
        .skip(app.budget_scroll)
        .take(area.height.saturating_sub(2) as usize)
        .map(|(i, row)| {
            let color = theme::budget_status_color(row.status);
            let name_style = theme::row_style(i, app.budget_index);
            let unbudgeted = row.allocated.is_zero();

            let amounts = if unbudgeted {
                format!("{} spent, no allocation ", format_amount(row.spent))
            } else {
                format!(
                    "{}/{} ",
                    format_amount(row.spent),
                    format_amount(row.allocated)
                )
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<20}", truncate(row.category.as_str(), 19)), name_style),
                Span::styled(format!("{amounts:<28}"), Style::default().fg(color)),
                Span::styled(
                    progress_bar(percent_ratio(row.percentage_used), 20),
                    Style::default().fg(color),
                ),
                Span::styled(
                    format!(" {:>6}% ", row.percentage_used),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{} left", format_amount(row.remaining)),
                    theme::dim_style(),
                ),
            ]))
        })
        .collect();

    let title = format!(
        "Budget {}: {} of {} spent, {} left",
        progress.month,
        format_amount(progress.total_spent),
        format_amount(progress.total_allocated),
        format_amount(progress.total_remaining)
    );
    f.render_widget(List::new(items).block(theme::panel(title)), area);
}

fn render_alerts(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .alerts
        .iter()
        .map(|a| {
            ListItem::new(Line::from(Span::styled(
                format!(" ! {}", a.message()),
                Style::default().fg(theme::budget_status_color(a.status)),
            )))
        })
        .collect();
    f.render_widget(
        List::new(items).block(theme::panel(format!("Alerts ({})", app.alerts.len()))),
        area,
    );
}

fn render_empty(f: &mut Frame, area: Rect, app: &App) {
    let msg = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("No budget set for {}", app.current_month),
            theme::dim_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Use :budget <category> <amount> to set an allocation",
            theme::dim_style(),
        )),
    ])
    .centered()
    .block(theme::panel("Budgets".into()));
    f.render_widget(msg, area);
}
