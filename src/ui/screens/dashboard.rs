use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, List, ListItem, Paragraph, Sparkline},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::insights::Dashboard;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, percent_ratio, progress_bar, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(dash) = &app.dashboard else {
        f.render_widget(
            Paragraph::new("Loading…").centered().block(theme::panel("Dashboard".into())),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Summary cards
            Constraint::Min(10),   // Chart + lists
            Constraint::Length(3), // Daily sparkline
        ])
        .split(area);

    render_summary_cards(f, chunks[0], dash);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    render_category_chart(f, middle[0], dash);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(middle[1]);
    render_recent(f, right[0], dash);
    render_goals(f, right[1], dash);

    render_daily_sparkline(f, chunks[2], app);
}

fn render_summary_cards(f: &mut Frame, area: Rect, dash: &Dashboard) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    render_card(
        f,
        cards[0],
        &format!("Spent {}", dash.month),
        format_amount(dash.month_total),
        theme::RED,
        format!("{} expenses", dash.month_count),
    );

    // Spending less than last month is good news
    let change_color = if dash.change > Decimal::ZERO {
        theme::RED
    } else {
        theme::GREEN
    };
    let sign = if dash.change > Decimal::ZERO { "+" } else { "" };
    render_card(
        f,
        cards[1],
        "Last Month",
        format_amount(dash.previous_total),
        change_color,
        format!("{sign}{}% this month", dash.change),
    );

    match &dash.budget {
        Some(b) => render_card(
            f,
            cards[2],
            "Budget",
            format!("{}%", b.percentage),
            if b.spent > b.budgeted {
                theme::RED
            } else if percent_ratio(b.percentage) >= 0.8 {
                theme::YELLOW
            } else {
                theme::GREEN
            },
            format!("{} left of {}", format_amount(b.remaining), format_amount(b.budgeted)),
        ),
        None => render_card(
            f,
            cards[2],
            "Budget",
            "n/a".into(),
            theme::TEXT_DIM,
            "No budget (:budget)".into(),
        ),
    };

    let saved: Decimal = dash.goals.iter().map(|g| g.current_amount).sum();
    let target: Decimal = dash.goals.iter().map(|g| g.target_amount).sum();
    render_card(
        f,
        cards[3],
        "Active Goals",
        format_amount(saved),
        theme::ACCENT,
        format!("of {} across {}", format_amount(target), dash.goals.len()),
    );
}

fn render_card(
    f: &mut Frame,
    area: Rect,
    title: &str,
    value: String,
    color: Color,
    subtitle: String,
) {
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(theme::panel(title.to_string()));

    f.render_widget(text, area);
}

fn render_category_chart(f: &mut Frame, area: Rect, dash: &Dashboard) {
    if dash.top_categories.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No expenses this month. Add one with :add <amount> <category>",
            theme::dim_style(),
        )))
        .centered()
        .block(theme::panel("Top Categories".into()));
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = dash
        .top_categories
        .iter()
        .map(|c| {
            Bar::default()
                .value(c.total.to_u64().unwrap_or(0))
                .label(Line::from(truncate(c.category.as_str(), 10)))
                .style(Style::default().fg(theme::ACCENT))
                .value_style(
                    Style::default()
                        .fg(theme::HEADER_BG)
                        .bg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(theme::panel("Top Categories".into()))
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme::ACCENT))
        .value_style(Style::default().fg(theme::TEXT));

    f.render_widget(chart, area);
}

fn render_recent(f: &mut Frame, area: Rect, dash: &Dashboard) {
    let width = area.width.saturating_sub(2) as usize;
    let desc_width = width.saturating_sub(26).max(8);
    let items: Vec<ListItem> = dash
        .recent
        .iter()
        .map(|e| {
            let label = if e.description.is_empty() {
                e.category.as_str().to_string()
            } else {
                e.description.clone()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", e.date.format("%m-%d")), theme::dim_style()),
                Span::styled(
                    format!("{:<desc_width$}", truncate(&label, desc_width)),
                    theme::normal_style(),
                ),
                Span::styled(format!(" {:>12}", format_amount(e.amount)), theme::amount_style()),
            ]))
        })
        .collect();

    f.render_widget(
        List::new(items).block(theme::panel("Recent Expenses".into())),
        area,
    );
}

fn render_goals(f: &mut Frame, area: Rect, dash: &Dashboard) {
    let items: Vec<ListItem> = dash
        .goals
        .iter()
        .map(|g| {
            let pct = g.progress_percent();
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<16}", truncate(&g.title, 16)), theme::normal_style()),
                Span::styled(
                    progress_bar(f64::from(pct) / 100.0, 10),
                    Style::default().fg(theme::goal_status_color(g.status)),
                ),
                Span::styled(format!(" {pct:>3}%"), theme::dim_style()),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(theme::panel("Goals".into())), area);
}

fn render_daily_sparkline(f: &mut Frame, area: Rect, app: &App) {
    // One slot per day of the month so gaps show as zero
    let month = &app.current_month;
    let days = month.last_day().signed_duration_since(month.first_day()).num_days() + 1;
    let mut data = vec![0u64; usize::try_from(days).unwrap_or(31)];
    for d in &app.daily {
        let idx = d.date.signed_duration_since(month.first_day()).num_days();
        if let Some(slot) = usize::try_from(idx).ok().and_then(|i| data.get_mut(i)) {
            *slot = d.total.to_u64().unwrap_or(0);
        }
    }

    let sparkline = Sparkline::default()
        .block(theme::panel(format!("Daily Spending {month}")))
        .data(&data)
        .style(Style::default().fg(theme::YELLOW));

    f.render_widget(sparkline, area);
}
