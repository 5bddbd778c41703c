use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::expenses;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.expenses.is_empty() {
        let msg = if !app.search_input.is_empty() {
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("No expenses matching '{}'", app.search_input),
                    theme::dim_style(),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press Esc to clear the search",
                    theme::dim_style(),
                )),
            ]
        } else {
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("No expenses for {}", app.current_month),
                    theme::dim_style(),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Add one with :add <amount> <category> [description]",
                    theme::dim_style(),
                )),
            ]
        };
        f.render_widget(
            Paragraph::new(msg)
                .centered()
                .block(theme::panel("Expenses (0)".into())),
            area,
        );
        return;
    }

    let header = Row::new(
        ["Date", "Description", "Category", "Payment", "Amount"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    )
    .height(1);

    let rows: Vec<Row> = app
        .expenses
        .iter()
        .enumerate()
        .skip(app.expense_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, e)| {
            let mut description = truncate(&e.description, 40);
            if !e.tags.is_empty() {
                description.push_str(&format!("  #{}", e.tags.join(" #")));
            }
            Row::new(vec![
                Cell::from(format!("  {}", e.date)),
                Cell::from(description),
                Cell::from(e.category.as_str()),
                Cell::from(e.payment_method.as_str()),
                Cell::from(Span::styled(
                    format!("{:>12}", format_amount(e.amount)),
                    if i == app.expense_index {
                        theme::selected_style()
                    } else {
                        theme::amount_style()
                    },
                )),
            ])
            .style(theme::row_style(i, app.expense_index))
        })
        .collect();

    let widths = [
        Constraint::Length(14),
        Constraint::Min(20),
        Constraint::Length(20),
        Constraint::Length(14),
        Constraint::Length(14),
    ];

    let shown_total = expenses::total(&app.expenses);
    let mut title = format!(
        "Expenses {} ({} of {}, {})",
        app.current_month,
        app.expenses.len(),
        app.expense_total,
        format_amount(shown_total)
    );
    if !app.search_input.is_empty() {
        title.push_str(&format!(" search: '{}'", app.search_input));
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(theme::panel(title));
    f.render_widget(table, area);
}
