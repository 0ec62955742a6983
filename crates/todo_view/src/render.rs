use tabled::settings::Style;
use tabled::{Table, Tabled};
use todo_view_core::config::Palette;
use todo_view_core::error::AppError;
use todo_view_core::view::RowView;

pub const TITLE: &str = "HDM Todo List";

#[derive(Tabled)]
struct RowLine {
    id: i64,
    name: String,
    state: String,
}

fn row_state(row: &RowView) -> &'static str {
    match (row.editing, row.save_enabled) {
        (false, _) => "",
        (true, true) => "editing (save ready)",
        (true, false) => "editing",
    }
}

pub fn render_rows_plain(rows: &[RowView], palette: &Palette, loaded_at: Option<&str>) -> String {
    let lines: Vec<RowLine> = rows
        .iter()
        .map(|row| {
            let state = row_state(row);
            RowLine {
                id: row.id,
                name: row.text.clone(),
                state: if row.editing {
                    palette.accentize(state)
                } else {
                    state.to_string()
                },
            }
        })
        .collect();

    let mut table = Table::new(lines);
    table.with(Style::rounded());

    let footer = match loaded_at {
        Some(label) => format!("synced at {label}"),
        None => "not synced".to_string(),
    };

    format!(
        "{}\n{}\n{}",
        palette.accentize(TITLE),
        table,
        palette.mutedize(&footer)
    )
}

pub fn render_rows_json(rows: &[RowView]) -> Result<String, AppError> {
    Ok(serde_json::to_string(rows)?)
}
