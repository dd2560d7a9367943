//! Cell rendering and board output formatting.
//!
//! Rendering is fixed per column type: STATUS shows the option label and
//! color, PERSON the member's name, DATE the first ten characters, numbers
//! right-aligned. Unset values and values that no longer resolve (removed
//! option, unknown member) render blank.

use crate::types::{BoardView, Column, ColumnType, FieldValue, Member, StageBreakdown, Task};
use serde::Serialize;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Right,
    Center,
}

/// A rendered cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub align: Align,
}

impl Cell {
    fn blank(align: Align) -> Self {
        Self {
            text: String::new(),
            color: None,
            align,
        }
    }

    fn text(text: impl Into<String>, align: Align) -> Self {
        Self {
            text: text.into(),
            color: None,
            align,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn default_align(column_type: ColumnType) -> Align {
    match column_type {
        ColumnType::Number | ColumnType::Money => Align::Right,
        ColumnType::Checkbox | ColumnType::Status => Align::Center,
        _ => Align::Left,
    }
}

/// Render one cell of `column` for a task.
pub fn render_cell(column: &Column, value: Option<&FieldValue>, members: &[Member]) -> Cell {
    let align = default_align(column.column_type);
    let Some(value) = value else {
        return Cell::blank(align);
    };

    match value {
        FieldValue::Status(Some(id)) => match column.settings.option(id) {
            Some(option) => Cell {
                text: option.label.clone(),
                color: Some(option.color.clone()),
                align,
            },
            None => Cell::blank(align),
        },
        FieldValue::Person(Some(id)) => match members.iter().find(|m| &m.id == id) {
            Some(member) => Cell::text(member.name.clone(), align),
            None => Cell::blank(align),
        },
        FieldValue::Date(Some(date)) => Cell::text(date.chars().take(10).collect::<String>(), align),
        FieldValue::Number(n) => Cell::text(format_number(*n), align),
        FieldValue::Money(n) => Cell::text(format!("{:.2}", n), align),
        FieldValue::Checkbox(checked) => Cell::text(if *checked { "✓" } else { "" }, align),
        FieldValue::Text(s) => Cell::text(s.clone(), align),
        FieldValue::Status(None) | FieldValue::Person(None) | FieldValue::Date(None) => {
            Cell::blank(align)
        }
    }
}

/// Render every column of a task in column order.
pub fn render_row(columns: &[Column], task: &Task, members: &[Member]) -> Vec<Cell> {
    columns
        .iter()
        .map(|c| render_cell(c, task.value(&c.id), members))
        .collect()
}

fn escape_pipes(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Format a board view as markdown, one table per group.
pub fn format_board_markdown(view: &BoardView) -> String {
    let mut md = String::new();
    md.push_str(&format!("# {}\n", view.board.name));
    md.push_str(&format!(
        "- **id**: `{}`\n- **kind**: {}\n- **can_edit**: {}\n",
        view.board.id,
        view.board.kind.as_str(),
        view.can_edit
    ));

    for group in &view.groups {
        let collapsed = if group.group.collapsed { " (collapsed)" } else { "" };
        md.push_str(&format!(
            "\n## {} ({}){}\n\n",
            group.group.name,
            group.tasks.len(),
            collapsed
        ));

        let mut header = vec!["Item".to_string()];
        header.extend(view.columns.iter().map(|c| escape_pipes(&c.name)));
        md.push_str(&format!("| {} |\n", header.join(" | ")));

        let mut rule = vec!["---".to_string()];
        rule.extend(view.columns.iter().map(|c| {
            match default_align(c.column_type) {
                Align::Right => "---:",
                Align::Center => ":---:",
                Align::Left => "---",
            }
            .to_string()
        }));
        md.push_str(&format!("| {} |\n", rule.join(" | ")));

        for task in &group.tasks {
            let mut cells = vec![escape_pipes(&task.name)];
            cells.extend(
                render_row(&view.columns, task, &view.members)
                    .into_iter()
                    .map(|c| escape_pipes(&c.text)),
            );
            md.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
    }
    md
}

/// Format a stage breakdown as markdown bars.
pub fn format_stages_markdown(breakdown: &StageBreakdown) -> String {
    let mut md = format!(
        "# Stages ({} tasks, {} unstaged)\n\n",
        breakdown.total_tasks, breakdown.excluded
    );
    for stage in &breakdown.stages {
        md.push_str(&format!(
            "- **{}** ({}): {}\n",
            stage.label, stage.color, stage.count
        ));
    }
    md
}
