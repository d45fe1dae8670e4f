use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use tproj_cli::commands::{EnvironmentRow, InspectResult, NewResult, NormalizeResult};
use tproj_model::EntityKind;

pub fn print_outline(result: &InspectResult) {
    println!("Project: {}", result.path.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Entity"),
        header_cell("Kind"),
        header_cell("Uid"),
        header_cell("Implementation"),
    ]);
    apply_outline_table_style(&mut table);
    for row in &result.rows {
        table.add_row(vec![
            name_cell(&format!("{}{}", "  ".repeat(row.depth), row.name), row.kind),
            kind_cell(row.kind),
            dim_cell(&row.uid),
            implementation_cell(row.implementation),
        ]);
    }
    println!("{table}");

    if !result.skipped.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Element"),
            header_cell("Name"),
            header_cell("Reason"),
        ]);
        apply_table_style(&mut table);
        for entry in &result.skipped {
            table.add_row(vec![
                Cell::new(format!("<{}>", entry.tag)),
                Cell::new(entry.name.as_deref().unwrap_or("-")),
                Cell::new(&entry.reason).fg(Color::Yellow),
            ]);
        }
        println!();
        println!("Skipped:");
        println!("{table}");
    }
    if !result.failures.is_empty() {
        eprintln!("Field failures:");
        for failure in &result.failures {
            eprintln!("- {failure}");
        }
    }
}

pub fn print_environments(rows: &[EnvironmentRow]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Section"),
        header_cell("Revision"),
        header_cell("Entries"),
        header_cell("Details"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.section)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            row.revision.map_or_else(|| dim_cell("-"), Cell::new),
            count_cell(row.entries),
            Cell::new(&row.detail),
        ]);
    }
    println!("{table}");
}

pub fn print_normalized(result: &NormalizeResult) {
    if result.changed {
        println!(
            "Normalized <{}> document: {}",
            result.root,
            result.target.display()
        );
    } else if result.target == result.source {
        println!("Already normalized: {}", result.source.display());
    } else {
        println!("Copied unchanged: {}", result.target.display());
    }
}

pub fn print_created(result: &NewResult) {
    println!(
        "Created {} ({} nodes, root uid {})",
        result.path.display(),
        result.nodes,
        result.root_uid
    );
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_outline_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn name_cell(label: &str, kind: EntityKind) -> Cell {
    if kind.is_root_kind() {
        Cell::new(label)
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new(label)
    }
}

fn kind_cell(kind: EntityKind) -> Cell {
    let color = match kind {
        EntityKind::Project | EntityKind::TemplateProject => Color::Blue,
        EntityKind::TestSuite | EntityKind::TestCase => Color::Green,
        EntityKind::TestStep | EntityKind::TestAction => Color::White,
        EntityKind::Template => Color::Magenta,
        EntityKind::Reference => Color::Yellow,
    };
    Cell::new(kind.as_str()).fg(color)
}

fn implementation_cell(name: &str) -> Cell {
    if name == "GenericNode" {
        Cell::new(name).fg(Color::Yellow)
    } else {
        dim_cell(name)
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
