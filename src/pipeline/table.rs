//! Table rendering: detected cell grids to compact markdown.
//!
//! The extraction primitive hands back a raw grid of optional cell strings.
//! Original header rows are unreliable (multi-line, merged, or missing), so
//! the columns are renamed positionally (`C1`, `C2`, …) and the grid is
//! serialised as a standard markdown table: header line, separator line,
//! then data lines, in exactly that order. Consumers — the LLM included —
//! expect that shape; anything else reads as prose.
//!
//! Columns whose every cell is empty are dropped first. Extractors produce
//! such phantom columns for vertical rules and gutter whitespace, and they
//! would otherwise dilute the table with empty `| |` cells.

/// Render a raw cell grid as a markdown table.
///
/// Returns `None` when the grid has no rows or no surviving columns after
/// the empty-column drop; the caller must skip emission in that case.
pub fn render(grid: &[Vec<Option<String>>]) -> Option<String> {
    if grid.is_empty() {
        return None;
    }

    // Cell cleanup: missing → "", internal newlines → spaces, trim.
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let rows: Vec<Vec<String>> = grid
        .iter()
        .map(|row| {
            (0..width)
                .map(|i| {
                    row.get(i)
                        .and_then(|c| c.as_deref())
                        .map(|c| c.replace('\n', " ").trim().to_string())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    // Keep only columns with at least one non-empty cell.
    let kept: Vec<usize> = (0..width)
        .filter(|&col| rows.iter().any(|row| !row[col].is_empty()))
        .collect();
    if kept.is_empty() {
        return None;
    }

    let headers: Vec<String> = (1..=kept.len()).map(|i| format!("C{i}")).collect();

    // Column widths sized to the widest cell so the table stays readable
    // as plain text.
    let col_width = |idx: usize| -> usize {
        let data_max = rows
            .iter()
            .map(|row| row[kept[idx]].chars().count())
            .max()
            .unwrap_or(0);
        data_max.max(headers[idx].chars().count()).max(3)
    };
    let widths: Vec<usize> = (0..kept.len()).map(col_width).collect();

    let fmt_row = |cells: &[String]| -> String {
        let mut line = String::from("|");
        for (i, cell) in cells.iter().enumerate() {
            let pad = widths[i].saturating_sub(cell.chars().count());
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
            line.push_str(" |");
        }
        line
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(fmt_row(&headers));
    let separator: String = widths
        .iter()
        .map(|w| format!(" {} |", "-".repeat(*w)))
        .fold(String::from("|"), |mut acc, part| {
            acc.push_str(&part);
            acc
        });
    lines.push(separator);
    for row in &rows {
        let cells: Vec<String> = kept.iter().map(|&col| row[col].clone()).collect();
        lines.push(fmt_row(&cells));
    }

    Some(lines.join("\n"))
}
