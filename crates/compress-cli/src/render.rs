//! ASCII grids for single states and for a whole layer history.

use compress_core::{Cell, Layer};
use crossterm::style::Stylize;

/// Width every column shares: the widest index or cell text
fn column_width<'a>(len: usize, cells: impl IntoIterator<Item = &'a Cell>) -> usize {
    let index_width = len.saturating_sub(1).to_string().len();
    cells
        .into_iter()
        .map(|cell| cell.to_string().len())
        .max()
        .unwrap_or(0)
        .max(index_width)
}

fn border(len: usize, width: usize) -> String {
    let segment = "-".repeat(width + 2);
    format!("+{}+", vec![segment; len].join("+"))
}

fn row<I, S>(items: I, width: usize) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let cells: Vec<String> = items
        .into_iter()
        .map(|item| format!(" {:^width$} ", item.as_ref(), width = width))
        .collect();
    format!("|{}|", cells.join("|"))
}

fn hole_row(len: usize, hole: usize, width: usize, color: bool) -> String {
    let cells: Vec<String> = (0..len)
        .map(|i| {
            let mark = format!("{:^width$}", if i == hole { "H" } else { "" }, width = width);
            if color && i == hole {
                format!(" {} ", mark.yellow().bold())
            } else {
                format!(" {} ", mark)
            }
        })
        .collect();
    format!("|{}|", cells.join("|"))
}

/// Render one state: index row, cells, and the hole marker row
pub fn render_state(
    state: &[Cell],
    cost: usize,
    hole: Option<usize>,
    layer: Option<usize>,
    color: bool,
) -> String {
    if state.is_empty() {
        return format!("[] loss={}", cost);
    }
    let width = column_width(state.len(), state);
    let line = border(state.len(), width);

    let mut out = vec![
        line.clone(),
        row((0..state.len()).map(|i| i.to_string()), width),
        line.clone(),
        row(state.iter().map(|c| c.to_string()), width),
        line.clone(),
    ];
    if let Some(hole) = hole {
        out.push(hole_row(state.len(), hole, width, color));
        out.push(line);
    }
    match layer {
        Some(layer) => out.push(format!("Layer {} | loss={}", layer, cost)),
        None => out.push(format!("loss={}", cost)),
    }
    out.join("\n")
}

/// Render every layer as a row of one table, oldest first
pub fn render_layers(layers: &[Layer], hole: Option<usize>, color: bool) -> String {
    let Some(first) = layers.first() else {
        return String::from("(no layers)");
    };
    let len = first.state.len();
    let width = column_width(len, layers.iter().flat_map(|layer| layer.state.iter()));
    let line = border(len, width);

    let mut out = vec![
        line.clone(),
        row((0..len).map(|i| i.to_string()), width),
        line.clone(),
    ];
    for (i, layer) in layers.iter().enumerate() {
        let cells = row(layer.state.iter().map(|c| c.to_string()), width);
        out.push(format!("{} L{} (loss={})", cells, i, layer.cost));
        out.push(line.clone());
    }
    if let Some(hole) = hole {
        out.push(format!("{} Hole", hole_row(len, hole, width, color)));
        out.push(line);
    }
    out.join("\n")
}
