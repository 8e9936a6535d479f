//! Terminal plot of a solver's loss history.
//!
//! Each point is drawn as `_` in the colour of the root segment it belongs
//! to. Consecutive points of one segment in adjacent columns are joined
//! with `|`, and every root change draws a plain `|` down its column.

use compress_core::{LossRecord, Symbol};
use crossterm::style::{Color, Stylize};

/// Highest loss shown on the vertical axis
const LOSS_CAP: usize = 10;

const SEGMENT_COLORS: [Color; 8] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::White,
    Color::DarkGrey,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Blank,
    Point(usize),
    Connector(usize),
    Change,
}

/// One plotted invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Point {
    call: usize,
    cost: usize,
    /// Root segment, counted by the changes recorded before this step
    segment: usize,
}

/// Steps of `history` tagged with their segment. A change recorded after a
/// step starts the next segment even when it carries the same call number.
fn segment_points(history: &[LossRecord]) -> Vec<Point> {
    let mut segment = 0;
    let mut points = Vec::new();
    for record in history {
        match *record {
            LossRecord::Step { call, cost } => points.push(Point {
                call,
                cost,
                segment,
            }),
            LossRecord::RootChanged { .. } => segment += 1,
        }
    }
    points
}

#[derive(Debug, Clone, Copy)]
pub struct LossPlot {
    width: usize,
    height: usize,
    color: bool,
}

impl LossPlot {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(2),
            height: height.max(2),
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint(&self, glyph: char, segment: Option<usize>) -> String {
        match segment {
            Some(segment) if self.color => {
                let color = SEGMENT_COLORS[segment % SEGMENT_COLORS.len()];
                glyph.with(color).to_string()
            }
            _ => glyph.to_string(),
        }
    }

    /// Draw `history`, whose search started from `first_root`
    pub fn render(&self, history: &[LossRecord], first_root: &[Symbol]) -> String {
        let (width, height) = (self.width, self.height);
        let points = segment_points(history);
        let mut changes: Vec<usize> = Vec::new();
        let mut roots: Vec<Vec<Symbol>> = vec![first_root.to_vec()];
        for record in history {
            if let LossRecord::RootChanged { call, root, .. } = record {
                changes.push(*call);
                roots.push(root.clone());
            }
        }

        let mut out = vec![
            format!("Total loss history entries: {}", history.len()),
            format!("State changes detected at: {:?}", changes),
        ];
        if points.is_empty() {
            out.push(String::from("No regular loss data to plot"));
            return out.join("\n");
        }

        let min_call = points.iter().map(|p| p.call).min().unwrap_or(0);
        let max_call = points.iter().map(|p| p.call).max().unwrap_or(0);
        let max_loss = points.iter().map(|p| p.cost).max().unwrap_or(0).min(LOSS_CAP);

        let scale_x = |call: usize| -> usize {
            if max_call == min_call {
                width / 2
            } else {
                call.saturating_sub(min_call) * (width - 1) / (max_call - min_call)
            }
        };
        let scale_y = |loss: usize| -> Option<usize> {
            if max_loss == 0 {
                return Some(height / 2);
            }
            let scaled = (loss * (height - 1)) / max_loss;
            (height - 1).checked_sub(scaled)
        };

        let mut grid = vec![vec![Mark::Blank; width]; height];
        let mut plotted: Vec<(usize, usize, usize)> = Vec::new();
        for &Point { call, cost, segment } in &points {
            let x = scale_x(call);
            if let Some(y) = scale_y(cost) {
                grid[y][x] = Mark::Point(segment);
                plotted.push((x, y, segment));
            }
        }

        for pair in plotted.windows(2) {
            let (x1, y1, s1) = pair[0];
            let (x2, y2, s2) = pair[1];
            if s1 == s2 && x2 == x1 + 1 {
                for y in y1.min(y2) + 1..y1.max(y2) {
                    if grid[y][x1] == Mark::Blank {
                        grid[y][x1] = Mark::Connector(s1);
                    }
                }
            }
        }

        for &call in &changes {
            let x = scale_x(call);
            if x < width {
                for line in grid.iter_mut() {
                    if line[x] == Mark::Blank {
                        line[x] = Mark::Change;
                    }
                }
            }
        }

        out.push(String::new());
        out.push(String::from("Loss Progression During Solving"));
        out.push(format!("Number of Solver Calls: {} to {}", min_call, max_call));
        out.push(format!("Loss Range: 0.0 to {:.1}", max_loss as f64));
        out.push("=".repeat(width));

        for (i, line) in grid.iter().enumerate() {
            let label = max_loss as f64 * (height - 1 - i) as f64 / (height - 1) as f64;
            let body: String = line
                .iter()
                .map(|mark| match *mark {
                    Mark::Blank => String::from(" "),
                    Mark::Point(segment) => self.paint('_', Some(segment)),
                    Mark::Connector(segment) => self.paint('|', Some(segment)),
                    Mark::Change => String::from("|"),
                })
                .collect();
            out.push(format!("{:4.1} |{}", label, body));
        }

        out.push(format!("     {}", "-".repeat(width)));
        let step = (width / 8).max(1);
        let labels: String = (0..width)
            .step_by(step)
            .map(|i| format!("{:>6}", min_call + (max_call - min_call) * i / (width - 1)))
            .collect();
        out.push(format!("     {}", labels));
        out.push(format!("     {:^width$}", "Number of Solver Calls", width = width));

        out.push(String::new());
        out.push(String::from("Legend:"));
        for (i, root) in roots.iter().take(SEGMENT_COLORS.len()).enumerate() {
            out.push(format!(
                "  {} = State {}: {:?}",
                self.paint('_', Some(i)),
                i + 1,
                root
            ));
        }
        out.push(String::from("  | = State Change / Continuity Line"));

        let costs: Vec<usize> = points.iter().map(|p| p.cost).collect();
        out.push(String::new());
        out.push(String::from("Summary:"));
        out.push(format!("  Total solver calls: {}", points.len()));
        out.push(format!(
            "  Final loss: {:.2}",
            costs.last().copied().unwrap_or(0) as f64
        ));
        out.push(format!(
            "  Best loss: {:.2}",
            costs.iter().copied().min().unwrap_or(0) as f64
        ));
        out.push(format!("  State changes: {}", changes.len()));
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(call: usize, cost: usize) -> LossRecord {
        LossRecord::Step { call, cost }
    }

    fn grid_lines(text: &str) -> Vec<&str> {
        text.lines().filter(|l| l.get(4..6) == Some(" |")).collect()
    }

    #[test]
    fn test_points_scale_into_grid() {
        let history = [step(1, 4), step(2, 4), step(3, 2), step(4, 0)];
        let text = LossPlot::new(10, 5).render(&history, &[1, 1, 0, 1, 1]);
        let grid = grid_lines(&text);
        assert_eq!(grid[0], " 4.0 |_  _      ");
        assert_eq!(grid[2], " 2.0 |      _   ");
        assert_eq!(grid[4], " 0.0 |         _");
        assert!(text.contains("  Total solver calls: 4"));
        assert!(text.contains("  Final loss: 0.00"));
        assert!(text.contains("  State changes: 0"));
    }

    #[test]
    fn test_adjacent_points_are_connected() {
        let history = [step(1, 4), step(2, 0), step(3, 4)];
        let text = LossPlot::new(3, 5).render(&history, &[1]);
        let grid = grid_lines(&text);
        assert_eq!(grid[0], " 4.0 |_ _");
        assert_eq!(grid[2], " 2.0 ||| ");
        assert_eq!(grid[4], " 0.0 | _ ");
    }

    #[test]
    fn test_root_change_marks_column_and_legend() {
        let history = [
            step(1, 3),
            LossRecord::RootChanged {
                call: 1,
                cost: 3,
                root: vec![1, 1, 0, 1, 1],
            },
            step(2, 4),
            step(3, 2),
        ];
        let text = LossPlot::new(10, 5).render(&history, &[1, 1, 0, 1, 0]);
        let grid = grid_lines(&text);
        assert!(grid[0].starts_with(" 4.0 ||"));
        assert!(grid[1].starts_with(" 3.0 |_"));
        assert!(grid[4].starts_with(" 0.0 ||"));
        assert!(text.contains("State 1: [1, 1, 0, 1, 0]"));
        assert!(text.contains("State 2: [1, 1, 0, 1, 1]"));
        assert!(text.contains("  State changes: 1"));
    }

    #[test]
    fn test_step_before_change_keeps_old_segment() {
        let changed = LossRecord::RootChanged {
            call: 1,
            cost: 3,
            root: vec![1, 1, 0, 1, 1],
        };
        let history = [step(1, 3), changed.clone(), step(2, 4), changed, step(3, 2)];
        let segments: Vec<(usize, usize)> = segment_points(&history)
            .iter()
            .map(|p| (p.call, p.segment))
            .collect();
        assert_eq!(segments, vec![(1, 0), (2, 1), (3, 2)]);
    }

    #[test]
    fn test_points_across_change_are_not_connected() {
        let history = [
            step(1, 4),
            LossRecord::RootChanged {
                call: 2,
                cost: 4,
                root: vec![1, 1],
            },
            step(2, 0),
        ];
        let text = LossPlot::new(2, 5).render(&history, &[1]);
        let grid = grid_lines(&text);
        assert_eq!(grid[0], " 4.0 |_|");
        assert_eq!(grid[2], " 2.0 | |");
        assert_eq!(grid[4], " 0.0 | _");
    }

    #[test]
    fn test_losses_above_cap_are_clipped() {
        let history = [step(1, 30), step(2, 10)];
        let text = LossPlot::new(4, 3).render(&history, &[]);
        let grid = grid_lines(&text);
        assert_eq!(grid[0], "10.0 |   _");
        assert_eq!(grid[1], " 5.0 |    ");
    }

    #[test]
    fn test_empty_history() {
        let text = LossPlot::new(10, 5).render(&[], &[1]);
        assert!(text.ends_with("No regular loss data to plot"));
    }
}
