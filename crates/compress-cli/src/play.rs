//! Interactive console game driven by numbered menu choices.

use crate::record::GameRecord;
use crate::render::{render_layers, render_state};
use anyhow::{Context, Result};
use compress_core::{Action, Direction, Engine, Pattern};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// How a session ended
#[derive(Debug)]
pub struct PlayOutcome {
    pub engine: Engine,
    /// Sum of the cost after every accepted step
    pub total_loss: usize,
    pub steps: usize,
    pub solved: bool,
    /// Record directory, if the game was saved
    pub saved: Option<PathBuf>,
}

pub struct Session<R, W> {
    input: R,
    out: W,
    engine: Engine,
    total_loss: usize,
    steps: usize,
    saved: Option<PathBuf>,
    save_dir: Option<PathBuf>,
    color: bool,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(engine: Engine, input: R, out: W) -> Self {
        Self {
            input,
            out,
            engine,
            total_loss: 0,
            steps: 0,
            saved: None,
            save_dir: None,
            color: false,
        }
    }

    /// Save a record here on quit or on request
    pub fn with_save_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.save_dir = dir;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Next non-empty input line, `None` at end of input
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        loop {
            write!(self.out, "{}", text)?;
            self.out.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let line = line.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
    }

    fn prompt_number<T: std::str::FromStr>(&mut self, text: &str) -> Result<Option<T>> {
        let Some(line) = self.prompt(text)? else {
            return Ok(None);
        };
        match line.parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                writeln!(self.out, "Not a number: {}", line)?;
                Ok(None)
            }
        }
    }

    fn read_action(&mut self, choice: &str) -> Result<Option<Action>> {
        let label = if choice == "0" { "Group" } else { "Clamp" };
        let Some(position) = self.prompt_number(&format!("{} position: ", label))? else {
            return Ok(None);
        };
        let action = match choice {
            "0" | "1" => {
                let Some(size) = self.prompt_number(&format!("{} size: ", label))? else {
                    return Ok(None);
                };
                if choice == "0" {
                    Action::group(position, size)
                } else {
                    Action::clamp(position, size)
                }
            }
            _ => {
                let Some(offset) = self.prompt_number::<i8>("Direction (-1=left, 1=right): ")?
                else {
                    return Ok(None);
                };
                match Direction::try_from(offset) {
                    Ok(direction) => Action::shift(position, direction),
                    Err(err) => {
                        writeln!(self.out, "Invalid move: {}", err)?;
                        return Ok(None);
                    }
                }
            }
        };
        Ok(Some(action))
    }

    fn save(&mut self) -> Result<()> {
        let Some(dir) = self.save_dir.clone() else {
            writeln!(self.out, "Saving is disabled")?;
            return Ok(());
        };
        let saved = GameRecord::from_engine(&self.engine)
            .save(&dir)
            .context("failed to save game")?;
        writeln!(self.out, "Game information saved to {}", saved.display())?;
        self.saved = Some(saved);
        Ok(())
    }

    fn show_state(&mut self) -> Result<()> {
        let text = render_state(
            self.engine.state(),
            self.engine.cost(),
            self.engine.hole(),
            None,
            self.color,
        );
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    fn show_layers(&mut self) -> Result<()> {
        let text = render_layers(self.engine.layers(), self.engine.hole(), self.color);
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    /// Run until the state is solved, the player quits, or input ends
    pub fn run(mut self) -> Result<PlayOutcome> {
        writeln!(self.out, "Welcome to the Compression Game!")?;
        if let Some(hole) = self.engine.hole() {
            writeln!(self.out, "Hole is at position {}", hole)?;
        }

        let mut solved = self.engine.cost() == 0;
        while !solved {
            writeln!(self.out, "================== Step {} ==================", self.steps)?;
            writeln!(self.out, "Unlocked clamps: {}", format_unlocked(self.engine.unlocked()))?;
            self.show_state()?;
            writeln!(self.out, "You can perform these actions:")?;
            writeln!(self.out, "0: Group elements")?;
            writeln!(self.out, "1: Clamp group")?;
            writeln!(self.out, "2: Move clamp")?;
            writeln!(self.out, "3: Show all layers")?;
            writeln!(self.out, "4: Save game")?;
            writeln!(self.out, "q: Quit game")?;

            let Some(choice) = self.prompt("Choose action (0-4, q to quit): ")? else {
                break;
            };
            match choice.as_str() {
                "q" | "Q" => {
                    writeln!(self.out, "\nQuitting game...")?;
                    if self.save_dir.is_some() {
                        self.save()?;
                    }
                    break;
                }
                "3" => {
                    writeln!(self.out, "\n=== Showing all layers ===")?;
                    self.show_layers()?;
                    continue;
                }
                "4" => {
                    self.save()?;
                    continue;
                }
                "0" | "1" | "2" => {}
                _ => {
                    writeln!(self.out, "Invalid choice!")?;
                    continue;
                }
            }

            let Some(action) = self.read_action(&choice)? else {
                continue;
            };
            match self.engine.apply(action) {
                Ok(step) => {
                    self.total_loss += step.cost;
                    self.steps += 1;
                    solved = step.done;
                    writeln!(
                        self.out,
                        "Current loss: {} | Total loss so far: {}",
                        step.cost, self.total_loss
                    )?;
                }
                Err(err) => writeln!(self.out, "Invalid move: {}", err)?,
            }
        }

        if solved {
            writeln!(self.out, "\nFinal state achieved!")?;
            self.show_state()?;
            writeln!(self.out, "\nFinal total loss: {}", self.total_loss)?;
            writeln!(self.out, "\nFinal layer hierarchy:")?;
            self.show_layers()?;
        }

        Ok(PlayOutcome {
            engine: self.engine,
            total_loss: self.total_loss,
            steps: self.steps,
            solved,
            saved: self.saved,
        })
    }
}

fn format_unlocked(unlocked: &BTreeSet<Pattern>) -> String {
    let patterns: Vec<String> = unlocked.iter().map(|p| p.to_string()).collect();
    format!("{{{}}}", patterns.join(", "))
}
