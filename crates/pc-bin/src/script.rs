//! Line-oriented editing scripts.
//!
//! One step per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! run delete              # any registered command by name
//! undo / redo
//! key ctrl+z              # a key-down while the current focus target holds focus
//! focus editable          # body | editable | element
//! blur                    # focus back to the body
//! select 0 [shift]        # click a block
//! deselect [shift]        # click empty container space
//! press 0 10 10 [shift]   # pointer down on block 0 at (10, 10)
//! move 60 40 [shift]
//! release
//! resize 0 end end 50 40 # press block 0's handle (horizontal, vertical: start|center|end)
//! resize-move 70 55
//! resize-release
//! menu-drag button        # drag a component out of the menu
//! drop 120 80
//! menu-end
//! import doc.json
//! export out.json
//! history                 # print entries, `>` marks the cursor
//! ```

use anyhow::{Context, Result};
use core_events::FocusTarget;
use core_keymap::KeyCombo;
use core_model::{Edge, EdgeParseError, EditorModel, ResizeHandle};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Run(String),
    Undo,
    Redo,
    Key(KeyCombo),
    Focus(FocusTarget),
    Select { index: usize, shift: bool },
    Deselect { shift: bool },
    Press { index: usize, x: f64, y: f64, shift: bool },
    Move { x: f64, y: f64, shift: bool },
    Release,
    ResizePress { index: usize, handle: ResizeHandle, x: f64, y: f64 },
    ResizeMove { x: f64, y: f64 },
    ResizeRelease,
    MenuDrag(String),
    Drop { x: f64, y: f64 },
    MenuEnd,
    Import(PathBuf),
    Export(PathBuf),
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub number: usize,
    pub step: Step,
}

struct Words<'a> {
    line: usize,
    verb: &'a str,
    rest: std::str::SplitWhitespace<'a>,
}

impl<'a> Words<'a> {
    fn err(&self, message: impl Into<String>) -> ScriptError {
        ScriptError {
            line: self.line,
            message: message.into(),
        }
    }

    fn word(&mut self, what: &str) -> Result<&'a str, ScriptError> {
        self.rest
            .next()
            .ok_or_else(|| self.err(format!("`{}` needs {what}", self.verb)))
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T, ScriptError> {
        let raw = self.word(what)?;
        raw.parse()
            .map_err(|_| self.err(format!("`{raw}` is not a valid {what}")))
    }

    /// A finite coordinate. NaN and infinities would not survive a JSON round trip.
    fn coordinate(&mut self, what: &str) -> Result<f64, ScriptError> {
        let value: f64 = self.number(what)?;
        if !value.is_finite() {
            return Err(self.err(format!("{what} must be finite, got `{value}`")));
        }
        Ok(value)
    }

    fn edge(&mut self, what: &str) -> Result<Edge, ScriptError> {
        let raw = self.word(what)?;
        raw.parse().map_err(|e: EdgeParseError| self.err(e.to_string()))
    }

    /// Optional trailing `shift` flag; anything else left over is an error.
    fn shift(&mut self) -> Result<bool, ScriptError> {
        let shift = match self.rest.next() {
            None => false,
            Some(w) if w.eq_ignore_ascii_case("shift") => true,
            Some(w) => return Err(self.err(format!("unexpected `{w}`"))),
        };
        self.end()?;
        Ok(shift)
    }

    fn end(&mut self) -> Result<(), ScriptError> {
        match self.rest.next() {
            None => Ok(()),
            Some(w) => Err(self.err(format!("unexpected `{w}`"))),
        }
    }
}

fn parse_focus(words: &mut Words<'_>) -> Result<FocusTarget, ScriptError> {
    let raw = words.word("a focus target")?;
    let target = match raw.to_ascii_lowercase().as_str() {
        "body" => FocusTarget::Body,
        "editable" | "input" => FocusTarget::Editable,
        "element" => FocusTarget::Element,
        _ => return Err(words.err(format!("unknown focus target `{raw}`"))),
    };
    words.end()?;
    Ok(target)
}

pub fn parse_line(number: usize, text: &str) -> Result<Option<Line>, ScriptError> {
    let text = text.split('#').next().unwrap_or_default().trim();
    let mut rest = text.split_whitespace();
    let Some(verb) = rest.next() else {
        return Ok(None);
    };
    let mut w = Words {
        line: number,
        verb,
        rest,
    };
    let step = match verb {
        "run" => {
            let name = w.word("a command name")?.to_string();
            w.end()?;
            Step::Run(name)
        }
        "undo" => {
            w.end()?;
            Step::Undo
        }
        "redo" => {
            w.end()?;
            Step::Redo
        }
        "key" => {
            let raw = w.word("a key combo")?;
            let combo = raw.parse::<KeyCombo>().map_err(|e| w.err(e.to_string()))?;
            w.end()?;
            Step::Key(combo)
        }
        "focus" => Step::Focus(parse_focus(&mut w)?),
        "blur" => {
            w.end()?;
            Step::Focus(FocusTarget::Body)
        }
        "select" => Step::Select {
            index: w.number("block index")?,
            shift: w.shift()?,
        },
        "deselect" => Step::Deselect { shift: w.shift()? },
        "press" => Step::Press {
            index: w.number("block index")?,
            x: w.coordinate("x coordinate")?,
            y: w.coordinate("y coordinate")?,
            shift: w.shift()?,
        },
        "move" => Step::Move {
            x: w.coordinate("x coordinate")?,
            y: w.coordinate("y coordinate")?,
            shift: w.shift()?,
        },
        "release" => {
            w.end()?;
            Step::Release
        }
        "resize" => {
            let index = w.number("block index")?;
            let handle = ResizeHandle::new(w.edge("a horizontal edge")?, w.edge("a vertical edge")?);
            let (x, y) = (w.coordinate("x coordinate")?, w.coordinate("y coordinate")?);
            w.end()?;
            Step::ResizePress { index, handle, x, y }
        }
        "resize-move" => {
            let (x, y) = (w.coordinate("x coordinate")?, w.coordinate("y coordinate")?);
            w.end()?;
            Step::ResizeMove { x, y }
        }
        "resize-release" => {
            w.end()?;
            Step::ResizeRelease
        }
        "menu-drag" => {
            let key = w.word("a component key")?.to_string();
            w.end()?;
            Step::MenuDrag(key)
        }
        "drop" => {
            let (x, y) = (w.coordinate("x coordinate")?, w.coordinate("y coordinate")?);
            w.end()?;
            Step::Drop { x, y }
        }
        "menu-end" => {
            w.end()?;
            Step::MenuEnd
        }
        "import" => {
            let path = PathBuf::from(w.word("a file path")?);
            w.end()?;
            Step::Import(path)
        }
        "export" => {
            let path = PathBuf::from(w.word("a file path")?);
            w.end()?;
            Step::Export(path)
        }
        "history" => {
            w.end()?;
            Step::History
        }
        other => return Err(w.err(format!("unknown step `{other}`"))),
    };
    Ok(Some(Line { number, step }))
}

/// Parse a whole script; fails on the first malformed line.
pub fn parse(source: &str) -> Result<Vec<Line>, ScriptError> {
    let mut lines = Vec::new();
    for (idx, text) in source.lines().enumerate() {
        if let Some(line) = parse_line(idx + 1, text)? {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// Run every step in order. `out` receives `history` listings.
pub fn execute<W: Write>(model: &mut EditorModel, lines: &[Line], out: &mut W) -> Result<()> {
    for line in lines {
        debug!(target: "runtime", line = line.number, step = ?line.step, "script_step");
        run_step(model, &line.step, out).with_context(|| format!("script line {}", line.number))?;
    }
    Ok(())
}

fn run_step<W: Write>(model: &mut EditorModel, step: &Step, out: &mut W) -> Result<()> {
    match step {
        Step::Run(name) => model.run(name)?,
        Step::Undo => model.undo()?,
        Step::Redo => model.redo()?,
        Step::Key(combo) => {
            let outcome = model.handle_key(&combo.to_event())?;
            debug!(target: "runtime", combo = %combo, ?outcome, "script_key");
        }
        Step::Focus(target) => model.set_focus(*target),
        Step::Select { index, shift } => model.focus_block(*index, *shift)?,
        Step::Deselect { shift } => model.focus_container(*shift),
        Step::Press { index, x, y, shift } => model.pointer_down(*index, *x, *y, *shift)?,
        Step::Move { x, y, shift } => model.pointer_move(*x, *y, *shift)?,
        Step::Release => model.pointer_up()?,
        Step::ResizePress { index, handle, x, y } => model.resize_down(*index, *handle, *x, *y)?,
        Step::ResizeMove { x, y } => model.resize_move(*x, *y)?,
        Step::ResizeRelease => model.resize_up()?,
        Step::MenuDrag(key) => model.menu_drag_start(key.as_str())?,
        Step::Drop { x, y } => {
            if !model.drop_at(*x, *y) {
                anyhow::bail!("`drop` without a preceding `menu-drag`");
            }
        }
        Step::MenuEnd => model.menu_drag_end()?,
        Step::Import(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            model.import_json(&text)?;
        }
        Step::Export(path) => {
            std::fs::write(path, model.export_json()? + "\n")
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Step::History => {
            let commander = model.commander();
            let cursor = commander.cursor();
            for (idx, label) in commander.history_labels().iter().enumerate() {
                let marker = if idx as isize == cursor { '>' } else { ' ' };
                writeln!(out, "{marker} {idx:>3} {label}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::Config;
    use core_model::{Block, EditorDocument};

    fn model(blocks: Vec<Block>) -> EditorModel {
        EditorModel::new(EditorDocument::default().with_blocks(blocks), &Config::default()).unwrap()
    }

    fn run(model: &mut EditorModel, source: &str) -> String {
        let lines = parse(source).unwrap();
        let mut out = Vec::new();
        execute(model, &lines, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_steps_and_skips_comments() {
        let lines = parse("# setup\n\npress 0 1.5 2 shift\nkey Ctrl+Z  # undo\nblur\n").unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, 3);
        assert_eq!(
            lines[0].step,
            Step::Press {
                index: 0,
                x: 1.5,
                y: 2.0,
                shift: true
            }
        );
        assert_eq!(lines[1].step, Step::Key("ctrl+z".parse().unwrap()));
        assert_eq!(lines[2].step, Step::Focus(FocusTarget::Body));
    }

    #[test]
    fn reports_line_numbers() {
        let err = parse("undo\nmove 1\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("y coordinate"), "{}", err.message);

        let err = parse("jump 3").unwrap_err();
        assert_eq!(err.to_string(), "line 1: unknown step `jump`");

        assert!(parse("undo now").is_err());
        assert!(parse("key ctrl+shift+shift+a").is_err());
        assert!(parse("focus window").is_err());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        for source in ["move NaN 0", "move 0 inf", "press 0 -inf 1", "drop 1 nan", "resize-move 1 Infinity"] {
            let err = parse(source).unwrap_err();
            assert!(err.message.contains("must be finite"), "{source}: {}", err.message);
        }
        assert!(parse("move 1e3 -2.5").is_ok());
    }

    #[test]
    fn resize_script_records_one_entry() {
        let mut block = Block::new("A", 0.0, 0.0);
        block.width = 20.0;
        block.height = 20.0;
        let mut m = model(vec![block]);
        let lines = parse("resize 0 end center 20 10\nresize-move 30 99\nresize-move 35 0\nresize-release\n").unwrap();
        assert_eq!(
            lines[0].step,
            Step::ResizePress {
                index: 0,
                handle: ResizeHandle::new(Edge::End, Edge::Center),
                x: 20.0,
                y: 10.0
            }
        );
        let mut out = Vec::new();
        execute(&mut m, &lines, &mut out).unwrap();
        let b = m.document().blocks[0].clone();
        assert_eq!((b.width, b.height), (35.0, 20.0));
        assert_eq!(m.commander().history_labels(), vec!["drag"]);
        assert!(parse("resize 0 diagonal end 1 1").is_err());
    }

    #[test]
    fn drag_script_records_one_entry() {
        let mut m = model(vec![Block::new("A", 0.0, 0.0), Block::new("B", 50.0, 50.0)]);
        let out = run(
            &mut m,
            "press 0 0 0\nmove 10 10\nmove 20 30\nrelease\nselect 1\nkey delete\nhistory\n",
        );
        assert_eq!(m.document().blocks.len(), 1);
        assert_eq!((m.document().blocks[0].left, m.document().blocks[0].top), (20.0, 30.0));
        assert_eq!(out, "    0 drag\n>   1 delete\n");
    }

    #[test]
    fn focus_gates_shortcuts() {
        let mut m = model(vec![Block::new("A", 0.0, 0.0).focused()]);
        run(&mut m, "focus editable\nkey delete\n");
        assert_eq!(m.document().blocks.len(), 1);
        run(&mut m, "blur\nkey delete\nkey ctrl+z\n");
        assert_eq!(m.document().blocks.len(), 1);
        assert_eq!(m.commander().cursor(), -1);
    }

    #[test]
    fn menu_drop_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let mut m = model(vec![]);
        run(
            &mut m,
            &format!("menu-drag text\ndrop 5 6\nmenu-end\nexport {}\n", path.display()),
        );
        let written = EditorDocument::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, m.document());
        assert!(written.blocks[0].adjust_position);
    }

    #[test]
    fn failing_step_names_its_line() {
        let mut m = model(vec![]);
        let lines = parse("undo\ndrop 1 1\n").unwrap();
        let err = execute(&mut m, &lines, &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "script line 2");
        assert!(format!("{err:#}").contains("menu-drag"));
    }
}
