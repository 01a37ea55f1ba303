/// Line-oriented editing scripts.
///
/// Each non-empty line is one command; `#` starts a comment line. Element
/// paths use the `[i,j,...]` form of the selection string codec, and caret
/// offsets count characters across the element's text run.
use std::io::Write;

use anyhow::{bail, Context, Result};
use html_pad_core::commands;
use html_pad_core::history::{NodePath, SelectionPoint, SelectionSnapshot};
use html_pad_core::path::find_element_by_path;
use html_pad_core::{selection, Document, EditingContext, NodeId};

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Caret(NodePath, usize),
    Select(NodePath, usize, NodePath, usize),
    Type(String),
    Backspace,
    Attr {
        path: NodePath,
        name: String,
        value: Option<String>,
    },
    Wrap {
        tag: String,
        path: NodePath,
    },
    Unwrap(NodePath),
    Group {
        count: usize,
        op_type: Option<String>,
    },
    Undo,
    Redo,
    Clear,
    State,
    Print,
}

fn path_arg(arg: Option<&str>, what: &str) -> Result<NodePath> {
    arg.with_context(|| format!("missing {what} path"))?
        .parse()
        .with_context(|| format!("invalid {what} path"))
}

fn number_arg(arg: Option<&str>, what: &str) -> Result<usize> {
    let arg = arg.with_context(|| format!("missing {what}"))?;
    arg.parse()
        .with_context(|| format!("invalid {what} {arg:?}"))
}

/// Parses one line. Returns `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// Returns an error for unknown commands or malformed arguments.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let mut args = rest.split_whitespace();

    let command = match name {
        "caret" => Command::Caret(
            path_arg(args.next(), "caret")?,
            number_arg(args.next(), "offset")?,
        ),
        "select" => Command::Select(
            path_arg(args.next(), "anchor")?,
            number_arg(args.next(), "anchor offset")?,
            path_arg(args.next(), "focus")?,
            number_arg(args.next(), "focus offset")?,
        ),
        "type" => {
            // Keep inner spacing; only the separator after the command goes
            let text = rest.strip_prefix(' ').unwrap_or(rest);
            if text.is_empty() {
                bail!("type needs some text");
            }
            Command::Type(text.to_string())
        }
        "backspace" => Command::Backspace,
        "attr" => Command::Attr {
            path: path_arg(args.next(), "element")?,
            name: args.next().context("missing attribute name")?.to_string(),
            value: args.next().map(str::to_string),
        },
        "wrap" => Command::Wrap {
            tag: args.next().context("missing tag name")?.to_string(),
            path: path_arg(args.next(), "element")?,
        },
        "unwrap" => Command::Unwrap(path_arg(args.next(), "element")?),
        "group" => Command::Group {
            count: number_arg(args.next(), "record count")?,
            op_type: args.next().map(str::to_string),
        },
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "clear" => Command::Clear,
        "state" => Command::State,
        "print" => Command::Print,
        other => bail!("unknown command {other:?}"),
    };
    Ok(Some(command))
}

/// A document with its editing context, driven by script commands.
#[derive(Debug)]
pub struct Session {
    pub doc: Document,
    pub ctx: EditingContext,
}

impl Session {
    pub fn new(doc: Document, ctx: EditingContext) -> Self {
        Self { doc, ctx }
    }

    fn element(&self, path: &NodePath) -> Result<NodeId> {
        Ok(find_element_by_path(&self.doc.tree, self.doc.root(), path)?)
    }

    fn place(&mut self, snapshot: SelectionSnapshot) -> Result<()> {
        if !selection::restore(&mut self.doc, &snapshot) {
            bail!("selection {snapshot} does not resolve");
        }
        Ok(())
    }

    /// Runs every line of `script`, writing `state` and `print` output to
    /// `out`.
    ///
    /// # Errors
    ///
    /// Stops at the first failing line and reports its number.
    pub fn run_script(&mut self, script: &str, out: &mut impl Write) -> Result<()> {
        for (index, line) in script.lines().enumerate() {
            let number = index + 1;
            let Some(command) =
                parse_line(line).with_context(|| format!("line {number}: {}", line.trim()))?
            else {
                continue;
            };
            self.run(&command, out)
                .with_context(|| format!("line {number}: {}", line.trim()))?;
        }
        Ok(())
    }

    /// Runs one command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command does not fit the document or its
    /// journal operation fails.
    pub fn run(&mut self, command: &Command, out: &mut impl Write) -> Result<()> {
        tracing::debug!("Running {command:?}");
        match command {
            Command::Caret(path, offset) => {
                self.place(SelectionSnapshot::collapsed(SelectionPoint::text(
                    path.clone(),
                    *offset,
                )))?;
            }
            Command::Select(anchor, anchor_offset, focus, focus_offset) => {
                self.place(SelectionSnapshot {
                    anchor: SelectionPoint::text(anchor.clone(), *anchor_offset),
                    focus: Some(SelectionPoint::text(focus.clone(), *focus_offset)),
                })?;
            }
            Command::Type(text) => {
                // One keystroke per character, so typing merges like it does live
                for ch in text.chars() {
                    let mut buf = [0; 4];
                    commands::insert_text(&mut self.ctx, &mut self.doc, ch.encode_utf8(&mut buf))?;
                }
            }
            Command::Backspace => {
                commands::delete_backward(&mut self.ctx, &mut self.doc)?;
            }
            Command::Attr { path, name, value } => {
                let element = self.element(path)?;
                commands::set_attribute(
                    &mut self.ctx,
                    &mut self.doc,
                    "setAttribute",
                    element,
                    name,
                    value.as_deref(),
                )?;
            }
            Command::Wrap { tag, path } => {
                let element = self.element(path)?;
                let parent = self
                    .doc
                    .tree
                    .parent(element)
                    .context("the root cannot be wrapped")?;
                commands::add_element(
                    &mut self.ctx,
                    &mut self.doc,
                    "wrap",
                    tag,
                    &[],
                    parent,
                    Some(element),
                    &[element],
                )?;
            }
            Command::Unwrap(path) => {
                let element = self.element(path)?;
                commands::remove_element(&mut self.ctx, &mut self.doc, "unwrap", element)?;
            }
            Command::Group { count, op_type } => {
                if !self.ctx.group_top_records(*count, op_type.as_deref()) {
                    tracing::warn!("Not enough records to group {count}");
                }
            }
            Command::Undo => {
                if !self.ctx.undo(&mut self.doc)? {
                    tracing::info!("Nothing to undo");
                }
            }
            Command::Redo => {
                if !self.ctx.redo(&mut self.doc)? {
                    tracing::info!("Nothing to redo");
                }
            }
            Command::Clear => self.ctx.clear(),
            Command::State => {
                let state = self.ctx.journal().state();
                writeln!(
                    out,
                    "undo: {} redo: {}",
                    state.undo_op_type.as_deref().unwrap_or("-"),
                    state.redo_op_type.as_deref().unwrap_or("-")
                )?;
            }
            Command::Print => writeln!(out, "{}", self.doc.body_html())?,
        }
        Ok(())
    }
}
