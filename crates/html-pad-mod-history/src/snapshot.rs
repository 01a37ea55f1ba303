/// Tree-independent selection snapshots and their string encoding.
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::region::NodePath;

/// One end of a stored selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPoint {
    /// Path of the element owning the point (text nodes use their parent).
    pub path: NodePath,
    /// Offset into the concatenated text run of the element, or a child
    /// index when `is_element` is set.
    pub offset: usize,
    /// The point was on an element rather than inside text.
    pub is_element: bool,
}

impl SelectionPoint {
    pub fn text(path: NodePath, offset: usize) -> Self {
        Self {
            path,
            offset,
            is_element: false,
        }
    }

    pub fn element(path: NodePath, offset: usize) -> Self {
        Self {
            path,
            offset,
            is_element: true,
        }
    }
}

/// Stored caret or range. An absent focus means a collapsed selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub anchor: SelectionPoint,
    pub focus: Option<SelectionPoint>,
}

impl SelectionSnapshot {
    pub fn collapsed(anchor: SelectionPoint) -> Self {
        Self {
            anchor,
            focus: None,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.focus.is_none()
    }
}

/// Encodes as
/// `anchorElem=[..] anchorOffset=N [anchorIsElement=1] [focusElem=[..] focusOffset=N [focusIsElement=1]]`.
impl fmt::Display for SelectionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "anchorElem={} anchorOffset={}",
            self.anchor.path, self.anchor.offset
        )?;
        if self.anchor.is_element {
            write!(f, " anchorIsElement=1")?;
        }
        if let Some(focus) = &self.focus {
            write!(f, " focusElem={} focusOffset={}", focus.path, focus.offset)?;
            if focus.is_element {
                write!(f, " focusIsElement=1")?;
            }
        }
        Ok(())
    }
}

fn field_regex() -> &'static Regex {
    static FIELD: OnceLock<Regex> = OnceLock::new();
    FIELD.get_or_init(|| {
        Regex::new(r"([A-Za-z]+)=(\[[0-9,\s]*\]|[0-9]+)").expect("static regex is valid")
    })
}

#[derive(Default)]
struct PointFields {
    path: Option<NodePath>,
    offset: Option<usize>,
    is_element: bool,
}

impl PointFields {
    fn into_point(self, which: &str) -> Result<Option<SelectionPoint>> {
        match self.path {
            None if self.offset.is_some() || self.is_element => {
                anyhow::bail!("{which} offset given without {which}Elem")
            }
            None => Ok(None),
            Some(path) => Ok(Some(SelectionPoint {
                path,
                offset: self.offset.unwrap_or(0),
                is_element: self.is_element,
            })),
        }
    }
}

impl FromStr for SelectionSnapshot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut anchor = PointFields::default();
        let mut focus = PointFields::default();

        for caps in field_regex().captures_iter(s) {
            let key = &caps[1];
            let value = &caps[2];
            let offset = || {
                value
                    .parse::<usize>()
                    .with_context(|| format!("invalid {key} value {value:?}"))
            };
            match key {
                "anchorElem" => anchor.path = Some(value.parse()?),
                "anchorOffset" => anchor.offset = Some(offset()?),
                "anchorIsElement" => anchor.is_element = value == "1",
                "focusElem" => focus.path = Some(value.parse()?),
                "focusOffset" => focus.offset = Some(offset()?),
                "focusIsElement" => focus.is_element = value == "1",
                other => tracing::debug!("Ignoring unknown selection field {other}"),
            }
        }

        let anchor = anchor
            .into_point("anchor")?
            .with_context(|| format!("selection string has no anchorElem: {s:?}"))?;
        let focus = focus.into_point("focus")?;
        Ok(Self { anchor, focus })
    }
}
