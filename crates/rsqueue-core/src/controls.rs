//! ReFRESCO `controls.xml` reading.

use crate::progress::ProgressError;
use camino::Utf8Path;
use serde::Serialize;
use std::fs;

/// How a run counts its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulationMode {
    /// Outer-loop iterations towards convergence.
    Steady,
    /// Physical timesteps of the time loop.
    Unsteady,
}

/// Where a mode keeps its step count and step limit.
#[derive(Debug, Clone, Copy)]
struct ModeLayout {
    /// Column of the step count in a counters row.
    step_column: usize,
    /// Element path of the step limit in `controls.xml`.
    max_step_path: &'static [&'static str],
}

const STEADY: ModeLayout = ModeLayout {
    step_column: 0,
    max_step_path: &["controls", "outerLoop", "maxIteration"],
};

// Unsteady rows lead with a running index, the timestep comes second.
const UNSTEADY: ModeLayout = ModeLayout {
    step_column: 1,
    max_step_path: &["controls", "timeLoop", "maxTimesteps"],
};

const UNSTEADY_FLAG_PATH: &[&str] = &["controls", "timeLoop", "unsteady"];

impl SimulationMode {
    fn layout(self) -> &'static ModeLayout {
        match self {
            Self::Steady => &STEADY,
            Self::Unsteady => &UNSTEADY,
        }
    }

    /// Column of the step count in a counters row.
    pub fn step_column(self) -> usize {
        self.layout().step_column
    }

    /// Element path holding the step limit.
    pub fn max_step_path(self) -> &'static [&'static str] {
        self.layout().max_step_path
    }
}

/// The fields of `controls.xml` needed for progress tracking.
#[derive(Debug, Clone)]
pub struct Controls {
    pub mode: SimulationMode,
    pub max_step: u64,
}

impl Controls {
    /// Read and parse a controls file.
    pub fn load(path: &Utf8Path) -> Result<Self, ProgressError> {
        tracing::debug!(%path, "reading controls file");
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse controls document text.
    pub fn parse(content: &str) -> Result<Self, ProgressError> {
        let doc = roxmltree::Document::parse(content)?;

        let flag = required_text(&doc, UNSTEADY_FLAG_PATH)?;
        let mode = match flag.to_ascii_lowercase().as_str() {
            "true" => SimulationMode::Unsteady,
            "false" => SimulationMode::Steady,
            _ => {
                return Err(ProgressError::InvalidConfigValue {
                    path: UNSTEADY_FLAG_PATH.join("/"),
                    value: flag.to_string(),
                });
            }
        };

        let path = mode.max_step_path();
        let raw = required_text(&doc, path)?;
        let max_step = raw
            .parse::<u64>()
            .map_err(|_| ProgressError::InvalidConfigValue {
                path: path.join("/"),
                value: raw.to_string(),
            })?;

        Ok(Self { mode, max_step })
    }
}

/// Trimmed text of the element at `path`, starting from the root element.
fn element_text<'a>(doc: &'a roxmltree::Document, path: &[&str]) -> Option<&'a str> {
    let (first, rest) = path.split_first()?;
    let root = doc.root_element();
    if root.tag_name().name() != *first {
        return None;
    }

    let mut node = root;
    for name in rest {
        node = node
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == *name)?;
    }
    Some(node.text().unwrap_or("").trim())
}

fn required_text<'a>(
    doc: &'a roxmltree::Document,
    path: &[&str],
) -> Result<&'a str, ProgressError> {
    element_text(doc, path).ok_or_else(|| ProgressError::ConfigPathMissing(path.join("/")))
}
