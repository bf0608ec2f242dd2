// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod config;
pub mod export;
pub mod order;

use crate::inspect::InspectorKind;
use owo_colors::OwoColorize;

/// Options shared by every command
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Emit JSON instead of plain text
    pub json: bool,
    /// Colour terminal output
    pub color: bool,
}

impl Output {
    /// `warning:` label, yellow when colour is enabled
    #[must_use]
    pub fn warning_label(&self) -> String {
        if self.color {
            "warning:".yellow().bold().to_string()
        } else {
            "warning:".to_string()
        }
    }

    /// `error:` label, red when colour is enabled
    #[must_use]
    pub fn error_label(&self) -> String {
        if self.color {
            "error:".red().bold().to_string()
        } else {
            "error:".to_string()
        }
    }
}

/// Inspection settings after applying command-line overrides
#[derive(Debug, Clone, Copy)]
pub struct InspectArgs {
    /// Backend override (`None` keeps the configured one)
    pub inspector: Option<InspectorKind>,
    /// Force sequential inspection
    pub sequential: bool,
}
