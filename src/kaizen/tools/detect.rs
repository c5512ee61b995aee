// SPDX-License-Identifier: MIT

//! Explicit tool-prefix detection
//!
//! Supported forms (case-insensitive, surrounding whitespace ignored):
//! - `sql: SELECT * FROM table`
//! - `web: query terms`
//! - `search: query terms` (alias of `web`)
//! - `tool:sql: <arg>` (generic form, any prefix above)
//!
//! A bare `tool:` followed by anything else is an explicit tool request
//! whose tool cannot be named.

/// Prefix → canonical tool name
pub const TOOL_PREFIXES: [(&str, &str); 3] = [("sql:", "sql"), ("web:", "web"), ("search:", "web")];

const GENERIC_PREFIX: &str = "tool:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    /// A recognised prefix; `tool` is the canonical name
    Known { tool: &'static str, argument: String },
    /// `tool:` with no recognised sub-prefix
    Unknown { argument: String },
}

impl ToolRequest {
    pub fn tool_name(&self) -> Option<&'static str> {
        match self {
            ToolRequest::Known { tool, .. } => Some(*tool),
            ToolRequest::Unknown { .. } => None,
        }
    }

    pub fn argument(&self) -> &str {
        match self {
            ToolRequest::Known { argument, .. } | ToolRequest::Unknown { argument } => argument,
        }
    }
}

/// Detect an explicit tool prefix in the user's text
pub fn detect_tool_request(text: &str) -> Option<ToolRequest> {
    let raw = text.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(rest) = strip_prefix_ignore_case(raw, GENERIC_PREFIX) {
        let rest = rest.trim();
        return Some(match_known_prefix(rest).unwrap_or_else(|| ToolRequest::Unknown {
            argument: rest.to_string(),
        }));
    }

    match_known_prefix(raw)
}

fn match_known_prefix(text: &str) -> Option<ToolRequest> {
    TOOL_PREFIXES.iter().find_map(|&(prefix, tool)| {
        strip_prefix_ignore_case(text, prefix).map(|arg| ToolRequest::Known {
            tool,
            argument: arg.trim().to_string(),
        })
    })
}

/// ASCII case-insensitive `strip_prefix` that respects char boundaries
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &text[prefix.len()..])
}
