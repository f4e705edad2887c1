// ABOUTME: Renders per-role persona instructions from stored prompt templates
// ABOUTME: Missing or unrenderable templates fall back to a generic instruction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use founderhub_core::constants::placeholders;
use founderhub_core::models::{Idea, PersonaRole};

/// Why a template could not be rendered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// `{{` without a matching `}}`
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),
    /// Placeholder name that has no value
    #[error("unknown placeholder '{0}'")]
    UnknownPlaceholder(String),
}

/// Generic instruction used when a role has no usable template
#[must_use]
pub fn fallback_instructions(role: &PersonaRole) -> String {
    format!(
        "You are the {} of a startup. Help the founder make high-quality decisions.",
        role.display_upper()
    )
}

/// Substitute `{{ idea_name }}` and `{{ idea_summary }}` in `template`
///
/// Whitespace inside the braces is ignored.
///
/// # Errors
///
/// Returns a [`RenderError`] on an unterminated or unknown placeholder
pub fn render_template(template: &str, idea_name: &str, idea_summary: &str) -> Result<String, RenderError> {
    let mut output = String::with_capacity(template.len() + idea_summary.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or(RenderError::Unterminated(offset + open))?;

        match after_open[..close].trim() {
            name if name == placeholders::IDEA_NAME => output.push_str(idea_name),
            name if name == placeholders::IDEA_SUMMARY => output.push_str(idea_summary),
            other => return Err(RenderError::UnknownPlaceholder(other.to_owned())),
        }

        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    output.push_str(rest);
    Ok(output)
}

/// Instructions for `role` advising on `idea`
///
/// Never fails: a missing template or a render error yields the fallback.
#[must_use]
pub fn resolve_instructions(template: Option<&str>, role: &PersonaRole, idea: &Idea) -> String {
    let Some(template) = template else {
        return fallback_instructions(role);
    };
    match render_template(template, &idea.title, idea.summary_or_default()) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::warn!(role = %role, error = %e, "Prompt template failed to render, using fallback");
            fallback_instructions(role)
        }
    }
}
