//! Command-line rendering.
//!
//! Token order is:
//!
//! 1. the base command,
//! 2. fields with a non-negative position, ascending,
//! 3. flagged fields (no position), in registry declaration order,
//! 4. fields with a negative position, ascending, so `-1` is the last token.
//!
//! The result never depends on the order in which values were assigned.
//! Tokens are not shell-escaped.

use crate::error::SpecError;
use crate::instance::SpecInstance;

/// Renders instances for one base command.
#[derive(Debug, Clone, Copy)]
pub struct CommandRenderer<'a> {
    command: &'a str,
}

impl<'a> CommandRenderer<'a> {
    pub fn new(command: &'a str) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &'a str {
        self.command
    }

    /// Renders the full token sequence. The first token is the command.
    ///
    /// Fails without producing partial output when a mandatory field is
    /// missing, a co-requirement is unmet, or a computed default cannot be
    /// resolved.
    pub fn render(&self, instance: &SpecInstance) -> Result<Vec<String>, SpecError> {
        instance.validate_complete()?;
        instance.validate_requirements()?;

        let resolver = instance.resolver();
        let mut leading: Vec<(i32, String)> = Vec::new();
        let mut flagged: Vec<String> = Vec::new();
        let mut trailing: Vec<(i32, String)> = Vec::new();

        for field in instance.registry().fields() {
            let Some(value) = resolver.get(field.name())? else {
                continue;
            };
            let Some(token) = field.render(&value, &resolver)? else {
                continue;
            };
            match field.get_position() {
                Some(position) if position >= 0 => leading.push((position, token)),
                Some(position) => trailing.push((position, token)),
                None => flagged.push(token),
            }
        }

        leading.sort_by_key(|(position, _)| *position);
        trailing.sort_by_key(|(position, _)| *position);

        let mut tokens = Vec::with_capacity(1 + leading.len() + flagged.len() + trailing.len());
        tokens.push(self.command.to_string());
        tokens.extend(leading.into_iter().map(|(_, token)| token));
        tokens.extend(flagged);
        tokens.extend(trailing.into_iter().map(|(_, token)| token));

        tracing::debug!(command = %self.command, tokens = tokens.len(), "rendered command line");
        Ok(tokens)
    }

    /// Renders and joins the tokens with single spaces.
    pub fn cmdline(&self, instance: &SpecInstance) -> Result<String, SpecError> {
        Ok(self.render(instance)?.join(" "))
    }
}
