//! Command routing.
//!
//! This module provides the [`Commander`] struct, the router shared by the
//! intakes of a transport. It owns the registered [`CommandDefinition`]s,
//! parses message text into an [`Invocation`] and dispatches it to the
//! matching handler.
//!
//! # Grammar
//!
//! ```text
//! [trigger] <command> [arguments...]
//! ```
//!
//! - the trigger prefix (e.g. `!aqi`) is matched case-insensitively and is
//!   only expected when the commander is built with one
//! - the command token is matched case-insensitively against names and
//!   aliases, exact match only
//! - argument tokens keep their casing
//!
//! # Flow
//!
//! ```text
//! START → TOKENIZED → MATCHED → ARGS_VALIDATED → DISPATCHED
//!                  ↘ EMPTY  ↘ UNKNOWN_COMMAND  ↘ MISSING_ARGS
//! ```

use std::{collections::HashMap, sync::Arc};

use log::debug;

use crate::{
    commands::{
        CommandDefinition, DispatchError, HandlerContext, InboundContext, Invocation, ParseError,
        RegistrationError,
    },
    reply::{DeliveryError, ReplyPayload, ReplySink},
};

/// Command router bound to one reply sink.
///
/// Each transport owns its own `Commander`: the trigger prefix and the sink
/// differ, the command set does not. A `Commander` is immutable once built
/// and is shared between concurrent messages through an [`Arc`].
pub struct Commander {
    /// Prefix every message must start with, if any
    trigger: Option<String>,
    /// Registered commands, in registration order
    definitions: Vec<CommandDefinition>,
    /// Lowercase names and aliases to their index in `definitions`
    index: HashMap<String, usize>,
    /// Sink used to answer the messages this commander dispatches
    sink: Arc<dyn ReplySink>,
}

impl Commander {
    /// Creates a commander without any command.
    ///
    /// # Arguments
    ///
    /// * `trigger` - Prefix messages must start with, `None` to accept any message
    /// * `sink` - Sink answering the dispatched messages
    pub fn new(trigger: Option<&str>, sink: Arc<dyn ReplySink>) -> Self {
        Commander {
            trigger: trigger
                .map(str::trim)
                .filter(|trigger| !trigger.is_empty())
                .map(str::to_string),
            definitions: Vec::new(),
            index: HashMap::new(),
            sink,
        }
    }

    /// Registers a command.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::DuplicateCommand`] if the name or one of the
    /// aliases is already used, either by a registered command or twice by
    /// this definition. Nothing is registered in that case.
    pub fn register(&mut self, definition: CommandDefinition) -> Result<(), RegistrationError> {
        let mut keys: Vec<String> = Vec::new();
        for key in definition.keys() {
            let key = key.to_lowercase();
            if let Some(existing) = self.index.get(&key) {
                return Err(RegistrationError::DuplicateCommand {
                    key,
                    existing: self.definitions[*existing].name.clone(),
                });
            }
            if keys.contains(&key) {
                return Err(RegistrationError::DuplicateCommand {
                    key,
                    existing: definition.name.clone(),
                });
            }
            keys.push(key);
        }

        debug!("registering command {:?}", definition);

        let position = self.definitions.len();
        self.definitions.push(definition);
        for key in keys {
            self.index.insert(key, position);
        }

        Ok(())
    }

    /// Returns the trigger prefix, if any.
    pub fn trigger(&self) -> Option<&str> {
        self.trigger.as_deref()
    }

    /// Registered commands, in registration order.
    pub fn definitions(&self) -> &[CommandDefinition] {
        &self.definitions
    }

    /// Looks a command up by name or alias, case-insensitively.
    pub fn lookup(&self, key: &str) -> Option<&CommandDefinition> {
        self.index
            .get(&key.to_lowercase())
            .map(|position| &self.definitions[*position])
    }

    /// Returns the text following the trigger prefix.
    ///
    /// Returns `None` when the message does not start with the prefix, or when
    /// the prefix is glued to another word (`!aqibrief`). Without a trigger the
    /// whole message is returned.
    pub fn strip_trigger<'a>(&self, body: &'a str) -> Option<&'a str> {
        let body = body.trim_start();
        let Some(trigger) = &self.trigger else {
            return Some(body);
        };

        let head = body.get(..trigger.len())?;
        if !head.eq_ignore_ascii_case(trigger) {
            return None;
        }

        let rest = &body[trigger.len()..];
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }

        Some(rest)
    }

    /// Parses a message into an [`Invocation`] of the matched definition.
    ///
    /// # Errors
    ///
    /// - [`ParseError::NotTriggered`] - the trigger prefix is missing
    /// - [`ParseError::Empty`] - no command token follows the prefix
    /// - [`ParseError::UnknownCommand`] - the command token is not registered
    /// - [`ParseError::MissingArgument`] - fewer arguments than required
    pub fn parse(&self, body: &str) -> Result<(&CommandDefinition, Invocation), ParseError> {
        let text = self.strip_trigger(body).ok_or(ParseError::NotTriggered)?;
        let tokens: Vec<&str> = text.split_whitespace().collect();

        let Some((name, args)) = tokens.split_first() else {
            return Err(ParseError::Empty);
        };

        let definition = self
            .lookup(name)
            .ok_or_else(|| ParseError::UnknownCommand {
                attempted: name.to_string(),
            })?;

        let invocation = definition.invocation(args)?;
        debug!("parsed {:?} into {:?}", body, invocation);

        Ok((definition, invocation))
    }

    /// Parses a message and runs the handler of the matched command.
    ///
    /// The handler runs to completion before this method returns. Its errors
    /// are returned as [`DispatchError::Handler`]; only parsing failures are
    /// classified as [`DispatchError::Parse`].
    pub async fn parse_and_dispatch(
        &self,
        body: &str,
        context: &InboundContext,
    ) -> Result<(), DispatchError> {
        let (definition, invocation) = self.parse(body)?;

        debug!(
            "dispatching {} for {} with {:?}",
            invocation.command, context.sender, invocation.args
        );

        let handler_context = HandlerContext {
            inbound: context,
            commander: self,
        };

        definition
            .handler
            .handle(&invocation.args, &handler_context)
            .await
            .map_err(|error| DispatchError::Handler {
                command: invocation.command.clone(),
                error,
            })
    }

    /// Sends `payload` to the sender of the message described by `context`.
    pub async fn reply(
        &self,
        payload: &ReplyPayload,
        context: &InboundContext,
    ) -> Result<(), DeliveryError> {
        self.sink.send(payload, context).await
    }

    /// Lists every command with its usage and aliases, one per line.
    ///
    /// ```text
    /// !aqi brief <station-name> (alias: !aqi b)
    /// !aqi act
    /// ```
    pub fn command_listing(&self) -> String {
        self.definitions
            .iter()
            .map(|definition| {
                let mut line = self.prefixed(&definition.name);
                if !definition.usage.is_empty() {
                    line.push(' ');
                    line.push_str(&definition.usage);
                }
                if !definition.aliases.is_empty() {
                    let aliases = definition
                        .aliases
                        .iter()
                        .map(|alias| self.prefixed(alias))
                        .collect::<Vec<_>>()
                        .join(", ");
                    line.push_str(&format!(" (alias: {})", aliases));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Lists every command with its description, one per line.
    pub fn help_menu(&self) -> String {
        self.definitions
            .iter()
            .map(|definition| format!("{}: {}", self.prefixed(&definition.name), definition.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn prefixed(&self, word: &str) -> String {
        match &self.trigger {
            Some(trigger) => format!("{} {}", trigger, word),
            None => word.to_string(),
        }
    }
}
