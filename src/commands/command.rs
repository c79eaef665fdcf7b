//! Command definitions, parsed invocations and parsing errors.
//!
//! A [`CommandDefinition`] describes one command the [`Commander`] can
//! dispatch: its name, aliases, arity and the [`CommandHandler`] to run.
//!
//! [`Commander`]: crate::commands::Commander

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    commands::{Commander, InboundContext},
    reply::{DeliveryError, ReplyPayload},
};

/// Number of arguments a command expects.
///
/// When `variadic` is set, the last required slot captures every remaining
/// token, joined with single spaces. With `required: 0` the capture is
/// optional and only produced when tokens remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Arity {
    /// Number of required arguments, the variadic capture included
    pub required: usize,
    /// Whether the last argument captures the rest of the message
    pub variadic: bool,
}

impl Arity {
    /// A command without arguments.
    pub fn none() -> Self {
        Arity::default()
    }

    /// A command with `required` single-token arguments.
    pub fn positional(required: usize) -> Self {
        Arity {
            required,
            variadic: false,
        }
    }

    /// A command whose last required argument captures the rest of the message.
    pub fn variadic(required: usize) -> Self {
        Arity {
            required,
            variadic: true,
        }
    }

    /// Builds the argument list from the tokens following the command name.
    fn collect(&self, command: &str, tokens: &[&str]) -> Result<Vec<String>, ParseError> {
        if tokens.len() < self.required {
            return Err(ParseError::MissingArgument {
                command: command.to_string(),
                required: self.required,
                got: tokens.len(),
            });
        }

        if !self.variadic {
            return Ok(tokens
                .iter()
                .take(self.required)
                .map(|token| token.to_string())
                .collect());
        }

        let single = self.required.saturating_sub(1);
        let mut args: Vec<String> = tokens[..single].iter().map(|t| t.to_string()).collect();
        let rest = &tokens[single..];
        if !rest.is_empty() {
            args.push(rest.join(" "));
        }

        Ok(args)
    }
}

/// Runs a command once its arguments have been validated.
///
/// Handlers answer through [`HandlerContext::reply`] and never learn which
/// transport the message came from.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handles one invocation.
    ///
    /// Errors are returned to the caller of
    /// [`Commander::parse_and_dispatch`] unchanged, wrapped in
    /// [`DispatchError::Handler`].
    async fn handle(&self, args: &[String], context: &HandlerContext<'_>) -> anyhow::Result<()>;
}

/// Everything a handler can reach while handling one message.
pub struct HandlerContext<'a> {
    /// Context of the message being handled
    pub inbound: &'a InboundContext,
    /// Router which dispatched the message
    pub commander: &'a Commander,
}

impl HandlerContext<'_> {
    /// Sends a reply to the sender of the message being handled.
    pub async fn reply(&self, payload: ReplyPayload) -> Result<(), DeliveryError> {
        self.commander.reply(&payload, self.inbound).await
    }
}

/// A command known by the [`Commander`].
#[derive(Clone)]
pub struct CommandDefinition {
    /// Canonical name, lowercase
    pub name: String,
    /// Alternative names, lowercase
    pub aliases: Vec<String>,
    /// Expected arguments
    pub arity: Arity,
    /// Placeholder shown after the name in command listings, e.g. `<station-name>`
    pub usage: String,
    /// One line description shown in the help menu
    pub description: String,
    /// Handler run on dispatch
    pub handler: Arc<dyn CommandHandler>,
}

impl CommandDefinition {
    /// Creates a definition without aliases nor arguments.
    pub fn new(name: &str, handler: Arc<dyn CommandHandler>) -> Self {
        CommandDefinition {
            name: name.to_lowercase(),
            aliases: Vec::new(),
            arity: Arity::none(),
            usage: String::new(),
            description: String::new(),
            handler,
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_lowercase());
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.usage = usage.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Name followed by every alias.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Builds an [`Invocation`] of this command from the tokens following its name.
    pub(crate) fn invocation(&self, tokens: &[&str]) -> Result<Invocation, ParseError> {
        Ok(Invocation {
            command: self.name.clone(),
            args: self.arity.collect(&self.name, tokens)?,
        })
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("arity", &self.arity)
            .finish()
    }
}

/// A message successfully matched against a [`CommandDefinition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Canonical name of the matched command
    pub command: String,
    /// Parsed arguments, original casing preserved
    pub args: Vec<String>,
}

/// Errors that can occur while parsing a message into an [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The message does not start with the trigger prefix. Not answered.
    #[error("message is not addressed to the bot")]
    NotTriggered,
    /// The message holds no command token
    #[error("no command given")]
    Empty,
    /// The command token matches no name nor alias
    #[error("unknown command `{attempted}`")]
    UnknownCommand {
        /// The token as typed by the user
        attempted: String,
    },
    /// The command was given fewer arguments than it requires
    #[error("`{command}` expects {required} argument(s), got {got}")]
    MissingArgument {
        /// Canonical name of the command
        command: String,
        /// Number of required arguments
        required: usize,
        /// Number of arguments given
        got: usize,
    },
}

impl ParseError {
    /// Whether the sender should be answered with the supported commands.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ParseError::NotTriggered)
    }
}

/// Errors returned by [`Commander::parse_and_dispatch`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The message could not be matched to a command
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The handler of the matched command failed
    #[error("command `{command}` failed: {error:#}")]
    Handler {
        /// Canonical name of the command
        command: String,
        /// Error returned by the handler
        error: anyhow::Error,
    },
}

/// Errors raised when registering a [`CommandDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A name or alias is already used by a registered command
    #[error("`{key}` is already registered by `{existing}`")]
    DuplicateCommand {
        /// The colliding name or alias
        key: String,
        /// Canonical name of the command already using it
        existing: String,
    },
}
