//! Fixed replies of the bot.
//!
//! Command listings are generated from the registered commands so they follow
//! the trigger prefix of the transport (`!aqi info` in Matrix, `info` over
//! the webhook).

use crate::{commands::Commander, reply::ReplyPayload};

/// Answer to a message that could not be parsed into a command.
pub fn supported_commands(commander: &Commander) -> ReplyPayload {
    let prefix = command_prefix(commander);

    ReplyPayload::structured("Supported Commands", commander.command_listing()).with_field(
        "Examples",
        format!("{}info okhla, {}b kolkata", prefix, prefix),
    )
}

/// Answer to the `help` command.
pub fn help_menu(commander: &Commander) -> ReplyPayload {
    ReplyPayload::structured("Help Menu", commander.help_menu())
}

/// Answer to the `act` command.
pub fn act() -> ReplyPayload {
    ReplyPayload::text(
        "Here are some reasons why you should care about increasing air pollution:\n\n\
        1. Polluted air is creating a health emergency.\n\
        2. Children are most at risk.\n\
        3. Pollution and poverty go hand in hand.\n\
        4. The cheaper the fuels, the higher the costs.\n\
        5. The right to clean air is a human right.\n\n\
        Read https://www.worldenvironmentday.global/get-involved/practical-guides and find out what you can do to involve your business, school and families. \
        And call on your government to enforce the World Health Organization guidelines for ambient and indoor air quality. \
        Remember, clean air is your right!",
    )
}

/// Answer when no station matches the searched terms.
pub fn station_not_found() -> ReplyPayload {
    ReplyPayload::text("No Stations Found. Try Again.")
}

/// Answer when the provider failed to return a reading.
pub fn data_unavailable() -> ReplyPayload {
    ReplyPayload::text("Could not get data. Try Again.")
}

/// Hint appended to a brief report.
pub fn brief_footer(commander: &Commander) -> String {
    let prefix = command_prefix(commander);
    format!(
        "To get more details, send *{p}info <station>*. If you want to learn what actions you can take, to minimize air pollution, send *{p}act*. To know how to use this tool, send *{p}help*.",
        p = prefix
    )
}

/// Hint appended to a detailed report.
pub fn detailed_footer(commander: &Commander) -> String {
    let prefix = command_prefix(commander);
    format!(
        "To get less detail, send *{p}brief <station>*. If you want to learn what actions you can take, to minimize air pollution, send *{p}act*. To know how to use this tool, send *{p}help*.",
        p = prefix
    )
}

fn command_prefix(commander: &Commander) -> String {
    commander
        .trigger()
        .map(|trigger| format!("{} ", trigger))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::reply::testing::RecordingSink;

    #[test]
    fn test_footer_follows_trigger() {
        let chat = Commander::new(Some("!aqi"), Arc::new(RecordingSink::default()));
        let webhook = Commander::new(None, Arc::new(RecordingSink::default()));

        assert!(brief_footer(&chat).contains("send *!aqi info <station>*"));
        assert!(brief_footer(&webhook).contains("send *info <station>*"));
        assert!(detailed_footer(&webhook).contains("send *brief <station>*"));
    }

    #[test]
    fn test_supported_commands_examples() {
        let chat = Commander::new(Some("!aqi"), Arc::new(RecordingSink::default()));

        match supported_commands(&chat) {
            ReplyPayload::Structured { title, fields, .. } => {
                assert_eq!(title, "Supported Commands");
                assert_eq!(
                    fields,
                    vec![(
                        "Examples".to_string(),
                        "!aqi info okhla, !aqi b kolkata".to_string()
                    )]
                );
            }
            other => panic!("Expected structured payload, got {:?}", other),
        }
    }

    #[test]
    fn test_act_text() {
        let ReplyPayload::Text(text) = act() else {
            panic!("Expected text payload");
        };
        assert!(text.starts_with("Here are some reasons"));
        assert!(text.ends_with("clean air is your right!"));
    }
}
