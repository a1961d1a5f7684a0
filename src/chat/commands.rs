//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to tune the session and inspect it without sending a
//! query.

use crate::params::ParameterName;

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Set a query parameter.  The store clamps the value.
    Set(ParameterName, f64),

    /// Show the current parameter values.
    Params,

    /// Open the debug view and show the last payload.
    ShowDebug,

    /// Close the debug view.
    CloseDebug,

    /// Display session statistics.
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be submitted as a query.
///
/// # Examples
///
/// ```
/// # use querychat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/top_k 8").is_some());
/// assert!(parse_command("What is hybrid search?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "params" | "parameters" => ChatCommand::Params,
        "top_k" => parse_set(ParameterName::ResultCount, argument),
        "multi_n" => parse_set(ParameterName::FanOut, argument),
        "alpha" => parse_set(ParameterName::HybridWeight, argument),
        "set" => parse_set_command(argument),
        "debug" => match argument.map(str::to_lowercase).as_deref() {
            None | Some("open") | Some("show") => ChatCommand::ShowDebug,
            Some("close") | Some("hide") => ChatCommand::CloseDebug,
            Some(_) => ChatCommand::Invalid("/debug expects 'open' or 'close'".to_string()),
        },
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_set_command(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid("/set requires '<name> <value>'".to_string());
    };
    let mut parts = arg.splitn(2, ' ');
    let name = parts.next().unwrap_or_default();
    match name.parse::<ParameterName>() {
        Ok(name) => parse_set(name, parts.next().map(str::trim)),
        Err(err) => ChatCommand::Invalid(err),
    }
}

fn parse_set(name: ParameterName, argument: Option<&str>) -> ChatCommand {
    let (lo, hi) = name.bounds();
    match argument {
        Some(arg) => match arg.parse::<f64>() {
            Ok(value) if value.is_finite() => ChatCommand::Set(name, value),
            _ => ChatCommand::Invalid(format!("/{name} expects a number between {lo} and {hi}")),
        },
        None => ChatCommand::Invalid(format!("/{name} requires a value")),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /top_k <n>             Reranked results to use (1-20)
  /multi_n <n>           Reformulated queries to fan out to (1-10)
  /alpha <v>             Hybrid search weight (0.0 keyword - 1.0 vector)
  /set <name> <value>    Set any of the above by name
  /params                Show current query parameters
  /debug [open|close]    Show the last raw response or error
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat

Values outside a parameter's range are clamped. Parameters cannot change
while a reply is pending. Press Ctrl+C during a reply to show it at once,
or while waiting for one to give up on the query."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_parameter_shortcuts() {
        assert_eq!(
            parse_command("/top_k 8"),
            Some(ChatCommand::Set(ParameterName::ResultCount, 8.0))
        );
        assert_eq!(
            parse_command("/MULTI_N 3"),
            Some(ChatCommand::Set(ParameterName::FanOut, 3.0))
        );
        assert_eq!(
            parse_command("/alpha 0.75"),
            Some(ChatCommand::Set(ParameterName::HybridWeight, 0.75))
        );
    }

    #[test]
    fn out_of_range_values_still_parse() {
        assert_eq!(
            parse_command("/top_k 999"),
            Some(ChatCommand::Set(ParameterName::ResultCount, 999.0))
        );
    }

    #[test]
    fn parse_set_by_name() {
        assert_eq!(
            parse_command("/set alpha 0.1"),
            Some(ChatCommand::Set(ParameterName::HybridWeight, 0.1))
        );
        assert_eq!(
            parse_command("/set fan_out 4"),
            Some(ChatCommand::Set(ParameterName::FanOut, 4.0))
        );
        assert!(matches!(
            parse_command("/set temperature 1"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("Unknown parameter")
        ));
        assert!(matches!(
            parse_command("/set"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_bad_values() {
        assert!(matches!(
            parse_command("/top_k many"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects a number")
        ));
        assert!(matches!(
            parse_command("/alpha NaN"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/alpha"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_debug() {
        assert_eq!(parse_command("/debug"), Some(ChatCommand::ShowDebug));
        assert_eq!(parse_command("/debug open"), Some(ChatCommand::ShowDebug));
        assert_eq!(parse_command("/debug close"), Some(ChatCommand::CloseDebug));
        assert!(matches!(
            parse_command("/debug maybe"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_stats_and_params() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/params"), Some(ChatCommand::Params));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/clear"),
            Some(ChatCommand::Invalid("Unknown command: /clear".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello there"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/top_k"));
        assert!(help.contains("/debug"));
    }
}
