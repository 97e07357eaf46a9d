//! Command-line argument parsing for the goose-client binary.

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const USAGE: &str = "\
Usage: goose-client [OPTIONS] <PROMPT>...

Send one prompt to the Goose agent and print the streamed reply.

Options:
  -s, --status          Probe the server and exit
      --session <ID>    Continue an existing session
  -V, --version         Print version
  -h, --help            Print this help

Environment:
  GOOSE_SERVER_URL      Server base URL (default http://127.0.0.1:62996)
  GOOSE_SECRET_KEY      Value sent as X-Secret-Key (default \"test\")
  GOOSE_WORKING_DIR     Working directory reported to the agent
  RUST_LOG              Log filter (default warn)";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Probe the server's status endpoint
    Status,
    /// Send a prompt and stream the reply
    Chat {
        prompt: String,
        session_id: Option<String>,
    },
    /// Arguments that could not be understood
    Invalid(String),
}

/// Parse command-line arguments, program name first.
///
/// # Examples
///
/// ```
/// use goose_client::cli::{parse_args, CliCommand};
///
/// let args = vec!["goose-client".to_string(), "--status".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Status);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut words = Vec::new();
    let mut session_id = None;
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--status" | "-s" => return CliCommand::Status,
            "--session" => match args.next() {
                Some(id) if !id.trim().is_empty() => session_id = Some(id),
                _ => return CliCommand::Invalid("--session requires a value".to_string()),
            },
            "--" => {
                words.extend(args.by_ref());
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return CliCommand::Invalid(format!("unknown option '{}'", flag));
            }
            _ => words.push(arg),
        }
    }

    let prompt = words.join(" ");
    if prompt.trim().is_empty() {
        return CliCommand::Help;
    }

    CliCommand::Chat { prompt, session_id }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliCommand {
        let mut full = vec!["goose-client".to_string()];
        full.extend(args.iter().map(|s| s.to_string()));
        parse_args(full.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), CliCommand::Version);
        assert_eq!(parse(&["-V"]), CliCommand::Version);
    }

    #[test]
    fn test_parse_status_flag() {
        assert_eq!(parse(&["--status"]), CliCommand::Status);
        assert_eq!(parse(&["-s"]), CliCommand::Status);
    }

    #[test]
    fn test_parse_no_args_shows_help() {
        assert_eq!(parse(&[]), CliCommand::Help);
    }

    #[test]
    fn test_parse_prompt_words_joined() {
        assert_eq!(
            parse(&["list", "the", "files"]),
            CliCommand::Chat {
                prompt: "list the files".to_string(),
                session_id: None,
            }
        );
    }

    #[test]
    fn test_parse_session() {
        assert_eq!(
            parse(&["--session", "abc", "hello"]),
            CliCommand::Chat {
                prompt: "hello".to_string(),
                session_id: Some("abc".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_session_missing_value() {
        assert!(matches!(parse(&["--session"]), CliCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_double_dash_passes_flags_through() {
        assert_eq!(
            parse(&["--", "-V", "means", "version"]),
            CliCommand::Chat {
                prompt: "-V means version".to_string(),
                session_id: None,
            }
        );
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert_eq!(
            parse(&["--bogus"]),
            CliCommand::Invalid("unknown option '--bogus'".to_string())
        );
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
    }
}
