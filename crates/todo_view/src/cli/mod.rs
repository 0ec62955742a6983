use clap::{Parser, Subcommand};
use std::collections::HashMap;
use todo_view_core::config::ConfigOverrides;
use todo_view_core::error::AppError;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command to run; without one an interactive session starts
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Base URL of the task API
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

impl Cli {
    /// Flags that configure the session itself and are only honoured at startup.
    pub fn startup_only_flag(&self) -> Option<&'static str> {
        if self.api_url.is_some() {
            Some("--api-url")
        } else if !self.config_override.is_empty() {
            Some(CONFIG_OVERRIDE_FLAG)
        } else {
            None
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the task list
    ///
    /// Example: todo_view list
    List,
    /// Type into a task's field without saving (interactive only)
    ///
    /// Example: type 1 "Buy oat milk"
    Type { id: i64, text: String },
    /// Save the buffered name of the task being edited (interactive only)
    ///
    /// Example: save 1
    Save { id: i64 },
    /// Leave edit mode without saving (interactive only)
    Cancel,
    /// Rename a task
    ///
    /// Example: todo_view edit 1 "Buy oat milk"
    Edit { id: i64, name: String },
    /// Delete a task
    ///
    /// Example: todo_view delete 1
    Delete { id: i64 },
    /// Add a task (not available yet)
    Add,
}

impl Command {
    /// Commands that only make sense against a view that outlives them.
    pub fn needs_session(&self) -> bool {
        matches!(self, Self::Type { .. } | Self::Save { .. } | Self::Cancel)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Type { .. } => "type",
            Self::Save { .. } => "save",
            Self::Cancel => "cancel",
            Self::Edit { .. } => "edit",
            Self::Delete { .. } => "delete",
            Self::Add => "add",
        }
    }
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    ApiUrl,
    Timeout,
    Theme,
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    let scalar = |target: ConfigOverrideTarget| {
        if remainder.is_some() {
            Err(format!("{canonical_field} override cannot have subfields"))
        } else {
            Ok(ParsedConfigOverride {
                target,
                value: value.clone(),
            })
        }
    };

    match canonical_field.as_str() {
        "api_url" | "url" => scalar(ConfigOverrideTarget::ApiUrl),
        "timeout_secs" | "timeout" => scalar(ConfigOverrideTarget::Timeout),
        "theme" => scalar(ConfigOverrideTarget::Theme),
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value: value.clone(),
            })
        }
        other => Err(format!("unknown config field '{other}'")),
    }
}

/// Fold every `--config-override` value into one set of overrides.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(|message| {
            AppError::invalid_input(format!("{CONFIG_OVERRIDE_FLAG}: {message}"))
        })?;
        match parsed.target {
            ConfigOverrideTarget::ApiUrl => overrides.api_url = Some(parsed.value),
            ConfigOverrideTarget::Timeout => {
                let secs = parsed.value.parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "{CONFIG_OVERRIDE_FLAG}: timeout must be a whole number of seconds"
                    ))
                })?;
                overrides.timeout_secs = Some(secs);
            }
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Alias(name) => {
                overrides.aliases.insert(name, parsed.value);
            }
        }
    }

    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split an interactive line into arguments. Double quotes group words and
/// `""` yields an empty argument.
pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

/// Replace a leading alias with its configured command line.
pub fn expand_alias(
    args: Vec<String>,
    aliases: &HashMap<String, String>,
) -> Result<Vec<String>, AppError> {
    let Some(replacement) = args.first().and_then(|first| aliases.get(first)) else {
        return Ok(args);
    };

    let mut expanded = split_command_line(replacement)?;
    expanded.extend(args.into_iter().skip(1));
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, collect_config_overrides, expand_alias,
        parse_config_override, split_command_line,
    };
    use clap::Parser;
    use std::collections::HashMap;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" API-URL = http://tasks.local ").unwrap();

        match parsed.target {
            ConfigOverrideTarget::ApiUrl => {}
            other => panic!("unexpected target: {other:?}"),
        }

        assert_eq!(parsed.value, "http://tasks.local");
    }

    #[test]
    fn parse_config_override_rejects_empty_alias_name() {
        let err = parse_config_override("aliases. = list").unwrap_err();
        assert!(err.contains("aliases override requires an alias name"));
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_subfields_on_scalars() {
        let err = parse_config_override("theme.dark=noir").unwrap_err();
        assert!(err.contains("cannot have subfields"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("aliasesls").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn collect_config_overrides_merges_entries() {
        let overrides = collect_config_overrides(&[
            "timeout=3".to_string(),
            "theme=noir".to_string(),
            "aliases.ls=list".to_string(),
            "url=http://one".to_string(),
            "api_url=http://two".to_string(),
        ])
        .unwrap();

        assert_eq!(overrides.timeout_secs, Some(3));
        assert_eq!(overrides.theme.as_deref(), Some("noir"));
        assert_eq!(overrides.api_url.as_deref(), Some("http://two"));
        assert_eq!(
            overrides.aliases.get("ls").map(String::as_str),
            Some("list")
        );
    }

    #[test]
    fn collect_config_overrides_rejects_bad_timeout() {
        let err = collect_config_overrides(&["timeout=soon".to_string()]).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn split_command_line_handles_quotes_and_empty_args() {
        assert_eq!(
            split_command_line(r#"type 1 "Buy oat milk""#).unwrap(),
            vec!["type", "1", "Buy oat milk"]
        );
        assert_eq!(
            split_command_line(r#"type 1 """#).unwrap(),
            vec!["type", "1", ""]
        );
        assert_eq!(
            split_command_line(r#"edit 2 "say \"hi\"""#).unwrap(),
            vec!["edit", "2", "say \"hi\""]
        );
    }

    #[test]
    fn split_command_line_rejects_unterminated_quote() {
        let err = split_command_line(r#"edit 1 "oops"#).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn expand_alias_replaces_first_word_only() {
        let aliases: HashMap<String, String> = [
            ("rm".to_string(), "delete".to_string()),
            ("ls".to_string(), "list --json".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            expand_alias(vec!["rm".into(), "4".into()], &aliases).unwrap(),
            vec!["delete", "4"]
        );
        assert_eq!(
            expand_alias(vec!["ls".into()], &aliases).unwrap(),
            vec!["list", "--json"]
        );
        assert_eq!(
            expand_alias(vec!["save".into(), "rm".into()], &aliases).unwrap(),
            vec!["save", "rm"]
        );
    }

    #[test]
    fn cli_parses_commands_and_session_only_flags() {
        let cli =
            Cli::try_parse_from(["todo_view", "edit", "1", "Buy oat milk", "--json"]).unwrap();
        assert!(cli.json);
        assert_eq!(
            cli.command,
            Some(Command::Edit {
                id: 1,
                name: "Buy oat milk".into()
            })
        );

        let cli = Cli::try_parse_from(["todo_view"]).unwrap();
        assert_eq!(cli.command, None);

        assert!(Command::Save { id: 1 }.needs_session());
        assert!(!Command::Delete { id: 1 }.needs_session());
        assert!(Cli::try_parse_from(["todo_view", "delete", "abc"]).is_err());
    }

    #[test]
    fn startup_only_flags_are_detected() {
        let cli = Cli::try_parse_from(["todo_view", "list", "--json"]).unwrap();
        assert_eq!(cli.startup_only_flag(), None);

        let cli = Cli::try_parse_from(["todo_view", "list", "--api-url", "http://other"]).unwrap();
        assert_eq!(cli.startup_only_flag(), Some("--api-url"));

        let cli =
            Cli::try_parse_from(["todo_view", "list", "--config-override", "theme=noir"]).unwrap();
        assert_eq!(cli.startup_only_flag(), Some("--config-override"));
    }
}
