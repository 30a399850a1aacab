use crate::error::{AppError, AppResult};
use crate::theme::ThemePreference;

pub const USAGE: &str = "\
usage: folio-theme [--prefers-dark | --prefers-light] [--ephemeral] <command>

commands:
  show                     print the stored preference and resolved mode
  cycle                    advance auto -> light -> dark -> auto
  set <auto|light|dark>    store an explicit preference
  watch                    follow ambient color-scheme changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    #[default]
    Show,
    Cycle,
    Set(ThemePreference),
    Watch,
    Help,
}

/// Command line after parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupConfig {
    pub command: Command,
    /// Keep the preference in memory only.
    pub ephemeral: bool,
    /// Ambient signal override from `--prefers-dark` / `--prefers-light`.
    pub prefers_dark: Option<bool>,
}

impl StartupConfig {
    pub fn from_args() -> AppResult<Self> {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse<I, S>(args: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = StartupConfig::default();
        let mut command: Option<Command> = None;
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            let parsed = match arg.as_str() {
                "--prefers-dark" => {
                    config.prefers_dark = Some(true);
                    continue;
                }
                "--prefers-light" => {
                    config.prefers_dark = Some(false);
                    continue;
                }
                "--ephemeral" => {
                    config.ephemeral = true;
                    continue;
                }
                "-h" | "--help" | "help" => Command::Help,
                "show" => Command::Show,
                "cycle" => Command::Cycle,
                "watch" => Command::Watch,
                "set" => {
                    let raw = args
                        .next()
                        .ok_or_else(|| AppError::Usage("set requires a value".to_string()))?;
                    let preference = ThemePreference::parse(&raw)
                        .ok_or(AppError::UnknownPreference(raw))?;
                    Command::Set(preference)
                }
                other => return Err(AppError::Usage(format!("unrecognised argument: {other}"))),
            };

            if command.replace(parsed).is_some() {
                return Err(AppError::Usage("only one command may be given".to_string()));
            }
        }

        config.command = command.unwrap_or_default();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_show() {
        let config = StartupConfig::parse(Vec::<String>::new()).unwrap();
        assert_eq!(config, StartupConfig::default());
        assert_eq!(config.command, Command::Show);
    }

    #[test]
    fn flags_may_appear_around_the_command() {
        let config = StartupConfig::parse(["--ephemeral", "cycle", "--prefers-dark"]).unwrap();
        assert_eq!(config.command, Command::Cycle);
        assert!(config.ephemeral);
        assert_eq!(config.prefers_dark, Some(true));
    }

    #[test]
    fn set_parses_its_value() {
        let config = StartupConfig::parse(["set", "dark"]).unwrap();
        assert_eq!(config.command, Command::Set(ThemePreference::Dark));
    }

    #[test]
    fn set_rejects_unknown_values_and_missing_value() {
        let err = StartupConfig::parse(["set", "sepia"]).unwrap_err();
        assert!(matches!(err, AppError::UnknownPreference(ref raw) if raw == "sepia"));

        let err = StartupConfig::parse(["set"]).unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));
    }

    #[test]
    fn rejects_unknown_and_repeated_commands() {
        assert!(matches!(
            StartupConfig::parse(["--bogus"]),
            Err(AppError::Usage(_))
        ));
        assert!(matches!(
            StartupConfig::parse(["show", "cycle"]),
            Err(AppError::Usage(_))
        ));
    }
}
