pub mod ambient;
pub mod app;
mod config;
pub mod error;
pub mod logging;
pub mod presentation;
pub mod resolver;
pub mod state;
pub mod storage;
pub mod theme;

pub use config::{AppConfig, ConfigError};
pub use error::{AppError, AppResult};
pub use resolver::{PreferenceResolver, SharedResolver};
pub use theme::{EffectiveMode, ThemePreference};

/// Entrypoint used by the CLI binary.
pub fn run() -> AppResult<()> {
    let config = config::load_app_config();
    logging::init(config.log_filter.as_deref());

    let startup = app::StartupConfig::from_args()?;
    if startup.command == app::Command::Help {
        println!("{}", app::USAGE);
        return Ok(());
    }
    tracing::debug!(?startup, "starting folio-theme");

    let report = app::App::new(config, startup).execute()?;
    println!("{report}");
    Ok(())
}
