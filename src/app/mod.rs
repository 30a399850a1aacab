//! Wires configuration, storage, ambient signal and presenter into a resolver
//! and runs one command against it.

use std::fmt;

use crate::ambient::{ambient_from_env, AmbientSignal, FixedSignal};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::presentation::RootAttributes;
use crate::resolver::{PreferenceResolver, SharedResolver};
use crate::storage::{JsonFileStore, MemoryStore, PreferenceStore};
use crate::theme::{EffectiveMode, Indicator, ThemePreference};

mod bootstrap;

pub use bootstrap::{Command, StartupConfig, USAGE};

pub type AppResolver =
    SharedResolver<Box<dyn PreferenceStore>, Box<dyn AmbientSignal>, RootAttributes>;

/// Resolver state after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub preference: ThemePreference,
    pub mode: EffectiveMode,
    pub indicator: Indicator,
}

impl Report {
    pub fn capture(resolver: &AppResolver) -> Self {
        Self {
            preference: resolver.preference(),
            mode: resolver.resolve(),
            indicator: resolver.indicator(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "preference={} data-theme={} indicator={} ({})",
            self.preference, self.mode, self.indicator.glyph, self.indicator.label
        )
    }
}

pub struct App {
    config: AppConfig,
    startup: StartupConfig,
}

impl App {
    pub fn new(config: AppConfig, startup: StartupConfig) -> Self {
        Self { config, startup }
    }

    pub fn startup(&self) -> &StartupConfig {
        &self.startup
    }

    pub fn bootstrap_resolver(&self) -> AppResult<AppResolver> {
        let store = self.open_store()?;
        let ambient = self.open_ambient()?;
        let mut resolver = PreferenceResolver::new(store, ambient, RootAttributes::new());
        if let Some(key) = self.config.storage_key.as_deref() {
            resolver = resolver.with_storage_key(key);
        }
        Ok(resolver.initialize())
    }

    /// Runs the parsed command. `watch` only returns once the main loop exits.
    pub fn execute(&self) -> AppResult<Report> {
        let resolver = self.bootstrap_resolver()?;
        match self.startup.command {
            Command::Show | Command::Help => {}
            Command::Cycle => {
                resolver.cycle();
            }
            Command::Set(preference) => {
                resolver.set(preference);
            }
            Command::Watch => self.watch(&resolver)?,
        }
        Ok(Report::capture(&resolver))
    }

    fn open_store(&self) -> AppResult<Box<dyn PreferenceStore>> {
        if self.startup.ephemeral {
            return Ok(Box::new(MemoryStore::new()));
        }
        let store = JsonFileStore::with_default_path()?;
        tracing::debug!(path = %store.path().display(), "using preference file");
        Ok(Box::new(store))
    }

    fn open_ambient(&self) -> AppResult<Box<dyn AmbientSignal>> {
        if let Some(prefers_dark) = self.startup.prefers_dark {
            return Ok(Box::new(FixedSignal(prefers_dark)));
        }

        #[cfg(feature = "gtk")]
        {
            match gtk4::init() {
                Ok(()) => {
                    if let Some(signal) = crate::ambient::GtkSignal::from_default() {
                        return Ok(Box::new(signal));
                    }
                    tracing::warn!("no default GTK settings; falling back to environment");
                }
                Err(err) if self.startup.command == Command::Watch => {
                    return Err(crate::error::AppError::Gtk(err.to_string()));
                }
                Err(err) => {
                    tracing::warn!(%err, "GTK unavailable; falling back to environment");
                }
            }
        }

        Ok(Box::new(ambient_from_env(&self.config)))
    }

    #[cfg(feature = "gtk")]
    fn watch(&self, resolver: &AppResolver) -> AppResult<()> {
        resolver.subscribe(Box::new(|change| {
            println!("{} -> {} ({:?})", change.preference, change.mode, change.cause);
        }));
        println!("{}", Report::capture(resolver));
        tracing::info!("watching ambient color scheme");
        gtk4::glib::MainLoop::new(None, false).run();
        Ok(())
    }

    #[cfg(not(feature = "gtk"))]
    fn watch(&self, _resolver: &AppResolver) -> AppResult<()> {
        tracing::warn!("built without the gtk feature; ambient changes cannot be followed");
        Ok(())
    }
}
