use std::rc::Rc;

use gtk4::prelude::*;

use super::{AmbientSignal, AmbientSink};

const WATCHED_PROPERTIES: [&str; 3] = [
    "gtk-interface-color-scheme",
    "gtk-theme-name",
    "gtk-application-prefer-dark-theme",
];

/// Ambient signal backed by the default `GtkSettings`.
#[derive(Debug, Clone)]
pub struct GtkSignal {
    settings: gtk4::Settings,
}

impl GtkSignal {
    /// Requires GTK to be initialised on the calling thread.
    pub fn from_default() -> Option<Self> {
        gtk4::Settings::default().map(|settings| Self { settings })
    }
}

impl AmbientSignal for GtkSignal {
    fn prefers_dark(&self) -> bool {
        system_prefers_dark(&self.settings)
    }

    fn subscribe(&self, sink: AmbientSink) {
        // Handlers stay connected for the lifetime of the settings object.
        let sink: Rc<dyn Fn(bool) -> bool> = Rc::from(sink);
        let available = self.settings.list_properties();
        for name in WATCHED_PROPERTIES {
            if !available.iter().any(|prop| prop.name() == name) {
                continue;
            }
            let sink = Rc::clone(&sink);
            self.settings
                .connect_notify_local(Some(name), move |settings, _| {
                    let _ = (*sink)(system_prefers_dark(settings));
                });
        }
    }
}

fn system_prefers_dark(settings: &gtk4::Settings) -> bool {
    if settings
        .list_properties()
        .iter()
        .any(|prop| prop.name() == "gtk-interface-color-scheme")
    {
        let color_scheme = settings.property_value("gtk-interface-color-scheme");
        if let Ok(raw_scheme) = color_scheme.get::<i32>() {
            match raw_scheme {
                // GTK_INTERFACE_COLOR_SCHEME_FORCE_LIGHT
                3 => return false,
                // GTK_INTERFACE_COLOR_SCHEME_FORCE_DARK
                2 => return true,
                _ => {}
            }
        }
    }

    if let Some(prefers_dark) = settings
        .gtk_theme_name()
        .and_then(|name| prefers_dark_from_theme_name(name.as_str()))
    {
        return prefers_dark;
    }

    #[allow(deprecated)]
    let prefers_dark = settings.is_gtk_application_prefer_dark_theme();
    prefers_dark
}

fn prefers_dark_from_theme_name(theme_name: &str) -> Option<bool> {
    let normalized = theme_name.trim().to_ascii_lowercase();
    if normalized.contains("dark") {
        return Some(true);
    }
    if normalized.contains("light") {
        return Some(false);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::prefers_dark_from_theme_name;

    #[test]
    fn theme_name_hints_are_case_insensitive() {
        assert_eq!(prefers_dark_from_theme_name("Adwaita-Dark"), Some(true));
        assert_eq!(prefers_dark_from_theme_name(" Breeze-Light "), Some(false));
        assert_eq!(prefers_dark_from_theme_name("Adwaita"), None);
        assert_eq!(prefers_dark_from_theme_name(""), None);
    }
}
