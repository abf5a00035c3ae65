/// Resolved appearance used to pick a palette. The "System" setting maps to
/// an OS-level hint, falling back to dark when no hint is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

impl Appearance {
    pub fn from_setting(value: &str) -> Appearance {
        match value.to_ascii_lowercase().as_str() {
            "light" => Appearance::Light,
            "dark" => Appearance::Dark,
            // "System" and anything unrecognized
            _ => detect_preferred_appearance().unwrap_or(Appearance::Dark),
        }
    }
}

/// Ask the OS which appearance applications should use. Returns None when
/// no usable hint is available.
pub fn detect_preferred_appearance() -> Option<Appearance> {
    #[cfg(target_os = "macos")]
    {
        use std::process::Command;
        // The global AppleInterfaceStyle key only exists while dark mode
        // is active.
        if let Ok(output) = Command::new("/usr/bin/defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
        {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if stdout.to_ascii_lowercase().contains("dark") {
                    return Some(Appearance::Dark);
                }
            }
        }
        return Some(Appearance::Light);
    }

    #[cfg(target_os = "windows")]
    {
        // AppsUseLightTheme under HKCU Personalize: 1 = light, 0 = dark
        use winreg::enums::HKEY_CURRENT_USER;
        use winreg::RegKey;
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        if let Ok(personalize) =
            hkcu.open_subkey("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize")
        {
            let value: Result<u32, _> = personalize.get_value("AppsUseLightTheme");
            if let Ok(v) = value {
                return Some(if v == 0 {
                    Appearance::Dark
                } else {
                    Appearance::Light
                });
            }
        }
        return None;
    }

    #[cfg(target_os = "linux")]
    {
        use std::process::Command;
        // color-scheme reports 'prefer-dark' or 'default' on GNOME 42+
        if let Ok(output) = Command::new("gsettings")
            .args(["get", "org.gnome.desktop.interface", "color-scheme"])
            .output()
        {
            if output.status.success() {
                let s = String::from_utf8_lossy(&output.stdout).to_ascii_lowercase();
                if s.contains("prefer-dark") {
                    return Some(Appearance::Dark);
                } else if s.contains("default") {
                    return Some(Appearance::Light);
                }
            }
        }
        // Pre-42 setups: dark GTK themes carry a -dark suffix in their name
        if let Ok(output) = Command::new("gsettings")
            .args(["get", "org.gnome.desktop.interface", "gtk-theme"])
            .output()
        {
            if output.status.success() {
                let s = String::from_utf8_lossy(&output.stdout).to_ascii_lowercase();
                return Some(if s.contains("-dark") {
                    Appearance::Dark
                } else {
                    Appearance::Light
                });
            }
        }
        None
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_settings_bypass_detection() {
        assert_eq!(Appearance::from_setting("Light"), Appearance::Light);
        assert_eq!(Appearance::from_setting("Dark"), Appearance::Dark);
        assert_eq!(Appearance::from_setting("light"), Appearance::Light);
    }
}
