use crate::colour::{Rgba, parse_colour};
use crate::diagnostic::{Diagnostic, Parsed};
use crate::store::{ConfigStore, Section};
use eyre::{Result, WrapErr, eyre};
use std::env;
use std::path::{Path, PathBuf};

/// Section used when no section matches the detected resolution.
pub const FALLBACK_SECTION: &str = "other";

pub const CONFIG_FILE_NAME: &str = "config.ini";

const LOOP_MARKER: &str = ",loop";

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationRef {
    pub path: PathBuf,
    pub looping: bool,
}

/// Presentation options of one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileOptions {
    pub background: Rgba,
    pub text: Rgba,
    pub caption: String,
    pub show_percentage: bool,
    pub animation: Option<AnimationRef>,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            background: Rgba::BLACK,
            text: Rgba::WHITE,
            caption: String::new(),
            show_percentage: true,
            animation: None,
        }
    }
}

/// The profile picked for this run.
#[derive(Debug, Clone, Default)]
pub struct ResolvedProfile {
    /// Name of the section used, `None` when neither the resolution nor the
    /// fallback section exists.
    pub section: Option<String>,
    pub options: ProfileOptions,
    /// Raw launch entries in launch order.
    pub entries: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn resolve(store: &ConfigStore, config_dir: &Path, resolution: &str) -> ResolvedProfile {
    let Some(section) = select_section(store, resolution) else {
        return ResolvedProfile::default();
    };

    let mut diagnostics = Vec::new();
    let options = extract_options(section, config_dir).collect_into(&mut diagnostics);

    ResolvedProfile {
        section: Some(section.name().to_string()),
        options,
        entries: collect_entries(section),
        diagnostics,
    }
}

pub fn select_section<'a>(store: &'a ConfigStore, resolution: &str) -> Option<&'a Section> {
    store
        .section(resolution)
        .or_else(|| store.section(FALLBACK_SECTION))
}

/// Read every presentation option, each falling back to its own default.
pub fn extract_options(section: &Section, config_dir: &Path) -> Parsed<ProfileOptions> {
    let mut diagnostics = Vec::new();
    let mut options = ProfileOptions::default();

    if let Some(value) = section.get("bgcolor") {
        options.background = colour_option("bgcolor", value, options.background)
            .collect_into(&mut diagnostics);
    }
    if let Some(value) = section.get("textcolor") {
        options.text =
            colour_option("textcolor", value, options.text).collect_into(&mut diagnostics);
    }
    if let Some(value) = section.get("loading_text") {
        options.caption = value.to_string();
    }
    if let Some(value) = section.get("show_percentage") {
        options.show_percentage = flag_option("show_percentage", value, options.show_percentage)
            .collect_into(&mut diagnostics);
    }
    if let Some(value) = section.get("animation") {
        options.animation = parse_animation(value, config_dir).collect_into(&mut diagnostics);
    }

    Parsed {
        value: options,
        diagnostics,
    }
}

fn colour_option(key: &'static str, value: &str, default: Rgba) -> Parsed<Rgba> {
    match parse_colour(value) {
        Some(colour) => Parsed::clean(colour),
        None => Parsed::with(
            default,
            Diagnostic::InvalidColour {
                key,
                value: value.to_string(),
            },
        ),
    }
}

fn flag_option(key: &'static str, value: &str, default: bool) -> Parsed<bool> {
    match value.trim().parse::<i64>() {
        Ok(n) => Parsed::clean(n != 0),
        Err(_) => Parsed::with(
            default,
            Diagnostic::InvalidFlag {
                key,
                value: value.to_string(),
            },
        ),
    }
}

/// Parse `PATH[,loop]`. A path that does not exist yields no animation.
pub fn parse_animation(raw: &str, config_dir: &Path) -> Parsed<Option<AnimationRef>> {
    let mut value = raw.trim();
    let looping = match value.strip_suffix(LOOP_MARKER) {
        Some(rest) => {
            value = rest;
            true
        }
        None => false,
    };

    let path = value.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if path.is_empty() {
        return Parsed::clean(None);
    }

    let path = expand_tilde(path);
    let path = if path.is_absolute() {
        path
    } else {
        config_dir.join(path)
    };

    if !path.exists() {
        return Parsed::with(None, Diagnostic::MissingAnimation { path });
    }
    Parsed::clean(Some(AnimationRef { path, looping }))
}

/// Digit-only keys in ascending numeric order; empty values are skipped.
pub fn collect_entries(section: &Section) -> Vec<String> {
    let mut keys: Vec<&str> = section
        .keys()
        .filter(|k| !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()))
        .collect();
    // Compare by length first so arbitrarily long keys still sort numerically
    keys.sort_by(|a, b| {
        let a_trim = a.trim_start_matches('0');
        let b_trim = b.trim_start_matches('0');
        a_trim
            .len()
            .cmp(&b_trim.len())
            .then_with(|| a_trim.cmp(b_trim))
            .then_with(|| a.cmp(b))
    });

    keys.into_iter()
        .filter_map(|k| section.get(k))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expands ~ to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Directory of the running executable, symlinks resolved.
pub fn exe_dir() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let exe = exe.canonicalize().unwrap_or(exe);
    exe.parent().map(Path::to_path_buf)
}

/// `config.ini` next to the executable, then the user config directory.
pub fn find_config() -> Option<PathBuf> {
    if let Some(dir) = exe_dir() {
        let local = dir.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let user_config = config_dir.join("loadscreen").join(CONFIG_FILE_NAME);
        if user_config.exists() {
            return Some(user_config);
        }
    }
    None
}

/// Pick the configuration path: the explicit one, or the first one found.
pub fn config_path(explicit: Option<&str>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand_tilde(path)),
        None => find_config().ok_or_else(|| {
            eyre!(
                "no {} found next to the executable or in the user config directory",
                CONFIG_FILE_NAME
            )
        }),
    }
}

pub fn load_config(path: &Path) -> Result<ConfigStore> {
    ConfigStore::load(path).wrap_err_with(|| format!("failed to load config {}", path.display()))
}

/// Directory relative animation paths are resolved against.
pub fn config_dir(path: &Path) -> PathBuf {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
