//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [generation] section
    if let Some(section) = ini.section(Some("generation")) {
        if let Some(v) = parse_key(section, "generation", "threads", "must be a non-negative integer")? {
            config.generation.threads = v;
        }
        if let Some(v) = parse_key::<u64>(section, "generation", "progress_interval", "must be a positive integer")? {
            if v == 0 {
                return Err(invalid("generation", "progress_interval", "0", "must be a positive integer"));
            }
            config.generation.progress_interval = v;
        }
    }

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = parse_key::<u32>(section, "render", "tile_size", "must be a positive integer (pixels)")? {
            if v == 0 || v > 4096 {
                return Err(invalid(
                    "render",
                    "tile_size",
                    &v.to_string(),
                    "must be between 1 and 4096",
                ));
            }
            config.render.tile_size = v;
        }
        if let Some(v) = parse_key::<f64>(section, "render", "buffer_ratio", "must be a number")? {
            if !(0.0..=1.0).contains(&v) {
                return Err(invalid(
                    "render",
                    "buffer_ratio",
                    &v.to_string(),
                    "must be between 0.0 and 1.0",
                ));
            }
            config.render.buffer_ratio = v;
        }
        if let Some(v) = section.get("font") {
            let v = v.trim();
            config.render.font = (!v.is_empty()).then(|| expand_tilde(v));
        }
    }

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = parse_key(section, "output", "format", "must be 'xyz' or 'mbtiles'")? {
            config.output.format = v;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Parse an optional key, mapping failures to `InvalidValue`.
fn parse_key<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    let Some(raw) = section.get(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| invalid(section_name, key, raw, reason))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_all_sections() {
        let config = parse(
            "[generation]\nthreads = 8\nprogress_interval = 25\n\
             [render]\ntile_size = 512\nbuffer_ratio = 0.1\nfont = /usr/share/fonts/Sans.ttf\n\
             [output]\nformat = MBTiles\n\
             [logging]\nfile = /tmp/tf.log\n",
        )
        .unwrap();

        assert_eq!(config.generation.threads, 8);
        assert_eq!(config.generation.progress_interval, 25);
        assert_eq!(config.render.tile_size, 512);
        assert_eq!(config.render.buffer_ratio, 0.1);
        assert_eq!(
            config.render.font,
            Some(PathBuf::from("/usr/share/fonts/Sans.ttf"))
        );
        assert_eq!(config.output.format, OutputFormat::Mbtiles);
        assert_eq!(config.logging.file, PathBuf::from("/tmp/tf.log"));
    }

    #[test]
    fn test_invalid_threads_names_key() {
        let err = parse("[generation]\nthreads = many\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section,
                key,
                value,
                ..
            } => {
                assert_eq!(section, "generation");
                assert_eq!(key, "threads");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_range_checks() {
        assert!(parse("[render]\ntile_size = 0\n").is_err());
        assert!(parse("[render]\nbuffer_ratio = 1.5\n").is_err());
        assert!(parse("[generation]\nprogress_interval = 0\n").is_err());
        assert!(parse("[output]\nformat = tms\n").is_err());
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = parse("[generation]\nthreads =\n[render]\nfont =\n").unwrap();
        assert_eq!(config.generation.threads, 0);
        assert!(config.render.font.is_none());
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/fonts/a.ttf"), home.join("fonts/a.ttf"));
        }
    }
}
