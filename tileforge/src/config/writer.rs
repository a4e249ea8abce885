//! INI serialization: `ConfigFile` → commented `config.ini` text.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let font = config
        .render
        .font
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();

    format!(
        r#"[generation]
; Tiles rendered concurrently (0 = one per CPU core)
threads = {}
; Completed tiles between progress updates
progress_interval = {}

[render]
; Output tile edge length in pixels
tile_size = {}
; Extra area queried around each tile, as a fraction of its width.
; Keeps strokes and labels crossing tile edges from being cut off.
buffer_ratio = {}
; TrueType/OpenType font used for labels (empty = labels reserve space only)
font = {}

[output]
; Default tile storage:
;   xyz     - directory tree {{z}}/{{x}}/{{y}}.png
;   mbtiles - single SQLite file
format = {}

[logging]
; Log file, cleared at the start of every run
file = {}
"#,
        config.generation.threads,
        config.generation.progress_interval,
        config.render.tile_size,
        config.render.buffer_ratio,
        font,
        config.output.format,
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
