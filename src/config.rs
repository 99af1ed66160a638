// config.rs - viewer settings
//
// Sources, later ones win:
//   A) assets/skybox.json, searched in <exe_dir> then the working dir
//   B) env SKYBOX_PANORAMA (panorama path only)
//   C) CLI: [panorama] --cross-out <path> --fov <deg> --exposure <f>

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_PANORAMA: &str = "data/piazza_bologni_1k.hdr";
pub const DEFAULT_FOV: f32 = 45.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub panorama: PathBuf,
    /// Where to dump the intermediate vertical cross, if anywhere.
    pub cross_out: Option<PathBuf>,
    pub fov: f32,
    pub exposure: f32,
    pub vsync: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            panorama: PathBuf::from(DEFAULT_PANORAMA),
            cross_out: None,
            fov: DEFAULT_FOV,
            exposure: 1.0,
            vsync: true,
        }
    }
}

/// Find assets/skybox.json by searching:
/// 1) <exe_dir>/assets/skybox.json
/// 2) ./assets/skybox.json
fn find_config_file() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("skybox.json");
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("skybox.json");
    if p.exists() {
        return Some(p);
    }

    None
}

fn load_file(path: &Path) -> Option<ViewerConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("cannot read {:?}: {}", path, e);
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(c) => Some(c),
        Err(e) => {
            log::warn!("ignoring malformed {:?}: {}", path, e);
            None
        }
    }
}

impl ViewerConfig {
    /// Resolves the configuration for this process.
    pub fn load() -> Self {
        let mut config = find_config_file()
            .and_then(|p| {
                log::info!("using config {:?}", p);
                load_file(&p)
            })
            .unwrap_or_default();

        if let Ok(v) = std::env::var("SKYBOX_PANORAMA") {
            if !v.trim().is_empty() {
                config.panorama = PathBuf::from(v);
            }
        }

        config.apply_args(std::env::args().skip(1));
        config
    }

    /// Applies CLI overrides. Unknown flags and bad values are logged and skipped.
    pub fn apply_args(&mut self, args: impl IntoIterator<Item = String>) {
        let mut it = args.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "--cross-out" => match it.next() {
                    Some(v) => self.cross_out = Some(PathBuf::from(v)),
                    None => log::warn!("--cross-out needs a path"),
                },
                "--fov" => match it.next().map(|v| v.parse::<f32>()) {
                    Some(Ok(v)) => self.fov = v,
                    _ => log::warn!("--fov needs a number of degrees"),
                },
                "--exposure" => match it.next().map(|v| v.parse::<f32>()) {
                    Some(Ok(v)) => self.exposure = v,
                    _ => log::warn!("--exposure needs a number"),
                },
                "--no-vsync" => self.vsync = false,
                flag if flag.starts_with("--") => log::warn!("unknown flag {}", flag),
                path => self.panorama = PathBuf::from(path),
            }
        }
    }
}
