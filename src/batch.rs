// src/batch.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::band::BandId;
use crate::error::Result;
use crate::io::writer::{self, GrayEncoding, WriteOptions};
use crate::processing::colorize::{colorize, ColorRamp};
use crate::processing::indices::IndexKind;
use crate::processing::{BandSet, BandSetOptions};
use crate::utils::fixed_point::check_scale_factor;

/// Per-band files of one scene directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub dir: PathBuf,
    pub bands: BTreeMap<BandId, PathBuf>,
}

impl Scene {
    /// Match every file directly inside `dir` against the band tokens.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut bands = BTreeMap::new();
        let mut files = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect::<Vec<_>>();
        files.sort();

        for path in files {
            let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            match BandId::match_file_name(&file_name) {
                Some(id) => {
                    if let Some(previous) = bands.insert(id, path.clone()) {
                        log::warn!(
                            "{} matches {} twice, using {} over {}",
                            dir.display(),
                            id,
                            path.display(),
                            previous.display()
                        );
                    }
                }
                None => log::trace!("ignoring {}", path.display()),
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            bands,
        })
    }
}

/// One scene per first-level subdirectory of `root`, in name order.
/// Deeper directories are not visited.
pub fn collate_bands(root: &Path) -> Result<Vec<Scene>> {
    let mut dirs = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    dirs.sort();

    let scenes = dirs
        .iter()
        .map(|dir| Scene::from_dir(dir))
        .collect::<Result<Vec<_>>>()?;
    log::info!("found {} scene directories under {}", scenes.len(), root.display());
    Ok(scenes)
}

/// Everything that controls how one scene is turned into index files.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    pub band_set: BandSetOptions,
    pub write: WriteOptions,
    pub kml: Option<PathBuf>,
    /// Ground sample distance `(x, y)` in metres.
    pub pixel_size: Option<(f64, f64)>,
    pub indices: Vec<IndexKind>,
    pub colour: bool,
    pub save_bands: bool,
}

/// Subdirectory of a scene holding the bands written by `save_bands`.
pub const SAVED_BANDS_DIR: &str = "bands";

pub fn default_indices() -> Vec<IndexKind> {
    vec![IndexKind::Ndwi, IndexKind::Ndvi, IndexKind::Ndre]
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            band_set: BandSetOptions::default(),
            write: WriteOptions::default(),
            kml: None,
            pixel_size: None,
            indices: default_indices(),
            colour: true,
            save_bands: false,
        }
    }
}

/// Build a band set from `bands` and write every supported index into `out_dir`.
///
/// Grayscale results go to `<index>_gray.tif`, colour maps to
/// `<index>_colour.tif` and the true-colour composite to `rgb.tif`.
/// With `save_bands` the aligned inputs go to the `bands/` subdirectory,
/// which scene collation does not descend into.
/// Unsupported indices are skipped. Returns the files written.
pub fn generate_indices(
    bands: &BTreeMap<BandId, PathBuf>,
    out_dir: &Path,
    options: &ProcessOptions,
) -> Result<Vec<PathBuf>> {
    let mut set = BandSet::new(bands.clone(), options.band_set.clone())?;
    if set.is_empty() {
        log::warn!("no readable bands for {}", out_dir.display());
        return Ok(Vec::new());
    }

    if let Some(kml) = &options.kml {
        set.crop_to_geometry(kml)?;
    }
    if let Some((x_m, y_m)) = options.pixel_size {
        set.resample_to_pixel_size(x_m, y_m)?;
    }

    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();
    if options.save_bands {
        let bands_dir = out_dir.join(SAVED_BANDS_DIR);
        fs::create_dir_all(&bands_dir)?;
        written.extend(set.save_all(Some(&bands_dir.join("band_raster_.tif")), &options.write)?);
    }

    for kind in &options.indices {
        let Some(band) = set.compute(*kind)? else {
            continue;
        };
        let name = kind.output();

        if *kind == IndexKind::Rgb {
            let path = out_dir.join(format!("{name}.tif"));
            writer::write_band(band, &path, &options.write)?;
            written.push(path);
            continue;
        }

        let gray = out_dir.join(format!("{name}_gray.tif"));
        writer::write_gray(band, &gray, &options.write)?;
        written.push(gray);

        if options.colour {
            let colour = out_dir.join(format!("{name}_colour.tif"));
            colorize(band, ColorRamp::RdYlGn)?.save(&colour, &options.write)?;
            written.push(colour);
        }
    }

    Ok(written)
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub scenes: usize,
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    fn record(&mut self, dir: &Path, result: Result<Vec<PathBuf>>) {
        self.scenes += 1;
        match result {
            Ok(files) => {
                log::info!("{}: wrote {} files", dir.display(), files.len());
                self.written.extend(files);
            }
            Err(e) => {
                log::error!("{}: {}", dir.display(), e);
                self.failed.push((dir.to_path_buf(), e.to_string()));
            }
        }
    }
}

/// Generate indices for every scene directory under `root`.
/// A failing scene is logged and the rest are still processed.
pub fn process_folder(root: &Path, options: &ProcessOptions) -> Result<BatchSummary> {
    let scenes = collate_bands(root)?;
    let mut summary = BatchSummary::default();

    for (i, scene) in scenes.iter().enumerate() {
        log::info!("[{}/{}] {}", i + 1, scenes.len(), scene.dir.display());
        summary.record(&scene.dir, generate_indices(&scene.bands, &scene.dir, options));
    }
    Ok(summary)
}

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    /// Every first-level subdirectory becomes a scene.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub scenes: Vec<SceneConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GlobalParams {
    #[serde(default = "default_compress")]
    pub compress: String,
    #[serde(default)]
    pub compress_level: Option<u8>,
    #[serde(default = "default_true")]
    pub float: bool,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: i32,
    #[serde(default)]
    pub tiled: bool,
    #[serde(default)]
    pub band_set: BandSetOptions,
    #[serde(default)]
    pub kml: Option<PathBuf>,
    #[serde(default)]
    pub pixel_size: Option<(f64, f64)>,
    #[serde(default = "default_indices")]
    pub indices: Vec<IndexKind>,
    #[serde(default = "default_true")]
    pub colour: bool,
    #[serde(default)]
    pub save_bands: bool,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            compress: default_compress(),
            compress_level: None,
            float: true,
            scale_factor: default_scale_factor(),
            tiled: false,
            band_set: BandSetOptions::default(),
            kml: None,
            pixel_size: None,
            indices: default_indices(),
            colour: true,
            save_bands: false,
        }
    }
}

fn default_compress() -> String {
    "LZW".to_string()
}

fn default_scale_factor() -> i32 {
    10000
}

fn default_true() -> bool {
    true
}

/// A scene given either as a folder to collate or an explicit band map.
/// Unset fields fall back to `global`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SceneConfig {
    #[serde(default)]
    pub folder: Option<PathBuf>,
    #[serde(default)]
    pub bands: BTreeMap<BandId, PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    pub kml: Option<PathBuf>,
    pub indices: Option<Vec<IndexKind>>,
    pub float: Option<bool>,
    pub scale_factor: Option<i32>,
    pub compress: Option<String>,
    pub compress_level: Option<u8>,
    pub tiled: Option<bool>,
    pub band_set: Option<BandSetOptions>,
}

impl GlobalParams {
    pub fn process_options(&self) -> Result<ProcessOptions> {
        self.merge(&SceneConfig::default())
    }

    fn merge(&self, scene: &SceneConfig) -> Result<ProcessOptions> {
        let float = scene.float.unwrap_or(self.float);
        let gray = if float {
            GrayEncoding::Float32
        } else {
            GrayEncoding::FixedPoint {
                scale_factor: check_scale_factor(scene.scale_factor.unwrap_or(self.scale_factor))?,
            }
        };

        Ok(ProcessOptions {
            band_set: scene.band_set.clone().unwrap_or_else(|| self.band_set.clone()),
            write: WriteOptions {
                compress: scene.compress.clone().unwrap_or_else(|| self.compress.clone()),
                compress_level: scene.compress_level.or(self.compress_level),
                tiled: scene.tiled.unwrap_or(self.tiled),
                gray,
            },
            kml: scene.kml.clone().or_else(|| self.kml.clone()),
            pixel_size: self.pixel_size,
            indices: scene.indices.clone().unwrap_or_else(|| self.indices.clone()),
            colour: self.colour,
            save_bands: self.save_bands,
        })
    }
}

impl SceneConfig {
    /// Band files and output directory of this scene.
    fn resolve(&self) -> Result<Scene> {
        let mut scene = match &self.folder {
            Some(folder) => Scene::from_dir(folder)?,
            None => Scene {
                dir: PathBuf::new(),
                bands: BTreeMap::new(),
            },
        };
        scene.bands.extend(self.bands.clone());

        if let Some(dir) = &self.output_dir {
            scene.dir = dir.clone();
        } else if self.folder.is_none() {
            scene.dir = self
                .bands
                .values()
                .next()
                .and_then(|path| path.parent())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
        }
        Ok(scene)
    }
}

/// Run every scene of a JSON batch configuration.
pub fn process_batch(config_path: &Path) -> Result<BatchSummary> {
    let config_content = fs::read_to_string(config_path)?;
    let config: BatchConfig = serde_json::from_str(&config_content)?;

    let mut summary = match &config.root {
        Some(root) => process_folder(root, &config.global.process_options()?)?,
        None => BatchSummary::default(),
    };

    log::info!("Starting batch processing with {} scenes...", config.scenes.len());
    for (i, scene_config) in config.scenes.iter().enumerate() {
        let resolved = config.global.merge(scene_config).and_then(|options| {
            let scene = scene_config.resolve()?;
            Ok((options, scene))
        });
        match resolved {
            Ok((options, scene)) => {
                log::info!("[{}/{}] {}", i + 1, config.scenes.len(), scene.dir.display());
                summary.record(&scene.dir, generate_indices(&scene.bands, &scene.dir, &options));
            }
            Err(e) => {
                let dir = scene_config.folder.clone().unwrap_or_default();
                summary.record(&dir, Err(e));
            }
        }
    }

    Ok(summary)
}
