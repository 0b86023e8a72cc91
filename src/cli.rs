// src/cli.rs
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::band::BandId;
use crate::batch::{default_indices, ProcessOptions};
use crate::io::warp::Resampling;
use crate::io::writer::{GrayEncoding, WriteOptions};
use crate::processing::band_set::{BandSetOptions, DEFAULT_GRID_SRS};
use crate::processing::indices::{IndexBands, IndexKind};
use crate::utils::fixed_point::MAX_SCALE_FACTOR;

#[derive(Parser, Debug)]
#[command(name = "s2-indices", version)]
#[command(about = "Sentinel-2 NDVI, NDRE, NDWI and true-colour generator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Compression: NONE, LZW, DEFLATE, ZSTD
    #[arg(long, default_value = "LZW", global = true)]
    pub compress: String,

    /// Compression level for DEFLATE (1-9) or ZSTD (1-22)
    #[arg(long, global = true)]
    pub compress_level: Option<u8>,

    /// Write tiled GeoTIFFs
    #[arg(long, global = true)]
    pub tiled: bool,

    /// Write grayscale indices as scaled int16 instead of float32
    #[arg(long, global = true)]
    pub fixed_point: bool,

    /// Scaling factor for fixed-point (1-10000)
    #[arg(long, default_value = "10000", global = true,
          value_parser = clap::value_parser!(i32).range(1..=MAX_SCALE_FACTOR as i64))]
    pub scale_factor: i32,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute indices from an explicit list of band files
    Process {
        /// Band file as ID=PATH, e.g. B04=T32TQM_B04.jp2 (repeatable)
        #[arg(short, long = "band", value_parser = parse_band_arg, required = true)]
        bands: Vec<(BandId, PathBuf)>,

        /// Directory the results are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        scene: SceneArgs,
    },

    /// Compute indices for every scene subdirectory of ROOT
    Batch {
        /// Directory holding one subdirectory per scene
        root: PathBuf,

        #[command(flatten)]
        scene: SceneArgs,
    },

    /// Run a JSON batch configuration
    Run {
        /// Configuration file
        config: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct SceneArgs {
    /// Crop every band to this KML boundary
    #[arg(short, long)]
    pub kml: Option<PathBuf>,

    /// Indices to generate (repeatable; default ndwi, ndvi, ndre)
    #[arg(short, long = "index", value_enum)]
    pub indices: Vec<IndexKind>,

    /// Keep each band's own grid instead of aligning them
    #[arg(long)]
    pub no_align: bool,

    /// Common grid shape as HEIGHTxWIDTH (default: largest band)
    #[arg(long, value_parser = parse_shape)]
    pub shape: Option<(usize, usize)>,

    /// Reference system of the common grid
    #[arg(long, default_value = DEFAULT_GRID_SRS, conflicts_with = "keep_srs")]
    pub grid_srs: String,

    /// Align without reprojecting
    #[arg(long)]
    pub keep_srs: bool,

    /// Resampling used while aligning
    #[arg(long, value_enum, default_value_t = Resampling::Cubic)]
    pub resampling: Resampling,

    /// Near-infrared band used for NDVI
    #[arg(long, default_value = "B07", value_parser = parse_band_id)]
    pub ndvi_nir: BandId,

    /// Resample to a ground sample distance in metres, X or XxY
    #[arg(long, value_parser = parse_pixel_size)]
    pub pixel_size: Option<(f64, f64)>,

    /// Skip the colour-mapped outputs
    #[arg(long)]
    pub no_colour: bool,

    /// Also write every (aligned) input band
    #[arg(long)]
    pub save_bands: bool,
}

impl Cli {
    /// Default `env_logger` filter; `RUST_LOG` takes precedence.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            compress: self.compress.clone(),
            compress_level: self.compress_level,
            tiled: self.tiled,
            gray: if self.fixed_point {
                GrayEncoding::FixedPoint {
                    scale_factor: self.scale_factor,
                }
            } else {
                GrayEncoding::Float32
            },
        }
    }
}

impl SceneArgs {
    pub fn process_options(&self, write: WriteOptions) -> ProcessOptions {
        ProcessOptions {
            band_set: BandSetOptions {
                align: !self.no_align,
                target_shape: self.shape,
                grid_srs: (!self.keep_srs).then(|| self.grid_srs.clone()),
                resampling: self.resampling,
                indices: IndexBands {
                    ndvi_nir: self.ndvi_nir,
                },
            },
            write,
            kml: self.kml.clone(),
            pixel_size: self.pixel_size,
            indices: if self.indices.is_empty() {
                default_indices()
            } else {
                self.indices.clone()
            },
            colour: !self.no_colour,
            save_bands: self.save_bands,
        }
    }
}

fn parse_band_id(s: &str) -> Result<BandId, String> {
    s.parse::<BandId>().map_err(|e| e.to_string())
}

fn parse_band_arg(s: &str) -> Result<(BandId, PathBuf), String> {
    let (id, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=PATH, got `{s}`"))?;
    Ok((parse_band_id(id.trim())?, PathBuf::from(path.trim())))
}

fn parse_shape(s: &str) -> Result<(usize, usize), String> {
    let (h, w) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected HEIGHTxWIDTH, got `{s}`"))?;
    let h = h.trim().parse::<usize>().map_err(|e| e.to_string())?;
    let w = w.trim().parse::<usize>().map_err(|e| e.to_string())?;
    if h == 0 || w == 0 {
        return Err(format!("shape must be non-zero, got `{s}`"));
    }
    Ok((h, w))
}

fn parse_pixel_size(s: &str) -> Result<(f64, f64), String> {
    let parse = |v: &str| v.trim().parse::<f64>().map_err(|e| e.to_string());
    let (x, y) = match s.split_once(['x', 'X']) {
        Some((x, y)) => (parse(x)?, parse(y)?),
        None => {
            let v = parse(s)?;
            (v, v)
        }
    };
    if x > 0.0 && y > 0.0 {
        Ok((x, y))
    } else {
        Err(format!("pixel size must be positive, got `{s}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_band_arguments() {
        assert_eq!(
            parse_band_arg("b04=/data/T32_B04.jp2").unwrap(),
            (BandId::B04, PathBuf::from("/data/T32_B04.jp2"))
        );
        assert_eq!(parse_band_arg("nir = a.tif").unwrap().0, BandId::Nir);
        assert!(parse_band_arg("B04").is_err());
        assert!(parse_band_arg("B99=a.tif").is_err());
    }

    #[test]
    fn parses_shapes_and_pixel_sizes() {
        assert_eq!(parse_shape("100x200").unwrap(), (100, 200));
        assert!(parse_shape("0x10").is_err());
        assert_eq!(parse_pixel_size("10").unwrap(), (10.0, 10.0));
        assert_eq!(parse_pixel_size("10x20").unwrap(), (10.0, 20.0));
        assert!(parse_pixel_size("-5").is_err());
    }

    #[test]
    fn scale_factor_range() {
        for value in ["0", "-5", "10001", "100000"] {
            assert!(Cli::try_parse_from(["s2-indices", "--scale-factor", value, "run", "c.json"]).is_err());
        }
        let cli = Cli::try_parse_from(["s2-indices", "--scale-factor", "1000", "run", "c.json"]).unwrap();
        assert_eq!(cli.scale_factor, 1000);
    }

    #[test]
    fn batch_command_options() {
        let cli = Cli::try_parse_from([
            "s2-indices",
            "-vv",
            "--fixed-point",
            "batch",
            "/data",
            "--keep-srs",
            "-i",
            "ndvi",
            "--ndvi-nir",
            "B08",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), "trace");
        assert_eq!(
            cli.write_options().gray,
            GrayEncoding::FixedPoint { scale_factor: 10000 }
        );

        let Commands::Batch { root, scene } = &cli.command else {
            panic!("expected batch command");
        };
        assert_eq!(root, &PathBuf::from("/data"));
        let options = scene.process_options(cli.write_options());
        assert_eq!(options.band_set.grid_srs, None);
        assert_eq!(options.band_set.indices.ndvi_nir, BandId::B08);
        assert_eq!(options.indices, vec![IndexKind::Ndvi]);
        assert!(options.colour);
    }
}
