use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use glyphart_render::{
    Effect, Gradient, RenderConfig, Rgb, DEFAULT_BACKGROUND, DEFAULT_FOREGROUND, DEFAULT_GLYPH_SIZE,
};
use log::debug;
use serde::Deserialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientPreset {
    Classic,
    Detailed,
    Standard,
    Blocks,
    Binary,
}

impl GradientPreset {
    fn to_gradient(self) -> Gradient {
        match self {
            GradientPreset::Classic => Gradient::classic(),
            GradientPreset::Detailed => Gradient::detailed(),
            GradientPreset::Standard => Gradient::standard(),
            GradientPreset::Blocks => Gradient::blocks(),
            GradientPreset::Binary => Gradient::binary(),
        }
    }
}

/// `[render]` table of a settings file. Every key mirrors a CLI flag.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub font: Option<PathBuf>,
    pub glyph_size: Option<u32>,
    pub preset: Option<GradientPreset>,
    pub gradient: Option<String>,
    pub background: Option<[i64; 3]>,
    pub foreground: Option<[i64; 3]>,
    pub contrast: Option<bool>,
    pub effect: Option<String>,
    pub invert: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub render: RenderSection,
}

impl SettingsFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {:?}", path))?;
        toml::from_str(&text).with_context(|| format!("failed to parse settings file {:?}", path))
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// TrueType/OpenType font used to draw glyphs
    #[arg(long)]
    pub font: Option<PathBuf>,
    /// Pixel size of one glyph cell
    #[arg(long)]
    pub glyph_size: Option<u32>,
    /// Named gradient used to map brightness to glyphs
    #[arg(long, value_enum)]
    pub preset: Option<GradientPreset>,
    /// Custom gradient, darkest glyph first (overrides --preset)
    #[arg(long)]
    pub gradient: Option<String>,
    /// Background colour as R,G,B
    #[arg(long)]
    pub background: Option<String>,
    /// Foreground colour as R,G,B
    #[arg(long)]
    pub foreground: Option<String>,
    /// Blend glyph colours between background and foreground by brightness
    #[arg(long, default_value_t = false)]
    pub contrast: bool,
    /// Colour effect, e.g. rainbow-radial or original-color
    #[arg(long)]
    pub effect: Option<String>,
    /// Reverse the gradient
    #[arg(long, default_value_t = false)]
    pub invert: bool,
    /// TOML settings file; flags given on the command line win
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Render configuration plus the font it should be drawn with.
#[derive(Debug)]
pub struct ResolvedSettings {
    pub config: RenderConfig,
    pub font: Option<PathBuf>,
}

impl ResolvedSettings {
    pub fn font(&self) -> Result<&Path> {
        self.font
            .as_deref()
            .context("raster output needs a font; pass --font or set `font` under [render]")
    }
}

impl RenderArgs {
    pub fn resolve(&self) -> Result<ResolvedSettings> {
        let file = match &self.config {
            Some(path) => SettingsFile::load(path)?.render,
            None => RenderSection::default(),
        };
        self.merge(file)
    }

    fn merge(&self, file: RenderSection) -> Result<ResolvedSettings> {
        let gradient = match (&self.gradient, self.preset, file.gradient, file.preset) {
            (Some(custom), ..) => custom.clone(),
            (None, Some(preset), ..) => preset.to_gradient().to_string(),
            (None, None, Some(custom), _) => custom,
            (None, None, None, Some(preset)) => preset.to_gradient().to_string(),
            (None, None, None, None) => Gradient::classic().to_string(),
        };

        let effect = match self.effect.as_deref().or(file.effect.as_deref()) {
            Some(name) => Some(name.parse::<Effect>()?),
            None => None,
        };

        let config = RenderConfig::builder()
            .glyph_size(self.glyph_size.or(file.glyph_size).unwrap_or(DEFAULT_GLYPH_SIZE))
            .gradient(gradient)
            .background(resolve_color(
                "background",
                self.background.as_deref(),
                file.background,
                DEFAULT_BACKGROUND,
            )?)
            .foreground(resolve_color(
                "foreground",
                self.foreground.as_deref(),
                file.foreground,
                DEFAULT_FOREGROUND,
            )?)
            .contrast(self.contrast || file.contrast.unwrap_or(false))
            .effect(effect)
            .invert_gradient(self.invert || file.invert.unwrap_or(false))
            .build()?;

        let font = self.font.clone().or(file.font);
        debug!("resolved settings, font {:?}", font);
        Ok(ResolvedSettings { config, font })
    }
}

/// Malformed colours are errors; well-formed but out-of-range colours fall
/// back to `fallback` with a warning.
fn resolve_color(
    name: &'static str,
    flag: Option<&str>,
    file: Option<[i64; 3]>,
    fallback: Rgb,
) -> Result<Rgb> {
    let components = match (flag, file) {
        (Some(text), _) => Rgb::parse_components(text)?,
        (None, Some(components)) => components,
        (None, None) => return Ok(fallback),
    };
    Ok(Rgb::from_components_or(name, components, fallback))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_without_flags_or_file() {
        let resolved = RenderArgs::default().resolve().unwrap();
        assert_eq!(resolved.config, RenderConfig::default());
        assert!(resolved.font().is_err());
    }

    #[test]
    fn settings_file_fills_unset_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[render]\nfont = \"mono.ttf\"\nglyph_size = 12\npreset = \"blocks\"\n\
             foreground = [10, 20, 30]\ncontrast = true\neffect = \"rainbow_radial\""
        )
        .unwrap();

        let args = RenderArgs { config: Some(file.path().to_path_buf()), ..Default::default() };
        let resolved = args.resolve().unwrap();

        assert_eq!(resolved.config.glyph_size(), 12);
        assert_eq!(resolved.config.gradient().to_string(), " ░▒▓█");
        assert_eq!(resolved.config.foreground(), Rgb::new(10, 20, 30));
        assert!(resolved.config.contrast());
        assert_eq!(resolved.config.effect(), Some(Effect::RainbowRadial));
        assert_eq!(resolved.font().unwrap(), Path::new("mono.ttf"));
    }

    #[test]
    fn flags_override_the_file() {
        let file = RenderSection {
            glyph_size: Some(12),
            gradient: Some("ab".into()),
            background: Some([1, 2, 3]),
            ..Default::default()
        };
        let args = RenderArgs {
            glyph_size: Some(6),
            preset: Some(GradientPreset::Binary),
            background: Some("9, 9, 9".into()),
            ..Default::default()
        };
        let config = args.merge(file).unwrap().config;

        assert_eq!(config.glyph_size(), 6);
        assert_eq!(config.gradient().to_string(), "01");
        assert_eq!(config.background(), Rgb::new(9, 9, 9));
    }

    #[test]
    fn out_of_range_colours_fall_back() {
        let file = RenderSection { background: Some([300, 0, 0]), ..Default::default() };
        let args = RenderArgs { foreground: Some("-1,0,0".into()), ..Default::default() };
        let config = args.merge(file).unwrap().config;

        assert_eq!(config.background(), DEFAULT_BACKGROUND);
        assert_eq!(config.foreground(), DEFAULT_FOREGROUND);
    }

    #[test]
    fn malformed_colours_and_effects_are_rejected() {
        let args = RenderArgs { background: Some("red".into()), ..Default::default() };
        assert!(args.resolve().is_err());

        let args = RenderArgs { effect: Some("sparkle".into()), ..Default::default() };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn unknown_settings_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render]\nbrightness = 3").unwrap();
        assert!(SettingsFile::load(file.path()).is_err());
    }
}
