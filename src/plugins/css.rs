// src/plugins/css.rs

//! Style stages: Sass compilation (`grass`), autoprefixing and CSS
//! minification (`lightningcss`). Files with other extensions pass through.

use anyhow::{Result, anyhow, bail};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::config::SassStyle;
use crate::pipeline::file::path_to_slash;
use crate::pipeline::{FileTransform, StageOutput, VirtualFile};

fn has_extension(file: &VirtualFile, exts: &[&str]) -> bool {
    file.path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Compile `.scss` / `.sass` files to `.css`. `@import`s resolve against the
/// directory of the source file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sass {
    pub style: SassStyle,
}

impl FileTransform for Sass {
    fn transform(&self, mut file: VirtualFile) -> Result<StageOutput> {
        if !has_extension(&file, &["scss", "sass"]) {
            return Ok(file.into());
        }

        let style = match self.style {
            SassStyle::Expanded => grass::OutputStyle::Expanded,
            SassStyle::Compressed => grass::OutputStyle::Compressed,
        };
        let syntax = if has_extension(&file, &["sass"]) {
            grass::InputSyntax::Sass
        } else {
            grass::InputSyntax::Scss
        };
        let mut options = grass::Options::default().style(style).input_syntax(syntax);
        if let Some(dir) = file.source.as_ref().and_then(|s| s.parent()) {
            options = options.load_path(dir);
        }

        let css = grass::from_string(file.text()?.to_owned(), &options)
            .map_err(|e| anyhow!("{e}"))?;

        file.path.set_extension("css");
        file.contents = css.into_bytes();
        Ok(file.into())
    }
}

/// Add vendor prefixes needed by `targets`; output stays readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Autoprefix {
    pub targets: Option<Browsers>,
}

impl FileTransform for Autoprefix {
    fn transform(&self, file: VirtualFile) -> Result<StageOutput> {
        if !has_extension(&file, &["css"]) {
            return Ok(file.into());
        }
        let css = process_css(&file, self.targets, false)?;
        Ok(file.with_contents(css).into())
    }
}

/// Minify `.css` files, lowering syntax for `targets` when given.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinifyCss {
    pub targets: Option<Browsers>,
}

impl FileTransform for MinifyCss {
    fn transform(&self, file: VirtualFile) -> Result<StageOutput> {
        if !has_extension(&file, &["css"]) {
            return Ok(file.into());
        }
        let css = process_css(&file, self.targets, true)?;
        Ok(file.with_contents(css).into())
    }
}

fn process_css(file: &VirtualFile, browsers: Option<Browsers>, minify: bool) -> Result<String> {
    let targets = Targets {
        browsers,
        ..Targets::default()
    };
    let parser_options = ParserOptions {
        filename: path_to_slash(&file.path),
        ..ParserOptions::default()
    };

    let mut sheet =
        StyleSheet::parse(file.text()?, parser_options).map_err(|e| anyhow!("{e}"))?;
    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))?;
    let out = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))?;

    Ok(out.code)
}

/// Parse browser targets such as `"ie 8"`, `"safari 5"` or `"opera 12.1"`.
///
/// Only `<browser> <version>` pairs are understood; an empty list means
/// "no specific targets".
pub fn parse_targets(entries: &[String]) -> Result<Option<Browsers>> {
    if entries.is_empty() {
        return Ok(None);
    }

    let mut browsers = Browsers::default();
    for entry in entries {
        let mut parts = entry.split_whitespace();
        let (Some(name), Some(version), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("invalid browser target '{entry}' (expected \"<browser> <version>\")");
        };
        let version = encode_version(version)
            .ok_or_else(|| anyhow!("invalid version in browser target '{entry}'"))?;

        let slot = match name.to_ascii_lowercase().as_str() {
            "android" => &mut browsers.android,
            "chrome" => &mut browsers.chrome,
            "edge" => &mut browsers.edge,
            "firefox" | "ff" => &mut browsers.firefox,
            "ie" | "explorer" => &mut browsers.ie,
            "ios" | "ios_saf" => &mut browsers.ios_saf,
            "opera" => &mut browsers.opera,
            "safari" => &mut browsers.safari,
            "samsung" => &mut browsers.samsung,
            other => bail!("unknown browser '{other}' in target '{entry}'"),
        };
        // The oldest version listed for a browser wins.
        *slot = Some(slot.map_or(version, |v| v.min(version)));
    }

    Ok(Some(browsers))
}

/// `major[.minor[.patch]]` as `major << 16 | minor << 8 | patch`.
fn encode_version(version: &str) -> Option<u32> {
    let mut parts = version.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch: u32 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if parts.next().is_some() || major > 0xffff || minor > 0xff || patch > 0xff {
        return None;
    }
    Some(major << 16 | minor << 8 | patch)
}
