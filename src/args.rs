//! Transformation parameters parsed from request paths.
//!
//! A request path is a list of option segments followed by the source URL:
//!
//! ```text
//! /500x300^/g_center/f_jpg/q_80/https://example.com/cat.png
//! ```
//!
//! [`ProcessArgs`] turns those into a `convert` argument vector.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use firesize_core::{Error, Result};
use firesize_magick::TransformDescriptor;

/// Output formats a request may ask for.
pub const KNOWN_FORMATS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "avif", "ico",
];

/// Gravity values `convert -gravity` accepts.
pub const GRAVITIES: &[&str] = &[
    "northwest", "north", "northeast", "west", "center", "east", "southwest", "south",
    "southeast",
];

/// How the requested box constrains the resize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResizeMode {
    /// Fit inside the box, keeping aspect ratio.
    #[default]
    Fit,
    /// Cover the box, keeping aspect ratio (`^`).
    Fill,
    /// Stretch to exactly the box (`!`).
    Exact,
}

/// Requested width/height box, e.g. `300x200`, `300x`, `x200^`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mode: ResizeMode,
}

impl FromStr for Geometry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("invalid geometry '{s}'"));

        let (dims, mode) = if let Some(d) = s.strip_suffix('^') {
            (d, ResizeMode::Fill)
        } else if let Some(d) = s.strip_suffix('!') {
            (d, ResizeMode::Exact)
        } else {
            (s, ResizeMode::Fit)
        };

        let (w, h) = dims.split_once('x').ok_or_else(invalid)?;
        let parse = |v: &str| -> Result<Option<u32>> {
            if v.is_empty() {
                return Ok(None);
            }
            match v.parse::<u32>() {
                Ok(0) | Err(_) => Err(invalid()),
                Ok(n) => Ok(Some(n)),
            }
        };

        let geometry = Geometry {
            width: parse(w)?,
            height: parse(h)?,
            mode,
        };
        if geometry.width.is_none() && geometry.height.is_none() {
            return Err(invalid());
        }
        Ok(geometry)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(w) = self.width {
            write!(f, "{w}")?;
        }
        f.write_str("x")?;
        if let Some(h) = self.height {
            write!(f, "{h}")?;
        }
        match self.mode {
            ResizeMode::Fit => Ok(()),
            ResizeMode::Fill => f.write_str("^"),
            ResizeMode::Exact => f.write_str("!"),
        }
    }
}

/// Parameters for one transform request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessArgs {
    /// Source image URL.
    pub url: String,
    pub geometry: Option<Geometry>,
    pub gravity: Option<String>,
    /// Output format; also the output file extension.
    pub format: Option<String>,
    pub quality: Option<u8>,
    /// Single frame to extract from a multi-frame source.
    pub frame: Option<u32>,
    /// Remove profiles and comments.
    pub strip: bool,
}

impl ProcessArgs {
    /// Arguments for `url` with the format inferred from its extension.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let format = format_from_url(&url);
        Self {
            url,
            format,
            ..Self::default()
        }
    }

    /// Parse a request path (and optional query string).
    pub fn from_request_path(path: &str, query: Option<&str>) -> Result<Self> {
        let path = path.trim_start_matches('/');

        let url_start = find_url_start(path)
            .ok_or_else(|| Error::Validation("request path has no http(s) source url".into()))?;
        let mut url = repair_scheme(&path[url_start..]);
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(q);
        }

        let mut args = Self::new(url);
        for segment in path[..url_start].split('/').filter(|s| !s.is_empty()) {
            args.apply_option(segment)?;
        }
        Ok(args)
    }

    /// Apply one option segment (`300x200`, `g_center`, `f_png`, ...).
    pub fn apply_option(&mut self, segment: &str) -> Result<()> {
        if segment == "strip" {
            self.strip = true;
        } else if let Some(g) = segment.strip_prefix("g_") {
            self.set_gravity(g)?;
        } else if let Some(f) = segment.strip_prefix("f_") {
            self.set_requested_format(f)?;
        } else if let Some(q) = segment.strip_prefix("q_") {
            self.quality = match q.parse::<u8>() {
                Ok(q) if (1..=100).contains(&q) => Some(q),
                _ => return Err(Error::Validation(format!("invalid quality '{q}'"))),
            };
        } else if let Some(n) = segment.strip_prefix("frame_") {
            let n = n
                .parse::<u32>()
                .map_err(|_| Error::Validation(format!("invalid frame '{n}'")))?;
            self.frame = Some(n);
        } else if segment.contains('x') {
            self.geometry = Some(decode_geometry(segment).parse()?);
        } else {
            return Err(Error::Validation(format!("unknown option '{segment}'")));
        }
        Ok(())
    }

    /// Set the gravity, rejecting values `convert` would not understand.
    pub fn set_gravity(&mut self, gravity: &str) -> Result<()> {
        let gravity = gravity.to_ascii_lowercase();
        if !GRAVITIES.contains(&gravity.as_str()) {
            return Err(Error::Validation(format!("unknown gravity '{gravity}'")));
        }
        self.gravity = Some(gravity);
        Ok(())
    }

    /// Set the output format, rejecting unknown formats.
    pub fn set_requested_format(&mut self, format: &str) -> Result<()> {
        let format = format.to_ascii_lowercase();
        if !KNOWN_FORMATS.contains(&format.as_str()) {
            return Err(Error::Validation(format!("unsupported format '{format}'")));
        }
        self.format = Some(format);
        Ok(())
    }
}

impl TransformDescriptor for ProcessArgs {
    fn url(&self) -> &str {
        &self.url
    }

    fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    fn set_format(&mut self, format: &str) {
        self.format = Some(format.to_string());
    }

    fn command_args(&self, input: &Path, output: &Path) -> (Vec<String>, PathBuf) {
        let mut args = Vec::new();

        let input = input.to_string_lossy();
        args.push(match self.frame {
            Some(n) => format!("{input}[{n}]"),
            None => input.to_string(),
        });
        args.push("-auto-orient".into());

        if let Some(geometry) = self.geometry {
            args.push("-resize".into());
            args.push(geometry.to_string());

            if let (Some(gravity), Some(w), Some(h)) =
                (&self.gravity, geometry.width, geometry.height)
            {
                args.push("-gravity".into());
                args.push(gravity.clone());
                args.push("-extent".into());
                args.push(format!("{w}x{h}"));
            }
        }

        if let Some(q) = self.quality {
            args.push("-quality".into());
            args.push(q.to_string());
        }

        if self.strip {
            args.push("-strip".into());
        }

        let output = match self.format {
            Some(ref format) => {
                let mut name = output.as_os_str().to_owned();
                name.push(".");
                name.push(format);
                PathBuf::from(name)
            }
            None => output.to_path_buf(),
        };
        args.push(output.to_string_lossy().to_string());

        (args, output)
    }
}

/// Byte offset of the first segment that starts an http(s) URL.
fn find_url_start(path: &str) -> Option<usize> {
    let mut offset = 0;
    for segment in path.split('/') {
        let lower = segment.to_ascii_lowercase();
        if lower.starts_with("http:") || lower.starts_with("https:") {
            return Some(offset);
        }
        offset += segment.len() + 1;
    }
    None
}

/// Restore `scheme://` when a proxy or client collapsed it to `scheme:/`.
fn repair_scheme(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once(':') else {
        return url.to_string();
    };
    let host_and_path = rest.trim_start_matches('/');
    format!("{scheme}://{host_and_path}")
}

/// Percent-decoded `^` and `!`, which clients commonly escape.
fn decode_geometry(segment: &str) -> String {
    segment
        .replace("%5E", "^")
        .replace("%5e", "^")
        .replace("%21", "!")
}

/// Output format implied by the source URL's file extension.
fn format_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let (_, after_scheme) = path.split_once("://").unwrap_or(("", path));
    let (_, file_path) = after_scheme.split_once('/')?;
    let ext = Path::new(file_path).extension()?.to_str()?.to_ascii_lowercase();
    KNOWN_FORMATS.contains(&ext.as_str()).then_some(ext)
}
