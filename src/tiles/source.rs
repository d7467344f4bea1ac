//! Description of a tileable image and its fetch locators

use crate::core::geo::Size;
use crate::core::scale::{scale_by_zoom_delta, scale_dimension};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the zoom query parameter understood by the tile server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomParam {
    #[default]
    Zl,
    Z,
}

impl ZoomParam {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zl => "zl",
            Self::Z => "z",
        }
    }
}

/// How locators are built from a base string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorTemplate {
    /// `base?x=..&y=..&zl=..` query strings
    Query { base: String, zoom_param: ZoomParam },
    /// A pattern with `{x}`, `{y}`, `{col}`, `{row}` and `{z}` placeholders
    /// (image exports use `{cx}`, `{cy}`, `{w}`, `{h}` and `{z}`)
    Pattern(String),
}

impl LocatorTemplate {
    /// Strings containing a `{` are treated as patterns.
    pub fn parse(template: &str, zoom_param: ZoomParam) -> Self {
        if template.contains('{') {
            Self::Pattern(template.to_string())
        } else {
            Self::Query {
                base: template.to_string(),
                zoom_param,
            }
        }
    }
}

/// Source configuration as handed over by the page embedding the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSourceConfig {
    pub tile_url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tile_size: Option<u32>,
    #[serde(default)]
    pub tile_width: Option<u32>,
    #[serde(default)]
    pub tile_height: Option<u32>,
    pub zoom_min: i32,
    pub zoom_max: i32,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub zoom_param: ZoomParam,
    #[serde(default)]
    pub refresh: bool,
    #[serde(default)]
    pub view_size_hint: bool,
    #[serde(default)]
    pub extra: Option<(String, String)>,
}

/// A tileable image: tile geometry, zoom range and locator construction.
///
/// Immutable once built; the viewport and all of its zoom layers share one
/// instance.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSource {
    tile_width: u32,
    tile_height: u32,
    zoom_min: i32,
    zoom_max: i32,
    image_width: u32,
    image_height: u32,
    tiles: LocatorTemplate,
    images: LocatorTemplate,
    force_refresh: bool,
    view_size_hint: bool,
    extra: Option<(String, String)>,
}

impl TileSource {
    pub fn builder(locator_base: impl Into<String>) -> TileSourceBuilder {
        TileSourceBuilder::new(locator_base)
    }

    pub fn from_config(config: TileSourceConfig) -> Result<Self> {
        let size = config.tile_size.unwrap_or(crate::core::constants::TILE_SIZE);
        let mut builder = Self::builder(config.tile_url)
            .tile_size(config.tile_width.unwrap_or(size), config.tile_height.unwrap_or(size))
            .zoom_range(config.zoom_min, config.zoom_max)
            .image_size(config.image_width, config.image_height)
            .zoom_param(config.zoom_param)
            .force_refresh(config.refresh)
            .view_size_hint(config.view_size_hint);
        if let Some(image_url) = config.image_url {
            builder = builder.image_locator(image_url);
        }
        if let Some((key, value)) = config.extra {
            builder = builder.extra_param(key, value);
        }
        builder.build()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: TileSourceConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn tile_size(&self) -> Size {
        Size::new(self.tile_width, self.tile_height)
    }

    pub fn zoom_min(&self) -> i32 {
        self.zoom_min
    }

    pub fn zoom_max(&self) -> i32 {
        self.zoom_max
    }

    pub fn image_size(&self) -> Size {
        Size::new(self.image_width, self.image_height)
    }

    pub fn force_refresh(&self) -> bool {
        self.force_refresh
    }

    pub fn is_valid_zoom(&self, zoom: i32) -> bool {
        (self.zoom_min..=self.zoom_max).contains(&zoom)
    }

    pub fn zoom_levels(&self) -> impl Iterator<Item = i32> {
        self.zoom_min..=self.zoom_max
    }

    /// Size of the full image when viewed at `zoom`; level 0 is 1:1.
    pub fn level_size(&self, zoom: i32) -> Size {
        Size::new(scale_dimension(self.image_width, zoom), scale_dimension(self.image_height, zoom))
    }

    pub fn tile_columns(&self, zoom: i32) -> u32 {
        self.level_size(zoom).width.div_ceil(self.tile_width)
    }

    pub fn tile_rows(&self, zoom: i32) -> u32 {
        self.level_size(zoom).height.div_ceil(self.tile_height)
    }

    /// Locator for tile `(col, row)` at `zoom`.
    ///
    /// Identical inputs give identical locators unless force-refresh is set,
    /// in which case a timestamp is appended so every call refetches.
    pub fn build_tile_locator(&self, col: u32, row: u32, zoom: i32) -> String {
        self.build_tile_locator_with_view(col, row, zoom, None)
    }

    /// Like [`build_tile_locator`](Self::build_tile_locator), passing the
    /// viewport size as a rendering hint when the source asks for it.
    pub fn build_tile_locator_with_view(&self, col: u32, row: u32, zoom: i32, view: Option<Size>) -> String {
        let x = col as u64 * self.tile_width as u64;
        let y = row as u64 * self.tile_height as u64;

        let mut locator = match &self.tiles {
            LocatorTemplate::Query { base, zoom_param } => {
                let mut url = format!(
                    "{}{}x={}&y={}&{}={}",
                    base,
                    query_separator(base),
                    x,
                    y,
                    zoom_param.as_str(),
                    zoom
                );
                if let (true, Some(view)) = (self.view_size_hint, view) {
                    url.push_str(&format!("&sw={}&sh={}", view.width, view.height));
                }
                url
            }
            LocatorTemplate::Pattern(pattern) => pattern
                .replace("{x}", &x.to_string())
                .replace("{y}", &y.to_string())
                .replace("{col}", &col.to_string())
                .replace("{row}", &row.to_string())
                .replace("{z}", &zoom.to_string()),
        };

        if self.force_refresh {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            push_param(&mut locator, "ts", &millis.to_string());
        }

        if let Some((key, value)) = &self.extra {
            push_param(&mut locator, key, value);
        }

        locator
    }

    /// Locator for a static export of a `width × height` view centered on
    /// `(center_x, center_y)` at `zoom`.
    pub fn build_image_locator(&self, center_x: i64, center_y: i64, width: u32, height: u32, zoom: i32) -> String {
        match &self.images {
            LocatorTemplate::Query { base, zoom_param } => format!(
                "{}{}cx={}&cy={}&w={}&h={}&{}={}",
                base,
                query_separator(base),
                center_x,
                center_y,
                width,
                height,
                zoom_param.as_str(),
                zoom
            ),
            LocatorTemplate::Pattern(pattern) => pattern
                .replace("{cx}", &center_x.to_string())
                .replace("{cy}", &center_y.to_string())
                .replace("{w}", &width.to_string())
                .replace("{h}", &height.to_string())
                .replace("{z}", &zoom.to_string()),
        }
    }

    /// Coordinate `n` at level `from` expressed at level `to`.
    pub fn rescale(&self, n: i64, from: i32, to: i32) -> i64 {
        scale_by_zoom_delta(n, to - from)
    }
}

fn query_separator(base: &str) -> &'static str {
    if base.contains('?') {
        if base.ends_with('?') || base.ends_with('&') {
            ""
        } else {
            "&"
        }
    } else {
        "?"
    }
}

fn push_param(locator: &mut String, key: &str, value: &str) {
    locator.push_str(query_separator(locator));
    locator.push_str(key);
    locator.push('=');
    locator.push_str(value);
}

pub struct TileSourceBuilder {
    tile_locator: String,
    image_locator: Option<String>,
    tile_width: u32,
    tile_height: u32,
    zoom_min: i32,
    zoom_max: i32,
    image_width: u32,
    image_height: u32,
    zoom_param: ZoomParam,
    force_refresh: bool,
    view_size_hint: bool,
    extra: Option<(String, String)>,
}

impl TileSourceBuilder {
    pub fn new(locator_base: impl Into<String>) -> Self {
        Self {
            tile_locator: locator_base.into(),
            image_locator: None,
            tile_width: crate::core::constants::TILE_SIZE,
            tile_height: crate::core::constants::TILE_SIZE,
            zoom_min: 0,
            zoom_max: 0,
            image_width: 0,
            image_height: 0,
            zoom_param: ZoomParam::default(),
            force_refresh: false,
            view_size_hint: false,
            extra: None,
        }
    }

    pub fn tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    pub fn zoom_range(mut self, min: i32, max: i32) -> Self {
        self.zoom_min = min;
        self.zoom_max = max;
        self
    }

    pub fn image_size(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Separate base for image exports; defaults to the tile base.
    pub fn image_locator(mut self, base: impl Into<String>) -> Self {
        self.image_locator = Some(base.into());
        self
    }

    pub fn zoom_param(mut self, param: ZoomParam) -> Self {
        self.zoom_param = param;
        self
    }

    pub fn force_refresh(mut self, refresh: bool) -> Self {
        self.force_refresh = refresh;
        self
    }

    pub fn view_size_hint(mut self, enabled: bool) -> Self {
        self.view_size_hint = enabled;
        self
    }

    pub fn extra_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra = Some((key.into(), value.into()));
        self
    }

    pub fn build(self) -> Result<TileSource> {
        if self.tile_locator.is_empty() {
            return Err(Error::InvalidSource("empty tile locator".into()));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(Error::InvalidSource(format!(
                "tile size must be positive, got {}x{}",
                self.tile_width, self.tile_height
            )));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(Error::InvalidSource(format!(
                "image size must be positive, got {}x{}",
                self.image_width, self.image_height
            )));
        }
        if self.zoom_min > self.zoom_max {
            return Err(Error::InvalidSource(format!(
                "zoom range is empty: {}..={}",
                self.zoom_min, self.zoom_max
            )));
        }
        // an empty key or value would produce a malformed query
        let extra = self.extra.filter(|(k, v)| !k.is_empty() && !v.is_empty());

        let images = LocatorTemplate::parse(
            self.image_locator.as_deref().unwrap_or(&self.tile_locator),
            self.zoom_param,
        );

        Ok(TileSource {
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            zoom_min: self.zoom_min,
            zoom_max: self.zoom_max,
            image_width: self.image_width,
            image_height: self.image_height,
            tiles: LocatorTemplate::parse(&self.tile_locator, self.zoom_param),
            images,
            force_refresh: self.force_refresh,
            view_size_hint: self.view_size_hint,
            extra,
        })
    }
}
