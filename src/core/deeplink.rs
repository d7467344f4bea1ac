//! Shareable `x:y:z` location fragments
//!
//! A fragment names the view center in reference-frame pixels and the zoom
//! level, e.g. `#4096:2048:1`. Parsing is permissive: every component is
//! optional and anything unreadable falls back to the caller's default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeepLink {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub zoom: Option<i32>,
}

impl DeepLink {
    pub fn new(x: i64, y: i64, zoom: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            zoom: Some(zoom),
        }
    }

    /// Parse a fragment, with or without its leading `#`.
    pub fn parse(fragment: &str) -> Self {
        let fragment = fragment.trim();
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment.is_empty() {
            return Self::default();
        }

        let mut parts = fragment.split(':');
        let x = parts.next().and_then(parse_leading_int);
        let y = parts.next().and_then(parse_leading_int);
        let zoom = parts
            .next()
            .and_then(parse_leading_int)
            .and_then(|z| i32::try_from(z).ok());

        let link = Self { x, y, zoom };
        if !link.is_complete() {
            log::debug!("deep link {:?} incomplete, using defaults for missing parts", fragment);
        }
        link
    }

    pub fn is_complete(&self) -> bool {
        self.x.is_some() && self.y.is_some() && self.zoom.is_some()
    }

    /// Fill unset components from the given defaults.
    pub fn resolve(&self, default_x: i64, default_y: i64, default_zoom: i32) -> (i64, i64, i32) {
        (
            self.x.unwrap_or(default_x),
            self.y.unwrap_or(default_y),
            self.zoom.unwrap_or(default_zoom),
        )
    }

    /// Format as a fragment without the leading `#`.
    ///
    /// Unset components are written as empty strings, which `parse` reads back
    /// as unset.
    pub fn to_fragment(&self) -> String {
        fn part<T: ToString>(v: Option<T>) -> String {
            v.map(|v| v.to_string()).unwrap_or_default()
        }
        format!("{}:{}:{}", part(self.x), part(self.y), part(self.zoom))
    }
}

impl std::fmt::Display for DeepLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_fragment())
    }
}

/// Reads an optionally signed run of leading digits, ignoring anything after
/// it. `"12px"` reads as 12, `"px"` as nothing.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|v| sign * v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_fragment() {
        assert_eq!(DeepLink::parse("#4096:2048:1"), DeepLink::new(4096, 2048, 1));
        assert_eq!(DeepLink::parse("10:20:-2"), DeepLink::new(10, 20, -2));
    }

    #[test]
    fn test_parse_missing_components() {
        let link = DeepLink::parse("#300");
        assert_eq!(link.x, Some(300));
        assert_eq!(link.y, None);
        assert_eq!(link.zoom, None);
        assert_eq!(link.resolve(1, 2, 3), (300, 2, 3));

        assert_eq!(DeepLink::parse(""), DeepLink::default());
        assert_eq!(DeepLink::parse("#"), DeepLink::default());
    }

    #[test]
    fn test_parse_garbage_falls_back() {
        let link = DeepLink::parse("#abc:12px:zz");
        assert_eq!(link.x, None);
        assert_eq!(link.y, Some(12));
        assert_eq!(link.zoom, None);
    }

    #[test]
    fn test_zero_is_a_real_value() {
        assert_eq!(DeepLink::parse("0:0:0"), DeepLink::new(0, 0, 0));
    }

    #[test]
    fn test_format_round_trip() {
        let link = DeepLink::new(512, 768, 2);
        assert_eq!(link.to_fragment(), "512:768:2");
        assert_eq!(DeepLink::parse(&link.to_string()), link);

        let partial = DeepLink { x: Some(5), y: None, zoom: Some(1) };
        assert_eq!(partial.to_fragment(), "5::1");
        assert_eq!(DeepLink::parse(&partial.to_fragment()), partial);
    }
}
