//! Shared layout, scales and colours.
use svg::node::element::{Element, Line, Rectangle};
use svg::node::{self, Node};
use svg::Document;

pub(crate) const POSITIVE: &str = "#ff0051";
pub(crate) const NEGATIVE: &str = "#008bfb";
pub(crate) const AXIS: &str = "#333333";
pub(crate) const GRID: &str = "#cccccc";
pub(crate) const FONT: &str = "Arial, Helvetica, sans-serif";

pub(crate) const WIDTH: f64 = 800.0;
pub(crate) const ROW_HEIGHT: f64 = 28.0;
pub(crate) const LEFT: f64 = 220.0;
pub(crate) const RIGHT: f64 = 60.0;
pub(crate) const TOP: f64 = 40.0;
pub(crate) const BOTTOM: f64 = 60.0;

/// Plot frame sized to `rows` horizontal feature rows.
pub(crate) struct Frame {
    pub height: f64,
    pub x: LinearScale,
}

impl Frame {
    pub fn new(rows: usize, domain: (f64, f64)) -> Self {
        Frame {
            height: TOP + BOTTOM + rows as f64 * ROW_HEIGHT,
            x: LinearScale::new(domain, (LEFT, WIDTH - RIGHT)),
        }
    }

    /// Vertical centre of row `i`, counted from the top.
    pub fn row_y(&self, i: usize) -> f64 {
        TOP + (i as f64 + 0.5) * ROW_HEIGHT
    }

    pub fn axis_y(&self) -> f64 {
        self.height - BOTTOM
    }

    pub fn document(&self, title: &str) -> Document {
        Document::new()
            .set("width", WIDTH)
            .set("height", self.height)
            .set("viewBox", (0.0, 0.0, WIDTH, self.height))
            .add(
                Rectangle::new()
                    .set("width", WIDTH)
                    .set("height", self.height)
                    .set("fill", "white"),
            )
            .add(label(WIDTH / 2.0, TOP / 2.0, "middle", 16.0, title))
    }

    /// X axis with five ticks and a caption.
    pub fn x_axis(&self, document: Document, caption: &str) -> Document {
        let y = self.axis_y();
        let mut document = document.add(line(LEFT, y, WIDTH - RIGHT, y, AXIS, 1.0));
        for tick in self.x.ticks(5) {
            let x = self.x.map(tick);
            document = document
                .add(line(x, y, x, y + 5.0, AXIS, 1.0))
                .add(label(x, y + 18.0, "middle", 11.0, &format_tick(tick)));
        }
        document.add(label(
            (LEFT + WIDTH - RIGHT) / 2.0,
            self.height - 15.0,
            "middle",
            12.0,
            caption,
        ))
    }

    /// Feature name to the left of row `i`.
    pub fn row_label(&self, document: Document, i: usize, name: &str) -> Document {
        document.add(label(LEFT - 8.0, self.row_y(i) + 4.0, "end", 12.0, name))
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    /// A degenerate domain is widened around its value.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        let (mut lo, mut hi) = domain;
        if !(hi - lo).is_normal() || hi < lo {
            let centre = if lo.is_finite() { lo } else { 0.0 };
            lo = centre - 1.0;
            hi = centre + 1.0;
        }
        LinearScale {
            domain: (lo, hi),
            range,
        }
    }

    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Evenly spaced ticks across the domain.
    pub fn ticks(&self, n: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        let n = n.max(2);
        (0..n)
            .map(|i| d0 + (d1 - d0) * i as f64 / (n - 1) as f64)
            .collect()
    }
}

/// Domain padded by 5% on both sides.
pub(crate) fn padded_extent(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return (-1.0, 1.0);
    }
    let pad = (hi - lo).max(1e-9) * 0.05;
    (lo - pad, hi + pad)
}

/// Blue → red gradient for `t` in [0, 1].
pub(crate) fn blue_red(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let (r0, g0, b0) = (0x00, 0x8b, 0xfb);
    let (r1, g1, b1) = (0xff, 0x00, 0x51);
    let mix = |a: i32, b: i32| (a as f64 + (b - a) as f64 * t).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

pub(crate) fn line(x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) -> Line {
    Line::new()
        .set("x1", x1)
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", y2)
        .set("stroke", stroke)
        .set("stroke-width", width)
}

pub(crate) fn label(x: f64, y: f64, anchor: &str, size: f64, content: &str) -> Element {
    let mut text = Element::new("text");
    text.assign("x", x);
    text.assign("y", y);
    text.assign("text-anchor", anchor);
    text.assign("font-family", FONT);
    text.assign("font-size", size);
    text.assign("fill", AXIS);
    text.append(node::Text::new(content));
    text
}

pub(crate) fn format_tick(v: f64) -> String {
    if v.abs() >= 100.0 {
        format!("{v:.0}")
    } else if v.abs() >= 1.0 {
        format!("{v:.2}")
    } else {
        format!("{v:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_maps_endpoints() {
        let s = LinearScale::new((0.0, 10.0), (100.0, 200.0));
        assert_eq!(s.map(0.0), 100.0);
        assert_eq!(s.map(10.0), 200.0);
        assert_eq!(s.map(5.0), 150.0);
        assert_eq!(s.ticks(3), vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_degenerate_domain_is_widened() {
        let s = LinearScale::new((2.0, 2.0), (0.0, 10.0));
        assert_eq!(s.map(2.0), 5.0);
    }

    #[test]
    fn test_colour_endpoints() {
        assert_eq!(blue_red(0.0), "#008bfb");
        assert_eq!(blue_red(1.0), "#ff0051");
        assert_eq!(blue_red(f64::NAN), blue_red(0.5));
    }

    #[test]
    fn test_padded_extent() {
        let (lo, hi) = padded_extent([0.0, 10.0, f64::NAN]);
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);
        assert_eq!(padded_extent(std::iter::empty()), (-1.0, 1.0));
    }
}
