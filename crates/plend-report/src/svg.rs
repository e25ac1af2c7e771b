//! SVG boxplots and histograms.
//!
//! Plots are assembled from a handful of primitives into a fixed 640x400
//! canvas. No raster backend is involved; the output is plain text.

use std::fmt::Write as _;

use plend_stats::GroupedValues;
use plend_stats::math::{quantile_sorted, sorted_present};
use quick_xml::escape::escape;

use crate::error::ReportError;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 56.0;
const Y_TICKS: usize = 5;

const FILL: &str = "#9ecae1";
const STROKE: &str = "#08519c";
const AXIS: &str = "#333333";
const FONT: &str = "font-family=\"Helvetica, Arial, sans-serif\"";

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Canvas {
    elements: Vec<String>,
}

impl Canvas {
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &str) {
        self.elements.push(format!(
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{width:.1}\" height=\"{height:.1}\" fill=\"{fill}\" stroke=\"{STROKE}\" stroke-width=\"1\"/>"
        ));
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) {
        self.elements.push(format!(
            "<line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\" stroke=\"{stroke}\" stroke-width=\"{width}\"/>"
        ));
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64) {
        self.elements.push(format!(
            "<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"{r}\" fill=\"none\" stroke=\"{STROKE}\"/>"
        ));
    }

    fn text(&mut self, x: f64, y: f64, anchor: &str, size: u32, content: &str) {
        self.elements.push(format!(
            "<text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"{anchor}\" font-size=\"{size}\" {FONT}>{}</text>",
            escape(content)
        ));
    }

    fn finish(self, title: &str) -> String {
        let mut out = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" viewBox=\"0 0 {WIDTH} {HEIGHT}\">"
        );
        let _ = write!(out, "<title>{}</title>", escape(title));
        let _ = write!(out, "<rect width=\"{WIDTH}\" height=\"{HEIGHT}\" fill=\"#ffffff\"/>");
        for element in self.elements {
            out.push_str(&element);
        }
        out.push_str("</svg>\n");
        out
    }
}

/// Linear map from a data range onto the plot's vertical extent.
#[derive(Debug, Clone, Copy)]
struct YScale {
    lo: f64,
    hi: f64,
}

impl YScale {
    fn padded(lo: f64, hi: f64) -> Self {
        let span = if hi > lo { hi - lo } else { 1.0 };
        Self {
            lo: lo - span * 0.05,
            hi: hi + span * 0.05,
        }
    }

    fn map(self, value: f64) -> f64 {
        let bottom = HEIGHT - MARGIN_BOTTOM;
        bottom - (value - self.lo) / (self.hi - self.lo) * (bottom - MARGIN_TOP)
    }
}

fn frame(canvas: &mut Canvas, title: &str, x_label: &str, y_label: &str, scale: YScale) {
    let bottom = HEIGHT - MARGIN_BOTTOM;
    canvas.text(WIDTH / 2.0, 28.0, "middle", 16, title);
    canvas.line(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, bottom, AXIS, 1.0);
    canvas.line(MARGIN_LEFT, bottom, WIDTH - MARGIN_RIGHT, bottom, AXIS, 1.0);
    for k in 0..=Y_TICKS {
        let value = scale.lo + (scale.hi - scale.lo) * k as f64 / Y_TICKS as f64;
        let y = scale.map(value);
        canvas.line(MARGIN_LEFT - 4.0, y, MARGIN_LEFT, y, AXIS, 1.0);
        canvas.text(MARGIN_LEFT - 8.0, y + 4.0, "end", 11, &format!("{value:.2}"));
    }
    canvas.text(WIDTH / 2.0, HEIGHT - 12.0, "middle", 12, x_label);
    canvas.text(16.0, MARGIN_TOP - 12.0, "start", 12, y_label);
}

// ---------------------------------------------------------------------------
// Boxplot
// ---------------------------------------------------------------------------

/// Tukey box: quartiles, whiskers at the most extreme values within 1.5 IQR,
/// everything beyond as outliers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub n: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// `None` when no value is present.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_present(values);
        if sorted.is_empty() {
            return None;
        }
        let q1 = quantile_sorted(&sorted, 0.25);
        let q3 = quantile_sorted(&sorted, 0.75);
        let reach = 1.5 * (q3 - q1);
        let (lo_fence, hi_fence) = (q1 - reach, q3 + reach);
        let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
            .iter()
            .copied()
            .partition(|v| (lo_fence..=hi_fence).contains(v));
        Some(Self {
            n: sorted.len(),
            q1,
            median: quantile_sorted(&sorted, 0.5),
            q3,
            lower_whisker: inside.first().copied().unwrap_or(q1),
            upper_whisker: inside.last().copied().unwrap_or(q3),
            outliers,
        })
    }
}

/// Boxplot of `value` for each group.
pub fn boxplot(title: &str, value: &str, grouped: &GroupedValues) -> Result<String, ReportError> {
    let boxes: Vec<(&str, BoxStats)> = grouped
        .labels
        .iter()
        .zip(&grouped.values)
        .filter_map(|(label, values)| Some((label.as_str(), BoxStats::from_values(values)?)))
        .collect();
    if boxes.is_empty() {
        return Err(ReportError::EmptyPlot(title.to_string()));
    }

    let lo = boxes
        .iter()
        .flat_map(|(_, b)| b.outliers.iter().copied().chain([b.lower_whisker]))
        .fold(f64::INFINITY, f64::min);
    let hi = boxes
        .iter()
        .flat_map(|(_, b)| b.outliers.iter().copied().chain([b.upper_whisker]))
        .fold(f64::NEG_INFINITY, f64::max);
    let scale = YScale::padded(lo, hi);

    let mut canvas = Canvas::default();
    frame(&mut canvas, title, "Group", value, scale);

    let slot = (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / boxes.len() as f64;
    let half = (slot * 0.3).min(48.0);
    for (k, (label, b)) in boxes.iter().enumerate() {
        let cx = MARGIN_LEFT + slot * (k as f64 + 0.5);
        let (top, bottom) = (scale.map(b.q3), scale.map(b.q1));
        canvas.line(cx, scale.map(b.upper_whisker), cx, top, STROKE, 1.0);
        canvas.line(cx, bottom, cx, scale.map(b.lower_whisker), STROKE, 1.0);
        for whisker in [b.upper_whisker, b.lower_whisker] {
            let y = scale.map(whisker);
            canvas.line(cx - half / 2.0, y, cx + half / 2.0, y, STROKE, 1.0);
        }
        canvas.rect(cx - half, top, half * 2.0, bottom - top, FILL);
        let median = scale.map(b.median);
        canvas.line(cx - half, median, cx + half, median, STROKE, 2.0);
        for &outlier in &b.outliers {
            canvas.circle(cx, scale.map(outlier), 3.0);
        }
        let caption = format!("{label} (n = {})", b.n);
        canvas.text(cx, HEIGHT - MARGIN_BOTTOM + 18.0, "middle", 11, &caption);
    }
    Ok(canvas.finish(title))
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Equal-width bin over the present values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Sturges' rule: `ceil(log2 n) + 1` bins.
#[must_use]
pub fn sturges_bins(n: usize) -> usize {
    if n < 2 {
        1
    } else {
        (n as f64).log2().ceil() as usize + 1
    }
}

/// Count present values into `bins` equal-width bins (Sturges when `None`).
/// The last bin is closed on the right so the maximum is counted.
#[must_use]
pub fn histogram_bins(values: &[f64], bins: Option<usize>) -> Vec<Bin> {
    let sorted = sorted_present(values);
    let (Some(&lo), Some(&hi)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    let k = bins.unwrap_or_else(|| sturges_bins(sorted.len())).max(1);
    let width = if hi > lo { (hi - lo) / k as f64 } else { 1.0 };

    let mut out: Vec<Bin> = (0..k)
        .map(|i| Bin {
            lower: lo + width * i as f64,
            upper: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in sorted {
        let idx = (((v - lo) / width).floor() as usize).min(k - 1);
        out[idx].count += 1;
    }
    out
}

/// Histogram of one variable's present values.
pub fn histogram(
    title: &str,
    variable: &str,
    values: &[f64],
    bins: Option<usize>,
) -> Result<String, ReportError> {
    let counts = histogram_bins(values, bins);
    if counts.is_empty() {
        return Err(ReportError::EmptyPlot(title.to_string()));
    }
    let peak = counts.iter().map(|b| b.count).max().unwrap_or(0);
    let scale = YScale {
        lo: 0.0,
        hi: (peak as f64 * 1.1).max(1.0),
    };

    let mut canvas = Canvas::default();
    frame(&mut canvas, title, variable, "Count", scale);

    let slot = (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / counts.len() as f64;
    let baseline = scale.map(0.0);
    for (k, bin) in counts.iter().enumerate() {
        let x = MARGIN_LEFT + slot * k as f64;
        let top = scale.map(bin.count as f64);
        canvas.rect(x, top, slot, baseline - top, FILL);
    }
    if let (Some(first), Some(last)) = (counts.first(), counts.last()) {
        let y = HEIGHT - MARGIN_BOTTOM + 18.0;
        canvas.text(MARGIN_LEFT, y, "middle", 11, &format!("{:.2}", first.lower));
        canvas.text(WIDTH - MARGIN_RIGHT, y, "middle", 11, &format!("{:.2}", last.upper));
    }
    Ok(canvas.finish(title))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn box_stats_flag_outliers_beyond_the_fences() {
        let b = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, f64::NAN, 30.0]).unwrap();
        assert_eq!(b.n, 6);
        assert_eq!(b.median, 3.5);
        assert_eq!(b.outliers, vec![30.0]);
        assert_eq!(b.lower_whisker, 1.0);
        assert_eq!(b.upper_whisker, 5.0);
    }

    #[test]
    fn box_stats_of_nothing() {
        assert!(BoxStats::from_values(&[f64::NAN]).is_none());
    }

    #[test]
    fn histogram_counts_every_present_value() {
        let values: Vec<f64> = (0..50).map(f64::from).chain([f64::NAN]).collect();
        let bins = histogram_bins(&values, None);
        assert_eq!(bins.len(), sturges_bins(50));
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 50);
        assert_eq!(bins.last().unwrap().upper, 49.0);
    }

    #[test]
    fn constant_column_lands_in_one_bin() {
        let bins = histogram_bins(&[3.0; 8], Some(4));
        assert_eq!(bins[0].count, 8);
    }

    #[test]
    fn boxplot_draws_one_box_per_group_and_escapes_labels() {
        let grouped = GroupedValues {
            labels: vec!["low (<= 3)".into(), "high (> 3)".into()],
            values: vec![vec![1.0, 2.0, 2.5, 3.0], vec![3.5, 4.0, 4.5, 5.0]],
            excluded: 0,
        };
        let svg = boxplot("DEPNDT by ENT", "DEPNDT", &grouped).unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("fill=\"#9ecae1\"").count(), 2);
        assert!(svg.contains("low (&lt;= 3) (n = 4)"));
        assert!(svg.contains("<title>DEPNDT by ENT</title>"));
    }

    #[test]
    fn histogram_of_missing_values_is_an_error() {
        let err = histogram("EO", "EO", &[f64::NAN, f64::NAN], None).unwrap_err();
        assert!(matches!(err, ReportError::EmptyPlot(_)));
    }
}
