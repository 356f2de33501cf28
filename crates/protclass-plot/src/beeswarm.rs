use crate::style::{self, blue_red, Frame, GRID};
use crate::PlotError;
use protclass_ml::stats::percentile;
use protclass_ml::ShapValues;
use svg::node::element::{Circle, Rectangle};
use svg::Document;

const N_BINS: usize = 100;
const DOT_RADIUS: f64 = 3.0;

/// One row per feature; each dot is a sample placed at its SHAP value and
/// coloured by the feature value (blue low, red high). Dots sharing an x bin
/// are stacked alternately above and below the row centre.
pub fn summary_beeswarm(shap: &ShapValues, max_display: usize) -> Result<Document, PlotError> {
    if shap.values.nrows() == 0 || shap.values.ncols() == 0 {
        return Err(PlotError::Empty);
    }
    let shown: Vec<usize> = shap
        .ranking()
        .into_iter()
        .take(max_display.max(1))
        .collect();
    let frame = Frame::new(shown.len(), style::padded_extent(shap.values.iter().copied()));
    let mut document = frame.document("SHAP summary");
    let zero = frame.x.map(0.0);
    document = document.add(style::line(
        zero,
        style::TOP,
        zero,
        frame.axis_y(),
        GRID,
        1.0,
    ));

    for (i, &feature) in shown.iter().enumerate() {
        let y = frame.row_y(i);
        let phi: Vec<f64> = shap.values.column(feature).to_vec();
        let values: Vec<f64> = shap.data.column(feature).to_vec();
        let colours = colour_scale(&values);
        let offsets = swarm_offsets(&phi, style::ROW_HEIGHT * 0.4);
        document = frame.row_label(document, i, &shap.feature_names[feature]);
        for ((&p, colour), dy) in phi.iter().zip(colours).zip(offsets) {
            document = document.add(
                Circle::new()
                    .set("cx", frame.x.map(p))
                    .set("cy", y + dy)
                    .set("r", DOT_RADIUS)
                    .set("fill", colour)
                    .set("fill-opacity", 0.8),
            );
        }
    }
    document = legend(document, &frame);
    Ok(frame.x_axis(document, "SHAP value (impact on model output)"))
}

/// Colour per sample from the 5th-95th percentile range of the feature.
fn colour_scale(values: &[f64]) -> Vec<String> {
    let lo = percentile(values, 5.0);
    let mut hi = percentile(values, 95.0);
    if hi <= lo {
        hi = lo + 1e-9;
    }
    values
        .iter()
        .map(|&v| blue_red((v - lo) / (hi - lo)))
        .collect()
}

/// Vertical offset of each dot. Within an x bin the k-th dot (in row order)
/// goes to `±⌈k/2⌉ · step`, scaled to fit `half_height`.
fn swarm_offsets(phi: &[f64], half_height: f64) -> Vec<f64> {
    let (lo, hi) = phi.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    let width = (hi - lo).max(1e-12);
    let mut counts = vec![0usize; N_BINS];
    let mut layer = Vec::with_capacity(phi.len());
    for &p in phi {
        let bin = (((p - lo) / width) * (N_BINS - 1) as f64).round() as usize;
        let k = counts[bin.min(N_BINS - 1)];
        counts[bin.min(N_BINS - 1)] += 1;
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        layer.push(sign * k.div_ceil(2) as f64);
    }
    let max_layer = layer.iter().fold(0.0f64, |m, l| m.max(l.abs()));
    let step = if max_layer > 0.0 {
        (half_height / max_layer).min(DOT_RADIUS)
    } else {
        0.0
    };
    layer.into_iter().map(|l| l * step).collect()
}

fn legend(document: Document, frame: &Frame) -> Document {
    let x = style::WIDTH - style::RIGHT + 20.0;
    let top = style::TOP;
    let bottom = frame.axis_y();
    let steps = 20;
    let h = (bottom - top) / steps as f64;
    let mut document = document;
    for s in 0..steps {
        let t = 1.0 - s as f64 / (steps - 1) as f64;
        document = document.add(
            Rectangle::new()
                .set("x", x)
                .set("y", top + s as f64 * h)
                .set("width", 8.0)
                .set("height", h + 0.5)
                .set("fill", blue_red(t)),
        );
    }
    document
        .add(style::label(x + 4.0, top - 6.0, "middle", 10.0, "High"))
        .add(style::label(x + 4.0, bottom + 12.0, "middle", 10.0, "Low"))
}
