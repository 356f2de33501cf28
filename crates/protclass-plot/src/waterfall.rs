use crate::style::{self, Frame, GRID, NEGATIVE, POSITIVE};
use crate::PlotError;
use protclass_ml::ShapValues;
use svg::node::element::Path;
use svg::Document;

/// A single contribution row: label, start and end on the margin axis.
#[derive(Debug, Clone, PartialEq)]
struct Step {
    label: String,
    start: f64,
    end: f64,
}

/// Waterfall for one explained row: starts at the expected value at the
/// bottom and adds each contribution, largest |SHAP| on top, ending at the
/// model output f(x).
pub fn waterfall(shap: &ShapValues, row: usize, max_display: usize) -> Result<Document, PlotError> {
    let rows = shap.values.nrows();
    if rows == 0 || shap.values.ncols() == 0 {
        return Err(PlotError::Empty);
    }
    if row >= rows {
        return Err(PlotError::RowOutOfRange { row, rows });
    }
    let steps = steps(shap, row, max_display);
    let fx = shap.expected_value + shap.values.row(row).sum();
    let extent = style::padded_extent(
        steps
            .iter()
            .flat_map(|s| [s.start, s.end])
            .chain([shap.expected_value, fx]),
    );
    let frame = Frame::new(steps.len(), extent);
    let mut document = frame.document(&format!("f(x) = {fx:.3}"));

    for x_value in [shap.expected_value, fx] {
        let x = frame.x.map(x_value);
        document = document.add(style::line(x, style::TOP, x, frame.axis_y(), GRID, 1.0));
    }

    // top row is the largest contribution, drawn first
    for (i, step) in steps.iter().rev().enumerate() {
        let y = frame.row_y(i);
        let (x0, x1) = (frame.x.map(step.start), frame.x.map(step.end));
        let delta = step.end - step.start;
        let colour = if delta >= 0.0 { POSITIVE } else { NEGATIVE };
        document = frame
            .row_label(document, i, &step.label)
            .add(arrow(x0, x1, y, style::ROW_HEIGHT * 0.7, colour))
            .add(style::label(
                x0.max(x1) + 6.0,
                y + 4.0,
                "start",
                11.0,
                &format!("{delta:+.3}"),
            ));
    }
    document = document.add(style::label(
        frame.x.map(shap.expected_value),
        frame.axis_y() + 32.0,
        "middle",
        11.0,
        &format!("E[f(X)] = {:.3}", shap.expected_value),
    ));
    Ok(frame.x_axis(document, ""))
}

/// Steps from the bottom (smallest shown |φ|) to the top. When features are
/// hidden, their summed contribution is the first step.
fn steps(shap: &ShapValues, row: usize, max_display: usize) -> Vec<Step> {
    let phi = shap.values.row(row);
    let mut order: Vec<usize> = (0..phi.len()).collect();
    order.sort_by(|&a, &b| phi[b].abs().total_cmp(&phi[a].abs()).then(a.cmp(&b)));
    let max_display = max_display.max(1);
    let (shown, hidden) = if order.len() > max_display {
        order.split_at(max_display - 1)
    } else {
        (order.as_slice(), &[][..])
    };

    let mut steps = Vec::with_capacity(shown.len() + 1);
    let mut at = shap.expected_value;
    if !hidden.is_empty() {
        let rest: f64 = hidden.iter().map(|&f| phi[f]).sum();
        steps.push(Step {
            label: format!("{} other features", hidden.len()),
            start: at,
            end: at + rest,
        });
        at += rest;
    }
    for &f in shown.iter().rev() {
        steps.push(Step {
            label: format!(
                "{} = {}",
                style::format_tick(shap.data[[row, f]]),
                shap.feature_names[f]
            ),
            start: at,
            end: at + phi[f],
        });
        at += phi[f];
    }
    steps
}

/// Horizontal arrow from `x0` to `x1` centred on `y`.
fn arrow(x0: f64, x1: f64, y: f64, height: f64, fill: &str) -> Path {
    let half = height / 2.0;
    let dir = if x1 >= x0 { 1.0 } else { -1.0 };
    let head = (half * 0.8).min((x1 - x0).abs());
    let neck = x1 - dir * head;
    let d = format!(
        "M {x0} {} L {neck} {} L {x1} {y} L {neck} {} L {x0} {} Z",
        y - half,
        y - half,
        y + half,
        y + half
    );
    Path::new().set("d", d).set("fill", fill)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::toy_shap;

    #[test]
    fn test_steps_end_at_model_output() {
        let shap = toy_shap();
        let steps = steps(&shap, 0, 20);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].start, shap.expected_value);
        let last = steps.last().unwrap();
        let fx = shap.expected_value + shap.values.row(0).sum();
        assert!((last.end - fx).abs() < 1e-12);
        // largest contribution on top
        assert!(last.label.ends_with("ACC"));
    }

    #[test]
    fn test_hidden_features_collapse_into_one_step() {
        let steps = steps(&toy_shap(), 1, 2);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].label, "2 other features");
        assert!((steps[0].end - steps[0].start - 0.31).abs() < 1e-12);
    }

    #[test]
    fn test_row_out_of_range() {
        assert!(matches!(
            waterfall(&toy_shap(), 9, 10),
            Err(PlotError::RowOutOfRange { row: 9, rows: 4 })
        ));
    }
}
