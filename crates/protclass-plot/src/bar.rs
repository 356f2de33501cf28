use crate::style::{self, Frame, POSITIVE};
use crate::PlotError;
use protclass_ml::ShapValues;
use svg::node::element::Rectangle;
use svg::Document;

/// Horizontal bars of mean |SHAP|, largest first. Features beyond
/// `max_display - 1` are summed into a final "other features" bar.
pub fn summary_bar(shap: &ShapValues, max_display: usize) -> Result<Document, PlotError> {
    if shap.values.nrows() == 0 || shap.values.ncols() == 0 {
        return Err(PlotError::Empty);
    }
    let importance = shap.mean_abs();
    let rows = fold_rows(&shap.ranking(), &importance, &shap.feature_names, max_display);

    let max = rows.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let frame = Frame::new(rows.len(), (0.0, max * 1.1));
    let mut document = frame.document("Mean |SHAP value|");
    for (i, (name, value)) in rows.iter().enumerate() {
        let y = frame.row_y(i);
        let x0 = frame.x.map(0.0);
        let x1 = frame.x.map(*value);
        document = frame.row_label(document, i, name).add(
            Rectangle::new()
                .set("x", x0)
                .set("y", y - style::ROW_HEIGHT * 0.35)
                .set("width", (x1 - x0).max(0.0))
                .set("height", style::ROW_HEIGHT * 0.7)
                .set("fill", POSITIVE),
        );
        document = document.add(style::label(
            x1 + 4.0,
            y + 4.0,
            "start",
            11.0,
            &format!("+{value:.3}"),
        ));
    }
    Ok(frame.x_axis(document, "mean(|SHAP value|) (average impact on model output magnitude)"))
}

/// Top features by importance; the tail is collapsed into one row.
fn fold_rows(
    ranking: &[usize],
    importance: &[f64],
    names: &[String],
    max_display: usize,
) -> Vec<(String, f64)> {
    let max_display = max_display.max(1);
    if ranking.len() <= max_display {
        return ranking
            .iter()
            .map(|&f| (names[f].clone(), importance[f]))
            .collect();
    }
    let (head, tail) = ranking.split_at(max_display - 1);
    let mut rows: Vec<(String, f64)> = head
        .iter()
        .map(|&f| (names[f].clone(), importance[f]))
        .collect();
    rows.push((
        format!("Sum of {} other features", tail.len()),
        tail.iter().map(|&f| importance[f]).sum(),
    ));
    rows
}
