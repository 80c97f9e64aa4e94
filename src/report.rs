//! 評価レポート（HTML）の書き出し
//!
//! 評価指標の表と、確信度の高い順に並べた推論結果の一覧を1ファイルにまとめます。

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::{ClassifierError, Result};
use crate::evaluation::{is_high_confidence, EvaluationReport, PerClassValue, RankedPrediction};

const BOOTSTRAP_CSS: &str = r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@4.5.3/dist/css/bootstrap.min.css" integrity="sha384-TX8t27EcRE3e/ihU7zmQxVncDAy5uIKz4rEkgIXeMed4M0jlfIDPvg6uqKI2xXr2" crossorigin="anonymous">"#;

/// HTMLレポートを書き出す
///
/// タイトルはモデルファイル名。書き込みに失敗した場合は `Render` エラーになり、
/// 途中までのファイルが残ることがある。
pub fn render_html(report: &EvaluationReport, model_path: &Path, output_path: &Path) -> Result<()> {
    let title = model_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| model_path.display().to_string());

    let file = File::create(output_path)
        .map_err(|e| ClassifierError::Render(format!("{}: {}", output_path.display(), e)))?;
    let mut writer = BufWriter::new(file);

    write_document(&mut writer, report, &title)
        .and_then(|_| writer.flush())
        .map_err(|e| ClassifierError::Render(format!("{}: {}", output_path.display(), e)))?;

    info!("評価レポートを保存しました: {}", output_path.display());
    Ok(())
}

fn write_document<W: Write>(w: &mut W, report: &EvaluationReport, title: &str) -> io::Result<()> {
    let title = escape_html(title);
    writeln!(w, "<html><head><meta charset=\"utf-8\"><title>{}</title>", title)?;
    writeln!(w, "{}", BOOTSTRAP_CSS)?;
    writeln!(w, "</head><body>")?;

    writeln!(w, "<h1>Metrics for {}</h1>", title)?;
    write_metrics(w, report)?;

    writeln!(w, "<h1>Predictions</h1>")?;
    write_confidence(w, report)?;
    writeln!(w, "<div><table class=\"table table-bordered\">")?;
    for (i, result) in report.results.iter().enumerate() {
        write_prediction(w, i + 1, result)?;
    }
    writeln!(w, "</table></div>")?;
    writeln!(w, "</body></html>")
}

fn write_metrics<W: Write>(w: &mut W, report: &EvaluationReport) -> io::Result<()> {
    let m = &report.metrics;
    writeln!(w, "<div><table class=\"table table-striped\">")?;
    for (name, value) in [
        ("MicroAccuracy", m.micro_accuracy),
        ("MacroAccuracy", m.macro_accuracy),
        ("Precision", m.mean_precision),
        ("Recall", m.mean_recall),
        ("LogLoss", m.log_loss),
        ("LogLossReduction", m.log_loss_reduction),
    ] {
        writeln!(w, "<tr><td>{}</td><td>{:.3}</td></tr>", name, value)?;
    }
    write_per_class(w, "PerClassPrecision", &m.per_class_precision)?;
    write_per_class(w, "PerClassRecall", &m.per_class_recall)?;
    writeln!(w, "</table></div>")
}

fn write_per_class<W: Write>(w: &mut W, name: &str, values: &[PerClassValue]) -> io::Result<()> {
    writeln!(w, "<tr><td>{}</td><td>", name)?;
    for v in values {
        writeln!(w, "{}: {:.3}<br />", escape_html(&v.label), v.value)?;
    }
    writeln!(w, "</td></tr>")
}

fn write_confidence<W: Write>(w: &mut W, report: &EvaluationReport) -> io::Result<()> {
    let c = &report.confidence;
    let high_accuracy = match c.high_confidence_accuracy {
        Some(a) => format!("{:.3}", a),
        None => "N/A".to_string(),
    };
    writeln!(w, "<div><table class=\"table table-sm\">")?;
    writeln!(
        w,
        "<tr><td>Shown</td><td>{}</td><td>Correct</td><td>{}</td><td>Accuracy</td><td>{:.3}</td></tr>",
        c.shown, c.correct_count, c.overall_accuracy
    )?;
    writeln!(
        w,
        "<tr><td>HighConfidence</td><td>{}</td><td>CorrectHighConfidence</td><td>{}</td><td>HighConfidenceAccuracy</td><td>{}</td></tr>",
        c.high_confidence_count, c.correct_high_confidence_count, high_accuracy
    )?;
    writeln!(w, "</table></div>")
}

fn write_prediction<W: Write>(w: &mut W, number: usize, p: &RankedPrediction) -> io::Result<()> {
    let color = if p.is_correct { "green" } else { "red" };
    writeln!(w, "<tr><td>")?;
    writeln!(w, "[No.{}] {}<br />", number, escape_html(&p.file_name))?;
    writeln!(w, "Actual Value: {}<br />", escape_html(&p.true_label))?;
    writeln!(
        w,
        "<span style=\"background: linear-gradient(transparent 50%, {} 100%);\">Predicted Value:{}</span><br />",
        color,
        escape_html(&p.predicted_label)
    )?;
    writeln!(
        w,
        "<img class=\"img-fluid\" src=\"{}\" /></td>",
        escape_html(&p.image_path.display().to_string())
    )?;

    writeln!(w, "<td>")?;
    for s in &p.ordered_label_scores {
        let line = format!("{}: {}", escape_html(&s.label), s.percent());
        if is_high_confidence(s.score) {
            writeln!(
                w,
                "<span style=\"background: linear-gradient(transparent 50%, {} 100%);\">{}</span><br />",
                color, line
            )?;
        } else {
            writeln!(w, "{}<br />", line)?;
        }
    }
    writeln!(w, "</td></tr>")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
