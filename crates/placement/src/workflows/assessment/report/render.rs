use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::TestReport;
use crate::workflows::assessment::domain::Test;
use crate::workflows::notify::templates::escape_html;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unable to write report artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persists a report and returns where it was written.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, test: &Test, report: &TestReport) -> Result<PathBuf, RenderError>;
}

/// Self-contained HTML page per test. Reruns overwrite the previous draft.
#[derive(Debug, Clone)]
pub struct HtmlReportRenderer {
    dir: PathBuf,
}

impl HtmlReportRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self, test: &Test) -> PathBuf {
        self.dir.join(format!("{}result.html", test.id))
    }
}

impl ReportRenderer for HtmlReportRenderer {
    fn render(&self, test: &Test, report: &TestReport) -> Result<PathBuf, RenderError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| RenderError::Io { path, source }
        };

        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let path = self.artifact_path(test);
        fs::write(&path, render_html(test, report)).map_err(io_error(&path))?;
        debug!(test_id = %test.id, path = %path.display(), "report artifact written");
        Ok(path)
    }
}

fn render_html(test: &Test, report: &TestReport) -> String {
    let tallest = report
        .buckets
        .iter()
        .map(|bucket| bucket.count)
        .max()
        .unwrap_or(0)
        .max(1);

    let mut html = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str(&format!(
        "<title>{} result draft</title>",
        escape_html(&test.name)
    ));
    html.push_str(
        "<style>table{border-collapse:collapse}td{padding:2px 8px}\
         .bar{background:#4a7bd0;height:14px}</style></head><body>",
    );
    html.push_str(&format!("<h1>{}</h1>", escape_html(&test.name)));
    html.push_str(&format!(
        "<p>Ended {} &middot; threshold {}% &middot; cutoff {} of {} points</p>",
        test.end_time.format("%Y-%m-%d %H:%M UTC"),
        report.threshold,
        report.cutoff,
        report.total_points
    ));

    html.push_str("<h2>Score distribution</h2><table>");
    for bucket in &report.buckets {
        let width = bucket.count * 300 / tallest;
        html.push_str(&format!(
            "<tr><td>{}</td><td><div class=\"bar\" style=\"width:{}px\"></div></td><td>{}</td></tr>",
            escape_html(&bucket.label),
            width,
            bucket.count
        ));
    }
    html.push_str("</table>");

    html.push_str(&format!(
        "<h2>Pass / fail</h2><ul><li>Passed: {}</li><li>Failed: {}</li></ul>",
        report.passed, report.failed
    ));
    html.push_str("</body></html>");
    html
}
