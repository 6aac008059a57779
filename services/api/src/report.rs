use clap::Args;
use placement::error::AppError;
use placement::workflows::assessment::TestReport;
use placement::workflows::ids::TestId;
use placement::workflows::WorkflowError;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Maximum achievable score of the test
    #[arg(long)]
    pub(crate) total_points: i64,
    /// Pass threshold as a percentage of the maximum score
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub(crate) threshold: u8,
    /// Participant scores, comma separated
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub(crate) scores: Vec<i64>,
    /// Test id recorded in the report
    #[arg(long, default_value_t = 0)]
    pub(crate) test_id: i64,
    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let report = build_report(&args)?;
    if args.json {
        let encoded = serde_json::to_string_pretty(&report)
            .map_err(|err| WorkflowError::internal(format!("encode report: {err}")))?;
        println!("{encoded}");
    } else {
        print!("{}", render_table(&report));
    }
    Ok(())
}

pub(crate) fn build_report(args: &ReportArgs) -> Result<TestReport, WorkflowError> {
    if args.total_points < 0 {
        return Err(WorkflowError::invalid_input(
            "total points must not be negative",
        ));
    }
    Ok(TestReport::from_scores(
        TestId(args.test_id),
        args.total_points,
        args.threshold,
        &args.scores,
    ))
}

pub(crate) fn render_table(report: &TestReport) -> String {
    let mut out = format!(
        "Participants: {}  Passed: {}  Failed: {}  Cutoff: {}/{} ({}%)\n",
        report.participants(),
        report.passed,
        report.failed,
        report.cutoff,
        report.total_points,
        report.threshold
    );
    for bucket in &report.buckets {
        out.push_str(&format!(
            "{:>14} | {:<3} {}\n",
            bucket.label,
            bucket.count,
            "#".repeat(bucket.count)
        ));
    }
    out
}
