//! Output formatting utilities for CLI commands

use colored::Colorize;
use kerntime_collector::orchestrator::{RunReport, StopReason};
use kerntime_shared::utils::format_duration;
use kerntime_shared::AccuracySummary;

/// Print success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print warning message
pub fn warning(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

fn stop_label(stop: StopReason) -> String {
    let text = format!("{:<16}", stop.to_string());
    match stop {
        StopReason::Cached => text.blue().to_string(),
        StopReason::Accurate => text.green().to_string(),
        StopReason::IterationBudget | StopReason::TimeBudget => text.yellow().to_string(),
    }
}

/// Per-benchmark table of a finished run
pub fn print_run_report(report: &RunReport) {
    println!(
        "\n  {:<12} {:<16} {:<16} {:>6} {:>8} {:>8}",
        "SUITE", "BENCHMARK", "STOP", "RUNS", "RECORDS", "TIME"
    );
    for b in &report.benchmarks {
        println!(
            "  {:<12} {:<16} {} {:>6} {:>8} {:>8}",
            b.id.suite,
            b.id.benchmark,
            stop_label(b.stop),
            b.invocations,
            b.records,
            format_duration(b.elapsed)
        );
    }
    println!();

    let budget_hits = report
        .benchmarks
        .iter()
        .filter(|b| matches!(b.stop, StopReason::IterationBudget | StopReason::TimeBudget))
        .count();
    if budget_hits > 0 {
        warning(&format!(
            "{} benchmark(s) stopped on a budget before reaching the accuracy target",
            budget_hits
        ));
    }

    success(&format!(
        "Wrote {} records for {} benchmarks to {} ({} cached, {} profiler runs)",
        report.total_records,
        report.benchmarks.len(),
        report.output.display(),
        report.cached(),
        report.invocations()
    ));
}

/// Per-kernel accuracy table; rows over `threshold` are highlighted
pub fn print_summaries(summaries: &[AccuracySummary], threshold: f64) {
    println!(
        "  {:<12} {:<16} {:<32} {:>6} {:>12} {:>10} {:>8}",
        "SUITE", "BENCHMARK", "KERNEL", "N", "BEST(us)", "STD(us)", "REL"
    );
    for s in summaries {
        let rel = format!("{:>7.2}%", s.rel_uncertainty * 100.0);
        let rel = if s.rel_uncertainty < threshold {
            rel.green()
        } else {
            rel.red()
        };
        println!(
            "  {:<12} {:<16} {:<32} {:>6} {:>12.3} {:>10.3} {}",
            s.key.suite, s.key.benchmark, s.key.kernel, s.iterations, s.best, s.abs_uncertainty, rel
        );
    }
}
