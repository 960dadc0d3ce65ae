//! Python Environment Troubleshooter
//!
//! Diagnoses the host and the Python installation, then repairs what it can.

use pydoctor::diagnostics::DiagnosticReport;
use pydoctor::logging::format_header;
use pydoctor::repair::RepairSummary;
use pydoctor::{Result, Troubleshooter};
use std::io::BufRead;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("=== Python Environment Troubleshooter ===\n");

    let code = match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Critical error: {}", e);
            ExitCode::FAILURE
        }
    };

    println!("\nPress Enter to exit...");
    let _ = std::io::stdin().lock().read_line(&mut String::new());
    code
}

fn run() -> Result<()> {
    let doctor = Troubleshooter::open_default()?;

    let (report, summary) = doctor.run();

    println!("{}", report.to_text_report(doctor.settings.disk_threshold_percent));
    print_summary(&doctor, &report, &summary);
    Ok(())
}

fn print_summary(doctor: &Troubleshooter, report: &DiagnosticReport, summary: &RepairSummary) {
    println!("{}", format_header("Summary"));
    println!("Log file: {}", doctor.log().path().display());
    println!("Report directory: {}", doctor.workspace.base_dir.display());
    if let Some(backup) = &summary.backup_file {
        println!("Package backup: {}", backup.display());
    }
    println!("Issues found: {}", if report.issues_found { "yes" } else { "no" });
    println!("Repair status: {}", summary.status_line());
    for step in summary.failed() {
        if let Err(e) = &step.outcome {
            println!("  - {}: {}", step.name, e);
        }
    }
}
