use crate::analyzer::{Standing, SubjectStats, percent};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRow {
    pub subject: String,
    pub present: u32,
    pub total: u32,
    pub percent: u32,
    pub standing: Standing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub date: String,
    pub generated_at: String,
    pub user: String,
    pub present: u32,
    pub total: u32,
    pub percent: u32,
    pub subjects: Vec<SubjectRow>,
    pub at_risk: Vec<String>,
}

#[derive(Debug)]
pub struct SavedReport {
    pub markdown_path: PathBuf,
    pub json_path: PathBuf,
}

pub fn build_report(
    date: NaiveDate,
    user: &str,
    stats: &BTreeMap<String, SubjectStats>,
) -> AttendanceReport {
    let generated_at: DateTime<Utc> = Utc::now();

    let subjects = stats
        .iter()
        .map(|(subject, entry)| SubjectRow {
            subject: subject.clone(),
            present: entry.present,
            total: entry.total,
            percent: entry.percent,
            standing: entry.standing(),
        })
        .collect::<Vec<_>>();

    let present = subjects.iter().map(|row| row.present).sum::<u32>();
    let total = subjects.iter().map(|row| row.total).sum::<u32>();

    // Subjects with nothing recorded yet are not flagged.
    let at_risk = subjects
        .iter()
        .filter(|row| row.total > 0 && row.standing != Standing::Good)
        .map(|row| {
            format!(
                "{} is at {}% ({}/{} attended)",
                row.subject, row.percent, row.present, row.total
            )
        })
        .collect::<Vec<_>>();

    AttendanceReport {
        date: date.format("%Y-%m-%d").to_string(),
        generated_at: generated_at.to_rfc3339(),
        user: user.to_string(),
        present,
        total,
        percent: percent(present, total),
        subjects,
        at_risk,
    }
}

pub fn render_markdown(report: &AttendanceReport) -> String {
    let subject_rows = if report.subjects.is_empty() {
        "| - | - | - | - |".to_string()
    } else {
        report
            .subjects
            .iter()
            .map(|row| {
                format!(
                    "| {} | {} / {} | {}% | {} |",
                    row.subject,
                    row.present,
                    row.total,
                    row.percent,
                    standing_label(row.standing)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let risk_rows = if report.at_risk.is_empty() {
        "- Every subject is at or above 75%".to_string()
    } else {
        report
            .at_risk
            .iter()
            .map(|entry| format!("- {entry}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "# Attendance Report - {}\n\n## Summary\n- Student: {}\n- Attended: {} / {}\n- Overall: {}%\n\n## By Subject\n| Subject | Attended | Percent | Standing |\n|---------|----------|---------|----------|\n{}\n\n## At Risk\n{}\n",
        report.date,
        report.user,
        report.present,
        report.total,
        report.percent,
        subject_rows,
        risk_rows
    )
}

pub fn save_report_files(report: &AttendanceReport, report_dir: &Path) -> Result<SavedReport> {
    fs::create_dir_all(report_dir).with_context(|| {
        format!(
            "Failed to create report directory: {}",
            report_dir.display()
        )
    })?;

    let date = report.date.clone();
    let markdown_path = report_dir.join(format!("{date}.md"));
    let json_path = report_dir.join(format!("{date}.json"));

    fs::write(&markdown_path, render_markdown(report)).with_context(|| {
        format!(
            "Failed to write Markdown report: {}",
            markdown_path.display()
        )
    })?;

    let json_content =
        serde_json::to_string_pretty(report).context("Failed to serialize report JSON")?;
    fs::write(&json_path, json_content)
        .with_context(|| format!("Failed to write JSON report: {}", json_path.display()))?;

    Ok(SavedReport {
        markdown_path,
        json_path,
    })
}

fn standing_label(standing: Standing) -> &'static str {
    match standing {
        Standing::Good => "Good",
        Standing::Warning => "Warning",
        Standing::Critical => "Critical",
    }
}
