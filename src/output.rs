//! Terminal output for the CLI commands.

use chrono::{DateTime, Local, Utc};

use crate::cluster::Job;
use crate::deploy::DeployOutcome;

const JOB_HEADERS: [&str; 6] = ["ID", "Name", "Status", "Started", "Ended", "Running time"];

/// Format a number of seconds as `1d1h1m5s`, dropping leading zero units.
pub fn pretty_time_delta(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.unsigned_abs();

    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    let seconds = seconds % 60;

    if days > 0 {
        format!("{sign}{days}d{hours}h{minutes}m{seconds}s")
    } else if hours > 0 {
        format!("{sign}{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m{seconds}s")
    } else {
        format!("{sign}{seconds}s")
    }
}

fn local_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn job_row(job: &Job) -> Vec<String> {
    vec![
        job.id.clone(),
        job.name.clone(),
        job.state.to_string(),
        local_time(job.start_time),
        job.end_time.map(local_time).unwrap_or_else(|| "-".to_string()),
        pretty_time_delta(job.duration.as_secs() as i64),
    ]
}

fn grid(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let border = format!("+{}+", border);

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!(" {:<width$} ", cell, width = *width))
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut out = vec![border.clone(), line(headers.to_vec()), border.replace('-', "=")];
    for row in rows {
        out.push(line(row.iter().map(String::as_str).collect()));
        out.push(border.clone());
    }
    out.join("\n")
}

/// Job listing for `flincli list`
pub fn render_jobs(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return "No jobs found".to_string();
    }
    let rows: Vec<Vec<String>> = jobs.iter().map(job_row).collect();
    grid(&JOB_HEADERS, &rows)
}

/// Summary printed after a successful deployment
pub fn render_deploy(name: &str, outcome: &DeployOutcome) -> String {
    grid(
        &["Job", "JobId"],
        &[vec![name.to_string(), outcome.job_id.clone()]],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::JobState;
    use std::time::Duration;

    #[test]
    fn pretty_time_delta_units() {
        assert_eq!(pretty_time_delta(0), "0s");
        assert_eq!(pretty_time_delta(59), "59s");
        assert_eq!(pretty_time_delta(65), "1m5s");
        assert_eq!(pretty_time_delta(3600), "1h0m0s");
        assert_eq!(pretty_time_delta(3661), "1h1m1s");
        assert_eq!(pretty_time_delta(90065), "1d1h1m5s");
    }

    #[test]
    fn pretty_time_delta_keeps_sign() {
        assert_eq!(pretty_time_delta(-65), "-1m5s");
        assert_eq!(pretty_time_delta(-5), "-5s");
    }

    #[test]
    fn empty_listing() {
        assert_eq!(render_jobs(&[]), "No jobs found");
    }

    #[test]
    fn listing_has_one_row_per_job() {
        let jobs = vec![Job {
            id: "a1b2".to_string(),
            name: "wc-job".to_string(),
            state: JobState::Running,
            start_time: Utc::now(),
            end_time: None,
            duration: Duration::from_secs(3661),
        }];

        let table = render_jobs(&jobs);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("Running time"));
        assert!(lines[3].contains("a1b2"));
        assert!(lines[3].contains("RUNNING"));
        assert!(lines[3].contains(" - "));
        assert!(lines[3].contains("1h1m1s"));
        // every line has the same width
        assert!(lines.iter().all(|l| l.chars().count() == lines[0].chars().count()));
    }

    #[test]
    fn deploy_summary() {
        let outcome = DeployOutcome {
            job_id: "f00d".to_string(),
            artifact_id: "jar-1".to_string(),
            replaced_job_id: None,
            resumed_from: None,
        };
        let table = render_deploy("wc-job", &outcome);
        assert!(table.contains("| wc-job | f00d  |"));
    }
}
