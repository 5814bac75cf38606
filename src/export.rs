use chrono::Local;

use crate::error::{Error, Result};
use crate::models::{AnalysisResult, Job};

/// Pure formatting of already-fetched data into file artifacts. No state,
/// no network; filenames are derived from the job title and current date.

pub fn jobs_json(jobs: &[Job]) -> Result<String> {
    Ok(serde_json::to_string_pretty(jobs)?)
}

const CSV_COLUMNS: [&str; 11] = [
    "id",
    "title",
    "url",
    "snippet",
    "skills",
    "date_created",
    "job_type",
    "rate_display",
    "workload",
    "duration",
    "client",
];

/// CSV dump of the current page. Nested values (skills, client) are
/// serialized as JSON inside their cells; the csv writer handles quoting.
pub fn jobs_csv(jobs: &[Job]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| Error::Export(e.to_string()))?;
    for job in jobs {
        let record = [
            job.id.clone(),
            job.title.clone(),
            job.url.clone(),
            job.snippet.clone(),
            serde_json::to_string(&job.skills)?,
            job.date_created.clone(),
            job.job_type.clone().unwrap_or_default(),
            job.rate_display.clone(),
            job.workload.clone().unwrap_or_default(),
            job.duration.clone().unwrap_or_default(),
            serde_json::to_string(&job.client)?,
        ];
        writer
            .write_record(&record)
            .map_err(|e| Error::Export(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Export(e.to_string()))
}

/// Plain-text report of one analysis result, in the layout the detail view
/// saves as "insights".
pub fn analysis_report(result: &AnalysisResult) -> String {
    let job = &result.job_data;
    let mut content = String::new();
    content.push_str(&format!("AI ANALYSIS FOR JOB: {}\n", job.title));
    content.push_str(&format!("URL: {}\n", job.url));
    content.push_str(&format!(
        "ANALYSIS DATE: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    content.push_str(&format!("{}\n\n", "=".repeat(50)));

    content.push_str(&format!("SUITABILITY SCORE: {}%\n\n", result.suitability_score));
    content.push_str(&format!(
        "--- ANALYSIS SUMMARY ---\n{}\n\n",
        result.analysis_summary
    ));

    content.push_str("--- STRENGTHS ---\n");
    for strength in &result.strengths {
        content.push_str(&format!("- {strength}\n"));
    }
    content.push('\n');

    content.push_str("--- WEAKNESSES / GAPS ---\n");
    for weakness in &result.weaknesses {
        content.push_str(&format!("- {weakness}\n"));
    }
    content.push('\n');

    content.push_str("--- PROPOSAL SUGGESTIONS ---\n");
    for suggestion in &result.proposal_suggestions {
        content.push_str(&format!("- {suggestion}\n"));
    }
    content.push('\n');

    content
}

pub fn jobs_filename(extension: &str) -> String {
    format!("jobs-{}.{}", Local::now().format("%Y-%m-%d"), extension)
}

pub fn analysis_filename(title: &str) -> String {
    format!(
        "job_analysis_{}_{}.txt",
        slug(title),
        Local::now().format("%Y-%m-%d")
    )
}

fn slug(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientInfo;

    fn job(id: &str, title: &str, snippet: &str) -> Job {
        Job {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://example.com/{id}"),
            snippet: snippet.to_string(),
            skills: vec!["rust".to_string(), "tokio".to_string()],
            date_created: "2024-01-01T00:00:00Z".to_string(),
            job_type: Some("HOURLY".to_string()),
            rate_display: "$60/hr".to_string(),
            workload: None,
            duration: None,
            client: ClientInfo {
                country: Some("Germany".to_string()),
                ..ClientInfo::default()
            },
        }
    }

    #[test]
    fn json_export_round_trips() {
        let jobs = [job("J1", "Rust dev", "build things")];
        let text = jobs_json(&jobs).unwrap();
        let parsed: Vec<Job> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "J1");
    }

    #[test]
    fn csv_export_quotes_embedded_commas_and_quotes() {
        let jobs = [job("J1", "Senior \"Rust\" dev", "fast, safe, concurrent")];
        let text = jobs_csv(&jobs).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap().split(',').count(), CSV_COLUMNS.len());

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "Senior \"Rust\" dev");
        assert_eq!(&record[3], "fast, safe, concurrent");
        // Nested values travel as JSON inside their cells.
        let skills: Vec<String> = serde_json::from_str(&record[4]).unwrap();
        assert_eq!(skills, vec!["rust", "tokio"]);
    }

    #[test]
    fn report_contains_all_sections() {
        let result = AnalysisResult {
            suitability_score: 82,
            analysis_summary: "Good fit overall.".to_string(),
            strengths: vec!["rust experience".to_string()],
            weaknesses: vec!["no ML background".to_string()],
            proposal_suggestions: vec!["lead with rust work".to_string()],
            job_data: job("J1", "Rust dev", ""),
        };
        let report = analysis_report(&result);
        assert!(report.contains("AI ANALYSIS FOR JOB: Rust dev"));
        assert!(report.contains("SUITABILITY SCORE: 82%"));
        assert!(report.contains("--- STRENGTHS ---\n- rust experience"));
        assert!(report.contains("--- WEAKNESSES / GAPS ---\n- no ML background"));
        assert!(report.contains("--- PROPOSAL SUGGESTIONS ---\n- lead with rust work"));
    }

    #[test]
    fn filenames_are_slugged_and_dated() {
        let name = analysis_filename("Senior Rust/Tokio Dev!");
        assert!(name.starts_with("job_analysis_senior_rust_tokio_dev_"));
        assert!(name.ends_with(".txt"));

        let name = jobs_filename("csv");
        assert!(name.starts_with("jobs-"));
        assert!(name.ends_with(".csv"));
    }
}
