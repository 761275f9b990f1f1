//! Backup display formatting
//!
//! Formats remote snapshots and retention plans for terminal output.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::backup::{RetentionPlan, Snapshot};

/// Format snapshots newest first, marking the ones the policy keeps
pub fn format_snapshot_list(
    snapshots: &[Snapshot],
    plan: Option<&RetentionPlan>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> String {
    if snapshots.is_empty() {
        return "No snapshots found.".to_string();
    }

    let name_width = snapshots
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<19}  {:>6}  {:<12}  {}\n",
        "Name",
        "Modified",
        "Age",
        "Hash",
        "Policy",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<19}  {:->6}  {:-<12}  {:-<6}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for snapshot in snapshots {
        let marker = match plan {
            Some(plan) if plan.is_relevant(&snapshot.name) => "keep",
            Some(_) => "prune",
            None => "",
        };
        let hash: String = snapshot.content_hash.chars().take(12).collect();

        output.push_str(&format!(
            "{:<name_width$}  {:<19}  {:>6}  {:<12}  {}\n",
            snapshot.name,
            snapshot
                .modified_at
                .with_timezone(tz)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            format_duration(now.signed_duration_since(snapshot.modified_at)),
            hash,
            marker,
            name_width = name_width,
        ));
    }

    output
}

/// Format a duration in human-readable form
pub fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    let months = days / 30;
    format!("{}mo", months)
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::evaluate;
    use crate::config::RetentionPolicy;
    use chrono::{Duration, TimeZone};

    fn snapshot(name: &str, at: DateTime<Utc>) -> Snapshot {
        Snapshot::new(name, "ab".repeat(32), at)
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(5)), "5s");
        assert_eq!(format_duration(Duration::minutes(5)), "5m");
        assert_eq!(format_duration(Duration::hours(5)), "5h");
        assert_eq!(format_duration(Duration::days(5)), "5d");
        assert_eq!(format_duration(Duration::days(65)), "2mo");
        assert_eq!(format_duration(Duration::seconds(-3)), "0s");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_snapshot_list_marks_plan() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let snapshots = vec![
            snapshot("backup_2024_03_20_08_00_00.db", now - Duration::hours(4)),
            snapshot("backup_2024_03_19_08_00_00.db", now - Duration::hours(28)),
        ];
        let plan = evaluate(&snapshots, &RetentionPolicy::new(1, 0, 0), now);

        let output = format_snapshot_list(&snapshots, Some(&plan), now, &chrono_tz::UTC);
        let newest = output.lines().find(|l| l.contains("03_20")).unwrap();
        let older = output.lines().find(|l| l.contains("03_19")).unwrap();
        assert!(newest.ends_with("keep"));
        assert!(newest.contains("4h"));
        assert!(older.ends_with("prune"));
    }

    #[test]
    fn test_empty_snapshot_list() {
        let now = Utc::now();
        assert_eq!(
            format_snapshot_list(&[], None, now, &chrono_tz::UTC),
            "No snapshots found."
        );
    }
}
