//! Backup list formatting

use chrono::Utc;

use crate::backup::BackupInfo;

pub fn format_backup_list(backups: &[BackupInfo], verbose: bool) -> String {
    if backups.is_empty() {
        return "No backups found.\nCreate one with: gnucash-books backup create\n".to_string();
    }

    let mut output = String::new();
    for (i, backup) in backups.iter().enumerate() {
        let age = format_duration(Utc::now().signed_duration_since(backup.created_at));
        let monthly_marker = if backup.is_monthly { " [monthly]" } else { "" };

        if verbose {
            output.push_str(&format!(
                "{}. {}{}\n   Created: {}\n   Size: {}\n   Age: {}\n   Path: {}\n\n",
                i + 1,
                backup.filename,
                monthly_marker,
                backup.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                format_size(backup.size_bytes),
                age,
                backup.path.display(),
            ));
        } else {
            output.push_str(&format!(
                "  {}. {} ({} ago, {}){}\n",
                i + 1,
                backup.filename,
                age,
                format_size(backup.size_bytes),
                monthly_marker,
            ));
        }
    }
    output.push_str(&format!("\nTotal: {} backup(s)\n", backups.len()));
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

    format!("{}mo", days / 30)
}

/// Format a file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
