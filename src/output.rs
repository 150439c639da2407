use std::fs::File;
use std::path::Path;

use crate::classify::{Label, align};
use crate::progress::Progress;

/// Default output path: `outputs/labeled_<video-id>_<timestamp>.csv`
pub fn default_output_path(video_id: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M");
    format!("outputs/labeled_{}_{}.csv", video_id, timestamp)
}

/// Write the labeled comments as CSV (`text,label` header; labels are
/// `1`, `0`, or empty for unknown), creating the parent directory if
/// needed.
///
/// The label vector is re-aligned against the comment list before
/// writing. Per-batch alignment should already guarantee equal lengths,
/// so this is a whole-run re-check that keeps a row for every comment
/// no matter what upstream produced.
pub fn write_csv(
    path: &str,
    comments: &[String],
    labels: Vec<Label>,
    progress: &dyn Progress,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels = align(labels, comments.len());

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create output directory '{}': {}", parent.display(), e))?;
        }
    }

    let file = File::create(path)
        .map_err(|e| format!("Failed to create output file '{}': {}", path, e))?;
    write_rows(file, comments, &labels)?;

    let unknown = labels.iter().filter(|label| **label == Label::Unknown).count();
    progress.results_written(path, comments.len(), unknown);

    Ok(())
}

fn write_rows<W: std::io::Write>(
    writer: W,
    comments: &[String],
    labels: &[Label],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["text", "label"])?;
    for (comment, label) in comments.iter().zip(labels) {
        csv.write_record([comment.as_str(), label.csv_field()])?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(comments: &[String], labels: &[Label]) -> String {
        let mut buffer: Vec<u8> = Vec::new();
        write_rows(&mut buffer, comments, labels).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn writes_header_and_one_row_per_comment() {
        let comments = vec!["nice video".to_string(), "WIN BIG at slot88".to_string()];
        let labels = vec![Label::Negative, Label::Positive];
        let output = rendered(&comments, &labels);
        assert_eq!(output, "text,label\nnice video,0\nWIN BIG at slot88,1\n");
    }

    #[test]
    fn unknown_label_renders_as_empty_field() {
        let comments = vec!["anything".to_string()];
        let output = rendered(&comments, &[Label::Unknown]);
        assert_eq!(output, "text,label\nanything,\n");
    }

    #[test]
    fn comment_text_is_csv_quoted_when_needed() {
        let comments = vec!["hello, \"world\"\nsecond line".to_string()];
        let output = rendered(&comments, &[Label::Negative]);
        assert_eq!(output, "text,label\n\"hello, \"\"world\"\"\nsecond line\",0\n");
    }

    #[test]
    fn run_with_failed_last_batch_keeps_every_row() {
        // 45 comments, batch size 20: two labeled batches plus one that
        // failed and degraded to all-unknown.
        let comments: Vec<String> = (0..45).map(|i| format!("comment {}", i)).collect();
        let mut labels = vec![Label::Negative; 20];
        labels.extend(vec![Label::Positive; 20]);
        labels.extend(vec![Label::Unknown; 5]);

        let labels = align(labels, comments.len());
        assert_eq!(labels.len(), 45);

        let output = rendered(&comments, &labels);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 46);
        assert!(lines[1..=20].iter().all(|line| line.ends_with(",0")));
        assert!(lines[21..=40].iter().all(|line| line.ends_with(",1")));
        assert!(lines[41..=45].iter().all(|line| line.ends_with(',')));
    }

    #[test]
    fn whole_run_mismatch_is_padded_before_writing() {
        let comments: Vec<String> = (0..3).map(|i| format!("comment {}", i)).collect();
        let labels = align(vec![Label::Positive], comments.len());
        let output = rendered(&comments, &labels);
        assert_eq!(output.lines().count(), 4);
        assert!(output.ends_with("comment 1,\ncomment 2,\n"));
    }

    #[test]
    fn default_path_embeds_video_id() {
        let path = default_output_path("abc123");
        assert!(path.starts_with("outputs/labeled_abc123_"));
        assert!(path.ends_with(".csv"));
    }
}
