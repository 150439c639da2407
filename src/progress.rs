/// Observer invoked by the pipeline after each stage.
///
/// Keeps console output out of the business logic: the pipeline reports
/// milestones and an implementation decides how (or whether) to render
/// them. All methods default to no-ops so tests can pass `&NullProgress`.
pub trait Progress {
    /// Comment fetch started for up to `limit` comments
    fn fetch_started(&self, _limit: usize) {}

    /// A page of comments arrived; `total` collected so far
    fn comments_fetched(&self, _total: usize, _limit: usize) {}

    /// Labeling started; the run will issue `batch_count` requests
    fn labeling_started(&self, _batch_count: usize) {}

    /// One batch finished (successfully or degraded to unknown labels)
    fn batch_labeled(&self, _index: usize, _batch_count: usize) {}

    /// Results written; `unknown` rows could not be labeled
    fn results_written(&self, _path: &str, _rows: usize, _unknown: usize) {}
}

/// Discards every notification. Used in tests.
pub struct NullProgress;

impl Progress for NullProgress {}

/// Prints progress to stderr, keeping stdout free for data.
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn fetch_started(&self, limit: usize) {
        eprintln!("Fetching up to {} comments...", limit);
    }

    fn comments_fetched(&self, total: usize, limit: usize) {
        eprintln!("Fetched {}/{} comments", total, limit);
    }

    fn labeling_started(&self, batch_count: usize) {
        eprintln!("Labeling comments in {} batches...", batch_count);
    }

    fn batch_labeled(&self, index: usize, batch_count: usize) {
        eprintln!("Labeled batch {}/{}", index + 1, batch_count);
    }

    fn results_written(&self, path: &str, rows: usize, unknown: usize) {
        if unknown > 0 {
            eprintln!("{} comments could not be labeled", unknown);
        }
        eprintln!("Labeled results saved to: {} ({} rows)", path, rows);
    }
}
