//! Pipeline metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const STORIES_PROCESSED_TOTAL: &str = "storyreel_stories_processed_total";
    pub const SCENES_TOTAL: &str = "storyreel_scenes_total";
    pub const NARRATION_FAILURES_TOTAL: &str = "storyreel_narration_failures_total";
    pub const COMPILE_DURATION_SECONDS: &str = "storyreel_compile_duration_seconds";
    pub const COMPILES_TOTAL: &str = "storyreel_compiles_total";
    pub const UPLOADS_TOTAL: &str = "storyreel_uploads_total";
    pub const UPLOAD_DURATION_SECONDS: &str = "storyreel_upload_duration_seconds";
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "failure"
    }
}

/// Record one scene image attempt.
pub fn record_scene(ok: bool) {
    counter!(names::SCENES_TOTAL, "outcome" => outcome(ok)).increment(1);
}

pub fn record_narration_failure() {
    counter!(names::NARRATION_FAILURES_TOTAL).increment(1);
}

/// Record a compile attempt and its wall time.
pub fn record_compile(ok: bool, duration_secs: f64) {
    counter!(names::COMPILES_TOTAL, "outcome" => outcome(ok)).increment(1);
    histogram!(names::COMPILE_DURATION_SECONDS).record(duration_secs);
}

pub fn record_upload(ok: bool, duration_secs: f64) {
    counter!(names::UPLOADS_TOTAL, "outcome" => outcome(ok)).increment(1);
    histogram!(names::UPLOAD_DURATION_SECONDS).record(duration_secs);
}

/// Record a finished story; `with_video` when a reel URL was produced.
pub fn record_story(with_video: bool) {
    let result = if with_video { "video" } else { "partial" };
    counter!(names::STORIES_PROCESSED_TOTAL, "result" => result).increment(1);
}
