// tests/banner.rs

use std::path::Path;
use std::time::Duration;

use deployrun::engine::banner::{failure_lines, header_lines, step_label, success_lines};

#[test]
fn labels_carry_the_host_position_and_host_count() {
    assert_eq!(step_label(2, 5, None), "STEP 2/5");
    assert_eq!(step_label(2, 5, Some((3, 4))), "STEP 2/5.3/4");
}

#[test]
fn header_names_step_target_and_timeout() {
    let lines = header_lines(
        1,
        3,
        Some((2, 3)),
        "Restart (on node2)",
        "node2",
        Some(Duration::from_secs(90)),
    );

    assert!(lines.contains(&"STEP 1/3.2/3: Restart (on node2)".to_string()));
    assert!(lines.contains(&"Target: node2".to_string()));
    assert!(lines.contains(&"Timeout: 90s".to_string()));
}

#[test]
fn header_without_timeout_has_no_timeout_line() {
    let lines = header_lines(1, 1, None, "Say hi", "localhost", None);
    assert!(lines.contains(&"STEP 1/1: Say hi".to_string()));
    assert!(!lines.iter().any(|l| l.starts_with("Timeout")));
}

#[test]
fn success_marker_is_followed_by_the_log_path() {
    let lines = success_lines(Path::new("/ws/config/prod/.cache/logs/1-Say_hi.log"));
    assert_eq!(
        lines,
        vec![
            "✅ SUCCESS".to_string(),
            "Log: /ws/config/prod/.cache/logs/1-Say_hi.log".to_string(),
        ]
    );
}

#[test]
fn failure_marker_lists_exit_code_reason_and_log() {
    let lines = failure_lines(Some(124), Some("timed out after 5s"), Path::new("/l.log"));
    assert_eq!(
        lines,
        vec![
            "❌ FAILED".to_string(),
            "Exit code: 124".to_string(),
            "Reason: timed out after 5s".to_string(),
            "Log: /l.log".to_string(),
        ]
    );

    let lines = failure_lines(None, None, Path::new("/l.log"));
    assert_eq!(lines[1], "Exit code: none");
    assert_eq!(lines.len(), 3);
}
