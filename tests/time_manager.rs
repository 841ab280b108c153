use std::time::Duration;

use pawnstorm::search::{SearchBudget, SearchLimits};
use pawnstorm::Side;

#[test]
fn allotment_uses_side_to_move_clock() {
    let limits = SearchLimits {
        white_time: Some(Duration::from_secs(80)),
        black_time: Some(Duration::from_secs(8)),
        black_increment: Some(Duration::from_millis(100)),
        ..SearchLimits::default()
    };
    assert_eq!(SearchBudget::new(&limits, Side::White).allotted(), Some(Duration::from_secs(2)));
    assert_eq!(SearchBudget::new(&limits, Side::Black).allotted(), Some(Duration::from_millis(300)));
}

#[test]
fn movetime_overrides_clock() {
    let limits = SearchLimits { move_time: Some(Duration::from_millis(75)), white_time: Some(Duration::from_secs(60)), ..SearchLimits::default() };
    assert_eq!(SearchBudget::new(&limits, Side::White).allotted(), Some(Duration::from_millis(75)));
}

#[test]
fn no_clock_means_no_time_limit() {
    let b = SearchBudget::new(&SearchLimits::depth(4), Side::Black);
    assert_eq!(b.allotted(), None);
    assert_eq!(b.max_depth(), 4);
    assert!(!b.is_exhausted());
}

#[test]
fn elapsed_time_trips_budget() {
    let b = SearchBudget::new(&SearchLimits::move_time(5), Side::White);
    std::thread::sleep(Duration::from_millis(15));
    assert!(b.is_exhausted());
    assert!(b.stop_handle().is_stopped());
}

#[test]
fn nodes_counted_across_threads() {
    let b = SearchBudget::unlimited();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..1000 { b.count_node(); }
            });
        }
    });
    assert_eq!(b.nodes(), 4000);
}
