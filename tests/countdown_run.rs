//! End-to-end countdown runs on the tokio scheduler under paused time

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use tickdown::sched::IntervalScheduler;
use tickdown::state::{CountdownConfig, CountdownController};

fn controller(initial_seconds: u64) -> CountdownController {
    CountdownController::new(
        CountdownConfig {
            initial_seconds,
            tick_interval: Duration::from_secs(1),
        },
        Arc::new(IntervalScheduler::new()),
    )
}

#[tokio::test(start_paused = true)]
async fn full_run_publishes_one_snapshot_per_tick() {
    let controller = controller(5);
    let mut updates = controller.subscribe();
    controller.start();

    let mut seen = Vec::new();
    loop {
        updates.changed().await.expect("controller dropped");
        let snapshot = updates.borrow_and_update().clone();
        seen.push((snapshot.remaining_seconds, snapshot.running));
        if !snapshot.running {
            break;
        }
    }

    assert_eq!(
        seen,
        vec![
            (Some(5), true),
            (Some(4), true),
            (Some(3), true),
            (Some(2), true),
            (Some(1), true),
            (Some(0), true),
            (None, false),
        ],
    );
    assert_eq!(controller.configured_seconds(), 5);
}

#[tokio::test(start_paused = true)]
async fn first_tick_fires_one_full_interval_after_start() {
    let controller = controller(30);
    let mut updates = controller.subscribe();
    controller.start();
    updates.borrow_and_update();

    time::advance(Duration::from_millis(999)).await;
    assert!(!updates.has_changed().unwrap());
    assert_eq!(controller.remaining_seconds(), Some(30));

    time::advance(Duration::from_millis(1)).await;
    tokio::task::yield_now().await;
    assert_eq!(controller.remaining_seconds(), Some(29));
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_run_goes_idle_and_stays_idle() {
    let controller = controller(30);
    let mut updates = controller.subscribe();
    controller.start();

    loop {
        updates.changed().await.expect("controller dropped");
        if updates.borrow_and_update().remaining_seconds == Some(27) {
            break;
        }
    }

    controller.cancel();
    updates.changed().await.expect("controller dropped");
    let snapshot = updates.borrow_and_update().clone();
    assert!(!snapshot.running);
    assert_eq!(snapshot.remaining_seconds, None);
    assert_eq!(snapshot.configured_seconds, 30);

    time::advance(Duration::from_secs(10)).await;
    assert!(!updates.has_changed().unwrap());
    assert!(!controller.is_running());
}
