mod common;

use binroute_app::app::OfflineReplayer;
use binroute_domain::model::{BinStatus, Checklist, MutationKind, RouteStatus, StopStatus};
use binroute_domain::repository::MutationQueue;
use binroute_domain::service::{stop_counts, statistics};
use binroute_types::Error;

use common::{draft, ready_checklist, started_route, Harness};

#[test]
fn test_full_route_lifecycle() {
    let h = Harness::new();
    h.seed_bins();
    let mut manager = h.manager();

    let id = manager.create_route(&draft(&["B-1", "B-2", "B-3"])).unwrap().id.clone();
    let route = manager.route(&id).unwrap();
    assert_eq!(route.status, RouteStatus::Scheduled);
    assert_eq!(route.stops.len(), 3);
    assert_eq!(route.stops[0].expected_weight, 108.0);

    let route = manager.start_route(&id, &ready_checklist()).unwrap();
    assert_eq!(route.status, RouteStatus::InProgress);
    assert!(route.started_at.is_some());
    assert!(route.checklist.as_ref().unwrap().is_complete());

    let route = manager.collect_bin(&id, "B-1", 30.5).unwrap();
    let stop = route.stop("B-1").unwrap();
    assert_eq!(stop.status, StopStatus::Collected);
    assert_eq!(stop.actual_weight, Some(30.5));
    assert_eq!(stop.fill_level_at_collection, Some(90.0));
    assert!(stop.collected_at.is_some());
    assert_eq!(statistics::route_progress(route), 33);

    // the bin itself is emptied
    let bin = h.bin("B-1");
    assert_eq!(bin.fill_level, 0.0);
    assert_eq!(bin.weight, 0.0);
    assert_eq!(bin.status, BinStatus::Active);
    assert!(bin.last_collected.is_some());

    manager.collect_bin(&id, "B-2", 20.0).unwrap();
    let route = manager.skip_bin(&id, "B-3", "blocked by parked car").unwrap();
    let stop = route.stop("B-3").unwrap();
    assert_eq!(stop.status, StopStatus::Skipped);
    assert_eq!(stop.notes.as_deref(), Some("blocked by parked car"));
    assert!(stop.actual_weight.is_none());
    assert!(stop.collected_at.is_none());
    assert_eq!(h.bin("B-3").fill_level, 40.0);

    let route = manager.complete_route(&id).unwrap();
    assert_eq!(route.status, RouteStatus::Completed);
    assert_eq!(route.waste_collected, Some(50.5));
    assert_eq!(route.recyclable_waste, Some(30.5));
    assert_eq!(route.route_duration, Some(0));
    assert!(route.completed_at >= route.started_at);
    route.check_invariants().unwrap();

    let counts = stop_counts(route);
    assert_eq!(counts.collected_bins, 2);
    assert_eq!(counts.skipped_bins, 1);
    assert_eq!(counts.pending_bins, 0);

    assert!(h.queue().is_empty().unwrap());
}

#[test]
fn test_refresh_picks_up_remote_state() {
    let h = Harness::new();
    h.seed_bins();
    let id = {
        let mut manager = h.manager();
        started_route(&mut manager)
    };

    let mut manager = h.manager();
    assert!(matches!(manager.route(&id), Err(Error::NotFound(_))));
    manager.refresh(Some("alex")).unwrap();
    assert_eq!(manager.route(&id).unwrap().status, RouteStatus::InProgress);

    manager.refresh(Some("someone else")).unwrap();
    assert!(manager.routes().is_empty());
}

#[test]
fn test_start_requires_complete_checklist() {
    let h = Harness::new();
    h.seed_bins();
    let mut manager = h.manager();
    let id = manager.create_route(&draft(&["B-1"])).unwrap().id.clone();

    let mut partial = Checklist::standard();
    partial.check("vehicle").unwrap();
    let err = manager.start_route(&id, &partial).unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m == "checklist incomplete"));
    assert_eq!(manager.route(&id).unwrap().status, RouteStatus::Scheduled);

    manager.start_route(&id, &ready_checklist()).unwrap();
    let err = manager.start_route(&id, &ready_checklist()).unwrap_err();
    assert!(matches!(err, Error::Conflict(ref m) if m == "already in progress"));
}

#[test]
fn test_stop_transitions_are_one_way() {
    let h = Harness::new();
    h.seed_bins();
    let mut manager = h.manager();
    let id = started_route(&mut manager);

    manager.collect_bin(&id, "B-1", 10.0).unwrap();
    assert!(matches!(
        manager.collect_bin(&id, "B-1", 10.0),
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        manager.skip_bin(&id, "B-1", "late"),
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        manager.collect_bin(&id, "B-9", 10.0),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        manager.collect_bin(&id, "B-2", -1.0),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        manager.skip_bin(&id, "B-2", "   "),
        Err(Error::Validation(ref m)) if m == "reason required"
    ));
}

#[test]
fn test_complete_requires_every_stop_processed() {
    let h = Harness::new();
    h.seed_bins();
    let mut manager = h.manager();
    let id = started_route(&mut manager);

    manager.collect_bin(&id, "B-1", 10.0).unwrap();
    let err = manager.complete_route(&id).unwrap_err();
    assert!(matches!(err, Error::Conflict(ref m) if m == "not all bins processed"));
    assert_eq!(manager.route(&id).unwrap().status, RouteStatus::InProgress);

    manager.skip_bin(&id, "B-2", "locked gate").unwrap();
    manager.skip_bin(&id, "B-3", "locked gate").unwrap();
    let route = manager.complete_route(&id).unwrap();
    assert_eq!(route.waste_collected, Some(10.0));
    assert_eq!(route.recyclable_waste, Some(10.0));
}

#[test]
fn test_all_skipped_route_completes_with_zero_waste() {
    let h = Harness::new();
    h.seed_bins();
    let mut manager = h.manager();
    let id = manager.create_route(&draft(&["B-2"])).unwrap().id.clone();
    manager.start_route(&id, &ready_checklist()).unwrap();
    manager.skip_bin(&id, "B-2", "road closed").unwrap();

    let route = manager.complete_route(&id).unwrap();
    assert_eq!(route.waste_collected, Some(0.0));
    assert_eq!(route.recyclable_waste, Some(0.0));
}

#[test]
fn test_cancel_only_from_scheduled() {
    let h = Harness::new();
    h.seed_bins();
    let mut manager = h.manager();

    let scheduled = manager.create_route(&draft(&["B-1"])).unwrap().id.clone();
    let route = manager.cancel_route(&scheduled).unwrap();
    assert_eq!(route.status, RouteStatus::Cancelled);
    assert!(matches!(
        manager.start_route(&scheduled, &ready_checklist()),
        Err(Error::Conflict(_))
    ));

    let running = started_route(&mut manager);
    let err = manager.cancel_route(&running).unwrap_err();
    assert!(matches!(err, Error::Conflict(ref m) if m == "only scheduled routes can be cancelled"));
}

#[test]
fn test_transport_failure_does_not_advance_state() {
    let h = Harness::new();
    h.seed_bins();
    let mut manager = h.manager();
    let id = started_route(&mut manager);

    h.gateway.set_offline(true);
    let err = manager.collect_bin(&id, "B-1", 25.0).unwrap_err();
    assert!(err.is_retryable());

    let stop = manager.route(&id).unwrap().stop("B-1").unwrap().clone();
    assert_eq!(stop.status, StopStatus::Pending);
    assert!(stop.actual_weight.is_none());
    assert_eq!(h.bin("B-1").fill_level, 90.0);

    let queued = h.queue().pending().unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].kind, MutationKind::CollectBin);
    assert_eq!(queued[0].bin_id.as_deref(), Some("B-1"));
    assert_eq!(queued[0].actual_weight(), Some(25.0));

    // local validation failures never reach the queue
    assert!(matches!(
        manager.collect_bin(&id, "B-2", f64::NAN),
        Err(Error::Validation(_))
    ));
    assert_eq!(h.queue().len().unwrap(), 1);
}

#[test]
fn test_offline_replay_applies_in_order() {
    let h = Harness::new();
    h.seed_bins();
    let mut manager = h.manager();
    let id = started_route(&mut manager);

    h.gateway.set_offline(true);
    manager.collect_bin(&id, "B-1", 12.0).unwrap_err();
    manager.skip_bin(&id, "B-2", "no access").unwrap_err();
    manager.collect_bin(&id, "B-1", 12.0).unwrap_err();

    // still offline: nothing is consumed
    let queue = h.queue();
    let summary = OfflineReplayer::new(&queue, h.gateway.as_ref()).replay().unwrap();
    assert_eq!(summary.applied, 0);
    assert_eq!(summary.remaining, 3);
    assert_eq!(queue.len().unwrap(), 3);

    h.gateway.set_offline(false);
    let mut seen = Vec::new();
    let summary = OfflineReplayer::new(&queue, h.gateway.as_ref())
        .replay_with_progress(|done, total| seen.push((done, total)))
        .unwrap();
    assert_eq!(summary.applied, 2);
    // second collection of the same bin conflicts and is dropped
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.remaining, 0);
    assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    assert!(h.queue().is_empty().unwrap());

    manager.refresh(None).unwrap();
    let route = manager.route(&id).unwrap();
    assert_eq!(route.stop("B-1").unwrap().status, StopStatus::Collected);
    assert_eq!(route.stop("B-2").unwrap().status, StopStatus::Skipped);
    assert_eq!(h.bin("B-1").fill_level, 0.0);
}

#[test]
fn test_create_route_rejects_unknown_bin() {
    let h = Harness::new();
    h.seed_bins();
    let mut manager = h.manager();
    assert!(matches!(
        manager.create_route(&draft(&["B-1", "B-404"])),
        Err(Error::NotFound(_))
    ));
    assert!(manager.routes().is_empty());
}

#[test]
fn test_next_stops_fullest_first() {
    let h = Harness::new();
    h.seed_bins();
    let mut manager = h.manager();

    let id = manager.create_route(&draft(&["B-3", "B-2", "B-1"])).unwrap().id.clone();
    manager.start_route(&id, &ready_checklist()).unwrap();
    manager.collect_bin(&id, "B-2", 20.0).unwrap();

    let next: Vec<_> = manager
        .next_stops(&id)
        .unwrap()
        .into_iter()
        .map(|(stop, priority)| (stop.bin_id, priority))
        .collect();
    assert_eq!(
        next,
        vec![
            ("B-1".to_string(), statistics::Priority::High),
            ("B-3".to_string(), statistics::Priority::Low),
        ]
    );
    assert!(matches!(manager.next_stops("missing"), Err(Error::NotFound(_))));
}
