use proptest::prelude::*;
use techdash::{
    approve_all, approved_hours, decline_all, derive_status, requested_hours, total_hours,
    BillingMode, Request, RequestStatus, Task, TaskStatus,
};

fn task_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Pending),
        Just(TaskStatus::Authorised),
        Just(TaskStatus::Declined),
        Just(TaskStatus::AwaitingCustomerResponse),
        Just(TaskStatus::Unrecognised),
    ]
}

fn hours() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => 0.0f64..40.0,
        1 => Just(-1.5),
        1 => Just(f64::NAN),
    ]
}

fn known_task() -> impl Strategy<Value = Task> {
    (prop::sample::select(TaskStatus::ALL.to_vec()), hours())
        .prop_map(|(status, h)| Task::new("job", h).with_status(status))
}

fn task() -> impl Strategy<Value = Task> {
    (task_status(), hours()).prop_map(|(status, h)| Task::new("job", h).with_status(status))
}

fn request() -> impl Strategy<Value = Request> {
    prop_oneof![
        prop::collection::vec(task(), 1..8).prop_map(|tasks| build(BillingMode::Itemised(tasks))),
        (prop::option::of(hours()), task_status())
            .prop_map(|(h, s)| {
                let mut r = build(BillingMode::FlatRate(h));
                r.status = RequestStatus::from(s);
                r
            }),
    ]
}

fn build(billing: BillingMode) -> Request {
    let mut request = Request {
        id: 1,
        vehicle_job_id: "W1".to_string(),
        registration: "AB12 CDE".to_string(),
        work_description: "Service".to_string(),
        billing,
        status: RequestStatus::Pending,
        created_at: String::new(),
        updated_at: String::new(),
    };
    request.refresh_status();
    request
}

proptest! {
    #[test]
    fn derivation_ignores_task_order(mut tasks in prop::collection::vec(task(), 1..10)) {
        let forward = derive_status(&tasks).unwrap();
        tasks.reverse();
        prop_assert_eq!(derive_status(&tasks).unwrap(), forward);
        tasks.rotate_left(1);
        prop_assert_eq!(derive_status(&tasks).unwrap(), forward);
    }

    #[test]
    fn any_awaiting_task_wins_unless_all_declined(tasks in prop::collection::vec(task(), 1..10)) {
        let status = derive_status(&tasks).unwrap();
        let awaiting = tasks.iter().any(|t| t.status == TaskStatus::AwaitingCustomerResponse);
        if awaiting {
            prop_assert_eq!(status, RequestStatus::AwaitingCustomerResponse);
        }
    }

    #[test]
    fn approve_and_decline_all_are_total(mut tasks in prop::collection::vec(task(), 1..10)) {
        prop_assert_eq!(approve_all(&mut tasks).unwrap(), RequestStatus::Authorised);
        prop_assert!(tasks.iter().all(|t| t.status == TaskStatus::Authorised));
        prop_assert_eq!(decline_all(&mut tasks).unwrap(), RequestStatus::Declined);
        prop_assert!(tasks.iter().all(|t| t.status == TaskStatus::Declined));
    }

    #[test]
    fn totals_are_finite_and_non_negative(requests in prop::collection::vec(request(), 0..6)) {
        for total in [approved_hours(&requests), requested_hours(&requests)] {
            prop_assert!(total.is_finite());
            prop_assert!(total >= 0.0);
            prop_assert!(total.is_sign_positive());
        }
    }

    #[test]
    fn totals_ignore_request_order(mut requests in prop::collection::vec(request(), 0..6)) {
        let approved = approved_hours(&requests);
        let requested = requested_hours(&requests);
        requests.reverse();
        prop_assert_eq!(approved_hours(&requests), approved);
        prop_assert_eq!(requested_hours(&requests), requested);
    }

    #[test]
    fn totals_are_additive(
        left in prop::collection::vec(request(), 0..5),
        right in prop::collection::vec(request(), 0..5),
    ) {
        let mut all = left.clone();
        all.extend(right.iter().cloned());
        let approved = approved_hours(&left) + approved_hours(&right);
        let requested = requested_hours(&left) + requested_hours(&right);
        prop_assert!((approved_hours(&all) - approved).abs() < 1e-9);
        prop_assert!((requested_hours(&all) - requested).abs() < 1e-9);
    }

    #[test]
    fn approved_never_exceeds_total(r in request()) {
        prop_assert!(r.approved_hours() <= r.requested_hours() + 1e-9);
    }

    #[test]
    fn status_totals_add_up_to_the_whole(tasks in prop::collection::vec(known_task(), 1..10)) {
        let r = build(BillingMode::Itemised(tasks));
        let by_status: f64 = TaskStatus::ALL
            .iter()
            .map(|s| total_hours(&r, Some(*s)))
            .sum();
        prop_assert!((total_hours(&r, None) - by_status).abs() < 1e-9);
    }

    #[test]
    fn task_order_does_not_change_totals(mut tasks in prop::collection::vec(task(), 1..10)) {
        let filters = [
            None,
            Some(TaskStatus::Pending),
            Some(TaskStatus::Authorised),
            Some(TaskStatus::Declined),
            Some(TaskStatus::AwaitingCustomerResponse),
            Some(TaskStatus::Unrecognised),
        ];
        let before = build(BillingMode::Itemised(tasks.clone()));
        tasks.reverse();
        let mid = tasks.len() / 2;
        tasks.rotate_left(mid);
        let after = build(BillingMode::Itemised(tasks));
        for filter in filters {
            prop_assert_eq!(total_hours(&before, filter), total_hours(&after, filter));
        }
    }
}
