mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use common::{client_for, start_mock_api, MockApi, RecordedRequest};
use submanager_client::{
    Cycle, Dashboard, PaymentStatus, ProcessOutcome, SubManagerError, SubscriptionDraft,
    SubscriptionUpdate, CONNECTION_ERROR,
};
use tempfile::{tempdir, TempDir};

const SUBSCRIPTIONS: &str = r#"[
    {"subscriptionId": 1, "title": "Netflix", "description": "Movies", "price": 43.0,
     "cycle": "MONTHLY", "dateOfLastPayment": "2024-05-10", "currencyId": 1},
    {"subscriptionId": 2, "title": "Domain", "description": null, "price": 120.0,
     "cycle": "YEARLY", "dateOfLastPayment": "2024-01-15", "currencyId": 1},
    {"subscriptionId": 3, "title": "Gym", "description": "", "price": 99.0,
     "cycle": "MONTHLY", "dateOfLastPayment": "2024-05-01", "currencyId": 1}
]"#;

const PAYMENTS: &str = r#"[
    {"paymentId": 10, "status": "PAID", "dateOfPayment": "2024-05-10", "amount": 43.0,
     "subscriptionId": 1, "subscriptionTitle": "Netflix"},
    {"paymentId": 11, "status": "UNPROCESSED", "dateOfPayment": "2024-06-10", "amount": 43.0,
     "subscriptionId": 1, "subscriptionTitle": "Netflix"},
    {"paymentId": 12, "status": "PAID", "dateOfPayment": "2024-01-15", "amount": 120.0,
     "subscriptionId": 2, "subscriptionTitle": "Domain"}
]"#;

const CREATED: &str = r#"{"subscriptionId": 4, "title": "Spotify", "description": "Music",
    "price": 23.99, "cycle": "YEARLY", "dateOfLastPayment": "2024-05-20", "currencyId": 2}"#;

const CURRENCIES: &str = r#"[
    {"currencyId": 1, "name": "Polish zloty", "shortName": "PLN", "sign": "zł"},
    {"currencyId": 2, "name": "Euro", "shortName": "EUR", "sign": "€"}
]"#;

const NEXT_PAYMENT: &str = r#"{"paymentId": 13, "status": "UNPROCESSED", "dateOfPayment": "2024-07-10",
    "amount": 43.0, "subscriptionId": 1, "subscriptionTitle": "Netflix"}"#;

fn default_routes(req: &RecordedRequest) -> (u16, String) {
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/api/auth/validateToken") => (200, "true".to_string()),
        ("GET", "/api/subscription") => (200, SUBSCRIPTIONS.to_string()),
        ("GET", "/api/payment") => (200, PAYMENTS.to_string()),
        ("GET", "/api/subscription/4") => (200, CREATED.to_string()),
        ("GET", "/api/currency/") => (200, CURRENCIES.to_string()),
        ("POST", "/api/subscription") => (201, CREATED.to_string()),
        ("DELETE", "/api/subscription/2") => (204, String::new()),
        ("DELETE", _) => (403, String::new()),
        ("PUT", "/api/subscription/3") => (200, String::new()),
        ("POST", "/api/payment/11/process") => (200, NEXT_PAYMENT.to_string()),
        _ => (404, String::new()),
    }
}

fn logged_in(api: &MockApi) -> (TempDir, Dashboard) {
    let dir = tempdir().unwrap();
    let client = client_for(api, &dir);
    client.token_store().save("jwt-abc").unwrap();
    let dashboard = Dashboard::new(client.session().unwrap());
    (dir, dashboard)
}

#[test]
fn refresh_loads_both_snapshots_with_bearer_token() {
    let api = start_mock_api(default_routes);
    let (_dir, mut dashboard) = logged_in(&api);

    dashboard.refresh();

    assert_eq!(dashboard.subscriptions.len(), 3);
    assert_eq!(dashboard.payments.len(), 3);
    assert_eq!(dashboard.message, None);
    assert!(!dashboard.logged_out);

    for path in ["/api/subscription", "/api/payment"] {
        let sent = api.requests_to("GET", path);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("authorization"), Some("Bearer jwt-abc"));
        assert!(sent[0].query_param("t").is_some());
    }
    let validation = api.requests_to("GET", "/api/auth/validateToken");
    assert_eq!(validation[0].query_param("token"), Some("jwt-abc"));

    let overview = dashboard.overview(2024, 4000.0);
    assert_eq!(overview.active_subscriptions, 3);
    assert_eq!(overview.monthly_cost, 43.0 + 10.0 + 99.0);
    assert_eq!(overview.monthly_totals[0].total, 120.0);
    assert_eq!(overview.monthly_totals[4].total, 43.0);
    assert_eq!(overview.monthly_totals[5].total, 43.0);
    assert_eq!(overview.spent_this_year, 206.0);

    let order: Vec<i64> = dashboard
        .sorted_payments()
        .iter()
        .map(|p| p.payment_id)
        .collect();
    assert_eq!(order, vec![11, 10, 12]);
}

#[test]
fn rejected_token_logs_out() {
    let api = start_mock_api(|req| {
        if req.path == "/api/auth/validateToken" {
            (401, String::new())
        } else {
            default_routes(req)
        }
    });
    let (_dir, mut dashboard) = logged_in(&api);

    dashboard.refresh();

    assert!(dashboard.logged_out);
    assert!(!dashboard.session().client().is_logged_in().unwrap());
}

#[test]
fn failed_fetch_only_affects_its_own_snapshot() {
    let api = start_mock_api(|req| {
        if req.path == "/api/subscription" {
            (500, String::new())
        } else {
            default_routes(req)
        }
    });
    let (_dir, mut dashboard) = logged_in(&api);

    dashboard.refresh();

    assert!(dashboard.subscriptions.is_empty());
    assert_eq!(dashboard.payments.len(), 3);
    assert_eq!(dashboard.message.as_deref(), Some(CONNECTION_ERROR));
}

#[test]
fn malformed_body_is_a_connection_error() {
    let api = start_mock_api(|req| {
        if req.path == "/api/payment" {
            (200, "<html>oops</html>".to_string())
        } else {
            default_routes(req)
        }
    });
    let (_dir, mut dashboard) = logged_in(&api);

    dashboard.refresh();

    assert_eq!(dashboard.subscriptions.len(), 3);
    assert!(dashboard.payments.is_empty());
    assert_eq!(dashboard.message.as_deref(), Some(CONNECTION_ERROR));
}

#[test]
fn delete_removes_exactly_that_subscription() {
    let api = start_mock_api(default_routes);
    let (_dir, mut dashboard) = logged_in(&api);
    dashboard.refresh();

    dashboard.delete_subscription(2).unwrap();

    let ids: Vec<i64> = dashboard
        .subscriptions
        .iter()
        .map(|s| s.subscription_id)
        .collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(dashboard.alert, None);
    assert_eq!(api.requests_to("DELETE", "/api/subscription/2").len(), 1);
}

#[test]
fn failed_delete_keeps_the_list_and_alerts() {
    let api = start_mock_api(default_routes);
    let (_dir, mut dashboard) = logged_in(&api);
    dashboard.refresh();
    let before = dashboard.subscriptions.clone();

    let err = dashboard.delete_subscription(3).unwrap_err();

    assert!(matches!(err, SubManagerError::Forbidden));
    assert_eq!(dashboard.subscriptions, before);
    assert!(dashboard
        .alert
        .as_deref()
        .is_some_and(|alert| alert.starts_with("Failed to delete subscription")));
}

#[test]
fn processing_needs_confirmation() {
    let api = start_mock_api(default_routes);
    let (_dir, mut dashboard) = logged_in(&api);
    dashboard.refresh();

    let outcome = dashboard.process_payment(11, |_| false).unwrap();

    assert_eq!(outcome, ProcessOutcome::Declined);
    assert!(api.requests_to("POST", "/api/payment/11/process").is_empty());
    assert_eq!(dashboard.payments[1].status, PaymentStatus::Unprocessed);
}

#[test]
fn processing_marks_paid_and_appends_next_payment() {
    let api = start_mock_api(default_routes);
    let (_dir, mut dashboard) = logged_in(&api);
    dashboard.refresh();

    let outcome = dashboard
        .process_payment(11, |p| p.title_in(&[]) == Some("Netflix"))
        .unwrap();

    match outcome {
        ProcessOutcome::Processed(next) => assert_eq!(next.payment_id, 13),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(dashboard.payments.len(), 4);
    assert!(dashboard
        .payments
        .iter()
        .find(|p| p.payment_id == 11)
        .is_some_and(|p| p.is_processed()));

    let order: Vec<i64> = dashboard
        .sorted_payments()
        .iter()
        .map(|p| p.payment_id)
        .collect();
    assert_eq!(order, vec![13, 11, 10, 12]);

    let sent = api.requests_to("POST", "/api/payment/11/process");
    assert_eq!(sent[0].header("authorization"), Some("Bearer jwt-abc"));
}

#[test]
fn paid_payments_cannot_be_processed_again() {
    let api = start_mock_api(default_routes);
    let (_dir, mut dashboard) = logged_in(&api);
    dashboard.refresh();

    let asked = Arc::new(AtomicBool::new(false));
    let flag = asked.clone();
    let result = dashboard.process_payment(10, move |_| {
        flag.store(true, Ordering::SeqCst);
        true
    });

    assert!(matches!(result, Err(SubManagerError::AlreadyProcessed(10))));
    assert!(!asked.load(Ordering::SeqCst));
    assert!(api.requests_to("POST", "/api/payment/10/process").is_empty());

    assert!(matches!(
        dashboard.process_payment(999, |_| true),
        Err(SubManagerError::NotFound)
    ));
}

#[test]
fn edit_sends_only_editable_fields_then_reloads() {
    let api = start_mock_api(default_routes);
    let (_dir, mut dashboard) = logged_in(&api);
    dashboard.refresh();

    let mut update = SubscriptionUpdate::from_subscription(&dashboard.subscriptions[2]);
    update.price = 109.0;
    dashboard.edit_subscription(3, &update).unwrap();

    let sent = api.requests_to("PUT", "/api/subscription/3");
    assert_eq!(sent.len(), 1);
    let body = sent[0].json();
    assert_eq!(body["title"], "Gym");
    assert_eq!(body["price"], 109.0);
    assert!(body.get("cycle").is_none());
    assert_eq!(api.requests_to("GET", "/api/subscription").len(), 2);
}

#[test]
fn add_posts_the_draft_then_reloads() {
    let api = start_mock_api(default_routes);
    let (_dir, mut dashboard) = logged_in(&api);
    dashboard.refresh();

    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let draft = SubscriptionDraft {
        title: "Spotify".to_string(),
        description: "Music".to_string(),
        price: 23.99,
        cycle: Cycle::Yearly,
        date_of_last_payment: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
        currency_id: 2,
    };

    let created = dashboard.add_subscription(&draft, today).unwrap();

    assert_eq!(created.subscription_id, 4);
    assert_eq!(created.cycle, Cycle::Yearly);
    assert_eq!(
        created.last_payment_date(),
        NaiveDate::from_ymd_opt(2024, 5, 20)
    );
    assert_eq!(dashboard.alert, None);

    let sent = api.requests_to("POST", "/api/subscription");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].header("authorization"), Some("Bearer jwt-abc"));
    let body = sent[0].json();
    assert_eq!(body["title"], "Spotify");
    assert_eq!(body["description"], "Music");
    assert_eq!(body["price"], 23.99);
    assert_eq!(body["cycle"], "YEARLY");
    assert_eq!(body["dateOfLastPayment"], "2024-05-20");
    assert_eq!(body["currencyId"], 2);

    assert_eq!(api.requests_to("GET", "/api/subscription").len(), 2);
    assert_eq!(api.requests_to("GET", "/api/payment").len(), 2);
}

#[test]
fn single_subscription_and_currencies() {
    let api = start_mock_api(default_routes);
    let (_dir, dashboard) = logged_in(&api);
    let session = dashboard.session();

    let sub = session.subscription(4).unwrap();
    assert_eq!(sub.title, "Spotify");
    assert_eq!(sub.currency_id, 2);
    assert_eq!(
        api.requests_to("GET", "/api/subscription/4")[0].header("authorization"),
        Some("Bearer jwt-abc")
    );

    assert!(matches!(session.subscription(99), Err(SubManagerError::NotFound)));

    let currencies = session.currencies().unwrap();
    let short: Vec<&str> = currencies.iter().map(|c| c.short_name.as_str()).collect();
    assert_eq!(short, vec!["PLN", "EUR"]);
    assert_eq!(currencies[0].sign, "zł");
}

#[test]
fn unusual_gateway_status_is_passed_through() {
    let api = start_mock_api(|req| {
        if req.path == "/api/payment" {
            (502, String::new())
        } else {
            default_routes(req)
        }
    });
    let (_dir, dashboard) = logged_in(&api);

    let err = dashboard.session().payments().unwrap_err();

    assert!(matches!(err, SubManagerError::ServerError(502)));
    assert!(err.is_connection_error());
}

#[test]
fn undecodable_dates_only_affect_their_payment() {
    let api = start_mock_api(|req| {
        if req.path == "/api/payment" {
            let body = r#"[
                {"paymentId": 20, "status": "PAID", "dateOfPayment": "2024-03-03", "amount": 43.0,
                 "subscriptionId": 1},
                {"paymentId": 21, "status": "PAID", "dateOfPayment": [2024, 3, 4], "amount": 43.0,
                 "subscriptionId": 1}
            ]"#;
            (200, body.to_string())
        } else {
            default_routes(req)
        }
    });
    let (_dir, mut dashboard) = logged_in(&api);

    dashboard.refresh();

    assert_eq!(dashboard.message, None);
    assert_eq!(dashboard.payments.len(), 2);
    let overview = dashboard.overview(2024, 4000.0);
    assert_eq!(overview.monthly_totals[2].total, 43.0);
    assert_eq!(overview.spent_all_time, 86.0);
}

#[test]
fn invalid_draft_is_rejected_locally() {
    let api = start_mock_api(default_routes);
    let (_dir, mut dashboard) = logged_in(&api);

    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let draft = SubscriptionDraft {
        title: String::new(),
        description: String::new(),
        price: -5.0,
        cycle: Cycle::Monthly,
        date_of_last_payment: today,
        currency_id: 1,
    };

    let err = dashboard.add_subscription(&draft, today).unwrap_err();

    match err {
        SubManagerError::Validation(errors) => {
            assert!(errors.get("title").is_some());
            assert!(errors.get("price").is_some());
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert!(api.requests_to("POST", "/api/subscription").is_empty());
    assert!(dashboard.alert.is_some());
}
