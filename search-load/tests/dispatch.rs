use std::sync::Arc;
use std::time::Duration;

use http_test_util::stub::{closed_port, SearchStub};
use hyper::StatusCode;
use search_load::client::HttpClient;
use search_load::executor::{self, RequestOutcome};
use search_load::{
    DispatchBatch, Dispatcher, LoadConfig, RequestError, SearchField, SearchRequest, SearchTarget,
};

fn config_for(host: String, port: u16) -> LoadConfig {
    LoadConfig {
        target: SearchTarget::new(host, port),
        round_delay: Duration::from_millis(10),
        request_timeout: Some(Duration::from_secs(10)),
        ..LoadConfig::default()
    }
}

fn requests(terms: &[(SearchField, &str)]) -> Vec<SearchRequest> {
    terms
        .iter()
        .map(|(field, query)| SearchRequest::new(*field, *query).unwrap())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn launches_replication_times_requests_and_joins_all() {
    let stub = SearchStub::spawn().await.unwrap();
    let config = config_for(stub.host(), stub.port());
    let dispatcher = Dispatcher::new(HttpClient::new(), &config);
    let set = requests(&[
        (SearchField::Artist, "Queen"),
        (SearchField::Album, "Jazz"),
        (SearchField::Artist, "Riblja Čorba"),
    ]);

    for replication in [1, 3, 7] {
        let before = stub.hits().len();
        let report = dispatcher.dispatch(&set, replication).await;
        assert_eq!(report.launched, replication * set.len());
        assert_eq!(report.outcomes.len(), replication * set.len());
        assert!(report.outcomes.iter().all(|o| o.is_success()));
        // Every request reached the server before the round returned.
        assert_eq!(stub.hits().len() - before, replication * set.len());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn server_receives_the_exact_unescaped_term() {
    let stub = SearchStub::spawn().await.unwrap();
    let config = config_for(stub.host(), stub.port());
    let dispatcher = Dispatcher::new(HttpClient::new(), &config);
    let set = requests(&[
        (SearchField::Album, "A Night at the Opera"),
        (SearchField::Artist, "say \"cheese\" #1 100%"),
    ]);

    let report = dispatcher.dispatch(&set, 1).await;
    assert!(report.outcomes.iter().all(|o| o.is_success()));
    let mut hits = stub.hits();
    hits.sort();
    assert_eq!(
        hits,
        vec![
            "album:\"A Night at the Opera\"".to_owned(),
            "artist:\"say \"cheese\" #1 100%\"".to_owned(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn error_status_is_isolated_to_its_own_task() {
    let stub = SearchStub::builder()
        .fail_query("artist:\"Nobody\"", StatusCode::INTERNAL_SERVER_ERROR)
        .spawn()
        .await
        .unwrap();
    let config = config_for(stub.host(), stub.port());
    let dispatcher = Dispatcher::new(HttpClient::new(), &config);
    let set = requests(&[
        (SearchField::Artist, "Nobody"),
        (SearchField::Artist, "Queen"),
    ]);

    let report = dispatcher.dispatch(&set, 4).await;
    assert_eq!(report.outcomes.len(), 8);
    for outcome in &report.outcomes {
        match (outcome.request.query(), &outcome.result) {
            ("Queen", Ok(body)) => assert_eq!(body, "results for artist:\"Queen\""),
            ("Nobody", Err(RequestError::Status { status, body })) => {
                assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "no results for artist:\"Nobody\"");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transport_failures_sit_next_to_successes_in_one_round() {
    let stub = SearchStub::builder()
        .delay_query("artist:\"Stalled\"", Duration::from_secs(5))
        .break_query("album:\"Broken\"")
        .spawn()
        .await
        .unwrap();
    let config = LoadConfig {
        request_timeout: Some(Duration::from_millis(300)),
        ..config_for(stub.host(), stub.port())
    };
    let dispatcher = Dispatcher::new(HttpClient::new(), &config);
    let set = requests(&[
        (SearchField::Artist, "Stalled"),
        (SearchField::Album, "Broken"),
        (SearchField::Artist, "Queen"),
    ]);

    let report = dispatcher.dispatch(&set, 3).await;
    assert_eq!(report.launched, 9);
    assert_eq!(report.outcomes.len(), 9);
    let mut ok = 0;
    for outcome in &report.outcomes {
        match (outcome.request.query(), &outcome.result) {
            ("Queen", Ok(body)) => {
                assert_eq!(body, "results for artist:\"Queen\"");
                ok += 1;
            }
            ("Stalled", Err(RequestError::Timeout(limit))) => {
                assert_eq!(*limit, Duration::from_millis(300));
            }
            ("Broken", Err(err @ RequestError::Transport(_))) => assert!(err.is_transport()),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(ok, 3);
}

async fn exploding_search() -> RequestOutcome {
    panic!("search task exploded")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn panicked_task_is_still_counted_at_the_barrier() {
    let stub = SearchStub::spawn().await.unwrap();
    let target = Arc::new(SearchTarget::new(stub.host(), stub.port()));
    let doomed = SearchRequest::new(SearchField::Album, "Jazz").unwrap();
    let healthy = SearchRequest::new(SearchField::Artist, "Queen").unwrap();

    let mut batch = DispatchBatch::with_capacity(target.clone(), 2);
    batch.launch(doomed.clone(), exploding_search());
    let client = HttpClient::new();
    let task_target = target.clone();
    let task_request = healthy.clone();
    batch.launch(healthy.clone(), async move {
        executor::execute(&client, &task_target, task_request, None).await
    });
    assert_eq!(batch.launched(), 2);

    let outcomes = batch.join().await;
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].request, doomed);
    assert!(matches!(outcomes[0].result, Err(RequestError::Aborted(_))));
    assert_eq!(
        outcomes[0].url,
        format!("http://{}:{}/?q=album:\"Jazz\"", stub.host(), stub.port())
    );
    assert_eq!(outcomes[1].request, healthy);
    assert!(outcomes[1].is_success());
    assert_eq!(stub.hits(), vec!["artist:\"Queen\"".to_owned()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unreachable_endpoint_fails_every_task_without_aborting_the_round() {
    let port = closed_port().await.unwrap();
    let config = config_for("127.0.0.1".to_owned(), port);
    let dispatcher = Dispatcher::new(HttpClient::new(), &config);
    let set = requests(&[(SearchField::Album, "Innuendo")]);

    let report = dispatcher.dispatch(&set, 5).await;
    assert_eq!(report.launched, 5);
    assert_eq!(report.outcomes.len(), 5);
    for outcome in &report.outcomes {
        let err = outcome.result.as_ref().unwrap_err();
        assert!(err.is_transport(), "{err}");
    }
    let stats = report.statistics();
    assert_eq!((stats.succeeded, stats.failed), (0, 5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_server_times_out_per_request() {
    let stub = SearchStub::builder()
        .latency(Duration::from_millis(500))
        .spawn()
        .await
        .unwrap();
    let config = LoadConfig {
        request_timeout: Some(Duration::from_millis(50)),
        ..config_for(stub.host(), stub.port())
    };
    let dispatcher = Dispatcher::new(HttpClient::new(), &config);
    let set = requests(&[(SearchField::Artist, "Queen")]);

    let report = dispatcher.dispatch(&set, 3).await;
    assert_eq!(report.outcomes.len(), 3);
    assert!(report
        .outcomes
        .iter()
        .all(|o| matches!(o.result, Err(RequestError::Timeout(_)))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unbounded_round_overlaps_requests() {
    let stub = SearchStub::builder()
        .latency(Duration::from_millis(200))
        .spawn()
        .await
        .unwrap();
    let config = config_for(stub.host(), stub.port());
    let dispatcher = Dispatcher::new(HttpClient::new(), &config);
    let set = requests(&[(SearchField::Artist, "Queen")]);

    let report = dispatcher.dispatch(&set, 10).await;
    assert_eq!(report.outcomes.len(), 10);
    // Every task was in flight at the same time.
    assert_eq!(stub.peak_in_flight(), 10);
    // Serialized, ten requests would need at least two seconds.
    assert!(report.elapsed() < Duration::from_secs(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bounded_round_respects_the_limit_and_still_completes() {
    let stub = SearchStub::builder()
        .latency(Duration::from_millis(30))
        .spawn()
        .await
        .unwrap();
    let config = LoadConfig {
        max_in_flight: Some(2),
        ..config_for(stub.host(), stub.port())
    };
    let dispatcher = Dispatcher::new(HttpClient::new(), &config);
    let set = requests(&[(SearchField::Album, "Jazz"), (SearchField::Artist, "Queen")]);

    let report = dispatcher.dispatch(&set, 6).await;
    assert_eq!(report.launched, 12);
    assert_eq!(report.outcomes.len(), 12);
    assert!(report.outcomes.iter().all(|o| o.is_success()));
    assert!(stub.peak_in_flight() <= 2, "peak {}", stub.peak_in_flight());
}
