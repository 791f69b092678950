use secrecy::SecretString;
use strava_client::http_client::ReqwestStravaClient;
use strava_client::{Config, Credentials, StravaError};
use strava_export::{ExportError, ExportOptions};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestStravaClient {
    let mut cfg = Config::new(Credentials {
        client_id: "4242".into(),
        client_secret: SecretString::new("shh".into()),
        refresh_token: SecretString::new("rt".into()),
    });
    cfg.base_url = server.uri();
    ReqwestStravaClient::new(cfg).expect("client")
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "at", "refresh_token": "rt"})),
        )
        .mount(server)
        .await;
}

async fn mount_activities(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(header("authorization", "Bearer at"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn options(dir: &tempfile::TempDir) -> ExportOptions {
    ExportOptions {
        output: dir.path().join("output.csv"),
        ..ExportOptions::default()
    }
}

#[tokio::test]
async fn exports_only_matching_runs() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_activities(
        &server,
        serde_json::json!([
            {"name": "Maheu #31", "distance": 5800, "moving_time": 1742, "start_date_local": "2020-07-12T08:15:00Z"},
            {"name": "Easy Jog", "distance": 4000, "moving_time": 1200, "start_date_local": "2020-07-10T07:00:00Z"}
        ]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let summary = strava_export::run(&client_for(&server), &opts)
        .await
        .expect("export");

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.matched, 1);
    let written = std::fs::read_to_string(&opts.output).unwrap();
    assert_eq!(written, "Maheu #31,5.8,05:00,2020-07-12\r\n");
}

#[tokio::test]
async fn non_matching_records_may_lack_numeric_fields() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_activities(
        &server,
        serde_json::json!([
            {"name": "Yoga"},
            {"name": "maheu_trail", "distance": 5000, "moving_time": 1800, "start_date_local": "2021-05-01T18:00:00-04:00"}
        ]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    strava_export::run(&client_for(&server), &opts)
        .await
        .expect("export");
    let written = std::fs::read_to_string(&opts.output).unwrap();
    assert_eq!(written, "maheu_trail,5.0,06:00,2021-05-01\r\n");
}

#[tokio::test]
async fn matched_record_missing_field_aborts_without_output() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_activities(
        &server,
        serde_json::json!([{"name": "Maheu", "moving_time": 1800, "start_date_local": "2021-05-01T08:00:00Z"}]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let err = strava_export::run(&client_for(&server), &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::MissingField { field: "distance", .. }), "got {err:?}");
    assert!(!opts.output.exists());
}

#[tokio::test]
async fn full_page_of_activities_is_exported() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let items: Vec<serde_json::Value> = (0..100)
        .map(|i| {
            serde_json::json!({
                "name": format!("Maheu #{i}"),
                "distance": 5000,
                "moving_time": 1500,
                "start_date_local": "2020-07-12T08:15:00Z"
            })
        })
        .collect();
    mount_activities(&server, serde_json::Value::Array(items)).await;

    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let summary = strava_export::run(&client_for(&server), &opts)
        .await
        .expect("export");
    assert_eq!(summary.matched, 100);
    let written = std::fs::read_to_string(&opts.output).unwrap();
    assert_eq!(written.lines().count(), 100);
    assert!(written.starts_with("Maheu #0,5.0,05:00,2020-07-12\r\n"));
}

#[tokio::test]
async fn oversized_page_halts_before_writing() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let items: Vec<serde_json::Value> = (0..101)
        .map(|i| serde_json::json!({"name": format!("Maheu #{i}")}))
        .collect();
    mount_activities(&server, serde_json::Value::Array(items)).await;

    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    std::fs::write(&opts.output, "previous export\r\n").unwrap();

    let err = strava_export::run(&client_for(&server), &opts)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ExportError::Strava(StravaError::PagingRequired { received: 101, .. })
        ),
        "got {err:?}"
    );
    assert_eq!(
        std::fs::read_to_string(&opts.output).unwrap(),
        "previous export\r\n"
    );
}

#[tokio::test]
async fn token_failure_stops_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Authorization Error"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let err = strava_export::run(&client_for(&server), &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Strava(StravaError::Auth(_))));
    assert!(!opts.output.exists());
}

#[tokio::test]
async fn all_pages_follows_paging() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "Maheu A", "distance": 5000, "moving_time": 1800, "start_date_local": "2020-01-02T07:00:00Z"},
            {"name": "Tempo", "distance": 8000, "moving_time": 2400, "start_date_local": "2020-01-01T07:00:00Z"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "maheu B", "distance": 4000, "moving_time": 1200, "start_date_local": "2019-12-30T07:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let opts = ExportOptions {
        per_page: 2,
        all_pages: true,
        ..options(&dir)
    };
    let summary = strava_export::run(&client_for(&server), &opts)
        .await
        .expect("export");
    assert_eq!(summary.fetched, 3);
    assert_eq!(
        std::fs::read_to_string(&opts.output).unwrap(),
        "Maheu A,5.0,06:00,2020-01-02\r\nmaheu B,4.0,05:00,2019-12-30\r\n"
    );
}
