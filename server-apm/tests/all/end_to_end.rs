use http::StatusCode;
use server_apm::{config_notice_error_enabled, config_status_code_ignored, ApmMiddleware};
use server_middleware::{AppBuilder, Handler};

use crate::helpers::*;

async fn serve<H: Handler>(agent: &RecordingAgent, handler: H) -> String {
    let app = AppBuilder::new(handler)
        .with(ApmMiddleware::new(
            Some(agent.clone()),
            [
                config_notice_error_enabled(true),
                config_status_code_ignored([404]),
            ],
        ))
        .build();

    let server = SimpleServer::bind(app).await.unwrap();
    let uri = server.uri();
    server.start();
    uri
}

#[tokio::test]
async fn monitors_requests_served_over_http() {
    let agent = RecordingAgent::default();
    let uri = serve(&agent, WithSegment("render")).await;

    let res = reqwest::Client::new()
        .get(format!("{}/reports/monthly?year=2024", uri))
        .header("user-agent", "e2e")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let transaction = agent.only();
    assert_eq!(transaction.name, "GET /reports/monthly");

    let state = transaction.state();
    let web_request = state.web_request.expect("web request attached");
    assert_eq!(web_request.host, uri.trim_start_matches("http://"));
    assert_eq!(web_request.url.path, "/reports/monthly");
    assert_eq!(web_request.url.raw_query, "year=2024");
    assert_eq!(web_request.user_agent(), Some("e2e"));
    assert_eq!(state.segments, ["render"]);
    assert_eq!(state.status, Some(StatusCode::OK));
    assert_eq!(state.ends, 1);
}

#[tokio::test]
async fn clients_receive_the_error_the_handler_returned() {
    let agent = RecordingAgent::default();
    let uri = serve(&agent, FailWith(StatusCode::NOT_FOUND)).await;

    let res = reqwest::get(format!("{}/missing", uri)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "handler failed");

    let state = agent.only().state();
    assert_eq!(state.status, Some(StatusCode::NOT_FOUND));
    assert!(state.errors.is_empty());
    assert_eq!(state.ends, 1);
}

#[tokio::test]
async fn unhandled_errors_become_500_responses() {
    let agent = RecordingAgent::default();
    let uri = serve(&agent, FailOpaque).await;

    let res = reqwest::get(format!("{}/", uri)).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let state = agent.only().state();
    assert_eq!(state.status, Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(state.errors, ["Middleware error: database unreachable"]);
}
