//! End-to-end tests: canned HTTP endpoint -> client -> coordinator

use chrono::TimeZone;
use chrono_tz::Europe::Helsinki;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use unisport_gateway::io::{ApiClient, ErrorKind};
use unisport_gateway::services::RefreshCoordinator;

const PAGE: &str = concat!(
    r#"const locations = {"42": {"location_id":42,"name":"Main Gym","max_capacity":100,"opening_hours":{"1":{"time_start":"07:00","time_end":"24:00"}}}};"#,
    r#"const live_validations = {"42": 15};"#
);

const PAGE_QUIET: &str = concat!(
    r#"const locations = {"42": {"location_id":42,"name":"Main Gym","max_capacity":100,"opening_hours":{"1":{"time_start":"07:00","time_end":"24:00"}}}};"#,
    r#"const live_validations = [];"#
);

/// Serve one canned response per connection, in order, then stop
/// accepting. `Connection: close` keeps the client from pooling, so
/// every request lands on a fresh accept.
async fn spawn_server(responses: Vec<(u16, String)>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status} Canned\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
        }
    });
    addr
}

fn client_for(addr: SocketAddr) -> ApiClient {
    ApiClient::new(
        &format!("http://{addr}/populartimes"),
        Duration::from_secs(10),
    )
    .unwrap()
}

#[tokio::test]
async fn test_end_to_end_snapshot_via_http() {
    let addr = spawn_server(vec![(200, PAGE.to_string())]).await;
    let client = Arc::new(client_for(addr));
    let coordinator = RefreshCoordinator::new(client, Duration::from_secs(300));

    coordinator.refresh().await.unwrap();

    let state = coordinator.current_snapshot().unwrap();
    assert!(!state.stale);
    assert_eq!(state.snapshot.visitor_count(42), 15);

    let location = coordinator.location_by_id(42).unwrap();
    assert_eq!(location.name, "Main Gym");
    assert_eq!(location.max_capacity, 100);

    // Monday 23:30 local time: inside the window extended to midnight
    // by the 24:00 close sentinel (2024-01-01 was a Monday)
    let monday_night = Helsinki.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
    assert_eq!(location.is_open_at(monday_night), Some(true));
}

#[tokio::test]
async fn test_empty_live_validations_over_http() {
    let addr = spawn_server(vec![(200, PAGE_QUIET.to_string())]).await;
    let client = client_for(addr);

    let snapshot = client.fetch_snapshot().await.unwrap();
    assert!(snapshot.live_validations.is_empty());
    assert_eq!(snapshot.visitor_count(42), 0);
    assert!(snapshot.location(42).is_some());
}

#[tokio::test]
async fn test_forbidden_maps_to_authentication_error() {
    let addr = spawn_server(vec![(403, "denied".to_string())]).await;
    let client = client_for(addr);

    let err = client.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_error() {
    let addr = spawn_server(vec![(401, "who are you".to_string())]).await;
    let client = client_for(addr);

    let err = client.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn test_server_error_maps_to_communication_error() {
    let addr = spawn_server(vec![(500, "oops".to_string())]).await;
    let client = client_for(addr);

    let err = client.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Communication);
}

#[tokio::test]
async fn test_garbage_body_maps_to_parse_error() {
    let addr = spawn_server(vec![(200, "<html>maintenance</html>".to_string())]).await;
    let client = client_for(addr);

    let err = client.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_communication_error() {
    // Bind then drop so the port is known-dead
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr);
    let err = client.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Communication);
}

#[tokio::test]
async fn test_stalled_server_times_out_as_communication_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf).await;
        // Hold the connection open without ever answering
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let client = ApiClient::new(
        &format!("http://{addr}/populartimes"),
        Duration::from_millis(200),
    )
    .unwrap();

    let err = client.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Communication);
}

#[tokio::test]
async fn test_refresh_failure_marks_snapshot_stale_end_to_end() {
    let addr = spawn_server(vec![
        (200, PAGE.to_string()),
        (500, "oops".to_string()),
        (200, PAGE.to_string()),
    ])
    .await;
    let client = Arc::new(client_for(addr));
    let coordinator = RefreshCoordinator::new(client, Duration::from_secs(300));

    coordinator.refresh().await.unwrap();
    assert!(!coordinator.current_snapshot().unwrap().stale);

    assert_eq!(coordinator.refresh().await, Err(ErrorKind::Communication));
    let state = coordinator.current_snapshot().unwrap();
    assert!(state.stale);
    assert_eq!(state.snapshot.visitor_count(42), 15);
    assert_eq!(coordinator.last_error(), Some(ErrorKind::Communication));

    coordinator.refresh().await.unwrap();
    assert!(!coordinator.current_snapshot().unwrap().stale);
    assert_eq!(coordinator.last_error(), None);
}
