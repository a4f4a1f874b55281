//! End-to-end tests for the statistics endpoint

mod common;

use common::{TestClient, TestServer};
use reqwest::StatusCode;
use serde_json::Value;

fn status_counts(body: &Value) -> Vec<(String, u64)> {
    let mut counts: Vec<(String, u64)> = body["data"]["statusStats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| {
            (
                s["status"].as_str().unwrap().to_string(),
                s["count"].as_u64().unwrap(),
            )
        })
        .collect();
    counts.sort();
    counts
}

fn monthly_counts(body: &Value) -> Vec<(i64, u64, u64)> {
    body["data"]["monthlyStats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| {
            (
                m["year"].as_i64().unwrap(),
                m["month"].as_u64().unwrap(),
                m["count"].as_u64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_stats_on_empty_store() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.job_stats().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(status_counts(&body).is_empty());
    assert!(monthly_counts(&body).is_empty());
}

#[tokio::test]
async fn test_stats_group_by_status_and_month() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    for (status, date) in [
        ("Applied", "2024-01-05"),
        ("Applied", "2024-01-25"),
        ("Interview", "2024-02-14"),
        ("Rejected", "2023-12-31"),
        ("Applied", "2024-02-01"),
    ] {
        client.create_job_ok("Acme", "Engineer", status, date).await;
    }

    let body: Value = client.job_stats().await.json().await.unwrap();
    assert_eq!(
        status_counts(&body),
        vec![
            ("Applied".to_string(), 3),
            ("Interview".to_string(), 1),
            ("Rejected".to_string(), 1),
        ]
    );
    assert_eq!(
        monthly_counts(&body),
        vec![(2024, 2, 2), (2024, 1, 2), (2023, 12, 1)]
    );
}

#[tokio::test]
async fn test_monthly_stats_keep_only_recent_buckets() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    for month in 1..=8 {
        client
            .create_job_ok("Acme", "Engineer", "Applied", &format!("2024-{:02}-10", month))
            .await;
    }

    let body: Value = client.job_stats().await.json().await.unwrap();
    let months: Vec<u64> = monthly_counts(&body).iter().map(|m| m.1).collect();
    assert_eq!(months, vec![8, 7, 6, 5, 4, 3]);
}
