#!/usr/bin/env cargo
//! API Client Demo
//!
//! This example demonstrates how to interact with the ApiScope dashboard
//! API from a Rust client application. Run with:
//!
//! ```
//! cargo run --example api_client
//! ```

use reqwest::Client;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("📡 ApiScope API Client Demo");
    println!("===========================\n");

    let client = Client::new();
    let base_url = "http://localhost:8080";

    // Test health endpoint
    println!("🏥 Testing health endpoint...");
    match fetch_json(&client, &format!("{}/api/health", base_url)).await {
        Ok(response) => println!("✅ Health check: {}\n", response),
        Err(e) => {
            println!("❌ Health check failed: {}", e);
            println!("💡 Make sure the server is running: cargo run\n");
            return Err(e);
        }
    }

    // List the monitored projects
    println!("📁 Listing projects...");
    let projects = fetch_json(&client, &format!("{}/api/projects", base_url)).await?;
    let projects = projects.as_array().cloned().unwrap_or_default();
    for project in &projects {
        println!(
            "   {} - {} ({} logged requests)",
            project["id"], project["name"], project["requestLogCount"]
        );
    }
    println!();

    let Some(project) = projects.first() else {
        println!("No projects available, nothing more to show.");
        return Ok(());
    };
    let project_id = project["id"].as_str().unwrap_or("1");

    // Show the grouped endpoints for the first project
    println!("🔬 Grouped endpoints for project {}...", project_id);
    let url = format!("{}/api/projects/{}/endpoints?limit=50", base_url, project_id);
    let page = fetch_json(&client, &url).await?;
    if let Some(endpoints) = page["endpoints"].as_array() {
        for endpoint in endpoints {
            println!(
                "   {:6} {:42} {:>6} reqs  {:>7}  {:>6} errors  ({})",
                endpoint["method"].as_str().unwrap_or("?"),
                endpoint["normalizedPath"].as_str().unwrap_or("?"),
                endpoint["display"]["requestCount"].as_str().unwrap_or("?"),
                endpoint["display"]["avgResponseTime"].as_str().unwrap_or("?"),
                endpoint["display"]["errorRate"].as_str().unwrap_or("?"),
                endpoint["display"]["lastRequest"].as_str().unwrap_or("?"),
            );
        }
    }
    println!();

    // Pull the cross-project analytics
    println!("📊 Analytics summary...");
    let analytics = fetch_json(&client, &format!("{}/api/analytics", base_url)).await?;
    println!(
        "   KPIs: {} total requests, {:.0}ms average latency",
        analytics["kpis"]["totalRequests"],
        analytics["kpis"]["avgLatency"].as_f64().unwrap_or(0.0)
    );
    if let Some(slowest) = analytics["topSlowestEndpoints"].as_array() {
        println!("   Slowest endpoints:");
        for row in slowest {
            println!(
                "     {:.0}ms  {} {}  [{}]",
                row["avgLatency"].as_f64().unwrap_or(0.0),
                row["method"].as_str().unwrap_or("?"),
                row["endpoint"].as_str().unwrap_or("?"),
                row["projectName"].as_str().unwrap_or("?"),
            );
        }
    }

    println!("\n🎯 Demo complete!");
    println!("💡 Try the filters yourself:");
    println!("   curl '{}/api/projects/1/endpoints?status=error'", base_url);
    println!("   curl '{}/api/projects/1/requests?statusCode=4xx'", base_url);

    Ok(())
}

async fn fetch_json(client: &Client, url: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(format!(
            "HTTP {}: {}",
            response.status(),
            response.status().canonical_reason().unwrap_or("Unknown")
        )
        .into());
    }

    Ok(response.json().await?)
}
