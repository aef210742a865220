//! Walks through the client against a JSON placeholder service.
//!
//! Configuration comes from `REST_*` variables (see `ClientConfig::from_env`);
//! without `REST_BASE_URL` the public jsonplaceholder service is used.
//! Logging follows `RUST_LOG`.

use rest_core::{ClientConfig, Params, RestClient, RestError};
use tracing_subscriber::EnvFilter;

const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

fn main() -> Result<(), RestError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(RestError::Config(reason)) if std::env::var_os("REST_BASE_URL").is_none() => {
            tracing::debug!(%reason, "falling back to default base URL");
            ClientConfig::builder(DEFAULT_BASE_URL).build()?
        }
        Err(err) => return Err(err),
    };
    let client = RestClient::new(config)?;

    let resp = client.get("posts", "1", None, "application/json")?;
    println!("GET posts/1 -> {}\n{}", resp.status, resp.text());

    let mut params = Params::new();
    params.set("title", "My Title").set("body", "My Body").set("userId", "1");
    let resp = client.post("posts", "", Some(&params), "application/json")?;
    println!("POST posts -> {}\n{}", resp.status, resp.text());

    let mut params = Params::new();
    params
        .set("title", "Updated Title")
        .set("body", "Updated Body")
        .set("userId", "1");
    let resp = client.put("posts", "1", Some(&params), "application/json")?;
    println!("PUT posts/1 -> {}\n{}", resp.status, resp.text());

    let resp = client.delete("posts", "1", None, "application/json")?;
    println!("DELETE posts/1 -> {}\n{}", resp.status, resp.text());

    let resp = client.get("photos", "1", None, "application/json")?;
    println!("GET photos/1 -> {}\n{}", resp.status, resp.text());

    Ok(())
}
