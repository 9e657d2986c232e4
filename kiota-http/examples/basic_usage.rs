//! Basic usage example: a hand-written request builder for a registry API.
//!
//! Run with: `cargo run --example basic_usage`
//!
//! Requires a registry service running on localhost:8080.

use std::time::Duration;

use kiota_http::core::{
    FieldDeserializers, KiotaError, Parsable, ParseNode, Result, SerializationWriter,
};
use kiota_http::{
    AdapterConfig, AnonymousAuthenticationProvider, ErrorMappings, HttpMethod, HttpRequestAdapter,
    RequestInformation,
};

#[derive(Debug, Default)]
struct Group {
    group_id: Option<String>,
    description: Option<String>,
}

impl Parsable for Group {
    fn field_deserializers(&self) -> FieldDeserializers<Self> {
        FieldDeserializers::new()
            .with("groupId", |g: &mut Group, n| {
                g.group_id = n.get_string_value();
                Ok(())
            })
            .with("description", |g: &mut Group, n| {
                g.description = n.get_string_value();
                Ok(())
            })
    }

    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
        writer.write_string_value(Some("groupId"), self.group_id.as_deref())?;
        writer.write_string_value(Some("description"), self.description.as_deref())
    }
}

#[derive(Debug, Default)]
struct Problem {
    title: Option<String>,
    detail: Option<String>,
}

impl Parsable for Problem {
    fn field_deserializers(&self) -> FieldDeserializers<Self> {
        FieldDeserializers::new()
            .with("title", |p: &mut Problem, n| {
                p.title = n.get_string_value();
                Ok(())
            })
            .with("detail", |p: &mut Problem, n| {
                p.detail = n.get_string_value();
                Ok(())
            })
    }

    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
        writer.write_string_value(Some("title"), self.title.as_deref())?;
        writer.write_string_value(Some("detail"), self.detail.as_deref())
    }
}

fn create<T: Default>(_: &dyn ParseNode) -> Result<T> {
    Ok(T::default())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Registry Client Basic Usage Example ===\n");

    let config = AdapterConfig::builder()
        .base_url("http://localhost:8080/apis/registry/v2")
        .timeout(Duration::from_secs(10))
        .build()?;
    let adapter = HttpRequestAdapter::from_config(&config, AnonymousAuthenticationProvider)?;
    let errors = ErrorMappings::new()
        .with("4XX", create::<Problem>)
        .with("5XX", create::<Problem>);

    // ========== Create ==========
    println!("--- Creating a group ---\n");

    let group = Group {
        group_id: Some("example-group".to_string()),
        description: Some("created by the basic usage example".to_string()),
    };
    let mut request = RequestInformation::new(HttpMethod::Post, "{+baseurl}/groups")
        .header("Accept", "application/json");
    request.set_content_from_parsable(adapter.registry(), "application/json", &group)?;
    adapter.send_no_content(request, Some(&errors)).await?;
    println!("Group created\n");

    // ========== Read ==========
    println!("--- Reading it back ---\n");

    let request = RequestInformation::new(HttpMethod::Get, "{+baseurl}/groups/{groupId}")
        .path_parameter("groupId", "example-group")
        .header("Accept", "application/json");
    match adapter.send(request, Some(&errors), create::<Group>).await? {
        Some(g) => println!("  {:?} -> {:?}", g.group_id, g.description),
        None => println!("  (empty response)"),
    }

    // ========== Errors ==========
    println!("\n--- Requesting a missing group ---\n");

    let request = RequestInformation::new(HttpMethod::Get, "{+baseurl}/groups/{groupId}")
        .path_parameter("groupId", "does-not-exist");
    match adapter.send(request, Some(&errors), create::<Group>).await {
        Err(KiotaError::Api(api)) => {
            println!("  status {}: {}", api.status_code(), api.message());
            if let Some(problem) = api.body_as::<Problem>() {
                println!("  title: {:?}", problem.title);
            }
        }
        other => println!("  unexpected: {other:?}"),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
