//! Run the text analyzer skill directly through the execution envelope.

use serde_json::json;
use skillbox::prelude::*;
use skillbox::skills::TextAnalyzerSkill;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let skill = TextAnalyzerSkill::new();

    // Text statistics
    let response = skill
        .execute(
            SkillRequest::new("text_stats").with_parameters(params_from(json!({
                "text": "Hello world! This is an example. Skills are composable."
            }))),
        )
        .await;
    println!("stats: {:#?}", response.result);
    println!("took {:.2}ms", response.metadata.execution_time_ms);

    // Sentiment
    let response = skill
        .execute(
            SkillRequest::new("text_sentiment").with_parameters(params_from(json!({
                "text": "I love this, it is great and awesome"
            }))),
        )
        .await;
    println!("sentiment: {:#?}", response.result);

    // Pattern detection
    let response = skill
        .execute(
            SkillRequest::new("text_patterns").with_parameters(params_from(json!({
                "text": "Reach support@example.com or https://example.com, call 555-123-4567."
            }))),
        )
        .await;
    println!("patterns: {:#?}", response.result);

    // Error handling: the envelope never panics or throws.
    let response = skill.execute(SkillRequest::new("text_stats")).await;
    println!("missing parameter -> error: {:?}", response.error);

    // Capability metadata
    println!("descriptor: {:#?}", skill.describe());
}
