//! Chain registry-resolved skills into a fail-fast pipeline.

use std::sync::Arc;

use serde_json::json;
use skillbox::prelude::*;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let registry = Arc::new(SkillRegistry::new());
    register_builtin(&registry).await.expect("fresh registry");
    println!("registered skills: {:?}", registry.skill_names().await);

    // Evaluate an expression, then feed the result into a second evaluation
    // via a parameter mapper.
    let pipeline = SkillPipeline::with_registry("calc", Arc::clone(&registry))
        .add_step("math", "evaluate")
        .add_mapped_step("math", "evaluate", |prev, _initial| {
            let result = prev.get("result").cloned().unwrap_or(json!(0));
            params_from(json!({"expression": format!("sqrt({result}) * 10")}))
        });

    let result = pipeline
        .execute(params_from(json!({"expression": "2 ** 4"})))
        .await;

    println!("success: {}", result.success);
    for step in &result.steps {
        println!(
            "  step {} ({}/{}): {:?}",
            step.index, step.skill, step.action, step.response.result
        );
    }
    println!("final result: {:?}", result.final_result);
    println!(
        "total: {:.2}ms over {} steps",
        result.metadata.total_execution_time_ms, result.metadata.steps_executed
    );

    // A failing step aborts the remainder deterministically.
    let failing = SkillPipeline::with_registry("failing", registry)
        .add_step("math", "evaluate")
        .add_step("math", "no_such_action");

    let result = failing
        .execute(params_from(json!({"expression": "1 + 1"})))
        .await;
    println!(
        "failing pipeline: success={} failed_step={:?} error={}",
        result.success,
        result.failed_step,
        result.error.map(|e| e.to_string()).unwrap_or_default(),
    );
}
