// Score a soil sample (or a whole farm) from a JSON request
//
// Usage:
//   score_sample [request.json]          soil assessment report
//   score_sample --farm [context.json]   farm viability, lending risk and loan terms
// Reads stdin when no path is given.

use anyhow::{Context, Result};
use soil_scorer_rust::{FarmContext, ScoringConfig, ScoringEngine, SoilAssessmentRequest};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soil_scorer_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Configuration from environment variables
    let config = match std::env::var("SCORER_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading config: {}", path);
            ScoringConfig::load(&PathBuf::from(path))?
        }
        Err(_) => ScoringConfig::default(),
    };

    let base_premium: f64 = std::env::var("SCORER_BASE_PREMIUM")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(100.0);

    let mut args = std::env::args().skip(1).peekable();
    let farm_mode = args.peek().is_some_and(|a| a == "--farm");
    if farm_mode {
        args.next();
    }
    let input = read_input(args.next())?;

    let engine = ScoringEngine::new(config).context("Invalid scoring configuration")?;
    #[cfg(feature = "cache")]
    let engine = engine.with_recommendation_cache(Arc::new(
        soil_scorer_rust::recommendation::MokaRecommendationCache::default(),
    ));
    #[cfg(not(feature = "cache"))]
    let engine = engine.with_recommendation_cache(Arc::new(soil_scorer_rust::recommendation::NoopCache));

    let output = if farm_mode {
        let context: FarmContext = serde_json::from_str(&input).context("Failed to parse farm context")?;
        let viability = engine.score_farm_viability(&context)?;
        let loan = engine.loan_eligibility(&context)?;
        let risk = engine.assess_risk(&context)?;
        let quick = engine.quick_viability(&context)?;
        serde_json::to_string_pretty(&serde_json::json!({
            "viability": viability,
            "quick_viability": quick,
            "risk": risk,
            "loan": loan,
        }))?
    } else {
        let mut request: SoilAssessmentRequest =
            serde_json::from_str(&input).context("Failed to parse assessment request")?;
        request.base_premium.get_or_insert(base_premium);
        let report = engine.assess(&request)?;
        serde_json::to_string_pretty(&report)?
    };

    println!("{}", output);
    Ok(())
}

fn read_input(path: Option<String>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("Failed to read request: {}", path)),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read request from stdin")?;
            Ok(buffer)
        }
    }
}
