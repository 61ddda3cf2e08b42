use std::env;
use std::sync::Once;
use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{Point3, SwcNode, SwcType};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Straight chain of `n` nodes along x with unit spacing, ids `1..=n`.
pub fn chain(n: usize) -> Vec<SwcNode> {
    (1..=n as i64)
        .map(|i| {
            SwcNode::new(i, Point3::new((i - 1) as f64, 0.0, 0.0), (i > 1).then_some(i - 1))
                .with_kind(SwcType::Axon)
        })
        .collect()
}

/// Root at the origin with one child per distance, spread over the axes.
pub fn star(distances: &[f64]) -> Vec<SwcNode> {
    let mut nodes = vec![SwcNode::new(1, Point3::default(), None).with_kind(SwcType::Soma)];
    for (i, &d) in distances.iter().enumerate() {
        let position = match i % 3 {
            0 => Point3::new(d, 0.0, 0.0),
            1 => Point3::new(0.0, d, 0.0),
            _ => Point3::new(0.0, 0.0, d),
        };
        nodes.push(SwcNode::new(i as i64 + 2, position, Some(1)).with_kind(SwcType::Dendrite));
    }
    nodes
}
