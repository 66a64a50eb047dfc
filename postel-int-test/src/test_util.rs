use postel::errors::{ErrorKind, PostelError, PostelResult};
use postel::topology::{NodeView, TopologyEngine};
use std::backtrace::Backtrace;
use std::time::{Duration, Instant};

/// Runs a test between a setup and a teardown step.
///
/// The teardown also runs when the test body fails, and a panic inside any
/// step is reported together with the elapsed time before it is re-raised.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> PostelResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> PostelResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> PostelResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let elapsed = start_time.elapsed();
    match result {
        Ok(Ok(_)) => {}
        Ok(Err((e, bt))) => {
            eprintln!("\n==================== TEST FAILED ====================");
            eprintln!("Took {:?}", elapsed);
            eprintln!("Error: {}", e);
            if !bt.is_empty() && !bt.contains("disabled") {
                eprintln!("\nBacktrace:\n{}", bt);
            }
            eprintln!("=====================================================\n");
            panic!("{}", e);
        }
        Err(panic_err) => {
            eprintln!("\n========== Test Panicked (took {:?}) ==========", elapsed);
            std::panic::resume_unwind(panic_err);
        }
    }
}

#[derive(Clone)]
pub struct TestContext {
    engine: TopologyEngine,
}

impl TestContext {
    pub fn new(engine: TopologyEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> TopologyEngine {
        self.engine.clone()
    }
}

/// Engine over the default 2048x2048 plane.
pub fn create_test_context() -> PostelResult<TestContext> {
    Ok(TestContext::new(TopologyEngine::builder().build()?))
}

/// Engine over a 100x100 plane.
pub fn create_small_plane_context() -> PostelResult<TestContext> {
    Ok(TestContext::new(
        TopologyEngine::builder().plane_size(100, 100).build()?,
    ))
}

/// Verifies the topology is still consistent, then shuts the engine down.
pub fn cleanup(ctx: TestContext) -> PostelResult<()> {
    let engine = ctx.engine();
    let report = engine.check_integrity();
    if !report.is_valid {
        return Err(PostelError::new(
            &format!("Topology corrupted: {:?}", report.errors),
            ErrorKind::InternalError,
        ));
    }
    engine.shutdown()
}

/// Returns the live node with the smallest Euclidean distance to `(x, y)`.
pub fn brute_force_nearest(nodes: &[NodeView], x: f64, y: f64) -> Option<(NodeView, f64)> {
    nodes
        .iter()
        .map(|node| (*node, (node.x - x).hypot(node.y - y)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

pub fn wait_for<F: Fn() -> bool>(timeout_ms: u64, check: F) {
    awaitility::at_most(Duration::from_millis(timeout_ms)).until(check);
}
