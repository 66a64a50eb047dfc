use postel::errors::PostelResult;
use postel::topology::{NodeId, TopologyEngine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> PostelResult<()> {
    println!("Starting stress test...");
    let engine = TopologyEngine::builder().plane_size(2048, 2048).build()?;
    let mut rng = StdRng::seed_from_u64(2048);

    let count = 100_000;
    let start = std::time::Instant::now();
    let mut ids: Vec<NodeId> = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(engine.add(rng.gen_range(0.0..2048.0), rng.gen_range(0.0..2048.0))?);
    }
    println!("Added {} nodes in {:?}", count, start.elapsed());

    let queries = 100_000;
    let start = std::time::Instant::now();
    for _ in 0..queries {
        engine.nearest(rng.gen_range(0.0..2048.0), rng.gen_range(0.0..2048.0))?;
    }
    println!("Answered {} nearest queries in {:?}", queries, start.elapsed());

    let start = std::time::Instant::now();
    let report = engine.check_integrity();
    println!(
        "Checked {} nodes (depth {}, valid: {}) in {:?}",
        report.nodes_checked,
        report.max_depth,
        report.is_valid,
        start.elapsed()
    );

    let start = std::time::Instant::now();
    for id in ids.iter().step_by(2) {
        engine.remove(*id)?;
    }
    println!("Removed {} nodes in {:?}", count / 2, start.elapsed());

    engine.shutdown()
}
