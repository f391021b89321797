use stress_test::{stress_test_replicas, stress_test_scaling, stress_test_sessions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            CONVERGENCE STRESS TESTS                        ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let mut diverged = 0;

    // Test 1: few replicas, light load
    let stats = stress_test_replicas(4, 100, 7).await?;
    stats.print();
    diverged += usize::from(!stats.converged);

    // Test 2: more replicas, heavier load
    let stats = stress_test_replicas(10, 500, 42).await?;
    stats.print();
    diverged += usize::from(!stats.converged);

    // Test 3: end to end through sessions and the memory transport
    let stats = stress_test_sessions(5, 200, 99).await?;
    stats.print();
    diverged += usize::from(!stats.converged);

    // Test 4: scaling analysis
    stress_test_scaling(20, 4).await?;

    if diverged > 0 {
        tracing::error!(diverged, "replicas failed to converge");
        return Err(format!("{} stress test(s) diverged", diverged).into());
    }

    println!("\n✓ All stress tests converged!");
    Ok(())
}
