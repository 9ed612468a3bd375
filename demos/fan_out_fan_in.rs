use std::time::Duration;

use fanweld::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fanweld=debug")),
        )
        .init();

    println!("fanweld stage examples\n");

    // Example 1: Map and filter
    println!("=== Map and Filter ===");
    let cancel = CancellationToken::new();
    let numbers = from_iter(&cancel, [5, 2, 8, 1, 9, 3, 7, 4, 6, 0]);
    let odd = filter(&cancel, numbers, |x| x % 2 != 0);
    let labelled = map(&cancel, odd, |x| format!("odd: {x}"));
    for line in labelled.collect().await {
        println!("{line}");
    }
    println!();

    // Example 2: Fan out to slow workers, fan back in
    println!("=== Fan-Out / Fan-In ===");
    let parts = fan_out(&cancel, from_iter(&cancel, 1..=12), 4);
    let worked: Vec<_> = parts
        .into_iter()
        .map(|part| {
            map(&cancel, part, |x: u64| {
                std::thread::sleep(Duration::from_millis(5 * x));
                x * x
            })
        })
        .collect();
    let mut squares = fan_in(&cancel, worked).collect().await;
    squares.sort();
    println!("squares: {squares:?}\n");

    // Example 3: Deadline on an endless source
    println!("=== Deadline ===");
    let deadline = with_timeout(&cancel, Duration::from_millis(50));
    let mut tick = 0u64;
    let ticks = repeat_with(&deadline, move || {
        tick += 1;
        tick
    });
    let slowed = map(&deadline, ticks, |t| {
        std::thread::sleep(Duration::from_millis(10));
        t
    });
    let seen = collect_timeout(slowed, Duration::from_secs(1)).await?;
    println!("saw {} ticks before the deadline\n", seen.len());

    // Example 4: The same flow as a pipeline
    println!("=== Pipeline ===");
    let total: u64 = Pipeline::from_iter(cancel.clone(), 1..=100u64)
        .name("sum-of-odd-squares")
        .filter(|x| x % 2 == 1)
        .balance(4, |part| part.map(|x| x * x))
        .collect_timeout(Duration::from_secs(5))
        .collect()
        .await?
        .into_iter()
        .sum();
    println!("sum of odd squares up to 100: {total}");

    cancel.cancel();
    Ok(())
}
