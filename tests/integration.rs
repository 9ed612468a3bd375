//! Integration tests for the fanweld stage set

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fanweld::prelude::*;
use fanweld::sinks;
use tokio_stream::StreamExt;

const SHUTDOWN: Duration = Duration::from_secs(2);

fn sample() -> Vec<i32> {
    vec![5, 2, 8, 1, 9, 3, 7, 4, 6, 0]
}

#[tokio::test]
async fn test_map_yields_every_value_in_order() {
    let cancel = with_timeout(&CancellationToken::new(), Duration::from_secs(1));

    let greetings = repeat_with(&cancel, || b"Hello world".to_vec());
    let limited = take(&cancel, greetings, 10);
    let strings = map(&cancel, limited, |bytes: Vec<u8>| {
        format!("{} stringified", String::from_utf8_lossy(&bytes))
    });

    let items = strings.collect().await;
    assert_eq!(items.len(), 10);
    assert!(items.iter().all(|s| s == "Hello world stringified"));
}

#[tokio::test]
async fn test_filter_odd_scenario() {
    let cancel = CancellationToken::new();
    let mut values = sample().into_iter();
    let endless = repeat_with(&cancel, move || values.next().unwrap_or(-1));
    let limited = take(&cancel, endless, 10);

    let odd = filter(&cancel, limited, |x: &i32| x % 2 != 0);
    assert_eq!(odd.collect().await, vec![5, 1, 9, 3, 7]);
    cancel.cancel();
}

#[tokio::test]
async fn test_filter_output_is_subsequence() {
    let cancel = CancellationToken::new();
    let input: Vec<i32> = (0..200).map(|x| (x * 37) % 101).collect();
    let kept = filter(&cancel, from_iter(&cancel, input.clone()), |x: &i32| x % 5 < 2)
        .collect()
        .await;

    assert!(kept.len() <= input.len());
    let expected: Vec<_> = input.into_iter().filter(|x| x % 5 < 2).collect();
    assert_eq!(kept, expected);
}

#[tokio::test]
async fn test_fan_out_then_fan_in_preserves_count() {
    let cancel = with_timeout(&CancellationToken::new(), Duration::from_secs(1));

    let mut n = 0u64;
    let numbers = repeat_with(&cancel, move || {
        n += 1;
        n
    });
    let parts = fan_out(&cancel, take(&cancel, numbers, 10), 9);
    assert_eq!(parts.len(), 9);

    let merged = fan_in(&cancel, parts);
    assert_eq!(sinks::count(merged).await, 10);
}

#[tokio::test]
async fn test_fan_out_outputs_sum_to_input() {
    let cancel = CancellationToken::new();
    let parts = fan_out(&cancel, from_iter(&cancel, sample()), 9);

    let outputs = collect_all(parts).await;
    assert_eq!(outputs.len(), 9);
    assert_eq!(outputs.iter().map(Vec::len).sum::<usize>(), 10);

    let mut all: Vec<_> = outputs.into_iter().flatten().collect();
    all.sort();
    assert_eq!(all, (0..10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_fan_in_is_multiset_union() {
    let cancel = CancellationToken::new();
    let inputs = vec![
        from_iter(&cancel, vec![1, 1, 2]),
        from_iter(&cancel, vec![]),
        from_iter(&cancel, vec![2, 3]),
        from_iter(&cancel, vec![4]),
    ];

    let mut merged = fan_in(&cancel, inputs).collect().await;
    merged.sort();
    assert_eq!(merged, vec![1, 1, 2, 2, 3, 4]);
}

#[tokio::test]
async fn test_round_trip_for_several_widths() {
    for n in [1, 2, 5, 16] {
        let cancel = CancellationToken::new();
        let parts = fan_out(&cancel, from_iter(&cancel, 0..50), n);

        let mut merged = fan_in(&cancel, parts).collect().await;
        merged.sort();
        assert_eq!(merged, (0..50).collect::<Vec<_>>(), "width {n}");
    }
}

#[tokio::test]
async fn test_cancellation_closes_every_output() {
    let cancel = CancellationToken::new();

    // An endless source nobody drains: every worker ends up parked.
    let source = repeat_with(&cancel, || 1u8);
    let parts = fan_out(&cancel, source, 4);
    let mapped: Vec<_> = parts
        .into_iter()
        .map(|part| map(&cancel, part, |x| x + 1))
        .collect();
    let merged = fan_in(&cancel, mapped);
    let kept = filter(&cancel, merged, |_| true);

    assert_eq!(kept.recv().await, Some(2));
    cancel.cancel();

    let rest = collect_timeout(kept, SHUTDOWN).await.unwrap();
    assert!(rest.len() <= 1);
}

#[tokio::test]
async fn test_cancelled_fan_out_outputs_all_close() {
    let cancel = CancellationToken::new();
    let source = repeat_with(&cancel, || 0u8);
    let parts = fan_out(&cancel, source, 6);

    cancel.cancel();
    let drained = tokio::time::timeout(SHUTDOWN, collect_all(parts)).await;
    assert!(drained.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_stops_slow_pipeline() {
    let cancel = with_timeout(&CancellationToken::new(), Duration::from_millis(100));

    // The consumer never shows up, so only the deadline can end this.
    let (tx, input) = channel::<u32>();
    let producer = tokio::spawn(async move {
        let mut sent = 0;
        while tx.send(sent).await.is_ok() {
            sent += 1;
        }
    });

    let doubled = map(&cancel, input, |x| x * 2);
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(cancel.is_cancelled());
    let rest = collect_timeout(doubled, SHUTDOWN).await.unwrap();
    assert!(rest.len() <= 1);
    producer.abort();
}

#[tokio::test]
async fn test_panicking_stage_does_not_hang_consumers() {
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);

    let checked = map(&cancel, from_iter(&cancel, 0..10), move |x: i32| {
        seen.fetch_add(1, Ordering::SeqCst);
        if x == 3 {
            panic!("refusing {x}");
        }
        x
    });

    let items = collect_timeout(checked, SHUTDOWN).await.unwrap();
    assert_eq!(items, vec![0, 1, 2]);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_panicking_predicate_in_one_branch() {
    let cancel = CancellationToken::new();
    let parts = fan_out(&cancel, from_iter(&cancel, 0..20), 2);

    let mut branches = parts.into_iter();
    let healthy = map(&cancel, branches.next().unwrap(), |x: i32| x);
    let broken = filter(&cancel, branches.next().unwrap(), |_: &i32| -> bool {
        panic!("predicate failure")
    });

    // The broken branch closes instead of leaking; the healthy one drains the rest.
    let merged = collect_timeout(fan_in(&cancel, [healthy, broken]), SHUTDOWN)
        .await
        .unwrap();
    assert!(merged.len() >= 18);
}

#[tokio::test]
async fn test_dropped_consumer_releases_workers() {
    let cancel = CancellationToken::new();
    let produced = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&produced);

    let source = repeat_with(&cancel, move || counter.fetch_add(1, Ordering::SeqCst));
    let mapped = map(&cancel, source, |x| x * 2);

    assert_eq!(mapped.recv().await, Some(0));
    drop(mapped);

    // Once the chain notices, production stops for good.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let settled = produced.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(produced.load(Ordering::SeqCst), settled);
}

#[tokio::test]
async fn test_into_stream_adapter() {
    let cancel = CancellationToken::new();
    let stream = map(&cancel, from_iter(&cancel, 1..=5), |x: i32| x * x).into_stream();

    let squares: Vec<_> = stream.collect().await;
    assert_eq!(squares, vec![1, 4, 9, 16, 25]);
}

#[tokio::test]
async fn test_pipeline_balance() {
    let cancel = CancellationToken::new();
    let mut lengths = Pipeline::from_iter(cancel, ["a", "bb", "ccc", "dddd", "eeeee"])
        .name("lengths")
        .balance(3, |part| part.map(str::len))
        .collect_timeout(SHUTDOWN)
        .collect()
        .await
        .unwrap();

    lengths.sort();
    assert_eq!(lengths, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_pipeline_take_from_endless() {
    let cancel = CancellationToken::new();
    let source = repeat_with(&cancel, || 'x');

    let xs = Pipeline::new(cancel.clone(), source)
        .take(3)
        .map(String::from)
        .collect()
        .await
        .unwrap();
    assert_eq!(xs, vec!["x", "x", "x"]);
    cancel.cancel();
}
