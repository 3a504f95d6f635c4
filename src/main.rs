use std::env::args;
use std::str::FromStr;
use std::string::ToString;
use std::thread;
use std::time::Duration;

use guarded::{with_all_locked, ExclusiveLock, Guarded, Wait};
use strum::IntoEnumIterator;
use strum_macros::{self, Display, EnumIter, EnumString};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    args()
        .nth(1)
        .ok_or(format!(
            "no scenario supplied, use one of {} or see unit tests",
            Scenario::iter()
                .map(|c| c.to_string())
                .collect::<Vec<String>>()
                .join(",")
        ))
        .and_then(|selector| {
            Scenario::from_str(&selector)
                .map(|scenario| match scenario {
                    Scenario::Counter => counter(),
                    Scenario::Wait => wait(),
                    Scenario::AllLocked => all_locked(),
                })
                .map_err(|e| e.to_string())
        })
}

#[derive(EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
enum Scenario {
    Counter,
    Wait,
    AllLocked,
}

// 16 threads bumping one counter
fn counter() {
    const THREADS: usize = 16;
    const ITERATIONS: usize = 1000;

    let counter = Guarded::<usize>::new(0);
    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..ITERATIONS {
                    counter.with_locked(|v| *v += 1);
                }
            });
        }
    });
    info!(total = counter.get_copy(), expected = THREADS * ITERATIONS, "counter");
}

// one thread waits for a value another one publishes
fn wait() {
    let answer = Guarded::<Option<u32>, ExclusiveLock, Wait>::default();
    thread::scope(|s| {
        s.spawn(|| {
            answer.wait(Option::is_some);
            info!(answer = ?answer.get_copy(), "waiter is through");
        });
        thread::sleep(Duration::from_millis(20));
        *answer.locked() = Some(42);
        info!("published");
    });
}

// moving money between accounts, in both directions at once
fn all_locked() {
    let alice = Guarded::<i64>::new(100);
    let bob = Guarded::<i64>::new(100);
    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..50 {
                with_all_locked((alice.for_write(), bob.for_write()), |all| {
                    let (from, to) = all.values();
                    *from -= 1;
                    *to += 1;
                });
            }
        });
        s.spawn(|| {
            for _ in 0..30 {
                with_all_locked((bob.for_write(), alice.for_write()), |all| {
                    let (from, to) = all.values();
                    *from -= 1;
                    *to += 1;
                });
            }
        });
    });
    let total = with_all_locked((alice.for_read(), bob.for_read()), |all| {
        let (a, b) = all.values();
        a + b
    });
    info!(alice = alice.get_copy(), bob = bob.get_copy(), total, "all_locked");
}
