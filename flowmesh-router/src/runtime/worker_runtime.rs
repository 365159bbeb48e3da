//! Runtime helper for spawning dedicated consume-loop threads.
//!
//! Every long-running consume loop in the system (subscriber dispatch,
//! distro loader, command processor) gets its own OS thread running a
//! current-thread tokio runtime, so one blocked or busy loop never starves
//! an unrelated responsibility.

use std::thread;
use tokio::runtime::Builder;

pub const DEFAULT_CONSUME_LOOP_THREAD_NAME: &str = "fm-consume-loop";

/// Spawns a named OS thread that runs one async consume loop to completion
/// on its own current-thread runtime.
pub fn spawn_consume_loop<F, Fut>(thread_name: String, run_loop: F) -> thread::JoinHandle<()>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()>,
{
    thread::Builder::new()
        .name(thread_name)
        .spawn(move || {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create consume loop Tokio runtime");

            runtime.block_on(run_loop());
        })
        .expect("Failed to spawn consume loop thread")
}

/// Builds a Linux-safe (15 byte) thread name from a prefix and an id,
/// keeping only hex characters of the id. Falls back to the default name
/// when the id cannot fill the suffix.
pub fn build_thread_name(prefix: &str, id: &str, max_len: usize) -> String {
    let Some(suffix_len) = max_len.checked_sub(prefix.len()) else {
        return DEFAULT_CONSUME_LOOP_THREAD_NAME.to_string();
    };
    let suffix: String = id
        .chars()
        .filter(|ch| ch.is_ascii_hexdigit())
        .take(suffix_len)
        .collect();

    if suffix.len() == suffix_len {
        format!("{prefix}{suffix}")
    } else {
        DEFAULT_CONSUME_LOOP_THREAD_NAME.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{build_thread_name, spawn_consume_loop, DEFAULT_CONSUME_LOOP_THREAD_NAME};

    #[test]
    fn build_thread_name_keeps_prefix_and_length() {
        let name = build_thread_name("fm-disp-", "abcdef0123456789", 15);
        assert!(name.starts_with("fm-disp-"));
        assert_eq!(name.len(), 15);
    }

    #[test]
    fn build_thread_name_falls_back_for_short_non_hex_ids() {
        let name = build_thread_name("fm-disp-", "zzz", 15);
        assert_eq!(name, DEFAULT_CONSUME_LOOP_THREAD_NAME);
    }

    #[test]
    fn spawned_loop_runs_to_completion() {
        let (sender, receiver) = std::sync::mpsc::channel();
        let handle = spawn_consume_loop("fm-test-loop".to_string(), move || async move {
            sender.send(42_u32).expect("channel should accept value");
        });

        assert_eq!(receiver.recv().expect("loop should send"), 42);
        handle.join().expect("loop thread should join");
    }
}
