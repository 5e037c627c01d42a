//! Onion Vanity Address Generator CLI
//!
//! Usage:
//!   onionhash '^foo'           # Find an address starting with "foo"
//!   onionhash 'bar$' -w 8      # Search with eight workers
//!   onionhash '^ab|^cd' --seed 7 --bits 512

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use onionhash::error::EXIT_USAGE;
use onionhash::{Config, Error, KeyState, OnionAddress, Pattern, PoolEvent, WorkerPool};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { EXIT_USAGE } else { 0 });
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("\r{}", e);
        process::exit(e.exit_code());
    }
}

fn run(config: &Config) -> Result<(), Error> {
    config.validate()?;
    let pattern = Pattern::compile(&config.pattern)?;

    info!("Pattern:  {}", pattern);
    info!("Key size: {} bits", config.bits);
    info!("Workers:  {}", config.worker_count());

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    info!("Generating RSA modulus...");
    let key_state = KeyState::generate(&mut rng, config.bits)?;

    let pool = WorkerPool::new(
        config.worker_count(),
        key_state,
        pattern,
        config.attempt_cap(),
    );

    let stop_flag = pool.stop_flag_clone();
    let handler_flag = stop_flag.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed)) {
        warn!("Error setting Ctrl-C handler: {}", e);
    }

    info!("Searching... (Press Ctrl+C to stop)");

    let report_interval = Duration::from_secs(config.report_interval);
    let found = loop {
        match pool.wait_for_result(report_interval) {
            PoolEvent::Found(result) => break Some(result),
            PoolEvent::Failed(e) => {
                pool.join();
                return Err(e.into());
            }
            PoolEvent::Finished => break None,
            PoolEvent::Timeout => print_progress(&pool),
        }

        if pool.is_stopped() {
            break None;
        }
    };

    // Checked before joining: joining without a winner raises the stop flag.
    let interrupted = pool.is_stopped();
    let attempts = pool.join();

    if interrupted {
        return Err(Error::Interrupted { attempts });
    }
    let Some(found) = found else {
        return Err(Error::Exhausted { attempts });
    };

    info!(
        "Worker {} matched after {} of its own tries",
        found.worker_id, found.result.attempts
    );

    let key = found.key_state.finalize()?;
    let address = key.onion_address()?;
    if address != found.result.address {
        warn!(
            "Finalized key hashes to {}, search reported {}",
            address, found.result.address
        );
    }
    let pem = key.to_pkcs1_pem()?;

    // The handler stays armed after the pool is joined.
    check_interrupt(&stop_flag, attempts)?;

    print_onion(attempts, &address);
    print!("{}", pem);

    Ok(())
}

fn check_interrupt(stop_flag: &AtomicBool, attempts: u64) -> Result<(), Error> {
    if stop_flag.load(Ordering::Relaxed) {
        return Err(Error::Interrupted { attempts });
    }
    Ok(())
}

fn print_onion(attempts: u64, address: &OnionAddress) {
    let line = format!(
        "Found matching pattern after {} tries: {}",
        attempts,
        address.to_hostname()
    );
    let rule = "-".repeat(line.len());
    println!("{}", rule);
    println!("{}", line);
    println!("{}", rule);
}

/// Logs the running attempt count, search rate and elapsed time.
fn print_progress(pool: &WorkerPool) {
    let elapsed = pool.elapsed();
    info!(
        "{} tries so far, {} tries/s, running for {}",
        group_digits(pool.total_attempts()),
        group_digits(pool.attempts_per_second() as u64),
        format_elapsed(elapsed)
    );
}

/// Formats `n` with a comma between each group of three digits.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a duration as `h:mm:ss`.
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}
