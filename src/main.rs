//! suitewalk demo runner
//!
//! Registers a small shopping-cart suite and runs it with the reporter chosen
//! by the environment (see `Config::from_env`). The exit status is non-zero
//! when any test or hook failed.

use anyhow::{ensure, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use suitewalk::{reporter, Body, Config, DescribeOptions, Suite};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Cart {
    items: Vec<(String, u32)>,
}

impl Cart {
    fn add(&mut self, name: &str, cents: u32) {
        self.items.push((name.to_string(), cents));
    }

    fn total(&self) -> u32 {
        self.items.iter().map(|(_, cents)| cents).sum()
    }

    async fn checkout(&mut self) -> Result<u32> {
        ensure!(!self.items.is_empty(), "Cannot check out an empty cart");
        tokio::time::sleep(Duration::from_millis(20)).await;
        let total = self.total();
        self.items.clear();
        Ok(total)
    }
}

fn register(suite: &mut Suite) -> suitewalk::RegistrationResult<()> {
    suite.describe("Cart", |t| {
        let cart = Arc::new(Mutex::new(Cart::default()));

        let setup = cart.clone();
        t.before(Body::sync(move || {
            let mut cart = setup.lock().map_err(|_| anyhow::anyhow!("cart lock poisoned"))?;
            cart.add("apple", 120);
            cart.add("pear", 80);
            Ok(())
        }));

        let totals = cart.clone();
        t.it(
            "sums item prices",
            Body::sync(move || {
                let cart = totals.lock().map_err(|_| anyhow::anyhow!("cart lock poisoned"))?;
                ensure!(cart.total() == 200, "expected 200, got {}", cart.total());
                Ok(())
            }),
        )?;

        t.it("applies discount codes", None)?;

        let checkout_cart = cart.clone();
        t.describe_with(
            "checkout",
            DescribeOptions::new().with_timeout(Duration::from_millis(500)),
            move |t| {
                t.it(
                    "charges the cart total",
                    Body::future(move || async move {
                        let mut staged = {
                            let mut cart = checkout_cart
                                .lock()
                                .map_err(|_| anyhow::anyhow!("cart lock poisoned"))?;
                            std::mem::take(&mut *cart)
                        };
                        let charged = staged.checkout().await?;
                        ensure!(charged == 200, "expected 200, got {}", charged);
                        Ok(())
                    }),
                )?;

                t.it(
                    "confirms by callback",
                    Body::callback(|done| {
                        tokio::spawn(async move {
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            done.resolve();
                        });
                    }),
                )?;
                Ok(())
            },
        )?;

        t.xdescribe("gift wrapping", |t| {
            t.it("wraps each item", Body::sync(|| Ok(())))?;
            Ok(())
        })?;

        let teardown = cart;
        t.after(Body::sync(move || {
            let mut cart = teardown.lock().map_err(|_| anyhow::anyhow!("cart lock poisoned"))?;
            cart.items.clear();
            Ok(())
        }));

        Ok(())
    })?;

    suite.describe_pending("Refunds")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Logs go to stderr so reporter output on stdout stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(
        reporter = ?config.reporter,
        timeout_ms = config.default_timeout_ms,
        "Configuration loaded"
    );

    let mut suite = Suite::new();
    register(&mut suite)?;

    let run = suite.run(config.run_options())?;
    let reporter = reporter::from_config(&config);
    reporter.clone().attach(&run.emitter());

    if let Err(e) = run.execute().await {
        error!("Test run aborted: {}", e);
    }

    std::process::exit(reporter.exit_code());
}
