//! # CLI Module
//!
//! Command-line access to route compilation and request validation.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Compile every operation and print the path pattern and rules per location
//! (required parameters are marked with `*`):
//!
//! ```bash
//! brrtrouter-params routes --spec openapi.yaml
//! ```
//!
//! ### `check`
//!
//! Validate one request. The typed parameter tree is printed on success; on
//! failure the problem JSON is printed and the exit status is 1:
//!
//! ```bash
//! brrtrouter-params check --spec openapi.yaml \
//!     --method GET --uri '/pets/7?tags=a&tags=b' \
//!     -H 'X-Request-Id: 42' --cookie 'session=abc'
//! ```
//!
//! `--config <FILE>` loads a YAML [`RuntimeConfig`](crate::runtime_config::RuntimeConfig);
//! without it the `BRRTR_*` environment variables apply.

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
