use env_logger::{Builder, Env};

/// Intercept messages using the `log` crate and print them to STDERR. Defaults to `info`;
/// override with `RUST_LOG`.
pub fn setup() {
    Builder::from_env(Env::default().default_filter_or("info")).init();
}
