use std::any::Any;
use std::panic;
use std::process;

use anyhow::Context;
use trishell_engine::core::{AppConfig, Application};
use trishell_engine::logging::{LoggingConfig, init_logging};
use trishell_engine::window::WinitBackend;

fn run() -> anyhow::Result<()> {
    let mut app = Application::new(WinitBackend::new(), AppConfig::default())
        .context("startup failed")?;

    app.run().context("main loop failed")?;

    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn main() {
    init_logging(LoggingConfig::default());

    let code = match panic::catch_unwind(run) {
        Ok(Ok(())) => 0,
        Ok(Err(error)) => {
            log::error!("unhandled error: {error:#}");
            1
        }
        Err(payload) => {
            log::error!("unhandled unknown failure: {}", panic_message(payload.as_ref()));
            1
        }
    };

    process::exit(code);
}
