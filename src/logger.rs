//! logger.rs
//! Configuración del logger usando env_logger.

use std::io::Write;

pub fn init_logger() {
    // RUST_LOG manda; si no está, usamos "info".
    let log_env = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    // Formato: "2025-01-01 10:00:00 - astro_engine::worker - INFO - mensaje"
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_env))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                record.level(),
                record.args()
            )
        })
        .try_init();

    match result {
        Ok(()) => log::info!("Logging configured successfully."),
        Err(_) => log::info!("Logging already configured."),
    }
}
