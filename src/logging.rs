//! Inicialización del logger del binario. Nivel tomado de `RUST_LOG`
//! (por defecto info).

use env_logger::{Builder, Env};

/// Instala el logger a stderr; llamadas repetidas no hacen nada.
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
        log::info!("logger listo");
    }
}
