//! CLI `ghmeta`.
//!
//! ```text
//! ghmeta process --type <evento> [--memory] <archivo.json>
//! ghmeta consume [--memory]          # sobres del bus, uno por línea en stdin
//! ghmeta migrate
//! ```
//!
//! Sin `--memory` se usa Postgres (`DATABASE_URL`). Con `--memory` se usa el
//! backend en memoria y al terminar se imprimen las filas como JSON.
//! Códigos de salida: 0 ok, 2 uso, 4 eventos fallidos, 5 infraestructura.

use std::io::{self, BufRead, Read};
use std::sync::Arc;

use ghmeta::errors::CliError;
use ghmeta::Processor;
use ghmeta_core::{Cancellation, EntityKind, EntityStore, EventDispatcher, InMemoryEntityStore, WebhookEnvelope};
use ghmeta_persistence::{build_pool_from_env, DbConfig, PgEntityStore, PoolProvider};
use log::{error, info};

const USAGE: &str = "ghmeta process --type <evento> [--memory] <archivo> | ghmeta consume [--memory] | ghmeta migrate";

struct Backend {
    store: Arc<dyn EntityStore>,
    memory: Option<Arc<InMemoryEntityStore>>,
}

impl Backend {
    fn open(memory: bool) -> Result<Self, CliError> {
        if memory {
            let store = Arc::new(InMemoryEntityStore::new());
            return Ok(Self { store: store.clone(),
                             memory: Some(store) });
        }
        let pool = build_pool_from_env()?;
        Ok(Self { store: Arc::new(PgEntityStore::new(PoolProvider { pool })),
                  memory: None })
    }

    fn processor(&self) -> Processor<Arc<dyn EntityStore>> {
        Processor::new(EventDispatcher::new(self.store.clone()))
    }

    /// Vuelca las filas del backend en memoria (no-op con Postgres).
    fn dump(&self) -> Result<(), CliError> {
        let Some(memory) = &self.memory else {
            return Ok(());
        };
        for kind in EntityKind::ALL {
            for row in memory.list(kind)? {
                let line = serde_json::json!({ "kind": kind.to_string(), "row": row });
                println!("{line}");
            }
        }
        Ok(())
    }
}

fn process(args: &[String]) -> Result<(), CliError> {
    let mut event_type: Option<String> = None;
    let mut file: Option<String> = None;
    let mut memory = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--type" => {
                i += 1;
                event_type = args.get(i).cloned();
            }
            "--memory" => memory = true,
            other if file.is_none() && !other.starts_with("--") => file = Some(other.to_string()),
            other => return Err(CliError::Usage(format!("argumento inesperado {other:?}"))),
        }
        i += 1;
    }
    let (Some(event_type), Some(file)) = (event_type, file) else {
        return Err(CliError::Usage(USAGE.into()));
    };
    let payload = if file == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        std::fs::read(&file)?
    };

    let backend = Backend::open(memory)?;
    let envelope = WebhookEnvelope::new(event_type, payload);
    match backend.processor().process_envelope(&envelope, &Cancellation::new()) {
        Ok(outcome) => {
            info!("{} -> {outcome:?}", envelope.event_type);
            backend.dump()
        }
        Err(e) => {
            error!("{e}");
            Err(CliError::Events { failed: 1, total: 1 })
        }
    }
}

fn consume(args: &[String]) -> Result<(), CliError> {
    let memory = match args {
        [] => false,
        [flag] if flag == "--memory" => true,
        _ => return Err(CliError::Usage(USAGE.into())),
    };
    let lines: Vec<String> = io::stdin().lock()
                                        .lines()
                                        .collect::<Result<Vec<_>, _>>()?
                                        .into_iter()
                                        .filter(|l| !l.trim().is_empty())
                                        .collect();
    let backend = Backend::open(memory)?;
    let results = backend.processor().process_batch(&lines);
    let mut failed = 0;
    for (n, result) in results.iter().enumerate() {
        if let Err(e) = result {
            failed += 1;
            error!("línea {}: {e}", n + 1);
        }
    }
    backend.dump()?;
    if failed > 0 {
        return Err(CliError::Events { failed,
                                      total: results.len() });
    }
    Ok(())
}

fn migrate() -> Result<(), CliError> {
    let cfg = DbConfig::from_env()?;
    let applied = ghmeta_persistence::migrations::migrate(&cfg.url)?;
    if applied.is_empty() {
        println!("sin migraciones pendientes");
    }
    for version in applied {
        println!("aplicada: {version}");
    }
    Ok(())
}

fn run(args: &[String]) -> Result<(), CliError> {
    match args.split_first() {
        Some((cmd, rest)) if cmd == "process" => process(rest),
        Some((cmd, rest)) if cmd == "consume" => consume(rest),
        Some((cmd, [])) if cmd == "migrate" => migrate(),
        _ => Err(CliError::Usage(USAGE.into())),
    }
}

fn main() {
    ghmeta_persistence::init_dotenv();
    ghmeta::logging::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("[ghmeta] {e}");
        std::process::exit(e.exit_code());
    }
}
