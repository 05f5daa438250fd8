// 💳 Fraud Dashboard - Entry Point
// Terminal dashboard over a fraud-transactions CSV

use anyhow::Result;
use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use fraud_dashboard::{config, inspect_path};

#[cfg(feature = "tui")]
use fraud_dashboard::{ui, CityRegistry, DatasetCache};

fn main() -> Result<()> {
    setup_logging();

    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "inspect" {
        // Inspect mode: load, normalize, report, exit
        run_inspect(args.get(2).map(String::as_str))?;
    } else {
        // Dashboard mode (default)
        run_dashboard(args.get(1).map(String::as_str))?;
    }

    Ok(())
}

// Logs go to stderr so the TUI owns stdout
fn setup_logging() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(config::log_level()),
        )
        .init();
}

fn run_inspect(path_arg: Option<&str>) -> Result<()> {
    let csv_path = config::resolve_data_path(path_arg);

    println!("📂 Processing {}...", csv_path.display());
    print!("{}", inspect_path(&csv_path)?);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_dashboard(path_arg: Option<&str>) -> Result<()> {
    let csv_path = config::resolve_data_path(path_arg);

    println!("🖥️  Cargando dashboard de fraudes...\n");

    let mut cache = DatasetCache::new();
    let dataset = cache.load(&csv_path)?;

    if dataset.is_empty() {
        eprintln!("❌ No se pudieron cargar los datos.");
        eprintln!(
            "   Asegúrate de que '{}' existe y es accesible.",
            csv_path.display()
        );
        eprintln!("   O indica otra ruta: fraud-dashboard <archivo.csv>");
        std::process::exit(1);
    }

    println!("✓ {} transacciones cargadas\n", dataset.len());
    println!("Iniciando interfaz... (Pulsa 'q' para salir)\n");

    let secrets = config::load_secrets();
    let detailed_map = secrets.mapbox_token.is_some();
    if !detailed_map {
        tracing::info!("map token not configured; using the coarse world outline");
    }

    let mut app = ui::App::new(dataset, CityRegistry::builtin(), detailed_map);
    ui::run_ui(&mut app)?;

    println!("\n✅ Dashboard cerrado");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_dashboard(_path_arg: Option<&str>) -> Result<()> {
    eprintln!("❌ Modo TUI no disponible!");
    eprintln!("   Recompila con: cargo build --features tui");
    eprintln!("   O usa el modo inspección: fraud-dashboard inspect <archivo.csv>");
    std::process::exit(1);
}
