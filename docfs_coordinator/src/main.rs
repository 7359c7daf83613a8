use docfs_coordinator::config::config_parser::Config;
use docfs_coordinator::constantes::COMANDO_SHUTDOWN;
use docfs_coordinator::coordinator::Coordinator;
use docfs_coordinator::coordinator_builder::CoordinatorBuilder;
use logger::logger::Logger;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{sleep, spawn};
use std::time::Duration;

/// Flag que los handlers de seniales encienden para pedir el apagado.
static SENAL_APAGADO: AtomicBool = AtomicBool::new(false);

extern "C" fn marcar_apagado(_senal: libc::c_int) {
    SENAL_APAGADO.store(true, Ordering::SeqCst);
}

/// Punto de entrada del coordinator.
///
/// Uso:
/// ```bash
/// ./docfs_coordinator <ruta/al/coordinator.conf>
/// ```
///
/// Carga la configuracion, restaura la metadata persistida y queda
/// atendiendo clientes y nodos. El apagado ordenado (comando `SHUTDOWN`
/// por consola, o las seniales TERM/INT/HUP) guarda el snapshot de la
/// metadata y termina con codigo 0.
///
/// # Ejemplo de coordinator.conf
/// ```text
/// address = 0.0.0.0:9000
/// registry_file = registry.dat
/// cache_dir = cache
/// backup_dir = backups
/// log_file = coordinator.log
/// ```
fn main() {
    let args = std::env::args().collect::<Vec<String>>();
    if args.len() < 2 {
        eprintln!("Uso: {} <ruta/al/coordinator.conf>", args[0]);
        std::process::exit(1);
    }

    let config = match Config::from_file(&args[1]) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error de configuracion: {e}");
            std::process::exit(1);
        }
    };

    let logger = Logger::new(&config.log_file);
    let coordinator = match CoordinatorBuilder::new()
        .config(config)
        .logger(logger)
        .build()
    {
        Ok(coordinator) => Arc::new(coordinator),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let puerto = match Arc::clone(&coordinator).iniciar() {
        Ok(puerto) => puerto,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    println!("Coordinator escuchando en el puerto {puerto}");

    instalar_seniales();
    let vigia = Arc::clone(&coordinator);
    spawn(move || {
        loop {
            sleep(Duration::from_millis(500));
            if SENAL_APAGADO.load(Ordering::SeqCst) {
                apagar(&vigia);
            }
        }
    });

    atender_consola(&coordinator);
    // sin consola (stdin cerrado), el servicio sigue en sus hilos
    loop {
        sleep(Duration::from_secs(3600));
    }
}

/// Instala los handlers de TERM/INT/HUP que piden el apagado ordenado.
fn instalar_seniales() {
    unsafe {
        libc::signal(libc::SIGTERM, marcar_apagado as usize);
        libc::signal(libc::SIGINT, marcar_apagado as usize);
        libc::signal(libc::SIGHUP, marcar_apagado as usize);
    }
}

/// Bucle de la consola del operador: `SHUTDOWN` apaga el coordinator con
/// snapshot previo de la metadata.
fn atender_consola(coordinator: &Arc<Coordinator>) {
    let stdin = std::io::stdin();
    for linea in stdin.lock().lines() {
        let Ok(linea) = linea else {
            return;
        };
        if linea.trim().eq_ignore_ascii_case(COMANDO_SHUTDOWN) {
            apagar(coordinator);
        }
    }
}

/// Apagado ordenado: snapshot de la metadata y salida con codigo 0.
fn apagar(coordinator: &Arc<Coordinator>) -> ! {
    if let Err(e) = coordinator.guardar_metadata() {
        eprintln!("{e}");
    }
    std::process::exit(0);
}
