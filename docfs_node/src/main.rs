use docfs_node::constantes::COMANDO_DESCONEXION;
use docfs_node::log_msj::log_mensajes::log_shutdown;
use docfs_node::node_builder::NodeBuilder;
use logger::logger::Logger;
use std::io::BufRead;
use std::sync::Arc;
use std::thread::spawn;

/// Punto de entrada del nodo de almacenamiento.
///
/// Uso:
/// ```bash
/// ./docfs_node <node_id> <coord_ip> <coord_port> <client_port>
/// ```
///
/// El puerto de control anunciado se deriva como `client_port + 1000`. El
/// nodo se registra ante el coordinator, queda atendiendo su canal de
/// control y acepta canales de datos de los clientes referidos. Escribir
/// `DISCONNECT` en la consola lo apaga en forma ordenada con codigo 0.
fn main() {
    let args = std::env::args().collect::<Vec<String>>();
    if args.len() < 5 {
        eprintln!("Uso: {} <node_id> <coord_ip> <coord_port> <client_port>", args[0]);
        std::process::exit(1);
    }

    let id = args[1].clone();
    let coordinator = format!("{}:{}", args[2], args[3]);
    let puerto_cliente: u16 = match args[4].parse() {
        Ok(puerto) => puerto,
        Err(_) => {
            eprintln!("Puerto de clientes invalido: {}", args[4]);
            std::process::exit(1);
        }
    };

    let logger = Logger::new(&format!("node_{id}.log"));
    let nodo = match NodeBuilder::new()
        .id(&id)
        .coordinator(&coordinator)
        .puerto_cliente(puerto_cliente)
        .logger(logger.clone())
        .build()
    {
        Ok(nodo) => Arc::new(nodo),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    println!("Nodo '{id}' sirviendo clientes en el puerto {puerto_cliente}");
    spawn(move || atender_consola(logger));

    if let Err(e) = nodo.start_node() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

/// Bucle de la consola del operador: `DISCONNECT` apaga el nodo.
fn atender_consola(logger: Logger) {
    let stdin = std::io::stdin();
    for linea in stdin.lock().lines() {
        let Ok(linea) = linea else {
            return;
        };
        if linea.trim().eq_ignore_ascii_case(COMANDO_DESCONEXION) {
            log_shutdown(&logger, "consola");
            std::process::exit(0);
        }
    }
}
