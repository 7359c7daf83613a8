//! Shell interactivo del filesystem de documentos: parsea comandos de la
//! consola y los resuelve con los drivers del coordinator y de los nodos
use docfs_client::driver::DriverResult;
use docfs_client::driver::coordinator_driver::{CoordinatorDriver, Resolucion};
use docfs_client::driver::driver_error::DriverError;
use docfs_client::driver::node_driver::NodeDriver;
use docfs_client::protocol::constantes::{
    ACCESO_ESCRITURA, ACCESO_LECTURA, TOKEN_CIERRE_ESCRITURA,
};
use std::io::{BufRead, Write};

const AYUDA: &str = "Comandos disponibles:
  CREATE <archivo>                 crea un archivo (USE elige el nodo)
  READ <archivo>                   muestra el contenido
  STREAM <archivo>                 recibe el contenido palabra a palabra
  WRITE <archivo> <oracion>        edita una oracion en forma interactiva
  UNDO <archivo>                   deshace la ultima escritura
  DELETE <archivo>                 borra un archivo propio
  VIEW [a][l]                      lista archivos (a: todos, l: detalle)
  INFO <archivo>                   metadata de un archivo
  LIST                             usuarios registrados
  LISTSS                           nodos de almacenamiento
  USE [nodo]                       fija el nodo destino de CREATE
  ADDACCESS -R|-W <archivo> <usuario>
  REMACCESS <archivo> <usuario>
  REQUESTACCESS -R|-W|-RW <archivo>
  VIEWREQUESTS <archivo>
  APPROVEREQUEST <archivo> <id>
  DENYREQUEST <archivo> <id>
  SEARCH <patron>
  CREATEFOLDER <carpeta>
  VIEWFOLDER [carpeta]
  MOVE <archivo> [carpeta]
  CHECKPOINT <archivo> <tag>
  VIEWCHECKPOINT <archivo> <tag>
  REVERT <archivo> <tag>
  LISTCHECKPOINTS <archivo>
  EXEC <archivo>
  HELP
  EXIT";

fn main() {
    let args = std::env::args().collect::<Vec<String>>();
    if args.len() < 4 {
        eprintln!("Uso: {} <usuario> <coord_ip> <coord_port>", args[0]);
        std::process::exit(1);
    }
    let usuario = args[1].clone();
    let puerto: u16 = match args[3].parse() {
        Ok(puerto) => puerto,
        Err(_) => {
            eprintln!("Puerto invalido: {}", args[3]);
            std::process::exit(1);
        }
    };

    let mut driver = match CoordinatorDriver::connect(&args[2], puerto, &usuario) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("{}", e.message());
            std::process::exit(1);
        }
    };
    println!("{}", driver.welcome());

    let stdin = std::io::stdin();
    let mut nodo_elegido: Option<String> = None;
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let mut linea = String::new();
        match stdin.lock().read_line(&mut linea) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let tokens: Vec<&str> = linea.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        let resultado = match tokens[0].to_uppercase().as_str() {
            "EXIT" => break,
            "HELP" => {
                println!("{AYUDA}");
                continue;
            }
            "USE" => {
                nodo_elegido = tokens.get(1).map(|t| t.to_string());
                match &nodo_elegido {
                    Some(nodo) => println!("CREATE usara el nodo '{nodo}'"),
                    None => println!("CREATE volvera al nodo por defecto"),
                }
                continue;
            }
            "CREATE" if tokens.len() == 2 => driver.crear(tokens[1], nodo_elegido.as_deref()),
            "READ" if tokens.len() == 2 => comando_read(&mut driver, tokens[1], &usuario),
            "STREAM" if tokens.len() == 2 => comando_stream(&mut driver, tokens[1], &usuario),
            "WRITE" if tokens.len() == 3 => comando_write(&mut driver, &tokens, &usuario, &stdin),
            "UNDO" if tokens.len() == 2 => comando_undo(&mut driver, tokens[1], &usuario),
            "DELETE" if tokens.len() == 2 => driver.borrar(tokens[1]),
            "VIEW" => {
                let flags = tokens.get(1).copied().unwrap_or("");
                driver.ver(flags.contains('a'), flags.contains('l'))
            }
            "INFO" if tokens.len() == 2 => driver.info(tokens[1]),
            "LIST" => driver.listar_usuarios(),
            "LISTSS" => driver.listar_nodos(),
            "ADDACCESS" if tokens.len() == 4 => {
                driver.agregar_acceso(tokens[2], tokens[3], tokens[1].eq_ignore_ascii_case("-W"))
            }
            "REMACCESS" if tokens.len() == 3 => driver.remover_acceso(tokens[1], tokens[2]),
            "REQUESTACCESS" if tokens.len() == 3 => {
                match mascara_de_flag(tokens[1]) {
                    Some(mascara) => driver.solicitar_acceso(tokens[2], mascara),
                    None => {
                        println!("Flag de acceso invalido: {}", tokens[1]);
                        continue;
                    }
                }
            }
            "VIEWREQUESTS" if tokens.len() == 2 => driver.ver_solicitudes(tokens[1]),
            "APPROVEREQUEST" if tokens.len() == 3 => {
                comando_responder(&mut driver, &tokens, true)
            }
            "DENYREQUEST" if tokens.len() == 3 => comando_responder(&mut driver, &tokens, false),
            "SEARCH" if tokens.len() == 2 => driver.buscar(tokens[1]),
            "CREATEFOLDER" if tokens.len() == 2 => driver.crear_carpeta(tokens[1]),
            "VIEWFOLDER" => driver.ver_carpeta(tokens.get(1).copied().unwrap_or("")),
            "MOVE" if tokens.len() >= 2 => {
                driver.mover(tokens[1], tokens.get(2).copied().unwrap_or(""))
            }
            "CHECKPOINT" if tokens.len() == 3 => driver.checkpoint(tokens[1], tokens[2]),
            "VIEWCHECKPOINT" if tokens.len() == 3 => driver.ver_checkpoint(tokens[1], tokens[2]),
            "REVERT" if tokens.len() == 3 => driver.revertir(tokens[1], tokens[2]),
            "LISTCHECKPOINTS" if tokens.len() == 2 => driver.listar_checkpoints(tokens[1]),
            "EXEC" if tokens.len() == 2 => driver.exec(tokens[1]),
            _ => {
                println!("Comando invalido; HELP muestra los disponibles");
                continue;
            }
        };

        match resultado {
            Ok(salida) => println!("{salida}"),
            Err(e) => println!("{}", e.message()),
        }
    }
}

/// Traduce el flag de REQUESTACCESS a la mascara del protocolo.
fn mascara_de_flag(flag: &str) -> Option<i32> {
    match flag.to_uppercase().as_str() {
        "-R" => Some(ACCESO_LECTURA),
        "-W" => Some(ACCESO_LECTURA | ACCESO_ESCRITURA),
        "-RW" => Some(ACCESO_LECTURA | ACCESO_ESCRITURA),
        _ => None,
    }
}

/// READ: resuelve contra el coordinator y sigue el referral si lo hay.
fn comando_read(
    driver: &mut CoordinatorDriver,
    archivo: &str,
    usuario: &str,
) -> DriverResult<String> {
    match driver.leer(archivo)? {
        Resolucion::Contenido(contenido) => Ok(contenido),
        Resolucion::Referral { ip, puerto } => {
            let mut canal = NodeDriver::connect(&ip, puerto)?;
            canal.leer(usuario, archivo)
        }
    }
}

/// STREAM: imprime palabra a palabra a medida que llegan las tramas.
fn comando_stream(
    driver: &mut CoordinatorDriver,
    archivo: &str,
    usuario: &str,
) -> DriverResult<String> {
    match driver.stream(archivo)? {
        Resolucion::Contenido(contenido) => Ok(contenido),
        Resolucion::Referral { ip, puerto } => {
            let mut canal = NodeDriver::connect(&ip, puerto)?;
            canal.stream(usuario, archivo, |palabra| {
                if palabra == "\n" {
                    println!();
                } else {
                    print!("{palabra} ");
                }
                let _ = std::io::stdout().flush();
            })?;
            Ok(String::new())
        }
    }
}

/// UNDO: pide el referral y ejecuta el undo en el nodo.
fn comando_undo(
    driver: &mut CoordinatorDriver,
    archivo: &str,
    usuario: &str,
) -> DriverResult<String> {
    let (ip, puerto) = driver.deshacer(archivo)?;
    let mut canal = NodeDriver::connect(&ip, puerto)?;
    canal.deshacer(usuario, archivo)
}

/// WRITE: abre la sesion interactiva; cada linea es `<indice> <contenido>`
/// y el token de cierre confirma los cambios.
fn comando_write(
    driver: &mut CoordinatorDriver,
    tokens: &[&str],
    usuario: &str,
    stdin: &std::io::Stdin,
) -> DriverResult<String> {
    let archivo = tokens[1];
    let oracion: u32 = tokens[2]
        .parse()
        .map_err(|_| DriverError::other(format!("Indice de oracion invalido: {}", tokens[2])))?;

    let (ip, puerto) = driver.escribir(archivo, oracion)?;
    let canal = NodeDriver::connect(&ip, puerto)?;
    let mut sesion = canal.abrir_escritura(usuario, archivo, oracion)?;
    println!("Oracion {oracion}: \"{}\"", sesion.oracion_actual());
    println!("Ingrese `<indice> <contenido>` por linea, {TOKEN_CIERRE_ESCRITURA} para confirmar");

    loop {
        print!("edit> ");
        let _ = std::io::stdout().flush();
        let mut linea = String::new();
        match stdin.lock().read_line(&mut linea) {
            Ok(0) | Err(_) => {
                return Err(DriverError::other("Sesion de edicion abandonada".to_string()));
            }
            Ok(_) => {}
        }
        let linea = linea.trim();
        if linea == TOKEN_CIERRE_ESCRITURA {
            return sesion.confirmar();
        }

        let Some((indice, contenido)) = linea.split_once(' ') else {
            println!("Formato: `<indice> <contenido>` o {TOKEN_CIERRE_ESCRITURA}");
            continue;
        };
        let Ok(indice) = indice.parse::<u32>() else {
            println!("Indice de palabra invalido: {indice}");
            continue;
        };
        match sesion.insertar(indice, contenido) {
            Ok(actualizada) => println!("Oracion: \"{actualizada}\""),
            Err(e) => println!("{}", e.message()),
        }
    }
}

/// APPROVEREQUEST / DENYREQUEST con el id parseado.
fn comando_responder(
    driver: &mut CoordinatorDriver,
    tokens: &[&str],
    aprobar: bool,
) -> DriverResult<String> {
    let id: i32 = tokens[2]
        .parse()
        .map_err(|_| DriverError::other(format!("Id de solicitud invalido: {}", tokens[2])))?;
    driver.responder_solicitud(tokens[1], id, aprobar)
}
