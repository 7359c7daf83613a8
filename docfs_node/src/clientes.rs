//! Este modulo atiende el canal de datos entre un cliente y el nodo:
//! lecturas, stream palabra a palabra, undo y sesiones de escritura
use crate::archivos::file_ops::ArchivosNodo;
use crate::bloqueos::tabla_locks::TablaLocks;
use crate::bloqueos::tabla_undo::TablaUndo;
use crate::log_msj::log_mensajes::log_connection_accepted;
use crate::oraciones::edicion::atender_sesion_escritura;
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::constantes::PAUSA_STREAM_MS;
use docfs_client::protocol::opcode::Opcode;
use docfs_client::protocol::trama::{Trama, escribir_trama, leer_trama};
use docfs_client::protocol::utils::recortar_payload;
use logger::logger::Logger;
use std::io::Error;
use std::net::TcpStream;
use std::thread::sleep;
use std::time::Duration;

/// Atiende un canal de datos completo, pedido por pedido, hasta que el
/// cliente lo cierra.
///
/// # Parametros
/// * `stream`: conexion aceptada en el puerto de clientes
/// * `archivos`: acceso al disco del nodo
/// * `locks`: tabla de locks de oracion
/// * `undo`: tabla de flags de undo
/// * `logger`: logger del nodo
pub fn atender_canal_datos(
    mut stream: TcpStream,
    archivos: ArchivosNodo,
    locks: TablaLocks,
    undo: TablaUndo,
    logger: Logger,
) {
    if let Ok(direccion) = stream.peer_addr() {
        log_connection_accepted(&logger, &direccion.to_string());
    }

    loop {
        let pedido = match leer_trama(&mut stream) {
            Ok(trama) => trama,
            Err(_) => return,
        };

        let resultado = match pedido.operacion() {
            Some(Opcode::Read) => atender_lectura(&mut stream, &pedido, &archivos),
            Some(Opcode::Stream) => atender_stream(&mut stream, &pedido, &archivos),
            Some(Opcode::Undo) => atender_undo(&mut stream, &pedido, &archivos, &undo, &logger),
            Some(Opcode::Write) => {
                atender_sesion_escritura(&mut stream, &pedido, &archivos, &locks, &undo, &logger)
            }
            _ => {
                let respuesta = pedido.responder(
                    CodigoResultado::BadRequest,
                    "Operacion invalida para el canal de datos",
                );
                escribir_trama(&mut stream, &respuesta)
            }
        };

        if resultado.is_err() {
            return;
        }
    }
}

/// Responde el contenido vivo completo de un archivo.
fn atender_lectura(
    stream: &mut TcpStream,
    pedido: &Trama,
    archivos: &ArchivosNodo,
) -> Result<(), Error> {
    let respuesta = match archivos.leer(&pedido.filename) {
        Ok(contenido) => pedido.responder(CodigoResultado::Success, recortar_payload(&contenido)),
        Err(_) => pedido.responder(
            CodigoResultado::NotFound,
            &format!("El archivo '{}' no existe en este nodo", pedido.filename),
        ),
    };
    escribir_trama(stream, &respuesta)
}

/// Envia el archivo palabra por palabra con la pausa de stream, tramas
/// centinela `"\n"` en cada salto de linea y una trama final de exito.
fn atender_stream(
    stream: &mut TcpStream,
    pedido: &Trama,
    archivos: &ArchivosNodo,
) -> Result<(), Error> {
    let contenido = match archivos.leer(&pedido.filename) {
        Ok(contenido) => contenido,
        Err(_) => {
            let respuesta = pedido.responder(
                CodigoResultado::NotFound,
                &format!("El archivo '{}' no existe en este nodo", pedido.filename),
            );
            return escribir_trama(stream, &respuesta);
        }
    };

    for linea in contenido.lines() {
        for palabra in linea.split_whitespace() {
            let trama = pedido.responder(CodigoResultado::Data, palabra);
            escribir_trama(stream, &trama)?;
            sleep(Duration::from_millis(PAUSA_STREAM_MS));
        }
        let centinela = pedido.responder(CodigoResultado::Data, "\n");
        escribir_trama(stream, &centinela)?;
    }

    let cierre = pedido.responder(CodigoResultado::Success, "");
    escribir_trama(stream, &cierre)
}

/// Deshace la ultima escritura confirmada intercambiando el contenido vivo
/// con el sidecar; dos undo consecutivos estan prohibidos.
fn atender_undo(
    stream: &mut TcpStream,
    pedido: &Trama,
    archivos: &ArchivosNodo,
    undo: &TablaUndo,
    logger: &Logger,
) -> Result<(), Error> {
    let nombre = &pedido.filename;

    if !archivos.existe(nombre) {
        let respuesta = pedido.responder(
            CodigoResultado::NotFound,
            &format!("El archivo '{nombre}' no existe en este nodo"),
        );
        return escribir_trama(stream, &respuesta);
    }

    if undo.ultimo_fue_undo(nombre) {
        let respuesta = pedido.responder(
            CodigoResultado::Denied,
            "La ultima operacion ya fue un undo; se necesita una escritura antes de otro",
        );
        return escribir_trama(stream, &respuesta);
    }

    let respuesta = match archivos.intercambiar_con_sidecar(nombre) {
        Ok(_) => {
            undo.marcar_undo(nombre);
            if let Ok(contenido) = archivos.leer(nombre) {
                let _ = archivos.actualizar_backup(nombre, &contenido);
            }
            logger.info(&format!("undo aplicado sobre '{nombre}'"), "UNDO");
            pedido.responder(CodigoResultado::Success, "Undo realizado")
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => pedido.responder(
            CodigoResultado::NotFound,
            &format!("No hay respaldo de '{nombre}' para deshacer"),
        ),
        Err(e) => {
            logger.error(&format!("fallo el undo de '{nombre}': {e}"), "UNDO");
            pedido.responder(CodigoResultado::ServerError, "No se pudo aplicar el undo")
        }
    };
    escribir_trama(stream, &respuesta)
}
