//! Este modulo atiende el canal de control permanente con el coordinator:
//! ordenes de archivos, refrescos de estadisticas, heartbeats y apagado
use crate::archivos::file_ops::ArchivosNodo;
use crate::bloqueos::tabla_undo::TablaUndo;
use crate::log_msj::log_mensajes::{log_control_caido, log_shutdown};
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::opcode::Opcode;
use docfs_client::protocol::protocol_trait::SerializeDFP;
use docfs_client::protocol::trama::{Trama, escribir_trama, leer_trama};
use docfs_client::protocol::utils::recortar_payload;
use logger::logger::Logger;
use std::io::ErrorKind;
use std::net::TcpStream;
use std::process;

/// Bucle del canal de control: el coordinator envia un pedido por vez y el
/// nodo responde sobre el mismo socket. El bucle vive mientras viva la
/// conexion; si el coordinator se cae, el nodo sigue sirviendo datos y
/// espera ser relanzado para volver a registrarse.
///
/// # Parametros
/// * `stream`: socket de registro que quedo como canal de control
/// * `archivos`: acceso al disco del nodo
/// * `undo`: tabla de flags de undo
/// * `logger`: logger del nodo
pub fn atender_canal_control(
    mut stream: TcpStream,
    archivos: ArchivosNodo,
    undo: TablaUndo,
    logger: Logger,
) {
    loop {
        let pedido = match leer_trama(&mut stream) {
            Ok(trama) => trama,
            Err(e) => {
                log_control_caido(&logger, &e.to_string());
                return;
            }
        };

        let respuesta = match pedido.operacion() {
            Some(Opcode::Heartbeat) => pedido.responder(CodigoResultado::Ack, "alive"),
            Some(Opcode::Create) => atender_create(&pedido, &archivos, &logger),
            Some(Opcode::Delete) => atender_delete(&pedido, &archivos, &undo, &logger),
            Some(Opcode::Move) => atender_move(&pedido, &archivos, &logger),
            Some(Opcode::Checkpoint) => atender_checkpoint(&pedido, &archivos, &logger),
            Some(Opcode::ViewCheckpoint) => atender_view_checkpoint(&pedido, &archivos),
            Some(Opcode::Revert) => atender_revert(&pedido, &archivos, &logger),
            Some(Opcode::Info) => atender_info(&pedido, &archivos),
            Some(Opcode::Replicate) => pedido.responder(CodigoResultado::Ack, "replicado"),
            Some(Opcode::Shutdown) => {
                log_shutdown(&logger, "coordinator");
                let respuesta = pedido.responder(CodigoResultado::Ack, "apagando");
                let _ = escribir_trama(&mut stream, &respuesta);
                process::exit(0);
            }
            _ => pedido.responder(
                CodigoResultado::BadRequest,
                "Operacion invalida para el canal de control",
            ),
        };

        if escribir_trama(&mut stream, &respuesta).is_err() {
            log_control_caido(&logger, "fallo al responder");
            return;
        }
    }
}

fn atender_create(pedido: &Trama, archivos: &ArchivosNodo, logger: &Logger) -> Trama {
    match archivos.crear(&pedido.filename) {
        Ok(_) => {
            logger.info(&format!("archivo '{}' creado", pedido.filename), "CONTROL");
            pedido.responder(CodigoResultado::Success, "Archivo creado en el nodo")
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            pedido.responder(CodigoResultado::Exists, "El archivo ya existe en el nodo")
        }
        Err(e) => {
            logger.error(&format!("fallo el create de '{}': {e}", pedido.filename), "CONTROL");
            pedido.responder(CodigoResultado::ServerError, "No se pudo crear el archivo")
        }
    }
}

fn atender_delete(
    pedido: &Trama,
    archivos: &ArchivosNodo,
    undo: &TablaUndo,
    logger: &Logger,
) -> Trama {
    match archivos.borrar(&pedido.filename) {
        Ok(_) => {
            undo.olvidar(&pedido.filename);
            logger.info(&format!("archivo '{}' borrado", pedido.filename), "CONTROL");
            pedido.responder(CodigoResultado::Success, "Archivo borrado del nodo")
        }
        Err(e) if e.kind() == ErrorKind::NotFound => pedido.responder(
            CodigoResultado::NotFound,
            "El archivo no existe en el nodo",
        ),
        Err(e) => {
            logger.error(&format!("fallo el delete de '{}': {e}", pedido.filename), "CONTROL");
            pedido.responder(CodigoResultado::ServerError, "No se pudo borrar el archivo")
        }
    }
}

fn atender_move(pedido: &Trama, archivos: &ArchivosNodo, logger: &Logger) -> Trama {
    match archivos.mover(&pedido.filename, &pedido.folder) {
        Ok(_) => {
            logger.info(
                &format!("archivo '{}' movido a '{}'", pedido.filename, pedido.folder),
                "CONTROL",
            );
            pedido.responder(CodigoResultado::Success, "Archivo recolocado en el nodo")
        }
        Err(e) if e.kind() == ErrorKind::NotFound => pedido.responder(
            CodigoResultado::NotFound,
            "El archivo no existe en el nodo",
        ),
        Err(e) => {
            logger.error(&format!("fallo el move de '{}': {e}", pedido.filename), "CONTROL");
            pedido.responder(CodigoResultado::ServerError, "No se pudo mover el archivo")
        }
    }
}

/// Materializa el checkpoint y devuelve sus estadisticas serializadas para
/// que el coordinator complete su indice.
fn atender_checkpoint(pedido: &Trama, archivos: &ArchivosNodo, logger: &Logger) -> Trama {
    match archivos.crear_checkpoint(&pedido.filename, &pedido.checkpoint_tag) {
        Ok(_) => match archivos.leer_checkpoint(&pedido.filename, &pedido.checkpoint_tag) {
            Ok(contenido) => {
                logger.info(
                    &format!(
                        "checkpoint '{}' de '{}' materializado",
                        pedido.checkpoint_tag, pedido.filename
                    ),
                    "CONTROL",
                );
                let stats =
                    docfs_client::protocol::payloads::EstadisticasArchivo::desde_contenido(
                        &contenido,
                    );
                let mut respuesta = pedido.responder(CodigoResultado::Success, "");
                respuesta.data = stats.serialize();
                respuesta
            }
            Err(_) => pedido.responder(
                CodigoResultado::ServerError,
                "No se pudo leer el checkpoint recien creado",
            ),
        },
        Err(e) if e.kind() == ErrorKind::NotFound => pedido.responder(
            CodigoResultado::NotFound,
            "El archivo no existe en el nodo",
        ),
        Err(e) => {
            logger.error(
                &format!("fallo el checkpoint de '{}': {e}", pedido.filename),
                "CONTROL",
            );
            pedido.responder(CodigoResultado::ServerError, "No se pudo crear el checkpoint")
        }
    }
}

fn atender_view_checkpoint(pedido: &Trama, archivos: &ArchivosNodo) -> Trama {
    match archivos.leer_checkpoint(&pedido.filename, &pedido.checkpoint_tag) {
        Ok(contenido) => {
            let mut respuesta = pedido.responder(CodigoResultado::Data, "");
            respuesta.data = recortar_payload(&contenido).as_bytes().to_vec();
            respuesta
        }
        Err(_) => pedido.responder(
            CodigoResultado::CheckpointNotFound,
            &format!(
                "No existe el checkpoint '{}' de '{}'",
                pedido.checkpoint_tag, pedido.filename
            ),
        ),
    }
}

fn atender_revert(pedido: &Trama, archivos: &ArchivosNodo, logger: &Logger) -> Trama {
    match archivos.revertir_a_checkpoint(&pedido.filename, &pedido.checkpoint_tag) {
        Ok(_) => {
            logger.info(
                &format!(
                    "archivo '{}' revertido al checkpoint '{}'",
                    pedido.filename, pedido.checkpoint_tag
                ),
                "CONTROL",
            );
            pedido.responder(CodigoResultado::Success, "Archivo revertido al checkpoint")
        }
        Err(e) if e.kind() == ErrorKind::NotFound => pedido.responder(
            CodigoResultado::CheckpointNotFound,
            &format!(
                "No existe el checkpoint '{}' de '{}'",
                pedido.checkpoint_tag, pedido.filename
            ),
        ),
        Err(e) => {
            logger.error(&format!("fallo el revert de '{}': {e}", pedido.filename), "CONTROL");
            pedido.responder(CodigoResultado::ServerError, "No se pudo revertir el archivo")
        }
    }
}

fn atender_info(pedido: &Trama, archivos: &ArchivosNodo) -> Trama {
    match archivos.estadisticas(&pedido.filename) {
        Ok(stats) => {
            let mut respuesta = pedido.responder(CodigoResultado::Success, "");
            respuesta.data = stats.serialize();
            respuesta
        }
        Err(_) => pedido.responder(
            CodigoResultado::NotFound,
            "El archivo no existe en el nodo",
        ),
    }
}
