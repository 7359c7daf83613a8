//! Este modulo contiene la sesion interactiva de escritura por oraciones:
//! validacion de acceso al indice, toma del lock, inserciones de palabras
//! con division dinamica y el commit al recibir el token de cierre
use crate::archivos::file_ops::ArchivosNodo;
use crate::bloqueos::tabla_locks::TablaLocks;
use crate::bloqueos::tabla_undo::TablaUndo;
use crate::oraciones::parser::{
    parse_oraciones, parse_palabras, reconstruir_archivo, reconstruir_oracion,
    termina_en_delimitador,
};
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::constantes::TOKEN_CIERRE_ESCRITURA;
use docfs_client::protocol::trama::{Trama, escribir_trama, leer_trama};
use logger::logger::Logger;
use std::io::{Error, Write};
use std::net::TcpStream;

/// Atiende una sesion de escritura completa sobre el canal de datos.
///
/// El pedido inicial trae `(archivo, oracion)`. La sesion valida la regla
/// de acceso, toma el lock de la oracion y entra al bucle de inserciones;
/// nada llega al disco hasta el token de cierre. Si la conexion se corta a
/// mitad de la sesion el guard suelta el lock y el archivo queda intacto.
///
/// # Parametros
/// * `stream`: canal de datos con el cliente
/// * `pedido`: trama WRITE que abrio la sesion
/// * `archivos`: acceso al disco del nodo
/// * `locks`: tabla de locks de oracion
/// * `undo`: tabla de flags de undo
/// * `logger`: logger del nodo
pub fn atender_sesion_escritura(
    stream: &mut TcpStream,
    pedido: &Trama,
    archivos: &ArchivosNodo,
    locks: &TablaLocks,
    undo: &TablaUndo,
    logger: &Logger,
) -> Result<(), Error> {
    let nombre = pedido.filename.clone();

    let contenido = match archivos.leer(&nombre) {
        Ok(contenido) => contenido,
        Err(_) => {
            let respuesta = pedido.responder(
                CodigoResultado::NotFound,
                &format!("El archivo '{nombre}' no existe en este nodo"),
            );
            return escribir_trama(stream, &respuesta);
        }
    };

    let mut oraciones = parse_oraciones(&contenido);
    let indice = match validar_indice_de_oracion(&mut oraciones, pedido.sentence_num) {
        Ok(indice) => indice,
        Err(descripcion) => {
            let mut respuesta = pedido.responder(CodigoResultado::SentenceOutOfRange, &descripcion);
            respuesta.word_index = oraciones.len() as i32;
            return escribir_trama(stream, &respuesta);
        }
    };

    let _guard = match locks.adquirir(&nombre, indice, &pedido.username) {
        Ok(guard) => guard,
        Err(holder) => {
            let respuesta = pedido.responder(CodigoResultado::Locked, &holder);
            return escribir_trama(stream, &respuesta);
        }
    };

    let mut palabras = parse_palabras(&oraciones[indice]);
    let mut respuesta = pedido.responder(CodigoResultado::Success, &oraciones[indice]);
    respuesta.word_index = palabras.len() as i32;
    escribir_trama(stream, &respuesta)?;

    logger.info(
        &format!(
            "sesion de escritura sobre '{nombre}' oracion {indice} de {}",
            pedido.username
        ),
        "WRITE",
    );

    loop {
        // una lectura fallida es la desconexion del cliente: el guard
        // libera el lock y el archivo no se toco
        let actualizacion = match leer_trama(stream) {
            Ok(trama) => trama,
            Err(_) => {
                logger.warn(
                    &format!("sesion de '{nombre}' cortada sin confirmar"),
                    "WRITE",
                );
                return Ok(());
            }
        };

        if actualizacion.data_texto() == TOKEN_CIERRE_ESCRITURA {
            oraciones[indice] = reconstruir_oracion(&palabras);
            return confirmar_sesion(stream, &actualizacion, &nombre, &oraciones, archivos, undo, logger);
        }

        atender_insercion(
            stream,
            &actualizacion,
            &mut oraciones,
            &mut palabras,
            indice,
        )?;
    }
}

/// Aplica la regla de acceso por indice de oracion.
///
/// Puede extender el vector con una oracion vacia nueva (archivo vacio, o
/// indice igual a la cantidad cuando la ultima cierra con delimitador).
///
/// # Retorna
/// - `Ok(indice)` validado
/// - `Err(descripcion)` para responder `SentenceOutOfRange`
fn validar_indice_de_oracion(
    oraciones: &mut Vec<String>,
    pedido: i32,
) -> Result<usize, String> {
    if oraciones.is_empty() {
        if pedido != 0 {
            return Err("El archivo esta vacio. Solo la oracion 0 es accesible".to_string());
        }
        oraciones.push(String::new());
        return Ok(0);
    }

    let cantidad = oraciones.len();
    if pedido < 0 || pedido as usize > cantidad {
        return Err(format!(
            "Indice de oracion invalido. Se puede acceder de 0 a {cantidad}"
        ));
    }
    if pedido as usize == cantidad {
        if !termina_en_delimitador(&oraciones[cantidad - 1]) {
            return Err(format!(
                "No se puede acceder a la oracion {pedido}: la anterior no cierra con un delimitador simple"
            ));
        }
        oraciones.push(String::new());
    }
    Ok(pedido as usize)
}

/// Atiende una trama de insercion: valida el indice de palabra, inserta
/// los tokens, divide la oracion si aparecio un delimitador simple y
/// responde la oracion vigente.
fn atender_insercion(
    stream: &mut TcpStream,
    actualizacion: &Trama,
    oraciones: &mut Vec<String>,
    palabras: &mut Vec<String>,
    indice: usize,
) -> Result<(), Error> {
    let posicion = actualizacion.word_index;
    if posicion < 0 || posicion as usize > palabras.len() {
        let mut respuesta = actualizacion.responder(
            CodigoResultado::WordOutOfRange,
            &format!(
                "Indice de palabra invalido. Se puede insertar de 0 a {}",
                palabras.len()
            ),
        );
        respuesta.word_index = palabras.len() as i32;
        return escribir_trama(stream, &respuesta);
    }

    let tokens = parse_palabras(&actualizacion.data_texto());
    if tokens.is_empty() {
        // insercion vacia: no-op que devuelve la oracion sin cambios
        let actual = reconstruir_oracion(palabras);
        let mut respuesta = actualizacion.responder(CodigoResultado::Success, &actual);
        respuesta.word_index = palabras.len() as i32;
        return escribir_trama(stream, &respuesta);
    }

    palabras.splice(posicion as usize..posicion as usize, tokens);

    let reconstruida = reconstruir_oracion(palabras);
    let divisiones = parse_oraciones(&reconstruida);
    match divisiones.len() {
        0 | 1 => {
            oraciones[indice] = reconstruida;
        }
        _ => {
            // la insercion introdujo delimitadores simples: la primera
            // division reemplaza a la oracion en edicion y el resto se
            // intercala a continuacion, corriendo las siguientes
            oraciones[indice] = divisiones[0].clone();
            for (corrimiento, division) in divisiones[1..].iter().enumerate() {
                oraciones.insert(indice + 1 + corrimiento, division.clone());
            }
            *palabras = parse_palabras(&oraciones[indice]);
        }
    }

    let mut respuesta = actualizacion.responder(CodigoResultado::Success, &oraciones[indice]);
    respuesta.word_index = palabras.len() as i32;
    escribir_trama(stream, &respuesta)
}

/// Commit de la sesion: sidecar con la version previa, reemplazo atomico
/// del contenido vivo, refresco del respaldo plano y habilitacion del undo.
fn confirmar_sesion<W: Write>(
    stream: &mut W,
    actualizacion: &Trama,
    nombre: &str,
    oraciones: &[String],
    archivos: &ArchivosNodo,
    undo: &TablaUndo,
    logger: &Logger,
) -> Result<(), Error> {
    let contenido_nuevo = reconstruir_archivo(oraciones);

    let resultado = archivos
        .respaldar_en_sidecar(nombre)
        .and_then(|_| archivos.escribir_atomico(nombre, &contenido_nuevo))
        .and_then(|_| archivos.actualizar_backup(nombre, &contenido_nuevo));

    match resultado {
        Ok(_) => {
            undo.habilitar_undo(nombre);
            logger.info(&format!("escritura confirmada sobre '{nombre}'"), "WRITE");
            let respuesta = actualizacion.responder(CodigoResultado::Success, &contenido_nuevo);
            escribir_trama(stream, &respuesta)
        }
        Err(e) => {
            logger.error(
                &format!("fallo el commit de '{nombre}': {e}"),
                "WRITE",
            );
            let respuesta = actualizacion.responder(
                CodigoResultado::ServerError,
                "No se pudo persistir la escritura",
            );
            escribir_trama(stream, &respuesta)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_archivo_vacio_solo_oracion_cero() {
        let mut oraciones = Vec::new();
        assert!(validar_indice_de_oracion(&mut oraciones, 1).is_err());
        assert_eq!(validar_indice_de_oracion(&mut oraciones, 0), Ok(0));
        assert_eq!(oraciones, vec![String::new()]);
    }

    #[test]
    fn test02_indice_siguiente_exige_delimitador() {
        let mut sin_cierre = vec!["Hola mundo".to_string()];
        assert!(validar_indice_de_oracion(&mut sin_cierre, 1).is_err());

        let mut con_cierre = vec!["Hola mundo.".to_string()];
        assert_eq!(validar_indice_de_oracion(&mut con_cierre, 1), Ok(1));
        assert_eq!(con_cierre.len(), 2);
    }

    #[test]
    fn test03_indices_fuera_de_rango() {
        let mut oraciones = vec!["Una.".to_string(), "Dos.".to_string()];
        assert!(validar_indice_de_oracion(&mut oraciones, 5).is_err());
        assert!(validar_indice_de_oracion(&mut oraciones, -1).is_err());
        assert_eq!(validar_indice_de_oracion(&mut oraciones, 1), Ok(1));
    }
}
