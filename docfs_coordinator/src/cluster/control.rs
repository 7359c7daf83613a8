//! Este modulo contiene el par pedido/respuesta sobre el canal de control
//! de un nodo; el mutex del canal serializa a los llamadores concurrentes
use crate::cluster::nodo_storage::NodoStorage;
use crate::errores::CoordinatorError;
use docfs_client::protocol::trama::{Trama, escribir_trama, leer_trama};

/// Envia un pedido al nodo por su canal de control y espera la respuesta.
///
/// Los llamadores concurrentes contienden por el mutex del canal, de modo
/// que cada nodo ve a lo sumo un par pedido/respuesta en vuelo.
///
/// # Parametros
/// * `nodo`: ficha del nodo destino
/// * `pedido`: trama a enviar
///
/// # Retorna
/// - `Ok(Trama)` con la respuesta del nodo
/// - `Err(CoordinatorError)` si el canal no existe o la E/S fallo; el
///   llamador decide si marca el nodo como caido
pub fn pedir_a_nodo(nodo: &NodoStorage, pedido: &Trama) -> Result<Trama, CoordinatorError> {
    let canal = nodo
        .control
        .as_ref()
        .ok_or_else(|| CoordinatorError::new_nodo_caido_error(&nodo.id, "CONTROL"))?;

    let mut stream = match canal.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    escribir_trama(&mut *stream, pedido)
        .map_err(|e| CoordinatorError::new_io_error(&e, "CONTROL"))?;
    leer_trama(&mut *stream).map_err(|e| CoordinatorError::new_io_error(&e, "CONTROL"))
}
