//! Este modulo contiene el stub de replicacion: el coordinator difunde
//! las mutaciones seleccionadas por los canales de control y los nodos por
//! ahora solo las reconocen
use crate::cluster::control::pedir_a_nodo;
use crate::coordinator::Coordinator;
use docfs_client::protocol::opcode::Opcode;
use docfs_client::protocol::trama::Trama;

impl Coordinator {
    /// Difunde una mutacion (alta o baja de archivo) al resto de los nodos
    /// disponibles. Los nodos responden `Ack` sin aplicar nada; los errores
    /// se registran y no cortan la operacion que disparo la difusion.
    ///
    /// # Parametros
    /// * `archivo`: archivo mutado
    /// * `origen`: id del nodo duenio, excluido de la difusion
    pub(crate) fn replicar_mutacion(&self, archivo: &str, origen: &str) {
        for nodo in self.nodos.listar() {
            if nodo.id == origen || !nodo.disponible() {
                continue;
            }
            let pedido = Trama::nueva(Opcode::Replicate, "system").con_archivo(archivo);
            if let Err(e) = pedir_a_nodo(&nodo, &pedido) {
                self.logger.warn(
                    &format!("replicacion a '{}' fallo: {e}", nodo.id),
                    "REPLICACION",
                );
            }
        }
    }
}
