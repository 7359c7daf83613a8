//! Este modulo contiene el detector de fallas: un hilo que late
//! periodicamente contra cada nodo por su canal de control y marca como
//! caidos a los que agotan la ventana de gracia
use crate::cluster::control::pedir_a_nodo;
use crate::coordinator::Coordinator;
use crate::log_msj::log_mensajes::{log_latido_perdido, log_nodo_caido};
use docfs_client::protocol::opcode::Opcode;
use docfs_client::protocol::trama::Trama;
use std::sync::Arc;
use std::thread::{sleep, spawn};
use std::time::Duration;

impl Coordinator {
    /// Lanza el hilo del detector de fallas.
    ///
    /// Cada periodo envia un `HEARTBEAT` por el canal de control de cada
    /// nodo que todavia tiene canal. Una respuesta refresca el ultimo
    /// latido (y recupera a un nodo que figuraba caido); un fallo dentro
    /// de la ventana de gracia solo se registra, y pasado el limite el
    /// nodo queda caido y pierde el canal. No se intenta redial: la
    /// recuperacion es un nuevo registro del nodo.
    pub(crate) fn iniciar_hilo_heartbeat(self: Arc<Self>) {
        spawn(move || {
            loop {
                sleep(Duration::from_secs(self.config.intervalo_heartbeat_segs));
                self.latir_una_vez();
            }
        });
    }

    /// Una pasada del detector sobre todos los nodos con canal.
    pub fn latir_una_vez(&self) {
        let ahora = chrono::Local::now().timestamp();

        for nodo in self.nodos.listar() {
            if nodo.control.is_none() {
                continue;
            }

            let pedido = Trama::nueva(Opcode::Heartbeat, "system");
            match pedir_a_nodo(&nodo, &pedido) {
                Ok(_) => self.nodos.marcar_vivo(&nodo.id),
                Err(_) => {
                    if ahora - nodo.ultimo_latido > self.config.gracia_heartbeat_segs {
                        self.nodos.marcar_fallado(&nodo.id);
                        log_nodo_caido(&self.logger, &nodo.id);
                    } else {
                        log_latido_perdido(&self.logger, &nodo.id);
                    }
                }
            }
        }
    }
}
