//! Este modulo contiene el alta de nodos de almacenamiento: instala la
//! ficha, adopta los archivos anunciados y deja el socket como canal de
//! control permanente
use crate::constantes::{DUENIO_SISTEMA, TIMEOUT_CONTROL_SEGS};
use crate::coordinator::Coordinator;
use crate::log_msj::log_mensajes::log_nodo_registrado;
use crate::registro::archivo::FichaArchivo;
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::payloads::RegistroNodo;
use docfs_client::protocol::protocol_trait::DeserializeDFP;
use docfs_client::protocol::trama::{Trama, escribir_trama};
use std::fs;
use std::io::Cursor;
use std::net::TcpStream;
use std::time::Duration;

impl Coordinator {
    /// Atiende una trama `RegisterNode`: decodifica el anuncio, responde
    /// el alta y guarda el socket como canal de control del nodo.
    ///
    /// Un id ya conocido es un **reingreso**: las fichas y ACLs existentes
    /// se preservan, solo se adoptan los nombres nuevos, y se limpia la
    /// cache de contenidos de todo lo anunciado (bytes viejos no deben
    /// tapar el contenido fresco del nodo).
    ///
    /// # Parametros
    /// * `stream`: socket aceptado, futuro canal de control
    /// * `pedido`: trama de registro con el anuncio serializado en `data`
    pub(crate) fn atender_registro_nodo(&self, mut stream: TcpStream, pedido: &Trama) {
        let registro = match RegistroNodo::deserialize(&mut Cursor::new(pedido.data.as_slice())) {
            Ok(registro) => registro,
            Err(_) => {
                let respuesta = pedido.responder(
                    CodigoResultado::BadRequest,
                    "Anuncio de registro de nodo invalido",
                );
                let _ = escribir_trama(&mut stream, &respuesta);
                return;
            }
        };

        let _ = stream.set_read_timeout(Some(Duration::from_secs(TIMEOUT_CONTROL_SEGS)));
        let respuesta = pedido.responder(
            CodigoResultado::Success,
            &format!("Nodo '{}' registrado en el cluster", registro.id),
        );
        if escribir_trama(&mut stream, &respuesta).is_err() {
            return;
        }

        let reingreso = self.nodos.registrar(&registro, stream);
        let mut adoptados = 0;
        for archivo in &registro.archivos {
            if !self.registry.existe(archivo) {
                let ficha = FichaArchivo::nueva(archivo, DUENIO_SISTEMA, &registro.id);
                if self.registry.agregar(ficha).is_ok() {
                    adoptados += 1;
                }
            }
            // bytes cacheados de otra epoca no deben tapar al nodo
            let _ = fs::remove_file(self.config.cache_dir.join(archivo));
        }

        if adoptados > 0 {
            self.busqueda.invalidar();
        }
        log_nodo_registrado(&self.logger, &registro.id, reingreso, registro.archivos.len());
    }
}
