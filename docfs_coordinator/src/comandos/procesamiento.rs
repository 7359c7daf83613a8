//! Este modulo contiene el bucle de pedidos de una sesion de cliente y el
//! despacho por operacion
use crate::coordinator::Coordinator;
use crate::log_msj::log_mensajes::{log_sesion_abierta, log_sesion_cerrada, log_sesion_rechazada};
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::opcode::Opcode;
use docfs_client::protocol::trama::{Trama, escribir_trama, leer_trama};
use docfs_client::protocol::utils::recortar_payload;
use std::net::TcpStream;

impl Coordinator {
    /// Atiende la sesion completa de un cliente registrado.
    ///
    /// El primer registro aplica la regla de una sesion por usuario: si ya
    /// hay una activa se responde `Locked` con su descripcion y se corta.
    /// Aceptada la sesion, los pedidos se atienden en orden FIFO hasta el
    /// EOF, que la cierra.
    ///
    /// # Parametros
    /// * `stream`: conexion del cliente
    /// * `registro`: trama `RegisterClient` inicial
    /// * `direccion`: direccion remota, para describir la sesion
    pub(crate) fn atender_sesion_cliente(
        &self,
        mut stream: TcpStream,
        registro: &Trama,
        direccion: &str,
    ) {
        let usuario = registro.username.trim().to_string();
        if usuario.is_empty() {
            let respuesta = registro.responder(
                CodigoResultado::BadRequest,
                "El registro necesita un nombre de usuario",
            );
            let _ = escribir_trama(&mut stream, &respuesta);
            return;
        }

        if let Err(existente) = self.usuarios.abrir_sesion(&usuario, direccion) {
            log_sesion_rechazada(&self.logger, &usuario);
            let respuesta = registro.responder(
                CodigoResultado::Locked,
                &format!(
                    "El usuario '{usuario}' ya tiene una sesion activa desde {} ({})",
                    existente.direccion,
                    super::utils::formatear_fecha(existente.login_en)
                ),
            );
            let _ = escribir_trama(&mut stream, &respuesta);
            return;
        }

        self.usuarios.registrar_si_falta(&usuario);
        log_sesion_abierta(&self.logger, &usuario, direccion);
        let bienvenida = registro.responder(
            CodigoResultado::Success,
            &format!("Bienvenido '{usuario}' al filesystem de documentos"),
        );
        if escribir_trama(&mut stream, &bienvenida).is_err() {
            self.usuarios.cerrar_sesion(&usuario);
            return;
        }

        loop {
            let mut pedido = match leer_trama(&mut stream) {
                Ok(trama) => trama,
                Err(_) => break,
            };
            // la autorizacion usa siempre al usuario de la sesion
            pedido.username = usuario.clone();
            let respuesta = self.atender_pedido(&pedido);
            if escribir_trama(&mut stream, &respuesta).is_err() {
                break;
            }
        }

        self.usuarios.cerrar_sesion(&usuario);
        log_sesion_cerrada(&self.logger, &usuario);
    }

    /// Despacho de un pedido de cliente hacia su handler.
    pub(crate) fn atender_pedido(&self, pedido: &Trama) -> Trama {
        let mut respuesta = match pedido.operacion() {
            Some(Opcode::Create) => self.op_create(pedido),
            Some(Opcode::Read) => self.op_read(pedido),
            Some(Opcode::Stream) => self.op_stream(pedido),
            Some(Opcode::Write) => self.op_write(pedido),
            Some(Opcode::Undo) => self.op_undo(pedido),
            Some(Opcode::Delete) => self.op_delete(pedido),
            Some(Opcode::View) => self.op_view(pedido),
            Some(Opcode::Info) => self.op_info(pedido),
            Some(Opcode::AddAccess) => self.op_add_access(pedido),
            Some(Opcode::RemAccess) => self.op_rem_access(pedido),
            Some(Opcode::RequestAccess) => self.op_request_access(pedido),
            Some(Opcode::ViewRequests) => self.op_view_requests(pedido),
            Some(Opcode::RespondRequest) => self.op_respond_request(pedido),
            Some(Opcode::ListUsers) => self.op_list_users(pedido),
            Some(Opcode::ListNodes) => self.op_list_nodes(pedido),
            Some(Opcode::Search) => self.op_search(pedido),
            Some(Opcode::CreateFolder) => self.op_create_folder(pedido),
            Some(Opcode::ViewFolder) => self.op_view_folder(pedido),
            Some(Opcode::Move) => self.op_move(pedido),
            Some(Opcode::Checkpoint) => self.op_checkpoint(pedido),
            Some(Opcode::ViewCheckpoint) => self.op_view_checkpoint(pedido),
            Some(Opcode::Revert) => self.op_revert(pedido),
            Some(Opcode::ListCheckpoints) => self.op_list_checkpoints(pedido),
            Some(Opcode::Exec) => self.op_exec(pedido),
            _ => pedido.responder(CodigoResultado::BadRequest, "Operacion desconocida"),
        };

        // ninguna respuesta de cliente puede desbordar el payload
        respuesta.data = recortar_payload(&String::from_utf8_lossy(&respuesta.data))
            .as_bytes()
            .to_vec();
        respuesta
    }
}
